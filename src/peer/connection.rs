use crate::config::{ConnectionOptions, Host};
use crate::election::MessageError;
use bytes::Bytes;
use serde_json::Value;
use std::sync::Arc;

#[derive(Debug, thiserror::Error)]
pub enum PeerError {
    #[error("Invalid peer url '{0}'")]
    InvalidUrl(String),
    #[error("Timed out connecting to '{0}'")]
    ConnectTimeout(String),
    #[error("Failed to connect to '{url}'")]
    ConnectFailure {
        url: String,
        #[source]
        source: tonic::transport::Error,
    },
    #[error("Remote call failed: {0}")]
    Rpc(#[from] tonic::Status),
    #[error("Remote fault: {0}")]
    RemoteFault(String),
    #[error("Unknown remote operation '{0}'")]
    UnknownOperation(String),
    #[error("Unknown host '{0}'")]
    UnknownHost(String),
    #[error("Cluster membership is gone")]
    Detached,
    #[error("Malformed operation payload")]
    Payload(#[from] serde_json::Error),
    #[error("Malformed election message")]
    Message(#[from] MessageError),
}

/// PeerConnection is this node's handle on the peer service of another cluster member.
#[async_trait::async_trait]
pub trait PeerConnection: Send + Sync {
    fn host(&self) -> &Host;

    /// Location of the peer's local repository.
    async fn repository_root(&self) -> Result<String, PeerError>;

    async fn reload(&self, id: &str) -> Result<(), PeerError>;

    async fn reload_all(&self) -> Result<(), PeerError>;

    async fn canonical_name(&self) -> Result<String, PeerError>;

    /// Runs an operation on the peer. Nothing is returned for asynchronous runs.
    async fn run_operation(
        &self,
        operation_id: &str,
        input: Value,
        asynchronous: bool,
    ) -> Result<Option<Value>, PeerError>;

    /// Delivers a payload to the request handler subscribed to `path` on the peer, returning its reply.
    async fn deliver(&self, path: &str, payload: Bytes) -> Result<Bytes, PeerError>;
}

/// PeerConnector creates connections. Creating one must not contact the peer.
pub trait PeerConnector: Send + Sync {
    fn connect(
        &self,
        logger: &slog::Logger,
        host: &Host,
        options: &ConnectionOptions,
    ) -> Result<Arc<dyn PeerConnection>, PeerError>;
}
