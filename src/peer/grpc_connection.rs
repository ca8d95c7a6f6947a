use crate::config::{ConnectionOptions, Host};
use crate::grpc::grpc_peer_client::GrpcPeerClient;
use crate::grpc::{
    proto_operation_error, proto_run_operation_result, ProtoCanonicalNameReq, ProtoDeliverReq, ProtoReloadAllReq,
    ProtoReloadReq, ProtoRepositoryRootReq, ProtoRunOperationReq,
};
use crate::peer::connection::{PeerConnection, PeerConnector, PeerError};
use bytes::Bytes;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::time::Duration;
use tonic::transport::{Channel, Endpoint};

/// GrpcPeerConnection talks to a peer's `GrpcPeer` service. The channel is opened on first use.
pub struct GrpcPeerConnection {
    logger: slog::Logger,
    host: Host,
    url: String,
    endpoint: Endpoint,
    connect_timeout: Duration,
    client: Mutex<Option<GrpcPeerClient<Channel>>>,
}

impl GrpcPeerConnection {
    pub fn new(logger: slog::Logger, host: Host, options: &ConnectionOptions) -> Result<Self, PeerError> {
        let url = options.peer_url(&host);
        let endpoint = Endpoint::from_shared(url.clone())
            .map_err(|_| PeerError::InvalidUrl(url.clone()))?
            .timeout(options.socket_timeout);

        Ok(GrpcPeerConnection {
            logger,
            host,
            url,
            endpoint,
            connect_timeout: options.connection_timeout,
            client: Mutex::new(None),
        })
    }

    async fn client(&self) -> Result<GrpcPeerClient<Channel>, PeerError> {
        let mut client = self.client.lock().await;
        if let Some(connected) = client.as_ref() {
            return Ok(connected.clone());
        }

        slog::debug!(self.logger, "Connecting to {} ...", self.url);
        let channel = match tokio::time::timeout(self.connect_timeout, self.endpoint.connect()).await {
            Ok(Ok(channel)) => channel,
            Ok(Err(e)) => {
                return Err(PeerError::ConnectFailure {
                    url: self.url.clone(),
                    source: e,
                })
            }
            Err(_) => return Err(PeerError::ConnectTimeout(self.url.clone())),
        };

        let connected = GrpcPeerClient::new(channel);
        client.replace(connected.clone());
        Ok(connected)
    }

    fn convert_run_operation_result(
        result: Option<proto_run_operation_result::Result>,
        asynchronous: bool,
    ) -> Result<Option<Value>, PeerError> {
        match result {
            Some(proto_run_operation_result::Result::Ok(ok)) => {
                if asynchronous {
                    Ok(None)
                } else {
                    Ok(Some(serde_json::from_slice(&ok.output)?))
                }
            }
            Some(proto_run_operation_result::Result::Err(e)) => match e.err {
                Some(proto_operation_error::Err::UnknownOperation(unknown)) => {
                    Err(PeerError::UnknownOperation(unknown.operation_id))
                }
                Some(proto_operation_error::Err::ServerFault(fault)) => Err(PeerError::RemoteFault(fault.message)),
                None => Err(PeerError::RemoteFault("Unspecified operation error".to_string())),
            },
            None => Err(PeerError::RemoteFault("Empty operation result".to_string())),
        }
    }
}

#[async_trait::async_trait]
impl PeerConnection for GrpcPeerConnection {
    fn host(&self) -> &Host {
        &self.host
    }

    async fn repository_root(&self) -> Result<String, PeerError> {
        let reply = self.client().await?.get_repository_root(ProtoRepositoryRootReq {}).await?;
        Ok(reply.into_inner().location)
    }

    async fn reload(&self, id: &str) -> Result<(), PeerError> {
        self.client()
            .await?
            .reload(ProtoReloadReq { id: id.to_string() })
            .await?;
        Ok(())
    }

    async fn reload_all(&self) -> Result<(), PeerError> {
        self.client().await?.reload_all(ProtoReloadAllReq {}).await?;
        Ok(())
    }

    async fn canonical_name(&self) -> Result<String, PeerError> {
        let reply = self.client().await?.get_canonical_name(ProtoCanonicalNameReq {}).await?;
        Ok(reply.into_inner().name)
    }

    async fn run_operation(
        &self,
        operation_id: &str,
        input: Value,
        asynchronous: bool,
    ) -> Result<Option<Value>, PeerError> {
        let rpc_request = ProtoRunOperationReq {
            operation_id: operation_id.to_string(),
            input: serde_json::to_vec(&input)?,
            asynchronous,
        };
        let reply = self.client().await?.run_operation(rpc_request).await?;
        Self::convert_run_operation_result(reply.into_inner().result, asynchronous)
    }

    async fn deliver(&self, path: &str, payload: Bytes) -> Result<Bytes, PeerError> {
        let rpc_request = ProtoDeliverReq {
            path: path.to_string(),
            payload: payload.to_vec(),
        };
        let reply = self.client().await?.deliver(rpc_request).await?;
        Ok(Bytes::from(reply.into_inner().payload))
    }
}

/// Connects to peers over gRPC.
#[derive(Clone, Copy, Debug, Default)]
pub struct GrpcConnector;

impl PeerConnector for GrpcConnector {
    fn connect(
        &self,
        logger: &slog::Logger,
        host: &Host,
        options: &ConnectionOptions,
    ) -> Result<Arc<dyn PeerConnection>, PeerError> {
        let connection = GrpcPeerConnection::new(logger.new(slog::o!("Peer" => host.to_string())), host.clone(), options)?;
        Ok(Arc::new(connection))
    }
}
