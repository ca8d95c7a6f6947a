use crate::config::InvalidHost;
use crate::operations::OperationError;
use crate::peer::PeerError;
use crate::repository::RepositoryError;
use std::io;

#[derive(Debug, thiserror::Error)]
pub enum ClusterError {
    #[error("Invalid cluster configuration: {0}")]
    Configuration(String),
    #[error("Malformed cluster configuration")]
    MalformedConfiguration(#[from] serde_json::Error),
    #[error(transparent)]
    InvalidHost(#[from] InvalidHost),
    #[error("Invalid local lookup pattern")]
    InvalidPattern(#[from] regex::Error),
    #[error("This node is a member of more than one cluster: {0:?}")]
    AmbiguousMembership(Vec<String>),
    #[error("Unknown cluster '{0}'")]
    UnknownCluster(String),
    #[error("This node is not a member of any cluster")]
    NotAMember,
    #[error("This node takes no part in an election")]
    NotElecting,
    #[error("Could not resolve addresses")]
    Resolution(#[source] io::Error),
    #[error("Cluster repository setup failed")]
    Storage(#[source] io::Error),
    #[error("Background task failed: {0}")]
    Task(String),
    #[error(transparent)]
    Peer(#[from] PeerError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Operation(#[from] OperationError),
}
