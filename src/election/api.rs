use crate::cluster::ClusterError;
use crate::election::message::BullyMessage;
use crate::peer::{PeerError, RequestHandler};
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Base path under which a cluster's election protocol talks to its peers.
pub const ELECTION_CALLBACK_PATH: &str = "/cluster";

/// Receives the outcome of elections.
pub trait MasterController: Send + Sync {
    fn set_master(&self, master: Option<String>);
}

/// A master transition as observed by this node.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ElectionRecord {
    pub master: Option<String>,
    pub at: DateTime<Utc>,
}

/// ElectionClient runs the master election of one cluster on behalf of this node.
pub trait ElectionClient: Send + Sync {
    /// This node's identity in the election.
    fn identity(&self) -> &str;

    fn current_master(&self) -> Option<String>;

    fn is_current_master(&self) -> bool {
        self.current_master().as_deref() == Some(self.identity())
    }

    /// Runs an election in the background, right away or after a short random delay.
    fn schedule_election(&self, immediate: bool);

    fn history(&self) -> Vec<ElectionRecord>;

    /// Handler for the protocol messages peers send to `handler_path()`.
    fn handler(&self) -> Arc<dyn RequestHandler>;

    fn handler_path(&self) -> String;
}

/// Carries election messages to the other members.
#[async_trait::async_trait]
pub trait ElectionTransport: Send + Sync {
    async fn send(&self, peer: &str, path: &str, message: BullyMessage) -> Result<BullyMessage, PeerError>;
}

pub struct ElectionSetup {
    pub logger: slog::Logger,
    pub identity: String,
    /// Every member's identity, this node's included.
    pub peers: Vec<String>,
    pub callback_path: String,
    pub controller: Arc<dyn MasterController>,
    pub transport: Arc<dyn ElectionTransport>,
}

pub trait ElectionClientFactory: Send + Sync {
    fn create(&self, setup: ElectionSetup) -> Result<Arc<dyn ElectionClient>, ClusterError>;
}
