use crate::cluster::membership::ClusterMembership;
use crate::election::{BullyMessage, ElectionTransport};
use crate::peer::PeerError;
use std::sync::Weak;

/// Sends election messages through the peer connections of a cluster membership.
pub struct MembershipElectionTransport {
    cluster: Weak<ClusterMembership>,
}

impl MembershipElectionTransport {
    pub fn new(cluster: Weak<ClusterMembership>) -> Self {
        MembershipElectionTransport { cluster }
    }
}

#[async_trait::async_trait]
impl ElectionTransport for MembershipElectionTransport {
    async fn send(&self, peer: &str, path: &str, message: BullyMessage) -> Result<BullyMessage, PeerError> {
        let cluster = self.cluster.upgrade().ok_or(PeerError::Detached)?;
        let connection = cluster
            .connection(peer)?
            .ok_or_else(|| PeerError::UnknownHost(peer.to_string()))?;

        let reply = connection.deliver(path, message.encode()).await?;
        Ok(BullyMessage::decode(&reply)?)
    }
}
