use crate::cluster::error::ClusterError;
use crate::cluster::membership::{ClusterMembership, NodeContext};
use crate::config::{ClusterConfig, CLUSTER_ARTIFACT_TYPE};
use crate::repository::Artifact;
use std::sync::Arc;

/// ClusterRegistry holds every cluster configured in the local repository.
pub struct ClusterRegistry {
    clusters: Vec<Arc<ClusterMembership>>,
}

impl ClusterRegistry {
    pub fn new(clusters: Vec<Arc<ClusterMembership>>) -> Self {
        ClusterRegistry { clusters }
    }

    /// Reads the `cluster` artifacts of the local repository. Invalid configurations are logged and skipped.
    pub fn from_repository(context: &NodeContext) -> Self {
        let clusters = context
            .local
            .artifacts(CLUSTER_ARTIFACT_TYPE)
            .iter()
            .filter_map(|artifact| match Self::membership(artifact, context) {
                Ok(membership) => Some(Arc::new(membership)),
                Err(e) => {
                    slog::error!(context.logger, "Ignoring cluster {}: {}", artifact.id(), e);
                    None
                }
            })
            .collect::<Vec<_>>();

        slog::info!(context.logger, "{} cluster(s) configured", clusters.len());
        Self::new(clusters)
    }

    fn membership(artifact: &Artifact, context: &NodeContext) -> Result<ClusterMembership, ClusterError> {
        let config = ClusterConfig::from_artifact(artifact)?;
        ClusterMembership::new(artifact.id(), config, context.clone())
    }

    pub fn clusters(&self) -> &[Arc<ClusterMembership>] {
        &self.clusters
    }

    pub fn get(&self, cluster_id: &str) -> Option<Arc<ClusterMembership>> {
        self.clusters.iter().find(|cluster| cluster.id() == cluster_id).cloned()
    }
}
