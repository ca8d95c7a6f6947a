use crate::repository::api::{Artifact, NodeDescriptor};
use std::collections::HashMap;
use std::sync::Arc;

/// A child entry produced by an artifact repository manager.
#[derive(Clone, Debug, PartialEq)]
pub struct GeneratedChild {
    pub name: String,
    pub descriptor: NodeDescriptor,
}

#[derive(Debug, thiserror::Error)]
#[error("Artifact repository manager failed: {0}")]
pub struct ManagerError(pub String);

/// ArtifactRepositoryManager generates child entries for nodes that name it as their manager.
pub trait ArtifactRepositoryManager: Send + Sync {
    fn add_children(&self, parent_id: &str, artifact: &Artifact) -> Result<Vec<GeneratedChild>, ManagerError>;

    fn remove_children(&self, parent_id: &str, artifact: &Artifact) -> Result<(), ManagerError>;
}

/// ManagerRegistry maps manager tags to the manager instance shared by every node using the tag.
#[derive(Clone, Default)]
pub struct ManagerRegistry {
    managers: HashMap<String, Arc<dyn ArtifactRepositoryManager>>,
}

impl ManagerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, tag: impl Into<String>, manager: Arc<dyn ArtifactRepositoryManager>) {
        self.managers.insert(tag.into(), manager);
    }

    pub fn get(&self, tag: &str) -> Option<Arc<dyn ArtifactRepositoryManager>> {
        self.managers.get(tag).cloned()
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.managers.contains_key(tag)
    }
}
