use crate::operations::OperationRegistry;
use crate::repository::events::RepositoryEventListener;
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io;
use std::sync::Arc;

/// NodeDescriptor is what a repository source stores for a node (`node.json` on disk).
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct NodeDescriptor {
    #[serde(rename = "type")]
    pub artifact_type: String,
    /// Tag of the artifact repository manager that generates children for this node.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manager: Option<String>,
    /// Ids of the nodes this node depends on.
    #[serde(default)]
    pub references: Vec<String>,
    #[serde(default)]
    pub content: serde_json::Value,
}

/// Artifact is the loaded, typed form of a node.
#[derive(Debug, PartialEq)]
pub struct Artifact {
    id: String,
    artifact_type: String,
    content: serde_json::Value,
}

impl Artifact {
    pub fn new(id: impl Into<String>, artifact_type: impl Into<String>, content: serde_json::Value) -> Self {
        Artifact {
            id: id.into(),
            artifact_type: artifact_type.into(),
            content,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn artifact_type(&self) -> &str {
        &self.artifact_type
    }

    pub fn content(&self) -> &serde_json::Value {
        &self.content
    }
}

/// Node is an addressable entry of a repository that carries an artifact.
/// The artifact is built once, on first access.
pub struct Node {
    id: String,
    descriptor: NodeDescriptor,
    artifact: OnceCell<Arc<Artifact>>,
}

impl Node {
    pub fn new(id: impl Into<String>, descriptor: NodeDescriptor) -> Self {
        Node {
            id: id.into(),
            descriptor,
            artifact: OnceCell::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn artifact_type(&self) -> &str {
        &self.descriptor.artifact_type
    }

    pub fn manager(&self) -> Option<&str> {
        self.descriptor.manager.as_deref()
    }

    pub fn references(&self) -> &[String] {
        &self.descriptor.references
    }

    pub fn descriptor(&self) -> &NodeDescriptor {
        &self.descriptor
    }

    pub fn is_loaded(&self) -> bool {
        self.artifact.get().is_some()
    }

    pub fn artifact(&self) -> Arc<Artifact> {
        self.artifact
            .get_or_init(|| {
                Arc::new(Artifact::new(
                    self.id.clone(),
                    self.descriptor.artifact_type.clone(),
                    self.descriptor.content.clone(),
                ))
            })
            .clone()
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("id", &self.id)
            .field("type", &self.descriptor.artifact_type)
            .field("loaded", &self.is_loaded())
            .finish()
    }
}

/// EntryInfo is a point-in-time view of one entry of a repository tree.
#[derive(Clone, Debug)]
pub struct EntryInfo {
    pub id: String,
    pub name: String,
    pub is_leaf: bool,
    /// Created by an artifact repository manager rather than read from the source.
    pub generated: bool,
    pub node: Option<Arc<Node>>,
    /// Ids of the child entries.
    pub children: Vec<String>,
}

impl EntryInfo {
    pub fn is_node(&self) -> bool {
        self.node.is_some()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("I/O failure on '{location}'")]
    Io {
        location: String,
        #[source]
        source: io::Error,
    },
    #[error("Invalid node descriptor at '{location}'")]
    InvalidDescriptor {
        location: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("No repository source for location '{0}'")]
    UnknownLocation(String),
    #[error("Not supported by this repository: {0}")]
    Unsupported(&'static str),
}

/// Repository is a tree of entries identified by dot-separated ids, some of which are nodes carrying artifacts.
///
/// Methods block on I/O against the backing source. Async callers should use `spawn_blocking`.
pub trait Repository: Send + Sync {
    /// Location this repository reads from, in a form other nodes can resolve.
    fn root_location(&self) -> String;

    fn entry(&self, id: &str) -> Option<EntryInfo>;

    fn node(&self, id: &str) -> Option<Arc<Node>>;

    fn resolve(&self, id: &str) -> Option<Arc<Artifact>> {
        self.node(id).map(|node| node.artifact())
    }

    /// All artifacts of a type, sorted by id.
    fn artifacts(&self, artifact_type: &str) -> Vec<Arc<Artifact>>;

    /// Ids that `id` references.
    fn references(&self, id: &str) -> Vec<String>;

    /// Ids that reference `id`.
    fn dependencies(&self, id: &str) -> Vec<String>;

    /// Reloads `id` (or its closest existing ancestor) and everything depending on it.
    fn reload(&self, id: &str) -> Result<(), RepositoryError>;

    fn reload_many(&self, ids: &[String]) -> Result<(), RepositoryError>;

    fn reload_all(&self) -> Result<(), RepositoryError>;

    fn unload(&self, id: &str) -> Result<(), RepositoryError>;

    fn subscribe(&self) -> RepositoryEventListener;

    fn operations(&self) -> Option<Arc<OperationRegistry>>;

    fn set_operations(&self, operations: Arc<OperationRegistry>) -> Result<(), RepositoryError>;
}
