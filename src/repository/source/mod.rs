mod fs;
mod in_memory;

pub use fs::FsTreeSource;
pub use in_memory::InMemorySource;

use crate::repository::api::{NodeDescriptor, RepositoryError};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// SourceItem is one child listed by a tree source.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SourceItem {
    pub name: String,
    pub is_leaf: bool,
}

/// TreeSource is the raw storage a repository tree is read from. Paths are id segments, the empty path is the root.
pub trait TreeSource: Send + Sync {
    fn location(&self) -> String;

    /// Children of `path`, sorted by name.
    fn list(&self, path: &[&str]) -> Result<Vec<SourceItem>, RepositoryError>;

    /// The node stored at `path`, if the entry is a node.
    fn read_node(&self, path: &[&str]) -> Result<Option<NodeDescriptor>, RepositoryError>;
}

/// SourceResolver maps a repository location, as exchanged between nodes, to a tree source.
pub trait SourceResolver: Send + Sync {
    fn resolve(&self, location: &str) -> Result<Arc<dyn TreeSource>, RepositoryError>;
}

/// Resolves `file://` urls and absolute paths to the filesystem, and anything else to mounted sources.
///
/// Filesystem locations are opened on this machine, so a peer's `file://` root only resolves to the peer's
/// tree when the path is shared. Mounted sources take precedence over the filesystem.
#[derive(Default)]
pub struct DefaultSourceResolver {
    mounted: RwLock<HashMap<String, Arc<dyn TreeSource>>>,
}

impl DefaultSourceResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mount(&self, source: Arc<dyn TreeSource>) {
        self.mounted
            .write()
            .expect("DefaultSourceResolver.mount() RwLock poisoned")
            .insert(source.location(), source);
    }
}

impl SourceResolver for DefaultSourceResolver {
    fn resolve(&self, location: &str) -> Result<Arc<dyn TreeSource>, RepositoryError> {
        if let Some(source) = self
            .mounted
            .read()
            .expect("DefaultSourceResolver.resolve() RwLock poisoned")
            .get(location)
        {
            return Ok(source.clone());
        }

        match location.strip_prefix("file://") {
            Some(path) => Ok(Arc::new(FsTreeSource::open(path)?)),
            None if location.starts_with('/') => Ok(Arc::new(FsTreeSource::open(location)?)),
            None => Err(RepositoryError::UnknownLocation(location.to_string())),
        }
    }
}
