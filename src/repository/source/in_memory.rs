use crate::repository::api::{NodeDescriptor, RepositoryError};
use crate::repository::source::{SourceItem, TreeSource};
use std::collections::BTreeMap;
use std::sync::RwLock;

/// InMemorySource is a tree source held in memory, addressed as `memory://<name>`.
pub struct InMemorySource {
    name: String,
    // Keyed by id. Containers without a node map to None.
    entries: RwLock<BTreeMap<String, Option<NodeDescriptor>>>,
}

impl InMemorySource {
    pub fn new(name: impl Into<String>) -> Self {
        InMemorySource {
            name: name.into(),
            entries: RwLock::new(BTreeMap::new()),
        }
    }

    /// Stores a node at `id`, creating missing ancestors as plain containers.
    pub fn put(&self, id: &str, descriptor: NodeDescriptor) {
        let mut entries = self.entries.write().expect("InMemorySource.put() RwLock poisoned");
        let mut ancestor = id;
        while let Some(index) = ancestor.rfind('.') {
            ancestor = &ancestor[..index];
            entries.entry(ancestor.to_string()).or_insert(None);
        }
        entries.insert(id.to_string(), Some(descriptor));
    }

    /// Removes `id` and everything below it.
    pub fn remove(&self, id: &str) {
        let prefix = format!("{}.", id);
        self.entries
            .write()
            .expect("InMemorySource.remove() RwLock poisoned")
            .retain(|key, _| key != id && !key.starts_with(&prefix));
    }
}

fn parent_of(id: &str) -> &str {
    id.rfind('.').map_or("", |index| &id[..index])
}

impl TreeSource for InMemorySource {
    fn location(&self) -> String {
        format!("memory://{}", self.name)
    }

    fn list(&self, path: &[&str]) -> Result<Vec<SourceItem>, RepositoryError> {
        let id = path.join(".");
        let entries = self.entries.read().expect("InMemorySource.list() RwLock poisoned");

        let items = entries
            .iter()
            .filter(|(key, _)| parent_of(key) == id)
            .map(|(key, node)| {
                let prefix = format!("{}.", key);
                let has_children = entries.keys().any(|other| other.starts_with(&prefix));
                SourceItem {
                    name: key[key.rfind('.').map_or(0, |index| index + 1)..].to_string(),
                    is_leaf: node.is_some() && !has_children,
                }
            })
            .collect();

        Ok(items)
    }

    fn read_node(&self, path: &[&str]) -> Result<Option<NodeDescriptor>, RepositoryError> {
        let entries = self.entries.read().expect("InMemorySource.read_node() RwLock poisoned");
        Ok(entries.get(&path.join(".")).cloned().flatten())
    }
}
