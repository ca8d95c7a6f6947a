use crate::repository::api::Node;
use crate::repository::entry::Entry;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

/// Nodes of the listed tree grouped by artifact type, each group sorted by id.
pub(crate) struct TypeIndex {
    by_type: HashMap<String, BTreeMap<String, Arc<Node>>>,
}

impl TypeIndex {
    pub(crate) fn scan(root: &Entry) -> Self {
        let mut by_type: HashMap<String, BTreeMap<String, Arc<Node>>> = HashMap::new();
        root.walk(&mut |entry| {
            if let Some(node) = entry.node() {
                by_type
                    .entry(node.artifact_type().to_string())
                    .or_default()
                    .insert(node.id().to_string(), node.clone());
            }
        });

        TypeIndex { by_type }
    }

    pub(crate) fn nodes(&self, artifact_type: &str) -> Vec<Arc<Node>> {
        self.by_type
            .get(artifact_type)
            .map(|nodes| nodes.values().cloned().collect())
            .unwrap_or_default()
    }
}
