use crate::repository::api::{EntryInfo, Node, NodeDescriptor, RepositoryError};
use crate::repository::source::{SourceItem, TreeSource};
use std::sync::Arc;

/// Entry is one position of the mirrored tree. Children are listed from the source on first access.
pub(crate) struct Entry {
    id: String,
    name: String,
    is_leaf: bool,
    generated: bool,
    node: Option<Arc<Node>>,
    children: Vec<Entry>,
    listed: bool,
}

impl Entry {
    pub(crate) fn root() -> Self {
        Entry {
            id: String::new(),
            name: String::new(),
            is_leaf: false,
            generated: false,
            node: None,
            children: Vec::new(),
            listed: false,
        }
    }

    fn from_source(parent_id: &str, item: &SourceItem) -> Self {
        Entry {
            id: child_id(parent_id, &item.name),
            name: item.name.clone(),
            is_leaf: item.is_leaf,
            generated: false,
            node: None,
            children: Vec::new(),
            listed: false,
        }
    }

    pub(crate) fn generated(parent_id: &str, name: &str, descriptor: NodeDescriptor) -> Self {
        let id = child_id(parent_id, name);
        Entry {
            node: Some(Arc::new(Node::new(id.clone(), descriptor))),
            id,
            name: name.to_string(),
            is_leaf: true,
            generated: true,
            children: Vec::new(),
            listed: true,
        }
    }

    pub(crate) fn id(&self) -> &str {
        &self.id
    }

    pub(crate) fn node(&self) -> Option<&Arc<Node>> {
        self.node.as_ref()
    }

    pub(crate) fn children_mut(&mut self) -> &mut [Entry] {
        &mut self.children
    }

    fn segments(&self) -> Vec<&str> {
        if self.id.is_empty() {
            Vec::new()
        } else {
            self.id.split('.').collect()
        }
    }

    pub(crate) fn ensure_listed(&mut self, source: &dyn TreeSource) -> Result<(), RepositoryError> {
        if self.listed {
            return Ok(());
        }
        self.refresh(source)
    }

    /// Re-reads this entry's node and child list. Children still present in the source keep their subtrees,
    /// generated children are kept as they are.
    pub(crate) fn refresh(&mut self, source: &dyn TreeSource) -> Result<(), RepositoryError> {
        if self.generated {
            return Ok(());
        }

        let path = self.segments();
        let node = source.read_node(&path)?;
        let items = source.list(&path)?;

        self.node = node.map(|descriptor| Arc::new(Node::new(self.id.clone(), descriptor)));

        let mut previous = std::mem::take(&mut self.children);
        let mut children = Vec::with_capacity(items.len());
        for item in &items {
            match previous.iter().position(|child| !child.generated && child.name == item.name) {
                Some(index) => {
                    let mut child = previous.swap_remove(index);
                    child.is_leaf = item.is_leaf;
                    children.push(child);
                }
                None => children.push(Entry::from_source(&self.id, item)),
            }
        }
        children.extend(previous.into_iter().filter(|child| child.generated));

        self.children = children;
        self.listed = true;
        Ok(())
    }

    /// Finds the entry `id` below this one, listing entries on the way as needed.
    pub(crate) fn find_mut(&mut self, id: &str, source: &dyn TreeSource) -> Result<Option<&mut Entry>, RepositoryError> {
        let mut current = self;
        if !id.is_empty() {
            for segment in id.split('.') {
                current.ensure_listed(source)?;
                match current.children.iter().position(|child| child.name == segment) {
                    Some(index) => current = &mut current.children[index],
                    None => return Ok(None),
                }
            }
        }
        current.ensure_listed(source)?;
        Ok(Some(current))
    }

    /// Finds an already listed entry without touching the source.
    pub(crate) fn find(&self, id: &str) -> Option<&Entry> {
        let mut current = self;
        if !id.is_empty() {
            for segment in id.split('.') {
                current = current.children.iter().find(|child| child.name == segment)?;
            }
        }
        Some(current)
    }

    /// Adds a generated child, replacing a previous child of the same name.
    pub(crate) fn insert_generated(&mut self, child: Entry) {
        self.children.retain(|existing| existing.name != child.name);
        self.children.push(child);
    }

    pub(crate) fn remove_generated_children(&mut self) {
        self.children.retain(|child| !child.generated);
    }

    /// Drops a child until this entry is refreshed again. Returns whether there was one.
    pub(crate) fn remove_child(&mut self, name: &str) -> bool {
        let before = self.children.len();
        self.children.retain(|child| child.name != name);
        self.children.len() != before
    }

    /// Visits this entry and every listed entry below it, parents first.
    pub(crate) fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a Entry)) {
        visit(self);
        for child in &self.children {
            child.walk(visit);
        }
    }

    pub(crate) fn info(&self) -> EntryInfo {
        EntryInfo {
            id: self.id.clone(),
            name: self.name.clone(),
            is_leaf: self.is_leaf,
            generated: self.generated,
            node: self.node.clone(),
            children: self.children.iter().map(|child| child.id.clone()).collect(),
        }
    }
}

fn child_id(parent_id: &str, name: &str) -> String {
    if parent_id.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", parent_id, name)
    }
}
