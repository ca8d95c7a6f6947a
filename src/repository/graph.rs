use linked_hash_map::LinkedHashMap;
use std::collections::{HashMap, HashSet};

/// DependencyGraph holds the references of every loaded node and the inverse index of dependents.
///
/// `dependents[x]` always holds exactly the ids `y` with `x` in `references[y]`.
#[derive(Default)]
pub(crate) struct DependencyGraph {
    references: HashMap<String, Vec<String>>,
    dependents: HashMap<String, Vec<String>>,
}

impl DependencyGraph {
    pub(crate) fn register(&mut self, id: &str, references: &[String]) {
        self.unregister(id);

        for reference in references {
            let dependents = self.dependents.entry(reference.clone()).or_default();
            if !dependents.iter().any(|dependent| dependent == id) {
                dependents.push(id.to_string());
            }
        }
        self.references.insert(id.to_string(), references.to_vec());
    }

    /// Returns whether `id` was registered.
    pub(crate) fn unregister(&mut self, id: &str) -> bool {
        let references = match self.references.remove(id) {
            Some(references) => references,
            None => return false,
        };

        for reference in references {
            if let Some(dependents) = self.dependents.get_mut(&reference) {
                dependents.retain(|dependent| dependent != id);
                if dependents.is_empty() {
                    self.dependents.remove(&reference);
                }
            }
        }
        true
    }

    pub(crate) fn references(&self, id: &str) -> Option<&[String]> {
        self.references.get(id).map(Vec::as_slice)
    }

    pub(crate) fn dependents(&self, id: &str) -> Option<&[String]> {
        self.dependents.get(id).map(Vec::as_slice)
    }

    /// Everything that transitively depends on any of `ids`, each id once.
    ///
    /// Ids are ordered by their last position in a depth-first walk of the dependents, so an id always comes
    /// after the ids it depends on within the closure. An origin id only appears when it depends on another
    /// origin id.
    pub(crate) fn closure<'a>(&self, ids: impl IntoIterator<Item = &'a str>) -> Vec<String> {
        let mut ordered = LinkedHashMap::new();
        for id in ids {
            let mut visiting = HashSet::new();
            visiting.insert(id.to_string());
            self.collect_dependents(id, &mut visiting, &mut ordered);
            ordered.remove(id);
        }
        ordered.into_iter().map(|(id, _)| id).collect()
    }

    fn collect_dependents(&self, id: &str, visiting: &mut HashSet<String>, ordered: &mut LinkedHashMap<String, ()>) {
        let dependents = match self.dependents.get(id) {
            Some(dependents) => dependents,
            None => return,
        };

        for dependent in dependents {
            move_to_back(ordered, dependent);
        }
        for dependent in dependents {
            if visiting.insert(dependent.clone()) {
                self.collect_dependents(dependent, visiting, ordered);
                visiting.remove(dependent);
            }
        }
    }
}

fn move_to_back(ordered: &mut LinkedHashMap<String, ()>, id: &str) {
    ordered.remove(id);
    ordered.insert(id.to_string(), ());
}
