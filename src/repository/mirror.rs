use crate::operations::OperationRegistry;
use crate::repository::api::{Artifact, EntryInfo, Node, Repository, RepositoryError};
use crate::repository::entry::Entry;
use crate::repository::events::{self, RepositoryEventListener, RepositoryEventNotifier, RepositoryState};
use crate::repository::graph::DependencyGraph;
use crate::repository::manager::ManagerRegistry;
use crate::repository::source::TreeSource;
use crate::repository::type_index::TypeIndex;
use regex::Regex;
use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, RwLock};

/// Whether ids missing from a mirror may be looked up in the local repository instead.
#[derive(Clone, Debug)]
pub struct LocalLookup {
    enabled: bool,
    pattern: Option<Regex>,
}

impl LocalLookup {
    pub fn disabled() -> Self {
        LocalLookup {
            enabled: false,
            pattern: None,
        }
    }

    /// Enables the fallback, for every id or only for ids matching `pattern`.
    pub fn enabled(pattern: Option<Regex>) -> Self {
        LocalLookup { enabled: true, pattern }
    }

    fn allows(&self, id: &str) -> bool {
        self.enabled && self.pattern.as_ref().map_or(true, |pattern| pattern.is_match(id))
    }
}

struct MirrorState {
    root: Entry,
    graph: DependencyGraph,
}

/// MirrorRepository is a repository read from a tree source, tracking the dependencies between its nodes
/// so that reloading a node also reloads whatever depends on it.
///
/// A mirror may sit on top of the local repository: ids it doesn't know can then fall through to the local
/// repository, and operations are the local repository's ones.
pub struct MirrorRepository {
    logger: slog::Logger,
    source: Arc<dyn TreeSource>,
    local: Option<Arc<dyn Repository>>,
    local_lookup: LocalLookup,
    managers: Arc<ManagerRegistry>,
    // Lock order: state, then type_index.
    state: Mutex<MirrorState>,
    type_index: Mutex<Option<TypeIndex>>,
    events: RepositoryEventNotifier,
    operations: RwLock<Option<Arc<OperationRegistry>>>,
}

impl MirrorRepository {
    pub fn standalone(logger: slog::Logger, source: Arc<dyn TreeSource>, managers: Arc<ManagerRegistry>) -> Self {
        Self::create(logger, source, None, LocalLookup::disabled(), managers)
    }

    pub fn mirroring(
        logger: slog::Logger,
        source: Arc<dyn TreeSource>,
        local: Arc<dyn Repository>,
        local_lookup: LocalLookup,
        managers: Arc<ManagerRegistry>,
    ) -> Self {
        Self::create(logger, source, Some(local), local_lookup, managers)
    }

    fn create(
        logger: slog::Logger,
        source: Arc<dyn TreeSource>,
        local: Option<Arc<dyn Repository>>,
        local_lookup: LocalLookup,
        managers: Arc<ManagerRegistry>,
    ) -> Self {
        MirrorRepository {
            logger,
            source,
            local,
            local_lookup,
            managers,
            state: Mutex::new(MirrorState {
                root: Entry::root(),
                graph: DependencyGraph::default(),
            }),
            type_index: Mutex::new(None),
            events: events::new(),
            operations: RwLock::new(None),
        }
    }

    /// Loads the whole tree. Blocks on the source.
    pub fn start(&self) -> Result<(), RepositoryError> {
        slog::info!(self.logger, "Loading repository from {}", self.source.location());
        self.events.notify(RepositoryState::Load, false);

        let result = {
            let mut state = self.lock_state();
            state.root.ensure_listed(&*self.source).map(|_| {
                self.load_subtree(&mut state, "", false);
            })
        };

        self.events.notify(RepositoryState::Load, true);
        result
    }

    fn lock_state(&self) -> MutexGuard<'_, MirrorState> {
        self.state.lock().expect("MirrorRepository.state mutex guard poison")
    }

    fn invalidate_type_index(&self) {
        self.type_index
            .lock()
            .expect("MirrorRepository.invalidate_type_index() mutex guard poison")
            .take();
    }

    // ------- Loading --------

    fn load_subtree(&self, state: &mut MirrorState, id: &str, refresh: bool) {
        slog::debug!(self.logger, "Loading: '{}'", id);

        let mut managed = Vec::new();
        {
            let MirrorState { root, graph } = &mut *state;
            let entry = match root.find_mut(id, &*self.source) {
                Ok(Some(entry)) => entry,
                Ok(None) => return,
                Err(e) => {
                    slog::warn!(self.logger, "Could not load '{}': {}", id, e);
                    return;
                }
            };
            self.load_entry(entry, graph, refresh, &mut managed);
        }
        self.invalidate_type_index();

        // Managers of nodes without references first, the others may reference what they generate.
        let (independent, dependent): (Vec<_>, Vec<_>) = managed.into_iter().partition(|(_, has_refs)| !has_refs);
        for (manager_id, _) in independent.into_iter().chain(dependent) {
            self.load_generated(state, &manager_id);
        }
    }

    fn load_entry(
        &self,
        entry: &mut Entry,
        graph: &mut DependencyGraph,
        refresh: bool,
        managed: &mut Vec<(String, bool)>,
    ) {
        let listed = if refresh {
            entry.refresh(&*self.source)
        } else {
            entry.ensure_listed(&*self.source)
        };
        if let Err(e) = listed {
            slog::warn!(self.logger, "Could not read entry '{}': {}", entry.id(), e);
        }

        if let Some(node) = entry.node() {
            slog::debug!(self.logger, "Loading entry: {}", entry.id());
            graph.register(entry.id(), node.references());
            match node.manager() {
                Some(tag) if self.managers.contains(tag) => {
                    managed.push((entry.id().to_string(), !node.references().is_empty()));
                }
                Some(tag) => slog::warn!(self.logger, "No artifact repository manager '{}' for {}", tag, entry.id()),
                None => {}
            }
        }

        for child in entry.children_mut() {
            self.load_entry(child, graph, refresh, managed);
        }
    }

    fn load_generated(&self, state: &mut MirrorState, manager_id: &str) {
        let MirrorState { root, graph } = state;
        let entry = match root.find_mut(manager_id, &*self.source) {
            Ok(Some(entry)) => entry,
            _ => return,
        };
        let node = match entry.node() {
            Some(node) => node.clone(),
            None => return,
        };
        let manager = match node.manager().and_then(|tag| self.managers.get(tag)) {
            Some(manager) => manager,
            None => return,
        };

        slog::debug!(self.logger, "Loading children of: {}", manager_id);
        match manager.add_children(manager_id, &node.artifact()) {
            Ok(children) => {
                for child in children {
                    let generated = Entry::generated(manager_id, &child.name, child.descriptor);
                    if let Some(node) = generated.node() {
                        graph.register(generated.id(), node.references());
                    }
                    entry.insert_generated(generated);
                }
            }
            Err(e) => slog::error!(
                self.logger,
                "Could not finish loading generated children of {}: {}",
                manager_id,
                e
            ),
        }
    }

    // ------- Unloading --------

    fn unload_subtree(&self, state: &mut MirrorState, id: &str) {
        slog::debug!(self.logger, "Unloading: '{}'", id);

        let MirrorState { root, graph } = state;
        match root.find_mut(id, &*self.source) {
            Ok(Some(entry)) => self.unload_entry(entry, graph),
            Ok(None) => {}
            Err(e) => slog::warn!(self.logger, "Could not unload '{}': {}", id, e),
        }
        self.invalidate_type_index();
    }

    fn unload_entry(&self, entry: &mut Entry, graph: &mut DependencyGraph) {
        if let Some(node) = entry.node() {
            let registered = graph.unregister(entry.id());
            if registered && node.is_loaded() {
                if let Some(manager) = node.manager().and_then(|tag| self.managers.get(tag)) {
                    if let Err(e) = manager.remove_children(entry.id(), &node.artifact()) {
                        slog::error!(
                            self.logger,
                            "Could not finish unloading generated children of {}: {}",
                            entry.id(),
                            e
                        );
                    }
                }
            }
        }

        for child in entry.children_mut() {
            self.unload_entry(child, graph);
        }
        entry.remove_generated_children();
    }

    // ------- Reloading --------

    fn contains(&self, state: &mut MirrorState, id: &str) -> Result<bool, RepositoryError> {
        Ok(state.root.find_mut(id, &*self.source)?.is_some())
    }

    fn reload_locked(&self, state: &mut MirrorState, id: &str, recursive: bool) -> Result<(), RepositoryError> {
        let origins = self.reload_target(state, id, recursive)?;
        if recursive {
            self.reload_dependents(state, &origins)?;
        }
        Ok(())
    }

    /// Reloads `id`, or with `climb` its closest existing ancestor, and returns the nodes found below it.
    fn reload_target(&self, state: &mut MirrorState, id: &str, climb: bool) -> Result<Vec<String>, RepositoryError> {
        slog::info!(self.logger, "Reloading: {}", id);

        let mut target = id.to_string();
        let mut found = self.contains(state, &target)?;
        while !found {
            // A new top level entry only shows up once the root is listed again.
            if !target.contains('.') {
                state.root.refresh(&*self.source)?;
                self.invalidate_type_index();
                found = self.contains(state, &target)?;
                break;
            }
            if !climb {
                break;
            }
            if let Some(index) = target.rfind('.') {
                target.truncate(index);
            }
            found = self.contains(state, &target)?;
        }
        if !found {
            slog::debug!(self.logger, "Nothing to reload for {}", id);
            return Ok(Vec::new());
        }

        self.unload_subtree(state, &target);
        self.load_subtree(state, &target, true);

        let mut origins = Vec::new();
        if let Some(entry) = state.root.find(&target) {
            entry.walk(&mut |entry| {
                if entry.node().is_some() {
                    origins.push(entry.id().to_string());
                }
            });
        }
        Ok(origins)
    }

    /// Reloads every dependent of `origins` once, non-recursively.
    fn reload_dependents(&self, state: &mut MirrorState, origins: &[String]) -> Result<(), RepositoryError> {
        let mut closure = state.graph.closure(origins.iter().map(String::as_str));
        closure.retain(|dependent| !origins.contains(dependent));
        for dependent in closure {
            self.reload_target(state, &dependent, false)?;
        }
        Ok(())
    }

    fn list_tree(&self, entry: &mut Entry) {
        if let Err(e) = entry.ensure_listed(&*self.source) {
            slog::warn!(self.logger, "Could not list '{}': {}", entry.id(), e);
        }
        for child in entry.children_mut() {
            self.list_tree(child);
        }
    }

    fn local_for(&self, id: &str) -> Option<&Arc<dyn Repository>> {
        self.local.as_ref().filter(|_| self.local_lookup.allows(id))
    }
}

impl Repository for MirrorRepository {
    fn root_location(&self) -> String {
        self.source.location()
    }

    fn entry(&self, id: &str) -> Option<EntryInfo> {
        let found = match self.lock_state().root.find_mut(id, &*self.source) {
            Ok(found) => found.map(|entry| entry.info()),
            Err(e) => {
                slog::debug!(self.logger, "Could not look up '{}': {}", id, e);
                None
            }
        };

        found.or_else(|| self.local_for(id).and_then(|local| local.entry(id)))
    }

    fn node(&self, id: &str) -> Option<Arc<Node>> {
        let found = match self.lock_state().root.find_mut(id, &*self.source) {
            Ok(found) => found.and_then(|entry| entry.node().cloned()),
            Err(_) => None,
        };

        found.or_else(|| self.local_for(id).and_then(|local| local.node(id)))
    }

    fn artifacts(&self, artifact_type: &str) -> Vec<Arc<Artifact>> {
        let nodes = {
            let mut state = self.lock_state();
            let mut type_index = self
                .type_index
                .lock()
                .expect("MirrorRepository.artifacts() mutex guard poison");
            if type_index.is_none() {
                self.list_tree(&mut state.root);
                *type_index = Some(TypeIndex::scan(&state.root));
            }
            type_index
                .as_ref()
                .map(|index| index.nodes(artifact_type))
                .unwrap_or_default()
        };

        let mut artifacts: Vec<Arc<Artifact>> = nodes.iter().map(|node| node.artifact()).collect();

        if let Some(local) = self.local.as_ref().filter(|_| self.local_lookup.enabled) {
            let known: HashSet<String> = artifacts.iter().map(|a| a.id().to_string()).collect();
            artifacts.extend(
                local
                    .artifacts(artifact_type)
                    .into_iter()
                    .filter(|a| !known.contains(a.id()) && self.local_lookup.allows(a.id())),
            );
            artifacts.sort_by(|a, b| a.id().cmp(b.id()));
        }

        artifacts
    }

    fn references(&self, id: &str) -> Vec<String> {
        if let Some(references) = self.lock_state().graph.references(id) {
            return references.to_vec();
        }
        self.local_for(id).map(|local| local.references(id)).unwrap_or_default()
    }

    fn dependencies(&self, id: &str) -> Vec<String> {
        if let Some(dependents) = self.lock_state().graph.dependents(id) {
            return dependents.to_vec();
        }
        self.local_for(id).map(|local| local.dependencies(id)).unwrap_or_default()
    }

    fn reload(&self, id: &str) -> Result<(), RepositoryError> {
        self.events.notify(RepositoryState::Reload, false);
        let result = self.reload_locked(&mut self.lock_state(), id, true);
        self.events.notify(RepositoryState::Reload, true);
        result
    }

    fn reload_many(&self, ids: &[String]) -> Result<(), RepositoryError> {
        self.events.notify(RepositoryState::Reload, false);

        let mut result = Ok(());
        {
            let mut state = self.lock_state();
            let mut origins = Vec::new();
            for id in ids {
                match self.reload_target(&mut state, id, true) {
                    Ok(found) => origins.extend(found),
                    Err(e) => {
                        slog::error!(self.logger, "Could not reload {}: {}", id, e);
                        if result.is_ok() {
                            result = Err(e);
                        }
                    }
                }
            }
            if let Err(e) = self.reload_dependents(&mut state, &origins) {
                slog::error!(self.logger, "Could not reload the dependents of {:?}: {}", ids, e);
                if result.is_ok() {
                    result = Err(e);
                }
            }
        }

        self.events.notify(RepositoryState::Reload, true);
        result
    }

    fn reload_all(&self) -> Result<(), RepositoryError> {
        slog::info!(self.logger, "Reloading everything from {}", self.source.location());
        self.events.notify(RepositoryState::Reload, false);

        let result = {
            let mut state = self.lock_state();
            self.unload_subtree(&mut state, "");
            state.root.refresh(&*self.source).map(|_| {
                self.load_subtree(&mut state, "", true);
            })
        };

        self.events.notify(RepositoryState::Reload, true);
        result
    }

    fn unload(&self, id: &str) -> Result<(), RepositoryError> {
        let mut state = self.lock_state();
        self.unload_subtree(&mut state, id);

        // The entry stays out of the tree until its parent is reloaded.
        if !id.is_empty() {
            let (parent_id, name) = match id.rfind('.') {
                Some(index) => (&id[..index], &id[index + 1..]),
                None => ("", id),
            };
            if let Some(parent) = state.root.find_mut(parent_id, &*self.source)? {
                if parent.remove_child(name) {
                    self.invalidate_type_index();
                }
            }
        }
        Ok(())
    }

    fn subscribe(&self) -> RepositoryEventListener {
        self.events.listener()
    }

    fn operations(&self) -> Option<Arc<OperationRegistry>> {
        match &self.local {
            Some(local) => local.operations(),
            None => self
                .operations
                .read()
                .expect("MirrorRepository.operations() RwLock poison")
                .clone(),
        }
    }

    fn set_operations(&self, operations: Arc<OperationRegistry>) -> Result<(), RepositoryError> {
        if self.local.is_some() {
            return Err(RepositoryError::Unsupported("operations of a mirror are the local repository's"));
        }
        self.operations
            .write()
            .expect("MirrorRepository.set_operations() RwLock poison")
            .replace(operations);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClusterConfig;
    use crate::repository::api::NodeDescriptor;
    use crate::repository::events::RepositoryEvent;
    use crate::repository::manager::{ArtifactRepositoryManager, GeneratedChild, ManagerError};
    use crate::repository::source::InMemorySource;
    use crate::test_utils::test_logger;

    fn node(artifact_type: &str, references: &[&str]) -> NodeDescriptor {
        NodeDescriptor {
            artifact_type: artifact_type.into(),
            references: references.iter().map(|r| r.to_string()).collect(),
            ..Default::default()
        }
    }

    fn managed(tag: &str, references: &[&str]) -> NodeDescriptor {
        NodeDescriptor {
            manager: Some(tag.into()),
            ..node("managed", references)
        }
    }

    fn sample_source() -> Arc<InMemorySource> {
        let source = Arc::new(InMemorySource::new("sample"));
        source.put("lib.util", node("library", &[]));
        source.put("lib.log", node("library", &[]));
        source.put("svc.v1", node("service", &["lib.util"]));
        source.put("svc.v2", node("service", &["lib.log"]));
        source
    }

    fn started(source: Arc<InMemorySource>, managers: ManagerRegistry) -> MirrorRepository {
        let repository = MirrorRepository::standalone(test_logger(), source, Arc::new(managers));
        repository.start().unwrap();
        repository
    }

    fn ids(artifacts: Vec<Arc<Artifact>>) -> Vec<String> {
        artifacts.iter().map(|a| a.id().to_string()).collect()
    }

    #[test]
    fn start_loads_references_and_dependents() {
        let repository = started(sample_source(), ManagerRegistry::new());

        assert_eq!(repository.references("svc.v1"), vec!["lib.util"]);
        assert_eq!(repository.dependencies("lib.util"), vec!["svc.v1"]);
        assert!(repository.dependencies("svc.v1").is_empty());

        let svc = repository.entry("svc").unwrap();
        assert!(!svc.is_node());
        assert_eq!(svc.children, vec!["svc.v1", "svc.v2"]);
        assert_eq!(ids(repository.artifacts("service")), vec!["svc.v1", "svc.v2"]);
        assert_eq!(repository.resolve("lib.log").unwrap().artifact_type(), "library");
        assert!(repository.entry("nope").is_none());
    }

    #[test]
    fn reload_also_reloads_dependents() {
        let repository = started(sample_source(), ManagerRegistry::new());
        let dependent = repository.node("svc.v1").unwrap();
        let unrelated = repository.node("svc.v2").unwrap();

        repository.reload("lib.util").unwrap();

        assert!(!Arc::ptr_eq(&dependent, &repository.node("svc.v1").unwrap()));
        assert!(Arc::ptr_eq(&unrelated, &repository.node("svc.v2").unwrap()));
        assert_eq!(repository.dependencies("lib.util"), vec!["svc.v1"]);
    }

    #[test]
    fn reload_of_missing_id_climbs_to_an_existing_ancestor() {
        let source = sample_source();
        let repository = started(source.clone(), ManagerRegistry::new());

        source.put("svc.v1", node("service", &["lib.log"]));
        repository.reload("svc.v1.gone.deeper").unwrap();

        assert_eq!(repository.references("svc.v1"), vec!["lib.log"]);
        assert_eq!(repository.dependencies("lib.log"), vec!["svc.v2", "svc.v1"]);
        assert!(repository.dependencies("lib.util").is_empty());
    }

    #[test]
    fn reload_finds_new_top_level_entries() {
        let source = sample_source();
        let repository = started(source.clone(), ManagerRegistry::new());

        source.put("fresh", node("library", &[]));
        assert!(repository.node("fresh").is_none());

        repository.reload("fresh").unwrap();
        assert_eq!(repository.node("fresh").unwrap().artifact_type(), "library");
        assert_eq!(ids(repository.artifacts("library")), vec!["fresh", "lib.log", "lib.util"]);
    }

    #[test]
    fn reload_drops_removed_entries() {
        let source = sample_source();
        let repository = started(source.clone(), ManagerRegistry::new());

        source.remove("svc.v2");
        repository.reload("svc").unwrap();

        assert!(repository.entry("svc.v2").is_none());
        assert!(repository.dependencies("lib.log").is_empty());
        assert_eq!(ids(repository.artifacts("service")), vec!["svc.v1"]);
    }

    #[test]
    fn unload_and_reload_restore_references() {
        let repository = started(sample_source(), ManagerRegistry::new());

        repository.unload("svc").unwrap();
        assert!(repository.references("svc.v1").is_empty());
        assert!(repository.dependencies("lib.util").is_empty());

        repository.reload("svc").unwrap();
        assert_eq!(repository.references("svc.v1"), vec!["lib.util"]);
        assert_eq!(repository.dependencies("lib.util"), vec!["svc.v1"]);
    }

    #[test]
    fn unload_takes_the_entry_out_of_the_tree() {
        let repository = started(sample_source(), ManagerRegistry::new());

        repository.unload("svc.v1").unwrap();
        assert!(repository.entry("svc.v1").is_none());
        assert!(repository.node("svc.v1").is_none());
        assert_eq!(repository.entry("svc").unwrap().children, vec!["svc.v2"]);
        assert_eq!(ids(repository.artifacts("service")), vec!["svc.v2"]);
        assert!(repository.dependencies("lib.util").is_empty());

        repository.reload("svc.v1").unwrap();
        assert_eq!(repository.references("svc.v1"), vec!["lib.util"]);
        assert_eq!(ids(repository.artifacts("service")), vec!["svc.v1", "svc.v2"]);
    }

    #[test]
    fn unloaded_top_level_entry_comes_back_on_reload() {
        let repository = started(sample_source(), ManagerRegistry::new());

        repository.unload("svc").unwrap();
        assert!(repository.entry("svc").is_none());
        assert!(repository.artifacts("service").is_empty());

        repository.reload("svc.v2").unwrap();
        assert_eq!(repository.entry("svc").unwrap().children, vec!["svc.v1", "svc.v2"]);
        assert_eq!(repository.dependencies("lib.log"), vec!["svc.v2"]);
    }

    #[test]
    fn reload_many_reloads_a_shared_dependent_once() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let source = sample_source();
        source.put("svc.both", managed("plain", &["lib.util", "lib.log"]));
        let repository = started(source, managers(&calls));
        calls.lock().unwrap().clear();

        repository
            .reload_many(&["lib.util".to_string(), "lib.log".to_string()])
            .unwrap();

        assert_eq!(
            *calls.lock().unwrap(),
            vec!["remove plain svc.both", "add plain svc.both"]
        );
        let mut dependents = repository.dependencies("lib.log");
        dependents.sort();
        assert_eq!(dependents, vec!["svc.both", "svc.v2"]);
    }

    #[test]
    fn reload_all_rereads_everything() {
        let source = sample_source();
        let repository = started(source.clone(), ManagerRegistry::new());

        source.put("svc.v2", node("service", &["lib.util"]));
        source.put("extra", node("service", &[]));
        repository.reload_all().unwrap();

        assert_eq!(repository.dependencies("lib.util"), vec!["svc.v1", "svc.v2"]);
        assert_eq!(ids(repository.artifacts("service")), vec!["extra", "svc.v1", "svc.v2"]);
    }

    #[test]
    fn reload_events_bracket_the_outermost_call() {
        let repository = started(sample_source(), ManagerRegistry::new());
        let mut listener = repository.subscribe();

        repository.reload("lib.util").unwrap();
        repository.reload_many(&["lib.log".to_string(), "svc".to_string()]).unwrap();

        let expected = [false, true, false, true];
        for done in &expected {
            assert_eq!(
                listener.try_next(),
                Some(RepositoryEvent {
                    state: RepositoryState::Reload,
                    done: *done
                })
            );
        }
        assert_eq!(listener.try_next(), None);
    }

    fn mirror_over_local(local_lookup_regex: Option<&str>) -> MirrorRepository {
        let local_source = Arc::new(InMemorySource::new("local"));
        local_source.put("x.y", node("library", &[]));
        local_source.put("x.c", node("cluster", &[]));
        let local = started(local_source, ManagerRegistry::new());

        let config = ClusterConfig {
            local_lookup_regex: local_lookup_regex.map(String::from),
            ..Default::default()
        };
        let lookup = LocalLookup::enabled(config.local_lookup_pattern().unwrap());

        let mirror_source = Arc::new(InMemorySource::new("mirror"));
        mirror_source.put("m.c", node("cluster", &[]));
        let mirror = MirrorRepository::mirroring(
            test_logger(),
            mirror_source,
            Arc::new(local),
            lookup,
            Arc::new(ManagerRegistry::new()),
        );
        mirror.start().unwrap();
        mirror
    }

    #[test]
    fn local_lookup_is_gated_by_pattern() {
        let mirror = mirror_over_local(Some("x\\..*"));
        assert_eq!(mirror.entry("x.y").unwrap().id, "x.y");
        assert!(mirror.node("x.y").is_some());
        assert!(mirror.entry("m.c").is_some());

        let mirror = mirror_over_local(Some("z\\..*"));
        assert!(mirror.entry("x.y").is_none());
        assert!(mirror.node("x.y").is_none());
    }

    #[test]
    fn artifacts_merge_local_ones() {
        let mirror = mirror_over_local(None);
        assert_eq!(ids(mirror.artifacts("cluster")), vec!["m.c", "x.c"]);

        let mirror = mirror_over_local(Some("m\\..*"));
        assert_eq!(ids(mirror.artifacts("cluster")), vec!["m.c"]);
    }

    #[test]
    fn mirror_without_lookup_stays_isolated() {
        let local = Arc::new(started(sample_source(), ManagerRegistry::new()));
        let mirror = MirrorRepository::mirroring(
            test_logger(),
            Arc::new(InMemorySource::new("empty")),
            local,
            LocalLookup::disabled(),
            Arc::new(ManagerRegistry::new()),
        );
        mirror.start().unwrap();

        assert!(mirror.entry("svc.v1").is_none());
        assert!(mirror.references("svc.v1").is_empty());
        assert!(mirror.artifacts("service").is_empty());
    }

    #[test]
    fn operations_belong_to_the_local_repository() {
        let standalone = started(sample_source(), ManagerRegistry::new());
        let operations = Arc::new(OperationRegistry::new(test_logger()));
        standalone.set_operations(operations.clone()).unwrap();
        assert!(Arc::ptr_eq(&standalone.operations().unwrap(), &operations));

        let mirror = MirrorRepository::mirroring(
            test_logger(),
            Arc::new(InMemorySource::new("empty")),
            Arc::new(standalone),
            LocalLookup::disabled(),
            Arc::new(ManagerRegistry::new()),
        );
        assert!(Arc::ptr_eq(&mirror.operations().unwrap(), &operations));
        assert!(matches!(
            mirror.set_operations(operations),
            Err(RepositoryError::Unsupported(_))
        ));
    }

    struct RecordingManager {
        name: &'static str,
        calls: Arc<Mutex<Vec<String>>>,
        fail: bool,
    }

    impl ArtifactRepositoryManager for RecordingManager {
        fn add_children(&self, parent_id: &str, _artifact: &Artifact) -> Result<Vec<GeneratedChild>, ManagerError> {
            self.calls.lock().unwrap().push(format!("add {} {}", self.name, parent_id));
            if self.fail {
                return Err(ManagerError("boom".into()));
            }
            Ok(vec![GeneratedChild {
                name: "generated".into(),
                descriptor: node("generated", &["lib.util"]),
            }])
        }

        fn remove_children(&self, parent_id: &str, _artifact: &Artifact) -> Result<(), ManagerError> {
            self.calls.lock().unwrap().push(format!("remove {} {}", self.name, parent_id));
            Ok(())
        }
    }

    fn managers(calls: &Arc<Mutex<Vec<String>>>) -> ManagerRegistry {
        let mut managers = ManagerRegistry::new();
        for (name, fail) in &[("plain", false), ("broken", true)] {
            managers.register(
                *name,
                Arc::new(RecordingManager {
                    name,
                    calls: calls.clone(),
                    fail: *fail,
                }),
            );
        }
        managers
    }

    #[test]
    fn managers_without_references_run_first() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let source = sample_source();
        source.put("a.dependent", managed("plain", &["lib.util"]));
        source.put("b.independent", managed("plain", &[]));

        let repository = started(source, managers(&calls));

        assert_eq!(
            *calls.lock().unwrap(),
            vec!["add plain b.independent", "add plain a.dependent"]
        );
        let generated = repository.entry("b.independent.generated").unwrap();
        assert!(generated.generated);
        assert_eq!(
            repository.dependencies("lib.util"),
            vec!["a.dependent", "svc.v1", "b.independent.generated", "a.dependent.generated"]
        );
    }

    #[test]
    fn failing_manager_does_not_stop_loading() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let source = sample_source();
        source.put("a.broken", managed("broken", &[]));
        source.put("b.fine", managed("plain", &[]));
        source.put("c.unknown", managed("missing", &[]));

        let repository = started(source, managers(&calls));

        assert_eq!(repository.entry("a.broken").unwrap().children, Vec::<String>::new());
        assert!(repository.entry("b.fine.generated").is_some());
        assert!(repository.node("c.unknown").is_some());
        assert_eq!(repository.references("svc.v1"), vec!["lib.util"]);
    }

    #[test]
    fn unloading_a_managed_node_removes_generated_children() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let source = sample_source();
        source.put("b.fine", managed("plain", &[]));
        let repository = started(source, managers(&calls));

        repository.unload("b").unwrap();
        assert!(repository.entry("b.fine.generated").is_none());
        assert_eq!(repository.dependencies("lib.util"), vec!["svc.v1"]);

        repository.reload("b").unwrap();
        assert!(repository.entry("b.fine.generated").is_some());
        assert_eq!(
            *calls.lock().unwrap(),
            vec!["add plain b.fine", "remove plain b.fine", "add plain b.fine"]
        );
    }
}
