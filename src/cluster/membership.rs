use crate::cluster::error::ClusterError;
use crate::cluster::master::{MasterListener, MasterSwitchRegistry};
use crate::config::{ClusterConfig, ConnectionOptions, Host, Member};
use crate::election::ElectionClient;
use crate::peer::{PeerConnection, PeerConnector, PeerError};
use crate::repository::{
    FsTreeSource, LocalLookup, ManagerRegistry, MirrorRepository, Repository, SourceResolver, TreeSource,
};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, RwLock};
use tokio::sync::watch;

/// Collaborators shared by every cluster membership of this node.
#[derive(Clone)]
pub struct NodeContext {
    pub logger: slog::Logger,
    /// This node's own repository.
    pub local: Arc<dyn Repository>,
    pub connector: Arc<dyn PeerConnector>,
    pub sources: Arc<dyn SourceResolver>,
    pub managers: Arc<ManagerRegistry>,
    pub switches: Arc<MasterSwitchRegistry>,
    /// Parent directory of the private repositories of simulated clusters.
    pub simulation_root: PathBuf,
}

/// ClusterMembership is this node's view of one configured cluster: its hosts, its master and the
/// repository shared by its members.
pub struct ClusterMembership {
    id: String,
    config: ClusterConfig,
    hosts: Vec<Host>,
    options: ConnectionOptions,
    local_lookup: LocalLookup,
    context: NodeContext,
    logger: slog::Logger,
    // Keyed by raw host string.
    connections: Mutex<HashMap<String, Arc<dyn PeerConnection>>>,
    host_names: Mutex<HashMap<String, String>>,
    master_tx: watch::Sender<Option<String>>,
    master_rx: watch::Receiver<Option<String>>,
    // Serializes master transitions.
    transition: Mutex<()>,
    election: RwLock<Option<Arc<dyn ElectionClient>>>,
    repository: tokio::sync::Mutex<Option<Arc<dyn Repository>>>,
}

impl ClusterMembership {
    pub fn new(id: impl Into<String>, config: ClusterConfig, context: NodeContext) -> Result<Self, ClusterError> {
        let id = id.into();
        let hosts = config.parsed_hosts()?;
        let local_lookup = match config.local_lookup_pattern()? {
            Some(pattern) => LocalLookup::enabled(Some(pattern)),
            None if config.simulate => LocalLookup::enabled(None),
            None => LocalLookup::disabled(),
        };
        let (master_tx, master_rx) = watch::channel(None);

        Ok(ClusterMembership {
            logger: context.logger.new(slog::o!("Cluster" => id.clone())),
            options: ConnectionOptions::from(&config),
            id,
            config,
            hosts,
            local_lookup,
            context,
            connections: Mutex::new(HashMap::new()),
            host_names: Mutex::new(HashMap::new()),
            master_tx,
            master_rx,
            transition: Mutex::new(()),
            election: RwLock::new(None),
            repository: tokio::sync::Mutex::new(None),
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn config(&self) -> &ClusterConfig {
        &self.config
    }

    pub fn hosts(&self) -> &[Host] {
        &self.hosts
    }

    pub fn members(&self) -> Vec<Member> {
        self.hosts
            .iter()
            .filter_map(|host| Member::parse(host.as_str()).ok())
            .collect()
    }

    /// Whether this node takes part in the cluster's election.
    pub fn is_cluster_member(&self) -> bool {
        self.election_client().is_some()
    }

    // ------- Master --------

    pub fn master(&self) -> Option<String> {
        self.master_rx.borrow().clone()
    }

    /// A single host cluster needs no election: its only member is always master.
    pub fn is_master(&self) -> bool {
        self.hosts.len() <= 1 || self.election_client().map_or(false, |client| client.is_current_master())
    }

    /// Records a new master. Switchers are told before the new value becomes visible here, and only on change.
    pub fn set_master(&self, new_master: Option<String>) {
        let _transition = self.transition.lock().expect("ClusterMembership.set_master() mutex guard poison");
        if *self.master_rx.borrow() == new_master {
            return;
        }

        let is_master = self.hosts.len() <= 1
            || self
                .election_client()
                .map_or(false, |client| new_master.as_deref() == Some(client.identity()));
        slog::info!(self.logger, "Master switching to {:?} (this node: {})", new_master, is_master);

        self.context.switches.notify(&self.id, new_master.as_deref(), is_master);
        // Our own receiver keeps the channel open.
        let _ = self.master_tx.send(new_master);
    }

    pub fn master_listener(&self) -> MasterListener {
        MasterListener::new(self.master_rx.clone())
    }

    pub fn election_client(&self) -> Option<Arc<dyn ElectionClient>> {
        self.election
            .read()
            .expect("ClusterMembership.election_client() RwLock poison")
            .clone()
    }

    pub fn set_election_client(&self, client: Option<Arc<dyn ElectionClient>>) {
        *self
            .election
            .write()
            .expect("ClusterMembership.set_election_client() RwLock poison") = client;
    }

    // ------- Connections --------

    fn find_host(&self, identifier: &str) -> Option<&Host> {
        if let Some(host) = self.hosts.iter().find(|host| host.as_str() == identifier) {
            return Some(host);
        }

        let names = self
            .host_names
            .lock()
            .expect("ClusterMembership.find_host() mutex guard poison");
        let found = names
            .iter()
            .find(|(_, name)| name.as_str() == identifier)
            .and_then(|(raw, _)| self.hosts.iter().find(|host| host.as_str() == raw.as_str()));
        found
    }

    /// The connection to a host, named by its configured string or its canonical name.
    /// At most one connection is ever created per host.
    pub fn connection(&self, identifier: &str) -> Result<Option<Arc<dyn PeerConnection>>, PeerError> {
        let host = match self.find_host(identifier) {
            Some(host) => host,
            None => {
                slog::debug!(self.logger, "{} is not a host of this cluster", identifier);
                return Ok(None);
            }
        };

        let mut connections = self
            .connections
            .lock()
            .expect("ClusterMembership.connection() mutex guard poison");
        if let Some(connection) = connections.get(host.as_str()) {
            return Ok(Some(connection.clone()));
        }

        let connection = self.context.connector.connect(&self.logger, host, &self.options)?;
        connections.insert(host.as_str().to_string(), connection.clone());
        Ok(Some(connection))
    }

    fn connection_or_log(&self, host: &Host) -> Option<Arc<dyn PeerConnection>> {
        match self.connection(host.as_str()) {
            Ok(connection) => connection,
            Err(e) => {
                slog::error!(self.logger, "Could not connect to {}: {}", host, e);
                None
            }
        }
    }

    /// Canonical names of the hosts, keyed by configured host string. Hosts that can't be reached are left out.
    pub async fn host_names(&self) -> HashMap<String, String> {
        let missing: Vec<&Host> = {
            let names = self
                .host_names
                .lock()
                .expect("ClusterMembership.host_names() mutex guard poison");
            self.hosts.iter().filter(|host| !names.contains_key(host.as_str())).collect()
        };

        for host in missing {
            let connection = match self.connection_or_log(host) {
                Some(connection) => connection,
                None => continue,
            };
            match connection.canonical_name().await {
                Ok(name) => {
                    self.host_names
                        .lock()
                        .expect("ClusterMembership.host_names() mutex guard poison")
                        .insert(host.as_str().to_string(), name);
                }
                Err(e) => slog::warn!(self.logger, "Could not get the name of {}: {}", host, e),
            }
        }

        self.host_names
            .lock()
            .expect("ClusterMembership.host_names() mutex guard poison")
            .clone()
    }

    /// Asks every host to reload everything. Failing hosts are logged and skipped.
    pub async fn reload_all(&self) {
        for host in &self.hosts {
            if let Some(connection) = self.connection_or_log(host) {
                slog::info!(self.logger, "Reloading all on {}", host);
                if let Err(e) = connection.reload_all().await {
                    slog::error!(self.logger, "Reload all failed on {}: {}", host, e);
                }
            }
        }
    }

    /// Asks every host to reload `id`. Failing hosts are logged and skipped.
    pub async fn reload(&self, id: &str) {
        for host in &self.hosts {
            if let Some(connection) = self.connection_or_log(host) {
                slog::info!(self.logger, "Reloading {} on {}", id, host);
                if let Err(e) = connection.reload(id).await {
                    slog::error!(self.logger, "Reload of {} failed on {}: {}", id, host, e);
                }
            }
        }
    }

    // ------- Cluster repository --------

    /// The repository shared by the cluster, built on first use. None when it can't be built.
    pub async fn cluster_repository(&self) -> Option<Arc<dyn Repository>> {
        let mut repository = self.repository.lock().await;
        if repository.is_none() {
            match self.build_repository().await {
                Ok(built) => *repository = Some(built),
                Err(e) => slog::error!(self.logger, "Could not load the cluster repository: {}", e),
            }
        }
        repository.clone()
    }

    /// Drops the cluster repository. The next access builds it again.
    pub async fn discard_cluster_repository(&self) {
        if self.repository.lock().await.take().is_some() {
            slog::info!(self.logger, "Cluster repository discarded");
        }
    }

    async fn build_repository(&self) -> Result<Arc<dyn Repository>, ClusterError> {
        if self.config.simulate {
            return self.build_simulation().await;
        }

        let authority = self
            .hosts
            .first()
            .ok_or_else(|| ClusterError::Configuration("cluster has no hosts".to_string()))?;
        let connection = self
            .connection(authority.as_str())?
            .ok_or_else(|| PeerError::UnknownHost(authority.to_string()))?;
        let location = connection.repository_root().await?;

        if location == self.context.local.root_location() {
            slog::info!(self.logger, "Cluster repository is the local repository");
            return Ok(self.context.local.clone());
        }

        slog::info!(self.logger, "Mirroring cluster repository {} of {}", location, authority);
        let source = self.context.sources.resolve(&location)?;
        self.start_mirror(source).await
    }

    async fn build_simulation(&self) -> Result<Arc<dyn Repository>, ClusterError> {
        let source: Arc<dyn TreeSource> = match &self.config.uri {
            Some(location) => self.context.sources.resolve(location)?,
            None => {
                let dir = self.context.simulation_root.join(&self.id);
                std::fs::create_dir_all(&dir).map_err(ClusterError::Storage)?;
                Arc::new(FsTreeSource::open(dir)?)
            }
        };

        slog::info!(self.logger, "Simulating cluster repository from {}", source.location());
        self.start_mirror(source).await
    }

    async fn start_mirror(&self, source: Arc<dyn TreeSource>) -> Result<Arc<dyn Repository>, ClusterError> {
        let mirror = Arc::new(MirrorRepository::mirroring(
            self.logger.clone(),
            source,
            self.context.local.clone(),
            self.local_lookup.clone(),
            self.context.managers.clone(),
        ));

        let starting = mirror.clone();
        tokio::task::spawn_blocking(move || starting.start())
            .await
            .map_err(|e| ClusterError::Task(e.to_string()))??;

        Ok(mirror)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::master::MasterSwitcher;
    use crate::repository::{DefaultSourceResolver, InMemorySource, NodeDescriptor};
    use crate::test_utils::{node_context, write_node, FakeElectionClient};
    use serde_json::json;
    use std::sync::atomic::Ordering;

    fn config(hosts: &[&str]) -> ClusterConfig {
        ClusterConfig {
            hosts: hosts.iter().map(|h| h.to_string()).collect(),
            ..Default::default()
        }
    }

    #[derive(Default)]
    struct Recording {
        seen: Mutex<Vec<(Option<String>, bool)>>,
    }

    impl MasterSwitcher for Recording {
        fn master_switched(&self, _cluster_id: &str, new_master: Option<&str>, is_master: bool) {
            self.seen.lock().unwrap().push((new_master.map(String::from), is_master));
        }
    }

    #[test]
    fn invalid_configuration_is_rejected() {
        let (context, _) = node_context();
        assert!(matches!(
            ClusterMembership::new("c", config(&["a:x"]), context.clone()),
            Err(ClusterError::InvalidHost(_))
        ));

        let bad_pattern = ClusterConfig {
            local_lookup_regex: Some("(".into()),
            ..config(&["a"])
        };
        assert!(matches!(
            ClusterMembership::new("c", bad_pattern, context),
            Err(ClusterError::InvalidPattern(_))
        ));
    }

    #[test]
    fn trivial_clusters_are_always_master() {
        let (context, _) = node_context();
        assert!(ClusterMembership::new("c", config(&[]), context.clone()).unwrap().is_master());
        assert!(ClusterMembership::new("c", config(&["a"]), context.clone()).unwrap().is_master());

        let pair = ClusterMembership::new("c", config(&["a", "b"]), context).unwrap();
        assert!(!pair.is_master());
        pair.set_election_client(Some(FakeElectionClient::new("a:5555", Some("a:5555"))));
        assert!(pair.is_master());
    }

    #[test]
    fn switchers_hear_each_transition_once() {
        let (context, _) = node_context();
        let recording = Arc::new(Recording::default());
        context.switches.register(recording.clone());

        let membership = ClusterMembership::new("c", config(&["a", "b"]), context).unwrap();
        membership.set_election_client(Some(FakeElectionClient::new("a", None)));

        membership.set_master(Some("a".into()));
        membership.set_master(Some("a".into()));
        membership.set_master(Some("b".into()));
        membership.set_master(None);
        membership.set_master(None);

        assert_eq!(
            *recording.seen.lock().unwrap(),
            vec![(Some("a".into()), true), (Some("b".into()), false), (None, false)]
        );
        assert_eq!(membership.master(), None);
    }

    #[test]
    fn members_use_their_own_default_port() {
        let (context, _) = node_context();
        let membership = ClusterMembership::new("c", config(&["a", "b:5555"]), context).unwrap();
        let ports: Vec<u16> = membership.members().iter().map(|m| m.port).collect();
        assert_eq!(ports, vec![80, 5555]);
        assert_eq!(membership.hosts()[0].port(), 5555);
    }

    #[tokio::test]
    async fn connections_are_created_once_and_found_by_name() {
        let (context, connector) = node_context();
        connector.add_peer("a:5555", "alpha", "memory://a");
        connector.add_peer("b:5555", "beta", "memory://b");
        let membership = ClusterMembership::new("c", config(&["a:5555", "b:5555"]), context).unwrap();

        assert!(membership.connection("beta").unwrap().is_none());
        let first = membership.connection("a:5555").unwrap().unwrap();
        let again = membership.connection("a:5555").unwrap().unwrap();
        assert!(Arc::ptr_eq(&first, &again));
        assert_eq!(connector.connects.load(Ordering::SeqCst), 1);

        let names = membership.host_names().await;
        assert_eq!(names.get("b:5555").map(String::as_str), Some("beta"));
        let by_name = membership.connection("beta").unwrap().unwrap();
        assert_eq!(by_name.host().as_str(), "b:5555");
        assert!(membership.connection("gamma").unwrap().is_none());
    }

    #[tokio::test]
    async fn unreachable_hosts_are_skipped() {
        let (context, connector) = node_context();
        connector.add_peer("a:5555", "alpha", "memory://a");
        let b = connector.add_peer("b:5555", "beta", "memory://b");
        b.set_up(false);
        let membership = ClusterMembership::new("c", config(&["a:5555", "b:5555"]), context).unwrap();

        let names = membership.host_names().await;
        assert_eq!(names.len(), 1);
        assert_eq!(names["a:5555"], "alpha");

        membership.reload("svc").await;
        membership.reload_all().await;
        assert_eq!(
            connector.peer("a:5555").calls(),
            vec!["canonical_name", "reload svc", "reload_all"]
        );

        b.set_up(true);
        assert_eq!(membership.host_names().await.len(), 2);
    }

    #[tokio::test]
    async fn colocated_cluster_uses_the_local_repository() {
        let (context, connector) = node_context();
        connector.add_peer("a:5555", "alpha", &context.local.root_location());
        let membership = ClusterMembership::new("c", config(&["a:5555", "b:5555"]), context.clone()).unwrap();

        let repository = membership.cluster_repository().await.unwrap();
        assert!(Arc::ptr_eq(&repository, &context.local));
    }

    #[tokio::test]
    async fn remote_cluster_repository_is_mirrored() {
        let (context, connector) = node_context();
        let remote = tempfile::tempdir().unwrap();
        write_node(remote.path(), "svc.v1", json!({"type": "service"}));
        connector.add_peer("a:5555", "alpha", &format!("file://{}", remote.path().display()));
        let membership = ClusterMembership::new("c", config(&["a:5555"]), context).unwrap();

        let repository = membership.cluster_repository().await.unwrap();
        assert!(repository.node("svc.v1").is_some());
        assert!(Arc::ptr_eq(&repository, &membership.cluster_repository().await.unwrap()));

        membership.discard_cluster_repository().await;
        assert!(!Arc::ptr_eq(&repository, &membership.cluster_repository().await.unwrap()));
    }

    #[tokio::test]
    async fn unreachable_authority_means_no_repository() {
        let (context, connector) = node_context();
        connector.add_peer("a:5555", "alpha", "memory://a").set_up(false);
        let membership = ClusterMembership::new("c", config(&["a:5555"]), context).unwrap();

        assert!(membership.cluster_repository().await.is_none());
    }

    #[tokio::test]
    async fn simulation_uses_a_private_directory_with_local_lookup() {
        let (context, _) = node_context();
        let simulate = ClusterConfig {
            simulate: true,
            ..config(&["a", "b"])
        };
        let membership = ClusterMembership::new("sim", simulate, context.clone()).unwrap();

        let repository = membership.cluster_repository().await.unwrap();
        let private = context.simulation_root.join("sim");
        assert!(private.is_dir());
        assert_eq!(repository.root_location(), format!("file://{}", private.display()));
        // Falls through to the local repository.
        assert!(repository.node("local.thing").is_some());
    }

    #[tokio::test]
    async fn simulation_from_a_configured_location() {
        let (context, _) = node_context();
        let shared = Arc::new(InMemorySource::new("shared"));
        shared.put(
            "x.y",
            NodeDescriptor {
                artifact_type: "library".into(),
                ..Default::default()
            },
        );
        let resolver = DefaultSourceResolver::new();
        resolver.mount(shared);
        let context = NodeContext {
            sources: Arc::new(resolver),
            ..context
        };

        let simulate = ClusterConfig {
            simulate: true,
            uri: Some("memory://shared".into()),
            local_lookup_regex: Some("nothing\\..*".into()),
            ..config(&["a"])
        };
        let membership = ClusterMembership::new("sim", simulate, context).unwrap();

        let repository = membership.cluster_repository().await.unwrap();
        assert!(repository.node("x.y").is_some());
        assert!(repository.node("local.thing").is_none());
    }
}
