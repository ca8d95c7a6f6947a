use crate::cluster::{ClusterMembership, ClusterRegistry, MembershipElectionTransport};
use crate::coordinator::discovery::Discovery;
use crate::election::{ElectionClient, ElectionClientFactory, ElectionSetup, MasterController, ELECTION_CALLBACK_PATH};
use crate::peer::RequestDispatcher;
use std::sync::{Arc, Mutex, RwLock};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CoordinatorState {
    Inactive,
    Electing,
    Active,
}

// Forwards election outcomes to whichever cluster is attached.
#[derive(Default)]
struct ClusterSlot {
    cluster: RwLock<Option<Arc<ClusterMembership>>>,
}

impl ClusterSlot {
    fn get(&self) -> Option<Arc<ClusterMembership>> {
        self.cluster.read().expect("ClusterSlot.get() RwLock poison").clone()
    }

    fn set(&self, cluster: Option<Arc<ClusterMembership>>) {
        *self.cluster.write().expect("ClusterSlot.set() RwLock poison") = cluster;
    }
}

impl MasterController for ClusterSlot {
    fn set_master(&self, master: Option<String>) {
        if let Some(cluster) = self.get() {
            cluster.set_master(master);
        }
    }
}

/// ClusterCoordinator starts this node's part in the election of its cluster.
///
/// Clustering never stops the node from starting: whatever goes wrong is logged and leaves the coordinator
/// `Inactive`.
pub struct ClusterCoordinator {
    logger: slog::Logger,
    state: Mutex<CoordinatorState>,
    slot: Arc<ClusterSlot>,
    election: RwLock<Option<Arc<dyn ElectionClient>>>,
}

impl ClusterCoordinator {
    pub fn new(logger: slog::Logger) -> Self {
        ClusterCoordinator {
            logger: logger.new(slog::o!("Component" => "Coordinator")),
            state: Mutex::new(CoordinatorState::Inactive),
            slot: Arc::new(ClusterSlot::default()),
            election: RwLock::new(None),
        }
    }

    pub fn state(&self) -> CoordinatorState {
        *self.state.lock().expect("ClusterCoordinator.state() mutex guard poison")
    }

    fn set_state(&self, state: CoordinatorState) {
        slog::info!(self.logger, "Coordinator is {:?}", state);
        *self.state.lock().expect("ClusterCoordinator.set_state() mutex guard poison") = state;
    }

    pub fn cluster(&self) -> Option<Arc<ClusterMembership>> {
        self.slot.get()
    }

    pub fn election_client(&self) -> Option<Arc<dyn ElectionClient>> {
        self.election
            .read()
            .expect("ClusterCoordinator.election_client() RwLock poison")
            .clone()
    }

    /// Attaches the cluster election outcomes go to. A running election client is handed over along with
    /// the master it currently knows.
    pub fn set_cluster(&self, cluster: Option<Arc<ClusterMembership>>) {
        self.slot.set(cluster.clone());

        if let (Some(cluster), Some(client)) = (cluster, self.election_client()) {
            cluster.set_election_client(Some(client.clone()));
            if let Some(master) = client.current_master() {
                cluster.set_master(Some(master));
            }
        }
    }

    /// Finds this node's cluster and joins its election. Does nothing once the coordinator has left `Inactive`.
    pub async fn listen(
        &self,
        registry: &ClusterRegistry,
        discovery: &Discovery,
        dispatcher: &RequestDispatcher,
        factory: &dyn ElectionClientFactory,
    ) -> CoordinatorState {
        if self.state() != CoordinatorState::Inactive {
            return self.state();
        }

        let cluster = match discovery.own_cluster(registry).await {
            Ok(Some(cluster)) => cluster,
            Ok(None) => {
                slog::info!(self.logger, "This node is not a member of any cluster");
                return CoordinatorState::Inactive;
            }
            Err(e) => {
                slog::error!(self.logger, "Cluster discovery failed: {}", e);
                return CoordinatorState::Inactive;
            }
        };

        if cluster.hosts().len() <= 1 {
            slog::info!(self.logger, "Cluster {} has a single host, no election needed", cluster.id());
            self.set_cluster(Some(cluster));
            return CoordinatorState::Inactive;
        }

        let own = match discovery.own_host(&cluster).await {
            Ok(Some(own)) => own,
            Ok(None) => {
                slog::error!(self.logger, "Could not find our own server in the cluster {}", cluster.id());
                return CoordinatorState::Inactive;
            }
            Err(e) => {
                slog::error!(self.logger, "Could not find our own server in the cluster {}: {}", cluster.id(), e);
                return CoordinatorState::Inactive;
            }
        };

        self.set_state(CoordinatorState::Electing);
        self.set_cluster(Some(cluster.clone()));

        let setup = ElectionSetup {
            logger: self.logger.new(slog::o!("Cluster" => cluster.id().to_string())),
            identity: own.as_str().to_string(),
            peers: cluster.hosts().iter().map(|host| host.as_str().to_string()).collect(),
            callback_path: ELECTION_CALLBACK_PATH.to_string(),
            controller: self.slot.clone(),
            transport: Arc::new(MembershipElectionTransport::new(Arc::downgrade(&cluster))),
        };
        let client = match factory.create(setup) {
            Ok(client) => client,
            Err(e) => {
                slog::error!(self.logger, "Could not start the election of {}: {}", cluster.id(), e);
                self.set_state(CoordinatorState::Inactive);
                return CoordinatorState::Inactive;
            }
        };

        dispatcher.subscribe(client.handler_path(), client.handler());
        *self
            .election
            .write()
            .expect("ClusterCoordinator.listen() RwLock poison") = Some(client.clone());
        cluster.set_election_client(Some(client.clone()));

        slog::info!(self.logger, "Joining the election of {} as {}", cluster.id(), own);
        client.schedule_election(true);
        self.set_state(CoordinatorState::Active);
        CoordinatorState::Active
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClusterConfig;
    use crate::test_utils::{node_context, test_logger, FakeElectionFactory, FakeResolver};

    fn registry(hosts: &[&str]) -> ClusterRegistry {
        let (context, _) = node_context();
        let config = ClusterConfig {
            hosts: hosts.iter().map(|h| h.to_string()).collect(),
            ..Default::default()
        };
        ClusterRegistry::new(vec![Arc::new(ClusterMembership::new("main", config, context).unwrap())])
    }

    fn discovery() -> Discovery {
        let resolver = FakeResolver::new(&["10.0.0.1"])
            .with_host("a", &["10.0.0.1"])
            .with_host("b", &["10.0.0.2"]);
        Discovery::new(test_logger(), Arc::new(resolver), 5555)
    }

    #[tokio::test]
    async fn joins_the_election_of_its_cluster() {
        let registry = registry(&["a:5555", "b:5555"]);
        let dispatcher = RequestDispatcher::new();
        let factory = FakeElectionFactory::default();
        let coordinator = ClusterCoordinator::new(test_logger());

        let state = coordinator.listen(&registry, &discovery(), &dispatcher, &factory).await;
        assert_eq!(state, CoordinatorState::Active);

        let (identity, peers) = factory.setups().pop().unwrap();
        assert_eq!(identity, "a:5555");
        assert_eq!(peers, vec!["a:5555", "b:5555"]);

        let client = factory.created().pop().unwrap();
        assert_eq!(client.scheduled(), vec![true]);
        assert!(dispatcher.unsubscribe("/cluster/bully").is_some());

        let cluster = registry.get("main").unwrap();
        assert!(cluster.is_cluster_member());
        client.announce(Some("b:5555"));
        assert_eq!(cluster.master().as_deref(), Some("b:5555"));

        // Listening again changes nothing.
        assert_eq!(
            coordinator.listen(&registry, &discovery(), &dispatcher, &factory).await,
            CoordinatorState::Active
        );
        assert_eq!(factory.created().len(), 1);
    }

    #[tokio::test]
    async fn single_host_cluster_stays_inactive() {
        let registry = registry(&["a:5555"]);
        let factory = FakeElectionFactory::default();
        let coordinator = ClusterCoordinator::new(test_logger());

        let state = coordinator
            .listen(&registry, &discovery(), &RequestDispatcher::new(), &factory)
            .await;
        assert_eq!(state, CoordinatorState::Inactive);
        assert!(factory.created().is_empty());

        let cluster = registry.get("main").unwrap();
        assert!(!cluster.is_cluster_member());
        assert!(cluster.is_master());
    }

    #[tokio::test]
    async fn stays_inactive_when_not_a_member() {
        let registry = registry(&["b:5555", "c:5555"]);
        let factory = FakeElectionFactory::default();
        let coordinator = ClusterCoordinator::new(test_logger());

        let state = coordinator
            .listen(&registry, &discovery(), &RequestDispatcher::new(), &factory)
            .await;
        assert_eq!(state, CoordinatorState::Inactive);
        assert!(coordinator.cluster().is_none());
    }

    #[tokio::test]
    async fn failing_election_client_leaves_it_inactive() {
        let registry = registry(&["a:5555", "b:5555"]);
        let factory = FakeElectionFactory::failing();
        let coordinator = ClusterCoordinator::new(test_logger());

        let state = coordinator
            .listen(&registry, &discovery(), &RequestDispatcher::new(), &factory)
            .await;
        assert_eq!(state, CoordinatorState::Inactive);
        assert_eq!(coordinator.state(), CoordinatorState::Inactive);
    }

    #[tokio::test]
    async fn late_cluster_gets_the_known_master() {
        let registry = registry(&["a:5555", "b:5555"]);
        let factory = FakeElectionFactory::default();
        let coordinator = ClusterCoordinator::new(test_logger());
        coordinator
            .listen(&registry, &discovery(), &RequestDispatcher::new(), &factory)
            .await;
        let client = factory.created().pop().unwrap();
        client.announce(Some("a:5555"));

        let (context, _) = node_context();
        let config = ClusterConfig {
            hosts: vec!["a:5555".into(), "b:5555".into()],
            ..Default::default()
        };
        let late = Arc::new(ClusterMembership::new("late", config, context).unwrap());
        coordinator.set_cluster(Some(late.clone()));

        assert_eq!(late.master().as_deref(), Some("a:5555"));
        assert!(late.is_master());
    }

    #[tokio::test]
    async fn late_cluster_keeps_its_master_while_none_is_elected() {
        let registry = registry(&["a:5555", "b:5555"]);
        let factory = FakeElectionFactory::default();
        let coordinator = ClusterCoordinator::new(test_logger());
        coordinator
            .listen(&registry, &discovery(), &RequestDispatcher::new(), &factory)
            .await;

        let (context, _) = node_context();
        let config = ClusterConfig {
            hosts: vec!["a:5555".into(), "b:5555".into()],
            ..Default::default()
        };
        let late = Arc::new(ClusterMembership::new("late", config, context).unwrap());
        late.set_master(Some("b:5555".into()));

        coordinator.set_cluster(Some(late.clone()));

        assert_eq!(late.master().as_deref(), Some("b:5555"));
        assert!(late.is_cluster_member());
    }
}
