use crate::cluster::{ClusterError, ClusterMembership, ClusterRegistry};
use crate::coordinator::{ClusterCoordinator, Discovery};
use crate::election::ElectionRecord;
use crate::operations::{Operation, OperationError, OperationRegistry};
use crate::peer::PeerError;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::{Arc, Weak};
use tokio::time::Duration;

pub const CURRENT_CLUSTER: &str = "cluster.currentCluster";
pub const PEERS: &str = "cluster.peers";
pub const HOSTS: &str = "cluster.hosts";
pub const MASTER: &str = "cluster.master";
pub const WAIT_FOR_MASTER: &str = "cluster.waitForMaster";
pub const ELECT_MASTER: &str = "cluster.electMaster";
pub const ELECTION_HISTORY: &str = "cluster.electionHistory";
pub const CLUSTER_FOR_HOST: &str = "cluster.clusterForHost";
pub const INVOKE: &str = "cluster.invoke";

const DEFAULT_WAIT_FOR_MASTER: Duration = Duration::from_secs(30);

/// ClusterServices answers operator queries about this node's cluster.
pub struct ClusterServices {
    logger: slog::Logger,
    registry: Arc<ClusterRegistry>,
    discovery: Arc<Discovery>,
    coordinator: Arc<ClusterCoordinator>,
    operations: Arc<OperationRegistry>,
}

impl ClusterServices {
    pub fn new(
        logger: slog::Logger,
        registry: Arc<ClusterRegistry>,
        discovery: Arc<Discovery>,
        coordinator: Arc<ClusterCoordinator>,
        operations: Arc<OperationRegistry>,
    ) -> Self {
        ClusterServices {
            logger,
            registry,
            discovery,
            coordinator,
            operations,
        }
    }

    fn cluster(&self) -> Result<Arc<ClusterMembership>, ClusterError> {
        self.coordinator.cluster().ok_or(ClusterError::NotAMember)
    }

    pub fn current_cluster(&self) -> Option<String> {
        self.coordinator.cluster().map(|cluster| cluster.id().to_string())
    }

    pub async fn peers(&self) -> Result<Vec<String>, ClusterError> {
        self.discovery.peers(&*self.cluster()?).await
    }

    pub fn hosts(&self, cluster_id: &str) -> Result<Vec<String>, ClusterError> {
        let cluster = self
            .registry
            .get(cluster_id)
            .ok_or_else(|| ClusterError::UnknownCluster(cluster_id.to_string()))?;
        Ok(cluster.hosts().iter().map(|host| host.as_str().to_string()).collect())
    }

    pub fn master(&self) -> Result<Option<String>, ClusterError> {
        Ok(self.cluster()?.master())
    }

    /// The master once one is known. None when none is elected in time.
    pub async fn wait_for_master(&self, timeout: Duration) -> Result<Option<String>, ClusterError> {
        let mut listener = self.cluster()?.master_listener();
        Ok(tokio::time::timeout(timeout, listener.wait_for_master())
            .await
            .unwrap_or(None))
    }

    pub fn elect_master(&self) -> Result<(), ClusterError> {
        let client = self.coordinator.election_client().ok_or(ClusterError::NotElecting)?;
        slog::info!(self.logger, "Election requested by an operator");
        client.schedule_election(true);
        Ok(())
    }

    pub fn election_history(&self) -> Result<Vec<ElectionRecord>, ClusterError> {
        let client = self.coordinator.election_client().ok_or(ClusterError::NotElecting)?;
        Ok(client.history())
    }

    pub fn cluster_for_host(&self, host: &str) -> Result<Option<String>, ClusterError> {
        Ok(self
            .discovery
            .cluster_for_host(&self.registry, host)?
            .map(|cluster| cluster.id().to_string()))
    }

    /// Runs an operation here when `host` is None, otherwise on that host. Asynchronous runs return nothing.
    pub async fn invoke(
        &self,
        host: Option<&str>,
        operation_id: &str,
        input: Value,
        asynchronous: bool,
    ) -> Result<Option<Value>, ClusterError> {
        let host = match host {
            None if asynchronous => {
                self.operations.run_detached(operation_id, input)?;
                return Ok(None);
            }
            None => return Ok(Some(self.operations.run(operation_id, input).await?)),
            Some(host) => host,
        };

        // Our own cluster first, so that canonical names it resolved are found.
        let clusters = self.coordinator.cluster().into_iter().chain(self.registry.clusters().iter().cloned());
        for cluster in clusters {
            if let Some(connection) = cluster.connection(host)? {
                slog::debug!(self.logger, "Invoking {} on {}", operation_id, host);
                return Ok(connection.run_operation(operation_id, input, asynchronous).await?);
            }
        }

        Err(PeerError::UnknownHost(host.to_string()).into())
    }

    /// Registers every query as an operation.
    pub fn register_operations(self: &Arc<Self>) {
        let queries = [
            (CURRENT_CLUSTER, Query::CurrentCluster),
            (PEERS, Query::Peers),
            (HOSTS, Query::Hosts),
            (MASTER, Query::Master),
            (WAIT_FOR_MASTER, Query::WaitForMaster),
            (ELECT_MASTER, Query::ElectMaster),
            (ELECTION_HISTORY, Query::ElectionHistory),
            (CLUSTER_FOR_HOST, Query::ClusterForHost),
            (INVOKE, Query::Invoke),
        ];

        for (operation_id, query) in queries.iter() {
            self.operations.register(
                *operation_id,
                Arc::new(QueryOperation {
                    services: Arc::downgrade(self),
                    query: *query,
                }),
            );
        }
    }

    async fn answer(&self, query: Query, input: Value) -> Result<Value, ClusterError> {
        let output = match query {
            Query::CurrentCluster => json!(self.current_cluster()),
            Query::Peers => json!(self.peers().await?),
            Query::Hosts => {
                let input: HostsInput = decode(input)?;
                json!(self.hosts(&input.cluster_id)?)
            }
            Query::Master => json!(self.master()?),
            Query::WaitForMaster => {
                let input: WaitForMasterInput = decode(input)?;
                let timeout = input
                    .timeout_ms
                    .map(Duration::from_millis)
                    .unwrap_or(DEFAULT_WAIT_FOR_MASTER);
                json!(self.wait_for_master(timeout).await?)
            }
            Query::ElectMaster => {
                self.elect_master()?;
                Value::Null
            }
            Query::ElectionHistory => {
                let history: Vec<Value> = self
                    .election_history()?
                    .into_iter()
                    .map(|record| json!({ "master": record.master, "at": record.at.to_rfc3339() }))
                    .collect();
                Value::Array(history)
            }
            Query::ClusterForHost => {
                let input: ClusterForHostInput = decode(input)?;
                json!(self.cluster_for_host(&input.host)?)
            }
            Query::Invoke => {
                let input: InvokeInput = decode(input)?;
                self.invoke(input.host.as_deref(), &input.operation_id, input.input, input.asynchronous)
                    .await?
                    .unwrap_or(Value::Null)
            }
        };

        Ok(output)
    }
}

#[derive(Clone, Copy, Debug)]
enum Query {
    CurrentCluster,
    Peers,
    Hosts,
    Master,
    WaitForMaster,
    ElectMaster,
    ElectionHistory,
    ClusterForHost,
    Invoke,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct HostsInput {
    cluster_id: String,
}

#[derive(Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WaitForMasterInput {
    timeout_ms: Option<u64>,
}

#[derive(Deserialize)]
struct ClusterForHostInput {
    host: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct InvokeInput {
    #[serde(default)]
    host: Option<String>,
    operation_id: String,
    #[serde(default)]
    input: Value,
    #[serde(default)]
    asynchronous: bool,
}

// A missing input is an empty object.
fn decode<T: DeserializeOwned>(input: Value) -> Result<T, OperationError> {
    let input = match input {
        Value::Null => json!({}),
        input => input,
    };
    Ok(serde_json::from_value(input)?)
}

struct QueryOperation {
    services: Weak<ClusterServices>,
    query: Query,
}

#[async_trait::async_trait]
impl Operation for QueryOperation {
    async fn run(&self, input: Value) -> Result<Value, OperationError> {
        let services = self
            .services
            .upgrade()
            .ok_or_else(|| OperationError::Failed("cluster services are shut down".to_string()))?;

        services.answer(self.query, input).await.map_err(|e| match e {
            ClusterError::Operation(e) => e,
            e => OperationError::Failed(e.to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClusterConfig;
    use crate::peer::RequestDispatcher;
    use crate::test_utils::{node_context, test_logger, FakeConnector, FakeElectionFactory, FakeResolver};

    struct Fixture {
        services: Arc<ClusterServices>,
        operations: Arc<OperationRegistry>,
        connector: Arc<FakeConnector>,
        factory: FakeElectionFactory,
    }

    async fn fixture(hosts: &[&str]) -> Fixture {
        let (context, connector) = node_context();
        connector.add_peer("a:5555", "alpha", "memory://a");
        connector.add_peer("b:5555", "beta", "memory://b");
        let config = ClusterConfig {
            hosts: hosts.iter().map(|h| h.to_string()).collect(),
            ..Default::default()
        };
        let other = ClusterConfig {
            hosts: vec!["c:5555".into()],
            ..Default::default()
        };
        let registry = Arc::new(ClusterRegistry::new(vec![
            Arc::new(ClusterMembership::new("main", config, context.clone()).unwrap()),
            Arc::new(ClusterMembership::new("other", other, context).unwrap()),
        ]));

        let resolver = FakeResolver::new(&["10.0.0.1"])
            .with_host("a", &["10.0.0.1"])
            .with_host("b", &["10.0.0.2"]);
        let discovery = Arc::new(Discovery::new(test_logger(), Arc::new(resolver), 5555));
        let coordinator = Arc::new(ClusterCoordinator::new(test_logger()));
        let factory = FakeElectionFactory::default();
        coordinator
            .listen(&registry, &discovery, &RequestDispatcher::new(), &factory)
            .await;

        let operations = Arc::new(OperationRegistry::new(test_logger()));
        let services = Arc::new(ClusterServices::new(
            test_logger(),
            registry,
            discovery,
            coordinator,
            operations.clone(),
        ));
        services.register_operations();

        Fixture {
            services,
            operations,
            connector,
            factory,
        }
    }

    #[tokio::test]
    async fn answers_membership_queries() {
        let f = fixture(&["a:5555", "b:5555"]).await;

        assert_eq!(f.operations.run(CURRENT_CLUSTER, Value::Null).await.unwrap(), json!("main"));
        assert_eq!(f.operations.run(PEERS, Value::Null).await.unwrap(), json!(["b:5555"]));
        assert_eq!(
            f.operations.run(HOSTS, json!({"clusterId": "other"})).await.unwrap(),
            json!(["c:5555"])
        );
        assert!(matches!(
            f.operations.run(HOSTS, json!({"clusterId": "none"})).await,
            Err(OperationError::Failed(_))
        ));
        assert!(matches!(
            f.operations.run(HOSTS, Value::Null).await,
            Err(OperationError::InvalidInput(_))
        ));
        assert_eq!(
            f.operations.run(CLUSTER_FOR_HOST, json!({"host": "c"})).await.unwrap(),
            json!("other")
        );
        assert_eq!(
            f.operations.run(CLUSTER_FOR_HOST, json!({"host": "z"})).await.unwrap(),
            Value::Null
        );
    }

    #[tokio::test]
    async fn follows_the_election() {
        let f = fixture(&["a:5555", "b:5555"]).await;
        let client = f.factory.created().pop().unwrap();

        assert_eq!(f.operations.run(MASTER, Value::Null).await.unwrap(), Value::Null);
        assert_eq!(
            f.operations.run(WAIT_FOR_MASTER, json!({"timeoutMs": 10})).await.unwrap(),
            Value::Null
        );

        let waiting = {
            let services = f.services.clone();
            tokio::spawn(async move { services.wait_for_master(Duration::from_secs(5)).await })
        };
        tokio::task::yield_now().await;
        client.announce(Some("b:5555"));
        assert_eq!(waiting.await.unwrap().unwrap().as_deref(), Some("b:5555"));
        assert_eq!(f.operations.run(MASTER, Value::Null).await.unwrap(), json!("b:5555"));

        f.operations.run(ELECT_MASTER, Value::Null).await.unwrap();
        assert_eq!(client.scheduled(), vec![true, true]);

        let history = f.operations.run(ELECTION_HISTORY, Value::Null).await.unwrap();
        assert_eq!(history[0]["master"], json!("b:5555"));
        assert!(history[0]["at"].is_string());
    }

    #[tokio::test]
    async fn election_queries_need_an_election() {
        let f = fixture(&["a:5555"]).await;
        assert_eq!(f.services.current_cluster().as_deref(), Some("main"));
        assert!(matches!(f.services.elect_master(), Err(ClusterError::NotElecting)));
        assert!(matches!(f.services.election_history(), Err(ClusterError::NotElecting)));
    }

    #[tokio::test]
    async fn invokes_locally_or_on_a_host() {
        let f = fixture(&["a:5555", "b:5555"]).await;

        let local = f
            .operations
            .run(INVOKE, json!({"operationId": CURRENT_CLUSTER}))
            .await
            .unwrap();
        assert_eq!(local, json!("main"));

        let remote = f
            .operations
            .run(INVOKE, json!({"host": "b:5555", "operationId": "x.y", "input": [1]}))
            .await
            .unwrap();
        assert_eq!(remote, json!({"host": "beta", "operation": "x.y", "input": [1]}));

        let detached = f
            .services
            .invoke(Some("b:5555"), "x.y", Value::Null, true)
            .await
            .unwrap();
        assert_eq!(detached, None);
        assert_eq!(f.connector.peer("b:5555").calls(), vec!["run x.y", "run x.y"]);

        assert!(matches!(
            f.services.invoke(Some("z:5555"), "x.y", Value::Null, false).await,
            Err(ClusterError::Peer(PeerError::UnknownHost(_)))
        ));
        assert!(matches!(
            f.services.invoke(None, "missing", Value::Null, false).await,
            Err(ClusterError::Operation(OperationError::Unknown(_)))
        ));
    }

    #[tokio::test]
    async fn not_a_member_has_no_cluster() {
        let f = fixture(&["b:5555", "c:5555"]).await;
        assert_eq!(f.services.current_cluster(), None);
        assert!(matches!(f.services.peers().await, Err(ClusterError::NotAMember)));
        assert!(matches!(f.services.master(), Err(ClusterError::NotAMember)));
    }
}
