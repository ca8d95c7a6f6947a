use crate::cluster::{ClusterError, MasterSwitchRegistry, NodeContext};
use crate::config::{ConnectionOptions, Host};
use crate::coordinator::AddressResolver;
use crate::election::{ElectionClient, ElectionClientFactory, ElectionRecord, ElectionSetup, MasterController};
use crate::peer::{DispatchError, PeerConnection, PeerConnector, PeerError, RequestHandler};
use crate::repository::{DefaultSourceResolver, InMemorySource, ManagerRegistry, MirrorRepository, NodeDescriptor, Repository};
use bytes::Bytes;
use chrono::Utc;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::fs;
use std::io;
use std::net::IpAddr;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

pub(crate) fn test_logger() -> slog::Logger {
    slog::Logger::root(slog::Discard, slog::o!())
}

/// Writes `node.json` for `id` under `root`, creating the directories on the way.
pub(crate) fn write_node(root: &Path, id: &str, descriptor: Value) {
    let dir = id.split('.').fold(root.to_path_buf(), |dir, name| dir.join(name));
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join("node.json"), serde_json::to_vec(&descriptor).unwrap()).unwrap();
}

pub(crate) fn descriptor(artifact_type: &str, content: Value) -> NodeDescriptor {
    NodeDescriptor {
        artifact_type: artifact_type.to_string(),
        content,
        ..Default::default()
    }
}

/// A started repository holding `nodes`.
pub(crate) fn local_repository(nodes: Vec<(&str, NodeDescriptor)>) -> Arc<dyn Repository> {
    let source = Arc::new(InMemorySource::new("local"));
    for (id, descriptor) in nodes {
        source.put(id, descriptor);
    }

    let repository = MirrorRepository::standalone(test_logger(), source, Arc::new(ManagerRegistry::new()));
    repository.start().unwrap();
    Arc::new(repository)
}

/// A node context whose local repository holds `local.thing`.
pub(crate) fn node_context() -> (NodeContext, Arc<FakeConnector>) {
    node_context_with(local_repository(vec![("local.thing", descriptor("thing", json!({})))]))
}

pub(crate) fn node_context_with(local: Arc<dyn Repository>) -> (NodeContext, Arc<FakeConnector>) {
    let connector = Arc::new(FakeConnector::default());
    let context = NodeContext {
        logger: test_logger(),
        local,
        connector: connector.clone(),
        sources: Arc::new(DefaultSourceResolver::new()),
        managers: Arc::new(ManagerRegistry::new()),
        switches: Arc::new(MasterSwitchRegistry::new()),
        simulation_root: tempfile::tempdir().unwrap().into_path(),
    };
    (context, connector)
}

// ------- Peers --------

/// Hands out the fake peers added to it. Unknown hosts fail to connect.
#[derive(Default)]
pub(crate) struct FakeConnector {
    peers: Mutex<HashMap<String, Arc<FakePeer>>>,
    pub connects: AtomicUsize,
}

impl FakeConnector {
    pub fn add_peer(&self, host: &str, name: &str, root: &str) -> Arc<FakePeer> {
        let peer = Arc::new(FakePeer {
            host: Host::parse(host).unwrap(),
            name: name.to_string(),
            root: root.to_string(),
            up: AtomicBool::new(true),
            calls: Mutex::new(Vec::new()),
        });
        self.peers.lock().unwrap().insert(host.to_string(), peer.clone());
        peer
    }

    pub fn peer(&self, host: &str) -> Arc<FakePeer> {
        self.peers.lock().unwrap()[host].clone()
    }
}

impl PeerConnector for FakeConnector {
    fn connect(
        &self,
        _logger: &slog::Logger,
        host: &Host,
        _options: &ConnectionOptions,
    ) -> Result<Arc<dyn PeerConnection>, PeerError> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        let peer = self
            .peers
            .lock()
            .unwrap()
            .get(host.as_str())
            .cloned()
            .ok_or_else(|| PeerError::UnknownHost(host.to_string()))?;
        Ok(peer)
    }
}

/// Records the calls it answers while up, and fails every call while down.
pub(crate) struct FakePeer {
    host: Host,
    name: String,
    root: String,
    up: AtomicBool,
    calls: Mutex<Vec<String>>,
}

impl FakePeer {
    pub fn set_up(&self, up: bool) {
        self.up.store(up, Ordering::SeqCst);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn call(&self, call: String) -> Result<(), PeerError> {
        if !self.up.load(Ordering::SeqCst) {
            return Err(PeerError::RemoteFault(format!("{} is down", self.host)));
        }
        self.calls.lock().unwrap().push(call);
        Ok(())
    }
}

#[async_trait::async_trait]
impl PeerConnection for FakePeer {
    fn host(&self) -> &Host {
        &self.host
    }

    async fn repository_root(&self) -> Result<String, PeerError> {
        self.call("repository_root".into())?;
        Ok(self.root.clone())
    }

    async fn reload(&self, id: &str) -> Result<(), PeerError> {
        self.call(format!("reload {}", id))
    }

    async fn reload_all(&self) -> Result<(), PeerError> {
        self.call("reload_all".into())
    }

    async fn canonical_name(&self) -> Result<String, PeerError> {
        self.call("canonical_name".into())?;
        Ok(self.name.clone())
    }

    async fn run_operation(
        &self,
        operation_id: &str,
        input: Value,
        asynchronous: bool,
    ) -> Result<Option<Value>, PeerError> {
        self.call(format!("run {}", operation_id))?;
        if asynchronous {
            return Ok(None);
        }
        Ok(Some(json!({ "host": self.name, "operation": operation_id, "input": input })))
    }

    async fn deliver(&self, path: &str, payload: Bytes) -> Result<Bytes, PeerError> {
        self.call(format!("deliver {}", path))?;
        Ok(payload)
    }
}

// ------- Addresses --------

pub(crate) struct FakeResolver {
    hosts: HashMap<String, Vec<IpAddr>>,
    locals: Vec<IpAddr>,
}

fn ips(addresses: &[&str]) -> Vec<IpAddr> {
    addresses.iter().map(|address| address.parse().unwrap()).collect()
}

impl FakeResolver {
    pub fn new(locals: &[&str]) -> Self {
        FakeResolver {
            hosts: HashMap::new(),
            locals: ips(locals),
        }
    }

    pub fn with_host(mut self, host: &str, addresses: &[&str]) -> Self {
        self.hosts.insert(host.to_string(), ips(addresses));
        self
    }
}

#[async_trait::async_trait]
impl AddressResolver for FakeResolver {
    async fn resolve(&self, host: &str) -> io::Result<Vec<IpAddr>> {
        self.hosts
            .get(host)
            .cloned()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, format!("unknown host {}", host)))
    }

    async fn local_addresses(&self) -> io::Result<Vec<IpAddr>> {
        Ok(self.locals.clone())
    }
}

// ------- Election --------

struct EchoHandler;

#[async_trait::async_trait]
impl RequestHandler for EchoHandler {
    async fn handle(&self, payload: Bytes) -> Result<Bytes, DispatchError> {
        Ok(payload)
    }
}

/// An election client whose outcomes are announced by the test.
pub(crate) struct FakeElectionClient {
    identity: String,
    master: Mutex<Option<String>>,
    scheduled: Mutex<Vec<bool>>,
    history: Mutex<Vec<ElectionRecord>>,
    controller: Option<Arc<dyn MasterController>>,
}

impl FakeElectionClient {
    pub fn new(identity: &str, master: Option<&str>) -> Arc<Self> {
        Arc::new(Self::create(identity, master, None))
    }

    fn create(identity: &str, master: Option<&str>, controller: Option<Arc<dyn MasterController>>) -> Self {
        FakeElectionClient {
            identity: identity.to_string(),
            master: Mutex::new(master.map(String::from)),
            scheduled: Mutex::new(Vec::new()),
            history: Mutex::new(Vec::new()),
            controller,
        }
    }

    pub fn announce(&self, master: Option<&str>) {
        let master = master.map(String::from);
        *self.master.lock().unwrap() = master.clone();
        self.history.lock().unwrap().push(ElectionRecord {
            master: master.clone(),
            at: Utc::now(),
        });
        if let Some(controller) = &self.controller {
            controller.set_master(master);
        }
    }

    pub fn scheduled(&self) -> Vec<bool> {
        self.scheduled.lock().unwrap().clone()
    }
}

impl ElectionClient for FakeElectionClient {
    fn identity(&self) -> &str {
        &self.identity
    }

    fn current_master(&self) -> Option<String> {
        self.master.lock().unwrap().clone()
    }

    fn schedule_election(&self, immediate: bool) {
        self.scheduled.lock().unwrap().push(immediate);
    }

    fn history(&self) -> Vec<ElectionRecord> {
        self.history.lock().unwrap().clone()
    }

    fn handler(&self) -> Arc<dyn RequestHandler> {
        Arc::new(EchoHandler)
    }

    fn handler_path(&self) -> String {
        "/cluster/bully".to_string()
    }
}

#[derive(Default)]
pub(crate) struct FakeElectionFactory {
    fail: bool,
    setups: Mutex<Vec<(String, Vec<String>)>>,
    created: Mutex<Vec<Arc<FakeElectionClient>>>,
}

impl FakeElectionFactory {
    pub fn failing() -> Self {
        FakeElectionFactory {
            fail: true,
            ..Default::default()
        }
    }

    /// Identity and peers of every setup seen.
    pub fn setups(&self) -> Vec<(String, Vec<String>)> {
        self.setups.lock().unwrap().clone()
    }

    pub fn created(&self) -> Vec<Arc<FakeElectionClient>> {
        self.created.lock().unwrap().clone()
    }
}

impl ElectionClientFactory for FakeElectionFactory {
    fn create(&self, setup: ElectionSetup) -> Result<Arc<dyn ElectionClient>, ClusterError> {
        if self.fail {
            return Err(ClusterError::Configuration("election refused".to_string()));
        }

        self.setups
            .lock()
            .unwrap()
            .push((setup.identity.clone(), setup.peers.clone()));
        let client = Arc::new(FakeElectionClient::create(
            &setup.identity,
            None,
            Some(setup.controller),
        ));
        self.created.lock().unwrap().push(client.clone());
        Ok(client)
    }
}
