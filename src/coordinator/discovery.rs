use crate::cluster::{ClusterError, ClusterMembership, ClusterRegistry};
use crate::config::Host;
use crate::coordinator::address::AddressResolver;
use std::net::IpAddr;
use std::sync::Arc;

/// Discovery finds this node among the configured cluster hosts.
///
/// A host is this node when it names this node's RPC port and one of its addresses is local.
pub struct Discovery {
    logger: slog::Logger,
    resolver: Arc<dyn AddressResolver>,
    local_port: u16,
}

impl Discovery {
    pub fn new(logger: slog::Logger, resolver: Arc<dyn AddressResolver>, local_port: u16) -> Self {
        Discovery {
            logger,
            resolver,
            local_port,
        }
    }

    pub fn local_port(&self) -> u16 {
        self.local_port
    }

    async fn local_addresses(&self) -> Result<Vec<IpAddr>, ClusterError> {
        self.resolver.local_addresses().await.map_err(ClusterError::Resolution)
    }

    async fn is_local(&self, host: &Host, locals: &[IpAddr]) -> bool {
        if host.port() != self.local_port {
            return false;
        }

        match self.resolver.resolve(host.address()).await {
            Ok(addresses) => addresses.iter().any(|address| locals.contains(address)),
            Err(e) => {
                slog::debug!(self.logger, "Could not resolve {}: {}", host, e);
                false
            }
        }
    }

    /// The configured host that is this node, if any.
    pub async fn own_host(&self, cluster: &ClusterMembership) -> Result<Option<Host>, ClusterError> {
        let locals = self.local_addresses().await?;
        for host in cluster.hosts() {
            if self.is_local(host, &locals).await {
                return Ok(Some(host.clone()));
            }
        }
        Ok(None)
    }

    /// The cluster this node is a host of. Being a host of several is a configuration error.
    pub async fn own_cluster(&self, registry: &ClusterRegistry) -> Result<Option<Arc<ClusterMembership>>, ClusterError> {
        let mut found = Vec::new();
        for cluster in registry.clusters() {
            if self.own_host(cluster).await?.is_some() {
                found.push(cluster.clone());
            }
        }

        match found.len() {
            0 | 1 => Ok(found.pop()),
            _ => Err(ClusterError::AmbiguousMembership(
                found.iter().map(|cluster| cluster.id().to_string()).collect(),
            )),
        }
    }

    /// Every host of the cluster except this node.
    pub async fn peers(&self, cluster: &ClusterMembership) -> Result<Vec<String>, ClusterError> {
        let own = self.own_host(cluster).await?;
        Ok(cluster
            .hosts()
            .iter()
            .filter(|host| Some(*host) != own.as_ref())
            .map(|host| host.as_str().to_string())
            .collect())
    }

    /// The first cluster listing `host`, compared by address and port.
    pub fn cluster_for_host(&self, registry: &ClusterRegistry, host: &str) -> Result<Option<Arc<ClusterMembership>>, ClusterError> {
        let wanted = Host::parse(host)?;
        Ok(registry
            .clusters()
            .iter()
            .find(|cluster| {
                cluster
                    .hosts()
                    .iter()
                    .any(|known| known.address() == wanted.address() && known.port() == wanted.port())
            })
            .cloned())
    }
}
