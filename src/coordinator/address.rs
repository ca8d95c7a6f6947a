use std::io;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

/// Answers which addresses a host name stands for and which addresses are this machine's.
#[async_trait::async_trait]
pub trait AddressResolver: Send + Sync {
    async fn resolve(&self, host: &str) -> io::Result<Vec<IpAddr>>;

    async fn local_addresses(&self) -> io::Result<Vec<IpAddr>>;
}

/// Resolves through the system resolver. Local addresses are the loopback ones plus those of the machine's
/// host name.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemAddressResolver;

#[async_trait::async_trait]
impl AddressResolver for SystemAddressResolver {
    async fn resolve(&self, host: &str) -> io::Result<Vec<IpAddr>> {
        if let Ok(ip) = host.parse::<IpAddr>() {
            return Ok(vec![ip]);
        }

        let addresses = tokio::net::lookup_host((host, 0)).await?;
        Ok(addresses.map(|socket_addr| socket_addr.ip()).collect())
    }

    async fn local_addresses(&self) -> io::Result<Vec<IpAddr>> {
        let mut addresses = vec![IpAddr::V4(Ipv4Addr::LOCALHOST), IpAddr::V6(Ipv6Addr::LOCALHOST)];

        let name = hostname::get()?;
        if let Some(name) = name.to_str() {
            // An unresolvable host name leaves us with loopback only.
            if let Ok(resolved) = self.resolve(name).await {
                addresses.extend(resolved);
            }
        }

        addresses.sort();
        addresses.dedup();
        Ok(addresses)
    }
}
