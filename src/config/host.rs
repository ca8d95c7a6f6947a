use std::fmt;
use std::str::FromStr;

/// Port of the peer service when a configured host does not name one.
pub const DEFAULT_PORT: u16 = 5555;

/// Port assumed by `Member` when enumerating hosts for display.
pub const MEMBER_DEFAULT_PORT: u16 = 80;

#[derive(Debug, thiserror::Error, Clone, Eq, PartialEq)]
#[error("Invalid host '{0}'")]
pub struct InvalidHost(pub String);

/// Host is one configured cluster member, written as `address[:port]`.
///
/// The raw string is the member's identity within the cluster (it is what the election runs on),
/// so it is kept exactly as configured.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct Host {
    raw: String,
    address: String,
    port: u16,
}

impl Host {
    pub fn parse(raw: &str) -> Result<Self, InvalidHost> {
        let (address, port) = split_host(raw)?;

        Ok(Host {
            raw: raw.trim().to_string(),
            address,
            port: port.unwrap_or(DEFAULT_PORT),
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn port(&self) -> u16 {
        self.port
    }
}

impl FromStr for Host {
    type Err = InvalidHost;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Host::parse(s)
    }
}

impl fmt::Display for Host {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Member is the display form of a host: address and port, with its own default port.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Member {
    pub address: String,
    pub port: u16,
}

impl Member {
    pub fn parse(raw: &str) -> Result<Self, InvalidHost> {
        let (address, port) = split_host(raw)?;

        Ok(Member {
            address,
            port: port.unwrap_or(MEMBER_DEFAULT_PORT),
        })
    }
}

// Accepts `name`, `name:port`, `[v6]`, `[v6]:port` and a bare v6 address (no port).
fn split_host(raw: &str) -> Result<(String, Option<u16>), InvalidHost> {
    let trimmed = raw.trim();
    let invalid = || InvalidHost(raw.to_string());

    if trimmed.is_empty() {
        return Err(invalid());
    }

    if let Some(bracketed) = trimmed.strip_prefix('[') {
        let end = bracketed.find(']').ok_or_else(invalid)?;
        let address = &bracketed[..end];
        let rest = &bracketed[end + 1..];
        if address.is_empty() {
            return Err(invalid());
        }
        return match rest {
            "" => Ok((address.to_string(), None)),
            _ => {
                let port = rest.strip_prefix(':').ok_or_else(invalid)?;
                Ok((address.to_string(), Some(port.parse().map_err(|_| invalid())?)))
            }
        };
    }

    match trimmed.matches(':').count() {
        0 => Ok((trimmed.to_string(), None)),
        1 => {
            let (address, port) = trimmed.split_at(trimmed.find(':').ok_or_else(invalid)?);
            if address.is_empty() {
                return Err(invalid());
            }
            let port = port[1..].parse().map_err(|_| invalid())?;
            Ok((address.to_string(), Some(port)))
        }
        _ => Ok((trimmed.to_string(), None)),
    }
}
