use crate::config::cluster_config::ClusterConfig;
use crate::config::host::Host;
use std::convert::TryFrom;
use tokio::time::Duration;

const DEFAULT_CONNECTION_TIMEOUT: Duration = Duration::from_secs(60);
const DEFAULT_SOCKET_TIMEOUT: Duration = Duration::from_secs(120);

/// How this node reaches the peer service of the other cluster members.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ConnectionOptions {
    pub connection_timeout: Duration,
    pub socket_timeout: Duration,
    pub secure: bool,
    pub path: Option<String>,
}

impl ConnectionOptions {
    pub fn peer_url(&self, host: &Host) -> String {
        let scheme = if self.secure { "https" } else { "http" };
        let address = if host.address().contains(':') {
            format!("[{}]", host.address())
        } else {
            host.address().to_string()
        };

        match self.path.as_deref().map(|p| p.trim_matches('/')) {
            Some(path) if !path.is_empty() => format!("{}://{}:{}/{}", scheme, address, host.port(), path),
            _ => format!("{}://{}:{}", scheme, address, host.port()),
        }
    }
}

impl Default for ConnectionOptions {
    fn default() -> Self {
        ConnectionOptions {
            connection_timeout: DEFAULT_CONNECTION_TIMEOUT,
            socket_timeout: DEFAULT_SOCKET_TIMEOUT,
            secure: false,
            path: None,
        }
    }
}

impl From<&ClusterConfig> for ConnectionOptions {
    fn from(config: &ClusterConfig) -> Self {
        ConnectionOptions {
            connection_timeout: config
                .connection_timeout
                .map(Duration::from_millis)
                .unwrap_or(DEFAULT_CONNECTION_TIMEOUT),
            socket_timeout: config
                .socket_timeout
                .map(Duration::from_millis)
                .unwrap_or(DEFAULT_SOCKET_TIMEOUT),
            secure: config.secure.unwrap_or(false),
            path: config.path.clone(),
        }
    }
}

/// Tuning of the bully election. Unset values fall back to defaults.
#[derive(Clone, Debug, Default)]
pub struct BullyOptions {
    /// How often the master is checked for liveness.
    pub check_interval: Option<Duration>,
    /// How long to wait for a coordinator announcement after a higher peer answered.
    pub election_timeout: Option<Duration>,
    /// Upper bound of the random delay before a non-forced election.
    pub max_election_jitter: Option<Duration>,
}

#[derive(Clone, Debug)]
pub(crate) struct BullyOptionsValidated {
    pub check_interval: Duration,
    pub election_timeout: Duration,
    pub max_election_jitter: Duration,
}

impl BullyOptionsValidated {
    fn validate(&self) -> Result<(), &'static str> {
        if self.check_interval.as_millis() == 0 {
            return Err("Master check interval must be positive");
        }
        if self.election_timeout >= self.check_interval {
            return Err("Election timeout must be less than the master check interval");
        }

        Ok(())
    }
}

impl TryFrom<BullyOptions> for BullyOptionsValidated {
    type Error = &'static str;

    fn try_from(options: BullyOptions) -> Result<Self, Self::Error> {
        let values = BullyOptionsValidated {
            check_interval: options.check_interval.unwrap_or(Duration::from_secs(60)),
            election_timeout: options.election_timeout.unwrap_or(Duration::from_secs(5)),
            max_election_jitter: options.max_election_jitter.unwrap_or(Duration::from_secs(1)),
        };

        values.validate()?;
        Ok(values)
    }
}
