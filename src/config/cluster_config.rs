use crate::config::host::{Host, InvalidHost};
use crate::repository::Artifact;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Artifact type under which cluster configurations are stored in the local repository.
pub const CLUSTER_ARTIFACT_TYPE: &str = "cluster";

/// ClusterConfig is the content of a `cluster` artifact.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct ClusterConfig {
    /// Member hosts as `address[:port]`. The first one is the authority for the shared repository.
    pub hosts: Vec<String>,
    /// Mirror a private repository instead of the first host's one.
    pub simulate: bool,
    /// Location of the simulated repository. A private directory is used when unset.
    pub uri: Option<String>,
    /// Milliseconds.
    pub connection_timeout: Option<u64>,
    /// Milliseconds.
    pub socket_timeout: Option<u64>,
    /// Gates which ids may fall through to the local repository.
    pub local_lookup_regex: Option<String>,
    pub shared_repository: Option<bool>,
    pub path: Option<String>,
    pub secure: Option<bool>,
}

impl ClusterConfig {
    pub fn from_artifact(artifact: &Artifact) -> Result<Self, serde_json::Error> {
        serde_json::from_value(artifact.content().clone())
    }

    pub fn parsed_hosts(&self) -> Result<Vec<Host>, InvalidHost> {
        self.hosts.iter().map(|raw| Host::parse(raw)).collect()
    }

    /// The local lookup pattern, anchored so that it has to match a whole id.
    pub fn local_lookup_pattern(&self) -> Result<Option<Regex>, regex::Error> {
        match self.local_lookup_regex.as_deref() {
            Some(pattern) => Ok(Some(Regex::new(&format!("^(?:{})$", pattern))?)),
            None => Ok(None),
        }
    }
}
