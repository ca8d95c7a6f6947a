mod cluster_config;
mod host;
mod options;

pub use cluster_config::ClusterConfig;
pub use cluster_config::CLUSTER_ARTIFACT_TYPE;
pub use host::Host;
pub use host::InvalidHost;
pub use host::Member;
pub use host::DEFAULT_PORT;
pub use host::MEMBER_DEFAULT_PORT;
pub use options::BullyOptions;
pub(crate) use options::BullyOptionsValidated;
pub use options::ConnectionOptions;
