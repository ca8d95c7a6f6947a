mod election_transport;
mod error;
mod master;
mod membership;
mod registry;

pub use election_transport::MembershipElectionTransport;
pub use error::ClusterError;
pub use master::MasterListener;
pub use master::MasterSwitchRegistry;
pub use master::MasterSwitcher;
pub use membership::ClusterMembership;
pub use membership::NodeContext;
pub use registry::ClusterRegistry;
