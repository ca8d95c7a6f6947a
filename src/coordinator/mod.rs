mod address;
mod cluster_coordinator;
mod discovery;

pub use address::AddressResolver;
pub use address::SystemAddressResolver;
pub use cluster_coordinator::ClusterCoordinator;
pub use cluster_coordinator::CoordinatorState;
pub use discovery::Discovery;
