mod cluster;
mod config;
mod coordinator;
mod election;
mod logging;
mod operations;
mod peer;
mod repository;
mod services;
#[cfg(test)]
mod test_utils;
mod grpc {
    include!("../generated/cluster.rs");
}

pub use cluster::ClusterError;
pub use cluster::ClusterMembership;
pub use cluster::ClusterRegistry;
pub use cluster::MasterListener;
pub use cluster::MasterSwitchRegistry;
pub use cluster::MasterSwitcher;
pub use cluster::MembershipElectionTransport;
pub use cluster::NodeContext;
pub use config::BullyOptions;
pub use config::ClusterConfig;
pub use config::ConnectionOptions;
pub use config::Host;
pub use config::InvalidHost;
pub use config::Member;
pub use config::CLUSTER_ARTIFACT_TYPE;
pub use config::DEFAULT_PORT;
pub use config::MEMBER_DEFAULT_PORT;
pub use coordinator::AddressResolver;
pub use coordinator::ClusterCoordinator;
pub use coordinator::CoordinatorState;
pub use coordinator::Discovery;
pub use coordinator::SystemAddressResolver;
pub use election::BullyClient;
pub use election::BullyClientFactory;
pub use election::BullyKind;
pub use election::BullyMessage;
pub use election::ElectionClient;
pub use election::ElectionClientFactory;
pub use election::ElectionRecord;
pub use election::ElectionSetup;
pub use election::ElectionTransport;
pub use election::MasterController;
pub use election::MessageError;
pub use election::ELECTION_CALLBACK_PATH;
pub use logging::create_root_logger_for_file;
pub use logging::create_root_logger_for_stdout;
pub use operations::Operation;
pub use operations::OperationError;
pub use operations::OperationRegistry;
pub use peer::peer_server_shutdown;
pub use peer::DispatchError;
pub use peer::GrpcConnector;
pub use peer::GrpcPeerConnection;
pub use peer::PeerConnection;
pub use peer::PeerConnector;
pub use peer::PeerError;
pub use peer::PeerRpcServer;
pub use peer::PeerServerShutdownHandle;
pub use peer::PeerServerShutdownSignal;
pub use peer::RequestDispatcher;
pub use peer::RequestHandler;
pub use repository::Artifact;
pub use repository::ArtifactRepositoryManager;
pub use repository::DefaultSourceResolver;
pub use repository::EntryInfo;
pub use repository::FsTreeSource;
pub use repository::GeneratedChild;
pub use repository::InMemorySource;
pub use repository::LocalLookup;
pub use repository::ManagerError;
pub use repository::ManagerRegistry;
pub use repository::MirrorRepository;
pub use repository::Node;
pub use repository::NodeDescriptor;
pub use repository::Repository;
pub use repository::RepositoryError;
pub use repository::RepositoryEvent;
pub use repository::RepositoryEventListener;
pub use repository::RepositoryState;
pub use repository::SourceItem;
pub use repository::SourceResolver;
pub use repository::TreeSource;
pub use services::ClusterServices;

// The crate root only declares modules and re-exports. Modules stay private; what the rest of the
// world sees is exported item by item above.
