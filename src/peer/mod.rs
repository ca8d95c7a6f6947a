mod connection;
mod dispatcher;
mod grpc_connection;
mod server;
mod shutdown;

pub use connection::PeerConnection;
pub use connection::PeerConnector;
pub use connection::PeerError;
pub use dispatcher::DispatchError;
pub use dispatcher::RequestDispatcher;
pub use dispatcher::RequestHandler;
pub use grpc_connection::GrpcConnector;
pub use grpc_connection::GrpcPeerConnection;
pub use server::PeerRpcServer;
pub use shutdown::peer_server_shutdown;
pub use shutdown::PeerServerShutdownHandle;
pub use shutdown::PeerServerShutdownSignal;
