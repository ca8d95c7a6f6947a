use crate::grpc::grpc_peer_server::{GrpcPeer, GrpcPeerServer};
use crate::grpc::{
    proto_operation_error, proto_run_operation_result, ProtoCanonicalNameReq, ProtoCanonicalNameResult,
    ProtoDeliverReq, ProtoDeliverResult, ProtoOperationError, ProtoOperationOutput, ProtoReloadAllReq,
    ProtoReloadReq, ProtoReloadResult, ProtoRepositoryRootReq, ProtoRepositoryRootResult, ProtoRunOperationReq,
    ProtoRunOperationResult, ProtoServerFault, ProtoUnknownOperation,
};
use crate::operations::{OperationError, OperationRegistry};
use crate::peer::dispatcher::{DispatchError, RequestDispatcher};
use crate::peer::shutdown::PeerServerShutdownSignal;
use crate::repository::{Repository, RepositoryError};
use bytes::Bytes;
use serde_json::Value;
use std::net::SocketAddr;
use std::sync::Arc;
use tonic::transport::Server;
use tonic::{Request, Response, Status};

/// PeerRpcServer is the type that implements the peer gRPC interface on top of this node's local repository,
/// operations and request dispatcher.
pub struct PeerRpcServer {
    logger: slog::Logger,
    repository: Arc<dyn Repository>,
    operations: Arc<OperationRegistry>,
    dispatcher: Arc<RequestDispatcher>,
    canonical_name: String,
}

impl PeerRpcServer {
    pub fn new(
        logger: slog::Logger,
        repository: Arc<dyn Repository>,
        operations: Arc<OperationRegistry>,
        dispatcher: Arc<RequestDispatcher>,
        canonical_name: impl Into<String>,
    ) -> Self {
        PeerRpcServer {
            logger,
            repository,
            operations,
            dispatcher,
            canonical_name: canonical_name.into(),
        }
    }

    pub async fn run(self, socket_addr: SocketAddr, shutdown_signal: PeerServerShutdownSignal) {
        let logger = self.logger.clone();
        slog::info!(logger, "Listening on '{:?}'", socket_addr);

        let result = Server::builder()
            .add_service(GrpcPeerServer::new(self))
            .serve_with_shutdown(socket_addr, shutdown_signal)
            .await;

        slog::info!(logger, "Server run() has exited: {:?}", result);
    }

    // Repository calls block on I/O.
    async fn with_repository<F>(&self, call: F) -> Result<(), Status>
    where
        F: FnOnce(&dyn Repository) -> Result<(), RepositoryError> + Send + 'static,
    {
        let repository = self.repository.clone();
        tokio::task::spawn_blocking(move || call(&*repository))
            .await
            .map_err(|e| Status::internal(format!("Repository task failed: {}", e)))?
            .map_err(|e| Status::internal(e.to_string()))
    }

    async fn handle_run_operation(&self, rpc_request: ProtoRunOperationReq) -> Result<ProtoRunOperationResult, Status> {
        let input = Self::convert_operation_input(&rpc_request.input)?;

        let app_result = if rpc_request.asynchronous {
            self.operations
                .run_detached(&rpc_request.operation_id, input)
                .map(|_| None)
        } else {
            self.operations.run(&rpc_request.operation_id, input).await.map(Some)
        };

        Ok(Self::convert_run_operation_result(app_result))
    }

    fn convert_operation_input(input: &[u8]) -> Result<Value, Status> {
        if input.is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_slice(input).map_err(|e| Status::invalid_argument(format!("Malformed input: {}", e)))
    }

    fn convert_run_operation_result(app_result: Result<Option<Value>, OperationError>) -> ProtoRunOperationResult {
        let result = match app_result {
            Ok(output) => {
                let output = match output {
                    Some(value) => serde_json::to_vec(&value),
                    None => Ok(Vec::new()),
                };
                match output {
                    Ok(output) => proto_run_operation_result::Result::Ok(ProtoOperationOutput { output }),
                    Err(e) => Self::server_fault(format!("Could not encode output: {}", e)),
                }
            }
            Err(OperationError::Unknown(operation_id)) => {
                proto_run_operation_result::Result::Err(ProtoOperationError {
                    err: Some(proto_operation_error::Err::UnknownOperation(ProtoUnknownOperation {
                        operation_id,
                    })),
                })
            }
            Err(e) => Self::server_fault(e.to_string()),
        };

        ProtoRunOperationResult { result: Some(result) }
    }

    fn server_fault(message: String) -> proto_run_operation_result::Result {
        proto_run_operation_result::Result::Err(ProtoOperationError {
            err: Some(proto_operation_error::Err::ServerFault(ProtoServerFault { message })),
        })
    }

    fn convert_dispatch_error(e: DispatchError) -> Status {
        match e {
            DispatchError::NoHandler(path) => Status::not_found(format!("No handler for '{}'", path)),
            DispatchError::BadRequest(message) => Status::invalid_argument(message),
            DispatchError::Failed(message) => Status::internal(message),
        }
    }
}

#[async_trait::async_trait]
impl GrpcPeer for PeerRpcServer {
    async fn get_repository_root(
        &self,
        _request: Request<ProtoRepositoryRootReq>,
    ) -> Result<Response<ProtoRepositoryRootResult>, Status> {
        Ok(Response::new(ProtoRepositoryRootResult {
            location: self.repository.root_location(),
        }))
    }

    async fn reload(&self, request: Request<ProtoReloadReq>) -> Result<Response<ProtoReloadResult>, Status> {
        let id = request.into_inner().id;
        slog::info!(self.logger, "Reload of '{}' requested by a peer", id);
        self.with_repository(move |repository| repository.reload(&id)).await?;
        Ok(Response::new(ProtoReloadResult {}))
    }

    async fn reload_all(&self, _request: Request<ProtoReloadAllReq>) -> Result<Response<ProtoReloadResult>, Status> {
        slog::info!(self.logger, "Full reload requested by a peer");
        self.with_repository(|repository| repository.reload_all()).await?;
        Ok(Response::new(ProtoReloadResult {}))
    }

    async fn get_canonical_name(
        &self,
        _request: Request<ProtoCanonicalNameReq>,
    ) -> Result<Response<ProtoCanonicalNameResult>, Status> {
        Ok(Response::new(ProtoCanonicalNameResult {
            name: self.canonical_name.clone(),
        }))
    }

    async fn run_operation(
        &self,
        request: Request<ProtoRunOperationReq>,
    ) -> Result<Response<ProtoRunOperationResult>, Status> {
        let rpc_request = request.into_inner();
        slog::debug!(self.logger, "ServerWire - RunOperation {}", rpc_request.operation_id);
        let rpc_reply = self.handle_run_operation(rpc_request).await?;
        Ok(Response::new(rpc_reply))
    }

    async fn deliver(&self, request: Request<ProtoDeliverReq>) -> Result<Response<ProtoDeliverResult>, Status> {
        let rpc_request = request.into_inner();
        slog::debug!(self.logger, "ServerWire - Deliver to {}", rpc_request.path);
        let reply = self
            .dispatcher
            .dispatch(&rpc_request.path, Bytes::from(rpc_request.payload))
            .await
            .map_err(Self::convert_dispatch_error)?;

        Ok(Response::new(ProtoDeliverResult { payload: reply.to_vec() }))
    }
}
