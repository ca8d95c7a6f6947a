/// Empty
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoRepositoryRootReq {}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoRepositoryRootResult {
    #[prost(string, tag = "1")]
    pub location: ::prost::alloc::string::String,
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoReloadReq {
    #[prost(string, tag = "1")]
    pub id: ::prost::alloc::string::String,
}
/// Empty
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoReloadAllReq {}
/// Empty
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoReloadResult {}
/// Empty
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoCanonicalNameReq {}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoCanonicalNameResult {
    #[prost(string, tag = "1")]
    pub name: ::prost::alloc::string::String,
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoRunOperationReq {
    #[prost(string, tag = "1")]
    pub operation_id: ::prost::alloc::string::String,
    /// JSON encoded input document.
    #[prost(bytes = "vec", tag = "2")]
    pub input: ::prost::alloc::vec::Vec<u8>,
    /// Fire-and-forget; the reply carries no output.
    #[prost(bool, tag = "3")]
    pub asynchronous: bool,
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoRunOperationResult {
    #[prost(oneof = "proto_run_operation_result::Result", tags = "1, 2")]
    pub result: ::core::option::Option<proto_run_operation_result::Result>,
}
/// Nested message and enum types in `ProtoRunOperationResult`.
pub mod proto_run_operation_result {
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum Result {
        #[prost(message, tag = "1")]
        Ok(super::ProtoOperationOutput),
        #[prost(message, tag = "2")]
        Err(super::ProtoOperationError),
    }
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoOperationOutput {
    /// JSON encoded output document, empty for asynchronous runs.
    #[prost(bytes = "vec", tag = "1")]
    pub output: ::prost::alloc::vec::Vec<u8>,
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoOperationError {
    #[prost(oneof = "proto_operation_error::Err", tags = "1, 2")]
    pub err: ::core::option::Option<proto_operation_error::Err>,
}
/// Nested message and enum types in `ProtoOperationError`.
pub mod proto_operation_error {
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum Err {
        #[prost(message, tag = "1")]
        UnknownOperation(super::ProtoUnknownOperation),
        #[prost(message, tag = "2")]
        ServerFault(super::ProtoServerFault),
    }
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoUnknownOperation {
    #[prost(string, tag = "1")]
    pub operation_id: ::prost::alloc::string::String,
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoServerFault {
    #[prost(string, tag = "1")]
    pub message: ::prost::alloc::string::String,
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoDeliverReq {
    #[prost(string, tag = "1")]
    pub path: ::prost::alloc::string::String,
    #[prost(bytes = "vec", tag = "2")]
    pub payload: ::prost::alloc::vec::Vec<u8>,
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoDeliverResult {
    #[prost(bytes = "vec", tag = "1")]
    pub payload: ::prost::alloc::vec::Vec<u8>,
}
/// Carried as the payload of Deliver for the election callback path.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoBullyMessage {
    #[prost(enumeration = "ProtoBullyKind", tag = "1")]
    pub kind: i32,
    #[prost(string, tag = "2")]
    pub from: ::prost::alloc::string::String,
}
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum ProtoBullyKind {
    Unknown = 0,
    Election = 1,
    Coordinator = 2,
    Ping = 3,
    Alive = 4,
    Ack = 5,
}
#[doc = r" Generated client implementations."]
pub mod grpc_peer_client {
    #![allow(unused_variables, dead_code, missing_docs)]
    use tonic::codegen::*;
    #[doc = " Peer-to-peer service every cluster node exposes on its RPC port (default 5555)."]
    pub struct GrpcPeerClient<T> {
        inner: tonic::client::Grpc<T>,
    }
    impl GrpcPeerClient<tonic::transport::Channel> {
        #[doc = r" Attempt to create a new client by connecting to a given endpoint."]
        pub async fn connect<D>(dst: D) -> Result<Self, tonic::transport::Error>
        where
            D: std::convert::TryInto<tonic::transport::Endpoint>,
            D::Error: Into<StdError>,
        {
            let conn = tonic::transport::Endpoint::new(dst)?.connect().await?;
            Ok(Self::new(conn))
        }
    }
    impl<T> GrpcPeerClient<T>
    where
        T: tonic::client::GrpcService<tonic::body::BoxBody>,
        T::ResponseBody: Body + HttpBody + Send + 'static,
        T::Error: Into<StdError>,
        <T::ResponseBody as HttpBody>::Error: Into<StdError> + Send,
    {
        pub fn new(inner: T) -> Self {
            let inner = tonic::client::Grpc::new(inner);
            Self { inner }
        }
        pub fn with_interceptor(inner: T, interceptor: impl Into<tonic::Interceptor>) -> Self {
            let inner = tonic::client::Grpc::with_interceptor(inner, interceptor);
            Self { inner }
        }
        pub async fn get_repository_root(
            &mut self,
            request: impl tonic::IntoRequest<super::ProtoRepositoryRootReq>,
        ) -> Result<tonic::Response<super::ProtoRepositoryRootResult>, tonic::Status> {
            self.inner.ready().await.map_err(|e| {
                tonic::Status::new(
                    tonic::Code::Unknown,
                    format!("Service was not ready: {}", e.into()),
                )
            })?;
            let codec = tonic::codec::ProstCodec::default();
            let path = http::uri::PathAndQuery::from_static("/cluster.GrpcPeer/GetRepositoryRoot");
            self.inner.unary(request.into_request(), path, codec).await
        }
        pub async fn reload(
            &mut self,
            request: impl tonic::IntoRequest<super::ProtoReloadReq>,
        ) -> Result<tonic::Response<super::ProtoReloadResult>, tonic::Status> {
            self.inner.ready().await.map_err(|e| {
                tonic::Status::new(
                    tonic::Code::Unknown,
                    format!("Service was not ready: {}", e.into()),
                )
            })?;
            let codec = tonic::codec::ProstCodec::default();
            let path = http::uri::PathAndQuery::from_static("/cluster.GrpcPeer/Reload");
            self.inner.unary(request.into_request(), path, codec).await
        }
        pub async fn reload_all(
            &mut self,
            request: impl tonic::IntoRequest<super::ProtoReloadAllReq>,
        ) -> Result<tonic::Response<super::ProtoReloadResult>, tonic::Status> {
            self.inner.ready().await.map_err(|e| {
                tonic::Status::new(
                    tonic::Code::Unknown,
                    format!("Service was not ready: {}", e.into()),
                )
            })?;
            let codec = tonic::codec::ProstCodec::default();
            let path = http::uri::PathAndQuery::from_static("/cluster.GrpcPeer/ReloadAll");
            self.inner.unary(request.into_request(), path, codec).await
        }
        pub async fn get_canonical_name(
            &mut self,
            request: impl tonic::IntoRequest<super::ProtoCanonicalNameReq>,
        ) -> Result<tonic::Response<super::ProtoCanonicalNameResult>, tonic::Status> {
            self.inner.ready().await.map_err(|e| {
                tonic::Status::new(
                    tonic::Code::Unknown,
                    format!("Service was not ready: {}", e.into()),
                )
            })?;
            let codec = tonic::codec::ProstCodec::default();
            let path = http::uri::PathAndQuery::from_static("/cluster.GrpcPeer/GetCanonicalName");
            self.inner.unary(request.into_request(), path, codec).await
        }
        pub async fn run_operation(
            &mut self,
            request: impl tonic::IntoRequest<super::ProtoRunOperationReq>,
        ) -> Result<tonic::Response<super::ProtoRunOperationResult>, tonic::Status> {
            self.inner.ready().await.map_err(|e| {
                tonic::Status::new(
                    tonic::Code::Unknown,
                    format!("Service was not ready: {}", e.into()),
                )
            })?;
            let codec = tonic::codec::ProstCodec::default();
            let path = http::uri::PathAndQuery::from_static("/cluster.GrpcPeer/RunOperation");
            self.inner.unary(request.into_request(), path, codec).await
        }
        #[doc = " Opaque payload routed to whichever local handler subscribed to `path`."]
        pub async fn deliver(
            &mut self,
            request: impl tonic::IntoRequest<super::ProtoDeliverReq>,
        ) -> Result<tonic::Response<super::ProtoDeliverResult>, tonic::Status> {
            self.inner.ready().await.map_err(|e| {
                tonic::Status::new(
                    tonic::Code::Unknown,
                    format!("Service was not ready: {}", e.into()),
                )
            })?;
            let codec = tonic::codec::ProstCodec::default();
            let path = http::uri::PathAndQuery::from_static("/cluster.GrpcPeer/Deliver");
            self.inner.unary(request.into_request(), path, codec).await
        }
    }
    impl<T: Clone> Clone for GrpcPeerClient<T> {
        fn clone(&self) -> Self {
            Self {
                inner: self.inner.clone(),
            }
        }
    }
    impl<T> std::fmt::Debug for GrpcPeerClient<T> {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "GrpcPeerClient {{ ... }}")
        }
    }
}
#[doc = r" Generated server implementations."]
pub mod grpc_peer_server {
    #![allow(unused_variables, dead_code, missing_docs)]
    use tonic::codegen::*;
    #[doc = "Generated trait containing gRPC methods that should be implemented for use with GrpcPeerServer."]
    #[async_trait]
    pub trait GrpcPeer: Send + Sync + 'static {
        async fn get_repository_root(
            &self,
            request: tonic::Request<super::ProtoRepositoryRootReq>,
        ) -> Result<tonic::Response<super::ProtoRepositoryRootResult>, tonic::Status>;
        async fn reload(
            &self,
            request: tonic::Request<super::ProtoReloadReq>,
        ) -> Result<tonic::Response<super::ProtoReloadResult>, tonic::Status>;
        async fn reload_all(
            &self,
            request: tonic::Request<super::ProtoReloadAllReq>,
        ) -> Result<tonic::Response<super::ProtoReloadResult>, tonic::Status>;
        async fn get_canonical_name(
            &self,
            request: tonic::Request<super::ProtoCanonicalNameReq>,
        ) -> Result<tonic::Response<super::ProtoCanonicalNameResult>, tonic::Status>;
        async fn run_operation(
            &self,
            request: tonic::Request<super::ProtoRunOperationReq>,
        ) -> Result<tonic::Response<super::ProtoRunOperationResult>, tonic::Status>;
        #[doc = " Opaque payload routed to whichever local handler subscribed to `path`."]
        async fn deliver(
            &self,
            request: tonic::Request<super::ProtoDeliverReq>,
        ) -> Result<tonic::Response<super::ProtoDeliverResult>, tonic::Status>;
    }
    #[doc = " Peer-to-peer service every cluster node exposes on its RPC port (default 5555)."]
    #[derive(Debug)]
    pub struct GrpcPeerServer<T: GrpcPeer> {
        inner: _Inner<T>,
    }
    struct _Inner<T>(Arc<T>, Option<tonic::Interceptor>);
    impl<T: GrpcPeer> GrpcPeerServer<T> {
        pub fn new(inner: T) -> Self {
            let inner = Arc::new(inner);
            let inner = _Inner(inner, None);
            Self { inner }
        }
        pub fn with_interceptor(inner: T, interceptor: impl Into<tonic::Interceptor>) -> Self {
            let inner = Arc::new(inner);
            let inner = _Inner(inner, Some(interceptor.into()));
            Self { inner }
        }
    }
    impl<T, B> Service<http::Request<B>> for GrpcPeerServer<T>
    where
        T: GrpcPeer,
        B: HttpBody + Send + Sync + 'static,
        B::Error: Into<StdError> + Send + 'static,
    {
        type Response = http::Response<tonic::body::BoxBody>;
        type Error = Never;
        type Future = BoxFuture<Self::Response, Self::Error>;
        fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
            Poll::Ready(Ok(()))
        }
        fn call(&mut self, req: http::Request<B>) -> Self::Future {
            let inner = self.inner.clone();
            match req.uri().path() {
                "/cluster.GrpcPeer/GetRepositoryRoot" => {
                    #[allow(non_camel_case_types)]
                    struct GetRepositoryRootSvc<T: GrpcPeer>(pub Arc<T>);
                    impl<T: GrpcPeer> tonic::server::UnaryService<super::ProtoRepositoryRootReq>
                        for GetRepositoryRootSvc<T>
                    {
                        type Response = super::ProtoRepositoryRootResult;
                        type Future = BoxFuture<tonic::Response<Self::Response>, tonic::Status>;
                        fn call(
                            &mut self,
                            request: tonic::Request<super::ProtoRepositoryRootReq>,
                        ) -> Self::Future {
                            let inner = self.0.clone();
                            let fut = async move { (*inner).get_repository_root(request).await };
                            Box::pin(fut)
                        }
                    }
                    let inner = self.inner.clone();
                    let fut = async move {
                        let interceptor = inner.1.clone();
                        let inner = inner.0;
                        let method = GetRepositoryRootSvc(inner);
                        let codec = tonic::codec::ProstCodec::default();
                        let mut grpc = if let Some(interceptor) = interceptor {
                            tonic::server::Grpc::with_interceptor(codec, interceptor)
                        } else {
                            tonic::server::Grpc::new(codec)
                        };
                        let res = grpc.unary(method, req).await;
                        Ok(res)
                    };
                    Box::pin(fut)
                }
                "/cluster.GrpcPeer/Reload" => {
                    #[allow(non_camel_case_types)]
                    struct ReloadSvc<T: GrpcPeer>(pub Arc<T>);
                    impl<T: GrpcPeer> tonic::server::UnaryService<super::ProtoReloadReq> for ReloadSvc<T> {
                        type Response = super::ProtoReloadResult;
                        type Future = BoxFuture<tonic::Response<Self::Response>, tonic::Status>;
                        fn call(
                            &mut self,
                            request: tonic::Request<super::ProtoReloadReq>,
                        ) -> Self::Future {
                            let inner = self.0.clone();
                            let fut = async move { (*inner).reload(request).await };
                            Box::pin(fut)
                        }
                    }
                    let inner = self.inner.clone();
                    let fut = async move {
                        let interceptor = inner.1.clone();
                        let inner = inner.0;
                        let method = ReloadSvc(inner);
                        let codec = tonic::codec::ProstCodec::default();
                        let mut grpc = if let Some(interceptor) = interceptor {
                            tonic::server::Grpc::with_interceptor(codec, interceptor)
                        } else {
                            tonic::server::Grpc::new(codec)
                        };
                        let res = grpc.unary(method, req).await;
                        Ok(res)
                    };
                    Box::pin(fut)
                }
                "/cluster.GrpcPeer/ReloadAll" => {
                    #[allow(non_camel_case_types)]
                    struct ReloadAllSvc<T: GrpcPeer>(pub Arc<T>);
                    impl<T: GrpcPeer> tonic::server::UnaryService<super::ProtoReloadAllReq> for ReloadAllSvc<T> {
                        type Response = super::ProtoReloadResult;
                        type Future = BoxFuture<tonic::Response<Self::Response>, tonic::Status>;
                        fn call(
                            &mut self,
                            request: tonic::Request<super::ProtoReloadAllReq>,
                        ) -> Self::Future {
                            let inner = self.0.clone();
                            let fut = async move { (*inner).reload_all(request).await };
                            Box::pin(fut)
                        }
                    }
                    let inner = self.inner.clone();
                    let fut = async move {
                        let interceptor = inner.1.clone();
                        let inner = inner.0;
                        let method = ReloadAllSvc(inner);
                        let codec = tonic::codec::ProstCodec::default();
                        let mut grpc = if let Some(interceptor) = interceptor {
                            tonic::server::Grpc::with_interceptor(codec, interceptor)
                        } else {
                            tonic::server::Grpc::new(codec)
                        };
                        let res = grpc.unary(method, req).await;
                        Ok(res)
                    };
                    Box::pin(fut)
                }
                "/cluster.GrpcPeer/GetCanonicalName" => {
                    #[allow(non_camel_case_types)]
                    struct GetCanonicalNameSvc<T: GrpcPeer>(pub Arc<T>);
                    impl<T: GrpcPeer> tonic::server::UnaryService<super::ProtoCanonicalNameReq>
                        for GetCanonicalNameSvc<T>
                    {
                        type Response = super::ProtoCanonicalNameResult;
                        type Future = BoxFuture<tonic::Response<Self::Response>, tonic::Status>;
                        fn call(
                            &mut self,
                            request: tonic::Request<super::ProtoCanonicalNameReq>,
                        ) -> Self::Future {
                            let inner = self.0.clone();
                            let fut = async move { (*inner).get_canonical_name(request).await };
                            Box::pin(fut)
                        }
                    }
                    let inner = self.inner.clone();
                    let fut = async move {
                        let interceptor = inner.1.clone();
                        let inner = inner.0;
                        let method = GetCanonicalNameSvc(inner);
                        let codec = tonic::codec::ProstCodec::default();
                        let mut grpc = if let Some(interceptor) = interceptor {
                            tonic::server::Grpc::with_interceptor(codec, interceptor)
                        } else {
                            tonic::server::Grpc::new(codec)
                        };
                        let res = grpc.unary(method, req).await;
                        Ok(res)
                    };
                    Box::pin(fut)
                }
                "/cluster.GrpcPeer/RunOperation" => {
                    #[allow(non_camel_case_types)]
                    struct RunOperationSvc<T: GrpcPeer>(pub Arc<T>);
                    impl<T: GrpcPeer> tonic::server::UnaryService<super::ProtoRunOperationReq> for RunOperationSvc<T> {
                        type Response = super::ProtoRunOperationResult;
                        type Future = BoxFuture<tonic::Response<Self::Response>, tonic::Status>;
                        fn call(
                            &mut self,
                            request: tonic::Request<super::ProtoRunOperationReq>,
                        ) -> Self::Future {
                            let inner = self.0.clone();
                            let fut = async move { (*inner).run_operation(request).await };
                            Box::pin(fut)
                        }
                    }
                    let inner = self.inner.clone();
                    let fut = async move {
                        let interceptor = inner.1.clone();
                        let inner = inner.0;
                        let method = RunOperationSvc(inner);
                        let codec = tonic::codec::ProstCodec::default();
                        let mut grpc = if let Some(interceptor) = interceptor {
                            tonic::server::Grpc::with_interceptor(codec, interceptor)
                        } else {
                            tonic::server::Grpc::new(codec)
                        };
                        let res = grpc.unary(method, req).await;
                        Ok(res)
                    };
                    Box::pin(fut)
                }
                "/cluster.GrpcPeer/Deliver" => {
                    #[allow(non_camel_case_types)]
                    struct DeliverSvc<T: GrpcPeer>(pub Arc<T>);
                    impl<T: GrpcPeer> tonic::server::UnaryService<super::ProtoDeliverReq> for DeliverSvc<T> {
                        type Response = super::ProtoDeliverResult;
                        type Future = BoxFuture<tonic::Response<Self::Response>, tonic::Status>;
                        fn call(
                            &mut self,
                            request: tonic::Request<super::ProtoDeliverReq>,
                        ) -> Self::Future {
                            let inner = self.0.clone();
                            let fut = async move { (*inner).deliver(request).await };
                            Box::pin(fut)
                        }
                    }
                    let inner = self.inner.clone();
                    let fut = async move {
                        let interceptor = inner.1.clone();
                        let inner = inner.0;
                        let method = DeliverSvc(inner);
                        let codec = tonic::codec::ProstCodec::default();
                        let mut grpc = if let Some(interceptor) = interceptor {
                            tonic::server::Grpc::with_interceptor(codec, interceptor)
                        } else {
                            tonic::server::Grpc::new(codec)
                        };
                        let res = grpc.unary(method, req).await;
                        Ok(res)
                    };
                    Box::pin(fut)
                }
                _ => Box::pin(async move {
                    Ok(http::Response::builder()
                        .status(200)
                        .header("grpc-status", "12")
                        .header("content-type", "application/grpc")
                        .body(tonic::body::BoxBody::empty())
                        .unwrap())
                }),
            }
        }
    }
    impl<T: GrpcPeer> Clone for GrpcPeerServer<T> {
        fn clone(&self) -> Self {
            let inner = self.inner.clone();
            Self { inner }
        }
    }
    impl<T: GrpcPeer> Clone for _Inner<T> {
        fn clone(&self) -> Self {
            Self(self.0.clone(), self.1.clone())
        }
    }
    impl<T: std::fmt::Debug> std::fmt::Debug for _Inner<T> {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "{:?}", self.0)
        }
    }
    impl<T: GrpcPeer> tonic::transport::NamedService for GrpcPeerServer<T> {
        const NAME: &'static str = "cluster.GrpcPeer";
    }
}
