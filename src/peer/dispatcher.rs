use bytes::Bytes;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("No handler subscribed to '{0}'")]
    NoHandler(String),
    #[error("Bad request: {0}")]
    BadRequest(String),
    #[error("Handler failed: {0}")]
    Failed(String),
}

/// Handles payloads delivered to the path it is subscribed to.
#[async_trait::async_trait]
pub trait RequestHandler: Send + Sync {
    async fn handle(&self, payload: Bytes) -> Result<Bytes, DispatchError>;
}

/// RequestDispatcher routes delivered payloads to the handler subscribed to the exact path.
#[derive(Default)]
pub struct RequestDispatcher {
    handlers: RwLock<HashMap<String, Arc<dyn RequestHandler>>>,
}

impl RequestDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribes `handler` to `path`, returning the handler it replaces.
    pub fn subscribe(
        &self,
        path: impl Into<String>,
        handler: Arc<dyn RequestHandler>,
    ) -> Option<Arc<dyn RequestHandler>> {
        self.handlers
            .write()
            .expect("RequestDispatcher.subscribe() RwLock poison")
            .insert(path.into(), handler)
    }

    pub fn unsubscribe(&self, path: &str) -> Option<Arc<dyn RequestHandler>> {
        self.handlers
            .write()
            .expect("RequestDispatcher.unsubscribe() RwLock poison")
            .remove(path)
    }

    pub async fn dispatch(&self, path: &str, payload: Bytes) -> Result<Bytes, DispatchError> {
        let handler = self
            .handlers
            .read()
            .expect("RequestDispatcher.dispatch() RwLock poison")
            .get(path)
            .cloned()
            .ok_or_else(|| DispatchError::NoHandler(path.to_string()))?;

        handler.handle(payload).await
    }
}
