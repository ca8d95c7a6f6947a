use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

#[derive(Debug, thiserror::Error)]
pub enum OperationError {
    #[error("Unknown operation '{0}'")]
    Unknown(String),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Operation failed: {0}")]
    Failed(String),
}

impl From<serde_json::Error> for OperationError {
    fn from(e: serde_json::Error) -> Self {
        OperationError::InvalidInput(e.to_string())
    }
}

/// An operation that can be invoked by id, locally or from another cluster member.
#[async_trait::async_trait]
pub trait Operation: Send + Sync {
    async fn run(&self, input: Value) -> Result<Value, OperationError>;
}

/// OperationRegistry holds the operations a node exposes.
pub struct OperationRegistry {
    logger: slog::Logger,
    operations: RwLock<HashMap<String, Arc<dyn Operation>>>,
}

impl OperationRegistry {
    pub fn new(logger: slog::Logger) -> Self {
        OperationRegistry {
            logger,
            operations: RwLock::new(HashMap::new()),
        }
    }

    pub fn register(&self, operation_id: impl Into<String>, operation: Arc<dyn Operation>) {
        let operation_id = operation_id.into();
        slog::debug!(self.logger, "Registering operation {}", operation_id);
        self.operations
            .write()
            .expect("OperationRegistry.register() RwLock poison")
            .insert(operation_id, operation);
    }

    /// Registered operation ids, sorted.
    pub fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self
            .operations
            .read()
            .expect("OperationRegistry.ids() RwLock poison")
            .keys()
            .cloned()
            .collect();
        ids.sort();
        ids
    }

    fn get(&self, operation_id: &str) -> Result<Arc<dyn Operation>, OperationError> {
        self.operations
            .read()
            .expect("OperationRegistry.get() RwLock poison")
            .get(operation_id)
            .cloned()
            .ok_or_else(|| OperationError::Unknown(operation_id.to_string()))
    }

    pub async fn run(&self, operation_id: &str, input: Value) -> Result<Value, OperationError> {
        let operation = self.get(operation_id)?;
        slog::debug!(self.logger, "Running operation {}", operation_id);
        operation.run(input).await
    }

    /// Starts the operation in the background. Only an unknown id is reported.
    pub fn run_detached(&self, operation_id: &str, input: Value) -> Result<(), OperationError> {
        let operation = self.get(operation_id)?;
        let logger = self.logger.clone();
        let operation_id = operation_id.to_string();

        tokio::spawn(async move {
            if let Err(e) = operation.run(input).await {
                slog::error!(logger, "Detached operation {} failed: {}", operation_id, e);
            }
        });
        Ok(())
    }
}
