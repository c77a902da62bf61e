//! The execution backend seam.
//!
//! The engine never compiles or runs code itself. It hands an
//! [`ExecutionRequest`] to an [`ExecutionBackend`] and gets back either the
//! captured output or a [`BackendError`] saying why there is none.

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// Why a backend produced no output.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("Compilation failed: {0}")]
    Compile(String),

    #[error("Runtime error: {0}")]
    Runtime(String),

    #[error("Timed out after {0:?}")]
    Timeout(Duration),

    #[error("Backend unavailable: {0}")]
    Unavailable(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// One piece of example code to execute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionRequest {
    pub test_id: String,
    pub code: String,
    /// Source unit the example came from.
    pub source_file: String,
    pub timeout: Duration,
}

/// Compiles and runs example code.
#[async_trait]
pub trait ExecutionBackend: Send + Sync {
    /// Run the request and return its standard output.
    ///
    /// Implementations may ignore `request.timeout`; callers enforce it.
    async fn execute(&self, request: &ExecutionRequest) -> Result<String, BackendError>;

    fn name(&self) -> &'static str;
}

/// Run `request`, turning an expired deadline into [`BackendError::Timeout`].
pub async fn execute_with_deadline(
    backend: &dyn ExecutionBackend,
    request: &ExecutionRequest,
) -> Result<String, BackendError> {
    match tokio::time::timeout(request.timeout, backend.execute(request)).await {
        Ok(result) => result,
        Err(_) => Err(BackendError::Timeout(request.timeout)),
    }
}
