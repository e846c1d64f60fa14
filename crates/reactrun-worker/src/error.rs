//! Error types for the worker.

use thiserror::Error;

use reactrun_core::CoreError;

/// Errors from opening, listing, or closing a tool session.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The tool server process could not be started.
    #[error("Failed to spawn tool server: {0}")]
    Spawn(#[source] std::io::Error),

    /// The MCP handshake failed or did not finish in time.
    #[error("Tool server failed to initialize: {0}")]
    Initialize(String),

    /// A request to a running tool server failed.
    #[error("Tool server error: {0}")]
    Service(#[from] rmcp::service::ServiceError),

    /// The session was used after the tool server went away.
    #[error("Tool server closed the connection")]
    Closed,

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors from appending to an event sink.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("Event sink closed")]
    Closed,

    #[error("Failed to serialize event: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Failed to write event: {0}")]
    Io(#[from] std::io::Error),
}

/// Top-level errors of the worker process.
#[derive(Debug, Error)]
pub enum WorkerError {
    #[error(transparent)]
    Context(#[from] CoreError),

    #[error("Failed to parse job context: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid bind address '{0}'")]
    InvalidBind(String),
}
