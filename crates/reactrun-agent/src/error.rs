//! Error types for the agent loop.

use thiserror::Error;

/// Errors that can occur while running the agent.
#[derive(Debug, Error)]
pub enum AgentError {
    /// No API key configured for the model provider.
    #[error("OPENAI_API_KEY environment variable is not set")]
    MissingApiKey,

    /// HTTP transport error talking to the model provider.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Model provider answered with a non-success status.
    #[error("Model API error ({status}): {body}")]
    Api { status: u16, body: String },

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Response did not have the expected shape.
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// The loop did not reach a final answer in time.
    #[error("Agent stopped after {0} iterations without a final answer")]
    MaxIterations(usize),
}
