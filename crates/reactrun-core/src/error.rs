//! Core domain errors.

use thiserror::Error;

/// Core domain errors for ReactRun.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Invalid state transition.
    #[error("Invalid state transition: {from} -> {to}")]
    InvalidStateTransition { from: String, to: String },

    /// Job context could not be decoded.
    #[error("Invalid job context: {0}")]
    InvalidContext(String),
}
