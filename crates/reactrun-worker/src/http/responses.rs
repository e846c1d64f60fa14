//! HTTP request and response types.

use reactrun_core::EventEnvelope;
use serde::Serialize;

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub ok: bool,
}

/// Events emitted by one job, in emission order.
#[derive(Debug, Serialize)]
pub struct JobEventsResponse {
    pub job_events: Vec<EventEnvelope>,
}

/// Error response.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}
