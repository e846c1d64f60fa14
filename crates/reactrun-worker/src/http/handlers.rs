//! HTTP request handlers.

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use reactrun_core::JobInputs;
use serde_json::Value;
use tracing::{info, warn};

use super::responses::{ErrorResponse, HealthResponse, JobEventsResponse};
use super::AppState;
use crate::sink::ChannelSink;

/// Health check endpoint.
pub async fn health_check() -> impl IntoResponse {
    Json(HealthResponse { ok: true })
}

/// Run one job to completion and return every event it emitted.
pub async fn run_job(
    State(state): State<Arc<AppState>>,
    Json(context): Json<Value>,
) -> impl IntoResponse {
    let inputs = match JobInputs::from_context(context) {
        Ok(inputs) => inputs,
        Err(e) => {
            warn!(error = %e, "Rejected job context");
            return (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse {
                    error: e.to_string(),
                }),
            )
                .into_response();
        }
    };

    let (sink, mut rx) = ChannelSink::new();
    let report = state.executor.execute(&inputs, Arc::new(sink)).await;

    let mut job_events = Vec::new();
    while let Ok(envelope) = rx.try_recv() {
        job_events.push(envelope);
    }

    info!(
        job_id = %report.job_id,
        events = job_events.len(),
        "Job events returned"
    );

    (StatusCode::OK, Json(JobEventsResponse { job_events })).into_response()
}
