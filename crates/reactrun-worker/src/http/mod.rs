//! HTTP hosting surface.
//!
//! Provides endpoints for:
//! - Job execution (`/v1/jobs`)
//! - Health check (`/health`)

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::executor::JobExecutor;

mod handlers;
pub mod responses;

/// Shared state of the HTTP server.
pub struct AppState {
    pub executor: JobExecutor,
}

/// Create the HTTP router.
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/v1/jobs", post(handlers::run_job))
        .route("/health", get(handlers::health_check))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
