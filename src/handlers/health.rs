//! Health check endpoint
//!
//! Provides a simple health check for monitoring and test harnesses.

use axum::{Json, extract::State, http::StatusCode};
use serde::Serialize;

use crate::handlers::AppState;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Service status
    pub status: &'static str,
    /// Number of metrics registered through keywords
    pub registered_metrics: usize,
}

/// Health check handler
///
/// Always returns 200 OK while the endpoint is listening.
pub async fn handler(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "OK",
            registered_metrics: state.registry().len(),
        }),
    )
}
