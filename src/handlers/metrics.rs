//! Prometheus metrics endpoint
//!
//! Exposes the registry in Prometheus text format for scraping.

use axum::{
    extract::State,
    http::header,
    response::{IntoResponse, Response},
};

use crate::error::AppError;
use crate::handlers::AppState;

/// Metrics handler for Prometheus scraping
///
/// # Response
///
/// - `200 OK` with metrics in Prometheus text format
/// - `500 Internal Server Error` if encoding fails
///
/// # Example
///
/// ```bash
/// curl http://localhost:8000/metrics
/// # HELP requests_total count
/// # TYPE requests_total counter
/// requests_total{room="Room_1",bench="Bench_A"} 5
/// ```
pub async fn handler(State(state): State<AppState>) -> Result<Response, AppError> {
    let output = crate::metrics::gather(state.registry().prometheus_registry()).map_err(|e| {
        tracing::error!(
            error = %e,
            "Failed to gather metrics for Prometheus scraping"
        );
        AppError::Encoding(e)
    })?;

    Ok(([(header::CONTENT_TYPE, crate::metrics::content_type())], output).into_response())
}
