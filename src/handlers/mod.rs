//! HTTP request handlers for the exposition endpoint

use crate::registry::MetricRegistry;
use axum::{Router, routing::get};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub mod health;
pub mod metrics;

/// Application state shared across all handlers
///
/// Arc'd for cheap cloning across Axum handlers.
#[derive(Clone)]
pub struct AppState {
    registry: Arc<MetricRegistry>,
}

impl AppState {
    /// Create a new AppState serving `registry`
    pub fn new(registry: Arc<MetricRegistry>) -> Self {
        Self { registry }
    }

    /// Get reference to the metric registry
    pub fn registry(&self) -> &MetricRegistry {
        &self.registry
    }
}

/// Build the exposition router: `/metrics` and `/health`
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/metrics", get(metrics::handler))
        .route("/health", get(health::handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
