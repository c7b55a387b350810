//! prometheus-interface - Prometheus metrics as test-automation keywords
//!
//! This library registers Prometheus counters, gauges, infos, summaries and
//! histograms by name, routes semicolon-separated label values to their
//! label-bound series, and serves everything on an HTTP exposition endpoint.

pub mod cli;
pub mod config;
pub mod error;
pub mod handlers;
pub mod keywords;
pub mod metrics;
pub mod registry;
pub mod server;
pub mod telemetry;

pub use keywords::{KeywordResult, PrometheusInterface};
