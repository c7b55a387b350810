//! Error types for prometheus-interface
//!
//! `KeywordError` covers every validated failure of a keyword call and is
//! always reported back to the caller as a `(false, message)` pair.
//! `AppError` covers startup and exposition concerns and implements
//! `IntoResponse` for Axum handlers.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::registry::MetricKind;

/// Failure of a single keyword call
#[derive(Error, Debug)]
pub enum KeywordError {
    #[error("parameter '{0}' not defined")]
    MissingParameter(&'static str),

    #[error("a {kind} with name '{name}' is already defined")]
    DuplicateName { kind: MetricKind, name: String },

    #[error("{kind} '{name}' not defined")]
    UnknownName { kind: MetricKind, name: String },

    #[error("value '{value}' cannot be converted to {expected}")]
    TypeConversion {
        value: String,
        expected: &'static str,
    },

    /// Wording follows the metrics client's cardinality error
    #[error("inconsistent label cardinality, expect {expected} label values, but got {got}")]
    LabelCountMismatch { expected: usize, got: usize },

    #[error("invalid info '{input}': {reason}")]
    Syntax { input: String, reason: String },

    #[error("label {position} in '{input}' is empty")]
    EmptyLabel { input: String, position: usize },

    #[error("info key '{key}' overlaps with a label name of {kind} '{name}'")]
    InfoLabelOverlap {
        kind: MetricKind,
        name: String,
        key: String,
    },

    #[error("{kind} value '{current}' cannot be {change} without overflow")]
    Overflow {
        kind: MetricKind,
        current: String,
        change: String,
    },

    #[error(transparent)]
    Client(#[from] prometheus::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Main error type for startup and the exposition endpoint
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to read config file '{path}': {source}")]
    ConfigFileRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file '{path}': {source}")]
    ConfigParseFailed {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid configuration in '{path}': {reason}")]
    ConfigValidationFailed { path: String, reason: String },

    #[error("Failed to bind exposition endpoint on {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to register {name} at startup: {source}")]
    Startup {
        name: String,
        #[source]
        source: KeywordError,
    },

    #[error("Failed to encode metrics: {0}")]
    Encoding(#[from] prometheus::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::Config(_)
            | Self::ConfigFileRead { .. }
            | Self::ConfigParseFailed { .. }
            | Self::ConfigValidationFailed { .. }
            | Self::Startup { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Bind { .. } => StatusCode::SERVICE_UNAVAILABLE,
            Self::Encoding(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(serde_json::json!({
            "error": self.to_string(),
        }));

        (status, body).into_response()
    }
}

/// Convenience type alias for Results
pub type AppResult<T> = Result<T, AppError>;

/// Result of a registry operation before it is turned into a keyword reply
pub type KeywordOutcome<T> = Result<T, KeywordError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_parameter_message() {
        let err = KeywordError::MissingParameter("name");
        assert_eq!(err.to_string(), "parameter 'name' not defined");
    }

    #[test]
    fn test_duplicate_name_message() {
        let err = KeywordError::DuplicateName {
            kind: MetricKind::Counter,
            name: "requests_total".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "a counter with name 'requests_total' is already defined"
        );
    }

    #[test]
    fn test_unknown_name_message() {
        let err = KeywordError::UnknownName {
            kind: MetricKind::Gauge,
            name: "temperature".to_string(),
        };
        assert_eq!(err.to_string(), "gauge 'temperature' not defined");
    }

    #[test]
    fn test_label_count_mismatch_uses_client_wording() {
        let err = KeywordError::LabelCountMismatch {
            expected: 2,
            got: 1,
        };
        assert_eq!(
            err.to_string(),
            "inconsistent label cardinality, expect 2 label values, but got 1"
        );
    }

    #[test]
    fn test_client_error_is_forwarded_verbatim() {
        let client = prometheus::Error::Msg("'bad-name' is not a valid metric name".to_string());
        let expected = client.to_string();
        let err = KeywordError::from(client);
        assert_eq!(err.to_string(), expected);
    }

    #[test]
    fn test_config_error_creates() {
        let err = AppError::Config("test error".to_string());
        assert_eq!(err.to_string(), "Configuration error: test error");
    }

    #[test]
    fn test_internal_error_response_status() {
        let err = AppError::Internal("test".to_string());
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_encoding_error_response_status() {
        let err = AppError::Encoding(prometheus::Error::Msg("broken".to_string()));
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
