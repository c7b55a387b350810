//! Type-safe metric name wrapper
//!
//! Names are the primary key of every kind mapping. Only emptiness is checked
//! here; the metrics client validates the Prometheus naming rules when the
//! metric is created and its error text is forwarded to the caller.

use crate::error::KeywordError;
use std::fmt;

/// Non-empty, trimmed metric name
#[derive(Debug, Clone, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub struct MetricName(String);

impl MetricName {
    /// Create a MetricName from an optional keyword argument
    ///
    /// # Errors
    /// Returns `MissingParameter("name")` if the argument is absent or blank.
    pub fn parse(raw: Option<&str>) -> Result<Self, KeywordError> {
        match raw.map(str::trim) {
            Some(name) if !name.is_empty() => Ok(Self(name.to_string())),
            _ => Err(KeywordError::MissingParameter("name")),
        }
    }

    /// Get the inner string value
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MetricName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for MetricName {
    /// Create a MetricName from a string slice
    ///
    /// Note: This does NOT check for emptiness. Prefer `MetricName::parse`
    /// for keyword input.
    fn from(name: &str) -> Self {
        Self(name.to_string())
    }
}
