//! Metric kinds and the operations that can be applied to them

use crate::error::KeywordError;
use std::collections::BTreeMap;
use std::fmt;

/// Metric kind enum
///
/// Each kind owns its own name mapping in the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricKind {
    /// Monotonic integer accumulator
    Counter,
    /// Integer value that can be set, incremented or decremented
    Gauge,
    /// Key-value snapshot exposed as `<name>_info`
    Info,
    /// Count and sum of observations
    Summary,
    /// Bucketed observations
    Histogram,
}

impl MetricKind {
    pub const ALL: [MetricKind; 5] = [
        MetricKind::Counter,
        MetricKind::Gauge,
        MetricKind::Info,
        MetricKind::Summary,
        MetricKind::Histogram,
    ];

    /// Lowercase name used in messages and log fields
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricKind::Counter => "counter",
            MetricKind::Gauge => "gauge",
            MetricKind::Info => "info",
            MetricKind::Summary => "summary",
            MetricKind::Histogram => "histogram",
        }
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A validated mutation, ready to be applied to a label-bound series
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    /// Counter increment; counters never decrease
    Increment(u64),
    /// Gauge increment
    Add(i64),
    /// Gauge decrement
    Sub(i64),
    /// Absolute gauge value
    Set(i64),
    /// Summary or histogram observation
    Observe(f64),
    /// Replace the info mapping of a series
    SetInfo(BTreeMap<String, String>),
}

impl Operation {
    /// Verb used in status messages, e.g. "incremented"
    pub fn verb(&self) -> &'static str {
        match self {
            Operation::Increment(_) | Operation::Add(_) => "incremented",
            Operation::Sub(_) => "decremented",
            Operation::Set(_) | Operation::SetInfo(_) => "set",
            Operation::Observe(_) => "observed",
        }
    }

    /// Human-readable description of what was applied
    pub fn describe(&self) -> String {
        match self {
            Operation::Increment(v) => format!("incremented by value '{v}'"),
            Operation::Add(v) => format!("incremented by value '{v}'"),
            Operation::Sub(v) => format!("decremented by value '{v}'"),
            Operation::Set(v) => format!("set to value '{v}'"),
            Operation::Observe(v) => format!("observed value '{v}'"),
            Operation::SetInfo(info) => {
                format!("set to info '{}'", super::labels::format_info(info))
            }
        }
    }
}

/// Amount applied by increment/decrement keywords when `value` is omitted
pub const DEFAULT_STEP: u64 = 1;

/// Parse a counter increment: a non-negative integer, default 1
pub fn parse_increment(raw: Option<&str>) -> Result<u64, KeywordError> {
    match raw {
        None => Ok(DEFAULT_STEP),
        Some(value) => value
            .trim()
            .parse::<u64>()
            .map_err(|_| conversion(value, "a non-negative integer")),
    }
}

/// Parse a gauge step, default 1
pub fn parse_step(raw: Option<&str>) -> Result<i64, KeywordError> {
    match raw {
        None => Ok(DEFAULT_STEP as i64),
        Some(value) => parse_integer(value),
    }
}

/// Parse a required integer
pub fn parse_integer(raw: &str) -> Result<i64, KeywordError> {
    raw.trim()
        .parse::<i64>()
        .map_err(|_| conversion(raw, "an integer"))
}

/// Parse an observation: integer first, then float
///
/// Non-finite floats (NaN, infinities) are rejected because they corrupt
/// the sum of every distribution they land in.
pub fn parse_observation(raw: &str) -> Result<f64, KeywordError> {
    let trimmed = raw.trim();
    if let Ok(int) = trimmed.parse::<i64>() {
        return Ok(int as f64);
    }
    match trimmed.parse::<f64>() {
        Ok(float) if float.is_finite() => Ok(float),
        _ => Err(conversion(raw, "a finite number")),
    }
}

fn conversion(value: &str, expected: &'static str) -> KeywordError {
    KeywordError::TypeConversion {
        value: value.to_string(),
        expected,
    }
}
