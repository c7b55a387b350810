//! Label string parsing
//!
//! Label names, label values and info pairs all arrive as semicolon-separated
//! strings. Segments are trimmed and keep their order; empty segments are
//! rejected.

use crate::error::KeywordError;
use std::collections::BTreeMap;

/// Ordered label names fixed at registration time
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelSchema(Vec<String>);

impl LabelSchema {
    /// Parse the optional `labels` argument of an `add_*` keyword
    ///
    /// A missing or blank argument yields the empty schema.
    pub fn parse(raw: Option<&str>) -> Result<Self, KeywordError> {
        split_labels(raw).map(Self)
    }

    /// Number of label values every mutation must supply
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn names(&self) -> &[String] {
        &self.0
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.iter().any(|label| label == name)
    }

    /// Label names as borrowed slices, the shape the metrics client expects
    pub fn as_strs(&self) -> Vec<&str> {
        self.0.iter().map(String::as_str).collect()
    }

    /// Semicolon-joined names for status messages
    pub fn joined(&self) -> String {
        self.0.join(";")
    }

    /// Check that `values` fits this schema positionally
    ///
    /// Only the count is compared; label names are never matched.
    pub fn check(&self, values: &LabelValues) -> Result<(), KeywordError> {
        if values.len() != self.len() {
            return Err(KeywordError::LabelCountMismatch {
                expected: self.len(),
                got: values.len(),
            });
        }
        Ok(())
    }
}

/// Ordered label values supplied at mutation time
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct LabelValues(Vec<String>);

impl LabelValues {
    /// Parse the optional `labels` argument of a mutation keyword
    pub fn parse(raw: Option<&str>) -> Result<Self, KeywordError> {
        split_labels(raw).map(Self)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn values(&self) -> &[String] {
        &self.0
    }

    pub fn as_strs(&self) -> Vec<&str> {
        self.0.iter().map(String::as_str).collect()
    }

    pub fn joined(&self) -> String {
        self.0.join(";")
    }
}

impl From<Vec<String>> for LabelValues {
    fn from(values: Vec<String>) -> Self {
        Self(values)
    }
}

fn split_labels(raw: Option<&str>) -> Result<Vec<String>, KeywordError> {
    let Some(input) = raw.filter(|s| !s.trim().is_empty()) else {
        return Ok(Vec::new());
    };

    input
        .split(';')
        .enumerate()
        .map(|(index, segment)| {
            let segment = segment.trim();
            if segment.is_empty() {
                Err(KeywordError::EmptyLabel {
                    input: input.to_string(),
                    position: index + 1,
                })
            } else {
                Ok(segment.to_string())
            }
        })
        .collect()
}

/// Parse an info string of `key:value` pairs separated by semicolons
///
/// Each pair is split once on its first colon, so values may contain colons.
/// A repeated key keeps its last value.
pub fn parse_info(input: &str) -> Result<BTreeMap<String, String>, KeywordError> {
    let syntax = |reason: String| KeywordError::Syntax {
        input: input.to_string(),
        reason,
    };

    let mut info = BTreeMap::new();
    for pair in input.split(';') {
        let Some((key, value)) = pair.split_once(':') else {
            return Err(syntax(format!(
                "pair '{}' is not of the form 'key:value'",
                pair.trim()
            )));
        };
        let (key, value) = (key.trim(), value.trim());
        if key.is_empty() {
            return Err(syntax(format!("pair '{}' has an empty key", pair.trim())));
        }
        if value.is_empty() {
            return Err(syntax(format!("pair '{}' has an empty value", pair.trim())));
        }
        info.insert(key.to_string(), value.to_string());
    }
    Ok(info)
}

/// Render an info mapping back into `key:value;key:value` form
pub fn format_info(info: &BTreeMap<String, String>) -> String {
    info.iter()
        .map(|(key, value)| format!("{key}:{value}"))
        .collect::<Vec<_>>()
        .join(";")
}
