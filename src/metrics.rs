//! Self-instrumentation and text exposition
//!
//! Tracks keyword calls by keyword and outcome, and encodes a registry in
//! Prometheus text format for the `/metrics` endpoint.
//!
//! The self-metrics live in the same registry as the user's metrics, under
//! the `prometheus_interface_` prefix.

use prometheus::{Encoder, IntCounterVec, Opts, Registry, TextEncoder};

/// Keyword enum for type-safe metrics labels
///
/// Restricts the `keyword` label to the library's fixed keyword set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keyword {
    AddCounter,
    IncCounter,
    AddGauge,
    SetGauge,
    IncGauge,
    DecGauge,
    AddInfo,
    SetInfo,
    AddSummary,
    ObserveSummary,
    AddHistogram,
    ObserveHistogram,
    ReadValue,
}

impl Keyword {
    /// Convert keyword to Prometheus label string
    pub fn as_str(&self) -> &'static str {
        match self {
            Keyword::AddCounter => "add_counter",
            Keyword::IncCounter => "inc_counter",
            Keyword::AddGauge => "add_gauge",
            Keyword::SetGauge => "set_gauge",
            Keyword::IncGauge => "inc_gauge",
            Keyword::DecGauge => "dec_gauge",
            Keyword::AddInfo => "add_info",
            Keyword::SetInfo => "set_info",
            Keyword::AddSummary => "add_summary",
            Keyword::ObserveSummary => "observe_summary",
            Keyword::AddHistogram => "add_histogram",
            Keyword::ObserveHistogram => "observe_histogram",
            Keyword::ReadValue => "read_value",
        }
    }
}

/// Keyword outcome label
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    Failure,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Success => "success",
            Outcome::Failure => "failure",
        }
    }
}

/// Metrics collector for the keyword library itself
#[derive(Clone)]
pub struct KeywordMetrics {
    keyword_calls: IntCounterVec,
}

impl KeywordMetrics {
    /// Create the self-metrics and register them with `registry`
    ///
    /// # Errors
    ///
    /// Returns an error if registration fails (e.g., duplicate names).
    pub fn register(registry: &Registry) -> Result<Self, prometheus::Error> {
        // Cardinality: 12 keywords × 2 outcomes = 24 time series
        let keyword_calls = IntCounterVec::new(
            Opts::new(
                "prometheus_interface_keyword_calls_total",
                "Total number of keyword calls by keyword and outcome",
            ),
            &["keyword", "outcome"],
        )?;

        registry.register(Box::new(keyword_calls.clone()))?;

        Ok(Self { keyword_calls })
    }

    /// Record one keyword call
    pub fn record_call(&self, keyword: Keyword, outcome: Outcome) {
        self.keyword_calls
            .with_label_values(&[keyword.as_str(), outcome.as_str()])
            .inc();
    }

    /// Number of calls recorded for a keyword and outcome
    pub fn calls(&self, keyword: Keyword, outcome: Outcome) -> u64 {
        self.keyword_calls
            .with_label_values(&[keyword.as_str(), outcome.as_str()])
            .get()
    }
}

/// Gather all metrics of `registry` and encode them in Prometheus text format
///
/// # Errors
///
/// Returns an error if metric encoding fails.
pub fn gather(registry: &Registry) -> Result<String, prometheus::Error> {
    let metric_families = registry.gather();
    let metric_count = metric_families.len();

    tracing::debug!(
        metric_family_count = metric_count,
        "Encoding metrics to Prometheus text format"
    );

    let mut buffer = Vec::new();
    let encoder = TextEncoder::new();

    encoder.encode(&metric_families, &mut buffer).map_err(|e| {
        let metric_names: Vec<_> = metric_families.iter().map(|mf| mf.name()).collect();

        tracing::error!(
            error = %e,
            metric_family_count = metric_count,
            metric_names = ?metric_names,
            "Prometheus text encoder failed"
        );

        prometheus::Error::Msg(format!(
            "Failed to encode {} metric families: {}. Metrics: {:?}",
            metric_count, e, metric_names
        ))
    })?;

    String::from_utf8(buffer).map_err(|e| {
        let valid_up_to = e.utf8_error().valid_up_to();

        tracing::error!(
            invalid_byte_index = valid_up_to,
            "Prometheus encoder produced invalid UTF-8"
        );

        prometheus::Error::Msg(format!(
            "Failed to convert metrics to UTF-8 at byte {}: {}. \
            This indicates corrupted metric names or labels.",
            valid_up_to, e
        ))
    })
}

/// Content type of the text exposition format
pub fn content_type() -> &'static str {
    prometheus::TEXT_FORMAT
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyword_as_str_conversion() {
        assert_eq!(Keyword::AddCounter.as_str(), "add_counter");
        assert_eq!(Keyword::ObserveHistogram.as_str(), "observe_histogram");
        assert_eq!(Keyword::SetInfo.as_str(), "set_info");
        assert_eq!(Keyword::ReadValue.as_str(), "read_value");
        assert_eq!(Outcome::Failure.as_str(), "failure");
    }

    #[test]
    fn test_record_call_increments_counter() {
        let registry = Registry::new();
        let metrics = KeywordMetrics::register(&registry).expect("Failed to create test metrics");

        metrics.record_call(Keyword::IncCounter, Outcome::Success);
        metrics.record_call(Keyword::IncCounter, Outcome::Success);
        metrics.record_call(Keyword::IncCounter, Outcome::Failure);

        assert_eq!(metrics.calls(Keyword::IncCounter, Outcome::Success), 2);
        assert_eq!(metrics.calls(Keyword::IncCounter, Outcome::Failure), 1);

        let output = gather(&registry).expect("Failed to gather test metrics");
        assert!(output.contains("prometheus_interface_keyword_calls_total"));
        assert!(output.contains("keyword=\"inc_counter\""));
        assert!(output.contains("outcome=\"failure\""));
    }

    #[test]
    fn test_register_twice_fails() {
        let registry = Registry::new();
        KeywordMetrics::register(&registry).expect("first registration");
        assert!(KeywordMetrics::register(&registry).is_err());
    }

    #[test]
    fn test_gather_produces_prometheus_text_format() {
        let registry = Registry::new();
        let metrics = KeywordMetrics::register(&registry).expect("Failed to create test metrics");
        metrics.record_call(Keyword::AddGauge, Outcome::Success);

        let output = gather(&registry).expect("Failed to gather test metrics");
        assert!(output.contains("# HELP prometheus_interface_keyword_calls_total"));
        assert!(output.contains("# TYPE prometheus_interface_keyword_calls_total counter"));
    }

    #[test]
    fn test_gather_empty_registry_is_empty_text() {
        let registry = Registry::new();
        let output = gather(&registry).expect("empty registry encodes");
        assert!(output.is_empty());
    }

    #[test]
    fn test_content_type_is_text_format() {
        assert!(content_type().starts_with("text/plain"));
    }
}
