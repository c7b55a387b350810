//! Keyword library facade
//!
//! [`PrometheusInterface`] is the object a test-automation framework holds:
//! constructing it starts the exposition endpoint, every public method is one
//! keyword, and [`PrometheusInterface::shutdown`] tears everything down.
//!
//! Keywords never fail with an error or a panic. Each returns a
//! [`KeywordResult`] carrying a success flag and a human-readable message.
//! Omitted `value` arguments of increment/decrement keywords default to 1.

use crate::config::{Config, MessageLevel};
use crate::error::{AppError, AppResult, KeywordError, KeywordOutcome};
use crate::handlers::AppState;
use crate::metrics::{Keyword, KeywordMetrics, Outcome};
use crate::registry::{
    MetricKind, MetricRegistry, Operation, Reading, parse_increment, parse_info, parse_integer,
    parse_observation, parse_step,
};
use crate::server::Exporter;
use std::fmt;
use std::net::SocketAddr;
use std::sync::Arc;

/// Crate version reported by `get_version`
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Name of the Info metric registered by `add_library_info`
pub const LIBRARY_INFO_NAME: &str = "prometheus_interface";

/// Outcome of one keyword call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordResult {
    pub success: bool,
    pub message: String,
}

impl KeywordResult {
    /// `(success, message)` pair, the shape keyword callers consume
    pub fn into_tuple(self) -> (bool, String) {
        (self.success, self.message)
    }
}

impl<T: fmt::Display> From<KeywordOutcome<T>> for KeywordResult {
    fn from(outcome: KeywordOutcome<T>) -> Self {
        match outcome {
            Ok(done) => Self {
                success: true,
                message: done.to_string(),
            },
            Err(e) => Self {
                success: false,
                message: e.to_string(),
            },
        }
    }
}

impl fmt::Display for KeywordResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} | {}", self.success, self.message)
    }
}

/// Prometheus keyword library instance
pub struct PrometheusInterface {
    registry: Arc<MetricRegistry>,
    keyword_metrics: KeywordMetrics,
    message_level: MessageLevel,
    exporter: Exporter,
}

impl PrometheusInterface {
    /// Start the library: create the registry, register the configured
    /// metrics, and start the exposition endpoint
    ///
    /// # Errors
    ///
    /// - `AppError::Startup` if a declared metric cannot be registered
    /// - `AppError::Bind` if the endpoint cannot listen on the configured port
    pub async fn start(config: &Config) -> AppResult<Self> {
        let registry = Arc::new(MetricRegistry::new());
        let keyword_metrics = KeywordMetrics::register(registry.prometheus_registry())
            .map_err(|e| AppError::Internal(format!("self-metrics registration failed: {}", e)))?;

        if config.exporter.process_metrics {
            register_process_collector(registry.prometheus_registry());
        }

        for declaration in &config.metrics {
            registry
                .register(
                    declaration.kind.into(),
                    Some(&declaration.name),
                    Some(&declaration.description),
                    declaration.labels.as_deref(),
                )
                .map_err(|source| AppError::Startup {
                    name: declaration.name.clone(),
                    source,
                })?;
        }

        let exporter =
            Exporter::start(&config.listen_addr(), AppState::new(Arc::clone(&registry))).await?;

        tracing::info!(
            version = VERSION,
            local_addr = %exporter.local_addr(),
            declared_metrics = config.metrics.len(),
            message_level = %config.observability.message_level,
            "Prometheus interface started"
        );

        Ok(Self {
            registry,
            keyword_metrics,
            message_level: config.observability.message_level,
            exporter,
        })
    }

    /// Start with default settings on `port` (0 selects an ephemeral port)
    pub async fn on_port(port: u16) -> AppResult<Self> {
        Self::start(&Config::with_port(port)).await
    }

    /// Stop the exposition endpoint and release all mappings
    pub async fn shutdown(self) -> AppResult<()> {
        let Self {
            registry, exporter, ..
        } = self;
        tracing::info!(
            registered_metrics = registry.len(),
            "Shutting down Prometheus interface"
        );
        exporter.shutdown().await
    }

    /// Address of the exposition endpoint
    pub fn local_addr(&self) -> SocketAddr {
        self.exporter.local_addr()
    }

    /// The underlying registry
    pub fn registry(&self) -> &MetricRegistry {
        &self.registry
    }

    /// Self-instrumentation counters
    pub fn keyword_metrics(&self) -> &KeywordMetrics {
        &self.keyword_metrics
    }

    // ─────────────────────────────────────────────────────────────────────
    // Library information
    // ─────────────────────────────────────────────────────────────────────

    /// Version of this interface library
    pub fn get_version(&self) -> &'static str {
        VERSION
    }

    /// Full name of this interface library
    pub fn who_am_i(&self) -> String {
        format!("{} v. {}", env!("CARGO_PKG_NAME"), VERSION)
    }

    /// Path of the running executable hosting this library
    pub fn where_am_i(&self) -> KeywordResult {
        std::env::current_exe()
            .map_err(|e| KeywordError::Internal(format!("cannot resolve executable path: {}", e)))
            .map(|path| path.display().to_string())
            .into()
    }

    /// Register the `prometheus_interface` Info metric describing this library
    pub fn add_library_info(&self) -> KeywordResult {
        let info = format!("interface:{};version:{}", self.who_am_i(), VERSION);
        let added = self.add_info(
            Some(LIBRARY_INFO_NAME),
            Some("name and version of prometheus interface"),
            None,
        );
        if !added.success {
            return added;
        }
        self.set_info(Some(LIBRARY_INFO_NAME), Some(&info), None)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Counters
    // ─────────────────────────────────────────────────────────────────────

    /// Add a new counter; `labels` is a semicolon-separated list of label names
    pub fn add_counter(
        &self,
        name: Option<&str>,
        description: Option<&str>,
        labels: Option<&str>,
    ) -> KeywordResult {
        self.add(Keyword::AddCounter, MetricKind::Counter, name, description, labels)
    }

    /// Increment a counter by `value` (default 1)
    ///
    /// `labels` are matched positionally to the names given to `add_counter`.
    pub fn inc_counter(
        &self,
        name: Option<&str>,
        value: Option<&str>,
        labels: Option<&str>,
    ) -> KeywordResult {
        self.mutate(Keyword::IncCounter, MetricKind::Counter, name, labels, || {
            parse_increment(value).map(Operation::Increment)
        })
    }

    // ─────────────────────────────────────────────────────────────────────
    // Gauges
    // ─────────────────────────────────────────────────────────────────────

    pub fn add_gauge(
        &self,
        name: Option<&str>,
        description: Option<&str>,
        labels: Option<&str>,
    ) -> KeywordResult {
        self.add(Keyword::AddGauge, MetricKind::Gauge, name, description, labels)
    }

    /// Set a gauge to an absolute integer value
    pub fn set_gauge(
        &self,
        name: Option<&str>,
        value: Option<&str>,
        labels: Option<&str>,
    ) -> KeywordResult {
        self.mutate(Keyword::SetGauge, MetricKind::Gauge, name, labels, || {
            let raw = value.ok_or(KeywordError::MissingParameter("value"))?;
            parse_integer(raw).map(Operation::Set)
        })
    }

    /// Increment a gauge by `value` (default 1)
    pub fn inc_gauge(
        &self,
        name: Option<&str>,
        value: Option<&str>,
        labels: Option<&str>,
    ) -> KeywordResult {
        self.mutate(Keyword::IncGauge, MetricKind::Gauge, name, labels, || {
            parse_step(value).map(Operation::Add)
        })
    }

    /// Decrement a gauge by `value` (default 1)
    pub fn dec_gauge(
        &self,
        name: Option<&str>,
        value: Option<&str>,
        labels: Option<&str>,
    ) -> KeywordResult {
        self.mutate(Keyword::DecGauge, MetricKind::Gauge, name, labels, || {
            parse_step(value).map(Operation::Sub)
        })
    }

    // ─────────────────────────────────────────────────────────────────────
    // Infos
    // ─────────────────────────────────────────────────────────────────────

    pub fn add_info(
        &self,
        name: Option<&str>,
        description: Option<&str>,
        labels: Option<&str>,
    ) -> KeywordResult {
        self.add(Keyword::AddInfo, MetricKind::Info, name, description, labels)
    }

    /// Replace the info of a series with `key:value;key:value` pairs
    pub fn set_info(
        &self,
        name: Option<&str>,
        info: Option<&str>,
        labels: Option<&str>,
    ) -> KeywordResult {
        self.mutate(Keyword::SetInfo, MetricKind::Info, name, labels, || {
            let raw = info.ok_or(KeywordError::MissingParameter("info"))?;
            parse_info(raw).map(Operation::SetInfo)
        })
    }

    // ─────────────────────────────────────────────────────────────────────
    // Summaries and histograms
    // ─────────────────────────────────────────────────────────────────────

    pub fn add_summary(
        &self,
        name: Option<&str>,
        description: Option<&str>,
        labels: Option<&str>,
    ) -> KeywordResult {
        self.add(Keyword::AddSummary, MetricKind::Summary, name, description, labels)
    }

    /// Record an integer or float observation in a summary
    pub fn observe_summary(
        &self,
        name: Option<&str>,
        value: Option<&str>,
        labels: Option<&str>,
    ) -> KeywordResult {
        self.mutate(Keyword::ObserveSummary, MetricKind::Summary, name, labels, || {
            observation(value)
        })
    }

    pub fn add_histogram(
        &self,
        name: Option<&str>,
        description: Option<&str>,
        labels: Option<&str>,
    ) -> KeywordResult {
        self.add(Keyword::AddHistogram, MetricKind::Histogram, name, description, labels)
    }

    /// Record an integer or float observation in a histogram
    pub fn observe_histogram(
        &self,
        name: Option<&str>,
        value: Option<&str>,
        labels: Option<&str>,
    ) -> KeywordResult {
        self.mutate(
            Keyword::ObserveHistogram,
            MetricKind::Histogram,
            name,
            labels,
            || observation(value),
        )
    }

    /// Current state of a series; creates the series if it is new
    ///
    /// Returns the typed reading rather than a `KeywordResult` so callers can
    /// assert on numbers. The call is counted and logged like any keyword.
    pub fn read_value(
        &self,
        kind: MetricKind,
        name: Option<&str>,
        labels: Option<&str>,
    ) -> KeywordOutcome<Reading> {
        let outcome = self.registry.read(kind, name, labels);
        let result = match &outcome {
            Ok(reading) => KeywordResult {
                success: true,
                message: format!(
                    "{} '{}' has {}",
                    kind,
                    name.map(str::trim).unwrap_or_default(),
                    reading
                ),
            },
            Err(e) => KeywordResult {
                success: false,
                message: e.to_string(),
            },
        };
        self.record(Keyword::ReadValue, &result);
        outcome
    }

    fn add(
        &self,
        keyword: Keyword,
        kind: MetricKind,
        name: Option<&str>,
        description: Option<&str>,
        labels: Option<&str>,
    ) -> KeywordResult {
        let outcome = self.registry.register(kind, name, description, labels);
        self.finish(keyword, outcome)
    }

    fn mutate<F>(
        &self,
        keyword: Keyword,
        kind: MetricKind,
        name: Option<&str>,
        labels: Option<&str>,
        operation: F,
    ) -> KeywordResult
    where
        F: FnOnce() -> KeywordOutcome<Operation>,
    {
        let outcome = self.registry.mutate(kind, name, labels, operation);
        self.finish(keyword, outcome)
    }

    fn finish<T: fmt::Display>(&self, keyword: Keyword, outcome: KeywordOutcome<T>) -> KeywordResult {
        let result = KeywordResult::from(outcome);
        self.record(keyword, &result);
        result
    }

    fn record(&self, keyword: Keyword, result: &KeywordResult) {
        let status = if result.success {
            Outcome::Success
        } else {
            Outcome::Failure
        };
        self.keyword_metrics.record_call(keyword, status);
        self.log(keyword, result);
    }

    fn log(&self, keyword: Keyword, result: &KeywordResult) {
        let keyword = keyword.as_str();
        let success = result.success;
        let message = result.message.as_str();
        match self.message_level {
            MessageLevel::Trace => tracing::trace!(keyword, success, message, "Keyword executed"),
            MessageLevel::Debug => tracing::debug!(keyword, success, message, "Keyword executed"),
            MessageLevel::Info => tracing::info!(keyword, success, message, "Keyword executed"),
            MessageLevel::Warn => tracing::warn!(keyword, success, message, "Keyword executed"),
            MessageLevel::Error => tracing::error!(keyword, success, message, "Keyword executed"),
        }
    }
}

fn observation(value: Option<&str>) -> KeywordOutcome<Operation> {
    let raw = value.ok_or(KeywordError::MissingParameter("value"))?;
    parse_observation(raw).map(Operation::Observe)
}

#[cfg(target_os = "linux")]
fn register_process_collector(registry: &prometheus::Registry) {
    let collector = prometheus::process_collector::ProcessCollector::for_self();
    if let Err(e) = registry.register(Box::new(collector)) {
        tracing::warn!(error = %e, "Failed to register process collector");
    }
}

#[cfg(not(target_os = "linux"))]
fn register_process_collector(_registry: &prometheus::Registry) {
    tracing::warn!("Process metrics are only available on Linux; ignoring exporter.process_metrics");
}
