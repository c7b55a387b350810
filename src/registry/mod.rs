//! Named-metric registry and label router
//!
//! Owns one name-to-metric mapping per `MetricKind` and a single
//! `prometheus::Registry` that the exposition endpoint gathers from.
//!
//! Every keyword goes through one of two generic routines:
//!
//! - [`MetricRegistry::register`]: validate, create the metric for the kind,
//!   register it with the client, store it under its name.
//! - [`MetricRegistry::mutate`]: look the metric up, parse the value, bind the
//!   positional label values, apply the [`Operation`].
//!
//! Neither routine leaves partial state behind on failure.

mod collectors;
mod kind;
mod labels;
mod name;

pub use collectors::{InfoVec, SummarySnapshot, SummaryVec, is_valid_label_name};
pub use kind::{
    DEFAULT_STEP, MetricKind, Operation, parse_increment, parse_integer, parse_observation,
    parse_step,
};
pub use labels::{LabelSchema, LabelValues, format_info, parse_info};
pub use name::MetricName;

use crate::error::{KeywordError, KeywordOutcome};
use prometheus::core::Collector;
use prometheus::{HistogramOpts, HistogramVec, IntCounterVec, IntGaugeVec, Opts, Registry};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::{Mutex, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Client-side metric object behind a registered name
#[derive(Clone)]
enum MetricHandle {
    Counter(IntCounterVec),
    Gauge(IntGaugeVec),
    Info(InfoVec),
    Summary(SummaryVec),
    Histogram(HistogramVec),
}

impl MetricHandle {
    fn create(
        kind: MetricKind,
        name: &MetricName,
        help: &str,
        schema: &LabelSchema,
    ) -> Result<Self, prometheus::Error> {
        let labels = schema.as_strs();
        let handle = match kind {
            MetricKind::Counter => {
                Self::Counter(IntCounterVec::new(Opts::new(name.as_str(), help), &labels)?)
            }
            MetricKind::Gauge => {
                Self::Gauge(IntGaugeVec::new(Opts::new(name.as_str(), help), &labels)?)
            }
            MetricKind::Info => Self::Info(InfoVec::new(name.as_str(), help, &labels)?),
            MetricKind::Summary => Self::Summary(SummaryVec::new(name.as_str(), help, &labels)?),
            // Client default buckets: 0.005 … 10
            MetricKind::Histogram => Self::Histogram(HistogramVec::new(
                HistogramOpts::new(name.as_str(), help),
                &labels,
            )?),
        };
        Ok(handle)
    }

    fn collector(&self) -> Box<dyn Collector> {
        match self {
            Self::Counter(vec) => Box::new(vec.clone()),
            Self::Gauge(vec) => Box::new(vec.clone()),
            Self::Info(vec) => Box::new(vec.clone()),
            Self::Summary(vec) => Box::new(vec.clone()),
            Self::Histogram(vec) => Box::new(vec.clone()),
        }
    }

    /// Materialize the single series of a label-less metric at value 0
    fn touch(&self) -> KeywordOutcome<()> {
        const NO_LABELS: &[&str] = &[];
        match self {
            Self::Counter(vec) => {
                vec.get_metric_with_label_values(NO_LABELS)?;
            }
            Self::Gauge(vec) => {
                vec.get_metric_with_label_values(NO_LABELS)?;
            }
            Self::Summary(vec) => {
                vec.snapshot(NO_LABELS)?;
            }
            Self::Histogram(vec) => {
                vec.get_metric_with_label_values(NO_LABELS)?;
            }
            Self::Info(_) => {}
        }
        Ok(())
    }

    fn apply(&self, values: &[&str], op: &Operation) -> KeywordOutcome<()> {
        match (self, op) {
            (Self::Counter(vec), Operation::Increment(v)) => {
                let counter = vec.get_metric_with_label_values(values)?;
                let current = counter.get();
                current
                    .checked_add(*v)
                    .ok_or_else(|| overflow(MetricKind::Counter, current, op))?;
                counter.inc_by(*v);
            }
            (Self::Gauge(vec), Operation::Add(v)) => {
                let gauge = vec.get_metric_with_label_values(values)?;
                let current = gauge.get();
                current
                    .checked_add(*v)
                    .ok_or_else(|| overflow(MetricKind::Gauge, current, op))?;
                gauge.add(*v);
            }
            (Self::Gauge(vec), Operation::Sub(v)) => {
                let gauge = vec.get_metric_with_label_values(values)?;
                let current = gauge.get();
                current
                    .checked_sub(*v)
                    .ok_or_else(|| overflow(MetricKind::Gauge, current, op))?;
                gauge.sub(*v);
            }
            (Self::Gauge(vec), Operation::Set(v)) => {
                vec.get_metric_with_label_values(values)?.set(*v);
            }
            (Self::Summary(vec), Operation::Observe(v)) => vec.observe(values, *v)?,
            (Self::Histogram(vec), Operation::Observe(v)) => {
                vec.get_metric_with_label_values(values)?.observe(*v);
            }
            (Self::Info(vec), Operation::SetInfo(info)) => vec.set(values, info.clone())?,
            (handle, op) => {
                return Err(KeywordError::Internal(format!(
                    "operation '{}' does not apply to a {}",
                    op.verb(),
                    handle.kind()
                )));
            }
        }
        Ok(())
    }

    fn read(&self, values: &[&str]) -> KeywordOutcome<Reading> {
        let reading = match self {
            Self::Counter(vec) => {
                Reading::Value(vec.get_metric_with_label_values(values)?.get() as f64)
            }
            Self::Gauge(vec) => {
                Reading::Value(vec.get_metric_with_label_values(values)?.get() as f64)
            }
            Self::Summary(vec) => Reading::Distribution(vec.snapshot(values)?),
            Self::Histogram(vec) => {
                let histogram = vec.get_metric_with_label_values(values)?;
                Reading::Distribution(SummarySnapshot {
                    count: histogram.get_sample_count(),
                    sum: histogram.get_sample_sum(),
                })
            }
            Self::Info(vec) => Reading::Info(vec.get(values)?),
        };
        Ok(reading)
    }

    fn kind(&self) -> MetricKind {
        match self {
            Self::Counter(_) => MetricKind::Counter,
            Self::Gauge(_) => MetricKind::Gauge,
            Self::Info(_) => MetricKind::Info,
            Self::Summary(_) => MetricKind::Summary,
            Self::Histogram(_) => MetricKind::Histogram,
        }
    }
}

/// Current state of one label-bound series
#[derive(Debug, Clone, PartialEq)]
pub enum Reading {
    /// Counter or gauge value
    Value(f64),
    /// Summary or histogram observation count and sum
    Distribution(SummarySnapshot),
    /// Info mapping (empty until first set)
    Info(BTreeMap<String, String>),
}

impl fmt::Display for Reading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reading::Value(v) => write!(f, "value '{v}'"),
            Reading::Distribution(s) => write!(f, "count '{}', sum '{}'", s.count, s.sum),
            Reading::Info(info) => write!(f, "info '{}'", format_info(info)),
        }
    }
}

impl Reading {
    /// Counter/gauge value, or observation count for distributions
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Reading::Value(v) => Some(*v),
            Reading::Distribution(s) => Some(s.count as f64),
            Reading::Info(_) => None,
        }
    }
}

fn overflow(kind: MetricKind, current: impl fmt::Display, op: &Operation) -> KeywordError {
    KeywordError::Overflow {
        kind,
        current: current.to_string(),
        change: op.describe(),
    }
}

struct RegisteredMetric {
    schema: LabelSchema,
    handle: MetricHandle,
    /// Serializes read-check-apply so overflow checks see the value they update
    update: Mutex<()>,
}

type KindTable = RwLock<HashMap<MetricName, RegisteredMetric>>;

/// Confirmation of a successful registration
#[derive(Debug, Clone)]
pub struct Registered {
    pub kind: MetricKind,
    pub name: MetricName,
    pub schema: LabelSchema,
}

impl fmt::Display for Registered {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} '{}' added", self.kind, self.name)?;
        if !self.schema.is_empty() {
            write!(f, " with labels: '{}'", self.schema.joined())?;
        }
        Ok(())
    }
}

/// Confirmation of a successful mutation
#[derive(Debug, Clone)]
pub struct Applied {
    pub kind: MetricKind,
    pub name: MetricName,
    pub operation: Operation,
    pub labels: LabelValues,
}

impl fmt::Display for Applied {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} '{}' {}",
            self.kind,
            self.name,
            self.operation.describe()
        )?;
        if !self.labels.is_empty() {
            write!(f, " with labels: '{}'", self.labels.joined())?;
        }
        Ok(())
    }
}

/// Registry of named metrics, one mapping per kind
///
/// Registration holds the kind's write lock from the duplicate check to the
/// insert, so concurrent `register` calls for one name yield one success.
/// Mutations only take the read lock.
pub struct MetricRegistry {
    registry: Registry,
    counters: KindTable,
    gauges: KindTable,
    infos: KindTable,
    summaries: KindTable,
    histograms: KindTable,
}

impl Default for MetricRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricRegistry {
    /// Create an empty registry backed by a fresh `prometheus::Registry`
    pub fn new() -> Self {
        Self::with_registry(Registry::new())
    }

    /// Create an empty registry that registers into `registry`
    pub fn with_registry(registry: Registry) -> Self {
        Self {
            registry,
            counters: KindTable::default(),
            gauges: KindTable::default(),
            infos: KindTable::default(),
            summaries: KindTable::default(),
            histograms: KindTable::default(),
        }
    }

    /// The client registry gathered by the exposition endpoint
    pub fn prometheus_registry(&self) -> &Registry {
        &self.registry
    }

    /// Register a new metric of `kind`
    ///
    /// # Errors
    ///
    /// - `MissingParameter` if `name` or `description` is absent or blank
    /// - `EmptyLabel` if a label name segment is empty
    /// - `DuplicateName` if `name` already exists for `kind`
    /// - `Client` if the metrics client rejects the metric
    pub fn register(
        &self,
        kind: MetricKind,
        name: Option<&str>,
        description: Option<&str>,
        labels: Option<&str>,
    ) -> KeywordOutcome<Registered> {
        let name = MetricName::parse(name)?;
        let description = description
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .ok_or(KeywordError::MissingParameter("description"))?;
        let schema = LabelSchema::parse(labels)?;

        let mut table = self.write(kind)?;
        if table.contains_key(&name) {
            return Err(KeywordError::DuplicateName {
                kind,
                name: name.to_string(),
            });
        }

        let handle = MetricHandle::create(kind, &name, description, &schema)?;
        if schema.is_empty() {
            handle.touch()?;
        }
        self.registry.register(handle.collector())?;

        tracing::debug!(
            kind = %kind,
            name = %name,
            labels = %schema.joined(),
            "Registered metric"
        );

        table.insert(
            name.clone(),
            RegisteredMetric {
                schema: schema.clone(),
                handle,
                update: Mutex::new(()),
            },
        );

        Ok(Registered { kind, name, schema })
    }

    /// Apply an operation to the label-bound series of a registered metric
    ///
    /// `operation` is only evaluated after the name lookup succeeded, so an
    /// unknown name is reported before an unparseable value.
    ///
    /// # Errors
    ///
    /// - `MissingParameter` if `name` is absent, or whatever `operation` returns
    /// - `UnknownName` if `name` is not registered for `kind`
    /// - `EmptyLabel` / `LabelCountMismatch` for bad label values
    /// - `InfoLabelOverlap` if an info key shadows a schema label
    pub fn mutate<F>(
        &self,
        kind: MetricKind,
        name: Option<&str>,
        labels: Option<&str>,
        operation: F,
    ) -> KeywordOutcome<Applied>
    where
        F: FnOnce() -> KeywordOutcome<Operation>,
    {
        let name = MetricName::parse(name)?;
        let table = self.read_table(kind)?;
        let metric = table.get(&name).ok_or_else(|| KeywordError::UnknownName {
            kind,
            name: name.to_string(),
        })?;

        let operation = operation()?;
        let values = LabelValues::parse(labels)?;
        metric.schema.check(&values)?;

        if let Operation::SetInfo(info) = &operation
            && let Some(key) = info.keys().find(|key| metric.schema.contains(key))
        {
            return Err(KeywordError::InfoLabelOverlap {
                kind,
                name: name.to_string(),
                key: key.clone(),
            });
        }

        {
            let _update = metric
                .update
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            metric.handle.apply(&values.as_strs(), &operation)?;
        }

        tracing::trace!(
            kind = %kind,
            name = %name,
            operation = operation.verb(),
            labels = %values.joined(),
            "Applied metric operation"
        );

        Ok(Applied {
            kind,
            name,
            operation,
            labels: values,
        })
    }

    /// Read the current state of a label-bound series
    ///
    /// Like the client's label binding, this creates the series if the label
    /// tuple has not been seen before.
    pub fn read(
        &self,
        kind: MetricKind,
        name: Option<&str>,
        labels: Option<&str>,
    ) -> KeywordOutcome<Reading> {
        let name = MetricName::parse(name)?;
        let table = self.read_table(kind)?;
        let metric = table.get(&name).ok_or_else(|| KeywordError::UnknownName {
            kind,
            name: name.to_string(),
        })?;

        let values = LabelValues::parse(labels)?;
        metric.schema.check(&values)?;
        metric.handle.read(&values.as_strs())
    }

    /// Label schema recorded for `name`, if registered
    pub fn schema(&self, kind: MetricKind, name: &str) -> Option<LabelSchema> {
        let table = self.read_table(kind).ok()?;
        table
            .get(&MetricName::from(name))
            .map(|metric| metric.schema.clone())
    }

    /// Registered names of `kind`, sorted
    pub fn names(&self, kind: MetricKind) -> Vec<String> {
        let Ok(table) = self.read_table(kind) else {
            return Vec::new();
        };
        let mut names: Vec<String> = table.keys().map(|n| n.to_string()).collect();
        names.sort();
        names
    }

    /// Number of registered metrics across all kinds
    pub fn len(&self) -> usize {
        MetricKind::ALL
            .iter()
            .filter_map(|kind| self.read_table(*kind).ok().map(|t| t.len()))
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn table(&self, kind: MetricKind) -> &KindTable {
        match kind {
            MetricKind::Counter => &self.counters,
            MetricKind::Gauge => &self.gauges,
            MetricKind::Info => &self.infos,
            MetricKind::Summary => &self.summaries,
            MetricKind::Histogram => &self.histograms,
        }
    }

    fn read_table(
        &self,
        kind: MetricKind,
    ) -> KeywordOutcome<RwLockReadGuard<'_, HashMap<MetricName, RegisteredMetric>>> {
        self.table(kind)
            .read()
            .map_err(|_| KeywordError::Internal(format!("{kind} table lock poisoned")))
    }

    fn write(
        &self,
        kind: MetricKind,
    ) -> KeywordOutcome<RwLockWriteGuard<'_, HashMap<MetricName, RegisteredMetric>>> {
        self.table(kind)
            .write()
            .map_err(|_| KeywordError::Internal(format!("{kind} table lock poisoned")))
    }
}
