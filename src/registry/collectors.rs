//! Summary and Info collectors
//!
//! The prometheus crate ships counters, gauges and histograms but has no
//! summary or info metric. Both are implemented here as `Collector`s with the
//! same label-vector shape as the built-in `*Vec` types, so they register
//! with the same `prometheus::Registry` and go through the same
//! `TextEncoder`.
//!
//! - `SummaryVec` exposes `<name>_sum` and `<name>_count` per series, with no
//!   quantiles.
//! - `InfoVec` exposes a gauge family `<name>_info` whose series carry the
//!   schema labels followed by the info pairs, with the constant value 1.

use crate::error::KeywordError;
use prometheus::core::{Collector, Desc};
use prometheus::proto;
use protobuf::{EnumOrUnknown, MessageField};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Count and sum of the observations of one series
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SummarySnapshot {
    pub count: u64,
    pub sum: f64,
}

struct SummaryCore {
    desc: Desc,
    series: Mutex<HashMap<Vec<String>, SummarySnapshot>>,
}

/// Label-partitioned summary
#[derive(Clone)]
pub struct SummaryVec {
    core: Arc<SummaryCore>,
}

impl SummaryVec {
    /// Create a summary vector
    ///
    /// # Errors
    ///
    /// Returns the client's error if the metric name or a label name is invalid.
    pub fn new(name: &str, help: &str, label_names: &[&str]) -> Result<Self, prometheus::Error> {
        let desc = Desc::new(
            name.to_string(),
            help.to_string(),
            label_names.iter().map(|l| l.to_string()).collect(),
            HashMap::new(),
        )?;

        Ok(Self {
            core: Arc::new(SummaryCore {
                desc,
                series: Mutex::new(HashMap::new()),
            }),
        })
    }

    /// Record one observation in the series for `values`
    pub fn observe(&self, values: &[&str], value: f64) -> Result<(), KeywordError> {
        let key = self.key(values)?;
        let mut series = lock(&self.core.series);
        let entry = series.entry(key).or_default();
        entry.count += 1;
        entry.sum += value;
        Ok(())
    }

    /// Current snapshot of the series for `values`, creating it if needed
    pub fn snapshot(&self, values: &[&str]) -> Result<SummarySnapshot, KeywordError> {
        let key = self.key(values)?;
        Ok(*lock(&self.core.series).entry(key).or_default())
    }

    fn key(&self, values: &[&str]) -> Result<Vec<String>, KeywordError> {
        check_cardinality(&self.core.desc, values)?;
        Ok(values.iter().map(|v| v.to_string()).collect())
    }
}

impl Collector for SummaryVec {
    fn desc(&self) -> Vec<&Desc> {
        vec![&self.core.desc]
    }

    fn collect(&self) -> Vec<proto::MetricFamily> {
        let desc = &self.core.desc;
        let metrics: Vec<proto::Metric> = lock(&self.core.series)
            .iter()
            .map(|(values, snapshot)| proto::Metric {
                label: label_pairs(&desc.variable_labels, values),
                summary: MessageField::some(proto::Summary {
                    sample_count: Some(snapshot.count),
                    sample_sum: Some(snapshot.sum),
                    ..Default::default()
                }),
                ..Default::default()
            })
            .collect();

        family(desc, proto::MetricType::SUMMARY, metrics)
    }
}

struct InfoCore {
    desc: Desc,
    series: Mutex<HashMap<Vec<String>, BTreeMap<String, String>>>,
}

/// Label-partitioned info metric
#[derive(Clone)]
pub struct InfoVec {
    core: Arc<InfoCore>,
}

impl InfoVec {
    /// Create an info vector exposed as `<name>_info`
    pub fn new(name: &str, help: &str, label_names: &[&str]) -> Result<Self, prometheus::Error> {
        let desc = Desc::new(
            format!("{name}_info"),
            help.to_string(),
            label_names.iter().map(|l| l.to_string()).collect(),
            HashMap::new(),
        )?;

        Ok(Self {
            core: Arc::new(InfoCore {
                desc,
                series: Mutex::new(HashMap::new()),
            }),
        })
    }

    /// Replace the info mapping of the series for `values`
    pub fn set(&self, values: &[&str], info: BTreeMap<String, String>) -> Result<(), KeywordError> {
        check_cardinality(&self.core.desc, values)?;
        if let Some(key) = info.keys().find(|key| !is_valid_label_name(key)) {
            return Err(KeywordError::Syntax {
                input: super::labels::format_info(&info),
                reason: format!("info key '{key}' is not a valid label name"),
            });
        }

        let key = values.iter().map(|v| v.to_string()).collect();
        lock(&self.core.series).insert(key, info);
        Ok(())
    }

    /// Current mapping of the series for `values`; empty until first set
    pub fn get(&self, values: &[&str]) -> Result<BTreeMap<String, String>, KeywordError> {
        check_cardinality(&self.core.desc, values)?;
        let key: Vec<String> = values.iter().map(|v| v.to_string()).collect();
        Ok(lock(&self.core.series).get(&key).cloned().unwrap_or_default())
    }
}

impl Collector for InfoVec {
    fn desc(&self) -> Vec<&Desc> {
        vec![&self.core.desc]
    }

    fn collect(&self) -> Vec<proto::MetricFamily> {
        let desc = &self.core.desc;
        let metrics: Vec<proto::Metric> = lock(&self.core.series)
            .iter()
            .map(|(values, info)| {
                let mut label = label_pairs(&desc.variable_labels, values);
                label.extend(info.iter().map(|(k, v)| label_pair(k, v)));
                proto::Metric {
                    label,
                    gauge: MessageField::some(proto::Gauge {
                        value: Some(1.0),
                        ..Default::default()
                    }),
                    ..Default::default()
                }
            })
            .collect();

        family(desc, proto::MetricType::GAUGE, metrics)
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    // Series maps stay consistent across a panicking writer: every update is
    // a single insert or field bump.
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn check_cardinality(desc: &Desc, values: &[&str]) -> Result<(), KeywordError> {
    if values.len() != desc.variable_labels.len() {
        return Err(KeywordError::LabelCountMismatch {
            expected: desc.variable_labels.len(),
            got: values.len(),
        });
    }
    Ok(())
}

fn family(
    desc: &Desc,
    metric_type: proto::MetricType,
    metrics: Vec<proto::Metric>,
) -> Vec<proto::MetricFamily> {
    if metrics.is_empty() {
        return Vec::new();
    }

    vec![proto::MetricFamily {
        name: Some(desc.fq_name.clone()),
        help: Some(desc.help.clone()),
        type_: Some(EnumOrUnknown::new(metric_type)),
        metric: metrics,
        ..Default::default()
    }]
}

fn label_pairs(names: &[String], values: &[String]) -> Vec<proto::LabelPair> {
    names
        .iter()
        .zip(values)
        .map(|(name, value)| label_pair(name, value))
        .collect()
}

fn label_pair(name: &str, value: &str) -> proto::LabelPair {
    proto::LabelPair {
        name: Some(name.to_string()),
        value: Some(value.to_string()),
        ..Default::default()
    }
}

/// Prometheus label name rule: `[a-zA-Z_][a-zA-Z0-9_]*`, `__` prefix reserved
pub fn is_valid_label_name(name: &str) -> bool {
    let mut chars = name.chars();
    let valid_first = matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_');
    valid_first
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        && !name.starts_with("__")
}
