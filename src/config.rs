//! Configuration management for prometheus-interface
//!
//! Parses TOML configuration files and provides typed access to settings.
//! Every section is optional; an empty file yields the library defaults
//! (exposition endpoint on `0.0.0.0:8000`, message level `INFO`).

use crate::error::{AppError, AppResult};
use crate::registry::MetricKind;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Default port of the exposition endpoint
pub const DEFAULT_PORT: u16 = 8000;

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub exporter: ExporterConfig,
    #[serde(default)]
    pub observability: ObservabilityConfig,
    /// Metrics registered when the library starts
    #[serde(default)]
    pub metrics: Vec<MetricDeclaration>,
}

/// Exposition endpoint configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ExporterConfig {
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on; 0 selects an ephemeral port
    #[serde(default = "default_port")]
    pub port: u16,
    /// Register the process collector (CPU, memory, file descriptors; Linux only)
    #[serde(default)]
    pub process_metrics: bool,
}

impl Default for ExporterConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            process_metrics: false,
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

/// Observability configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ObservabilityConfig {
    /// Subscriber filter level when RUST_LOG is unset
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Level at which keyword outcomes are logged
    #[serde(default)]
    pub message_level: MessageLevel,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            message_level: MessageLevel::default(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Message verbosity of keyword outcomes
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum MessageLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl MessageLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageLevel::Trace => "TRACE",
            MessageLevel::Debug => "DEBUG",
            MessageLevel::Info => "INFO",
            MessageLevel::Warn => "WARN",
            MessageLevel::Error => "ERROR",
        }
    }
}

impl fmt::Display for MessageLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MessageLevel {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "TRACE" => Ok(MessageLevel::Trace),
            "DEBUG" => Ok(MessageLevel::Debug),
            "INFO" => Ok(MessageLevel::Info),
            "WARN" | "WARNING" => Ok(MessageLevel::Warn),
            "ERROR" => Ok(MessageLevel::Error),
            other => Err(AppError::Config(format!(
                "unknown message level '{}', expected one of TRACE, DEBUG, INFO, WARN, ERROR",
                other
            ))),
        }
    }
}

/// Kind of a declared metric
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DeclaredKind {
    Counter,
    Gauge,
    Info,
    Summary,
    Histogram,
}

impl From<DeclaredKind> for MetricKind {
    fn from(kind: DeclaredKind) -> Self {
        match kind {
            DeclaredKind::Counter => MetricKind::Counter,
            DeclaredKind::Gauge => MetricKind::Gauge,
            DeclaredKind::Info => MetricKind::Info,
            DeclaredKind::Summary => MetricKind::Summary,
            DeclaredKind::Histogram => MetricKind::Histogram,
        }
    }
}

/// A metric registered at startup, same arguments as the `add_*` keywords
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MetricDeclaration {
    pub kind: DeclaredKind,
    pub name: String,
    pub description: String,
    /// Semicolon-separated label names
    #[serde(default)]
    pub labels: Option<String>,
}

impl Config {
    /// Configuration with every default but the given port
    pub fn with_port(port: u16) -> Self {
        Self {
            exporter: ExporterConfig {
                port,
                ..ExporterConfig::default()
            },
            ..Self::default()
        }
    }

    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> AppResult<Self> {
        let path_display = path.as_ref().display().to_string();

        let content = std::fs::read_to_string(path.as_ref()).map_err(|source| {
            AppError::ConfigFileRead {
                path: path_display.clone(),
                source,
            }
        })?;

        let config: Self =
            toml::from_str(&content).map_err(|source| AppError::ConfigParseFailed {
                path: path_display.clone(),
                source,
            })?;

        config
            .validate()
            .map_err(|e| AppError::ConfigValidationFailed {
                path: path_display,
                reason: e.to_string(),
            })?;

        Ok(config)
    }

    /// Validate configuration after parsing
    ///
    /// This is called automatically by `from_file()` and `from_str()`.
    pub fn validate(&self) -> AppResult<()> {
        if self.exporter.host.parse::<std::net::IpAddr>().is_err() {
            return Err(AppError::Config(format!(
                "exporter.host '{}' is not a valid IP address",
                self.exporter.host
            )));
        }

        if self.observability.log_level.trim().is_empty() {
            return Err(AppError::Config(
                "observability.log_level must not be empty".to_string(),
            ));
        }

        // Duplicates within one kind would fail at startup anyway; catch them
        // here with the declaration index for a better message.
        for (index, declaration) in self.metrics.iter().enumerate() {
            if declaration.name.trim().is_empty() {
                return Err(AppError::Config(format!(
                    "metrics[{}] has an empty name",
                    index
                )));
            }
            if declaration.description.trim().is_empty() {
                return Err(AppError::Config(format!(
                    "metrics[{}] '{}' has an empty description",
                    index, declaration.name
                )));
            }
            let duplicate = self.metrics[..index]
                .iter()
                .any(|earlier| earlier.kind == declaration.kind && earlier.name == declaration.name);
            if duplicate {
                return Err(AppError::Config(format!(
                    "metrics[{}] '{}' is declared more than once",
                    index, declaration.name
                )));
            }
        }

        Ok(())
    }

    /// Socket address string of the exposition endpoint
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.exporter.host, self.exporter.port)
    }
}

impl FromStr for Config {
    type Err = AppError;

    fn from_str(toml_str: &str) -> Result<Self, Self::Err> {
        let config: Config =
            toml::from_str(toml_str).map_err(|source| AppError::ConfigParseFailed {
                path: "<string>".to_string(),
                source,
            })?;

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_CONFIG: &str = r#"
[exporter]
host = "127.0.0.1"
port = 9100
process_metrics = true

[observability]
log_level = "debug"
message_level = "WARN"

[[metrics]]
kind = "counter"
name = "requests_total"
description = "count"
labels = "room;bench"

[[metrics]]
kind = "info"
name = "build"
description = "build information"
"#;

    #[test]
    fn test_config_from_str_parses_successfully() {
        let config = Config::from_str(TEST_CONFIG).expect("should parse config");
        assert_eq!(config.exporter.host, "127.0.0.1");
        assert_eq!(config.exporter.port, 9100);
        assert!(config.exporter.process_metrics);
        assert_eq!(config.observability.log_level, "debug");
        assert_eq!(config.observability.message_level, MessageLevel::Warn);
    }

    #[test]
    fn test_config_parses_metric_declarations() {
        let config = Config::from_str(TEST_CONFIG).expect("should parse config");
        assert_eq!(config.metrics.len(), 2);
        assert_eq!(config.metrics[0].kind, DeclaredKind::Counter);
        assert_eq!(config.metrics[0].labels.as_deref(), Some("room;bench"));
        assert_eq!(config.metrics[1].labels, None);
        assert_eq!(MetricKind::from(config.metrics[1].kind), MetricKind::Info);
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = Config::from_str("").expect("empty config is valid");
        assert_eq!(config.exporter.port, DEFAULT_PORT);
        assert_eq!(config.exporter.host, "0.0.0.0");
        assert_eq!(config.observability.message_level, MessageLevel::Info);
        assert!(config.metrics.is_empty());
    }

    #[test]
    fn test_with_port_overrides_only_port() {
        let config = Config::with_port(0);
        assert_eq!(config.exporter.port, 0);
        assert_eq!(config.listen_addr(), "0.0.0.0:0");
    }

    #[test]
    fn test_invalid_host_is_rejected() {
        let err = Config::from_str("[exporter]\nhost = \"localhost:80\"\n")
            .expect_err("host must be an IP");
        assert!(err.to_string().contains("exporter.host"));
    }

    #[test]
    fn test_duplicate_declaration_is_rejected() {
        let toml = r#"
[[metrics]]
kind = "gauge"
name = "temp"
description = "t"

[[metrics]]
kind = "gauge"
name = "temp"
description = "t again"
"#;
        let err = Config::from_str(toml).expect_err("duplicate");
        assert!(err.to_string().contains("declared more than once"));
    }

    #[test]
    fn test_same_name_different_kind_passes_validation() {
        let toml = r#"
[[metrics]]
kind = "gauge"
name = "temp"
description = "t"

[[metrics]]
kind = "counter"
name = "temp"
description = "t"
"#;
        assert!(Config::from_str(toml).is_ok());
    }

    #[test]
    fn test_unknown_message_level_is_a_parse_error() {
        let result = Config::from_str("[observability]\nmessage_level = \"LOUD\"\n");
        assert!(matches!(result, Err(AppError::ConfigParseFailed { .. })));
    }

    #[test]
    fn test_message_level_from_str() {
        assert_eq!("info".parse::<MessageLevel>().expect("info"), MessageLevel::Info);
        assert_eq!("Warning".parse::<MessageLevel>().expect("warn"), MessageLevel::Warn);
        assert!("verbose".parse::<MessageLevel>().is_err());
    }
}
