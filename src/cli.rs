//! Command-line interface for prometheus-interface
//!
//! Provides argument parsing and subcommand handling for the exporter binary.

use clap::{Parser, Subcommand};

/// Prometheus metrics exposed as test-automation keywords
#[derive(Parser)]
#[command(name = "prometheus-interface")]
#[command(version)]
#[command(about = "Prometheus metrics exposed as test-automation keywords")]
#[command(
    long_about = "Runs the Prometheus exposition endpoint of the keyword library, \
    pre-registering the metrics declared in the configuration file."
)]
pub struct Cli {
    /// Path to configuration file (defaults are used if it does not exist)
    #[arg(short, long, default_value = "config.toml", global = true)]
    pub config: String,

    /// Override the exposition port from the configuration file
    #[arg(short, long)]
    pub port: Option<u16>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Generate a template configuration file
    Config {
        /// Output file path (prints to stdout if not specified)
        #[arg(short, long)]
        output: Option<String>,
    },
}

/// Generate template configuration content
pub fn generate_config_template() -> &'static str {
    r#"# prometheus-interface Configuration
# ==================================
#
# Every section is optional. Without a config file the exposition endpoint
# listens on 0.0.0.0:8000.

# ─────────────────────────────────────────────────────────────────────────────
# EXPOSITION ENDPOINT
# ─────────────────────────────────────────────────────────────────────────────

[exporter]
# IP address to bind to (0.0.0.0 for all interfaces, 127.0.0.1 for localhost only)
host = "0.0.0.0"

# Port to listen on (0 picks a free port)
port = 8000

# Export CPU, memory and file descriptor metrics of this process (Linux only)
process_metrics = false

# ─────────────────────────────────────────────────────────────────────────────
# OBSERVABILITY
# ─────────────────────────────────────────────────────────────────────────────

[observability]
# Log level: "trace", "debug", "info", "warn", "error" (RUST_LOG overrides)
log_level = "info"

# Level at which keyword results are logged: TRACE, DEBUG, INFO, WARN, ERROR
message_level = "INFO"

# ─────────────────────────────────────────────────────────────────────────────
# METRICS (Optional)
# ─────────────────────────────────────────────────────────────────────────────
#
# Metrics registered at startup, same arguments as the add_* keywords.
#   - kind: counter, gauge, info, summary, histogram
#   - labels: semicolon-separated label names (optional)

[[metrics]]
kind = "counter"
name = "requests_total"
description = "Total requests per room and bench"
labels = "room;bench"

[[metrics]]
kind = "gauge"
name = "temperature"
description = "Current temperature"
"#
}
