//! prometheus-interface exporter
//!
//! Starts the exposition endpoint with the metrics declared in the config
//! file and serves them until interrupted.

use clap::Parser;
use prometheus_interface::{
    PrometheusInterface,
    cli::{Cli, Command, generate_config_template},
    config::Config,
    telemetry,
};
use std::path::Path;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if let Some(Command::Config { output }) = cli.command {
        let template = generate_config_template();
        match output {
            Some(path) => {
                std::fs::write(&path, template)?;
                eprintln!("Wrote configuration template to {}", path);
            }
            None => print!("{}", template),
        }
        return Ok(());
    }

    // A missing config file means "run with defaults"
    let mut config = if Path::new(&cli.config).exists() {
        Config::from_file(&cli.config)?
    } else {
        Config::default()
    };
    if let Some(port) = cli.port {
        config.exporter.port = port;
    }

    telemetry::init(&config.observability.log_level);

    tracing::info!(
        "Starting prometheus-interface exporter on {}",
        config.listen_addr()
    );

    let interface = PrometheusInterface::start(&config).await?;
    let info = interface.add_library_info();
    if !info.success {
        tracing::warn!(message = %info.message, "Library info metric not registered");
    }

    tokio::signal::ctrl_c().await?;
    tracing::info!("Interrupt received");

    interface.shutdown().await?;
    Ok(())
}
