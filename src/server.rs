//! Exposition endpoint lifecycle
//!
//! Binds the listener, serves the handler router on a background task and
//! stops it on request.

use crate::error::{AppError, AppResult};
use crate::handlers::{self, AppState};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

/// Running exposition endpoint
///
/// Dropping an `Exporter` without calling [`Exporter::shutdown`] aborts the
/// server task.
pub struct Exporter {
    local_addr: SocketAddr,
    shutdown_tx: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<std::io::Result<()>>>,
}

impl Exporter {
    /// Bind `addr` and start serving `state` in the background
    ///
    /// # Errors
    ///
    /// Returns `AppError::Bind` if the address cannot be bound (e.g., port in use).
    pub async fn start(addr: &str, state: AppState) -> AppResult<Self> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| AppError::Bind {
                addr: addr.to_string(),
                source,
            })?;
        let local_addr = listener.local_addr().map_err(|source| AppError::Bind {
            addr: addr.to_string(),
            source,
        })?;

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let app = handlers::router(state);

        let task = tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    // Sender dropped counts as a shutdown request
                    let _ = shutdown_rx.await;
                })
                .await
        });

        tracing::info!(%local_addr, "Exposition endpoint listening");
        tracing::info!("Metrics available at http://{}/metrics", local_addr);

        Ok(Self {
            local_addr,
            shutdown_tx: Some(shutdown_tx),
            task: Some(task),
        })
    }

    /// Address the endpoint is bound to (resolves port 0)
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Stop listening and wait for in-flight scrapes to finish
    pub async fn shutdown(mut self) -> AppResult<()> {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }

        let Some(task) = self.task.take() else {
            return Ok(());
        };

        match task.await {
            Ok(Ok(())) => {
                tracing::info!(local_addr = %self.local_addr, "Exposition endpoint stopped");
                Ok(())
            }
            Ok(Err(e)) => Err(AppError::Internal(format!(
                "exposition endpoint on {} failed: {}",
                self.local_addr, e
            ))),
            Err(e) => Err(AppError::Internal(format!(
                "exposition endpoint task on {} did not complete: {}",
                self.local_addr, e
            ))),
        }
    }
}

impl Drop for Exporter {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            tracing::debug!(local_addr = %self.local_addr, "Aborting exposition endpoint task");
            task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::MetricRegistry;
    use std::sync::Arc;

    fn state() -> AppState {
        AppState::new(Arc::new(MetricRegistry::new()))
    }

    #[tokio::test]
    async fn test_start_resolves_ephemeral_port() {
        let exporter = Exporter::start("127.0.0.1:0", state())
            .await
            .expect("bind ephemeral port");
        assert_ne!(exporter.local_addr().port(), 0);
        exporter.shutdown().await.expect("clean shutdown");
    }

    #[tokio::test]
    async fn test_port_in_use_is_a_bind_error() {
        let first = Exporter::start("127.0.0.1:0", state())
            .await
            .expect("bind ephemeral port");
        let taken = first.local_addr().to_string();

        let result = Exporter::start(&taken, state()).await;
        assert!(matches!(result, Err(AppError::Bind { .. })));

        first.shutdown().await.expect("clean shutdown");
    }

    #[tokio::test]
    async fn test_shutdown_releases_port() {
        let exporter = Exporter::start("127.0.0.1:0", state())
            .await
            .expect("bind ephemeral port");
        let addr = exporter.local_addr();
        exporter.shutdown().await.expect("clean shutdown");

        assert!(tokio::net::TcpStream::connect(addr).await.is_err());
    }
}
