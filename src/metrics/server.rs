//! HTTP endpoint for Prometheus scraping.
//!
//! The scan loop is synchronous, so the server runs on its own thread with
//! a private tokio runtime. The registry is shared by `Arc`; prometheus
//! collectors are internally synchronized, so the tick loop updates them
//! without any lock of ours.

use crate::metrics::MetricsRegistry;
use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Router};
use std::net::SocketAddr;
use std::sync::Arc;
use std::thread::JoinHandle;
use thiserror::Error;

/// Errors that can occur during metrics server operations.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The listen address could not be bound.
    #[error("failed to bind to address: {0}")]
    Bind(#[from] std::io::Error),

    /// The server stopped with an error.
    #[error("server error: {0}")]
    Server(String),
}

/// Configuration for the metrics server.
#[derive(Debug, Clone)]
pub struct MetricsServerConfig {
    /// Address to bind the server to.
    pub bind_addr: SocketAddr,
}

impl Default for MetricsServerConfig {
    fn default() -> Self {
        Self::with_port(9187)
    }
}

impl MetricsServerConfig {
    /// Listens on all interfaces at `port`.
    pub fn with_port(port: u16) -> Self {
        Self {
            bind_addr: ([0, 0, 0, 0], port).into(),
        }
    }
}

/// Serves `/metrics` and `/health` from a shared registry.
pub struct MetricsServer {
    config: MetricsServerConfig,
    registry: Arc<MetricsRegistry>,
}

impl MetricsServer {
    /// Creates a server exporting `registry`.
    pub fn new(config: MetricsServerConfig, registry: Arc<MetricsRegistry>) -> Self {
        Self { config, registry }
    }

    fn router(registry: Arc<MetricsRegistry>) -> Router {
        Router::new()
            .route("/metrics", get(metrics_handler))
            .route("/health", get(health_handler))
            .with_state(registry)
    }

    /// Runs the HTTP server until it is shut down.
    pub async fn run(self) -> Result<(), ServerError> {
        let listener = tokio::net::TcpListener::bind(self.config.bind_addr).await?;

        tracing::info!(addr = %self.config.bind_addr, "Metrics endpoint listening");

        axum::serve(listener, Self::router(self.registry))
            .await
            .map_err(|e| ServerError::Server(e.to_string()))
    }

    /// Runs the server on a dedicated thread with its own runtime.
    pub fn spawn(self) -> JoinHandle<Result<(), ServerError>> {
        std::thread::spawn(move || {
            let runtime = tokio::runtime::Builder::new_multi_thread()
                .worker_threads(1)
                .enable_all()
                .build()?;
            runtime.block_on(self.run())
        })
    }
}

async fn metrics_handler(State(registry): State<Arc<MetricsRegistry>>) -> impl IntoResponse {
    match registry.encode() {
        Ok(output) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
            output,
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            [("content-type", "text/plain; charset=utf-8")],
            format!("Failed to encode metrics: {}", e),
        ),
    }
}

/// Unhealthy while no master key is assembled: the scanner runs but can
/// never recover anything.
async fn health_handler(State(registry): State<Arc<MetricsRegistry>>) -> impl IntoResponse {
    if registry.key_available() {
        (StatusCode::OK, "OK")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "master key unavailable")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = MetricsServerConfig::default();
        assert_eq!(config.bind_addr.port(), 9187);
    }

    #[test]
    fn test_config_with_port() {
        let config = MetricsServerConfig::with_port(9300);
        assert_eq!(config.bind_addr.port(), 9300);
    }

    #[tokio::test]
    async fn test_metrics_route_reports_counters() {
        let registry = Arc::new(MetricsRegistry::new().unwrap());
        registry.update(&crate::metrics::MetricsSnapshot {
            secrets_found: 1,
            ..Default::default()
        });

        let response = metrics_handler(State(registry)).await.into_response();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_health_tracks_key_availability() {
        let registry = Arc::new(MetricsRegistry::new().unwrap());

        let response = health_handler(State(Arc::clone(&registry))).await.into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

        registry.update(&crate::metrics::MetricsSnapshot {
            key_available: true,
            ..Default::default()
        });
        let response = health_handler(State(registry)).await.into_response();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
