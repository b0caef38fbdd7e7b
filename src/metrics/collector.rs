//! Metrics collection and registry.

use crate::session::SessionContext;
use prometheus::{Encoder, IntCounter, IntGauge, Registry, TextEncoder};
use thiserror::Error;

/// Errors that can occur during metrics operations.
#[derive(Debug, Error)]
pub enum MetricsError {
    /// Registration or encoding failed.
    #[error("prometheus error: {0}")]
    Prometheus(#[from] prometheus::Error),
}

/// A snapshot of scanner state for metrics update.
#[derive(Debug, Clone, Default)]
pub struct MetricsSnapshot {
    /// Whether a session is currently running.
    pub running: bool,
    /// Whether a master key is available.
    pub key_available: bool,
    /// Secrets held by the current session.
    pub session_results: usize,
    /// Frames processed.
    pub frames: u64,
    /// Values stored from the matrix channel.
    pub matrix_readings: u64,
    /// Values stored from the linear channel.
    pub linear_readings: u64,
    /// Pairs submitted for decryption.
    pub pairs_submitted: u64,
    /// Pairs rejected as malformed.
    pub malformed_payloads: u64,
    /// Pairs rejected for invalid plaintext.
    pub invalid_plaintexts: u64,
    /// Pairs rejected because no key was assembled.
    pub key_unavailable: u64,
    /// Secrets recovered.
    pub secrets_found: u64,
    /// Linear results discarded as stale.
    pub stale_results: u64,
}

/// Prometheus metrics registry for scanner monitoring.
pub struct MetricsRegistry {
    registry: Registry,

    // Session state
    running: IntGauge,
    key_available: IntGauge,
    session_results: IntGauge,

    // Channel input
    frames_total: IntCounter,
    matrix_readings_total: IntCounter,
    linear_readings_total: IntCounter,
    stale_results_total: IntCounter,

    // Decryption
    pairs_submitted_total: IntCounter,
    malformed_total: IntCounter,
    invalid_plaintext_total: IntCounter,
    key_unavailable_total: IntCounter,
    secrets_found_total: IntCounter,
}

impl MetricsRegistry {
    /// Creates a new metrics registry with all scanner metrics registered.
    pub fn new() -> Result<Self, MetricsError> {
        let registry = Registry::new();

        let running = IntGauge::new(
            "optical_hybrid_running",
            "Whether a scanning session is running (1=running, 0=idle)",
        )?;
        let key_available = IntGauge::new(
            "optical_hybrid_key_available",
            "Whether the master key was assembled (1=yes, 0=no)",
        )?;
        let session_results = IntGauge::new(
            "optical_hybrid_session_results",
            "Secrets held by the current session",
        )?;

        let frames_total = IntCounter::new(
            "optical_hybrid_frames_total",
            "Frames processed by the tick loop",
        )?;
        let matrix_readings_total = IntCounter::new(
            "optical_hybrid_matrix_readings_total",
            "New values stored from the matrix code channel",
        )?;
        let linear_readings_total = IntCounter::new(
            "optical_hybrid_linear_readings_total",
            "New values stored from the linear code channel",
        )?;
        let stale_results_total = IntCounter::new(
            "optical_hybrid_stale_results_total",
            "Linear decode results discarded after a session stop",
        )?;

        let pairs_submitted_total = IntCounter::new(
            "optical_hybrid_pairs_submitted_total",
            "Distinct pairs submitted for decryption",
        )?;
        let malformed_total = IntCounter::new(
            "optical_hybrid_rejected_malformed_total",
            "Pairs rejected as malformed payloads",
        )?;
        let invalid_plaintext_total = IntCounter::new(
            "optical_hybrid_rejected_plaintext_total",
            "Pairs whose plaintext failed validation",
        )?;
        let key_unavailable_total = IntCounter::new(
            "optical_hybrid_rejected_no_key_total",
            "Pairs rejected because no master key was available",
        )?;
        let secrets_found_total = IntCounter::new(
            "optical_hybrid_secrets_found_total",
            "Secrets recovered",
        )?;

        registry.register(Box::new(running.clone()))?;
        registry.register(Box::new(key_available.clone()))?;
        registry.register(Box::new(session_results.clone()))?;
        registry.register(Box::new(frames_total.clone()))?;
        registry.register(Box::new(matrix_readings_total.clone()))?;
        registry.register(Box::new(linear_readings_total.clone()))?;
        registry.register(Box::new(stale_results_total.clone()))?;
        registry.register(Box::new(pairs_submitted_total.clone()))?;
        registry.register(Box::new(malformed_total.clone()))?;
        registry.register(Box::new(invalid_plaintext_total.clone()))?;
        registry.register(Box::new(key_unavailable_total.clone()))?;
        registry.register(Box::new(secrets_found_total.clone()))?;

        Ok(Self {
            registry,
            running,
            key_available,
            session_results,
            frames_total,
            matrix_readings_total,
            linear_readings_total,
            stale_results_total,
            pairs_submitted_total,
            malformed_total,
            invalid_plaintext_total,
            key_unavailable_total,
            secrets_found_total,
        })
    }

    /// Updates all metrics from a snapshot of scanner state.
    pub fn update(&self, snapshot: &MetricsSnapshot) {
        self.running.set(i64::from(snapshot.running));
        self.key_available.set(i64::from(snapshot.key_available));
        self.session_results.set(snapshot.session_results as i64);

        advance(&self.frames_total, snapshot.frames);
        advance(&self.matrix_readings_total, snapshot.matrix_readings);
        advance(&self.linear_readings_total, snapshot.linear_readings);
        advance(&self.stale_results_total, snapshot.stale_results);
        advance(&self.pairs_submitted_total, snapshot.pairs_submitted);
        advance(&self.malformed_total, snapshot.malformed_payloads);
        advance(&self.invalid_plaintext_total, snapshot.invalid_plaintexts);
        advance(&self.key_unavailable_total, snapshot.key_unavailable);
        advance(&self.secrets_found_total, snapshot.secrets_found);
    }

    /// Key availability as of the last update.
    pub fn key_available(&self) -> bool {
        self.key_available.get() != 0
    }

    /// Returns the underlying Prometheus registry.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Encodes all metrics in Prometheus text format.
    pub fn encode(&self) -> Result<String, MetricsError> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }
}

/// Counters only move forward; bump by the difference.
fn advance(counter: &IntCounter, total: u64) {
    let current = counter.get();
    if total > current {
        counter.inc_by(total - current);
    }
}

impl MetricsSnapshot {
    /// Creates a snapshot from the current state of a session context.
    pub fn from_context(ctx: &SessionContext) -> Self {
        let stats = ctx.stats();

        Self {
            running: ctx.is_running(),
            key_available: ctx.has_key(),
            session_results: ctx.results().len(),
            frames: stats.frames,
            matrix_readings: stats.matrix_readings,
            linear_readings: stats.linear_readings,
            pairs_submitted: stats.pairs_submitted,
            malformed_payloads: stats.malformed_payloads,
            invalid_plaintexts: stats.invalid_plaintexts,
            key_unavailable: stats.key_unavailable,
            secrets_found: stats.secrets_found,
            stale_results: stats.stale_results,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_creation() {
        let registry = MetricsRegistry::new();
        assert!(registry.is_ok());
    }

    #[test]
    fn test_metrics_update() {
        let registry = MetricsRegistry::new().unwrap();

        let snapshot = MetricsSnapshot {
            running: true,
            key_available: true,
            session_results: 2,
            frames: 120,
            pairs_submitted: 3,
            malformed_payloads: 1,
            secrets_found: 2,
            ..Default::default()
        };

        registry.update(&snapshot);

        let output = registry.encode().unwrap();
        assert!(output.contains("optical_hybrid_running 1"));
        assert!(output.contains("optical_hybrid_frames_total 120"));
        assert!(output.contains("optical_hybrid_secrets_found_total 2"));
    }

    #[test]
    fn test_counters_never_decrease() {
        let registry = MetricsRegistry::new().unwrap();

        registry.update(&MetricsSnapshot {
            frames: 10,
            ..Default::default()
        });
        registry.update(&MetricsSnapshot {
            frames: 4,
            ..Default::default()
        });

        let output = registry.encode().unwrap();
        assert!(output.contains("optical_hybrid_frames_total 10"));
    }

    #[test]
    fn test_metrics_encode() {
        let registry = MetricsRegistry::new().unwrap();
        let output = registry.encode().unwrap();

        assert!(output.contains("optical_hybrid_key_available"));
        assert!(output.contains("optical_hybrid_pairs_submitted_total"));
    }
}
