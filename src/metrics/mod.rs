//! Prometheus metrics exporter for scanner monitoring.
//!
//! # Metrics Exposed
//!
//! ## Session
//! - `optical_hybrid_running` - Session running (1) or idle (0)
//! - `optical_hybrid_key_available` - Master key assembled (1) or missing (0)
//! - `optical_hybrid_session_results` - Secrets held by the current session
//!
//! ## Channels
//! - `optical_hybrid_frames_total` - Frames processed
//! - `optical_hybrid_matrix_readings_total` - New matrix code values
//! - `optical_hybrid_linear_readings_total` - New linear code values
//! - `optical_hybrid_stale_results_total` - Late linear results discarded
//!
//! ## Decryption
//! - `optical_hybrid_pairs_submitted_total` - Distinct pairs submitted
//! - `optical_hybrid_rejected_malformed_total` - Malformed payloads
//! - `optical_hybrid_rejected_plaintext_total` - Plaintext validation failures
//! - `optical_hybrid_rejected_no_key_total` - Attempts without a master key
//! - `optical_hybrid_secrets_found_total` - Secrets recovered
//!
//! # Example
//!
//! ```no_run
//! use optical_hybrid_scan::metrics::{MetricsRegistry, MetricsSnapshot};
//!
//! let registry = MetricsRegistry::new().expect("Failed to create registry");
//!
//! let snapshot = MetricsSnapshot {
//!     running: true,
//!     key_available: true,
//!     frames: 300,
//!     pairs_submitted: 4,
//!     secrets_found: 3,
//!     ..Default::default()
//! };
//!
//! registry.update(&snapshot);
//! ```

mod collector;
#[cfg(feature = "metrics")]
mod server;

pub use collector::{MetricsError, MetricsRegistry, MetricsSnapshot};
#[cfg(feature = "metrics")]
pub use server::{MetricsServer, MetricsServerConfig, ServerError};
