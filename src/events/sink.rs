//! Notification and diagnostic sinks.

use crate::cipher::DecryptError;
use crate::fusion::Channel;
use chrono::{DateTime, Utc};
use std::sync::mpsc::Sender;

/// Notifications for external observers. Fire-and-forget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanEvent {
    /// A pair decrypted to a valid secret.
    SecretFound {
        /// The recovered plaintext.
        secret: String,
        /// Snapshot of the session results after recording `secret`.
        batch_results: Vec<String>,
        /// Wall-clock time of recovery.
        found_at: DateTime<Utc>,
    },
    /// The session went from running to idle.
    ScanningStopped,
}

/// Receives [`ScanEvent`]s.
pub trait EventSink {
    /// Delivers one event. Must not block the tick.
    fn emit(&mut self, event: ScanEvent);
}

impl EventSink for Sender<ScanEvent> {
    fn emit(&mut self, event: ScanEvent) {
        // A dropped receiver means nobody is listening any more.
        let _ = self.send(event);
    }
}

/// Discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&mut self, _event: ScanEvent) {}
}

/// Internal occurrences that never reach observers.
///
/// Failed decrypts and misreads are expected on every few frames, so they
/// are kept out of [`ScanEvent`] and only surface here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    /// A channel produced a new value and it was stored.
    ReadingStored {
        /// Channel the value came from.
        channel: Channel,
        /// Fusion tick of the store.
        observed_at: u64,
    },
    /// A new pair was handed to the cipher.
    PairSubmitted {
        /// BLAKE3 fingerprint of the pair key.
        fingerprint: String,
    },
    /// The cipher rejected a pair.
    PairRejected {
        /// BLAKE3 fingerprint of the pair key.
        fingerprint: String,
        /// Why the cipher rejected it.
        error: DecryptError,
    },
    /// A linear decode result from a previous session was dropped.
    StaleLinearResult {
        /// Epoch the result was requested in.
        epoch: u64,
        /// Epoch at the time it arrived.
        current: u64,
    },
    /// A secret arrived after the session stopped and was not recorded.
    SecretDiscarded,
}

/// Receives [`Diagnostic`]s.
pub trait DiagnosticSink {
    /// Records one diagnostic.
    fn record(&mut self, diagnostic: Diagnostic);
}

/// Writes diagnostics to the `tracing` subscriber.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingDiagnostics;

impl DiagnosticSink for TracingDiagnostics {
    fn record(&mut self, diagnostic: Diagnostic) {
        match diagnostic {
            Diagnostic::ReadingStored {
                channel,
                observed_at,
            } => tracing::trace!(?channel, observed_at, "Reading stored"),
            Diagnostic::PairSubmitted { fingerprint } => {
                tracing::debug!(pair = %fingerprint, "Pair submitted for decryption")
            }
            Diagnostic::PairRejected { fingerprint, error } => {
                tracing::debug!(pair = %fingerprint, %error, "Pair rejected")
            }
            Diagnostic::StaleLinearResult { epoch, current } => {
                tracing::debug!(epoch, current, "Discarded stale linear decode result")
            }
            Diagnostic::SecretDiscarded => {
                tracing::warn!("Secret recovered while idle; not recorded")
            }
        }
    }
}

impl DiagnosticSink for Sender<Diagnostic> {
    fn record(&mut self, diagnostic: Diagnostic) {
        let _ = self.send(diagnostic);
    }
}
