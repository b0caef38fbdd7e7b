//! The owned scanning context.
//!
//! Holds everything the tick loop touches: the master key (or the reason
//! it is missing), both decoders, the pair fusion state and the session.
//! All of it is driven from a single thread, one tick per frame.

use super::state::{ScanMode, ScanSession};
use crate::capture::Frame;
use crate::cipher::{self, DecryptError};
use crate::decode::{LinearDecoder, LinearInbox, MatrixDecoder};
use crate::events::{Diagnostic, DiagnosticSink, EventSink, TracingDiagnostics};
use crate::fusion::{Channel, FusedPair, PairFusion};
use crate::keys::{AssemblyError, MasterKey};

/// Result of one tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    /// The session is not running; nothing was consumed.
    Idle,
    /// No new pair this tick.
    Waiting,
    /// A new pair was submitted and rejected.
    Rejected(DecryptError),
    /// A new pair decrypted to this secret.
    Recovered(String),
}

/// Running counters for the current process.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanStats {
    /// Frames ticked while running.
    pub frames: u64,
    /// New values stored from the matrix channel.
    pub matrix_readings: u64,
    /// New values stored from the linear channel.
    pub linear_readings: u64,
    /// Pairs handed to the cipher.
    pub pairs_submitted: u64,
    /// Pairs rejected as malformed.
    pub malformed_payloads: u64,
    /// Pairs whose plaintext failed validation.
    pub invalid_plaintexts: u64,
    /// Pairs rejected because no master key was assembled.
    pub key_unavailable: u64,
    /// Secrets recovered.
    pub secrets_found: u64,
    /// Linear results dropped as belonging to an earlier session.
    pub stale_results: u64,
}

/// Owns the scanner state and wires the collaborators together.
pub struct SessionContext {
    key: Result<MasterKey, AssemblyError>,
    matrix: Box<dyn MatrixDecoder>,
    linear: Box<dyn LinearDecoder>,
    inbox: LinearInbox,
    fusion: PairFusion,
    session: ScanSession,
    diagnostics: Box<dyn DiagnosticSink>,
    stats: ScanStats,
}

impl SessionContext {
    /// Builds an idle context.
    ///
    /// `key` is the outcome of [`KeyMaterial::assemble`](crate::keys::KeyMaterial::assemble);
    /// an error disables decryption for the lifetime of the context.
    pub fn new(
        key: Result<MasterKey, AssemblyError>,
        matrix: impl MatrixDecoder + 'static,
        linear: impl LinearDecoder + 'static,
        events: impl EventSink + 'static,
    ) -> Self {
        if let Err(ref e) = key {
            tracing::warn!(error = %e, "No master key; decryption disabled");
        }

        Self {
            key,
            matrix: Box::new(matrix),
            linear: Box::new(linear),
            inbox: LinearInbox::new(),
            fusion: PairFusion::new(),
            session: ScanSession::new(events),
            diagnostics: Box::new(TracingDiagnostics),
            stats: ScanStats::default(),
        }
    }

    /// Replaces the default tracing diagnostics.
    pub fn with_diagnostics(mut self, diagnostics: impl DiagnosticSink + 'static) -> Self {
        self.diagnostics = Box::new(diagnostics);
        self
    }

    /// Starts scanning. No-op while running.
    pub fn start_session(&mut self, mode: ScanMode, target: u32) -> bool {
        if !self.session.start(mode, target) {
            return false;
        }
        self.fusion.clear();
        true
    }

    /// Stops scanning and releases the linear reader. No-op while idle.
    pub fn stop_session(&mut self) -> bool {
        if !self.session.stop() {
            return false;
        }
        self.release_decoders();
        true
    }

    /// Processes one captured frame.
    ///
    /// Order: drain at most one linear result requested on an earlier
    /// tick, decode the matrix code synchronously, request a linear decode
    /// of the lower half, then fuse.
    pub fn tick(&mut self, frame: &Frame) -> TickOutcome {
        if !self.session.is_running() {
            return TickOutcome::Idle;
        }
        self.stats.frames += 1;

        let linear = self.take_linear_result();
        let matrix = self.matrix.decode(&frame.to_grayscale());
        self.linear.request(frame.lower_half(), self.inbox.reply());

        self.feed(matrix.as_deref(), linear.as_deref())
    }

    /// Fuses already decoded readings and attempts decryption of any new
    /// pair.
    ///
    /// Lets callers with their own decode pipeline skip [`tick`](Self::tick).
    pub fn feed(&mut self, matrix: Option<&str>, linear: Option<&str>) -> TickOutcome {
        if !self.session.is_running() {
            return TickOutcome::Idle;
        }

        let pair = self.fusion.tick(matrix, linear);
        self.note_stored(Channel::Matrix);
        self.note_stored(Channel::Linear);

        let Some(pair) = pair else {
            return TickOutcome::Waiting;
        };

        if self.session.mode() == ScanMode::Single {
            self.fusion.clear();
        }

        self.submit(pair)
    }

    fn submit(&mut self, pair: FusedPair) -> TickOutcome {
        let fingerprint = pair.fingerprint();
        self.stats.pairs_submitted += 1;
        self.diagnostics.record(Diagnostic::PairSubmitted {
            fingerprint: fingerprint.clone(),
        });

        let result = match &self.key {
            Ok(key) => cipher::decrypt(&pair.matrix, &pair.linear, key),
            Err(_) => Err(DecryptError::KeyUnavailable),
        };

        match result {
            Ok(secret) => self.accept(secret),
            Err(error) => {
                match error {
                    DecryptError::KeyUnavailable => self.stats.key_unavailable += 1,
                    DecryptError::MalformedPayload(_) => self.stats.malformed_payloads += 1,
                    DecryptError::InvalidPlaintext(_) => self.stats.invalid_plaintexts += 1,
                }
                self.diagnostics.record(Diagnostic::PairRejected {
                    fingerprint,
                    error: error.clone(),
                });
                TickOutcome::Rejected(error)
            }
        }
    }

    fn accept(&mut self, secret: String) -> TickOutcome {
        match self.session.record_secret(secret.clone()) {
            Ok(outcome) => {
                self.stats.secrets_found += 1;
                if outcome.auto_stopped {
                    self.release_decoders();
                }
                TickOutcome::Recovered(secret)
            }
            Err(_) => {
                self.diagnostics.record(Diagnostic::SecretDiscarded);
                TickOutcome::Idle
            }
        }
    }

    /// Pops delivered linear results until one from the current epoch
    /// turns up. Results from earlier sessions are dropped.
    fn take_linear_result(&mut self) -> Option<String> {
        while let Some(result) = self.inbox.next() {
            if result.epoch == self.inbox.epoch() {
                return result.value;
            }
            self.stats.stale_results += 1;
            self.diagnostics.record(Diagnostic::StaleLinearResult {
                epoch: result.epoch,
                current: self.inbox.epoch(),
            });
        }
        None
    }

    fn note_stored(&mut self, channel: Channel) {
        let Some(reading) = self.fusion.pending(channel) else {
            return;
        };
        if reading.observed_at != self.fusion.ticks() {
            return;
        }

        let observed_at = reading.observed_at;
        match channel {
            Channel::Matrix => self.stats.matrix_readings += 1,
            Channel::Linear => self.stats.linear_readings += 1,
        }
        self.diagnostics.record(Diagnostic::ReadingStored {
            channel,
            observed_at,
        });
    }

    fn release_decoders(&mut self) {
        self.linear.reset();
        self.inbox.advance_epoch();
    }

    /// Returns true while a session is running.
    #[inline]
    pub fn is_running(&self) -> bool {
        self.session.is_running()
    }

    /// True when a master key is available.
    #[inline]
    pub fn has_key(&self) -> bool {
        self.key.is_ok()
    }

    /// Returns the session state.
    pub fn session(&self) -> &ScanSession {
        &self.session
    }

    /// Returns the secrets of the current (or last) session.
    pub fn results(&self) -> &[String] {
        self.session.results()
    }

    /// Returns the pair fusion state.
    pub fn fusion(&self) -> &PairFusion {
        &self.fusion
    }

    /// Returns the running counters.
    pub fn stats(&self) -> &ScanStats {
        &self.stats
    }
}

impl std::fmt::Debug for SessionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionContext")
            .field("has_key", &self.key.is_ok())
            .field("session", &self.session)
            .field("epoch", &self.inbox.epoch())
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cipher::{seal, Salt};
    use crate::decode::{ForwardingLinear, LinearRequest, ScriptedMatrix};
    use crate::events::{NullSink, ScanEvent};
    use std::sync::mpsc;

    fn master() -> MasterKey {
        MasterKey::from_bytes(b"AX25HBKF".to_vec())
    }

    fn pair_for(secret: &str, salt_byte: u8) -> (String, String) {
        let sealed = seal(&master(), Salt::from_bytes([salt_byte; 16]), secret).unwrap();
        let pair = sealed.split_even().unwrap();
        (pair.matrix, pair.linear)
    }

    fn context() -> (SessionContext, mpsc::Receiver<ScanEvent>) {
        let (tx, rx) = mpsc::channel();
        let (worker, _) = mpsc::channel();
        let ctx = SessionContext::new(
            Ok(master()),
            ScriptedMatrix::default(),
            ForwardingLinear::new(worker),
            tx,
        );
        (ctx, rx)
    }

    #[test]
    fn test_idle_context_consumes_nothing() {
        let (mut ctx, rx) = context();
        let (m, l) = pair_for("never seen", 1);

        assert_eq!(ctx.feed(Some(m.as_str()), Some(l.as_str())), TickOutcome::Idle);
        assert!(ctx.fusion().pending(Channel::Matrix).is_none());
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_single_mode_recovers_and_clears() {
        let (mut ctx, rx) = context();
        let (m, l) = pair_for("first secret", 1);
        ctx.start_session(ScanMode::Single, 0);

        assert_eq!(ctx.feed(Some(m.as_str()), None), TickOutcome::Waiting);
        assert_eq!(
            ctx.feed(None, Some(l.as_str())),
            TickOutcome::Recovered("first secret".into())
        );
        assert!(ctx.fusion().pending(Channel::Matrix).is_none());
        assert!(ctx.fusion().last_processed().is_none());

        // The same codes still in view are captured again.
        assert_eq!(
            ctx.feed(Some(m.as_str()), Some(l.as_str())),
            TickOutcome::Recovered("first secret".into())
        );
        assert_eq!(ctx.results(), &["first secret".to_string()]);
        assert_eq!(rx.try_iter().count(), 2);
    }

    #[test]
    fn test_batch_mode_keeps_pending_pair() {
        let (mut ctx, _rx) = context();
        let (m, l) = pair_for("batch secret", 2);
        ctx.start_session(ScanMode::Batch, 0);

        assert!(matches!(ctx.feed(Some(m.as_str()), Some(l.as_str())), TickOutcome::Recovered(_)));
        assert_eq!(ctx.feed(Some(m.as_str()), Some(l.as_str())), TickOutcome::Waiting);
        assert!(ctx.fusion().pending(Channel::Linear).is_some());
        assert_eq!(ctx.stats().pairs_submitted, 1);
    }

    #[test]
    fn test_malformed_pair_is_silent() {
        let (mut ctx, rx) = context();
        let (diag_tx, diag_rx) = mpsc::channel();
        ctx = ctx.with_diagnostics(diag_tx);
        ctx.start_session(ScanMode::Single, 0);

        let outcome = ctx.feed(Some("no separator here"), Some("AAAA"));

        assert!(matches!(
            outcome,
            TickOutcome::Rejected(DecryptError::MalformedPayload(_))
        ));
        assert!(rx.try_recv().is_err());
        assert_eq!(ctx.stats().malformed_payloads, 1);
        assert!(diag_rx
            .try_iter()
            .any(|d| matches!(d, Diagnostic::PairRejected { .. })));
        assert!(ctx.fusion().last_processed().is_none());

        // The same rejected reading is submitted again rather than suppressed.
        let outcome = ctx.feed(Some("no separator here"), Some("AAAA"));
        assert!(matches!(
            outcome,
            TickOutcome::Rejected(DecryptError::MalformedPayload(_))
        ));
        assert_eq!(ctx.stats().pairs_submitted, 2);
        assert_eq!(ctx.stats().malformed_payloads, 2);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_missing_key_fails_closed() {
        let (tx, rx) = mpsc::channel();
        let (worker, _) = mpsc::channel();
        let mut ctx = SessionContext::new(
            Err(AssemblyError::Empty),
            ScriptedMatrix::default(),
            ForwardingLinear::new(worker),
            tx,
        );
        let (m, l) = pair_for("unreachable", 3);
        ctx.start_session(ScanMode::Single, 0);

        assert!(!ctx.has_key());
        assert_eq!(
            ctx.feed(Some(m.as_str()), Some(l.as_str())),
            TickOutcome::Rejected(DecryptError::KeyUnavailable)
        );
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_tick_routes_frames_to_decoders() {
        let (events, _rx) = mpsc::channel();
        let (worker_tx, worker_rx) = mpsc::channel::<LinearRequest>();
        let (m, l) = pair_for("through the tick", 4);

        let mut ctx = SessionContext::new(
            Ok(master()),
            ScriptedMatrix::new([Some(m), None, None]),
            ForwardingLinear::new(worker_tx),
            events,
        );
        ctx.start_session(ScanMode::Single, 0);

        let frame = Frame::new(vec![10u8; 4 * 4 * 4], 4, 4, 1);
        assert_eq!(ctx.tick(&frame), TickOutcome::Waiting);

        let request = worker_rx.try_recv().unwrap();
        assert_eq!(request.subframe.height(), 2);
        request.reply.deliver(Some(l));

        // Answer lands on the following tick.
        assert_eq!(
            ctx.tick(&frame),
            TickOutcome::Recovered("through the tick".into())
        );
        assert_eq!(ctx.stats().frames, 2);
    }

    #[test]
    fn test_stop_discards_late_linear_results() {
        let (events, rx) = mpsc::channel();
        let (worker_tx, worker_rx) = mpsc::channel::<LinearRequest>();
        let (m, l) = pair_for("too late", 5);

        let mut ctx = SessionContext::new(
            Ok(master()),
            ScriptedMatrix::new([Some(m.clone()), None, Some(m)]),
            ForwardingLinear::new(worker_tx),
            events,
        );
        let frame = Frame::new(vec![0u8; 16], 2, 2, 1);

        ctx.start_session(ScanMode::Batch, 0);
        ctx.tick(&frame);
        let pending = worker_rx.try_recv().unwrap();

        assert!(ctx.stop_session());
        assert!(!ctx.stop_session());
        pending.reply.deliver(Some(l));

        assert_eq!(ctx.tick(&frame), TickOutcome::Idle);

        ctx.start_session(ScanMode::Batch, 0);
        assert_eq!(ctx.tick(&frame), TickOutcome::Waiting);
        assert_eq!(ctx.stats().stale_results, 1);
        assert!(ctx.results().is_empty());

        let events: Vec<_> = rx.try_iter().collect();
        assert_eq!(events, vec![ScanEvent::ScanningStopped]);
    }

    #[test]
    fn test_null_sink_context() {
        let (worker, _) = mpsc::channel();
        let mut ctx = SessionContext::new(
            Ok(master()),
            ScriptedMatrix::default(),
            ForwardingLinear::new(worker),
            NullSink,
        );
        ctx.start_session(ScanMode::Batch, 1);
        let (m, l) = pair_for("one and done", 6);

        assert!(matches!(ctx.feed(Some(m.as_str()), Some(l.as_str())), TickOutcome::Recovered(_)));
        assert!(!ctx.is_running());
    }
}
