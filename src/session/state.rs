//! Session lifecycle and result accumulation.

use crate::events::{EventSink, ScanEvent};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// How recovered secrets accumulate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanMode {
    /// Keep only the latest secret; scan until stopped.
    #[default]
    Single,
    /// Append every secret; stop once the target count is reached.
    Batch,
}

/// Session state errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// A secret was offered while idle.
    #[error("session is not running")]
    NotRunning,
}

/// What [`ScanSession::record_secret`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordOutcome {
    /// Number of results held after recording.
    pub results: usize,
    /// The batch target was reached and the session stopped itself.
    pub auto_stopped: bool,
}

/// Mode, target and results of one scanning session.
///
/// `Idle -> Running -> Idle`. Results stay readable after a stop and are
/// cleared by the next start.
pub struct ScanSession {
    mode: ScanMode,
    target: u32,
    results: Vec<String>,
    running: bool,
    events: Box<dyn EventSink>,
}

impl ScanSession {
    /// Creates an idle single-mode session reporting to `events`.
    pub fn new(events: impl EventSink + 'static) -> Self {
        Self {
            mode: ScanMode::default(),
            target: 0,
            results: Vec::new(),
            running: false,
            events: Box::new(events),
        }
    }

    /// Starts a session. No-op while already running.
    ///
    /// A `target` of zero in batch mode never auto-stops. Returns true if
    /// the session transitioned to running.
    pub fn start(&mut self, mode: ScanMode, target: u32) -> bool {
        if self.running {
            tracing::debug!("Start ignored; session already running");
            return false;
        }

        self.mode = mode;
        self.target = target;
        self.results.clear();
        self.running = true;

        tracing::info!(?mode, target, "Scanning started");
        true
    }

    /// Stops the session and emits `ScanningStopped`. No-op while idle.
    pub fn stop(&mut self) -> bool {
        if !self.running {
            return false;
        }

        self.running = false;
        tracing::info!(results = self.results.len(), "Scanning stopped");
        self.events.emit(ScanEvent::ScanningStopped);
        true
    }

    /// Records a recovered secret and notifies observers.
    ///
    /// Single mode overwrites, batch mode appends. A batch session with a
    /// positive target stops itself once it holds that many results.
    pub fn record_secret(&mut self, secret: String) -> Result<RecordOutcome, SessionError> {
        if !self.running {
            return Err(SessionError::NotRunning);
        }

        match self.mode {
            ScanMode::Single => {
                self.results.clear();
                self.results.push(secret.clone());
            }
            ScanMode::Batch => self.results.push(secret.clone()),
        }

        tracing::info!(results = self.results.len(), "Secret found");
        self.events.emit(ScanEvent::SecretFound {
            secret,
            batch_results: self.results.clone(),
            found_at: chrono::Utc::now(),
        });

        let auto_stopped = self.target_reached() && self.stop();

        Ok(RecordOutcome {
            results: self.results.len(),
            auto_stopped,
        })
    }

    fn target_reached(&self) -> bool {
        self.mode == ScanMode::Batch
            && self.target > 0
            && self.results.len() >= self.target as usize
    }

    /// Returns true while the session is running.
    #[inline]
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Returns the mode of the current (or last) session.
    #[inline]
    pub fn mode(&self) -> ScanMode {
        self.mode
    }

    /// Returns the batch target; 0 means unbounded.
    #[inline]
    pub fn target(&self) -> u32 {
        self.target
    }

    /// Secrets recorded in the current (or last) session.
    pub fn results(&self) -> &[String] {
        &self.results
    }
}

impl std::fmt::Debug for ScanSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScanSession")
            .field("mode", &self.mode)
            .field("target", &self.target)
            .field("results", &self.results.len())
            .field("running", &self.running)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    fn session() -> (ScanSession, mpsc::Receiver<ScanEvent>) {
        let (tx, rx) = mpsc::channel();
        (ScanSession::new(tx), rx)
    }

    #[test]
    fn test_starts_idle() {
        let (mut session, rx) = session();
        assert!(!session.is_running());
        assert_eq!(session.record_secret("abcd".into()), Err(SessionError::NotRunning));
        assert!(!session.stop());
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_single_mode_keeps_latest() {
        let (mut session, rx) = session();
        session.start(ScanMode::Single, 0);

        session.record_secret("first".into()).unwrap();
        session.record_secret("second".into()).unwrap();

        assert_eq!(session.results(), &["second".to_string()]);
        assert!(session.is_running());

        let events: Vec<_> = rx.try_iter().collect();
        assert_eq!(events.len(), 2);
        assert!(matches!(
            &events[1],
            ScanEvent::SecretFound { secret, batch_results, .. }
                if secret == "second" && batch_results == &["second".to_string()]
        ));
    }

    #[test]
    fn test_single_mode_ignores_target() {
        let (mut session, _rx) = session();
        session.start(ScanMode::Single, 1);

        let outcome = session.record_secret("only one".into()).unwrap();
        assert!(!outcome.auto_stopped);
        assert!(session.is_running());
    }

    #[test]
    fn test_batch_auto_stops_at_target() {
        let (mut session, rx) = session();
        session.start(ScanMode::Batch, 3);

        assert!(!session.record_secret("one1".into()).unwrap().auto_stopped);
        assert!(!session.record_secret("two2".into()).unwrap().auto_stopped);
        let outcome = session.record_secret("three".into()).unwrap();

        assert!(outcome.auto_stopped);
        assert_eq!(outcome.results, 3);
        assert!(!session.is_running());
        assert_eq!(session.record_secret("four".into()), Err(SessionError::NotRunning));
        assert_eq!(session.results().len(), 3);

        let events: Vec<_> = rx.try_iter().collect();
        assert_eq!(events.len(), 4);
        assert_eq!(events[3], ScanEvent::ScanningStopped);
    }

    #[test]
    fn test_batch_zero_target_never_stops() {
        let (mut session, _rx) = session();
        session.start(ScanMode::Batch, 0);

        for i in 0..10 {
            session.record_secret(format!("secret-{}", i)).unwrap();
        }
        assert!(session.is_running());
        assert_eq!(session.results().len(), 10);
    }

    #[test]
    fn test_start_while_running_is_noop() {
        let (mut session, _rx) = session();
        assert!(session.start(ScanMode::Batch, 5));
        session.record_secret("kept".into()).unwrap();

        assert!(!session.start(ScanMode::Single, 0));
        assert_eq!(session.mode(), ScanMode::Batch);
        assert_eq!(session.results().len(), 1);
    }

    #[test]
    fn test_restart_clears_results() {
        let (mut session, rx) = session();
        session.start(ScanMode::Batch, 0);
        session.record_secret("old!".into()).unwrap();
        assert!(session.stop());
        assert_eq!(session.results().len(), 1);

        session.start(ScanMode::Batch, 0);
        assert!(session.results().is_empty());

        let stops = rx
            .try_iter()
            .filter(|e| *e == ScanEvent::ScanningStopped)
            .count();
        assert_eq!(stops, 1);
    }
}
