//! Scanning sessions.
//!
//! [`ScanSession`] holds mode, target and results; [`SessionContext`] owns
//! the session together with the key, decoders and fusion state and runs
//! the per-frame tick.

mod context;
mod state;

pub use context::{ScanStats, SessionContext, TickOutcome};
pub use state::{RecordOutcome, ScanMode, ScanSession, SessionError};
