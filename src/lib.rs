//! Optical Hybrid Scanner Library
//!
//! Recovers secrets that were split across two optical codes shown to a
//! camera at the same time: a 2-D matrix code carrying the salt and the
//! first half of an AES ciphertext, and a 1-D linear barcode carrying the
//! second half. Neither code alone decrypts.
//!
//! # Architecture
//!
//! ```text
//! capture → decode (matrix: sync, linear: async) → fusion → cipher → session → events
//!                                                             ↑
//!                                                           keys
//! ```
//!
//! # Design Principles
//!
//! - **Fail-closed**: without a fully assembled master key nothing is ever decrypted
//! - **Exactly once per pair**: a literal pair is submitted at most once in succession
//! - **Silent on failure**: misreads and bad decrypts produce diagnostics, never notifications
//! - **Single-threaded ticks**: all state is owned by one [`SessionContext`]
//!
//! # Example
//!
//! ```no_run
//! use optical_hybrid_scan::{
//!     capture::{Camera, CaptureConfig, MockCamera},
//!     decode::{DeferredLinear, ScriptedMatrix},
//!     keys::{FragmentSource, KeyMaterial},
//!     session::{ScanMode, SessionContext},
//! };
//! use std::sync::mpsc;
//!
//! let key = KeyMaterial::from_sources(&[
//!     FragmentSource::Env("HYBRID_SCAN_FRAGMENT_1".into()),
//!     FragmentSource::Env("HYBRID_SCAN_FRAGMENT_2".into()),
//!     FragmentSource::Env("HYBRID_SCAN_FRAGMENT_3".into()),
//!     FragmentSource::Env("HYBRID_SCAN_FRAGMENT_4".into()),
//! ]);
//!
//! let (events, notifications) = mpsc::channel();
//! let mut ctx = SessionContext::new(
//!     key,
//!     ScriptedMatrix::default(),
//!     DeferredLinear::new([], 2),
//!     events,
//! );
//!
//! let mut camera = MockCamera::new();
//! camera.open(&CaptureConfig::default()).unwrap();
//!
//! ctx.start_session(ScanMode::Batch, 3);
//! while ctx.is_running() {
//!     let frame = camera.capture().unwrap();
//!     ctx.tick(&frame);
//!     for event in notifications.try_iter() {
//!         println!("{:?}", event);
//!     }
//! }
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod capture;
pub mod cipher;
pub mod config;
pub mod decode;
pub mod events;
pub mod fusion;
pub mod keys;
pub mod metrics;
pub mod session;

// Re-export commonly used types at crate root
pub use capture::{Camera, CaptureConfig, Frame, MockCamera};
pub use cipher::{decrypt, seal, DecryptError, Salt, SealedPayload};
pub use config::{ConfigError, ScanConfig};
pub use events::{EventSink, ScanEvent};
pub use fusion::{FusedPair, PairFusion};
pub use keys::{AssemblyError, KeyMaterial, MasterKey};
pub use session::{ScanMode, ScanSession, SessionContext, TickOutcome};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
