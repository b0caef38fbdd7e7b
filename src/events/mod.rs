//! Outbound notifications.
//!
//! Two separate boundaries: [`EventSink`] carries the user-visible
//! `secretFound`/`scanningStopped` notifications, [`DiagnosticSink`] carries
//! typed internal failures for logs and tests.

mod sink;

pub use sink::{
    Diagnostic, DiagnosticSink, EventSink, NullSink, ScanEvent, TracingDiagnostics,
};
