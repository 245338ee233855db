//! Base types and error handling.
//!
//! Provides the foundational types shared by the lock and cookie layers:
//! - [`JarError`]: errors surfaced by `save`, `load` and lock acquisition
//! - [`DiagnosticSink`]: where recovered-but-noteworthy conditions are reported

pub mod diagnostics;
pub mod error;

pub use diagnostics::{Diagnostic, DiagnosticSink, MemorySink, TracingSink};
pub use error::{ErrorKind, JarError};
