//! Injectable diagnostics for conditions the persistence layer recovers from.
//!
//! `save` and `load` keep a simple success/failure contract. Anything that was
//! handled locally but is still worth knowing about (old-format data thrown
//! away, a corrupt file skipped during save, a lock that never came free) is
//! reported as a [`Diagnostic`] to the sink the caller supplied.

use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

/// A recovered condition worth reporting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    /// The stream held valid JSON that was not a cookie array.
    DiscardedLegacyData { reason: String },
    /// The existing file could not be merged during save and was ignored.
    MergeFailed { path: PathBuf, reason: String },
    /// Lock acquisition ran out of time; `cause` is the last failed attempt.
    LockRetryExhausted {
        name: String,
        waited: Duration,
        cause: String,
    },
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Diagnostic::DiscardedLegacyData { reason } => {
                write!(f, "discarding cookies in invalid format: {}", reason)
            }
            Diagnostic::MergeFailed { path, reason } => write!(
                f,
                "cannot read cookie file {} to merge it; ignoring it: {}",
                path.display(),
                reason
            ),
            Diagnostic::LockRetryExhausted {
                name,
                waited,
                cause,
            } => write!(
                f,
                "lock {} still held after {:?}; last error: {}",
                name, waited, cause
            ),
        }
    }
}

/// Receiver for [`Diagnostic`]s.
pub trait DiagnosticSink: Send + Sync {
    fn report(&self, diagnostic: Diagnostic);
}

/// Forwards diagnostics to `tracing` at warn level.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn report(&self, diagnostic: Diagnostic) {
        match &diagnostic {
            Diagnostic::DiscardedLegacyData { .. } => {
                tracing::warn!(kind = "legacy_data", "{}", diagnostic);
            }
            Diagnostic::MergeFailed { path, .. } => {
                tracing::warn!(kind = "merge_failed", path = %path.display(), "{}", diagnostic);
            }
            Diagnostic::LockRetryExhausted { name, .. } => {
                tracing::warn!(kind = "lock_timeout", lock = %name, "{}", diagnostic);
            }
        }
    }
}

/// Keeps every diagnostic in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    events: Mutex<Vec<Diagnostic>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything reported so far.
    pub fn events(&self) -> Vec<Diagnostic> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn is_empty(&self) -> bool {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_empty()
    }
}

impl DiagnosticSink for MemorySink {
    fn report(&self, diagnostic: Diagnostic) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(diagnostic);
    }
}
