//! Cross-process advisory locking.
//!
//! A cookie file is protected by a lock whose name is derived from the file
//! path ([`name::lock_name_from_path`]), so every process that names the same
//! file contends for the same lock without any coordinating service.
//!
//! | Piece | Responsibility |
//! |-------|----------------|
//! | [`NamedLock`] | one non-blocking attempt at a named lock |
//! | [`FileLock`](file::FileLock) | `NamedLock` backed by `flock`/`LockFileEx` on a lock file |
//! | [`acquire`] | bounded retry until a deadline |
//! | [`LockHandle`] | idempotent release, also on drop |
//!
//! The lock is advisory: it only excludes processes that go through it.

pub mod file;
pub mod name;

pub use file::FileLock;
pub use name::lock_name_from_path;

use crate::base::{Diagnostic, DiagnosticSink, JarError};
use std::io;
use std::thread;
use std::time::{Duration, Instant};

/// Default time to wait for a lock before giving up.
pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(2);

/// Default pause between attempts.
pub const DEFAULT_RETRY_INTERVAL: Duration = Duration::from_micros(100);

/// A provider of named, exclusive, advisory locks.
pub trait NamedLock: Send + Sync {
    /// Make a single attempt at taking the lock called `name`.
    ///
    /// Returns `Err` immediately when the lock is held elsewhere.
    fn try_acquire(&self, name: &str) -> io::Result<LockHandle>;
}

/// Backend-specific state that keeps a lock held.
pub trait LockGuard: Send {
    fn unlock(&mut self) -> io::Result<()>;
}

/// A held lock. Released by [`release`](LockHandle::release) or on drop.
pub struct LockHandle {
    name: String,
    guard: Option<Box<dyn LockGuard>>,
}

impl LockHandle {
    pub fn new(name: impl Into<String>, guard: impl LockGuard + 'static) -> Self {
        Self {
            name: name.into(),
            guard: Some(Box::new(guard)),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_held(&self) -> bool {
        self.guard.is_some()
    }

    /// Release the lock. Calling this more than once is a no-op.
    pub fn release(&mut self) {
        if let Some(mut guard) = self.guard.take() {
            match guard.unlock() {
                Ok(()) => tracing::trace!(lock = %self.name, "lock released"),
                Err(e) => tracing::warn!(lock = %self.name, error = %e, "failed to release lock"),
            }
        }
    }
}

impl Drop for LockHandle {
    fn drop(&mut self) {
        self.release();
    }
}

impl std::fmt::Debug for LockHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LockHandle")
            .field("name", &self.name)
            .field("held", &self.is_held())
            .finish()
    }
}

/// How long to keep trying for a lock, and how often.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub timeout: Duration,
    pub retry_interval: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_LOCK_TIMEOUT,
            retry_interval: DEFAULT_RETRY_INTERVAL,
        }
    }
}

impl RetryPolicy {
    pub fn new(timeout: Duration, retry_interval: Duration) -> Self {
        Self {
            timeout,
            retry_interval,
        }
    }
}

/// Take the lock called `name`, retrying until `policy.timeout` has passed.
///
/// Between attempts the caller sleeps for `policy.retry_interval`, cut short
/// so the final attempt happens at the deadline rather than after it. Once
/// more than `policy.timeout` has elapsed since the first attempt, the last
/// failure is returned wrapped in [`JarError::LockTimeout`] and also reported
/// to `sink`.
pub fn acquire(
    lock: &dyn NamedLock,
    name: &str,
    policy: &RetryPolicy,
    sink: &dyn DiagnosticSink,
) -> Result<LockHandle, JarError> {
    let start = Instant::now();
    let mut retry = policy.retry_interval;
    let mut attempts = 0u32;

    loop {
        attempts += 1;
        let err = match lock.try_acquire(name) {
            Ok(handle) => {
                tracing::debug!(lock = %name, attempts, "lock acquired");
                return Ok(handle);
            }
            Err(e) => e,
        };

        let total = start.elapsed();
        if total > policy.timeout {
            sink.report(Diagnostic::LockRetryExhausted {
                name: name.to_string(),
                waited: total,
                cause: err.to_string(),
            });
            return Err(JarError::lock_timeout(name, total, err));
        }

        // Always have one more try at the end of the interval.
        let remain = policy.timeout - total;
        if retry > remain {
            retry = remain;
        }
        thread::sleep(retry);
    }
}
