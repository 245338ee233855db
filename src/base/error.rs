use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Errors surfaced by the persistence layer.
///
/// Conditions the layer recovers from on its own (legacy file contents,
/// a corrupt file during `save`) are never returned; they are reported to
/// the [`DiagnosticSink`](crate::base::DiagnosticSink) instead.
#[derive(Debug, Error)]
pub enum JarError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("lock {name} held for too long; gave up after {waited:?}")]
    LockTimeout {
        name: String,
        waited: Duration,
        #[source]
        source: io::Error,
    },

    #[error("cannot {op} cookie file {}", path.display())]
    Io {
        op: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("malformed cookie data: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Coarse classification of a [`JarError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidInput,
    LockTimeout,
    IoFailure,
    DecodeFailure,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::InvalidInput => "invalid_input",
            ErrorKind::LockTimeout => "lock_timeout",
            ErrorKind::IoFailure => "io_failure",
            ErrorKind::DecodeFailure => "decode_failure",
        }
    }
}

impl JarError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            JarError::InvalidInput(_) => ErrorKind::InvalidInput,
            JarError::LockTimeout { .. } => ErrorKind::LockTimeout,
            JarError::Io { .. } => ErrorKind::IoFailure,
            JarError::Decode(_) => ErrorKind::DecodeFailure,
        }
    }

    /// Create an I/O error for operation `op` on `path`.
    pub fn io(op: &'static str, path: impl AsRef<Path>, source: io::Error) -> Self {
        JarError::Io {
            op,
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// Create a lock timeout error wrapping the last failed attempt.
    pub fn lock_timeout(name: impl Into<String>, waited: Duration, source: io::Error) -> Self {
        JarError::LockTimeout {
            name: name.into(),
            waited,
            source,
        }
    }

    /// Returns true if the error came from the advisory lock deadline.
    pub fn is_lock_timeout(&self) -> bool {
        matches!(self, JarError::LockTimeout { .. })
    }
}
