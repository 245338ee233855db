//! Configuration for a persistent cookie jar.

use crate::lock::{RetryPolicy, DEFAULT_LOCK_TIMEOUT, DEFAULT_RETRY_INTERVAL};
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable naming the default cookie file.
pub const COOKIE_FILE_ENV: &str = "PERSISTJAR_COOKIES";

const DEFAULT_FILE_NAME: &str = ".persistjar-cookies.json";

/// Persistent jar configuration.
#[derive(Debug, Clone)]
pub struct JarOptions {
    /// Cookie file to load from and save to
    pub filename: PathBuf,
    /// How long to wait for the file's lock
    pub lock_timeout: Duration,
    /// Pause between lock attempts
    pub retry_interval: Duration,
    /// Directory holding lock files; the cookie file's own directory when unset
    pub lock_dir: Option<PathBuf>,
    /// When false, `save` and `load` do nothing
    pub persist: bool,
}

impl Default for JarOptions {
    fn default() -> Self {
        Self {
            filename: default_cookie_file(),
            lock_timeout: DEFAULT_LOCK_TIMEOUT,
            retry_interval: DEFAULT_RETRY_INTERVAL,
            lock_dir: None,
            persist: true,
        }
    }
}

impl JarOptions {
    /// Create options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the cookie file.
    pub fn filename(mut self, path: impl Into<PathBuf>) -> Self {
        self.filename = path.into();
        self
    }

    /// Set the lock timeout.
    pub fn lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout = timeout;
        self
    }

    /// Set the pause between lock attempts.
    pub fn retry_interval(mut self, interval: Duration) -> Self {
        self.retry_interval = interval;
        self
    }

    /// Create lock files in `dir` instead of beside the cookie file.
    ///
    /// Every process sharing the cookie file must use the same directory.
    pub fn lock_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.lock_dir = Some(dir.into());
        self
    }

    /// Enable or disable reading and writing the file.
    pub fn persist(mut self, persist: bool) -> Self {
        self.persist = persist;
        self
    }

    /// Directory the cookie file's lock lives in.
    pub fn resolved_lock_dir(&self) -> PathBuf {
        match &self.lock_dir {
            Some(dir) => dir.clone(),
            None => match self.filename.parent() {
                Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
                _ => Path::new(".").to_path_buf(),
            },
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.lock_timeout, self.retry_interval)
    }
}

/// Cookie file used when none is configured.
///
/// `$PERSISTJAR_COOKIES` if set, otherwise `.persistjar-cookies.json` in the
/// home directory, otherwise in the current directory.
pub fn default_cookie_file() -> PathBuf {
    if let Some(path) = env::var_os(COOKIE_FILE_ENV).filter(|p| !p.is_empty()) {
        return PathBuf::from(path);
    }
    home_dir()
        .map(|home| home.join(DEFAULT_FILE_NAME))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_FILE_NAME))
}

fn home_dir() -> Option<PathBuf> {
    let var = if cfg!(windows) { "USERPROFILE" } else { "HOME" };
    env::var_os(var)
        .filter(|h| !h.is_empty())
        .map(PathBuf::from)
}
