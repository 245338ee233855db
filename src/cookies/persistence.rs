//! Cookie persistence - save and load a cookie jar shared between processes.
//!
//! Every operation runs under an advisory lock named after the cookie file,
//! so processes sharing the file take turns:
//!
//! ```text
//! save(now): lock -> open/create -> merge file into store -> delete expired
//!            -> truncate -> write sorted persistent cookies -> unlock
//! load():    lock -> open (missing file is fine) -> merge file into store -> unlock
//! ```
//!
//! Because `save` merges what is on disk before overwriting it, cookies
//! written by another process since this one last loaded are kept.

use crate::base::{Diagnostic, DiagnosticSink, JarError, TracingSink};
use crate::cookies::codec;
use crate::cookies::monster::CookieMonster;
use crate::cookies::options::JarOptions;
use crate::cookies::ordering;
use crate::cookies::store::CookieStore;
use crate::lock::{self, FileLock, LockHandle, NamedLock};
use std::fs::{File, OpenOptions};
use std::io::{self, BufReader, BufWriter, Read, Seek, SeekFrom};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use time::OffsetDateTime;

/// What to do when the cookie file cannot be decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeMode {
    /// Report the failure and carry on with what is in memory.
    BestEffort,
    /// Return the failure to the caller.
    Strict,
}

/// A cookie store bound to a file on disk.
///
/// The store sits behind a mutex that `save` and `load` hold for their whole
/// critical section; use [`store`](PersistentJar::store) to read or change it
/// under the same lock.
///
/// # Example
/// ```no_run
/// use persistjar::cookies::options::JarOptions;
/// use persistjar::cookies::persistence::PersistentJar;
/// use time::OffsetDateTime;
/// use url::Url;
///
/// let jar = PersistentJar::open(JarOptions::new().filename("/tmp/cookies.json"))?;
/// let url = Url::parse("https://example.com/").unwrap();
/// let now = OffsetDateTime::now_utc();
/// jar.store().parse_and_save_cookie(&url, "sid=abc; Max-Age=3600", now);
/// jar.save(now)?;
/// # Ok::<(), persistjar::base::JarError>(())
/// ```
pub struct PersistentJar<S = CookieMonster> {
    store: Mutex<S>,
    options: JarOptions,
    lock: Arc<dyn NamedLock>,
    sink: Arc<dyn DiagnosticSink>,
}

impl PersistentJar<CookieMonster> {
    /// Create an empty jar for `options.filename` and load the file into it.
    pub fn open(options: JarOptions) -> Result<Self, JarError> {
        let jar = Self::new(CookieMonster::new(), options);
        jar.load()?;
        Ok(jar)
    }
}

impl<S: CookieStore> PersistentJar<S> {
    /// Wrap `store`. Nothing is read until [`load`](Self::load) is called.
    ///
    /// Locks are files beside the cookie file, or in `options.lock_dir` when
    /// set; diagnostics go to `tracing`.
    pub fn new(store: S, options: JarOptions) -> Self {
        let lock = Arc::new(FileLock::new(options.resolved_lock_dir()));
        Self {
            store: Mutex::new(store),
            options,
            lock,
            sink: Arc::new(TracingSink),
        }
    }

    /// Send recovered conditions to `sink` instead of `tracing`.
    pub fn with_sink(mut self, sink: Arc<dyn DiagnosticSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Use `lock` instead of lock files.
    pub fn with_lock(mut self, lock: Arc<dyn NamedLock>) -> Self {
        self.lock = lock;
        self
    }

    pub fn options(&self) -> &JarOptions {
        &self.options
    }

    pub fn path(&self) -> &Path {
        &self.options.filename
    }

    /// Lock and return the in-memory store.
    pub fn store(&self) -> MutexGuard<'_, S> {
        self.store.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn into_inner(self) -> S {
        self.store.into_inner().unwrap_or_else(PoisonError::into_inner)
    }

    /// Merge the file into the store, drop cookies expired as of `now`, and
    /// write every persistent cookie back.
    ///
    /// A file that cannot be decoded is reported and overwritten. Errors come
    /// only from taking the lock, opening, truncating or writing the file.
    pub fn save(&self, now: OffsetDateTime) -> Result<(), JarError> {
        if !self.options.persist {
            return Ok(());
        }
        let path = self.path();
        let _lock = self.lock_file()?;

        let mut file = open_for_save(path).map_err(|e| JarError::io("open", path, e))?;

        let mut store = self.store();
        self.merge_from(&mut *store, &mut file, MergeMode::BestEffort)?;
        store.delete_expired(now);

        file.set_len(0)
            .map_err(|e| JarError::io("truncate", path, e))?;
        file.seek(SeekFrom::Start(0))
            .map_err(|e| JarError::io("seek", path, e))?;

        let cookies = ordering::persistent_snapshot(&*store);
        codec::encode(BufWriter::new(&mut file), &cookies)
            .map_err(|e| JarError::io("write", path, e))?;

        tracing::debug!(path = %path.display(), count = cookies.len(), "cookie file saved");
        Ok(())
    }

    /// Merge the file into the store.
    ///
    /// A missing file loads nothing and is not an error; a file that is not
    /// valid JSON is. Returns the number of cookies read from the file.
    pub fn load(&self) -> Result<usize, JarError> {
        if !self.options.persist {
            return Ok(0);
        }
        let path = self.path();
        let _lock = self.lock_file()?;

        let file = match File::open(path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no cookie file to load");
                return Ok(0);
            }
            Err(e) => return Err(JarError::io("open", path, e)),
        };

        let mut store = self.store();
        self.merge_from(&mut *store, file, MergeMode::Strict)
    }

    fn lock_file(&self) -> Result<LockHandle, JarError> {
        let name = lock::lock_name_from_path(&self.path().to_string_lossy())?;
        lock::acquire(
            self.lock.as_ref(),
            &name,
            &self.options.retry_policy(),
            self.sink.as_ref(),
        )
    }

    fn merge_from<R: Read>(
        &self,
        store: &mut S,
        reader: R,
        mode: MergeMode,
    ) -> Result<usize, JarError> {
        match codec::decode(BufReader::new(reader), self.sink.as_ref()) {
            Ok(cookies) => {
                let read = cookies.len();
                let taken = store.merge(cookies);
                tracing::debug!(path = %self.path().display(), read, taken, "merged cookie file");
                Ok(read)
            }
            Err(e) if mode == MergeMode::BestEffort => {
                self.sink.report(Diagnostic::MergeFailed {
                    path: self.path().to_path_buf(),
                    reason: e.to_string(),
                });
                Ok(0)
            }
            Err(e) => Err(e),
        }
    }
}

fn open_for_save(path: &Path) -> io::Result<File> {
    let mut options = OpenOptions::new();
    options.read(true).write(true).create(true).truncate(false);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    options.open(path)
}
