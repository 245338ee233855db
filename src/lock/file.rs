//! Named locks backed by lock files.

use crate::lock::{LockGuard, LockHandle, NamedLock};
use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

/// [`NamedLock`] that holds an exclusive OS lock on `<dir>/<name>.lock`.
///
/// Uses `flock` on Unix and `LockFileEx` on Windows through `fs2`. The lock
/// file itself is left in place after release; only the OS lock matters.
#[derive(Debug, Clone)]
pub struct FileLock {
    dir: PathBuf,
}

impl FileLock {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the lock file used for `name`.
    pub fn lock_path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{}.lock", name))
    }
}

impl NamedLock for FileLock {
    fn try_acquire(&self, name: &str) -> io::Result<LockHandle> {
        fs::create_dir_all(&self.dir)?;
        let path = self.lock_path(name);
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)?;

        fs2::FileExt::try_lock_exclusive(&file)?;
        Ok(LockHandle::new(name, FileGuard { file }))
    }
}

struct FileGuard {
    file: File,
}

impl LockGuard for FileGuard {
    fn unlock(&mut self) -> io::Result<()> {
        fs2::FileExt::unlock(&self.file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_lock_file_created_in_dir() {
        let dir = tempdir().unwrap();
        let lock = FileLock::new(dir.path());

        let handle = lock.try_acquire("Ltest").unwrap();
        assert!(handle.is_held());
        assert!(dir.path().join("Ltest.lock").exists());
    }

    #[test]
    fn test_second_attempt_fails_while_held() {
        let dir = tempdir().unwrap();
        let lock = FileLock::new(dir.path());

        let mut first = lock.try_acquire("Lheld").unwrap();
        assert!(lock.try_acquire("Lheld").is_err());

        first.release();
        let second = lock.try_acquire("Lheld").unwrap();
        assert!(second.is_held());
    }

    #[test]
    fn test_different_names_do_not_conflict() {
        let dir = tempdir().unwrap();
        let lock = FileLock::new(dir.path());

        let _a = lock.try_acquire("Lone").unwrap();
        let _b = lock.try_acquire("Ltwo").unwrap();
    }

    #[test]
    fn test_missing_dir_is_created() {
        let dir = tempdir().unwrap();
        let nested = dir.path().join("locks").join("jar");
        let lock = FileLock::new(&nested);

        let _handle = lock.try_acquire("Lnested").unwrap();
        assert!(nested.join("Lnested.lock").exists());
    }
}
