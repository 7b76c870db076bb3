//! release::lock
//!
//! Exclusive run lock for release operations.
//!
//! # Architecture
//!
//! A release run has no concurrent writers inside the process (the walk
//! is strictly sequential), but two stagehand processes pointed at the
//! same build could interleave nonces and registry writes. The run lock
//! uses an OS-level exclusive file lock scoped to the build directory,
//! so concurrent runs against different builds stay independent.
//!
//! # Invariants
//!
//! - The lock is held for the entire run, including proposal persistence
//! - Acquisition is non-blocking; a held lock fails fast
//! - The lock is released on drop (RAII), even on panic

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use fs2::FileExt;
use thiserror::Error;

/// Lock file name inside the build directory.
const LOCK_FILE: &str = ".stagehand.lock";

/// Errors from run locking.
#[derive(Debug, Error)]
pub enum LockError {
    /// Another process already holds the lock.
    #[error("another stagehand release is already running against this build directory")]
    AlreadyLocked,

    /// Failed to create the lock file.
    #[error("failed to create run lock: {0}")]
    CreateFailed(String),

    /// Failed to acquire the OS lock.
    #[error("failed to acquire run lock: {0}")]
    AcquireFailed(String),

    /// Failed to release the lock.
    #[error("failed to release run lock: {0}")]
    ReleaseFailed(String),
}

/// An exclusive lock on a build directory for the duration of a run.
///
/// Released when dropped.
#[derive(Debug)]
pub struct RunLock {
    path: PathBuf,
    /// When this is Some, we hold the lock.
    file: Option<File>,
}

impl RunLock {
    /// Attempt to acquire the run lock for a build directory.
    ///
    /// Non-blocking: if another process holds the lock this returns
    /// [`LockError::AlreadyLocked`] immediately.
    pub fn acquire(build_dir: &Path) -> Result<Self, LockError> {
        let path = build_dir.join(LOCK_FILE);

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)
            .map_err(|e| {
                LockError::CreateFailed(format!("cannot open {}: {}", path.display(), e))
            })?;

        match file.try_lock_exclusive() {
            Ok(()) => Ok(Self {
                path,
                file: Some(file),
            }),
            Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => Err(LockError::AlreadyLocked),
            Err(e) => Err(LockError::AcquireFailed(e.to_string())),
        }
    }

    /// Whether this guard still holds the lock.
    pub fn is_held(&self) -> bool {
        self.file.is_some()
    }

    /// Path to the lock file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Release the lock before the guard goes out of scope.
    pub fn release(&mut self) -> Result<(), LockError> {
        if let Some(file) = self.file.take() {
            FileExt::unlock(&file).map_err(|e| LockError::ReleaseFailed(e.to_string()))?;
        }
        Ok(())
    }
}

impl Drop for RunLock {
    fn drop(&mut self) {
        // Best-effort release; the process is on its way out anyway.
        if let Some(file) = self.file.take() {
            let _ = FileExt::unlock(&file);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn acquire_succeeds() {
        let dir = TempDir::new().unwrap();
        let lock = RunLock::acquire(dir.path()).unwrap();
        assert!(lock.is_held());
        assert!(lock.path().exists());
        assert_eq!(lock.path(), dir.path().join(LOCK_FILE));
    }

    #[test]
    fn second_acquire_fails() {
        let dir = TempDir::new().unwrap();
        let _lock = RunLock::acquire(dir.path()).unwrap();

        let result = RunLock::acquire(dir.path());
        assert!(matches!(result, Err(LockError::AlreadyLocked)));
    }

    #[test]
    fn released_on_drop() {
        let dir = TempDir::new().unwrap();
        {
            let lock = RunLock::acquire(dir.path()).unwrap();
            assert!(lock.is_held());
        }

        let lock = RunLock::acquire(dir.path()).unwrap();
        assert!(lock.is_held());
    }

    #[test]
    fn explicit_release() {
        let dir = TempDir::new().unwrap();
        let mut lock = RunLock::acquire(dir.path()).unwrap();

        lock.release().unwrap();
        assert!(!lock.is_held());

        let again = RunLock::acquire(dir.path()).unwrap();
        assert!(again.is_held());
    }

    #[test]
    fn repeated_release_is_safe() {
        let dir = TempDir::new().unwrap();
        let mut lock = RunLock::acquire(dir.path()).unwrap();

        lock.release().unwrap();
        lock.release().unwrap();
        assert!(!lock.is_held());
    }

    #[test]
    fn missing_build_dir_is_create_failed() {
        let result = RunLock::acquire(Path::new("/nonexistent/build"));
        assert!(matches!(result, Err(LockError::CreateFailed(_))));
    }

    #[test]
    fn independent_directories_do_not_contend() {
        let a = TempDir::new().unwrap();
        let b = TempDir::new().unwrap();

        let lock_a = RunLock::acquire(a.path()).unwrap();
        let lock_b = RunLock::acquire(b.path()).unwrap();
        assert!(lock_a.is_held());
        assert!(lock_b.is_held());
    }
}
