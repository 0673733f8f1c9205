//! Watcher locking to prevent two watchers on the same root
//!
//! A [`WatchLock`] is an explicit resource owned by whoever starts a polling
//! loop. It is released when dropped.
//!
//! The lock file itself stays on disk after release. Only stale cleanup
//! unlinks it, and only while holding the lock, so every acquirer checks
//! that the file it locked is still the one at the lock path.

use crate::utils;
use anyhow::{Context, Result, bail};
use fs4::fs_std::FileExt;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use xxhash_rust::xxh3::xxh3_64;

/// Lock files untouched for longer than this are considered abandoned.
const STALE_THRESHOLD: Duration = Duration::from_secs(300);

/// Open-and-lock rounds before giving up on a lock file that keeps moving.
const MAX_ATTEMPTS: usize = 3;

/// Holds an exclusive lock on one watched root
#[derive(Debug)]
pub struct WatchLock {
    /// Lock file handle
    lock_file: File,
    /// Path to the lock file
    lock_path: PathBuf,
    /// Resolved root the lock guards
    root: PathBuf,
}

impl WatchLock {
    /// Acquire the watch lock for `root`, failing immediately if another
    /// watcher holds it.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The lock directory cannot be created
    /// - Another watcher already holds the lock for this root
    pub fn acquire(lock_dir: &Path, root: &Path) -> Result<Self> {
        fs::create_dir_all(lock_dir).context("Failed to create locks directory")?;
        Self::cleanup_stale_locks(lock_dir);

        let root = utils::resolve_root(root);
        let lock_path = lock_dir.join(Self::lock_name(&root));

        for _ in 0..MAX_ATTEMPTS {
            let lock_file = OpenOptions::new()
                .create(true)
                .truncate(false)
                .write(true)
                .open(&lock_path)
                .with_context(|| format!("Failed to create lock file: {}", lock_path.display()))?;

            match lock_file.try_lock_exclusive() {
                Ok(true) => {}
                Ok(false) | Err(_) => {
                    bail!(
                        "Another watcher is already running for {}. \
                         Stop it first or remove the stale lock at: {}",
                        root.display(),
                        lock_path.display()
                    );
                }
            }

            // Stale cleanup may have unlinked the file between open and lock
            if !is_linked_at(&lock_file, &lock_path) {
                tracing::debug!(lock = %lock_path.display(), "Lock file replaced while locking, retrying");
                continue;
            }

            lock_file
                .set_len(0)
                .context("Failed to reset lock file")?;
            let mut file_ref = &lock_file;
            if let Err(e) = writeln!(
                file_ref,
                "pid={}\nroot={}\ntime={}",
                std::process::id(),
                root.display(),
                humantime::format_rfc3339(SystemTime::now())
            ) {
                tracing::debug!(error = %e, "Failed to write lock file details");
            }

            tracing::debug!(lock = %lock_path.display(), "Acquired watch lock");
            return Ok(Self {
                lock_file,
                lock_path,
                root,
            });
        }

        bail!(
            "Could not acquire a stable watch lock at {}",
            lock_path.display()
        )
    }

    /// Root guarded by this lock.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Location of the lock file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.lock_path
    }

    fn lock_name(root: &Path) -> String {
        format!(
            "watch-{:016x}.lock",
            xxh3_64(root.to_string_lossy().as_bytes())
        )
    }

    /// Remove lock files that are old and not held by anyone.
    fn cleanup_stale_locks(lock_dir: &Path) {
        let Ok(entries) = fs::read_dir(lock_dir) else {
            return;
        };

        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().is_none_or(|ext| ext != "lock") {
                continue;
            }

            let is_old = entry
                .metadata()
                .and_then(|m| m.modified())
                .ok()
                .and_then(|modified| modified.elapsed().ok())
                .is_some_and(|elapsed| elapsed > STALE_THRESHOLD);
            if !is_old {
                continue;
            }

            // A live holder keeps the lock even if the file is old
            let Ok(file) = File::open(&path) else {
                continue;
            };
            if matches!(file.try_lock_exclusive(), Ok(true)) {
                if let Err(e) = fs::remove_file(&path) {
                    tracing::warn!(path = %path.display(), error = %e, "Failed to remove stale lock");
                } else {
                    tracing::debug!(path = %path.display(), "Removed stale lock");
                }
            }
        }
    }
}

/// Whether `file` is the file currently linked at `path`.
#[cfg(unix)]
fn is_linked_at(file: &File, path: &Path) -> bool {
    use std::os::unix::fs::MetadataExt;

    match (file.metadata(), fs::metadata(path)) {
        (Ok(held), Ok(linked)) => held.dev() == linked.dev() && held.ino() == linked.ino(),
        _ => false,
    }
}

#[cfg(not(unix))]
fn is_linked_at(_file: &File, path: &Path) -> bool {
    path.exists()
}

impl Drop for WatchLock {
    fn drop(&mut self) {
        // The file stays linked; unlinking here would let a later acquirer
        // create a fresh inode while someone else locks the old one
        if let Err(e) = FileExt::unlock(&self.lock_file) {
            tracing::debug!(path = %self.lock_path.display(), error = %e, "Failed to release watch lock");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use filetime::FileTime;
    use tempfile::TempDir;

    #[test]
    fn test_acquire_and_release() -> Result<()> {
        let temp = TempDir::new()?;
        let root = temp.path().join("root");
        fs::create_dir_all(&root)?;

        let lock = WatchLock::acquire(&temp.path().join("locks"), &root)?;
        let lock_path = lock.path().to_path_buf();
        assert!(lock_path.exists());
        assert!(fs::read_to_string(&lock_path)?.contains("pid="));

        drop(lock);
        let file = File::open(&lock_path)?;
        assert!(matches!(file.try_lock_exclusive(), Ok(true)));
        Ok(())
    }

    #[test]
    fn test_release_keeps_file_so_lockers_agree() -> Result<()> {
        let temp = TempDir::new()?;
        let locks = temp.path().join("locks");

        let first = WatchLock::acquire(&locks, temp.path())?;
        // Someone opens the lock file while the first watcher still holds it
        let waiting = File::open(first.path())?;
        drop(first);
        assert!(matches!(waiting.try_lock_exclusive(), Ok(true)));

        // The path still names the inode `waiting` holds
        let third = WatchLock::acquire(&locks, temp.path());
        assert!(third.is_err_and(|e| e.to_string().contains("already running")));

        drop(waiting);
        assert!(WatchLock::acquire(&locks, temp.path()).is_ok());
        Ok(())
    }

    #[test]
    fn test_is_linked_at_detects_replaced_file() -> Result<()> {
        let temp = TempDir::new()?;
        let path = temp.path().join("watch.lock");
        fs::write(&path, "")?;

        let held = File::open(&path)?;
        assert!(is_linked_at(&held, &path));

        fs::remove_file(&path)?;
        assert!(!is_linked_at(&held, &path));

        fs::write(&path, "")?;
        assert!(!is_linked_at(&held, &path));
        Ok(())
    }

    #[test]
    fn test_second_watcher_on_same_root_fails() -> Result<()> {
        let temp = TempDir::new()?;
        let locks = temp.path().join("locks");
        let _first = WatchLock::acquire(&locks, temp.path())?;

        let second = WatchLock::acquire(&locks, temp.path());
        let Err(e) = second else {
            panic!("second watcher acquired the lock");
        };
        assert!(e.to_string().contains("already running"));
        Ok(())
    }

    #[test]
    fn test_different_roots_allowed() -> Result<()> {
        let temp = TempDir::new()?;
        let a = temp.path().join("a");
        let b = temp.path().join("b");
        fs::create_dir_all(&a)?;
        fs::create_dir_all(&b)?;
        let locks = temp.path().join("locks");

        let _first = WatchLock::acquire(&locks, &a)?;
        assert!(WatchLock::acquire(&locks, &b).is_ok());
        Ok(())
    }

    #[test]
    fn test_reacquire_after_drop() -> Result<()> {
        let temp = TempDir::new()?;
        let locks = temp.path().join("locks");
        drop(WatchLock::acquire(&locks, temp.path())?);
        assert!(WatchLock::acquire(&locks, temp.path()).is_ok());
        Ok(())
    }

    #[test]
    fn test_stale_unheld_lock_is_removed() -> Result<()> {
        let temp = TempDir::new()?;
        let locks = temp.path().join("locks");
        fs::create_dir_all(&locks)?;

        let stale = locks.join("watch-0000000000000000.lock");
        fs::write(&stale, "pid=1")?;
        let long_ago = FileTime::from_unix_time(1_000_000_000, 0);
        filetime::set_file_mtime(&stale, long_ago)?;

        let _lock = WatchLock::acquire(&locks, temp.path())?;
        assert!(!stale.exists());
        Ok(())
    }
}
