//! File locking for mutual exclusion between processes sharing the base
//! directory.
//!
//! Uses flock() advisory locking:
//! - Daemon: holds `paperfeed.lock` for its lifetime, so two daemons never
//!   rewrite the same user table.
//! - Notify batch: holds `notify.lock` per run, so an overlapping run
//!   refuses to start instead of duplicating sends.

use std::fs::{File, OpenOptions};
use std::io;
use std::path::Path;

#[cfg(unix)]
use std::os::unix::io::AsRawFd;

pub const DAEMON_LOCK: &str = "paperfeed.lock";
pub const NOTIFY_LOCK: &str = "notify.lock";

/// A held file lock that releases on drop.
pub struct FileLock {
    #[allow(dead_code)]
    file: File,
}

impl FileLock {
    /// Attempt to acquire an exclusive lock on `<base_path>/<name>`.
    /// Returns an error immediately if another process holds it.
    pub fn try_acquire(base_path: &Path, name: &str) -> io::Result<Self> {
        let lock_path = base_path.join(name);
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&lock_path)?;

        Self::try_lock_exclusive(&file)?;

        Ok(FileLock { file })
    }

    #[cfg(unix)]
    fn try_lock_exclusive(file: &File) -> io::Result<()> {
        let fd = file.as_raw_fd();
        let result = unsafe { libc::flock(fd, libc::LOCK_EX | libc::LOCK_NB) };
        if result != 0 {
            let err = io::Error::last_os_error();
            if err.kind() == io::ErrorKind::WouldBlock
                || err.raw_os_error() == Some(libc::EWOULDBLOCK)
                || err.raw_os_error() == Some(libc::EAGAIN)
            {
                return Err(io::Error::new(
                    io::ErrorKind::WouldBlock,
                    "already locked by another paperfeed process",
                ));
            }
            return Err(err);
        }
        Ok(())
    }

    #[cfg(not(unix))]
    fn try_lock_exclusive(_file: &File) -> io::Result<()> {
        // No locking on non-Unix platforms; compiles but provides no protection
        Ok(())
    }
}

#[cfg(unix)]
impl Drop for FileLock {
    fn drop(&mut self) {
        let fd = self.file.as_raw_fd();
        // release the lock, ignore errors on drop
        unsafe { libc::flock(fd, libc::LOCK_UN) };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_acquire_and_release() {
        let tmp = tempfile::tempdir().unwrap();

        let lock1 = FileLock::try_acquire(tmp.path(), NOTIFY_LOCK);
        assert!(lock1.is_ok(), "first lock should succeed");

        let lock2 = FileLock::try_acquire(tmp.path(), NOTIFY_LOCK);
        assert!(lock2.is_err(), "second lock should fail");

        drop(lock1);

        let lock3 = FileLock::try_acquire(tmp.path(), NOTIFY_LOCK);
        assert!(lock3.is_ok(), "third lock should succeed after release");
    }

    #[test]
    fn test_distinct_names_do_not_collide() {
        let tmp = tempfile::tempdir().unwrap();

        let daemon = FileLock::try_acquire(tmp.path(), DAEMON_LOCK);
        let notify = FileLock::try_acquire(tmp.path(), NOTIFY_LOCK);
        assert!(daemon.is_ok());
        assert!(notify.is_ok(), "daemon and batch use separate locks");
    }
}
