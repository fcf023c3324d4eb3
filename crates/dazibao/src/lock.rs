//! Single-instance lock file.
//!
//! The lock is a file created exclusively in the Dazibao directory holding
//! the owner's PID. It is removed when the [`InstanceLock`] is dropped. A lock
//! left behind by a process that no longer exists is reclaimed.
//!
//! Acquisition runs under an exclusive `flock` on a sibling guard file, so two
//! instances starting together cannot both judge the same lock stale.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use dazibao_core::errors::DazibaoError;
use nix::errno::Errno;
use nix::fcntl::{Flock, FlockArg};
use nix::sys::signal::kill;
use nix::unistd::Pid;
use tracing::{info, warn};

#[derive(Debug, thiserror::Error)]
pub enum LockError {
    #[error("Another instance of dazibao is already running (PID {pid}). Lock file exists: {path}")]
    AlreadyRunning { path: PathBuf, pid: u32 },

    #[error("Lock file error at '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl DazibaoError for LockError {
    fn error_code(&self) -> &'static str {
        match self {
            LockError::AlreadyRunning { .. } => "LOCK_ALREADY_RUNNING",
            LockError::Io { .. } => "LOCK_IO_ERROR",
        }
    }

    fn is_user_error(&self) -> bool {
        matches!(self, LockError::AlreadyRunning { .. })
    }
}

/// Held for as long as this process is the running instance.
#[derive(Debug)]
pub struct InstanceLock {
    path: PathBuf,
}

/// Whether a process with `pid` exists (signal 0 probe).
fn is_process_alive(pid: u32) -> bool {
    let Ok(raw) = i32::try_from(pid) else {
        return false;
    };
    match kill(Pid::from_raw(raw), None) {
        Ok(()) => true,
        // Exists but owned by someone else
        Err(Errno::EPERM) => true,
        Err(_) => false,
    }
}

fn read_lock_pid(path: &Path) -> Option<u32> {
    fs::read_to_string(path).ok()?.trim().parse().ok()
}

/// Guard file serializing acquisitions of the lock at `path`. Never removed.
fn guard_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".guard");
    PathBuf::from(name)
}

/// Block until no other process is inside [`InstanceLock::acquire`].
fn acquire_guard(path: &Path) -> Result<Flock<fs::File>, LockError> {
    let guard = guard_path(path);
    let file = fs::OpenOptions::new()
        .create(true)
        .truncate(false)
        .write(true)
        .open(&guard)
        .map_err(|source| LockError::Io {
            path: guard.clone(),
            source,
        })?;

    Flock::lock(file, FlockArg::LockExclusive).map_err(|(_, errno)| LockError::Io {
        path: guard,
        source: std::io::Error::from(errno),
    })
}

impl InstanceLock {
    /// Create the lock file at `path`, writing this process's PID into it.
    pub fn acquire(path: &Path) -> Result<Self, LockError> {
        let io_err = |source: std::io::Error| LockError::Io {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(io_err)?;
        }

        // Released on return, after the PID is written.
        let _guard = acquire_guard(path)?;

        let mut file = match fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path)
        {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                match read_lock_pid(path) {
                    Some(pid) if is_process_alive(pid) => {
                        return Err(LockError::AlreadyRunning {
                            path: path.to_path_buf(),
                            pid,
                        });
                    }
                    stale_pid => {
                        warn!(
                            event = "cli.lock.stale_reclaimed",
                            path = %path.display(),
                            stale_pid = ?stale_pid,
                            "Lock file owner is gone, reclaiming lock"
                        );
                        fs::remove_file(path).map_err(io_err)?;
                        fs::OpenOptions::new()
                            .write(true)
                            .create_new(true)
                            .open(path)
                            .map_err(io_err)?
                    }
                }
            }
            Err(e) => return Err(io_err(e)),
        };

        let pid = std::process::id();
        if let Err(e) = write!(file, "{}", pid) {
            let _ = fs::remove_file(path);
            return Err(io_err(e));
        }

        info!(event = "cli.lock.acquired", path = %path.display(), pid = pid);
        Ok(Self {
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for InstanceLock {
    fn drop(&mut self) {
        match fs::remove_file(&self.path) {
            Ok(()) => info!(event = "cli.lock.released", path = %self.path.display()),
            Err(e) => warn!(
                event = "cli.lock.release_failed",
                path = %self.path.display(),
                error = %e
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_acquire_writes_pid_and_drop_removes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dazibao.lock");

        let lock = InstanceLock::acquire(&path).unwrap();
        assert_eq!(read_lock_pid(&path), Some(std::process::id()));
        assert_eq!(lock.path(), path.as_path());

        drop(lock);
        assert!(!path.exists());
    }

    #[test]
    fn test_second_acquire_fails_while_held() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dazibao.lock");

        let _held = InstanceLock::acquire(&path).unwrap();
        let err = InstanceLock::acquire(&path).unwrap_err();
        assert!(matches!(err, LockError::AlreadyRunning { pid, .. } if pid == std::process::id()));
        assert_eq!(err.error_code(), "LOCK_ALREADY_RUNNING");
        assert!(path.exists());
    }

    #[test]
    fn test_stale_lock_is_reclaimed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dazibao.lock");

        // A PID far above any default pid_max
        fs::write(&path, "2147483000").unwrap();
        let lock = InstanceLock::acquire(&path).unwrap();
        assert_eq!(read_lock_pid(lock.path()), Some(std::process::id()));
    }

    #[test]
    fn test_concurrent_reclaim_has_single_winner() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dazibao.lock");
        fs::write(&path, "2147483000").unwrap();

        let start = std::sync::Arc::new(std::sync::Barrier::new(8));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let path = path.clone();
                let start = start.clone();
                std::thread::spawn(move || {
                    start.wait();
                    InstanceLock::acquire(&path)
                })
            })
            .collect();
        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        let winners = results.iter().filter(|r| r.is_ok()).count();
        assert_eq!(winners, 1);
        assert!(
            results
                .iter()
                .filter_map(|r| r.as_ref().err())
                .all(|e| matches!(e, LockError::AlreadyRunning { .. }))
        );
        assert_eq!(read_lock_pid(&path), Some(std::process::id()));
    }

    #[test]
    fn test_guard_file_sits_next_to_lock() {
        assert_eq!(
            guard_path(Path::new("/srv/dz/dazibao.lock")),
            PathBuf::from("/srv/dz/dazibao.lock.guard")
        );
    }

    #[test]
    fn test_garbage_lock_is_reclaimed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dazibao.lock");

        fs::write(&path, "not a pid").unwrap();
        assert!(InstanceLock::acquire(&path).is_ok());
    }

    #[test]
    fn test_acquire_creates_parent_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("dazibao.lock");
        assert!(InstanceLock::acquire(&path).is_ok());
    }
}
