//! Advisory PID lock held for one load-modify-save cycle of a data file.
//!
//! The lock is a sibling file `.<name>.lock` created with `create_new`
//! (`O_CREAT | O_EXCL`) and holding the owner's PID. A lock whose PID is no
//! longer running is treated as stale and removed. The guard deletes the
//! file on drop.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;
use tracing::{debug, warn};

use crate::error::{MealError, Result};

/// RAII guard that releases the lock file on drop.
#[derive(Debug)]
pub struct LockGuard {
    path: PathBuf,
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.path);
    }
}

impl LockGuard {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Lock file guarding `data_path`: `<dir>/.<name>.lock`.
pub fn lock_path(data_path: &Path) -> PathBuf {
    let name = data_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    data_path
        .parent()
        .unwrap_or_else(|| Path::new(""))
        .join(format!(".{name}.lock"))
}

/// Acquire the lock at `lock_path`, retrying up to `max_retries` times
/// `retry_ms` apart while a live process holds it.
pub fn acquire(lock_path: &Path, max_retries: u32, retry_ms: u64) -> Result<LockGuard> {
    if let Some(parent) = lock_path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent).map_err(|e| MealError::io(parent, e))?;
        }
    }

    for attempt in 0..=max_retries {
        match try_create_lock(lock_path) {
            Ok(guard) => {
                debug!(lock = %lock_path.display(), "lock acquired");
                return Ok(guard);
            }
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists && attempt < max_retries => {
                if let Some(dead) = stale_pid(lock_path) {
                    // re-read so we never remove a lock another process just took
                    if read_lock_pid(lock_path) == Some(dead) {
                        warn!(lock = %lock_path.display(), pid = dead, "removing stale lock");
                        let _ = fs::remove_file(lock_path);
                    }
                    continue;
                }
                thread::sleep(Duration::from_millis(retry_ms));
            }
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => break,
            Err(e) => return Err(MealError::io(lock_path, e)),
        }
    }

    Err(MealError::Lock {
        path: lock_path.to_path_buf(),
        reason: format!("still held after {} attempts", max_retries + 1),
    })
}

fn try_create_lock(lock_path: &Path) -> std::io::Result<LockGuard> {
    let mut file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(lock_path)?;
    let guard = LockGuard {
        path: lock_path.to_path_buf(),
    };
    writeln!(file, "{}", std::process::id())?;
    Ok(guard)
}

/// True if the lock file names a process that is no longer running.
pub fn is_stale(lock_path: &Path) -> bool {
    stale_pid(lock_path).is_some()
}

fn read_lock_pid(lock_path: &Path) -> Option<u32> {
    fs::read_to_string(lock_path).ok()?.trim().parse().ok()
}

fn stale_pid(lock_path: &Path) -> Option<u32> {
    let pid = read_lock_pid(lock_path)?;
    if is_process_alive(pid) {
        None
    } else {
        Some(pid)
    }
}

#[cfg(unix)]
fn is_process_alive(pid: u32) -> bool {
    let Ok(pid) = i32::try_from(pid) else {
        return false;
    };
    // kill(pid, 0) checks existence without signalling
    unsafe { libc::kill(pid, 0) == 0 }
}

#[cfg(not(unix))]
fn is_process_alive(_pid: u32) -> bool {
    true
}
