// crates/pavilion-build/src/lock.rs
// ============================================================================
// Module: Build Lock Coordination
// Description: Exclusive-create sentinel lock with stall detection, guarding
//              the window between "no finished marker" and "marker written".
// Purpose: Let concurrent Pavilion processes on the same working directory
//          share one build without double-executing the script.
// Dependencies: pavilion-core, std::fs
// ============================================================================

//! ## Overview
//! [`BuildLock::acquire`] attempts an atomic create-exclusive on the
//! artifact's sentinel file. On failure it watches the build script's output
//! log: if its mtime has not advanced for `timeout` seconds, the holder is
//! considered stalled, the sentinel is removed, and acquisition retries
//! once. This directly implements §4.3's concurrency contract and §5's
//! timeout-based cancellation for builds.

use std::fs;
use std::path::Path;
use std::path::PathBuf;
use std::thread;
use std::time::Duration;
use std::time::Instant;

use crate::error::BuildEngineError;

/// An acquired exclusive lock over one build artifact's sentinel file.
///
/// # Invariants
/// - The sentinel file is removed when this guard drops, whether the build
///   succeeded or failed (so a future acquirer is never blocked forever by a
///   build that errored out before reaching the finished marker).
pub struct BuildLockGuard {
    sentinel: PathBuf,
}

impl Drop for BuildLockGuard {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.sentinel);
    }
}

/// Polling interval while waiting for a held lock.
const POLL_INTERVAL: Duration = Duration::from_millis(200);

/// Attempts to acquire the exclusive build lock at `sentinel`, retrying once
/// after reclaiming a stalled holder.
///
/// `log_path` is the build script's output log; its mtime is the stall
/// signal. `timeout` is the number of seconds of log silence before the
/// current holder is considered stalled.
///
/// # Errors
///
/// Returns [`BuildEngineError::LockStallReclaimed`] only if reclaiming a
/// stalled lock itself then fails to acquire (implying genuine contention,
/// not stall); returns [`BuildEngineError::Io`] on other filesystem errors.
pub fn acquire(
    sentinel: &Path,
    log_path: &Path,
    timeout: Duration,
    hash_label: &str,
) -> Result<BuildLockGuard, BuildEngineError> {
    if let Some(parent) = sentinel.parent() {
        fs::create_dir_all(parent)?;
    }

    match try_create(sentinel)? {
        true => Ok(BuildLockGuard { sentinel: sentinel.to_path_buf() }),
        false => acquire_after_waiting(sentinel, log_path, timeout, hash_label),
    }
}

fn acquire_after_waiting(
    sentinel: &Path,
    log_path: &Path,
    timeout: Duration,
    hash_label: &str,
) -> Result<BuildLockGuard, BuildEngineError> {
    let deadline = Instant::now() + timeout;
    let mut last_progress = log_mtime(log_path);

    loop {
        thread::sleep(POLL_INTERVAL);
        if try_create(sentinel)? {
            return Ok(BuildLockGuard { sentinel: sentinel.to_path_buf() });
        }

        let current_progress = log_mtime(log_path);
        if current_progress != last_progress {
            last_progress = current_progress;
            continue;
        }
        if Instant::now() >= deadline {
            reclaim_stalled(sentinel, hash_label)?;
            return match try_create(sentinel)? {
                true => Ok(BuildLockGuard { sentinel: sentinel.to_path_buf() }),
                false => Err(BuildEngineError::LockStallReclaimed(hash_label.to_string())),
            };
        }
    }
}

fn reclaim_stalled(sentinel: &Path, hash_label: &str) -> Result<(), BuildEngineError> {
    tracing::warn!(hash = hash_label, "build lock holder stalled; reclaiming");
    match fs::remove_file(sentinel) {
        Ok(()) => Ok(()),
        Err(_) if !sentinel.exists() => Ok(()),
        Err(err) => Err(err.into()),
    }
}

fn try_create(sentinel: &Path) -> Result<bool, BuildEngineError> {
    match fs::OpenOptions::new().write(true).create_new(true).open(sentinel) {
        Ok(_) => Ok(true),
        Err(err) if err.kind() == std::io::ErrorKind::AlreadyExists => Ok(false),
        Err(err) => Err(err.into()),
    }
}

fn log_mtime(log_path: &Path) -> Option<std::time::SystemTime> {
    fs::metadata(log_path).and_then(|meta| meta.modified()).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn acquires_uncontended_lock() {
        let dir = tempfile::tempdir().unwrap();
        let sentinel = dir.path().join(".abc.lock");
        let log = dir.path().join("build.log");
        let guard = acquire(&sentinel, &log, Duration::from_secs(30), "abc").unwrap();
        assert!(sentinel.exists());
        drop(guard);
        assert!(!sentinel.exists());
    }

    #[test]
    fn second_acquire_fails_while_held_without_stall_window() {
        let dir = tempfile::tempdir().unwrap();
        let sentinel = dir.path().join(".abc.lock");
        fs::write(&sentinel, b"").unwrap();
        assert!(!try_create(&sentinel).unwrap());
    }
}
