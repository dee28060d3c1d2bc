//! PID-file lifecycle (spec.md §4.7 steps 2, 4-5). A running daemon writes
//! its PID after it starts serving; a subsequent startup attempt that finds
//! a file but a dead process removes it before proceeding, grounded on the
//! self-heal step in `groblegark-oddjobs`'s daemon lifecycle module
//! (`other_examples/80c54ebe_groblegark-oddjobs__crates-daemon-src-lifecycle-mod.rs.rs`),
//! adapted from its `fs2` exclusive-lock-file idiom to a plain PID file
//! plus `kill(pid, 0)` liveness probe since this daemon's socket health
//! check is already the authoritative "is it running" signal and a second
//! advisory lock would just be redundant bookkeeping.

use std::fs;
use std::path::Path;

use swarmcell_core::errors::SwarmResult;

pub fn read_pid(path: &Path) -> Option<u32> {
    fs::read_to_string(path).ok()?.trim().parse().ok()
}

pub fn write_pid(path: &Path, pid: u32) -> SwarmResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, pid.to_string())?;
    Ok(())
}

pub fn remove_pid(path: &Path) {
    let _ = fs::remove_file(path);
}

/// `kill(pid, 0)`: sends no signal, only checks whether the process exists
/// and is visible to us. `ESRCH` means dead; any other errno (e.g. `EPERM`
/// for a process we don't own) counts as alive — we'd rather leave a stale
/// file in the rare cross-user case than steal a live daemon's state.
#[cfg(unix)]
pub fn is_process_alive(pid: u32) -> bool {
    unsafe { libc::kill(pid as libc::pid_t, 0) == 0 || std::io::Error::last_os_error().raw_os_error() != Some(libc::ESRCH) }
}

#[cfg(not(unix))]
pub fn is_process_alive(_pid: u32) -> bool {
    true
}

/// If `path` names a PID file whose process is no longer alive, remove it
/// and report that it was removed.
pub fn clear_if_stale(path: &Path) -> bool {
    match read_pid(path) {
        Some(pid) if !is_process_alive(pid) => {
            remove_pid(path);
            true
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn stale_pid_file_for_nonexistent_process_is_removed() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("daemon.pid");
        // PID 1 belongs to init and is always alive in any container/host;
        // pick an implausibly large PID instead to simulate a dead process.
        write_pid(&path, 99_999_999).unwrap();
        assert!(clear_if_stale(&path));
        assert!(!path.exists());
    }

    #[test]
    fn live_process_pid_file_is_left_alone() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("daemon.pid");
        write_pid(&path, std::process::id()).unwrap();
        assert!(!clear_if_stale(&path));
        assert!(path.exists());
    }
}
