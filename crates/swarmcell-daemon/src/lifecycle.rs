//! Startup and shutdown orchestration (spec.md §4.7), grounded on the
//! lock-then-bind ordering of `groblegark-oddjobs`'s daemon lifecycle
//! (`other_examples/80c54ebe_groblegark-oddjobs__crates-daemon-src-lifecycle-mod.rs.rs`),
//! adapted from its single always-on daemon (one process for every project)
//! to this system's one-daemon-per-project-database model, so the lock
//! file and socket both live under a project-hashed temp directory instead
//! of a fixed user-level state dir.

use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use swarmcell_core::config::SwarmConfig;
use swarmcell_core::errors::{SwarmError, SwarmResult};
use swarmcell_core::traits::StorageAdapter;
use swarmcell_storage::StorageEngine;
use tracing::{info, warn};

use crate::endpoint::Endpoint;
use crate::health;
use crate::pid;
use crate::state::DaemonState;

pub struct StartupOutcome {
    /// `true` if this call actually started a daemon; `false` if an
    /// existing, healthy daemon already owned the endpoint.
    pub started: bool,
    pub endpoint: Endpoint,
}

/// Health-check first, then the full startup ladder. Concurrent callers
/// collapse to "first wins": whichever process binds the socket becomes
/// authoritative, everyone else observes it healthy and returns.
pub fn resolve_or_start(
    project_key: &str,
    db_path: &Path,
    config: &SwarmConfig,
) -> SwarmResult<(StartupOutcome, Option<(Arc<DaemonState>, BoundForSpawn)>)> {
    let endpoint = Endpoint::resolve(project_key, &config.daemon);
    let probe_timeout = Duration::from_millis(500);

    if health::check_health(&endpoint, probe_timeout) {
        return Ok((StartupOutcome { started: false, endpoint }, None));
    }

    let pid_path = swarmcell_core::paths::pid_path(project_key);
    if pid::clear_if_stale(&pid_path) {
        info!(path = %pid_path.display(), "removed stale PID file");
    }

    let storage = open_with_recovery(db_path)?;
    let storage = Arc::new(storage);
    let state = Arc::new(DaemonState::new(project_key.to_string(), config.clone(), storage));

    Ok((
        StartupOutcome { started: true, endpoint: endpoint.clone() },
        Some((state, BoundForSpawn { endpoint, pid_path })),
    ))
}

pub struct BoundForSpawn {
    pub endpoint: Endpoint,
    pub pid_path: std::path::PathBuf,
}

/// Opens the database; on a corruption signal, deletes the data directory
/// and retries exactly once. Safe because this daemon's data directory
/// holds only ephemeral coordination state recoverable from the global
/// store and JSONL exports — nothing here is the sole copy of anything.
fn open_with_recovery(db_path: &Path) -> SwarmResult<StorageEngine> {
    match StorageEngine::open(db_path) {
        Ok(engine) => Ok(engine),
        Err(SwarmError::Corruption { detail }) => {
            warn!(detail, path = %db_path.display(), "storage reported corruption, recovering once");
            if let Some(parent) = db_path.parent() {
                let _ = std::fs::remove_dir_all(parent);
            }
            StorageEngine::open(db_path)
        }
        Err(e) => Err(e),
    }
}

/// Step 5: poll the endpoint until it answers or `timeout` elapses.
pub fn wait_until_healthy(endpoint: &Endpoint, timeout: Duration) -> SwarmResult<()> {
    let started = Instant::now();
    let probe_timeout = Duration::from_millis(200);
    while started.elapsed() < timeout {
        if health::check_health(endpoint, probe_timeout) {
            return Ok(());
        }
        std::thread::sleep(Duration::from_millis(50));
    }
    Err(SwarmError::Timeout { op: "daemon_startup".to_string(), ms: timeout.as_millis() as u64 })
}

/// Best-effort teardown: checkpoint, remove the PID file. Every step is
/// logged at warning on failure rather than propagated — shutdown must
/// never leave the process unable to exit.
pub fn shutdown(state: &DaemonState, pid_path: &Path) {
    if let Err(e) = state.storage.checkpoint() {
        warn!(error = %e, "checkpoint on shutdown failed");
    }
    if let Err(e) = state.storage.close() {
        warn!(error = %e, "close on shutdown failed");
    }
    pid::remove_pid(pid_path);
    info!("daemon shutdown complete");
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    /// S7, first half: a stale PID file (process long dead) at this
    /// project's well-known path must not block startup, since nothing
    /// answers the health check either. `resolve_or_start` should remove it
    /// and report `started: true`. Starting the listener and re-probing
    /// health is exercised by `swarmcell-daemon::lib`'s `run_daemon`, not
    /// unit-testable here without binding a real socket.
    #[test]
    fn stale_pid_file_does_not_block_startup_and_is_removed() {
        let project_key = format!("swarmcell-lifecycle-test-{}", std::process::id());
        let pid_path = swarmcell_core::paths::pid_path(&project_key);
        pid::write_pid(&pid_path, 99_999_999).unwrap();
        assert!(pid_path.exists());

        let dir = tempdir().unwrap();
        let mut config = SwarmConfig::default();
        config.daemon.socket_path = Some(dir.path().join("daemon.sock").to_string_lossy().into_owned());
        let db_path = dir.path().join("swarm.db");

        let (outcome, spawn) = resolve_or_start(&project_key, &db_path, &config).unwrap();
        assert!(outcome.started);
        assert!(spawn.is_some());
        assert!(!pid_path.exists(), "stale PID file should have been removed");

        let _ = std::fs::remove_file(&pid_path);
    }
}
