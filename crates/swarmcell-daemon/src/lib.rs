//! Single-writer database daemon and client transport (spec.md §4.7).
//!
//! `run_daemon` implements the full startup ladder: health-check the
//! configured endpoint first (another process may already own it), clear a
//! stale PID file, open storage with one corruption-recovery retry, bind
//! the socket, write the PID, then poll until the server answers before
//! returning. `Client` is what every other surface (the CLI, eventually a
//! dashboard) should use to reach a project's store — it tries the socket
//! and falls back to an embedded engine on any failure, so the two paths
//! behave identically above `StorageAdapter`.

pub mod client;
pub mod dispatch;
pub mod endpoint;
pub mod health;
pub mod lifecycle;
pub mod listener;
pub mod pid;
pub mod protocol;
pub mod state;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use swarmcell_core::config::SwarmConfig;
use swarmcell_core::errors::{SwarmError, SwarmResult};
use tracing::info;

pub use client::Client;
pub use endpoint::Endpoint;
pub use state::DaemonState;

/// Runs a daemon for `project_key` in the foreground until `shutdown_signal`
/// resolves (typically ctrl-c). Returns the endpoint without starting
/// anything if a healthy daemon already owns it — the caller should treat
/// that as success, not an error.
pub async fn run_daemon(
    project_key: &str,
    db_path: &Path,
    config: &SwarmConfig,
    shutdown_signal: impl std::future::Future<Output = ()>,
) -> SwarmResult<Endpoint> {
    let (outcome, spawned) = lifecycle::resolve_or_start(project_key, db_path, config)?;
    if !outcome.started {
        info!(endpoint = %outcome.endpoint.describe(), "daemon already running, returning its endpoint");
        return Ok(outcome.endpoint);
    }
    let (state, bound) = spawned.expect("resolve_or_start returns Some(..) whenever started is true");

    let listener = listener::bind(&bound.endpoint).await.map_err(|e| SwarmError::Transport { detail: e.to_string() })?;
    pid::write_pid(&bound.pid_path, std::process::id())?;

    let serve_state = Arc::clone(&state);
    let endpoint_for_wait = bound.endpoint.clone();
    let serve_handle = tokio::spawn(async move {
        if let Err(e) = listener::serve(listener, serve_state).await {
            tracing::error!(error = %e, "listener exited with error");
        }
    });

    lifecycle::wait_until_healthy(&endpoint_for_wait, Duration::from_millis(config.daemon.startup_poll_timeout_ms))?;
    info!(endpoint = %bound.endpoint.describe(), "daemon ready");

    shutdown_signal.await;
    serve_handle.abort();
    lifecycle::shutdown(&state, &bound.pid_path);

    Ok(bound.endpoint)
}
