//! Client connection policy (spec.md §4.7): prefer the socket; on any
//! connect/health failure fall back to an embedded in-process engine. Both
//! paths run exactly the same `dispatch::handle` logic above the
//! `StorageAdapter` seam, so callers never need to know which one answered.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use uuid::Uuid;

use swarmcell_core::config::SwarmConfig;
use swarmcell_core::errors::{SwarmError, SwarmResult};
use swarmcell_core::traits::StorageAdapter;
use swarmcell_storage::StorageEngine;
use tracing::warn;

use crate::dispatch;
use crate::endpoint::Endpoint;
use crate::health;
use crate::protocol::Request;
use crate::state::DaemonState;

pub enum Client {
    Socket { endpoint: Endpoint, timeout: Duration },
    Embedded { state: Arc<DaemonState>, timeout: Duration },
}

impl Client {
    /// Connects per policy: opt-out env switch or a failed health probe
    /// both route to the embedded engine, logging a single warning for the
    /// latter (spec.md §7 — transport errors trigger fallback plus one
    /// warning, never a hard failure).
    pub fn connect(project_key: &str, db_path: &Path, config: &SwarmConfig) -> SwarmResult<Self> {
        let timeout = Duration::from_millis(config.daemon.default_timeout_ms);
        if config.daemon.socket_enabled {
            let endpoint = Endpoint::resolve(project_key, &config.daemon);
            if health::check_health(&endpoint, Duration::from_millis(500)) {
                return Ok(Client::Socket { endpoint, timeout });
            }
            warn!(endpoint = %endpoint.describe(), "daemon unavailable, falling back to embedded engine");
        }
        Ok(Client::Embedded { state: Arc::new(embedded_state(project_key, db_path, config)?), timeout })
    }

    pub fn call(&self, op: &str, args: Value) -> SwarmResult<Value> {
        match self {
            Client::Socket { endpoint, timeout } => {
                let response = health::send_request(endpoint, op, args, *timeout)
                    .map_err(|e| SwarmError::Transport { detail: e.to_string() })?;
                if response.ok {
                    Ok(response.result.unwrap_or(Value::Null))
                } else {
                    let err = response.error.unwrap_or(crate::protocol::ErrorPayload {
                        kind: "transport".to_string(),
                        message: "daemon returned no error detail".to_string(),
                    });
                    Err(error_from_kind(&err.kind, err.message))
                }
            }
            Client::Embedded { state, timeout } => call_embedded_with_deadline(state, op, args, *timeout),
        }
    }
}

/// Runs the embedded dispatch on its own thread and joins it with a
/// deadline, matching the socket path's per-operation timeout (spec.md
/// §4.7/§7) even though there is no async runtime to drive a
/// `tokio::time::timeout` in the synchronous embedded path. On timeout the
/// storage engine is interrupted so the in-flight call aborts (rolling back
/// a `transaction`) instead of mutating state after the caller has already
/// been told it failed fast.
fn call_embedded_with_deadline(state: &Arc<DaemonState>, op: &str, args: Value, timeout: Duration) -> SwarmResult<Value> {
    let deadline_ms = timeout.as_millis() as u64;
    let request = Request { op: op.to_string(), args, deadline_ms: Some(deadline_ms), request_id: Uuid::new_v4().to_string() };
    let op = op.to_string();
    let task_state = Arc::clone(state);
    let (tx, rx) = std::sync::mpsc::channel();
    std::thread::spawn(move || {
        let response = dispatch::handle(&task_state, request);
        let _ = tx.send(response);
    });

    match rx.recv_timeout(timeout) {
        Ok(response) => {
            if response.ok {
                Ok(response.result.unwrap_or(Value::Null))
            } else {
                let err = response.error.expect("non-ok response always carries an error");
                Err(error_from_kind(&err.kind, err.message))
            }
        }
        Err(_) => {
            state.storage.interrupt();
            warn!(op, deadline_ms, "embedded operation exceeded its deadline, interrupting");
            Err(SwarmError::Timeout { op, ms: deadline_ms })
        }
    }
}

fn embedded_state(project_key: &str, db_path: &Path, config: &SwarmConfig) -> SwarmResult<DaemonState> {
    let storage = Arc::new(StorageEngine::open(db_path)?);
    Ok(DaemonState::new(project_key.to_string(), config.clone(), storage))
}

/// Reconstructs a typed error from the wire `kind` string so callers above
/// the client can still match on `SwarmError` variants regardless of which
/// transport answered.
fn error_from_kind(kind: &str, message: String) -> SwarmError {
    match kind {
        "validation" => SwarmError::Validation { field: "unknown".to_string(), reason: message },
        "not_found" => SwarmError::NotFound { entity: "unknown".to_string(), id: message },
        "invalid_transition" => SwarmError::InvalidTransition { from: "unknown".to_string(), to: message },
        "dependency_cycle" => SwarmError::DependencyCycle { path: message },
        "ambiguous_id" => SwarmError::AmbiguousId { partial: message, matches: Vec::new() },
        "timeout" => SwarmError::Timeout { op: message, ms: 0 },
        "conflict" => SwarmError::Conflict { resource: message, holder: "unknown".to_string() },
        "corruption" => SwarmError::Corruption { detail: message },
        _ => SwarmError::Transport { detail: message },
    }
}
