//! The socket server. Accepts connections over a Unix socket (preferred) or
//! loopback TCP, reads newline-delimited JSON requests, and dispatches each
//! on a blocking-pool thread since the underlying SQLite calls are
//! synchronous. One accept loop per daemon; requests from different
//! connections interleave freely, writes serialize inside `StorageEngine`.

use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;
#[cfg(unix)]
use tokio::net::UnixListener;
use tracing::{debug, warn};

use swarmcell_core::traits::StorageAdapter;

use crate::dispatch;
use crate::endpoint::Endpoint;
use crate::protocol::{Request, Response};
use crate::state::DaemonState;

pub enum BoundListener {
    #[cfg(unix)]
    Unix(UnixListener),
    Tcp(TcpListener),
}

pub async fn bind(endpoint: &Endpoint) -> std::io::Result<BoundListener> {
    match endpoint {
        #[cfg(unix)]
        Endpoint::Unix(path) => {
            if let Some(parent) = path.parent() {
                tokio::fs::create_dir_all(parent).await?;
            }
            if path.exists() {
                tokio::fs::remove_file(path).await?;
            }
            Ok(BoundListener::Unix(UnixListener::bind(path)?))
        }
        #[cfg(not(unix))]
        Endpoint::Unix(_) => Err(std::io::Error::new(std::io::ErrorKind::Unsupported, "unix sockets unavailable")),
        Endpoint::Tcp { host, port } => Ok(BoundListener::Tcp(TcpListener::bind((host.as_str(), *port)).await?)),
    }
}

/// Runs the accept loop forever. Exits only on a listener-level I/O error;
/// per-connection errors are logged and the connection is dropped.
pub async fn serve(listener: BoundListener, state: Arc<DaemonState>) -> std::io::Result<()> {
    loop {
        match &listener {
            #[cfg(unix)]
            BoundListener::Unix(l) => {
                let (stream, _) = l.accept().await?;
                let state = Arc::clone(&state);
                tokio::spawn(async move {
                    if let Err(e) = handle_stream(stream, state).await {
                        debug!(error = %e, "connection closed with error");
                    }
                });
            }
            BoundListener::Tcp(l) => {
                let (stream, _) = l.accept().await?;
                let state = Arc::clone(&state);
                tokio::spawn(async move {
                    if let Err(e) = handle_stream(stream, state).await {
                        debug!(error = %e, "connection closed with error");
                    }
                });
            }
        }
    }
}

async fn handle_stream<T>(stream: T, state: Arc<DaemonState>) -> std::io::Result<()>
where
    T: tokio::io::AsyncRead + tokio::io::AsyncWrite + Unpin,
{
    let (read_half, mut write_half) = tokio::io::split(stream);
    let mut reader = BufReader::new(read_half);
    let mut line = String::new();

    loop {
        line.clear();
        let bytes_read = reader.read_line(&mut line).await?;
        if bytes_read == 0 {
            return Ok(()); // client closed the connection
        }

        let response = match serde_json::from_str::<Request>(line.trim_end()) {
            Ok(request) => dispatch_with_deadline(&state, request).await,
            Err(e) => Response::err("unknown".to_string(), "validation", format!("malformed request: {e}")),
        };

        let mut out = serde_json::to_string(&response).unwrap_or_else(|_| "{}".to_string());
        out.push('\n');
        write_half.write_all(out.as_bytes()).await?;
    }
}

/// Runs `dispatch::handle` on the blocking pool under the request's deadline
/// (falling back to the daemon's configured default), per spec.md §4.7/§7.
/// On elapse the in-flight SQLite call is interrupted so a `transaction`
/// call rolls back instead of committing after the client has already been
/// told it timed out; the blocking task is left to unwind in the background
/// rather than joined, since `spawn_blocking` offers no way to cancel it
/// outright.
async fn dispatch_with_deadline(state: &Arc<DaemonState>, request: Request) -> Response {
    let op = request.op.clone();
    let request_id = request.request_id.clone();
    let deadline_ms = request.deadline_ms.unwrap_or(state.config.daemon.default_timeout_ms);

    let task_state = Arc::clone(state);
    let task = tokio::task::spawn_blocking(move || dispatch::handle(&task_state, request));

    match tokio::time::timeout(Duration::from_millis(deadline_ms), task).await {
        Ok(Ok(response)) => response,
        Ok(Err(join_err)) => {
            warn!(error = %join_err, "dispatch task panicked");
            Response::err(request_id, "transport", "request handler panicked")
        }
        Err(_elapsed) => {
            state.storage.interrupt();
            warn!(op, deadline_ms, "operation exceeded its deadline, interrupting");
            Response::err(request_id, "timeout", format!("operation '{op}' timed out after {deadline_ms}ms"))
        }
    }
}
