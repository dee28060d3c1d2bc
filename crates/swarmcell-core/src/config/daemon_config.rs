use serde::{Deserialize, Serialize};

/// Configuration for the daemon/client transport subsystem.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DaemonConfig {
    /// Socket mode opt-out. `false` forces embedded-mode clients.
    pub socket_enabled: bool,
    /// Override the Unix socket path. `None` uses the per-project default
    /// under `$TMPDIR/swarmcell-<project>-<hash>/daemon.sock`.
    pub socket_path: Option<String>,
    /// Loopback TCP fallback host.
    pub tcp_host: String,
    /// Loopback TCP fallback port.
    pub tcp_port: u16,
    /// Default per-operation timeout, milliseconds.
    pub default_timeout_ms: u64,
    /// How long to poll-health during startup before giving up, milliseconds.
    pub startup_poll_timeout_ms: u64,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            socket_enabled: true,
            socket_path: None,
            tcp_host: "127.0.0.1".to_string(),
            tcp_port: 15433,
            default_timeout_ms: 30_000,
            startup_poll_timeout_ms: 10_000,
        }
    }
}
