//! Where a daemon listens: a Unix socket path (preferred) or a loopback TCP
//! host/port (spec.md §4.7, §6). Resolved once from `DaemonConfig` and the
//! project key, then shared by the health check, the listener, and clients.

use std::path::PathBuf;

use swarmcell_core::config::DaemonConfig;
use swarmcell_core::paths;

#[derive(Debug, Clone)]
pub enum Endpoint {
    Unix(PathBuf),
    Tcp { host: String, port: u16 },
}

impl Endpoint {
    pub fn resolve(project_key: &str, config: &DaemonConfig) -> Self {
        if cfg!(unix) {
            let path = config
                .socket_path
                .as_ref()
                .map(PathBuf::from)
                .unwrap_or_else(|| paths::socket_path(project_key));
            Endpoint::Unix(path)
        } else {
            Endpoint::Tcp {
                host: config.tcp_host.clone(),
                port: config.tcp_port,
            }
        }
    }

    pub fn describe(&self) -> String {
        match self {
            Endpoint::Unix(path) => format!("unix:{}", path.display()),
            Endpoint::Tcp { host, port } => format!("tcp:{host}:{port}"),
        }
    }
}
