pub mod daemon_config;
pub mod doctor_config;
pub mod reservation_config;

use serde::{Deserialize, Serialize};

pub use daemon_config::DaemonConfig;
pub use doctor_config::DoctorConfig;
pub use reservation_config::ReservationConfig;

/// Top-level configuration aggregating all subsystem configs. Loaded from a
/// project-level `swarm.toml`; every field defaults so a missing or partial
/// file is never an error.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct SwarmConfig {
    pub daemon: DaemonConfig,
    pub doctor: DoctorConfig,
    pub reservation: ReservationConfig,
}

impl SwarmConfig {
    /// Load config from a TOML string, falling back to defaults for missing
    /// fields.
    pub fn from_toml(toml_str: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(toml_str)
    }

    /// Load from disk if present, otherwise defaults. Missing file is not an
    /// error — only a malformed one is. Environment variables (spec.md §6)
    /// are then layered on top, taking precedence over the file.
    pub fn load(path: &std::path::Path) -> crate::errors::SwarmResult<Self> {
        let mut config = match std::fs::read_to_string(path) {
            Ok(content) => Self::from_toml(&content)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Self::default(),
            Err(e) => return Err(e.into()),
        };
        config.apply_env_overrides();
        Ok(config)
    }

    /// Applies the `SWARMCELL_*` environment variable overrides spec.md §6
    /// names: socket mode opt-out, socket path, TCP host/port. Unset or
    /// unparseable variables leave the existing value untouched.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("SWARMCELL_SOCKET") {
            if let Ok(enabled) = v.parse::<bool>() {
                self.daemon.socket_enabled = enabled;
            }
        }
        if let Ok(path) = std::env::var("SWARMCELL_SOCKET_PATH") {
            self.daemon.socket_path = Some(path);
        }
        if let Ok(host) = std::env::var("SWARMCELL_TCP_HOST") {
            self.daemon.tcp_host = host;
        }
        if let Ok(port) = std::env::var("SWARMCELL_TCP_PORT") {
            if let Ok(port) = port.parse::<u16>() {
                self.daemon.tcp_port = port;
            }
        }
    }
}

/// `SWARMCELL_DB_PATH` test override for the database path, checked by
/// callers before falling back to `paths::global_db_path()`.
pub fn db_path_override() -> Option<std::path::PathBuf> {
    std::env::var("SWARMCELL_DB_PATH").ok().map(std::path::PathBuf::from)
}
