//! Persisted-state layout (spec.md §6). The global database lives under a
//! well-known user config directory; legacy project-local databases are
//! migrated on first access and renamed with a `.migrated` suffix; ephemeral
//! daemon state (PID, socket) lives under a per-project temp directory keyed
//! by a short hash of the project path.

use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

pub const APP_NAME: &str = "swarmcell";

/// Legacy project-local database locations checked on first access, in
/// priority order. Each is migrated into the global store and renamed with
/// a `.migrated` suffix once consolidated.
pub const LEGACY_DB_PATHS: &[&str] = &[
    ".opencode/streams.db",
    ".opencode/swarm.db",
    ".hive/swarm-mail.db",
];

/// `~/.config/swarmcell/swarm.db` (or `$XDG_CONFIG_HOME/swarmcell/swarm.db`).
pub fn global_db_path() -> PathBuf {
    config_dir().join("swarm.db")
}

fn config_dir() -> PathBuf {
    if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        if !xdg.is_empty() {
            return PathBuf::from(xdg).join(APP_NAME);
        }
    }
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    PathBuf::from(home).join(".config").join(APP_NAME)
}

/// First 8 hex chars of SHA-256(project path) — used to namespace ephemeral
/// daemon state per project.
pub fn project_hash(project_key: &str) -> String {
    let digest = Sha256::digest(project_key.as_bytes());
    let hex = digest.iter().map(|b| format!("{b:02x}")).collect::<String>();
    hex[..8].to_string()
}

/// `$TMPDIR/swarmcell-<project-name>-<hash>/` — where the daemon's PID file
/// and socket live.
pub fn daemon_state_dir(project_key: &str) -> PathBuf {
    let tmp = std::env::var("TMPDIR").unwrap_or_else(|_| "/tmp".to_string());
    let name = Path::new(project_key)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("project");
    let hash = project_hash(project_key);
    PathBuf::from(tmp).join(format!("{APP_NAME}-{name}-{hash}"))
}

pub fn pid_path(project_key: &str) -> PathBuf {
    daemon_state_dir(project_key).join("daemon.pid")
}

pub fn socket_path(project_key: &str) -> PathBuf {
    daemon_state_dir(project_key).join("daemon.sock")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn project_hash_is_stable_and_8_hex_chars() {
        let h1 = project_hash("/home/user/repo");
        let h2 = project_hash("/home/user/repo");
        assert_eq!(h1, h2);
        assert_eq!(h1.len(), 8);
        assert!(h1.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn different_projects_hash_differently() {
        assert_ne!(project_hash("/a"), project_hash("/b"));
    }
}
