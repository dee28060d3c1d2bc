//! Numbered, idempotent, transactional schema migrations. Each migration is
//! applied at most once and recorded in `schema_version`; a partially-applied
//! migration rolls back and surfaces as `SwarmError::Corruption` to the
//! caller (see `StorageEngine::initialize`).

mod repair;
mod v001_cells;
mod v002_events;
mod v003_mail;
mod v004_decisions;

use rusqlite::Connection;
use tracing::{debug, info};

pub use repair::{repair_stale_embeddings, RepairReport};

type MigrationFn = fn(&Connection) -> rusqlite::Result<()>;

/// `(version, description, up, down)`, applied in order. `down` is
/// forward-only in production (see `run_migrations`); it exists so tests can
/// verify each migration's schema is fully reversible.
const MIGRATIONS: &[(u32, &str, MigrationFn, MigrationFn)] = &[
    (1, "cells, dependencies, labels, comments, caches", v001_cells::migrate, v001_cells::down),
    (2, "event log", v002_events::migrate, v002_events::down),
    (3, "agents, mailbox, reservations", v003_mail::migrate, v003_mail::down),
    (4, "decision traces, entity links, memories", v004_decisions::migrate, v004_decisions::down),
];

pub const LATEST_VERSION: u32 = MIGRATIONS.len() as u32;

fn ensure_schema_version_table(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version      INTEGER PRIMARY KEY,
            description  TEXT NOT NULL,
            applied_at   INTEGER NOT NULL DEFAULT (strftime('%s', 'now'))
        );",
    )
}

pub fn current_version(conn: &Connection) -> rusqlite::Result<u32> {
    ensure_schema_version_table(conn)?;
    conn.query_row("SELECT COALESCE(MAX(version), 0) FROM schema_version", [], |row| {
        row.get(0)
    })
}

/// Applies every migration whose version is greater than the current one,
/// each in its own transaction. Returns the resulting schema version.
pub fn run_migrations(conn: &Connection) -> rusqlite::Result<u32> {
    let mut version = current_version(conn)?;
    if version == LATEST_VERSION {
        debug!(version, "schema already current");
        return Ok(version);
    }

    for (migration_version, description, migrate, _down) in MIGRATIONS {
        if *migration_version <= version {
            continue;
        }
        conn.execute_batch("BEGIN IMMEDIATE")?;
        match migrate(conn).and_then(|()| {
            conn.execute(
                "INSERT INTO schema_version (version, description) VALUES (?1, ?2)",
                (migration_version, description),
            )
        }) {
            Ok(_) => {
                conn.execute_batch("COMMIT")?;
                info!(version = migration_version, description, "migration applied");
                version = *migration_version;
            }
            Err(e) => {
                let _ = conn.execute_batch("ROLLBACK");
                return Err(e);
            }
        }
    }

    Ok(version)
}

/// Runs every migration's `down` in reverse order, dropping the schema back
/// to empty. Test-only: production never downgrades a live database.
pub fn rollback_all(conn: &Connection) -> rusqlite::Result<()> {
    for (_version, description, _migrate, down) in MIGRATIONS.iter().rev() {
        conn.execute_batch("BEGIN IMMEDIATE")?;
        match down(conn) {
            Ok(()) => conn.execute_batch("COMMIT")?,
            Err(e) => {
                let _ = conn.execute_batch("ROLLBACK");
                return Err(e);
            }
        }
        debug!(description, "migration rolled back");
    }
    conn.execute_batch("DELETE FROM schema_version;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn migrates_fresh_db_to_latest_and_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("PRAGMA foreign_keys = ON;").unwrap();
        let v1 = run_migrations(&conn).unwrap();
        assert_eq!(v1, LATEST_VERSION);
        let v2 = run_migrations(&conn).unwrap();
        assert_eq!(v2, LATEST_VERSION);
    }

    #[test]
    fn rollback_all_leaves_no_migration_tables_and_remigration_succeeds() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("PRAGMA foreign_keys = ON;").unwrap();
        run_migrations(&conn).unwrap();
        rollback_all(&conn).unwrap();

        assert_eq!(current_version(&conn).unwrap(), 0);
        let mut stmt = conn
            .prepare("SELECT name FROM sqlite_master WHERE type = 'table' AND name = 'cells'")
            .unwrap();
        assert!(!stmt.exists([]).unwrap());

        let v = run_migrations(&conn).unwrap();
        assert_eq!(v, LATEST_VERSION);
    }

    #[test]
    fn creates_expected_tables() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("PRAGMA foreign_keys = ON;").unwrap();
        run_migrations(&conn).unwrap();
        let mut stmt = conn
            .prepare("SELECT name FROM sqlite_master WHERE type = 'table' AND name = 'cells'")
            .unwrap();
        let found = stmt.exists([]).unwrap();
        assert!(found);
    }
}
