//! `StorageEngine` — single writer connection to a project's SQLite
//! database, implementing `StorageAdapter`. Runs migrations and applies
//! pragmas on open. Single-writer: mutating calls serialize through the
//! `Mutex`; the daemon is the only process that should hold a write handle
//! (see `swarmcell-daemon`).

use std::path::Path;
use std::sync::Mutex;
use std::time::Instant;

use rusqlite::Connection;
use tracing::warn;

use swarmcell_core::errors::{SwarmError, SwarmResult};
use swarmcell_core::traits::{StorageAdapter, WalStats};

use crate::migrations;

/// Queries slower than this are logged at `warn`, naming the operation.
const SLOW_QUERY_MS: u128 = 100;

pub struct StorageEngine {
    conn: Mutex<Connection>,
    interrupt: rusqlite::InterruptHandle,
}

impl StorageEngine {
    /// Open a file-backed engine at `path`, applying pragmas and running
    /// pending migrations.
    pub fn open(path: &Path) -> SwarmResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        Self::initialize(conn)
    }

    /// Open an in-memory engine (used by tests).
    pub fn open_in_memory() -> SwarmResult<Self> {
        let conn = Connection::open_in_memory()?;
        Self::initialize(conn)
    }

    fn initialize(conn: Connection) -> SwarmResult<Self> {
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
            PRAGMA busy_timeout = 5000;
            ",
        )?;

        let fk_enabled: i64 = conn.pragma_query_value(None, "foreign_keys", |row| row.get(0))?;
        if fk_enabled != 1 {
            return Err(SwarmError::Corruption {
                detail: "engine failed to enable foreign-key enforcement at open".to_string(),
            });
        }

        migrations::run_migrations(&conn).map_err(|e| SwarmError::Corruption {
            detail: format!("migrations failed: {e}"),
        })?;

        let interrupt = conn.get_interrupt_handle();

        Ok(Self {
            conn: Mutex::new(conn),
            interrupt,
        })
    }

    fn with_timing<T>(&self, op: &str, f: impl FnOnce(&Connection) -> SwarmResult<T>) -> SwarmResult<T> {
        let guard = self.conn.lock().expect("storage mutex poisoned");
        let started = Instant::now();
        let result = f(&guard);
        let elapsed = started.elapsed().as_millis();
        if elapsed > SLOW_QUERY_MS {
            warn!(op, elapsed_ms = elapsed, "slow query");
        }
        result
    }
}

impl StorageAdapter for StorageEngine {
    fn query<T, F>(&self, f: F) -> SwarmResult<T>
    where
        F: FnOnce(&Connection) -> SwarmResult<T>,
    {
        self.with_timing("query", f)
    }

    fn exec<T, F>(&self, f: F) -> SwarmResult<T>
    where
        F: FnOnce(&Connection) -> SwarmResult<T>,
    {
        self.with_timing("exec", f)
    }

    fn transaction<T, F>(&self, f: F) -> SwarmResult<T>
    where
        F: FnOnce(&Connection) -> SwarmResult<T>,
    {
        self.with_timing("transaction", |conn| {
            conn.execute_batch("BEGIN IMMEDIATE")?;
            match f(conn) {
                Ok(value) => {
                    conn.execute_batch("COMMIT")?;
                    Ok(value)
                }
                Err(e) => {
                    let _ = conn.execute_batch("ROLLBACK");
                    Err(e)
                }
            }
        })
    }

    fn checkpoint(&self) -> SwarmResult<()> {
        let guard = self.conn.lock().expect("storage mutex poisoned");
        guard.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
        Ok(())
    }

    fn close(&self) -> SwarmResult<()> {
        // Best-effort: ensure the WAL is flushed before the connection drops.
        if let Err(e) = self.checkpoint() {
            warn!(error = %e, "checkpoint on close failed");
        }
        Ok(())
    }

    fn wal_stats(&self) -> SwarmResult<WalStats> {
        let guard = self.conn.lock().expect("storage mutex poisoned");
        let (total, checkpointed): (i64, i64) = guard
            .query_row("PRAGMA wal_checkpoint(PASSIVE);", [], |row| {
                Ok((row.get(1)?, row.get(2)?))
            })
            .unwrap_or((0, 0));
        let wal_size_bytes = guard
            .path()
            .map(|p| p.to_string_lossy().into_owned() + "-wal")
            .and_then(|p| std::fs::metadata(p).ok())
            .map(|m| m.len())
            .unwrap_or(0);
        Ok(WalStats {
            wal_size_bytes,
            checkpointed_frames: checkpointed,
            total_frames: total,
        })
    }

    fn interrupt(&self) {
        self.interrupt.interrupt();
    }
}
