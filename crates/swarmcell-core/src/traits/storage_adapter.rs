//! The narrow storage seam. `swarmcell-storage::StorageEngine` implements
//! this directly against a local `rusqlite::Connection`; a future networked
//! client would implement it against the daemon socket. Everything above
//! this trait — the cell store, the mail bus, doctor, export — is written
//! against `StorageAdapter` alone so both paths are identical above the
//! transport (mirrors the teacher's "two implementations, one trait" note).

use rusqlite::Connection;

use crate::errors::SwarmResult;

/// WAL checkpoint and size statistics, used by the storage-health check and
/// by doctor's DB-integrity check.
#[derive(Debug, Clone, Default)]
pub struct WalStats {
    pub wal_size_bytes: u64,
    pub checkpointed_frames: i64,
    pub total_frames: i64,
}

pub trait StorageAdapter: Send + Sync {
    /// Run a read-only query against the live connection.
    fn query<T, F>(&self, f: F) -> SwarmResult<T>
    where
        F: FnOnce(&Connection) -> SwarmResult<T>;

    /// Run a single mutating statement or batch against the live connection.
    fn exec<T, F>(&self, f: F) -> SwarmResult<T>
    where
        F: FnOnce(&Connection) -> SwarmResult<T>;

    /// Run `f` inside a `BEGIN IMMEDIATE` / `COMMIT` transaction. Rolled back
    /// on error or panic unwinding through `f`.
    fn transaction<T, F>(&self, f: F) -> SwarmResult<T>
    where
        F: FnOnce(&Connection) -> SwarmResult<T>;

    /// Force a WAL checkpoint (`PRAGMA wal_checkpoint(TRUNCATE)`).
    fn checkpoint(&self) -> SwarmResult<()>;

    /// Close the underlying connection. Best-effort; safe to call twice.
    fn close(&self) -> SwarmResult<()>;

    /// Current WAL size and checkpoint progress.
    fn wal_stats(&self) -> SwarmResult<WalStats>;

    /// `true` if the WAL has grown past `threshold_mb` without a checkpoint.
    fn check_wal_health(&self, threshold_mb: u64) -> SwarmResult<bool> {
        let stats = self.wal_stats()?;
        Ok(stats.wal_size_bytes > threshold_mb * 1_048_576)
    }

    /// Aborts whatever statement is currently running against this
    /// connection, from any thread. Used to enforce per-operation deadlines:
    /// a caller that gives up waiting on `query`/`exec`/`transaction` calls
    /// this so the in-flight call returns an error instead of completing
    /// (and `transaction` rolls back) after the deadline has already been
    /// reported to the client.
    fn interrupt(&self);
}
