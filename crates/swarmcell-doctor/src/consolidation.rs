//! Stray-database detection and one-way consolidation into the global
//! store (spec.md §4.9). Grounded on `drift-core::workspace::monorepo` and
//! `::detect` for the "walk the tree, classify what's found" idiom
//! (generalized here from marker-*file* detection to marker-*path*
//! detection for `swarmcell_core::paths::LEGACY_DB_PATHS`), and on
//! `drift-core::workspace::destructive::perform_destructive_operation` for
//! the auto-backup-before-mutation guard, since consolidation is the one
//! operation in this system that rewrites another process's data wholesale.

use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use rusqlite::Connection;
use serde::Serialize;

use swarmcell_core::errors::SwarmResult;
use swarmcell_core::paths::LEGACY_DB_PATHS;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaEra {
    Modern,
    Legacy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StrayAction {
    Migrate,
    Skip,
}

#[derive(Debug, Clone, Serialize)]
pub struct StrayAnalysis {
    pub path: PathBuf,
    pub tables: Vec<String>,
    pub row_counts: Vec<(String, i64)>,
    pub era: SchemaEra,
    pub estimated_unique_rows: i64,
    pub action: StrayAction,
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MigrationLogEntry {
    pub table: String,
    pub rows_inserted: i64,
    pub rows_skipped_global_wins: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct MigrationReport {
    pub stray: PathBuf,
    pub log: Vec<MigrationLogEntry>,
    pub backup_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ConsolidationReport {
    pub analyzed: Vec<StrayAnalysis>,
    pub migrated: Vec<MigrationReport>,
}

pub struct ConsolidateOptions {
    pub yes: bool,
    pub interactive: bool,
}

/// Walks `project_root` for embedded coordination databases at well-known
/// legacy locations, skipping anything already marked `.migrated` or
/// carrying a `.backup-` marker.
pub fn detect_stray_databases(project_root: &Path) -> Vec<PathBuf> {
    LEGACY_DB_PATHS
        .iter()
        .map(|rel| project_root.join(rel))
        .filter(|path| path.is_file())
        .filter(|path| {
            let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
            !name.ends_with(".migrated") && !name.contains(".backup-")
        })
        .collect()
}

const MODERN_TABLES: &[&str] = &["cells", "messages", "agents", "reservations"];

/// Inspects a stray database's tables, row counts, and schema era, and
/// proposes a migrate/skip plan. `global` is consulted only to decide
/// whether the stray is already fully superseded (currently always
/// proposes `migrate` when any row exists — "skip" is reserved for empty
/// or already-fully-migrated strays).
pub fn analyze_stray(path: &Path, _global: &Path) -> SwarmResult<StrayAnalysis> {
    let conn = Connection::open(path)?;
    let tables = list_tables(&conn)?;

    let era = if MODERN_TABLES.iter().all(|t| tables.iter().any(|x| x == t)) {
        SchemaEra::Modern
    } else {
        SchemaEra::Legacy
    };

    let mut row_counts = Vec::new();
    let mut total_rows = 0i64;
    for table in &tables {
        let count: i64 = conn.query_row(&format!("SELECT COUNT(*) FROM \"{table}\""), [], |row| row.get(0))?;
        total_rows += count;
        row_counts.push((table.clone(), count));
    }

    let (action, reason) = if total_rows == 0 {
        (StrayAction::Skip, Some("no rows to migrate".to_string()))
    } else {
        (StrayAction::Migrate, None)
    };

    Ok(StrayAnalysis {
        path: path.to_path_buf(),
        tables,
        row_counts,
        era,
        estimated_unique_rows: total_rows,
        action,
        reason,
    })
}

fn list_tables(conn: &Connection) -> SwarmResult<Vec<String>> {
    let mut stmt = conn.prepare("SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%'")?;
    let rows = stmt.query_map([], |row| row.get::<_, String>(0))?.collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Copies `stray` to `<stray>.backup-<unix-ts>` unless `skip_backup`.
fn backup_stray(stray: &Path, now: i64, skip_backup: bool) -> SwarmResult<Option<PathBuf>> {
    if skip_backup {
        return Ok(None);
    }
    let backup_path = PathBuf::from(format!("{}.backup-{now}", stray.display()));
    std::fs::copy(stray, &backup_path)?;
    Ok(Some(backup_path))
}

/// One-way merge of `stray` into `global`: for each table present in both,
/// copies rows whose primary key is absent from `global` ("global wins" on
/// duplicates — a conflicting row already in `global` is never overwritten).
/// Marks the stray `.migrated` on success.
pub fn migrate_to_global(stray: &Path, global: &Path, skip_backup: bool) -> SwarmResult<MigrationReport> {
    let now = SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_secs() as i64).unwrap_or(0);
    let backup_path = backup_stray(stray, now, skip_backup)?;

    let stray_conn = Connection::open(stray)?;
    let mut global_conn = Connection::open(global)?;
    let tables = list_tables(&stray_conn)?;

    let mut log = Vec::new();
    let tx = global_conn.transaction()?;
    for table in &tables {
        if !MODERN_TABLES.contains(&table.as_str()) {
            continue;
        }
        let (inserted, skipped) = merge_table(&stray_conn, &tx, table)?;
        log.push(MigrationLogEntry { table: table.clone(), rows_inserted: inserted, rows_skipped_global_wins: skipped });
    }
    tx.commit()?;

    let migrated_path = PathBuf::from(format!("{}.migrated", stray.display()));
    std::fs::rename(stray, &migrated_path)?;

    Ok(MigrationReport { stray: stray.to_path_buf(), log, backup_path })
}

/// Copies every row of `table` from `stray` into `global` using
/// `INSERT OR IGNORE`, which leaves an existing `global` row untouched on a
/// primary-key collision — the "global wins" rule.
fn merge_table(stray: &Connection, global: &rusqlite::Transaction<'_>, table: &str) -> SwarmResult<(i64, i64)> {
    let columns = table_columns(stray, table)?;
    let column_list = columns.join(", ");
    let placeholders = (1..=columns.len()).map(|i| format!("?{i}")).collect::<Vec<_>>().join(", ");

    let mut select = stray.prepare(&format!("SELECT {column_list} FROM \"{table}\""))?;
    let mut insert = global.prepare(&format!("INSERT OR IGNORE INTO \"{table}\" ({column_list}) VALUES ({placeholders})"))?;

    let n = columns.len();
    let mut rows = select.query([])?;
    let mut inserted = 0i64;
    let mut skipped = 0i64;
    while let Some(row) = rows.next()? {
        let values: Vec<rusqlite::types::Value> = (0..n).map(|i| row.get_unwrap::<_, rusqlite::types::Value>(i)).collect();
        let changed = insert.execute(rusqlite::params_from_iter(values))?;
        if changed == 1 {
            inserted += 1;
        } else {
            skipped += 1;
        }
    }
    Ok((inserted, skipped))
}

fn table_columns(conn: &Connection, table: &str) -> SwarmResult<Vec<String>> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info(\"{table}\")"))?;
    let rows = stmt.query_map([], |row| row.get::<_, String>(1))?.collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Orchestrates detect -> analyze -> migrate -> mark-migrated across every
/// stray database under `root`. `opts.yes` bypasses the per-stray
/// confirmation that an interactive caller would otherwise gate on;
/// `opts.interactive` is advisory for callers that prompt themselves (the
/// CLI) and has no effect on the migration logic here.
pub fn consolidate_databases(root: &Path, global: &Path, opts: &ConsolidateOptions) -> SwarmResult<ConsolidationReport> {
    let strays = detect_stray_databases(root);
    let mut analyzed = Vec::new();
    let mut migrated = Vec::new();

    for stray in &strays {
        let analysis = analyze_stray(stray, global)?;
        let should_migrate = analysis.action == StrayAction::Migrate && (opts.yes || !opts.interactive);
        analyzed.push(analysis.clone());
        if should_migrate {
            migrated.push(migrate_to_global(stray, global, false)?);
        }
    }

    Ok(ConsolidationReport { analyzed, migrated })
}

#[cfg(test)]
mod tests {
    use super::*;
    use swarmcell_core::traits::StorageAdapter;
    use swarmcell_storage::StorageEngine;
    use tempfile::tempdir;

    fn seeded_db(path: &Path) {
        let engine = StorageEngine::open(path).unwrap();
        engine
            .exec(|conn| {
                conn.execute(
                    "INSERT INTO cells (project_key, id, title, cell_type, status, priority, created_at, updated_at)
                     VALUES ('p', 'c1', 'stray task', 'task', 'open', 1, 1, 1)",
                    [],
                )?;
                Ok(())
            })
            .unwrap();
        engine.close().unwrap();
    }

    #[test]
    fn detect_finds_legacy_paths_and_skips_migrated() {
        let dir = tempdir().unwrap();
        let legacy = dir.path().join(".opencode");
        std::fs::create_dir_all(&legacy).unwrap();
        std::fs::write(legacy.join("swarm.db"), b"").unwrap();
        std::fs::write(legacy.join("streams.db.migrated"), b"").unwrap();

        let found = detect_stray_databases(dir.path());
        assert_eq!(found.len(), 1);
        assert!(found[0].ends_with(".opencode/swarm.db"));
    }

    #[test]
    fn analyze_reports_modern_era_and_row_count() {
        let dir = tempdir().unwrap();
        let stray_path = dir.path().join("stray.db");
        seeded_db(&stray_path);

        let global_path = dir.path().join("global.db");
        let global = StorageEngine::open(&global_path).unwrap();
        global.close().unwrap();

        let analysis = analyze_stray(&stray_path, &global_path).unwrap();
        assert_eq!(analysis.era, SchemaEra::Modern);
        assert_eq!(analysis.action, StrayAction::Migrate);
        let cells_count = analysis.row_counts.iter().find(|(t, _)| t == "cells").unwrap().1;
        assert_eq!(cells_count, 1);
    }

    #[test]
    fn migrate_inserts_rows_and_marks_migrated() {
        let dir = tempdir().unwrap();
        let stray_path = dir.path().join("stray.db");
        seeded_db(&stray_path);

        let global_path = dir.path().join("global.db");
        let global = StorageEngine::open(&global_path).unwrap();
        global.close().unwrap();

        let report = migrate_to_global(&stray_path, &global_path, true).unwrap();
        assert!(report.backup_path.is_none());
        let cells_log = report.log.iter().find(|e| e.table == "cells").unwrap();
        assert_eq!(cells_log.rows_inserted, 1);
        assert!(!stray_path.exists());
        assert!(dir.path().join("stray.db.migrated").exists());

        let global = StorageEngine::open(&global_path).unwrap();
        let title: String = global
            .query(|conn| conn.query_row("SELECT title FROM cells WHERE id = 'c1'", [], |row| row.get(0)).map_err(Into::into))
            .unwrap();
        assert_eq!(title, "stray task");
    }

    #[test]
    fn global_wins_on_duplicate_primary_key() {
        let dir = tempdir().unwrap();
        let stray_path = dir.path().join("stray.db");
        seeded_db(&stray_path);

        let global_path = dir.path().join("global.db");
        let global = StorageEngine::open(&global_path).unwrap();
        global
            .exec(|conn| {
                conn.execute(
                    "INSERT INTO cells (project_key, id, title, cell_type, status, priority, created_at, updated_at)
                     VALUES ('p', 'c1', 'global task', 'task', 'open', 1, 1, 1)",
                    [],
                )?;
                Ok(())
            })
            .unwrap();
        global.close().unwrap();

        let report = migrate_to_global(&stray_path, &global_path, true).unwrap();
        let cells_log = report.log.iter().find(|e| e.table == "cells").unwrap();
        assert_eq!(cells_log.rows_inserted, 0);
        assert_eq!(cells_log.rows_skipped_global_wins, 1);

        let global = StorageEngine::open(&global_path).unwrap();
        let title: String = global
            .query(|conn| conn.query_row("SELECT title FROM cells WHERE id = 'c1'", [], |row| row.get(0)).map_err(Into::into))
            .unwrap();
        assert_eq!(title, "global task");
    }
}
