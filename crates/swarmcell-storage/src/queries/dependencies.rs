//! CRUD over the `dependencies` edge table. Cycle enforcement lives in
//! `swarmcell-cells`, which loads the full blocking-edge set via
//! `list_blocking_edges` before mutating it.

use rusqlite::{params, Connection};

use swarmcell_core::errors::SwarmResult;
use swarmcell_core::model::{Dependency, DependencyKind};

pub fn insert_dependency(conn: &Connection, project_key: &str, dep: &Dependency) -> SwarmResult<()> {
    conn.execute(
        "INSERT OR IGNORE INTO dependencies (project_key, cell_id, depends_on_id, kind, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![project_key, dep.cell_id, dep.depends_on_id, dep.kind.as_str(), dep.created_at],
    )?;
    Ok(())
}

pub fn remove_dependency(
    conn: &Connection,
    project_key: &str,
    cell_id: &str,
    depends_on_id: &str,
    kind: DependencyKind,
) -> SwarmResult<()> {
    conn.execute(
        "DELETE FROM dependencies WHERE project_key = ?1 AND cell_id = ?2 AND depends_on_id = ?3 AND kind = ?4",
        params![project_key, cell_id, depends_on_id, kind.as_str()],
    )?;
    Ok(())
}

fn row_to_dependency(row: &rusqlite::Row) -> rusqlite::Result<Dependency> {
    let kind: String = row.get("kind")?;
    Ok(Dependency {
        cell_id: row.get("cell_id")?,
        depends_on_id: row.get("depends_on_id")?,
        kind: DependencyKind::parse(&kind).unwrap_or(DependencyKind::Related),
        created_at: row.get("created_at")?,
    })
}

pub fn list_dependencies(conn: &Connection, project_key: &str, cell_id: &str) -> SwarmResult<Vec<Dependency>> {
    let mut stmt = conn.prepare(
        "SELECT cell_id, depends_on_id, kind, created_at FROM dependencies
         WHERE project_key = ?1 AND cell_id = ?2",
    )?;
    let rows = stmt
        .query_map(params![project_key, cell_id], row_to_dependency)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn list_dependents(conn: &Connection, project_key: &str, depends_on_id: &str) -> SwarmResult<Vec<Dependency>> {
    let mut stmt = conn.prepare(
        "SELECT cell_id, depends_on_id, kind, created_at FROM dependencies
         WHERE project_key = ?1 AND depends_on_id = ?2",
    )?;
    let rows = stmt
        .query_map(params![project_key, depends_on_id], row_to_dependency)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Every `Blocks`/`BlockedBy` edge in the project, used to build the DAG
/// that must stay acyclic (see `swarmcell_cells::graph`).
pub fn list_blocking_edges(conn: &Connection, project_key: &str) -> SwarmResult<Vec<Dependency>> {
    let mut stmt = conn.prepare(
        "SELECT cell_id, depends_on_id, kind, created_at FROM dependencies
         WHERE project_key = ?1 AND kind IN ('blocks', 'blocked-by')",
    )?;
    let rows = stmt
        .query_map(params![project_key], row_to_dependency)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}
