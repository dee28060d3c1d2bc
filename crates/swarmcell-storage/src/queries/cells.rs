//! CRUD and readiness queries over the `cells` table.

use rusqlite::{params, Connection, OptionalExtension, Row};

use swarmcell_core::errors::SwarmResult;
use swarmcell_core::model::{Cell, CellStatus, CellType};

fn row_to_cell(row: &Row) -> rusqlite::Result<Cell> {
    let cell_type: String = row.get("cell_type")?;
    let status: String = row.get("status")?;
    Ok(Cell {
        id: row.get("id")?,
        project_key: row.get("project_key")?,
        title: row.get("title")?,
        description: row.get("description")?,
        cell_type: CellType::parse(&cell_type).unwrap_or(CellType::Task),
        status: CellStatus::parse(&status).unwrap_or(CellStatus::Open),
        priority: row.get("priority")?,
        parent_id: row.get("parent_id")?,
        assignee: row.get("assignee")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
        closed_at: row.get("closed_at")?,
        closed_reason: row.get("closed_reason")?,
        deleted_at: row.get("deleted_at")?,
        deleted_by: row.get("deleted_by")?,
        delete_reason: row.get("delete_reason")?,
        created_by: row.get("created_by")?,
        result: row.get("result")?,
        result_at: row.get("result_at")?,
    })
}

const SELECT_COLUMNS: &str = "id, project_key, title, description, cell_type, status, priority,
    parent_id, assignee, created_at, updated_at, closed_at, closed_reason,
    deleted_at, deleted_by, delete_reason, created_by, result, result_at";

pub fn insert_cell(conn: &Connection, cell: &Cell) -> SwarmResult<()> {
    conn.execute(
        &format!(
            "INSERT INTO cells ({SELECT_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19)"
        ),
        params![
            cell.id,
            cell.project_key,
            cell.title,
            cell.description,
            cell.cell_type.as_str(),
            cell.status.as_str(),
            cell.priority,
            cell.parent_id,
            cell.assignee,
            cell.created_at,
            cell.updated_at,
            cell.closed_at,
            cell.closed_reason,
            cell.deleted_at,
            cell.deleted_by,
            cell.delete_reason,
            cell.created_by,
            cell.result,
            cell.result_at,
        ],
    )?;
    Ok(())
}

pub fn get_cell(conn: &Connection, project_key: &str, id: &str) -> SwarmResult<Option<Cell>> {
    conn.query_row(
        &format!("SELECT {SELECT_COLUMNS} FROM cells WHERE project_key = ?1 AND id = ?2"),
        params![project_key, id],
        row_to_cell,
    )
    .optional()
    .map_err(Into::into)
}

/// Resolves a possibly-partial id to exactly one matching cell id. Returns
/// all matches; callers decide between exact-hit, unique-prefix, and
/// `SwarmError::AmbiguousId`.
pub fn find_ids_by_prefix(conn: &Connection, project_key: &str, prefix: &str) -> SwarmResult<Vec<String>> {
    let mut stmt = conn.prepare("SELECT id FROM cells WHERE project_key = ?1 AND id LIKE ?2 || '%'")?;
    let rows = stmt
        .query_map(params![project_key, prefix], |row| row.get::<_, String>(0))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn update_cell(conn: &Connection, cell: &Cell) -> SwarmResult<()> {
    conn.execute(
        "UPDATE cells SET title = ?3, description = ?4, cell_type = ?5, status = ?6,
            priority = ?7, parent_id = ?8, assignee = ?9, updated_at = ?10,
            closed_at = ?11, closed_reason = ?12, deleted_at = ?13, deleted_by = ?14,
            delete_reason = ?15, created_by = ?16, result = ?17, result_at = ?18
         WHERE project_key = ?1 AND id = ?2",
        params![
            cell.project_key,
            cell.id,
            cell.title,
            cell.description,
            cell.cell_type.as_str(),
            cell.status.as_str(),
            cell.priority,
            cell.parent_id,
            cell.assignee,
            cell.updated_at,
            cell.closed_at,
            cell.closed_reason,
            cell.deleted_at,
            cell.deleted_by,
            cell.delete_reason,
            cell.created_by,
            cell.result,
            cell.result_at,
        ],
    )?;
    Ok(())
}

pub fn list_cells(conn: &Connection, project_key: &str) -> SwarmResult<Vec<Cell>> {
    let mut stmt = conn.prepare(&format!("SELECT {SELECT_COLUMNS} FROM cells WHERE project_key = ?1"))?;
    let rows = stmt
        .query_map(params![project_key], row_to_cell)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn list_children(conn: &Connection, project_key: &str, parent_id: &str) -> SwarmResult<Vec<Cell>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {SELECT_COLUMNS} FROM cells WHERE project_key = ?1 AND parent_id = ?2"
    ))?;
    let rows = stmt
        .query_map(params![project_key, parent_id], row_to_cell)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn list_by_status(conn: &Connection, project_key: &str, status: CellStatus) -> SwarmResult<Vec<Cell>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {SELECT_COLUMNS} FROM cells WHERE project_key = ?1 AND status = ?2"
    ))?;
    let rows = stmt
        .query_map(params![project_key, status.as_str()], row_to_cell)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn mark_dirty(conn: &Connection, project_key: &str, cell_id: &str, now: i64) -> SwarmResult<()> {
    conn.execute(
        "INSERT INTO dirty_cells (project_key, cell_id, marked_at) VALUES (?1, ?2, ?3)
         ON CONFLICT(project_key, cell_id) DO UPDATE SET marked_at = excluded.marked_at",
        params![project_key, cell_id, now],
    )?;
    Ok(())
}

pub fn list_dirty(conn: &Connection, project_key: &str) -> SwarmResult<Vec<String>> {
    let mut stmt = conn.prepare("SELECT cell_id FROM dirty_cells WHERE project_key = ?1")?;
    let rows = stmt
        .query_map(params![project_key], |row| row.get::<_, String>(0))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn clear_dirty(conn: &Connection, project_key: &str, cell_ids: &[String]) -> SwarmResult<()> {
    for id in cell_ids {
        conn.execute(
            "DELETE FROM dirty_cells WHERE project_key = ?1 AND cell_id = ?2",
            params![project_key, id],
        )?;
    }
    Ok(())
}

pub fn upsert_blocked_cache(
    conn: &Connection,
    project_key: &str,
    cell_id: &str,
    blocker_ids_json: &str,
    now: i64,
) -> SwarmResult<()> {
    conn.execute(
        "INSERT INTO blocked_cells_cache (project_key, cell_id, blocker_ids, updated_at)
         VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT(project_key, cell_id) DO UPDATE SET blocker_ids = excluded.blocker_ids, updated_at = excluded.updated_at",
        params![project_key, cell_id, blocker_ids_json, now],
    )?;
    Ok(())
}

pub fn clear_blocked_cache(conn: &Connection, project_key: &str, cell_id: &str) -> SwarmResult<()> {
    conn.execute(
        "DELETE FROM blocked_cells_cache WHERE project_key = ?1 AND cell_id = ?2",
        params![project_key, cell_id],
    )?;
    Ok(())
}

/// Cached content hash of the last exported/imported canonical record, used
/// by the importer to skip re-applying an unchanged row.
pub fn get_content_hash(conn: &Connection, project_key: &str, id: &str) -> SwarmResult<Option<String>> {
    conn.query_row(
        "SELECT content_hash FROM cells WHERE project_key = ?1 AND id = ?2",
        params![project_key, id],
        |row| row.get(0),
    )
    .optional()
    .map_err(Into::into)
}

pub fn set_content_hash(conn: &Connection, project_key: &str, id: &str, hash: &str) -> SwarmResult<()> {
    conn.execute(
        "UPDATE cells SET content_hash = ?3 WHERE project_key = ?1 AND id = ?2",
        params![project_key, id, hash],
    )?;
    Ok(())
}
