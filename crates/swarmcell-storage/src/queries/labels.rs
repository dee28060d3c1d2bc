//! CRUD over the `labels` table.

use rusqlite::{params, Connection};

use swarmcell_core::errors::SwarmResult;
use swarmcell_core::model::Label;

pub fn add_label(conn: &Connection, project_key: &str, label: &Label) -> SwarmResult<()> {
    conn.execute(
        "INSERT OR IGNORE INTO labels (project_key, cell_id, label, created_at) VALUES (?1, ?2, ?3, ?4)",
        params![project_key, label.cell_id, label.label, label.created_at],
    )?;
    Ok(())
}

pub fn remove_label(conn: &Connection, project_key: &str, cell_id: &str, label: &str) -> SwarmResult<()> {
    conn.execute(
        "DELETE FROM labels WHERE project_key = ?1 AND cell_id = ?2 AND label = ?3",
        params![project_key, cell_id, label],
    )?;
    Ok(())
}

pub fn list_labels(conn: &Connection, project_key: &str, cell_id: &str) -> SwarmResult<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT label FROM labels WHERE project_key = ?1 AND cell_id = ?2 ORDER BY label",
    )?;
    let rows = stmt
        .query_map(params![project_key, cell_id], |row| row.get::<_, String>(0))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}
