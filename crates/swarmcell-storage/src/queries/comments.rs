//! CRUD over the `comments` table.

use rusqlite::{params, Connection};

use swarmcell_core::errors::SwarmResult;
use swarmcell_core::model::Comment;

pub fn add_comment(conn: &Connection, project_key: &str, cell_id: &str, author: &str, text: &str, created_at: i64) -> SwarmResult<i64> {
    conn.execute(
        "INSERT INTO comments (project_key, cell_id, author, text, created_at) VALUES (?1, ?2, ?3, ?4, ?5)",
        params![project_key, cell_id, author, text, created_at],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn list_comments(conn: &Connection, project_key: &str, cell_id: &str) -> SwarmResult<Vec<Comment>> {
    let mut stmt = conn.prepare(
        "SELECT id, cell_id, author, text, created_at FROM comments
         WHERE project_key = ?1 AND cell_id = ?2 ORDER BY created_at, id",
    )?;
    let rows = stmt
        .query_map(params![project_key, cell_id], |row| {
            Ok(Comment {
                id: row.get(0)?,
                cell_id: row.get(1)?,
                author: row.get(2)?,
                text: row.get(3)?,
                created_at: row.get(4)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}
