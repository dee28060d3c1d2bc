//! Embedding rows backing the doctor's stale-embeddings repair check. A row
//! is stale if its vector is `NULL` or its declared dimension disagrees with
//! the configured embedding width.

use rusqlite::{params, Connection};

use swarmcell_core::errors::SwarmResult;

pub struct MemoryRow {
    pub entity_kind: String,
    pub entity_id: String,
    pub embedding_dim: Option<i64>,
}

pub fn upsert_embedding(
    conn: &Connection,
    project_key: &str,
    entity_kind: &str,
    entity_id: &str,
    embedding: &[u8],
    embedding_dim: i64,
    now: i64,
) -> SwarmResult<()> {
    conn.execute(
        "INSERT INTO memories (project_key, entity_kind, entity_id, embedding, embedding_dim, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)
         ON CONFLICT(project_key, entity_kind, entity_id)
         DO UPDATE SET embedding = excluded.embedding, embedding_dim = excluded.embedding_dim, updated_at = excluded.updated_at",
        params![project_key, entity_kind, entity_id, embedding, embedding_dim, now],
    )?;
    Ok(())
}

/// Rows whose `embedding` is `NULL` or `embedding_dim` disagrees with
/// `expected_dim`.
pub fn list_stale(conn: &Connection, project_key: &str, expected_dim: i64) -> SwarmResult<Vec<MemoryRow>> {
    let mut stmt = conn.prepare(
        "SELECT entity_kind, entity_id, embedding_dim FROM memories
         WHERE project_key = ?1 AND (embedding IS NULL OR embedding_dim IS NULL OR embedding_dim != ?2)",
    )?;
    let rows = stmt
        .query_map(params![project_key, expected_dim], |row| {
            Ok(MemoryRow {
                entity_kind: row.get(0)?,
                entity_id: row.get(1)?,
                embedding_dim: row.get(2)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Removes a row outright — used when a stale embedding cannot be repaired
/// (no embedder wired in, or the embed call failed) so it doesn't keep
/// matching `list_stale` forever.
pub fn delete_memory(conn: &Connection, project_key: &str, entity_kind: &str, entity_id: &str) -> SwarmResult<()> {
    conn.execute(
        "DELETE FROM memories WHERE project_key = ?1 AND entity_kind = ?2 AND entity_id = ?3",
        params![project_key, entity_kind, entity_id],
    )?;
    Ok(())
}
