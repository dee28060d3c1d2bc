//! Agent registry: `register_agent` upserts on every heartbeat, so
//! `last_active_at` doubles as the liveness signal the doctor's ghost-worker
//! check reads.

use rusqlite::{params, Connection, OptionalExtension};

use swarmcell_core::errors::SwarmResult;
use swarmcell_core::model::Agent;

pub fn register_agent(conn: &Connection, project_key: &str, name: &str, now: i64) -> SwarmResult<Agent> {
    conn.execute(
        "INSERT INTO agents (project_key, name, registered_at, last_active_at)
         VALUES (?1, ?2, ?3, ?3)
         ON CONFLICT(project_key, name) DO UPDATE SET last_active_at = excluded.last_active_at",
        params![project_key, name, now],
    )?;
    Ok(Agent {
        project_key: project_key.to_string(),
        name: name.to_string(),
        registered_at: now,
        last_active_at: now,
    })
}

pub fn touch_agent(conn: &Connection, project_key: &str, name: &str, now: i64) -> SwarmResult<()> {
    conn.execute(
        "UPDATE agents SET last_active_at = ?3 WHERE project_key = ?1 AND name = ?2",
        params![project_key, name, now],
    )?;
    Ok(())
}

fn row_to_agent(row: &rusqlite::Row) -> rusqlite::Result<Agent> {
    Ok(Agent {
        project_key: row.get("project_key")?,
        name: row.get("name")?,
        registered_at: row.get("registered_at")?,
        last_active_at: row.get("last_active_at")?,
    })
}

pub fn get_agent(conn: &Connection, project_key: &str, name: &str) -> SwarmResult<Option<Agent>> {
    conn.query_row(
        "SELECT project_key, name, registered_at, last_active_at FROM agents
         WHERE project_key = ?1 AND name = ?2",
        params![project_key, name],
        row_to_agent,
    )
    .optional()
    .map_err(Into::into)
}

pub fn list_agents(conn: &Connection, project_key: &str) -> SwarmResult<Vec<Agent>> {
    let mut stmt = conn.prepare(
        "SELECT project_key, name, registered_at, last_active_at FROM agents WHERE project_key = ?1",
    )?;
    let rows = stmt
        .query_map(params![project_key], row_to_agent)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}
