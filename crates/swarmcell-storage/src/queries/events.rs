//! The append-only event log. `append_event` assigns the next monotonic
//! per-project sequence number inside the caller's transaction so interleaved
//! writers never collide (spec.md §3: sequence is assigned at append time,
//! never client-supplied).

use rusqlite::{params, Connection};

use swarmcell_core::errors::SwarmResult;
use swarmcell_core::model::{Event, EventType};

pub fn append_event(
    conn: &Connection,
    project_key: &str,
    event_type: EventType,
    timestamp: i64,
    payload: &serde_json::Value,
) -> SwarmResult<Event> {
    let next_sequence: i64 = conn.query_row(
        "SELECT COALESCE(MAX(sequence), 0) + 1 FROM events WHERE project_key = ?1",
        params![project_key],
        |row| row.get(0),
    )?;
    let payload_json = serde_json::to_string(payload)?;
    conn.execute(
        "INSERT INTO events (project_key, sequence, event_type, timestamp, payload)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![project_key, next_sequence, event_type.as_str(), timestamp, payload_json],
    )?;
    Ok(Event {
        id: conn.last_insert_rowid(),
        project_key: project_key.to_string(),
        sequence: next_sequence,
        event_type: event_type.as_str().to_string(),
        timestamp,
        payload: payload.clone(),
    })
}

fn row_to_event(row: &rusqlite::Row) -> rusqlite::Result<Event> {
    let payload_json: String = row.get("payload")?;
    let payload = serde_json::from_str(&payload_json).unwrap_or(serde_json::Value::Null);
    Ok(Event {
        id: row.get("id")?,
        project_key: row.get("project_key")?,
        sequence: row.get("sequence")?,
        event_type: row.get("event_type")?,
        timestamp: row.get("timestamp")?,
        payload,
    })
}

pub fn list_events_since(conn: &Connection, project_key: &str, after_sequence: i64) -> SwarmResult<Vec<Event>> {
    let mut stmt = conn.prepare(
        "SELECT id, project_key, sequence, event_type, timestamp, payload FROM events
         WHERE project_key = ?1 AND sequence > ?2 ORDER BY sequence",
    )?;
    let rows = stmt
        .query_map(params![project_key, after_sequence], row_to_event)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn latest_sequence(conn: &Connection, project_key: &str) -> SwarmResult<i64> {
    let seq: i64 = conn.query_row(
        "SELECT COALESCE(MAX(sequence), 0) FROM events WHERE project_key = ?1",
        params![project_key],
        |row| row.get(0),
    )?;
    Ok(seq)
}
