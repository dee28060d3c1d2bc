//! Mailbox (messages + recipients) and file reservations (spec.md §5).

use rusqlite::{params, Connection, OptionalExtension};

use swarmcell_core::errors::SwarmResult;
use swarmcell_core::model::{Importance, Message, Recipient, Reservation};

pub fn insert_message(conn: &Connection, project_key: &str, msg: &Message, recipients: &[String]) -> SwarmResult<i64> {
    conn.execute(
        "INSERT INTO messages (project_key, from_agent, subject, body, thread_id, importance, ack_required, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            project_key,
            msg.from_agent,
            msg.subject,
            msg.body,
            msg.thread_id,
            msg.importance.as_str(),
            msg.ack_required as i32,
            msg.created_at,
        ],
    )?;
    let message_id = conn.last_insert_rowid();
    for agent_name in recipients {
        conn.execute(
            "INSERT INTO recipients (message_id, project_key, agent_name) VALUES (?1, ?2, ?3)",
            params![message_id, project_key, agent_name],
        )?;
    }
    Ok(message_id)
}

fn row_to_message(row: &rusqlite::Row) -> rusqlite::Result<Message> {
    let importance: String = row.get("importance")?;
    Ok(Message {
        id: row.get("id")?,
        project_key: row.get("project_key")?,
        from_agent: row.get("from_agent")?,
        subject: row.get("subject")?,
        body: row.get("body")?,
        thread_id: row.get("thread_id")?,
        importance: Importance::parse(&importance).unwrap_or(Importance::Normal),
        ack_required: row.get::<_, i64>("ack_required")? != 0,
        created_at: row.get("created_at")?,
    })
}

/// Unread messages addressed to `agent_name`, oldest first.
pub fn inbox(conn: &Connection, project_key: &str, agent_name: &str) -> SwarmResult<Vec<Message>> {
    let mut stmt = conn.prepare(
        "SELECT m.id, m.project_key, m.from_agent, m.subject, m.body, m.thread_id,
                m.importance, m.ack_required, m.created_at
         FROM messages m
         JOIN recipients r ON r.message_id = m.id AND r.project_key = m.project_key
         WHERE m.project_key = ?1 AND r.agent_name = ?2 AND r.read_at IS NULL
         ORDER BY m.created_at",
    )?;
    let rows = stmt
        .query_map(params![project_key, agent_name], row_to_message)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn thread_messages(conn: &Connection, project_key: &str, thread_id: &str) -> SwarmResult<Vec<Message>> {
    let mut stmt = conn.prepare(
        "SELECT id, project_key, from_agent, subject, body, thread_id, importance, ack_required, created_at
         FROM messages WHERE project_key = ?1 AND thread_id = ?2 ORDER BY created_at",
    )?;
    let rows = stmt
        .query_map(params![project_key, thread_id], row_to_message)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn mark_read(conn: &Connection, project_key: &str, message_id: i64, agent_name: &str, now: i64) -> SwarmResult<()> {
    conn.execute(
        "UPDATE recipients SET read_at = ?4 WHERE project_key = ?1 AND message_id = ?2 AND agent_name = ?3 AND read_at IS NULL",
        params![project_key, message_id, agent_name, now],
    )?;
    Ok(())
}

pub fn ack_message(conn: &Connection, project_key: &str, message_id: i64, agent_name: &str, now: i64) -> SwarmResult<()> {
    conn.execute(
        "UPDATE recipients SET acked_at = ?4 WHERE project_key = ?1 AND message_id = ?2 AND agent_name = ?3",
        params![project_key, message_id, agent_name, now],
    )?;
    Ok(())
}

pub fn get_recipient(conn: &Connection, project_key: &str, message_id: i64, agent_name: &str) -> SwarmResult<Option<Recipient>> {
    conn.query_row(
        "SELECT message_id, agent_name, read_at, acked_at FROM recipients
         WHERE project_key = ?1 AND message_id = ?2 AND agent_name = ?3",
        params![project_key, message_id, agent_name],
        |row| {
            Ok(Recipient {
                message_id: row.get(0)?,
                agent_name: row.get(1)?,
                read_at: row.get(2)?,
                acked_at: row.get(3)?,
            })
        },
    )
    .optional()
    .map_err(Into::into)
}

/// Recipients of a message still owing an ack (ack required, not yet acked).
pub fn pending_acks(conn: &Connection, project_key: &str, message_id: i64) -> SwarmResult<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT agent_name FROM recipients WHERE project_key = ?1 AND message_id = ?2 AND acked_at IS NULL",
    )?;
    let rows = stmt
        .query_map(params![project_key, message_id], |row| row.get::<_, String>(0))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

fn row_to_reservation(row: &rusqlite::Row) -> rusqlite::Result<Reservation> {
    Ok(Reservation {
        id: row.get("id")?,
        project_key: row.get("project_key")?,
        agent_name: row.get("agent_name")?,
        path_pattern: row.get("path_pattern")?,
        exclusive: row.get::<_, i64>("exclusive")? != 0,
        created_at: row.get("created_at")?,
        expires_at: row.get("expires_at")?,
    })
}

pub fn insert_reservation(conn: &Connection, reservation: &Reservation) -> SwarmResult<i64> {
    conn.execute(
        "INSERT INTO reservations (project_key, agent_name, path_pattern, exclusive, created_at, expires_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            reservation.project_key,
            reservation.agent_name,
            reservation.path_pattern,
            reservation.exclusive as i32,
            reservation.created_at,
            reservation.expires_at,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn release_reservation(conn: &Connection, project_key: &str, reservation_id: i64) -> SwarmResult<()> {
    conn.execute(
        "DELETE FROM reservations WHERE project_key = ?1 AND id = ?2",
        params![project_key, reservation_id],
    )?;
    Ok(())
}

/// All reservations not yet expired as of `now` — the set checked for
/// overlap before granting a new one.
pub fn list_active_reservations(conn: &Connection, project_key: &str, now: i64) -> SwarmResult<Vec<Reservation>> {
    let mut stmt = conn.prepare(
        "SELECT id, project_key, agent_name, path_pattern, exclusive, created_at, expires_at
         FROM reservations WHERE project_key = ?1 AND expires_at > ?2",
    )?;
    let rows = stmt
        .query_map(params![project_key, now], row_to_reservation)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Every reservation regardless of expiry — the doctor's stale-reservations
/// check needs the expired ones too, which `list_active_reservations`
/// filters out.
pub fn list_all_reservations(conn: &Connection, project_key: &str) -> SwarmResult<Vec<Reservation>> {
    let mut stmt = conn.prepare(
        "SELECT id, project_key, agent_name, path_pattern, exclusive, created_at, expires_at
         FROM reservations WHERE project_key = ?1",
    )?;
    let rows = stmt
        .query_map(params![project_key], row_to_reservation)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Deletes every reservation expired as of `now`; returns how many were
/// reaped (used by the doctor's stale-reservations check).
pub fn reap_expired_reservations(conn: &Connection, project_key: &str, now: i64) -> SwarmResult<usize> {
    let count = conn.execute(
        "DELETE FROM reservations WHERE project_key = ?1 AND expires_at <= ?2",
        params![project_key, now],
    )?;
    Ok(count)
}
