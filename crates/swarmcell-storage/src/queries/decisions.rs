//! Decision traces and their links to other entities (memories, patterns,
//! other decisions) — the reasoning audit trail behind an agent's choice.

use rusqlite::{params, Connection, OptionalExtension};

use swarmcell_core::errors::SwarmResult;
use swarmcell_core::model::{DecisionTrace, EntityKind, EntityLink};

pub fn insert_decision(conn: &Connection, decision: &DecisionTrace) -> SwarmResult<()> {
    let decision_json = serde_json::to_string(&decision.decision)?;
    let gathered_json = serde_json::to_string(&decision.gathered_inputs)?;
    let alternatives_json = serde_json::to_string(&decision.alternatives_considered)?;
    conn.execute(
        "INSERT INTO decision_traces (
            id, project_key, decision_type, epic_id, cell_id, agent_name,
            decision, rationale, gathered_inputs, alternatives_considered,
            outcome_event_id, quality_score, timestamp
         ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
        params![
            decision.id,
            decision.project_key,
            decision.decision_type,
            decision.epic_id,
            decision.cell_id,
            decision.agent_name,
            decision_json,
            decision.rationale,
            gathered_json,
            alternatives_json,
            decision.outcome_event_id,
            decision.quality_score,
            decision.timestamp,
        ],
    )?;
    Ok(())
}

fn row_to_decision(row: &rusqlite::Row) -> rusqlite::Result<DecisionTrace> {
    let decision: String = row.get("decision")?;
    let gathered: String = row.get("gathered_inputs")?;
    let alternatives: String = row.get("alternatives_considered")?;
    Ok(DecisionTrace {
        id: row.get("id")?,
        project_key: row.get("project_key")?,
        decision_type: row.get("decision_type")?,
        epic_id: row.get("epic_id")?,
        cell_id: row.get("cell_id")?,
        agent_name: row.get("agent_name")?,
        decision: serde_json::from_str(&decision).unwrap_or(serde_json::Value::Null),
        rationale: row.get("rationale")?,
        gathered_inputs: serde_json::from_str(&gathered).unwrap_or(serde_json::Value::Null),
        alternatives_considered: serde_json::from_str(&alternatives).unwrap_or(serde_json::Value::Null),
        outcome_event_id: row.get("outcome_event_id")?,
        quality_score: row.get("quality_score")?,
        timestamp: row.get("timestamp")?,
    })
}

pub fn get_decision(conn: &Connection, project_key: &str, id: &str) -> SwarmResult<Option<DecisionTrace>> {
    conn.query_row(
        "SELECT id, project_key, decision_type, epic_id, cell_id, agent_name, decision,
                rationale, gathered_inputs, alternatives_considered, outcome_event_id,
                quality_score, timestamp
         FROM decision_traces WHERE project_key = ?1 AND id = ?2",
        params![project_key, id],
        row_to_decision,
    )
    .optional()
    .map_err(Into::into)
}

pub fn list_decisions_for_cell(conn: &Connection, project_key: &str, cell_id: &str) -> SwarmResult<Vec<DecisionTrace>> {
    let mut stmt = conn.prepare(
        "SELECT id, project_key, decision_type, epic_id, cell_id, agent_name, decision,
                rationale, gathered_inputs, alternatives_considered, outcome_event_id,
                quality_score, timestamp
         FROM decision_traces WHERE project_key = ?1 AND cell_id = ?2 ORDER BY timestamp",
    )?;
    let rows = stmt
        .query_map(params![project_key, cell_id], row_to_decision)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn link_entity(
    conn: &Connection,
    project_key: &str,
    decision_id: &str,
    target_kind: EntityKind,
    target_id: &str,
    strength: f64,
) -> SwarmResult<i64> {
    conn.execute(
        "INSERT INTO entity_links (project_key, decision_id, target_kind, target_id, strength)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![project_key, decision_id, target_kind.as_str(), target_id, strength],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn list_links(conn: &Connection, project_key: &str, decision_id: &str) -> SwarmResult<Vec<EntityLink>> {
    let mut stmt = conn.prepare(
        "SELECT id, decision_id, target_kind, target_id, strength FROM entity_links
         WHERE project_key = ?1 AND decision_id = ?2",
    )?;
    let rows = stmt
        .query_map(params![project_key, decision_id], |row| {
            let target_kind: String = row.get(2)?;
            Ok(EntityLink {
                id: row.get(0)?,
                decision_id: row.get(1)?,
                target_kind: EntityKind::parse(&target_kind).unwrap_or(EntityKind::Memory),
                target_id: row.get(3)?,
                strength: row.get(4)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}
