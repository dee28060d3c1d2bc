//! The canonical per-cell JSONL record (spec.md §4.6): field-named, with a
//! content hash computed over the JSON object with its keys sorted
//! alphabetically so two processes that serialize the same logical record
//! always agree on its hash.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use swarmcell_core::model::{Cell, CellStatus, CellType, Comment, Dependency};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DependencyRecord {
    pub depends_on_id: String,
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CommentRecord {
    pub author: String,
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CellRecord {
    pub id: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub status: String,
    pub priority: i32,
    pub issue_type: String,
    pub created_at: String,
    pub updated_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub closed_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignee: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    pub dependencies: Vec<DependencyRecord>,
    pub labels: Vec<String>,
    pub comments: Vec<CommentRecord>,
}

pub fn unix_to_iso8601(ts: i64) -> String {
    DateTime::<Utc>::from_timestamp(ts, 0)
        .unwrap_or_else(|| DateTime::<Utc>::from_timestamp(0, 0).unwrap())
        .to_rfc3339_opts(chrono::SecondsFormat::Secs, true)
}

/// Parses an ISO-8601 `Z` timestamp back to unix seconds. Invalid input
/// sorts as "older than everything valid" per spec.md §4.6 — callers treat
/// `None` that way.
pub fn iso8601_to_unix(s: &str) -> Option<i64> {
    DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.with_timezone(&Utc).timestamp())
}

impl CellRecord {
    pub fn from_parts(cell: &Cell, deps: &[Dependency], labels: &[String], comments: &[Comment]) -> Self {
        let mut dependencies: Vec<DependencyRecord> = deps
            .iter()
            .map(|d| DependencyRecord { depends_on_id: d.depends_on_id.clone(), kind: d.kind.as_str().to_string() })
            .collect();
        dependencies.sort_by(|a, b| a.depends_on_id.cmp(&b.depends_on_id).then(a.kind.cmp(&b.kind)));

        let mut labels: Vec<String> = labels.to_vec();
        labels.sort();

        let comments: Vec<CommentRecord> = comments.iter().map(|c| CommentRecord { author: c.author.clone(), text: c.text.clone() }).collect();

        CellRecord {
            id: cell.id.clone(),
            title: cell.title.clone(),
            description: cell.description.clone(),
            status: cell.status.as_str().to_string(),
            priority: cell.priority,
            issue_type: cell.cell_type.as_str().to_string(),
            created_at: unix_to_iso8601(cell.created_at),
            updated_at: unix_to_iso8601(cell.updated_at),
            closed_at: cell.closed_at.map(unix_to_iso8601),
            assignee: cell.assignee.clone(),
            parent_id: cell.parent_id.clone(),
            dependencies,
            labels,
            comments,
        }
    }

    /// Rebuild a bare `Cell` (project-scoped fields filled in by the
    /// caller) from this record. Edges/labels/comments are applied
    /// separately via clear-and-insert on import.
    pub fn to_cell(&self, project_key: &str) -> Cell {
        let status = CellStatus::parse(&self.status).unwrap_or(CellStatus::Open);
        Cell {
            id: self.id.clone(),
            project_key: project_key.to_string(),
            title: self.title.clone(),
            description: self.description.clone(),
            cell_type: CellType::parse(&self.issue_type).unwrap_or(CellType::Task),
            status,
            priority: self.priority,
            parent_id: self.parent_id.clone(),
            assignee: self.assignee.clone(),
            created_at: iso8601_to_unix(&self.created_at).unwrap_or(0),
            updated_at: iso8601_to_unix(&self.updated_at).unwrap_or(0),
            closed_at: self.closed_at.as_deref().and_then(iso8601_to_unix),
            closed_reason: None,
            deleted_at: if status == CellStatus::Tombstone { iso8601_to_unix(&self.updated_at) } else { None },
            deleted_by: None,
            delete_reason: None,
            created_by: None,
            result: None,
            result_at: None,
        }
    }

    /// SHA-256 of this record serialized with alphabetically sorted keys.
    pub fn content_hash(&self) -> String {
        let value = serde_json::to_value(self).expect("CellRecord always serializes");
        let sorted = sort_keys(&value);
        let canonical = serde_json::to_string(&sorted).expect("sorted value always serializes");
        let digest = Sha256::digest(canonical.as_bytes());
        digest.iter().map(|b| format!("{b:02x}")).collect()
    }
}

/// Recursively rebuilds a `serde_json::Value`'s objects with alphabetically
/// ordered keys. `serde_json::Map` preserves insertion order by default
/// (and with the `preserve_order` feature), so this is the only way to get
/// a deterministic byte representation for hashing.
fn sort_keys(value: &serde_json::Value) -> serde_json::Value {
    match value {
        serde_json::Value::Object(map) => {
            let mut entries: Vec<(&String, &serde_json::Value)> = map.iter().collect();
            entries.sort_by_key(|(k, _)| k.as_str());
            let mut sorted = serde_json::Map::new();
            for (k, v) in entries {
                sorted.insert(k.clone(), sort_keys(v));
            }
            serde_json::Value::Object(sorted)
        }
        serde_json::Value::Array(items) => serde_json::Value::Array(items.iter().map(sort_keys).collect()),
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_cell() -> Cell {
        Cell {
            id: "c1".into(),
            project_key: "p".into(),
            title: "title".into(),
            description: None,
            cell_type: CellType::Task,
            status: CellStatus::Open,
            priority: 1,
            parent_id: None,
            assignee: None,
            created_at: 0,
            updated_at: 0,
            closed_at: None,
            closed_reason: None,
            deleted_at: None,
            deleted_by: None,
            delete_reason: None,
            created_by: None,
            result: None,
            result_at: None,
        }
    }

    #[test]
    fn hash_is_stable_regardless_of_field_order() {
        let record = CellRecord::from_parts(&sample_cell(), &[], &[], &[]);
        let h1 = record.content_hash();
        let h2 = record.content_hash();
        assert_eq!(h1, h2);
        assert_eq!(h1.len(), 64);
    }

    #[test]
    fn hash_changes_when_title_changes() {
        let mut cell = sample_cell();
        let h1 = CellRecord::from_parts(&cell, &[], &[], &[]).content_hash();
        cell.title = "different".into();
        let h2 = CellRecord::from_parts(&cell, &[], &[], &[]).content_hash();
        assert_ne!(h1, h2);
    }

    #[test]
    fn timestamp_round_trips() {
        let iso = unix_to_iso8601(1_700_000_000);
        assert_eq!(iso8601_to_unix(&iso), Some(1_700_000_000));
    }
}
