use serde::{Deserialize, Serialize};

/// Recorded reasoning context for an agent decision, linked to its outcome
/// event for post-hoc quality scoring.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionTrace {
    /// Prefixed `dt-`.
    pub id: String,
    pub project_key: String,
    pub decision_type: String,
    pub epic_id: Option<String>,
    pub cell_id: Option<String>,
    pub agent_name: String,
    pub decision: serde_json::Value,
    pub rationale: String,
    pub gathered_inputs: serde_json::Value,
    pub alternatives_considered: serde_json::Value,
    pub outcome_event_id: Option<i64>,
    pub quality_score: Option<f64>,
    pub timestamp: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Memory,
    Decision,
    Pattern,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Memory => "memory",
            EntityKind::Decision => "decision",
            EntityKind::Pattern => "pattern",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "memory" => Some(EntityKind::Memory),
            "decision" => Some(EntityKind::Decision),
            "pattern" => Some(EntityKind::Pattern),
            _ => None,
        }
    }
}

/// Typed directed edge from a decision to another entity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityLink {
    pub id: i64,
    pub decision_id: String,
    pub target_kind: EntityKind,
    pub target_id: String,
    /// 0.0 .. 1.0
    pub strength: f64,
}
