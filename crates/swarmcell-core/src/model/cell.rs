//! Cell: the work-item type. Identity, status machine states, and the
//! canonical in-memory representation backed by the `cells` table.

use serde::{Deserialize, Serialize};

/// Work item type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CellType {
    Bug,
    Feature,
    Task,
    Epic,
    Chore,
    /// Reserved for wire/schema completeness. `create_cell` rejects this
    /// variant — coordinator-authored messages live in the mail bus.
    Message,
}

impl CellType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CellType::Bug => "bug",
            CellType::Feature => "feature",
            CellType::Task => "task",
            CellType::Epic => "epic",
            CellType::Chore => "chore",
            CellType::Message => "message",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "bug" => Some(CellType::Bug),
            "feature" => Some(CellType::Feature),
            "task" => Some(CellType::Task),
            "epic" => Some(CellType::Epic),
            "chore" => Some(CellType::Chore),
            "message" => Some(CellType::Message),
            _ => None,
        }
    }
}

/// Status state machine. See `swarmcell-cells::transition` for the legal
/// transition table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CellStatus {
    Open,
    InProgress,
    Blocked,
    Closed,
    Tombstone,
}

impl CellStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CellStatus::Open => "open",
            CellStatus::InProgress => "in_progress",
            CellStatus::Blocked => "blocked",
            CellStatus::Closed => "closed",
            CellStatus::Tombstone => "tombstone",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "open" => Some(CellStatus::Open),
            "in_progress" => Some(CellStatus::InProgress),
            "blocked" => Some(CellStatus::Blocked),
            "closed" => Some(CellStatus::Closed),
            "tombstone" => Some(CellStatus::Tombstone),
            _ => None,
        }
    }
}

/// A work item. Identity is an opaque string ID, unique per project.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cell {
    pub id: String,
    pub project_key: String,
    pub title: String,
    pub description: Option<String>,
    pub cell_type: CellType,
    pub status: CellStatus,
    /// 0 (highest) .. 3 (lowest).
    pub priority: i32,
    pub parent_id: Option<String>,
    pub assignee: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
    pub closed_at: Option<i64>,
    pub closed_reason: Option<String>,
    pub deleted_at: Option<i64>,
    pub deleted_by: Option<String>,
    pub delete_reason: Option<String>,
    pub created_by: Option<String>,
    pub result: Option<String>,
    pub result_at: Option<i64>,
}

impl Cell {
    pub const MAX_TITLE_LEN: usize = 500;

    pub fn is_tombstoned(&self) -> bool {
        matches!(self.status, CellStatus::Tombstone)
    }
}
