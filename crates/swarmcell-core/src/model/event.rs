use serde::{Deserialize, Serialize};

/// Typed discriminant for cell-related and bus-related events. Not
/// exhaustive — the payload JSON carries the rest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    CellCreated,
    CellUpdated,
    CellStatusChanged,
    CellClosed,
    CellReopened,
    CellDeleted,
    CellDependencyAdded,
    CellDependencyRemoved,
    CellLabelAdded,
    CellLabelRemoved,
    CellCommentAdded,
    MessageSent,
    MessageAcked,
    ReservationCreated,
    ReservationReleased,
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::CellCreated => "cell_created",
            EventType::CellUpdated => "cell_updated",
            EventType::CellStatusChanged => "cell_status_changed",
            EventType::CellClosed => "cell_closed",
            EventType::CellReopened => "cell_reopened",
            EventType::CellDeleted => "cell_deleted",
            EventType::CellDependencyAdded => "cell_dependency_added",
            EventType::CellDependencyRemoved => "cell_dependency_removed",
            EventType::CellLabelAdded => "cell_label_added",
            EventType::CellLabelRemoved => "cell_label_removed",
            EventType::CellCommentAdded => "cell_comment_added",
            EventType::MessageSent => "message_sent",
            EventType::MessageAcked => "message_acked",
            EventType::ReservationCreated => "reservation_created",
            EventType::ReservationReleased => "reservation_released",
        }
    }
}

/// Append-only audit record. Authoritative history; never replayed to
/// reconstruct state (the cells table is the source of truth).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: i64,
    pub project_key: String,
    /// Monotonic per-project, assigned inside the append transaction.
    pub sequence: i64,
    pub event_type: String,
    pub timestamp: i64,
    pub payload: serde_json::Value,
}
