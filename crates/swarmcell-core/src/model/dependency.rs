use serde::{Deserialize, Serialize};

/// Relationship tag for an edge between two cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DependencyKind {
    Blocks,
    BlockedBy,
    Related,
    ParentChild,
    DiscoveredFrom,
    RepliesTo,
    RelatesTo,
    Duplicates,
    Supersedes,
}

impl DependencyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DependencyKind::Blocks => "blocks",
            DependencyKind::BlockedBy => "blocked-by",
            DependencyKind::Related => "related",
            DependencyKind::ParentChild => "parent-child",
            DependencyKind::DiscoveredFrom => "discovered-from",
            DependencyKind::RepliesTo => "replies-to",
            DependencyKind::RelatesTo => "relates-to",
            DependencyKind::Duplicates => "duplicates",
            DependencyKind::Supersedes => "supersedes",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "blocks" => Some(DependencyKind::Blocks),
            "blocked-by" => Some(DependencyKind::BlockedBy),
            "related" => Some(DependencyKind::Related),
            "parent-child" => Some(DependencyKind::ParentChild),
            "discovered-from" => Some(DependencyKind::DiscoveredFrom),
            "replies-to" => Some(DependencyKind::RepliesTo),
            "relates-to" => Some(DependencyKind::RelatesTo),
            "duplicates" => Some(DependencyKind::Duplicates),
            "supersedes" => Some(DependencyKind::Supersedes),
            _ => None,
        }
    }

    /// Edges restricted to these kinds form the graph that must stay acyclic.
    pub fn is_blocking(&self) -> bool {
        matches!(self, DependencyKind::Blocks | DependencyKind::BlockedBy)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dependency {
    pub cell_id: String,
    pub depends_on_id: String,
    pub kind: DependencyKind,
    pub created_at: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Label {
    pub cell_id: String,
    pub label: String,
    pub created_at: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub id: i64,
    pub cell_id: String,
    pub author: String,
    pub text: String,
    pub created_at: i64,
}
