//! `CellStore` — the work-item operations of spec.md §4.3, generic over any
//! `StorageAdapter` so the same code runs embedded in the daemon or against
//! whatever future networked adapter speaks the same trait.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use swarmcell_core::errors::{SwarmError, SwarmResult};
use swarmcell_core::model::{
    Cell, CellStatus, CellType, Comment, Dependency, DependencyKind, EventType, Label,
};
use swarmcell_core::traits::StorageAdapter;
use swarmcell_storage::queries::{cells as q_cells, comments as q_comments, dependencies as q_deps, events as q_events, labels as q_labels};

use crate::graph::{blocker_and_blocked, find_cycles, BlockingGraphBuilder};
use crate::transition;

#[derive(Debug, Default, Clone)]
pub struct CellFilters {
    pub status: Option<CellStatus>,
    pub cell_type: Option<CellType>,
    pub assignee: Option<String>,
    pub parent_id: Option<String>,
    pub label: Option<String>,
}

pub struct CellStore<S: StorageAdapter> {
    storage: Arc<S>,
}

impl<S: StorageAdapter> CellStore<S> {
    pub fn new(storage: Arc<S>) -> Self {
        Self { storage }
    }

    fn validate(&self, title: &str, priority: i32, cell_type: CellType, project_key: &str, parent_id: Option<&str>) -> SwarmResult<()> {
        if title.trim().is_empty() {
            return Err(SwarmError::Validation { field: "title".into(), reason: "must not be empty".into() });
        }
        if title.len() > Cell::MAX_TITLE_LEN {
            return Err(SwarmError::Validation { field: "title".into(), reason: format!("exceeds {} chars", Cell::MAX_TITLE_LEN) });
        }
        if !(0..=3).contains(&priority) {
            return Err(SwarmError::Validation { field: "priority".into(), reason: "must be in 0..=3".into() });
        }
        if cell_type == CellType::Message {
            return Err(SwarmError::Validation {
                field: "type".into(),
                reason: "message cells are not created directly; use the mail bus".into(),
            });
        }
        if let Some(parent) = parent_id {
            let exists = self.storage.query(|conn| q_cells::get_cell(conn, project_key, parent))?;
            if exists.is_none() {
                return Err(SwarmError::Validation { field: "parent_id".into(), reason: format!("cell '{parent}' does not exist") });
            }
        }
        Ok(())
    }

    pub fn create_cell(
        &self,
        project_key: &str,
        title: &str,
        description: Option<String>,
        cell_type: CellType,
        priority: i32,
        parent_id: Option<String>,
        assignee: Option<String>,
        created_by: Option<String>,
        now: i64,
    ) -> SwarmResult<Cell> {
        self.validate(title, priority, cell_type, project_key, parent_id.as_deref())?;
        let cell = Cell {
            id: uuid::Uuid::new_v4().simple().to_string(),
            project_key: project_key.to_string(),
            title: title.to_string(),
            description,
            cell_type,
            status: CellStatus::Open,
            priority,
            parent_id,
            assignee,
            created_at: now,
            updated_at: now,
            closed_at: None,
            closed_reason: None,
            deleted_at: None,
            deleted_by: None,
            delete_reason: None,
            created_by,
            result: None,
            result_at: None,
        };
        self.storage.transaction(|conn| {
            q_cells::insert_cell(conn, &cell)?;
            q_cells::mark_dirty(conn, project_key, &cell.id, now)?;
            q_events::append_event(
                conn,
                project_key,
                EventType::CellCreated,
                now,
                &serde_json::json!({"cell_id": cell.id, "title": cell.title}),
            )?;
            Ok(())
        })?;
        debug!(cell_id = %cell.id, "cell created");
        Ok(cell)
    }

    pub fn get_cell(&self, project_key: &str, id: &str) -> SwarmResult<Option<Cell>> {
        self.storage.query(|conn| q_cells::get_cell(conn, project_key, id))
    }

    pub fn query_cells(&self, project_key: &str, filters: &CellFilters) -> SwarmResult<Vec<Cell>> {
        let all = self.storage.query(|conn| q_cells::list_cells(conn, project_key))?;
        Ok(all
            .into_iter()
            .filter(|c| filters.status.map_or(true, |s| c.status == s))
            .filter(|c| filters.cell_type.map_or(true, |t| c.cell_type == t))
            .filter(|c| filters.assignee.as_deref().map_or(true, |a| c.assignee.as_deref() == Some(a)))
            .filter(|c| filters.parent_id.as_deref().map_or(true, |p| c.parent_id.as_deref() == Some(p)))
            .collect())
    }

    pub fn update_cell(&self, project_key: &str, id: &str, now: i64, apply: impl FnOnce(&mut Cell)) -> SwarmResult<Cell> {
        let mut cell = self
            .get_cell(project_key, id)?
            .ok_or_else(|| SwarmError::NotFound { entity: "cell".into(), id: id.to_string() })?;
        apply(&mut cell);
        if cell.title.trim().is_empty() || cell.title.len() > Cell::MAX_TITLE_LEN {
            return Err(SwarmError::Validation { field: "title".into(), reason: "invalid after update".into() });
        }
        cell.updated_at = now;
        self.storage.transaction(|conn| {
            q_cells::update_cell(conn, &cell)?;
            q_cells::mark_dirty(conn, project_key, &cell.id, now)?;
            q_events::append_event(conn, project_key, EventType::CellUpdated, now, &serde_json::json!({"cell_id": cell.id}))?;
            Ok(())
        })?;
        Ok(cell)
    }

    pub fn change_cell_status(&self, project_key: &str, id: &str, to: CellStatus, reason: Option<String>, now: i64) -> SwarmResult<Cell> {
        let mut cell = self
            .get_cell(project_key, id)?
            .ok_or_else(|| SwarmError::NotFound { entity: "cell".into(), id: id.to_string() })?;
        if !transition::is_legal(cell.status, to) {
            return Err(SwarmError::InvalidTransition { from: cell.status.as_str().into(), to: to.as_str().into() });
        }
        let from = cell.status;
        cell.status = to;
        cell.updated_at = now;
        if to == CellStatus::Closed {
            cell.closed_at = Some(now);
            cell.closed_reason = reason.clone();
        }
        if to == CellStatus::Tombstone {
            cell.deleted_at = Some(now);
            cell.delete_reason = reason.clone();
        }
        self.storage.transaction(|conn| {
            q_cells::update_cell(conn, &cell)?;
            q_cells::mark_dirty(conn, project_key, &cell.id, now)?;
            let event_type = match to {
                CellStatus::Closed => EventType::CellClosed,
                CellStatus::Open if from == CellStatus::Closed => EventType::CellReopened,
                CellStatus::Tombstone => EventType::CellDeleted,
                _ => EventType::CellStatusChanged,
            };
            q_events::append_event(
                conn,
                project_key,
                event_type,
                now,
                &serde_json::json!({"cell_id": cell.id, "from": from.as_str(), "to": to.as_str()}),
            )?;
            Ok(())
        })?;
        self.refresh_dependents_cache(project_key, id)?;
        Ok(cell)
    }

    pub fn close_cell(&self, project_key: &str, id: &str, reason: Option<String>, now: i64) -> SwarmResult<Cell> {
        self.change_cell_status(project_key, id, CellStatus::Closed, reason, now)
    }

    pub fn reopen_cell(&self, project_key: &str, id: &str, now: i64) -> SwarmResult<Cell> {
        self.change_cell_status(project_key, id, CellStatus::Open, None, now)
    }

    pub fn delete_cell(&self, project_key: &str, id: &str, deleted_by: Option<String>, reason: Option<String>, now: i64) -> SwarmResult<Cell> {
        let mut cell = self.change_cell_status(project_key, id, CellStatus::Tombstone, reason, now)?;
        cell.deleted_by = deleted_by.clone();
        self.storage.exec(|conn| {
            q_cells::update_cell(conn, &cell)?;
            Ok(())
        })?;
        Ok(cell)
    }

    pub fn add_dependency(&self, project_key: &str, cell_id: &str, depends_on_id: &str, kind: DependencyKind, now: i64) -> SwarmResult<()> {
        if kind.is_blocking() {
            let edges = self.storage.query(|conn| q_deps::list_blocking_edges(conn, project_key))?;
            let (graph, index) = BlockingGraphBuilder::new().build(&edges);
            if graph.would_create_cycle(&index, cell_id, depends_on_id, kind) {
                return Err(SwarmError::DependencyCycle { path: format!("{cell_id} -> {depends_on_id}") });
            }
        }
        let dep = Dependency { cell_id: cell_id.to_string(), depends_on_id: depends_on_id.to_string(), kind, created_at: now };
        self.storage.transaction(|conn| {
            q_deps::insert_dependency(conn, project_key, &dep)?;
            q_events::append_event(
                conn,
                project_key,
                EventType::CellDependencyAdded,
                now,
                &serde_json::json!({"cell_id": cell_id, "depends_on_id": depends_on_id, "kind": kind.as_str()}),
            )?;
            Ok(())
        })?;
        if kind.is_blocking() {
            let affected = if kind == DependencyKind::Blocks { depends_on_id } else { cell_id };
            self.refresh_blocked_cache(project_key, affected, now)?;
        }
        Ok(())
    }

    pub fn remove_dependency(&self, project_key: &str, cell_id: &str, depends_on_id: &str, kind: DependencyKind, now: i64) -> SwarmResult<()> {
        self.storage.transaction(|conn| {
            q_deps::remove_dependency(conn, project_key, cell_id, depends_on_id, kind)?;
            q_events::append_event(
                conn,
                project_key,
                EventType::CellDependencyRemoved,
                now,
                &serde_json::json!({"cell_id": cell_id, "depends_on_id": depends_on_id, "kind": kind.as_str()}),
            )?;
            Ok(())
        })?;
        if kind.is_blocking() {
            let affected = if kind == DependencyKind::Blocks { depends_on_id } else { cell_id };
            self.refresh_blocked_cache(project_key, affected, now)?;
        }
        Ok(())
    }

    pub fn get_dependencies(&self, project_key: &str, cell_id: &str) -> SwarmResult<Vec<Dependency>> {
        self.storage.query(|conn| q_deps::list_dependencies(conn, project_key, cell_id))
    }

    pub fn add_label(&self, project_key: &str, cell_id: &str, label: &str, now: i64) -> SwarmResult<()> {
        let l = Label { cell_id: cell_id.to_string(), label: label.to_string(), created_at: now };
        self.storage.transaction(|conn| {
            q_labels::add_label(conn, project_key, &l)?;
            q_events::append_event(conn, project_key, EventType::CellLabelAdded, now, &serde_json::json!({"cell_id": cell_id, "label": label}))?;
            Ok(())
        })
    }

    pub fn remove_label(&self, project_key: &str, cell_id: &str, label: &str, now: i64) -> SwarmResult<()> {
        self.storage.transaction(|conn| {
            q_labels::remove_label(conn, project_key, cell_id, label)?;
            q_events::append_event(conn, project_key, EventType::CellLabelRemoved, now, &serde_json::json!({"cell_id": cell_id, "label": label}))?;
            Ok(())
        })
    }

    pub fn get_labels(&self, project_key: &str, cell_id: &str) -> SwarmResult<Vec<String>> {
        self.storage.query(|conn| q_labels::list_labels(conn, project_key, cell_id))
    }

    pub fn add_comment(&self, project_key: &str, cell_id: &str, author: &str, text: &str, now: i64) -> SwarmResult<Comment> {
        let id = self.storage.transaction(|conn| {
            let id = q_comments::add_comment(conn, project_key, cell_id, author, text, now)?;
            q_events::append_event(conn, project_key, EventType::CellCommentAdded, now, &serde_json::json!({"cell_id": cell_id, "comment_id": id}))?;
            Ok(id)
        })?;
        Ok(Comment { id, cell_id: cell_id.to_string(), author: author.to_string(), text: text.to_string(), created_at: now })
    }

    pub fn get_comments(&self, project_key: &str, cell_id: &str) -> SwarmResult<Vec<Comment>> {
        self.storage.query(|conn| q_comments::list_comments(conn, project_key, cell_id))
    }

    pub fn get_epic_children(&self, project_key: &str, epic_id: &str) -> SwarmResult<Vec<Cell>> {
        self.storage.query(|conn| q_cells::list_children(conn, project_key, epic_id))
    }

    /// Eligible when every non-tombstone child is closed. Does not close
    /// the epic — that remains an explicit `close_cell` call.
    pub fn is_epic_closure_eligible(&self, project_key: &str, epic_id: &str) -> SwarmResult<bool> {
        let children = self.get_epic_children(project_key, epic_id)?;
        let live: Vec<&Cell> = children.iter().filter(|c| c.status != CellStatus::Tombstone).collect();
        if live.is_empty() {
            return Ok(false);
        }
        Ok(live.iter().all(|c| c.status == CellStatus::Closed))
    }

    pub fn get_in_progress_cells(&self, project_key: &str) -> SwarmResult<Vec<Cell>> {
        self.storage.query(|conn| q_cells::list_by_status(conn, project_key, CellStatus::InProgress))
    }

    pub fn mark_dirty(&self, project_key: &str, cell_id: &str, now: i64) -> SwarmResult<()> {
        self.storage.exec(|conn| q_cells::mark_dirty(conn, project_key, cell_id, now))
    }

    /// Live (not closed/tombstoned) blockers of `cell_id`, recomputed from
    /// the dependency edges rather than the materialized cache.
    pub fn get_blockers(&self, project_key: &str, cell_id: &str) -> SwarmResult<Vec<String>> {
        self.storage.query(|conn| {
            let mut blockers = Vec::new();
            for dep in q_deps::list_dependencies(conn, project_key, cell_id)? {
                if dep.kind == DependencyKind::BlockedBy {
                    if let Some(blocker) = q_cells::get_cell(conn, project_key, &dep.depends_on_id)? {
                        if !matches!(blocker.status, CellStatus::Closed | CellStatus::Tombstone) {
                            blockers.push(blocker.id);
                        }
                    }
                }
            }
            for dep in q_deps::list_dependents(conn, project_key, cell_id)? {
                if dep.kind == DependencyKind::Blocks {
                    if let Some(blocker) = q_cells::get_cell(conn, project_key, &dep.cell_id)? {
                        if !matches!(blocker.status, CellStatus::Closed | CellStatus::Tombstone) {
                            blockers.push(blocker.id);
                        }
                    }
                }
            }
            blockers.sort();
            blockers.dedup();
            Ok(blockers)
        })
    }

    fn refresh_blocked_cache(&self, project_key: &str, cell_id: &str, now: i64) -> SwarmResult<()> {
        let blockers = self.get_blockers(project_key, cell_id)?;
        self.storage.exec(|conn| {
            if blockers.is_empty() {
                q_cells::clear_blocked_cache(conn, project_key, cell_id)
            } else {
                let json = serde_json::to_string(&blockers)?;
                q_cells::upsert_blocked_cache(conn, project_key, cell_id, &json, now)
            }
        })
    }

    /// After `cell_id`'s status changes, every cell that lists it as a
    /// blocker needs its cached blocker set recomputed.
    fn refresh_dependents_cache(&self, project_key: &str, cell_id: &str) -> SwarmResult<()> {
        let now = chrono::Utc::now().timestamp();
        let outgoing = self.storage.query(|conn| q_deps::list_dependencies(conn, project_key, cell_id))?;
        let incoming = self.storage.query(|conn| q_deps::list_dependents(conn, project_key, cell_id))?;
        let mut affected: Vec<String> = outgoing
            .iter()
            .filter(|d| d.kind == DependencyKind::Blocks)
            .map(|d| d.depends_on_id.clone())
            .collect();
        affected.extend(
            incoming
                .iter()
                .filter(|d| d.kind == DependencyKind::BlockedBy)
                .map(|d| d.cell_id.clone()),
        );
        affected.sort();
        affected.dedup();
        for dependent_id in affected {
            self.refresh_blocked_cache(project_key, &dependent_id, now)?;
        }
        Ok(())
    }

    /// Ready iff status=open and no active blocker in the cache. Tie-break:
    /// lower numeric priority, then earlier `created_at`, then lexicographic
    /// id.
    pub fn get_next_ready_cell(&self, project_key: &str) -> SwarmResult<Option<Cell>> {
        let open = self.storage.query(|conn| q_cells::list_by_status(conn, project_key, CellStatus::Open))?;
        let mut ready = Vec::new();
        for cell in open {
            if self.get_blockers(project_key, &cell.id)?.is_empty() {
                ready.push(cell);
            }
        }
        ready.sort_by(|a, b| a.priority.cmp(&b.priority).then(a.created_at.cmp(&b.created_at)).then(a.id.cmp(&b.id)));
        Ok(ready.into_iter().next())
    }

    /// Resolves a (possibly partial) id. Exactly one non-tombstone match
    /// returns its full id; zero matches returns `None`; more than one fails
    /// with `AmbiguousId`.
    pub fn resolve_id(&self, project_key: &str, partial: &str) -> SwarmResult<Option<String>> {
        let matches = self.storage.query(|conn| {
            let candidates = q_cells::find_ids_by_prefix(conn, project_key, partial)?;
            let mut live = Vec::new();
            for id in candidates {
                if let Some(cell) = q_cells::get_cell(conn, project_key, &id)? {
                    if cell.status != CellStatus::Tombstone {
                        live.push(id);
                    }
                }
            }
            Ok(live)
        })?;
        match matches.len() {
            0 => Ok(None),
            1 => Ok(Some(matches.into_iter().next().unwrap())),
            _ => Err(SwarmError::AmbiguousId { partial: partial.to_string(), matches }),
        }
    }

    /// Adjacency map over `blocks`/`blocked-by` edges, for the doctor's
    /// standalone cycle check.
    pub fn blocking_adjacency(&self, project_key: &str) -> SwarmResult<HashMap<String, Vec<String>>> {
        let edges = self.storage.query(|conn| q_deps::list_blocking_edges(conn, project_key))?;
        let mut adjacency: HashMap<String, Vec<String>> = HashMap::new();
        for edge in edges {
            let (blocker, blocked) = blocker_and_blocked(edge.kind, &edge.cell_id, &edge.depends_on_id);
            adjacency.entry(blocker.to_string()).or_default().push(blocked.to_string());
        }
        Ok(adjacency)
    }

    pub fn find_cycles(&self, project_key: &str) -> SwarmResult<Vec<Vec<String>>> {
        Ok(find_cycles(&self.blocking_adjacency(project_key)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use swarmcell_storage::StorageEngine;

    fn store() -> CellStore<StorageEngine> {
        CellStore::new(Arc::new(StorageEngine::open_in_memory().unwrap()))
    }

    #[test]
    fn rejects_message_type_and_empty_title() {
        let s = store();
        let err = s
            .create_cell("p", "hello", None, CellType::Message, 1, None, None, None, 1)
            .unwrap_err();
        assert!(matches!(err, SwarmError::Validation { .. }));

        let err = s.create_cell("p", "", None, CellType::Task, 1, None, None, None, 1).unwrap_err();
        assert!(matches!(err, SwarmError::Validation { .. }));
    }

    #[test]
    fn create_then_get_round_trips() {
        let s = store();
        let cell = s.create_cell("p", "fix the bug", None, CellType::Bug, 1, None, None, Some("alice".into()), 100).unwrap();
        let fetched = s.get_cell("p", &cell.id).unwrap().unwrap();
        assert_eq!(fetched.title, "fix the bug");
        assert_eq!(fetched.status, CellStatus::Open);
    }

    #[test]
    fn illegal_transition_is_rejected() {
        let s = store();
        let cell = s.create_cell("p", "task", None, CellType::Task, 1, None, None, None, 1).unwrap();
        s.close_cell("p", &cell.id, None, 2).unwrap();
        let err = s.change_cell_status("p", &cell.id, CellStatus::InProgress, None, 3).unwrap_err();
        assert!(matches!(err, SwarmError::InvalidTransition { .. }));
    }

    #[test]
    fn blocked_by_open_cell_is_not_ready() {
        let s = store();
        let blocker = s.create_cell("p", "blocker", None, CellType::Task, 1, None, None, None, 1).unwrap();
        let blocked = s.create_cell("p", "blocked", None, CellType::Task, 1, None, None, None, 2).unwrap();
        s.add_dependency("p", &blocked.id, &blocker.id, DependencyKind::BlockedBy, 3).unwrap();

        let ready = s.get_next_ready_cell("p").unwrap().unwrap();
        assert_eq!(ready.id, blocker.id);

        s.close_cell("p", &blocker.id, None, 4).unwrap();
        let ready = s.get_next_ready_cell("p").unwrap().unwrap();
        assert_eq!(ready.id, blocked.id);
    }

    #[test]
    fn direct_cycle_is_rejected() {
        let s = store();
        let a = s.create_cell("p", "a", None, CellType::Task, 1, None, None, None, 1).unwrap();
        let b = s.create_cell("p", "b", None, CellType::Task, 1, None, None, None, 2).unwrap();
        s.add_dependency("p", &a.id, &b.id, DependencyKind::Blocks, 3).unwrap();
        let err = s.add_dependency("p", &b.id, &a.id, DependencyKind::Blocks, 4).unwrap_err();
        assert!(matches!(err, SwarmError::DependencyCycle { .. }));
    }

    #[test]
    fn ready_selection_tie_breaks_on_priority_then_created_at_then_id() {
        let s = store();
        let low = s.create_cell("p", "low priority", None, CellType::Task, 3, None, None, None, 1).unwrap();
        let high = s.create_cell("p", "high priority", None, CellType::Task, 0, None, None, None, 2).unwrap();
        let _ = low;
        let ready = s.get_next_ready_cell("p").unwrap().unwrap();
        assert_eq!(ready.id, high.id);
    }

    #[test]
    fn epic_closure_eligible_only_when_all_children_closed() {
        let s = store();
        let epic = s.create_cell("p", "epic", None, CellType::Epic, 1, None, None, None, 1).unwrap();
        let child = s.create_cell("p", "child", None, CellType::Task, 1, Some(epic.id.clone()), None, None, 2).unwrap();
        assert!(!s.is_epic_closure_eligible("p", &epic.id).unwrap());
        s.close_cell("p", &child.id, None, 3).unwrap();
        assert!(s.is_epic_closure_eligible("p", &epic.id).unwrap());
    }

    #[test]
    fn ambiguous_prefix_and_unique_prefix_resolve() {
        let s = store();
        let cell = s.create_cell("p", "task", None, CellType::Task, 1, None, None, None, 1).unwrap();
        let prefix = &cell.id[..4];
        let resolved = s.resolve_id("p", prefix).unwrap().unwrap();
        assert_eq!(resolved, cell.id);
        assert_eq!(s.resolve_id("p", "doesnotexist").unwrap(), None);
    }

    /// S1: epic with two children linked by a blocks edge; readiness and
    /// closure eligibility track the dependency chain, not just parentage.
    #[test]
    fn epic_lifecycle_tracks_dependency_chain_to_closure() {
        let s = store();
        let epic = s.create_cell("p", "epic", None, CellType::Epic, 1, None, None, None, 1).unwrap();
        let a = s.create_cell("p", "a", None, CellType::Task, 1, Some(epic.id.clone()), None, None, 2).unwrap();
        let b = s.create_cell("p", "b", None, CellType::Task, 2, Some(epic.id.clone()), None, None, 3).unwrap();
        s.add_dependency("p", &a.id, &b.id, DependencyKind::Blocks, 4).unwrap();

        let ready = s.get_next_ready_cell("p").unwrap().unwrap();
        assert_eq!(ready.id, a.id);

        s.close_cell("p", &a.id, Some("done".into()), 5).unwrap();
        let ready = s.get_next_ready_cell("p").unwrap().unwrap();
        assert_eq!(ready.id, b.id);

        s.close_cell("p", &b.id, None, 6).unwrap();
        assert!(s.is_epic_closure_eligible("p", &epic.id).unwrap());
    }

    /// S2: a three-edge chain X->Y->Z rejects the closing Z->X edge and
    /// leaves the prior two edges untouched.
    #[test]
    fn three_edge_cycle_is_rejected_and_prior_edges_survive() {
        let s = store();
        let x = s.create_cell("p", "x", None, CellType::Task, 1, None, None, None, 1).unwrap();
        let y = s.create_cell("p", "y", None, CellType::Task, 1, None, None, None, 2).unwrap();
        let z = s.create_cell("p", "z", None, CellType::Task, 1, None, None, None, 3).unwrap();

        s.add_dependency("p", &x.id, &y.id, DependencyKind::Blocks, 4).unwrap();
        s.add_dependency("p", &y.id, &z.id, DependencyKind::Blocks, 5).unwrap();
        let err = s.add_dependency("p", &z.id, &x.id, DependencyKind::Blocks, 6).unwrap_err();
        assert!(matches!(err, SwarmError::DependencyCycle { .. }));

        assert_eq!(s.get_dependencies("p", &x.id).unwrap().len(), 1);
        assert_eq!(s.get_dependencies("p", &y.id).unwrap().len(), 1);
        assert!(s.get_dependencies("p", &z.id).unwrap().is_empty());
    }

    /// P3: a cycle assembled from a mix of `Blocks` and `BlockedBy` edges
    /// must be rejected just like one assembled from `Blocks` edges alone —
    /// both kinds encode the same blocker-\>blocked relationship, just with
    /// `cell_id`/`depends_on_id` swapped.
    #[test]
    fn mixed_kind_cycle_is_rejected() {
        let s = store();
        let a = s.create_cell("p", "a", None, CellType::Task, 1, None, None, None, 1).unwrap();
        let b = s.create_cell("p", "b", None, CellType::Task, 1, None, None, None, 2).unwrap();

        // a blocks b.
        s.add_dependency("p", &a.id, &b.id, DependencyKind::Blocks, 3).unwrap();

        // "a is blocked-by b" says the same thing as "b blocks a" — adding it
        // on top of "a blocks b" closes a two-node cycle.
        let err = s.add_dependency("p", &a.id, &b.id, DependencyKind::BlockedBy, 4).unwrap_err();
        assert!(matches!(err, SwarmError::DependencyCycle { .. }));

        assert_eq!(s.get_dependencies("p", &a.id).unwrap().len(), 1);
    }
}

#[cfg(test)]
mod proptests {
    use proptest::prelude::*;

    use swarmcell_core::model::{CellType, DependencyKind};
    use swarmcell_storage::StorageEngine;

    use super::CellStore;

    // P3: the `blocks`-restricted graph never contains a cycle after any
    // sequence of add_dependency/remove_dependency calls the store accepts
    // (rejected calls must leave the graph exactly as it was).
    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn random_dependency_edits_never_produce_a_cycle(
            ops in prop::collection::vec((0usize..5, 0usize..5, any::<bool>()), 0..40)
        ) {
            let storage = std::sync::Arc::new(StorageEngine::open_in_memory().unwrap());
            let store = CellStore::new(storage);
            let mut now = 1i64;
            let ids: Vec<String> = (0..5)
                .map(|i| {
                    now += 1;
                    store
                        .create_cell("p", &format!("cell-{i}"), None, CellType::Task, 1, None, None, None, now)
                        .unwrap()
                        .id
                })
                .collect();

            for (a, b, add) in ops {
                if a == b {
                    continue;
                }
                now += 1;
                if add {
                    let _ = store.add_dependency("p", &ids[a], &ids[b], DependencyKind::Blocks, now);
                } else {
                    let _ = store.remove_dependency("p", &ids[a], &ids[b], DependencyKind::Blocks, now);
                }

                let adjacency = store.blocking_adjacency("p").unwrap();
                let cycles = crate::graph::find_cycles(&adjacency);
                prop_assert!(cycles.is_empty(), "cycle survived an accepted sequence of edits: {:?}", cycles);
            }
        }
    }
}
