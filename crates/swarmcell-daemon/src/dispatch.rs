//! Maps a wire `Request{op, args}` onto the cell store, mail bus, and
//! doctor operations it names (spec.md §6). Kept synchronous — every
//! operation here is a fast local SQLite call — and run inside
//! `tokio::task::spawn_blocking` by the listener so it never blocks the
//! async reactor.

use std::sync::Arc;

use serde_json::{json, Value};

use swarmcell_core::errors::{SwarmError, SwarmResult};
use swarmcell_core::model::{CellStatus, CellType, DependencyKind, Importance};
use swarmcell_doctor::{format_doctor_report, run_doctor, DoctorOptions};

use crate::protocol::{error_kind, Request, Response};
use crate::state::DaemonState;

fn now() -> i64 {
    chrono::Utc::now().timestamp()
}

fn field<'a>(args: &'a Value, name: &str) -> SwarmResult<&'a str> {
    args.get(name).and_then(Value::as_str).ok_or_else(|| SwarmError::Validation {
        field: name.to_string(),
        reason: "missing or not a string".to_string(),
    })
}

fn opt_field(args: &Value, name: &str) -> Option<String> {
    args.get(name).and_then(Value::as_str).map(str::to_string)
}

fn strings(args: &Value, name: &str) -> Vec<String> {
    args.get(name)
        .and_then(Value::as_array)
        .map(|a| a.iter().filter_map(|v| v.as_str().map(str::to_string)).collect())
        .unwrap_or_default()
}

/// Dispatches one request against `state` and produces its response. Never
/// panics on a malformed `args` payload — malformed input becomes a
/// `Validation` error in the response, same as any other rejected mutation.
pub fn handle(state: &DaemonState, req: Request) -> Response {
    let project_key = state.project_key.as_str();
    let result = run(state, project_key, &req.op, &req.args);
    match result {
        Ok(value) => Response::ok(req.request_id, value),
        Err(e) => Response::err(req.request_id, error_kind(&e), e.to_string()),
    }
}

fn run(state: &DaemonState, project_key: &str, op: &str, args: &Value) -> SwarmResult<Value> {
    match op {
        "ping" => Ok(json!("pong")),

        "cell.create" => {
            let cell_type = CellType::parse(field(args, "cell_type")?).ok_or_else(|| SwarmError::Validation {
                field: "cell_type".into(),
                reason: "unrecognized cell type".into(),
            })?;
            let priority = args.get("priority").and_then(Value::as_i64).unwrap_or(2) as i32;
            let cell = state.cells.create_cell(
                project_key,
                field(args, "title")?,
                opt_field(args, "description"),
                cell_type,
                priority,
                opt_field(args, "parent_id"),
                opt_field(args, "assignee"),
                opt_field(args, "created_by"),
                now(),
            )?;
            Ok(serde_json::to_value(cell)?)
        }

        "cell.get" => {
            let cell = state.cells.get_cell(project_key, field(args, "id")?)?;
            Ok(serde_json::to_value(cell)?)
        }

        "cell.query" => {
            use swarmcell_cells::CellFilters;
            let filters = CellFilters {
                status: args.get("status").and_then(Value::as_str).and_then(CellStatus::parse),
                cell_type: args.get("cell_type").and_then(Value::as_str).and_then(CellType::parse),
                assignee: opt_field(args, "assignee"),
                parent_id: opt_field(args, "parent_id"),
                label: opt_field(args, "label"),
            };
            let cells = state.cells.query_cells(project_key, &filters)?;
            Ok(serde_json::to_value(cells)?)
        }

        "cell.change_status" => {
            let to = CellStatus::parse(field(args, "status")?).ok_or_else(|| SwarmError::Validation {
                field: "status".into(),
                reason: "unrecognized status".into(),
            })?;
            let cell =
                state.cells.change_cell_status(project_key, field(args, "id")?, to, opt_field(args, "reason"), now())?;
            Ok(serde_json::to_value(cell)?)
        }

        "cell.close" => {
            let cell = state.cells.close_cell(project_key, field(args, "id")?, opt_field(args, "reason"), now())?;
            Ok(serde_json::to_value(cell)?)
        }

        "cell.reopen" => {
            let cell = state.cells.reopen_cell(project_key, field(args, "id")?, now())?;
            Ok(serde_json::to_value(cell)?)
        }

        "cell.delete" => {
            let cell = state.cells.delete_cell(
                project_key,
                field(args, "id")?,
                opt_field(args, "deleted_by"),
                opt_field(args, "reason"),
                now(),
            )?;
            Ok(serde_json::to_value(cell)?)
        }

        "cell.dependency.add" => {
            let kind = DependencyKind::parse(field(args, "kind")?).ok_or_else(|| SwarmError::Validation {
                field: "kind".into(),
                reason: "unrecognized dependency kind".into(),
            })?;
            state
                .cells
                .add_dependency(project_key, field(args, "cell_id")?, field(args, "depends_on_id")?, kind, now())?;
            Ok(Value::Null)
        }

        "cell.dependency.remove" => {
            let kind = DependencyKind::parse(field(args, "kind")?).ok_or_else(|| SwarmError::Validation {
                field: "kind".into(),
                reason: "unrecognized dependency kind".into(),
            })?;
            state
                .cells
                .remove_dependency(project_key, field(args, "cell_id")?, field(args, "depends_on_id")?, kind, now())?;
            Ok(Value::Null)
        }

        "cell.dependency.list" => {
            let deps = state.cells.get_dependencies(project_key, field(args, "cell_id")?)?;
            Ok(serde_json::to_value(deps)?)
        }

        "cell.label.add" => {
            state.cells.add_label(project_key, field(args, "cell_id")?, field(args, "label")?, now())?;
            Ok(Value::Null)
        }

        "cell.label.remove" => {
            state.cells.remove_label(project_key, field(args, "cell_id")?, field(args, "label")?, now())?;
            Ok(Value::Null)
        }

        "cell.label.list" => {
            let labels = state.cells.get_labels(project_key, field(args, "cell_id")?)?;
            Ok(serde_json::to_value(labels)?)
        }

        "cell.comment.add" => {
            let comment = state.cells.add_comment(
                project_key,
                field(args, "cell_id")?,
                field(args, "author")?,
                field(args, "text")?,
                now(),
            )?;
            Ok(serde_json::to_value(comment)?)
        }

        "cell.comment.list" => {
            let comments = state.cells.get_comments(project_key, field(args, "cell_id")?)?;
            Ok(serde_json::to_value(comments)?)
        }

        "cell.epic.children" => {
            let children = state.cells.get_epic_children(project_key, field(args, "epic_id")?)?;
            Ok(serde_json::to_value(children)?)
        }

        "cell.epic.closure_eligible" => {
            let eligible = state.cells.is_epic_closure_eligible(project_key, field(args, "epic_id")?)?;
            Ok(json!(eligible))
        }

        "cell.next_ready" => {
            let cell = state.cells.get_next_ready_cell(project_key)?;
            Ok(serde_json::to_value(cell)?)
        }

        "cell.in_progress" => {
            let cells = state.cells.get_in_progress_cells(project_key)?;
            Ok(serde_json::to_value(cells)?)
        }

        "cell.resolve_id" => {
            let resolved = state.cells.resolve_id(project_key, field(args, "partial")?)?;
            Ok(json!(resolved))
        }

        "cell.blockers" => {
            let blockers = state.cells.get_blockers(project_key, field(args, "cell_id")?)?;
            Ok(serde_json::to_value(blockers)?)
        }

        "mail.agent.register" => {
            let agent = state.mail.register_agent(project_key, field(args, "name")?, now())?;
            Ok(serde_json::to_value(agent)?)
        }

        "mail.agent.touch" => {
            state.mail.touch_agent(project_key, field(args, "name")?, now())?;
            Ok(Value::Null)
        }

        "mail.agent.list" => Ok(serde_json::to_value(state.mail.get_agents(project_key)?)?),

        "mail.send" => {
            let importance = args
                .get("importance")
                .and_then(Value::as_str)
                .and_then(Importance::parse)
                .unwrap_or(Importance::Normal);
            let msg = state.mail.send_message(
                project_key,
                field(args, "from_agent")?,
                &strings(args, "to"),
                field(args, "subject")?,
                field(args, "body")?,
                opt_field(args, "thread_id"),
                importance,
                args.get("ack_required").and_then(Value::as_bool).unwrap_or(false),
                now(),
            )?;
            Ok(serde_json::to_value(msg)?)
        }

        "mail.inbox" => Ok(serde_json::to_value(state.mail.get_inbox(project_key, field(args, "agent")?)?)?),

        "mail.thread" => Ok(serde_json::to_value(state.mail.get_thread_messages(project_key, field(args, "thread_id")?)?)?),

        "mail.mark_read" => {
            let id = args.get("message_id").and_then(Value::as_i64).ok_or_else(|| SwarmError::Validation {
                field: "message_id".into(),
                reason: "missing or not an integer".into(),
            })?;
            state.mail.mark_read(project_key, id, field(args, "agent")?, now())?;
            Ok(Value::Null)
        }

        "mail.ack" => {
            let id = args.get("message_id").and_then(Value::as_i64).ok_or_else(|| SwarmError::Validation {
                field: "message_id".into(),
                reason: "missing or not an integer".into(),
            })?;
            state.mail.ack(project_key, id, field(args, "agent")?, now())?;
            Ok(Value::Null)
        }

        "mail.reserve" => {
            let ttl_secs = args.get("ttl_secs").and_then(Value::as_i64).unwrap_or(3600);
            let reservations = state.mail.reserve(
                project_key,
                field(args, "agent")?,
                &strings(args, "paths"),
                args.get("exclusive").and_then(Value::as_bool).unwrap_or(true),
                ttl_secs,
                now(),
            )?;
            Ok(serde_json::to_value(reservations)?)
        }

        "mail.release" => {
            let ids: Vec<i64> = args
                .get("reservation_ids")
                .and_then(Value::as_array)
                .map(|a| a.iter().filter_map(Value::as_i64).collect())
                .unwrap_or_default();
            state.mail.release(project_key, &ids, now())?;
            Ok(Value::Null)
        }

        "mail.reservations" => Ok(serde_json::to_value(state.mail.get_active_reservations(project_key, now())?)?),

        "mail.conflicts" => {
            let conflicts = state.mail.check_conflicts(
                project_key,
                field(args, "pattern")?,
                args.get("exclusive").and_then(Value::as_bool).unwrap_or(true),
                field(args, "agent")?,
                now(),
            )?;
            Ok(serde_json::to_value(conflicts)?)
        }

        "doctor.run" => {
            let opts = DoctorOptions { fix: args.get("fix").and_then(Value::as_bool).unwrap_or(false), now: now() };
            let report = run_doctor(&state.storage, project_key, &state.config.doctor, &opts)?;
            let text = format_doctor_report(&report, &state.config.doctor, opts.fix);
            Ok(json!({"report": report, "text": text}))
        }

        other => Err(SwarmError::Validation { field: "op".into(), reason: format!("unknown operation '{other}'") }),
    }
}

/// Exposed for the CLI's embedded fallback path, which talks to the same
/// stores directly instead of round-tripping through JSON.
pub fn project_key_of(state: &Arc<DaemonState>) -> &str {
    &state.project_key
}
