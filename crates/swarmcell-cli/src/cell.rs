use std::path::PathBuf;

use anyhow::Result;
use clap::Subcommand;
use serde_json::json;

use crate::context::Ctx;

#[derive(Subcommand)]
pub enum CellCommands {
    /// Create a new cell
    Create {
        title: String,
        #[arg(long, default_value = "task")]
        cell_type: String,
        #[arg(long, default_value_t = 2)]
        priority: i32,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        parent: Option<String>,
        #[arg(long)]
        assignee: Option<String>,
    },

    /// Show one cell by id (accepts a partial id, resolved if unambiguous)
    Show { id: String },

    /// List cells, optionally filtered
    List {
        #[arg(long)]
        status: Option<String>,
        #[arg(long)]
        cell_type: Option<String>,
        #[arg(long)]
        assignee: Option<String>,
        #[arg(long)]
        parent: Option<String>,
    },

    /// Transition a cell's status
    Status { id: String, status: String, #[arg(long)] reason: Option<String> },

    /// Close a cell with an optional reason
    Close { id: String, #[arg(long)] reason: Option<String> },

    /// Reopen a closed cell
    Reopen { id: String },

    /// Soft-delete (tombstone) a cell
    Delete { id: String, #[arg(long)] reason: Option<String> },

    /// Add a dependency edge
    DepAdd { cell_id: String, depends_on_id: String, #[arg(long, default_value = "blocks")] kind: String },

    /// Remove a dependency edge
    DepRemove { cell_id: String, depends_on_id: String, #[arg(long, default_value = "blocks")] kind: String },

    /// List a cell's dependencies
    DepList { cell_id: String },

    /// Add a label
    LabelAdd { cell_id: String, label: String },

    /// Remove a label
    LabelRemove { cell_id: String, label: String },

    /// Add a comment
    Comment { cell_id: String, author: String, text: String },

    /// The next ready cell, if any (spec.md §4.3's tie-break order)
    NextReady,

    /// All children of an epic
    EpicChildren { epic_id: String },

    /// Whether an epic is eligible to close
    EpicEligible { epic_id: String },
}

pub fn run(cmd: CellCommands, project: Option<String>, db: Option<PathBuf>) -> Result<()> {
    let ctx = Ctx::connect(project, db)?;
    let result = match cmd {
        CellCommands::Create { title, cell_type, priority, description, parent, assignee } => ctx.client.call(
            "cell.create",
            json!({"title": title, "cell_type": cell_type, "priority": priority, "description": description, "parent_id": parent, "assignee": assignee}),
        )?,
        CellCommands::Show { id } => {
            let id = resolve(&ctx, &id)?;
            ctx.client.call("cell.get", json!({"id": id}))?
        }
        CellCommands::List { status, cell_type, assignee, parent } => ctx.client.call(
            "cell.query",
            json!({"status": status, "cell_type": cell_type, "assignee": assignee, "parent_id": parent}),
        )?,
        CellCommands::Status { id, status, reason } => {
            let id = resolve(&ctx, &id)?;
            ctx.client.call("cell.change_status", json!({"id": id, "status": status, "reason": reason}))?
        }
        CellCommands::Close { id, reason } => {
            let id = resolve(&ctx, &id)?;
            ctx.client.call("cell.close", json!({"id": id, "reason": reason}))?
        }
        CellCommands::Reopen { id } => {
            let id = resolve(&ctx, &id)?;
            ctx.client.call("cell.reopen", json!({"id": id}))?
        }
        CellCommands::Delete { id, reason } => {
            let id = resolve(&ctx, &id)?;
            ctx.client.call("cell.delete", json!({"id": id, "reason": reason}))?
        }
        CellCommands::DepAdd { cell_id, depends_on_id, kind } => {
            let cell_id = resolve(&ctx, &cell_id)?;
            ctx.client.call("cell.dependency.add", json!({"cell_id": cell_id, "depends_on_id": depends_on_id, "kind": kind}))?
        }
        CellCommands::DepRemove { cell_id, depends_on_id, kind } => {
            let cell_id = resolve(&ctx, &cell_id)?;
            ctx.client.call("cell.dependency.remove", json!({"cell_id": cell_id, "depends_on_id": depends_on_id, "kind": kind}))?
        }
        CellCommands::DepList { cell_id } => {
            let cell_id = resolve(&ctx, &cell_id)?;
            ctx.client.call("cell.dependency.list", json!({"cell_id": cell_id}))?
        }
        CellCommands::LabelAdd { cell_id, label } => {
            let cell_id = resolve(&ctx, &cell_id)?;
            ctx.client.call("cell.label.add", json!({"cell_id": cell_id, "label": label}))?
        }
        CellCommands::LabelRemove { cell_id, label } => {
            let cell_id = resolve(&ctx, &cell_id)?;
            ctx.client.call("cell.label.remove", json!({"cell_id": cell_id, "label": label}))?
        }
        CellCommands::Comment { cell_id, author, text } => {
            let cell_id = resolve(&ctx, &cell_id)?;
            ctx.client.call("cell.comment.add", json!({"cell_id": cell_id, "author": author, "text": text}))?
        }
        CellCommands::NextReady => ctx.client.call("cell.next_ready", json!({}))?,
        CellCommands::EpicChildren { epic_id } => {
            let epic_id = resolve(&ctx, &epic_id)?;
            ctx.client.call("cell.epic.children", json!({"epic_id": epic_id}))?
        }
        CellCommands::EpicEligible { epic_id } => {
            let epic_id = resolve(&ctx, &epic_id)?;
            ctx.client.call("cell.epic.closure_eligible", json!({"epic_id": epic_id}))?
        }
    };

    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

/// Resolves a (possibly partial) id via the partial-ID resolver (spec.md
/// §4.3) before using it in a follow-up call, so every subcommand accepts
/// id prefixes the way an agent would type them.
fn resolve(ctx: &Ctx, partial: &str) -> Result<String> {
    let resolved = ctx.client.call("cell.resolve_id", json!({"partial": partial}))?;
    Ok(resolved.as_str().map(str::to_string).unwrap_or_else(|| partial.to_string()))
}
