//! Import: parse line-by-line, accumulating `{created, updated, skipped,
//! errors}`. An incoming record whose hash matches the stored hash is
//! skipped; otherwise its fields, dependencies, labels, and comments are
//! replaced wholesale (clear-and-insert, per spec.md §4.6).

use serde::Serialize;

use swarmcell_core::errors::SwarmResult;
use swarmcell_core::model::{CellStatus, Dependency, DependencyKind, Label};
use swarmcell_core::traits::StorageAdapter;
use swarmcell_storage::queries::{cells as q_cells, comments as q_comments, dependencies as q_deps, labels as q_labels};

use crate::jsonl::parse_jsonl;
use crate::record::CellRecord;

#[derive(Debug, Default, Serialize)]
pub struct ImportError {
    pub id: String,
    pub error: String,
}

#[derive(Debug, Default, Serialize)]
pub struct ImportReport {
    pub created: usize,
    pub updated: usize,
    pub skipped: usize,
    pub errors: Vec<ImportError>,
}

pub fn import_jsonl<S: StorageAdapter>(storage: &S, project_key: &str, content: &str, now: i64) -> SwarmResult<ImportReport> {
    let mut report = ImportReport::default();

    for (line_no, parsed) in parse_jsonl(content) {
        let record = match parsed {
            Ok(r) => r,
            Err(e) => {
                report.errors.push(ImportError { id: format!("line {line_no}"), error: e });
                continue;
            }
        };
        match apply_record(storage, project_key, &record, now) {
            Ok(Outcome::Created) => report.created += 1,
            Ok(Outcome::Updated) => report.updated += 1,
            Ok(Outcome::Skipped) => report.skipped += 1,
            Err(e) => report.errors.push(ImportError { id: record.id.clone(), error: e.to_string() }),
        }
    }

    Ok(report)
}

enum Outcome {
    Created,
    Updated,
    Skipped,
}

fn apply_record<S: StorageAdapter>(storage: &S, project_key: &str, record: &CellRecord, now: i64) -> SwarmResult<Outcome> {
    let incoming_hash = record.content_hash();

    storage.transaction(|conn| {
        let existing = q_cells::get_cell(conn, project_key, &record.id)?;

        if let Some(existing) = &existing {
            if existing.status != CellStatus::Tombstone {
                let existing_deps = q_deps::list_dependencies(conn, project_key, &record.id)?;
                let existing_labels = q_labels::list_labels(conn, project_key, &record.id)?;
                let existing_comments = q_comments::list_comments(conn, project_key, &record.id)?;
                let existing_record = CellRecord::from_parts(existing, &existing_deps, &existing_labels, &existing_comments);
                if existing_record.content_hash() == incoming_hash {
                    return Ok(Outcome::Skipped);
                }
            }
        }

        let mut cell = record.to_cell(project_key);
        if let Some(existing) = &existing {
            cell.created_by = existing.created_by.clone();
            cell.deleted_by = existing.deleted_by.clone();
        }

        if existing.is_some() {
            q_cells::update_cell(conn, &cell)?;
        } else {
            q_cells::insert_cell(conn, &cell)?;
        }
        q_cells::set_content_hash(conn, project_key, &record.id, &incoming_hash)?;

        replace_dependencies(conn, project_key, &record.id, &record.dependencies, now)?;
        replace_labels(conn, project_key, &record.id, &record.labels, now)?;
        replace_comments(conn, project_key, &record.id, &record.comments)?;

        if existing.is_some() {
            Ok(Outcome::Updated)
        } else {
            Ok(Outcome::Created)
        }
    })
}

fn replace_dependencies(conn: &rusqlite::Connection, project_key: &str, cell_id: &str, deps: &[crate::record::DependencyRecord], now: i64) -> SwarmResult<()> {
    for dep in q_deps::list_dependencies(conn, project_key, cell_id)? {
        q_deps::remove_dependency(conn, project_key, cell_id, &dep.depends_on_id, dep.kind)?;
    }
    for dep in deps {
        let kind = DependencyKind::parse(&dep.kind).unwrap_or(DependencyKind::Related);
        q_deps::insert_dependency(
            conn,
            project_key,
            &Dependency { cell_id: cell_id.to_string(), depends_on_id: dep.depends_on_id.clone(), kind, created_at: now },
        )?;
    }
    Ok(())
}

fn replace_labels(conn: &rusqlite::Connection, project_key: &str, cell_id: &str, labels: &[String], now: i64) -> SwarmResult<()> {
    for label in q_labels::list_labels(conn, project_key, cell_id)? {
        q_labels::remove_label(conn, project_key, cell_id, &label)?;
    }
    for label in labels {
        q_labels::add_label(conn, project_key, &Label { cell_id: cell_id.to_string(), label: label.clone(), created_at: now })?;
    }
    Ok(())
}

fn replace_comments(conn: &rusqlite::Connection, project_key: &str, cell_id: &str, comments: &[crate::record::CommentRecord]) -> SwarmResult<()> {
    for existing in q_comments::list_comments(conn, project_key, cell_id)? {
        conn.execute("DELETE FROM comments WHERE project_key = ?1 AND id = ?2", rusqlite::params![project_key, existing.id])?;
    }
    for comment in comments {
        q_comments::add_comment(conn, project_key, cell_id, &comment.author, &comment.text, 0)?;
    }
    Ok(())
}

