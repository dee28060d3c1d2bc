//! Incremental export: only the dirty set is written; dirty flags clear on
//! success. Grounded on `drift-core::workspace::export`'s "write the whole
//! set as one file, verify by re-hashing every line before declaring
//! success" idiom.

use std::path::Path;

use swarmcell_core::errors::SwarmResult;
use swarmcell_core::traits::StorageAdapter;
use swarmcell_storage::queries::{cells as q_cells, comments as q_comments, dependencies as q_deps, labels as q_labels};

use crate::jsonl::{parse_jsonl, write_jsonl};
use crate::record::CellRecord;

pub struct ExportReport {
    pub cells_written: usize,
}

/// Exports every dirty cell in `project_key` to `path`, then clears their
/// dirty flags. Every written line is re-parsed and re-hashed before the
/// dirty set is cleared, so a truncated write never silently loses state.
pub fn export_dirty<S: StorageAdapter>(storage: &S, project_key: &str, path: &Path) -> SwarmResult<ExportReport> {
    let dirty_ids = storage.query(|conn| q_cells::list_dirty(conn, project_key))?;
    let mut records = Vec::with_capacity(dirty_ids.len());
    for id in &dirty_ids {
        let record = storage.query(|conn| {
            let cell = q_cells::get_cell(conn, project_key, id)?;
            let Some(cell) = cell else { return Ok(None) };
            let deps = q_deps::list_dependencies(conn, project_key, id)?;
            let labels = q_labels::list_labels(conn, project_key, id)?;
            let comments = q_comments::list_comments(conn, project_key, id)?;
            Ok(Some(CellRecord::from_parts(&cell, &deps, &labels, &comments)))
        })?;
        if let Some(record) = record {
            records.push(record);
        }
    }

    let content = write_jsonl(&records)?;
    verify_round_trip(&content, &records)?;
    std::fs::write(path, content)?;

    storage.exec(|conn| q_cells::clear_dirty(conn, project_key, &dirty_ids))?;
    Ok(ExportReport { cells_written: records.len() })
}

fn verify_round_trip(content: &str, records: &[CellRecord]) -> SwarmResult<()> {
    let parsed = parse_jsonl(content);
    for ((_, result), expected) in parsed.iter().zip(records.iter()) {
        let actual = result.as_ref().map_err(|e| swarmcell_core::errors::SwarmError::Corruption { detail: e.clone() })?;
        if actual.content_hash() != expected.content_hash() {
            return Err(swarmcell_core::errors::SwarmError::Corruption {
                detail: format!("export round-trip hash mismatch for cell {}", expected.id),
            });
        }
    }
    Ok(())
}
