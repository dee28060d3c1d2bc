//! One `CellRecord` per line. Empty lines are skipped on import; a write
//! always ends in a trailing newline so files concatenate cleanly.

use swarmcell_core::errors::SwarmResult;

use crate::record::CellRecord;

pub fn write_jsonl(records: &[CellRecord]) -> SwarmResult<String> {
    let mut out = String::new();
    for record in records {
        out.push_str(&serde_json::to_string(record)?);
        out.push('\n');
    }
    Ok(out)
}

/// Parses line-by-line; a line that fails to parse is reported against its
/// 1-based line number rather than aborting the whole file.
pub fn parse_jsonl(content: &str) -> Vec<(usize, Result<CellRecord, String>)> {
    content
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(idx, line)| (idx + 1, serde_json::from_str::<CellRecord>(line).map_err(|e| e.to_string())))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use swarmcell_core::model::{Cell, CellStatus, CellType};

    #[test]
    fn round_trips_through_jsonl() {
        let cell = Cell {
            id: "c1".into(),
            project_key: "p".into(),
            title: "t".into(),
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
        };
        let record = CellRecord::from_parts(&cell, &[], &[], &[]);
        let content = write_jsonl(&[record.clone()]).unwrap();
        let parsed = parse_jsonl(&content);
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].1.as_ref().unwrap(), &record);
    }

    #[test]
    fn skips_empty_lines() {
        let content = "\n\n\n";
        assert!(parse_jsonl(content).is_empty());
    }
}
