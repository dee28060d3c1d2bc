//! JSONL export/import (spec.md §4.6). These go straight at the storage
//! engine rather than through the daemon socket: they're bulk file
//! operations invoked from Git hooks and CI, not the single-record
//! mutations the wire protocol is shaped for, and they're safe to run
//! against a project whose daemon isn't running.

use std::path::PathBuf;

use anyhow::Result;
use swarmcell_core::config::SwarmConfig;
use swarmcell_core::paths;
use swarmcell_storage::StorageEngine;

use clap::Subcommand;

#[derive(Subcommand)]
pub enum ExportCommands {
    /// Export the dirty cell set to a JSONL file, then clear dirty flags
    Export { path: PathBuf },

    /// Import a JSONL file, creating/updating/skipping by content hash
    Import { path: PathBuf },
}

pub fn run(cmd: ExportCommands, project: Option<String>, db: Option<PathBuf>) -> Result<()> {
    let project_key = project.unwrap_or_else(|| std::env::current_dir().unwrap().to_string_lossy().into_owned());
    let _config = SwarmConfig::load(&PathBuf::from(&project_key).join("swarm.toml"))?;
    let db_path = db.unwrap_or_else(paths::global_db_path);
    let storage = StorageEngine::open(&db_path)?;

    match cmd {
        ExportCommands::Export { path } => {
            let report = swarmcell_export::incremental::export_dirty(&storage, &project_key, &path)?;
            println!("exported {} cell(s) to {}", report.cells_written, path.display());
        }
        ExportCommands::Import { path } => {
            let content = std::fs::read_to_string(&path)?;
            let now = chrono::Utc::now().timestamp();
            let report = swarmcell_export::import::import_jsonl(&storage, &project_key, &content, now)?;
            println!(
                "created {}, updated {}, skipped {}, errors {}",
                report.created,
                report.updated,
                report.skipped,
                report.errors.len()
            );
            for err in &report.errors {
                eprintln!("  {}: {}", err.id, err.error);
            }
        }
    }
    Ok(())
}
