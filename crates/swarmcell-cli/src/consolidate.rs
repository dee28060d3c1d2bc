//! Stray-database detection and migration (spec.md §4.9). Operates on
//! whole files under the project root rather than per-record state, so
//! like `export`, it talks to `swarmcell-doctor::consolidation` directly
//! instead of going through the daemon socket.

use std::path::PathBuf;

use anyhow::Result;
use clap::Subcommand;
use swarmcell_core::paths;
use swarmcell_doctor::consolidation::{self, ConsolidateOptions};

#[derive(Subcommand)]
pub enum ConsolidateCommands {
    /// List stray databases found under the project root without touching them
    Scan,

    /// Analyze each stray database's schema era and row counts
    Analyze,

    /// Migrate every migratable stray into the global store
    Run {
        /// Skip the per-stray confirmation prompt
        #[arg(long)]
        yes: bool,
    },
}

pub fn run(cmd: ConsolidateCommands, project: Option<String>, db: Option<PathBuf>) -> Result<()> {
    let project_root = project.map(PathBuf::from).unwrap_or_else(|| std::env::current_dir().unwrap());
    let global_db = db.unwrap_or_else(paths::global_db_path);

    match cmd {
        ConsolidateCommands::Scan => {
            let strays = consolidation::detect_stray_databases(&project_root);
            if strays.is_empty() {
                println!("no stray databases found under {}", project_root.display());
            }
            for stray in &strays {
                println!("{}", stray.display());
            }
        }
        ConsolidateCommands::Analyze => {
            let strays = consolidation::detect_stray_databases(&project_root);
            for stray in &strays {
                let analysis = consolidation::analyze_stray(stray, &global_db)?;
                println!("{}", serde_json::to_string_pretty(&analysis)?);
            }
        }
        ConsolidateCommands::Run { yes } => {
            let opts = ConsolidateOptions { yes, interactive: !yes };
            let report = consolidation::consolidate_databases(&project_root, &global_db, &opts)?;
            println!(
                "analyzed {} stray database(s), migrated {}",
                report.analyzed.len(),
                report.migrated.len()
            );
            for migration in &report.migrated {
                println!("  {} -> global ({} table(s))", migration.stray.display(), migration.log.len());
            }
        }
    }
    Ok(())
}
