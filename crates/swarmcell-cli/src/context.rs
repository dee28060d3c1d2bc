//! Shared setup every subcommand needs: the project key (the repository's
//! absolute path, per the glossary), the loaded config, and a connected
//! `Client`. Mirrors `maw`'s pattern of resolving repo context once in
//! `main` and threading it down rather than having each subcommand
//! re-derive it.

use std::path::PathBuf;

use anyhow::{Context, Result};
use swarmcell_core::config::SwarmConfig;
use swarmcell_core::paths;
use swarmcell_daemon::Client;

pub struct Ctx {
    pub project_key: String,
    pub config: SwarmConfig,
    pub client: Client,
}

impl Ctx {
    pub fn connect(project_override: Option<String>, db_override: Option<PathBuf>) -> Result<Self> {
        let project_key = project_override
            .map(Ok)
            .unwrap_or_else(|| {
                std::env::current_dir()
                    .map(|p| p.to_string_lossy().into_owned())
                    .context("could not determine current directory for project key")
            })?;

        let config = SwarmConfig::load(&PathBuf::from(&project_key).join("swarm.toml"))?;
        let db_path = db_override
            .or_else(swarmcell_core::config::db_path_override)
            .unwrap_or_else(paths::global_db_path);

        let client = Client::connect(&project_key, &db_path, &config)
            .with_context(|| format!("connecting to store for project '{project_key}'"))?;

        Ok(Self { project_key, config, client })
    }
}

pub fn now() -> i64 {
    chrono::Utc::now().timestamp()
}
