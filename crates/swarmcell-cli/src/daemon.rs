use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Subcommand;
use swarmcell_core::config::SwarmConfig;
use swarmcell_core::paths;
use swarmcell_daemon::{health, Endpoint};

#[derive(Subcommand)]
pub enum DaemonCommands {
    /// Start the daemon in the foreground; returns once an existing
    /// healthy daemon is found, or runs until ctrl-c
    Start,

    /// Report whether a daemon is healthy for this project
    Status,
}

pub fn run(cmd: DaemonCommands, project: Option<String>, db: Option<PathBuf>) -> anyhow::Result<()> {
    let project_key = project.unwrap_or_else(|| std::env::current_dir().unwrap().to_string_lossy().into_owned());
    let config = SwarmConfig::load(&PathBuf::from(&project_key).join("swarm.toml"))?;
    let db_path = db.unwrap_or_else(paths::global_db_path);

    match cmd {
        DaemonCommands::Start => start(&project_key, &db_path, &config),
        DaemonCommands::Status => status(&project_key, &config),
    }
}

fn start(project_key: &str, db_path: &std::path::Path, config: &SwarmConfig) -> Result<()> {
    let runtime = tokio::runtime::Builder::new_multi_thread().enable_all().build().context("building tokio runtime")?;

    runtime.block_on(async {
        let endpoint = swarmcell_daemon::run_daemon(project_key, db_path, config, async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;
        println!("daemon endpoint: {}", endpoint.describe());
        Ok::<(), swarmcell_core::errors::SwarmError>(())
    })?;

    Ok(())
}

fn status(project_key: &str, config: &SwarmConfig) -> Result<()> {
    let endpoint = Endpoint::resolve(project_key, &config.daemon);
    let healthy = health::check_health(&endpoint, std::time::Duration::from_millis(500));
    println!("endpoint: {}", endpoint.describe());
    println!("status: {}", if healthy { "healthy" } else { "unreachable (client calls will use the embedded engine)" });
    Ok(())
}
