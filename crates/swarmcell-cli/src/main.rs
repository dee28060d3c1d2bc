//! Command-line surface for the swarm coordination engine.
//!
//! Every subcommand is a thin wrapper over `swarmcell_daemon::Client`: it
//! prefers the running daemon's socket and falls back to an embedded engine
//! transparently, so behavior is identical whether or not a daemon happens
//! to be running for this project.

mod cell;
mod consolidate;
mod context;
mod daemon;
mod doctor;
mod export;
mod mail;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

/// swarmcell: coordination substrate for a fleet of agents sharing a repo
#[derive(Parser)]
#[command(name = "swarmcell")]
#[command(version, about)]
#[command(propagate_version = true)]
struct Cli {
    /// Project key override. Defaults to the current directory's absolute
    /// path, the scoping namespace for every record (see the glossary).
    #[arg(long, global = true)]
    project: Option<String>,

    /// Database path override, mainly for tests. Defaults to the global
    /// store under `~/.config/swarmcell/swarm.db`.
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start, stop, or check the single-writer daemon for this project
    #[command(subcommand)]
    Daemon(daemon::DaemonCommands),

    /// Run the six health checks, optionally fixing what's fixable
    Doctor(doctor::DoctorArgs),

    /// Work-item operations: create, query, transition, comment
    #[command(subcommand)]
    Cell(cell::CellCommands),

    /// Agent registry, mailbox, and file reservations
    #[command(subcommand)]
    Mail(mail::MailCommands),

    /// JSONL export/import, the canonical interchange format
    #[command(subcommand)]
    Export(export::ExportCommands),

    /// Detect and migrate stray project-local databases into the global store
    #[command(subcommand)]
    Consolidate(consolidate::ConsolidateCommands),
}

fn main() -> Result<()> {
    tracing_subscriber::fmt().with_env_filter(EnvFilter::from_default_env()).with_writer(std::io::stderr).init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Daemon(cmd) => daemon::run(cmd, cli.project, cli.db),
        Commands::Doctor(args) => doctor::run(args, cli.project, cli.db),
        Commands::Cell(cmd) => cell::run(cmd, cli.project, cli.db),
        Commands::Mail(cmd) => mail::run(cmd, cli.project, cli.db),
        Commands::Export(cmd) => export::run(cmd, cli.project, cli.db),
        Commands::Consolidate(cmd) => consolidate::run(cmd, cli.project, cli.db),
    }
}
