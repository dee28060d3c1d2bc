//! Git merge driver entry point. Git invokes this as
//! `swarmcell-merge-driver %O %A %B` (base, ours, theirs temp file paths)
//! per the `[merge "swarmcell"]` driver config in `.gitattributes`. The
//! merged result is written back over `%A`; per spec.md §4.6 this always
//! exits `0` — conflicts are resolved deterministically, never left as
//! markers for a human to untangle.

use std::env;
use std::fs;
use std::process::ExitCode;

use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    tracing_subscriber::fmt().with_env_filter(EnvFilter::from_default_env()).with_writer(std::io::stderr).init();

    let args: Vec<String> = env::args().collect();
    if args.len() != 4 {
        eprintln!("usage: swarmcell-merge-driver <base> <ours> <theirs>");
        return ExitCode::FAILURE;
    }

    let base_path = &args[1];
    let ours_path = &args[2];
    let theirs_path = &args[3];

    let base = fs::read_to_string(base_path).unwrap_or_default();
    let ours = fs::read_to_string(ours_path).unwrap_or_default();
    let theirs = fs::read_to_string(theirs_path).unwrap_or_default();

    let now = env::var("SWARMCELL_MERGE_NOW").ok().and_then(|v| v.parse().ok()).unwrap_or_else(|| {
        std::time::SystemTime::now().duration_since(std::time::UNIX_EPOCH).map(|d| d.as_secs() as i64).unwrap_or(0)
    });

    let merged = swarmcell_export::merge::merge_jsonl(&base, &ours, &theirs, now);

    if let Err(e) = fs::write(ours_path, merged) {
        tracing::error!(error = %e, "failed to write merged output");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}
