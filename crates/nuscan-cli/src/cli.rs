//! CLI argument definitions for nuscan.
//!
//! Uses `clap` derive macros. Every flag that overlaps the settings file
//! stays optional here so the precedence merge can tell "not given" from
//! "given".

use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(
    name = "nuscan",
    version,
    about = "Resolve a .NET project or solution's transitive package graph",
    long_about = "nuscan inspects a project or solution, replays the package \
                  manager's dependency resolution against a registry's metadata \
                  API, and writes the deduplicated, version-resolved package \
                  graph as JSON for downstream security and license scanning."
)]
pub struct Cli {
    /// Solution (.sln) or project file to inspect
    pub target: PathBuf,

    /// Directory for the JSON result files
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Comma-separated registry metadata URLs, tried in order
    #[arg(short, long)]
    pub registry: Option<String>,

    /// Comma-separated project names to skip
    #[arg(long)]
    pub excluded_projects: Option<String>,

    /// Log failed projects instead of aborting the run
    #[arg(long)]
    pub ignore_failure: bool,

    /// Per-endpoint request timeout in seconds
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Settings file location (default: nuscan.toml next to the target)
    #[arg(long)]
    pub settings: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

pub fn parse() -> Cli {
    Cli::parse()
}
