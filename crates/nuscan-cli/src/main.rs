//! nuscan CLI binary.
//!
//! This is the entry point for the `nuscan` command-line tool. It
//! initializes logging via `tracing`, parses arguments with `clap`,
//! merges them with the settings file, and runs the inspection.
//!
//! Registry queries are blocking, so the HTTP handle is built and dropped
//! outside the async runtime; only the per-project fan-out runs on it.

mod cli;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use console::style;
use miette::{IntoDiagnostic, Result};

use nuscan_core::config::{InspectionSettings, SettingsFile, SettingsOverrides};
use nuscan_inspect::result::Outcome;
use nuscan_inspect::{solution, writer};
use nuscan_registry::search::RegistrySearch;

fn main() -> Result<()> {
    let args = cli::parse();

    let default_filter = if args.verbose { "info" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter)),
        )
        .init();

    let settings_path = args.settings.clone().unwrap_or_else(|| {
        args.target
            .parent()
            .unwrap_or(Path::new("."))
            .join("nuscan.toml")
    });
    let file = SettingsFile::load(&settings_path)?;

    let overrides = SettingsOverrides {
        output_dir: args.output_dir,
        registry_urls: args
            .registry
            .as_deref()
            .map(InspectionSettings::split_list),
        excluded_projects: args
            .excluded_projects
            .as_deref()
            .map(InspectionSettings::split_list),
        ignore_failure: args.ignore_failure.then_some(true),
        request_timeout_secs: args.timeout,
    };
    let settings = InspectionSettings::merge(args.target, file, overrides);

    let registry = Arc::new(RegistrySearch::new(
        &settings.registry_urls,
        Duration::from_secs(settings.request_timeout_secs),
    )?);

    let runtime = tokio::runtime::Runtime::new().into_diagnostic()?;
    let results = runtime.block_on(solution::inspect(&settings, registry.clone()))?;

    let mut written = 0usize;
    let mut failed = 0usize;
    for result in &results {
        match &result.outcome {
            Outcome::Success(graph) => {
                writer::write_result(result, &settings.output_dir)?;
                written += 1;
                println!(
                    "{} {} ({} packages, {} direct)",
                    style("resolved").green(),
                    result.name,
                    graph.packages.len(),
                    graph.dependencies.len()
                );
            }
            Outcome::Error(e) => {
                failed += 1;
                println!("{} {}: {e}", style("failed").red(), result.name);
            }
        }
    }

    println!(
        "Wrote {written} result file(s) to {}{}",
        settings.output_dir.display(),
        if failed > 0 {
            format!(", {failed} project(s) failed")
        } else {
            String::new()
        }
    );

    Ok(())
}
