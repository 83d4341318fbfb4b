//! Solution-level inspection: discover member projects and resolve them
//! in parallel.
//!
//! Projects are independent; each gets its own builder and blocking
//! worker. The registry handle is the only shared object and is
//! read-only after construction.

use std::path::Path;
use std::sync::Arc;

use tokio::task::JoinSet;
use tracing::{info, warn};

use nuscan_core::config::InspectionSettings;
use nuscan_core::solution;
use nuscan_registry::search::MetadataSource;
use nuscan_util::errors::NuscanError;

use crate::project::{inspect_project, ProjectPaths};
use crate::result::{InspectionResult, Outcome};

/// Inspect the configured target, dispatching on its file type.
pub async fn inspect(
    settings: &InspectionSettings,
    registry: Arc<dyn MetadataSource + Send + Sync>,
) -> miette::Result<Vec<InspectionResult>> {
    let target = settings.target.clone();
    if !target.exists() {
        return Err(NuscanError::Project {
            message: format!("target {} does not exist", target.display()),
        }
        .into());
    }

    let is_solution = target
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("sln"));

    let results = if is_solution {
        inspect_solution(settings, &target, registry).await?
    } else {
        let paths = ProjectPaths::from_project_file(&target)?;
        let registry = registry.clone();
        let result =
            tokio::task::spawn_blocking(move || inspect_project(&paths, registry.as_ref()))
                .await
                .map_err(|e| NuscanError::Generic {
                    message: format!("inspection worker panicked: {e}"),
                })?;
        vec![result]
    };

    enforce_failure_policy(results, settings.ignore_failure)
}

async fn inspect_solution(
    settings: &InspectionSettings,
    target: &Path,
    registry: Arc<dyn MetadataSource + Send + Sync>,
) -> miette::Result<Vec<InspectionResult>> {
    let entries = solution::load_solution(target)?;
    let solution_dir = target.parent().unwrap_or(Path::new("."));
    info!("solution lists {} projects", entries.len());

    let mut join_set = JoinSet::new();
    for entry in entries {
        if settings
            .excluded_projects
            .iter()
            .any(|excluded| excluded == entry.name.trim())
        {
            info!("project {} excluded from inspection", entry.name);
            continue;
        }

        let project_path = entry.resolve_against(solution_dir);
        let paths = ProjectPaths {
            name: entry.name.clone(),
            directory: project_path
                .parent()
                .unwrap_or(Path::new("."))
                .to_path_buf(),
            project_file: project_path,
        };
        let registry = registry.clone();
        join_set.spawn_blocking(move || inspect_project(&paths, registry.as_ref()));
    }

    let mut results = Vec::new();
    while let Some(joined) = join_set.join_next().await {
        match joined {
            Ok(result) => results.push(result),
            Err(e) => {
                return Err(NuscanError::Generic {
                    message: format!("inspection worker panicked: {e}"),
                }
                .into())
            }
        }
    }

    // Workers finish in arbitrary order; the report should not.
    results.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(results)
}

/// Apply the failure policy: with `ignore_failure` a failed project is
/// logged and contributes nothing; otherwise the first failure aborts
/// the run.
fn enforce_failure_policy(
    results: Vec<InspectionResult>,
    ignore_failure: bool,
) -> miette::Result<Vec<InspectionResult>> {
    if ignore_failure {
        for result in &results {
            if let Outcome::Error(e) = &result.outcome {
                warn!(
                    "error collecting dependency information on project {}: {e}",
                    result.name
                );
            }
        }
        return Ok(results);
    }

    let mut checked = Vec::with_capacity(results.len());
    for result in results {
        match result.outcome {
            Outcome::Error(e) => return Err(e),
            Outcome::Success(graph) => checked.push(InspectionResult {
                name: result.name,
                version: result.version,
                outcome: Outcome::Success(graph),
            }),
        }
    }
    Ok(checked)
}

#[cfg(test)]
mod tests {
    use super::*;
    use nuscan_resolver::graph::PackageSetBuilder;

    fn success(name: &str) -> InspectionResult {
        InspectionResult::success(
            name.to_string(),
            None,
            PackageSetBuilder::new().build_graph(),
        )
    }

    fn failure(name: &str) -> InspectionResult {
        InspectionResult::failure(
            name.to_string(),
            NuscanError::Project {
                message: "broken".to_string(),
            }
            .into(),
        )
    }

    #[test]
    fn failure_aborts_by_default() {
        let results = vec![success("A"), failure("B")];
        assert!(enforce_failure_policy(results, false).is_err());
    }

    #[test]
    fn ignore_failure_keeps_going() {
        let results = vec![success("A"), failure("B")];
        let kept = enforce_failure_policy(results, true).unwrap();
        assert_eq!(kept.len(), 2);
        assert!(kept.iter().any(|r| !r.is_success()));
    }
}
