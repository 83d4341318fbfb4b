//! Per-project inspection: manifest detection and strategy dispatch.
//!
//! Manifest formats are probed in a fixed order and the first one found
//! is used exclusively: a lock document beats a `packages.config`, which
//! beats `project.json`, which beats scanning the project XML itself.

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use nuscan_core::lockfile::LockDocument;
use nuscan_core::package::PackageRequirement;
use nuscan_core::project::{self, ProjectFile};
use nuscan_registry::search::MetadataSource;
use nuscan_resolver::strategy::{self, ProjectManifest};
use nuscan_util::errors::NuscanError;

use crate::result::InspectionResult;

/// Where to look for each manifest format of one project.
#[derive(Debug, Clone)]
pub struct ProjectPaths {
    pub name: String,
    pub project_file: PathBuf,
    pub directory: PathBuf,
}

impl ProjectPaths {
    /// Derive the conventional layout from a project file path.
    pub fn from_project_file(path: &Path) -> miette::Result<Self> {
        let directory = path
            .parent()
            .map(Path::to_path_buf)
            .ok_or_else(|| NuscanError::Project {
                message: format!("project path {} has no parent directory", path.display()),
            })?;
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "project".to_string());
        Ok(Self {
            name,
            project_file: path.to_path_buf(),
            directory,
        })
    }

    fn assets_file(&self) -> PathBuf {
        self.directory.join("obj").join("project.assets.json")
    }

    fn lock_json(&self) -> PathBuf {
        self.directory.join("project.lock.json")
    }

    fn packages_config(&self) -> PathBuf {
        self.directory.join("packages.config")
    }

    fn project_json(&self) -> PathBuf {
        self.directory.join("project.json")
    }
}

/// Inspect one project. Failures are reported in the result, not raised;
/// the caller decides whether they are fatal.
pub fn inspect_project(paths: &ProjectPaths, registry: &dyn MetadataSource) -> InspectionResult {
    info!("processing project {}", paths.name);
    match gather(paths, registry) {
        Ok((version, graph)) => {
            info!("finished processing project {}", paths.name);
            InspectionResult::success(paths.name.clone(), version, graph)
        }
        Err(e) => InspectionResult::failure(paths.name.clone(), e),
    }
}

fn gather(
    paths: &ProjectPaths,
    registry: &dyn MetadataSource,
) -> miette::Result<(Option<String>, nuscan_resolver::graph::ResolutionGraph)> {
    // The project XML is parsed up front when present: it supplies the
    // project version and requested framework even when a lock document
    // drives resolution.
    let project_file = if paths.project_file.is_file() {
        Some(project::load_project_xml(&paths.project_file)?)
    } else {
        None
    };
    let version = project_file.as_ref().map(|p| p.version_or_default());

    let manifest = detect_manifest(paths, project_file.as_ref())?;
    let graph = strategy::resolve_manifest(&manifest, registry);
    Ok((version, graph))
}

fn detect_manifest(
    paths: &ProjectPaths,
    project_file: Option<&ProjectFile>,
) -> miette::Result<ProjectManifest> {
    let assets = paths.assets_file();
    if assets.is_file() {
        debug!("using lock document {}", assets.display());
        return Ok(ProjectManifest::Lock(LockDocument::from_path(&assets)?));
    }
    let lock_json = paths.lock_json();
    if lock_json.is_file() {
        debug!("using lock document {}", lock_json.display());
        return Ok(ProjectManifest::Lock(LockDocument::from_path(&lock_json)?));
    }

    let packages_config = paths.packages_config();
    if packages_config.is_file() {
        debug!("using package list {}", packages_config.display());
        let content =
            std::fs::read_to_string(&packages_config).map_err(|e| NuscanError::Generic {
                message: format!("Failed to read {}: {e}", packages_config.display()),
            })?;
        return Ok(ProjectManifest::PackageList(project::parse_packages_config(
            &content,
        )?));
    }

    let project_json = paths.project_json();
    if project_json.is_file() {
        debug!("using project.json {}", project_json.display());
        let content = std::fs::read_to_string(&project_json).map_err(|e| NuscanError::Generic {
            message: format!("Failed to read {}: {e}", project_json.display()),
        })?;
        return Ok(ProjectManifest::References(project::parse_project_json(
            &content,
        )?));
    }

    let Some(project_file) = project_file else {
        return Err(NuscanError::Project {
            message: format!(
                "no manifest found for project '{}' at {}",
                paths.name,
                paths.project_file.display()
            ),
        }
        .into());
    };

    // Legacy versioned assembly references win over the raw
    // PackageReference scan when both appear.
    let requirements: Vec<PackageRequirement> = if !project_file.assembly_references.is_empty() {
        project_file.assembly_references.clone()
    } else {
        project_file.package_references.clone()
    };
    let framework = project_file.target_framework.clone();
    Ok(ProjectManifest::References(
        requirements
            .into_iter()
            .map(|r| {
                let fw = r.framework.clone().or_else(|| framework.clone());
                r.with_framework(fw)
            })
            .collect(),
    ))
}
