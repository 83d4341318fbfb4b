//! Inspection settings: defaults, the `nuscan.toml` settings file, and the
//! explicit CLI > settings file > default precedence merge.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use nuscan_util::errors::NuscanError;

/// Default request timeout per registry endpoint, in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Default output directory name, created next to the working directory.
pub const DEFAULT_OUTPUT_DIR: &str = "nuscan_output";

/// Fully merged settings driving one inspection run.
#[derive(Debug, Clone)]
pub struct InspectionSettings {
    /// Solution or project file to inspect.
    pub target: PathBuf,
    pub output_dir: PathBuf,
    /// Registry endpoints tried in order; empty means "use the default".
    pub registry_urls: Vec<String>,
    /// Project names to skip.
    pub excluded_projects: Vec<String>,
    /// Downgrade per-project failures to warnings.
    pub ignore_failure: bool,
    pub request_timeout_secs: u64,
}

/// Optional values from a `nuscan.toml` settings file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SettingsFile {
    #[serde(default, rename = "output-dir")]
    pub output_dir: Option<String>,
    #[serde(default, rename = "registry-urls")]
    pub registry_urls: Option<Vec<String>>,
    #[serde(default, rename = "excluded-projects")]
    pub excluded_projects: Option<Vec<String>>,
    #[serde(default, rename = "ignore-failure")]
    pub ignore_failure: Option<bool>,
    #[serde(default, rename = "request-timeout-secs")]
    pub request_timeout_secs: Option<u64>,
}

impl SettingsFile {
    /// Load the settings file, or return defaults if it doesn't exist.
    pub fn load(path: &Path) -> miette::Result<Self> {
        if !path.is_file() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path).map_err(|e| NuscanError::Generic {
            message: format!("Failed to read settings file {}: {e}", path.display()),
        })?;
        toml::from_str(&content).map_err(|e| {
            NuscanError::Generic {
                message: format!("Failed to parse settings file {}: {e}", path.display()),
            }
            .into()
        })
    }
}

/// Values supplied on the command line; each one beats the settings file.
#[derive(Debug, Clone, Default)]
pub struct SettingsOverrides {
    pub output_dir: Option<PathBuf>,
    pub registry_urls: Option<Vec<String>>,
    pub excluded_projects: Option<Vec<String>>,
    pub ignore_failure: Option<bool>,
    pub request_timeout_secs: Option<u64>,
}

impl InspectionSettings {
    /// Field-by-field precedence merge: CLI flag, then settings file, then
    /// the built-in default.
    pub fn merge(target: PathBuf, file: SettingsFile, cli: SettingsOverrides) -> Self {
        Self {
            target,
            output_dir: cli
                .output_dir
                .or(file.output_dir.map(PathBuf::from))
                .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR)),
            registry_urls: cli
                .registry_urls
                .or(file.registry_urls)
                .unwrap_or_default(),
            excluded_projects: cli
                .excluded_projects
                .or(file.excluded_projects)
                .unwrap_or_default(),
            ignore_failure: cli
                .ignore_failure
                .or(file.ignore_failure)
                .unwrap_or(false),
            request_timeout_secs: cli
                .request_timeout_secs
                .or(file.request_timeout_secs)
                .unwrap_or(DEFAULT_TIMEOUT_SECS),
        }
    }

    /// Split a comma-separated CLI list into trimmed, non-empty entries.
    pub fn split_list(raw: &str) -> Vec<String> {
        raw.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    }
}
