//! Lock document model: `project.assets.json` / `project.lock.json`.
//!
//! A lock document is ground truth: it records, per runtime target, the
//! concrete libraries that were installed and the version ranges they
//! declared against each other. The model keeps only what resolution
//! needs; unknown fields are ignored.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;

use nuscan_util::errors::NuscanError;

use crate::version::{NuGetVersion, RangeParseError, VersionRange};

/// A parsed lock document.
#[derive(Debug, Clone, Deserialize)]
pub struct LockDocument {
    #[serde(default)]
    pub version: i64,
    /// Target framework -> "Name/Version" -> library entry.
    #[serde(default)]
    pub targets: BTreeMap<String, BTreeMap<String, TargetLibrary>>,
    #[serde(default)]
    pub project: Option<ProjectSection>,
}

/// One installed library within a target.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TargetLibrary {
    #[serde(rename = "type", default)]
    pub library_type: Option<String>,
    /// Dependency name -> declared range string.
    #[serde(default)]
    pub dependencies: BTreeMap<String, String>,
}

/// The `project` section carrying the declared top-level requirements.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProjectSection {
    #[serde(default)]
    pub version: Option<String>,
    /// Top-level requirement list (older lock formats).
    #[serde(default)]
    pub dependencies: BTreeMap<String, DependencySpec>,
    /// Per-framework requirement lists.
    #[serde(default)]
    pub frameworks: BTreeMap<String, FrameworkSection>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FrameworkSection {
    #[serde(default)]
    pub dependencies: BTreeMap<String, DependencySpec>,
}

/// A declared requirement, either a bare range string or the structured
/// form (`{"target": "Package", "version": "[12.0.3, )"}`).
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum DependencySpec {
    Range(String),
    Detailed {
        #[serde(default)]
        target: Option<String>,
        #[serde(default)]
        version: Option<String>,
    },
}

impl DependencySpec {
    pub fn range_str(&self) -> Option<&str> {
        match self {
            DependencySpec::Range(s) => Some(s),
            DependencySpec::Detailed { version, .. } => version.as_deref(),
        }
    }
}

impl LockDocument {
    /// Load and parse a lock document from disk.
    pub fn from_path(path: &Path) -> miette::Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| NuscanError::Generic {
            message: format!("Failed to read lock file {}: {e}", path.display()),
        })?;
        Self::from_str(&content)
    }

    pub fn from_str(content: &str) -> miette::Result<Self> {
        serde_json::from_str(content).map_err(|e| {
            NuscanError::Generic {
                message: format!("Failed to parse lock file: {e}"),
            }
            .into()
        })
    }

    /// Split a `"Name/Version"` library key into its two halves.
    pub fn split_library_key(key: &str) -> Option<(&str, &str)> {
        key.split_once('/')
    }
}

/// Convert free-form constraint text into an equivalent version range.
///
/// Lock formats sometimes encode constraints as text rather than interval
/// notation: `">= 1.2"`, `"> 1.0 < 2.0"`, or a bare version (which means
/// "at least" like everywhere else in the ecosystem).
pub fn parse_constraint_text(text: &str) -> Result<VersionRange, RangeParseError> {
    let s = text.trim();
    if !s.starts_with('>') && !s.starts_with('<') {
        return VersionRange::parse(s);
    }

    let mut range = VersionRange::any();
    let mut pieces = Vec::new();

    // Normalize "[op][spaces][version]" runs into (op, version) pairs.
    let mut rest = s;
    while !rest.is_empty() {
        let op_len = if rest.starts_with(">=") || rest.starts_with("<=") {
            2
        } else if rest.starts_with('>') || rest.starts_with('<') {
            1
        } else {
            return Err(RangeParseError {
                spec: text.to_string(),
                reason: format!("expected a comparison operator at '{rest}'"),
            });
        };
        let op = &rest[..op_len];
        rest = rest[op_len..].trim_start();
        let end = rest
            .find(|c: char| c == '>' || c == '<')
            .unwrap_or(rest.len());
        let version = rest[..end].trim();
        pieces.push((op, version));
        rest = rest[end..].trim_start();
    }

    for (op, version) in pieces {
        let v = NuGetVersion::parse(version).ok_or_else(|| RangeParseError {
            spec: text.to_string(),
            reason: format!("bad version '{version}'"),
        })?;
        match op {
            ">=" => {
                range.min = Some(v);
                range.min_inclusive = true;
            }
            ">" => {
                range.min = Some(v);
                range.min_inclusive = false;
            }
            "<=" => {
                range.max = Some(v);
                range.max_inclusive = true;
            }
            "<" => {
                range.max = Some(v);
                range.max_inclusive = false;
            }
            _ => unreachable!(),
        }
    }

    range.sync_original();
    Ok(range)
}
