//! Project manifest parsing: `.csproj` XML, `packages.config`, `project.json`.

use std::path::Path;

use quick_xml::events::Event;
use quick_xml::Reader;
use serde::Deserialize;
use tracing::warn;

use nuscan_util::errors::NuscanError;

use crate::framework::TargetFramework;
use crate::lockfile::{parse_constraint_text, DependencySpec};
use crate::package::PackageRequirement;
use crate::version::{NuGetVersion, VersionRange};

/// Declared dependency data scraped from a `.csproj` file.
#[derive(Debug, Clone, Default)]
pub struct ProjectFile {
    /// Project version from `Version` or `VersionPrefix`/`VersionSuffix`.
    pub version: Option<String>,
    pub target_framework: Option<TargetFramework>,
    /// `PackageReference` items with parsed version ranges.
    pub package_references: Vec<PackageRequirement>,
    /// Legacy `Reference` items carrying a versioned assembly name.
    pub assembly_references: Vec<PackageRequirement>,
}

impl ProjectFile {
    /// The project version, defaulting like the SDK does.
    pub fn version_or_default(&self) -> String {
        self.version.clone().unwrap_or_else(|| "1.0.0".to_string())
    }
}

/// Scan project XML for `PackageReference` items and version properties.
pub fn parse_project_xml(xml: &str) -> miette::Result<ProjectFile> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut project = ProjectFile::default();
    let mut version_prefix: Option<String> = None;
    let mut version_suffix: Option<String> = None;
    let mut path: Vec<String> = Vec::new();
    let mut text_buf = String::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).to_string();
                collect_reference_items(&name, e, &mut project);
                path.push(name);
                text_buf.clear();
            }
            Ok(Event::Empty(ref e)) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).to_string();
                collect_reference_items(&name, e, &mut project);
            }
            Ok(Event::Text(ref e)) => {
                text_buf = e.unescape().unwrap_or_default().to_string();
            }
            Ok(Event::End(_)) => {
                let tag = path.last().map(String::as_str).unwrap_or("");
                let inside_reference = path
                    .iter()
                    .any(|p| p == "PackageReference" || p == "Reference");

                if !inside_reference {
                    match tag {
                        "Version" => project.version = Some(text_buf.clone()),
                        "VersionPrefix" => version_prefix = Some(text_buf.clone()),
                        "VersionSuffix" => version_suffix = Some(text_buf.clone()),
                        "TargetFramework" => {
                            project.target_framework = TargetFramework::parse(&text_buf);
                        }
                        "TargetFrameworks" => {
                            // Multi-targeted project: resolve against the first.
                            if project.target_framework.is_none() {
                                project.target_framework = text_buf
                                    .split(';')
                                    .find_map(TargetFramework::parse);
                            }
                        }
                        _ => {}
                    }
                }

                path.pop();
                text_buf.clear();
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(NuscanError::Project {
                    message: format!("Failed to parse project XML: {e}"),
                }
                .into());
            }
            _ => {}
        }
    }

    if project.version.is_none() {
        if let Some(prefix) = version_prefix {
            project.version = Some(match version_suffix {
                Some(suffix) if !suffix.is_empty() => format!("{prefix}-{suffix}"),
                _ => prefix,
            });
        }
    }

    Ok(project)
}

fn collect_reference_items(
    tag: &str,
    e: &quick_xml::events::BytesStart<'_>,
    project: &mut ProjectFile,
) {
    match tag {
        "PackageReference" => {
            if let Some(req) = package_reference_from_attrs(e) {
                project.package_references.push(req);
            }
        }
        "Reference" => {
            if let Some(req) = assembly_reference_from_attrs(e) {
                project.assembly_references.push(req);
            }
        }
        _ => {}
    }
}

/// Legacy reference syntax: `<Reference Include="NLog, Version=4.0.0.0,
/// Culture=neutral, ...">`. The assembly version's trailing revision is
/// dropped to approximate the package version.
fn assembly_reference_from_attrs(
    e: &quick_xml::events::BytesStart<'_>,
) -> Option<PackageRequirement> {
    let mut include: Option<String> = None;
    for attr in e.attributes().flatten() {
        if attr.key.as_ref() == b"Include" {
            include = attr.unescape_value().ok().map(|v| v.to_string());
        }
    }

    let include = include?;
    let name = include.split(',').next()?.trim();
    let version_part = include.split("Version=").nth(1)?;
    let raw = version_part.split(',').next()?.trim();

    let parts: Vec<&str> = raw.split('.').collect();
    let truncated = if parts.len() == 4 {
        parts[..3].join(".")
    } else {
        raw.to_string()
    };

    match NuGetVersion::parse(&truncated) {
        Some(v) => Some(PackageRequirement::new(name, VersionRange::exact(v))),
        None => {
            warn!("skipping reference '{name}' with unparseable version '{raw}'");
            None
        }
    }
}

fn package_reference_from_attrs(e: &quick_xml::events::BytesStart<'_>) -> Option<PackageRequirement> {
    let mut include: Option<String> = None;
    let mut version: Option<String> = None;

    for attr in e.attributes().flatten() {
        let key = String::from_utf8_lossy(attr.key.as_ref()).to_string();
        let value = match attr.unescape_value() {
            Ok(v) => v.to_string(),
            Err(_) => continue,
        };
        match key.as_str() {
            "Include" => include = Some(value),
            "Version" => version = Some(value),
            _ => {}
        }
    }

    let name = include?;
    let raw = version?;
    match VersionRange::parse(&raw) {
        Ok(range) => Some(PackageRequirement::new(name, range)),
        Err(e) => {
            warn!("skipping PackageReference '{name}': {e}");
            None
        }
    }
}

/// Parse `packages.config`: each entry is an exact pin, optionally scoped
/// to the framework the package was installed for.
pub fn parse_packages_config(xml: &str) -> miette::Result<Vec<PackageRequirement>> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut requirements = Vec::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) | Ok(Event::Empty(ref e)) => {
                if e.name().as_ref() != b"package" {
                    continue;
                }
                let mut id: Option<String> = None;
                let mut version: Option<String> = None;
                let mut framework: Option<TargetFramework> = None;
                for attr in e.attributes().flatten() {
                    let key = String::from_utf8_lossy(attr.key.as_ref()).to_string();
                    let value = match attr.unescape_value() {
                        Ok(v) => v.to_string(),
                        Err(_) => continue,
                    };
                    match key.as_str() {
                        "id" => id = Some(value),
                        "version" => version = Some(value),
                        "targetFramework" => framework = TargetFramework::parse(&value),
                        _ => {}
                    }
                }
                let (Some(id), Some(raw)) = (id, version) else {
                    continue;
                };
                match NuGetVersion::parse(&raw) {
                    Some(v) => requirements.push(
                        PackageRequirement::new(id, VersionRange::exact(v))
                            .with_framework(framework),
                    ),
                    None => warn!("skipping package '{id}' with unparseable version '{raw}'"),
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(NuscanError::Project {
                    message: format!("Failed to parse packages.config: {e}"),
                }
                .into());
            }
            _ => {}
        }
    }

    Ok(requirements)
}

/// The subset of `project.json` that declares dependencies.
#[derive(Debug, Clone, Deserialize)]
struct ProjectJson {
    #[serde(default)]
    dependencies: std::collections::BTreeMap<String, DependencySpec>,
}

/// Parse `project.json` dependency declarations.
pub fn parse_project_json(content: &str) -> miette::Result<Vec<PackageRequirement>> {
    let model: ProjectJson = serde_json::from_str(content).map_err(|e| NuscanError::Project {
        message: format!("Failed to parse project.json: {e}"),
    })?;

    let mut requirements = Vec::new();
    for (name, spec) in &model.dependencies {
        let Some(raw) = spec.range_str() else {
            warn!("dependency '{name}' has no version, skipping");
            continue;
        };
        match parse_constraint_text(raw) {
            Ok(range) => requirements.push(PackageRequirement::new(name.clone(), range)),
            Err(e) => warn!("skipping dependency '{name}': {e}"),
        }
    }
    Ok(requirements)
}

/// Read and parse a project XML file from disk.
pub fn load_project_xml(path: &Path) -> miette::Result<ProjectFile> {
    let content = std::fs::read_to_string(path).map_err(|e| NuscanError::Generic {
        message: format!("Failed to read {}: {e}", path.display()),
    })?;
    parse_project_xml(&content)
}
