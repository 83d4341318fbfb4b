//! Registration index parsing and the published-package metadata model.
//!
//! The registry exposes, per package name, a paged registration index
//! whose leaves carry a catalog entry: the exact version plus its
//! dependency groups, one per supported runtime profile.

use serde::Deserialize;
use tracing::warn;

use nuscan_core::framework::{self, FrameworkSpec, TargetFramework};
use nuscan_core::package::PackageRequirement;
use nuscan_core::version::{NuGetVersion, VersionRange};

/// The identity of one published package version.
#[derive(Debug, Clone)]
pub struct PackageIdentity {
    /// Canonical name as the registry reports it.
    pub name: String,
    pub version: NuGetVersion,
}

/// Metadata for one published package version.
#[derive(Debug, Clone)]
pub struct PackageMetadata {
    pub identity: PackageIdentity,
    pub dependency_groups: Vec<DependencyGroup>,
}

/// A dependency group declared for one runtime profile.
#[derive(Debug, Clone)]
pub struct DependencyGroup {
    pub target_framework: FrameworkSpec,
    pub packages: Vec<PackageRequirement>,
}

/// Select the dependencies that apply when resolving for `framework`.
///
/// With no requested framework, or no declared groups, every declared
/// dependency applies. When groups exist but none is compatible, all
/// groups' packages are used: dropping the profile information beats
/// silently producing an incomplete graph.
pub fn compatible_packages<'a>(
    groups: &'a [DependencyGroup],
    framework: Option<&TargetFramework>,
) -> Vec<&'a PackageRequirement> {
    let Some(requested) = framework else {
        return groups.iter().flat_map(|g| g.packages.iter()).collect();
    };
    if groups.is_empty() {
        return Vec::new();
    }

    let matching: Vec<&DependencyGroup> = groups
        .iter()
        .filter(|g| framework::is_compatible(requested, &g.target_framework))
        .collect();

    if matching.is_empty() {
        warn!("no dependency group matches framework '{requested}', using all groups");
        return groups.iter().flat_map(|g| g.packages.iter()).collect();
    }

    matching.iter().flat_map(|g| g.packages.iter()).collect()
}

// Wire format of the registration index.

#[derive(Debug, Deserialize)]
pub(crate) struct RegistrationIndex {
    #[serde(default)]
    pub items: Vec<RegistrationPage>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RegistrationPage {
    #[serde(rename = "@id", default)]
    pub id: Option<String>,
    /// Inline leaves; large packages page them out behind `@id`.
    #[serde(default)]
    pub items: Option<Vec<RegistrationLeaf>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RegistrationLeaf {
    #[serde(rename = "catalogEntry", default)]
    pub catalog_entry: Option<CatalogEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct CatalogEntry {
    pub id: String,
    pub version: String,
    #[serde(rename = "dependencyGroups", default)]
    pub dependency_groups: Vec<CatalogDependencyGroup>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct CatalogDependencyGroup {
    #[serde(rename = "targetFramework", default)]
    pub target_framework: Option<String>,
    #[serde(default)]
    pub dependencies: Vec<CatalogDependency>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct CatalogDependency {
    pub id: String,
    #[serde(default)]
    pub range: Option<String>,
}

impl CatalogEntry {
    /// Convert a catalog entry into the domain model, dropping entries
    /// whose version the registry itself could not have produced.
    pub(crate) fn into_metadata(self) -> Option<PackageMetadata> {
        let version = match NuGetVersion::parse(&self.version) {
            Some(v) => v,
            None => {
                warn!(
                    "registry returned unparseable version '{}' for '{}'",
                    self.version, self.id
                );
                return None;
            }
        };

        let dependency_groups = self
            .dependency_groups
            .into_iter()
            .map(|group| {
                let target_framework =
                    FrameworkSpec::parse(group.target_framework.as_deref().unwrap_or(""));
                let packages = group
                    .dependencies
                    .into_iter()
                    .filter_map(|dep| {
                        let range = match dep.range.as_deref() {
                            None | Some("") => VersionRange::any(),
                            Some(raw) => match VersionRange::parse(raw) {
                                Ok(r) => r,
                                Err(e) => {
                                    warn!("dependency '{}' has bad range: {e}", dep.id);
                                    return None;
                                }
                            },
                        };
                        Some(PackageRequirement::new(dep.id, range))
                    })
                    .collect();
                DependencyGroup {
                    target_framework,
                    packages,
                }
            })
            .collect();

        Some(PackageMetadata {
            identity: PackageIdentity {
                name: self.id,
                version,
            },
            dependency_groups,
        })
    }
}

/// Parse a registration index document into its pages.
pub(crate) fn parse_registration_index(json: &str) -> Result<RegistrationIndex, serde_json::Error> {
    serde_json::from_str(json)
}

/// Parse a standalone registration page document.
pub(crate) fn parse_registration_page(json: &str) -> Result<RegistrationPage, serde_json::Error> {
    serde_json::from_str(json)
}
