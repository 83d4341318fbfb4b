//! In-memory registry fixture for resolver tests.

use std::collections::HashMap;

use nuscan_core::framework::FrameworkSpec;
use nuscan_core::package::PackageRequirement;
use nuscan_core::version::{NuGetVersion, VersionRange};
use nuscan_registry::metadata::{DependencyGroup, PackageIdentity, PackageMetadata};
use nuscan_registry::search::MetadataSource;

/// A canned registry: package versions registered up front, looked up by
/// case-insensitive name like the real metadata service.
#[derive(Default)]
pub struct StubRegistry {
    packages: HashMap<String, Vec<PackageMetadata>>,
}

impl StubRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a version whose dependencies apply to any framework.
    pub fn package(self, name: &str, version: &str, deps: &[(&str, &str)]) -> Self {
        self.package_for_framework(name, version, "any", deps)
    }

    /// Register a version with one dependency group scoped to `moniker`.
    pub fn package_for_framework(
        mut self,
        name: &str,
        version: &str,
        moniker: &str,
        deps: &[(&str, &str)],
    ) -> Self {
        let metadata = PackageMetadata {
            identity: PackageIdentity {
                name: name.to_string(),
                version: NuGetVersion::parse(version).expect("stub version parses"),
            },
            dependency_groups: vec![DependencyGroup {
                target_framework: FrameworkSpec::parse(moniker),
                packages: deps
                    .iter()
                    .map(|(dep, range)| {
                        PackageRequirement::new(
                            *dep,
                            VersionRange::parse(range).expect("stub range parses"),
                        )
                    })
                    .collect(),
            }],
        };
        self.packages
            .entry(name.to_ascii_lowercase())
            .or_default()
            .push(metadata);
        self
    }
}

impl MetadataSource for StubRegistry {
    fn find_packages(&self, name: &str) -> Option<Vec<PackageMetadata>> {
        self.packages.get(&name.to_ascii_lowercase()).cloned()
    }
}
