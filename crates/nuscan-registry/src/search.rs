//! Package metadata search: the lookup contract consumed by resolvers and
//! its HTTP-backed implementation.

use std::time::Duration;

use reqwest::blocking::Client;
use tracing::{debug, warn};

use nuscan_core::framework::TargetFramework;
use nuscan_core::package::PackageRequirement;
use nuscan_core::version::{NuGetVersion, VersionRange};

use crate::client;
use crate::metadata::{self, compatible_packages, PackageMetadata};
use crate::source::RegistrySource;

/// The metadata lookup contract.
///
/// `find_packages` returns every known version of a package, or `None`
/// when no configured endpoint knows the name. Implementations must treat
/// individual endpoint failures as skippable, never as fatal.
pub trait MetadataSource {
    fn find_packages(&self, name: &str) -> Option<Vec<PackageMetadata>>;

    /// All known versions plus best-match selection in one step.
    fn find_best_package(&self, name: &str, range: &VersionRange) -> Option<PackageMetadata> {
        let packages = self.find_packages(name)?;
        let versions: Vec<NuGetVersion> = packages
            .iter()
            .map(|p| p.identity.version.clone())
            .collect();
        let best = range.find_best_match(&versions)?.clone();
        packages.into_iter().find(|p| p.identity.version == best)
    }

    /// The declared dependencies of one exact package version, filtered
    /// for a requested framework.
    fn dependencies_for_package(
        &self,
        name: &str,
        version: &NuGetVersion,
        framework: Option<&TargetFramework>,
    ) -> Vec<PackageRequirement> {
        let Some(packages) = self.find_packages(name) else {
            return Vec::new();
        };
        let Some(package) = packages.iter().find(|p| p.identity.version == *version) else {
            return Vec::new();
        };
        compatible_packages(&package.dependency_groups, framework)
            .into_iter()
            .cloned()
            .collect()
    }
}

/// Registry-backed metadata search over an ordered endpoint list.
pub struct RegistrySearch {
    client: Client,
    sources: Vec<RegistrySource>,
}

impl RegistrySearch {
    /// Build a search handle over the configured registry URLs.
    pub fn new(urls: &[String], timeout: Duration) -> miette::Result<Self> {
        Ok(Self {
            client: client::build_client(timeout)?,
            sources: RegistrySource::from_urls(urls),
        })
    }

    /// Fetch and flatten one source's registration index for a package.
    ///
    /// Pages without inline leaves are fetched individually; a page that
    /// fails to load is skipped so one bad page cannot hide the rest.
    fn fetch_from_source(
        &self,
        source: &RegistrySource,
        name: &str,
    ) -> Result<Vec<PackageMetadata>, String> {
        let url = source.registration_index_url(name);
        let response = self
            .client
            .get(&url)
            .send()
            .map_err(|e| format!("request to {url} failed: {e}"))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(Vec::new());
        }
        if !response.status().is_success() {
            return Err(format!("HTTP {} from {url}", response.status()));
        }

        let body = response
            .text()
            .map_err(|e| format!("failed to read {url}: {e}"))?;
        let index = metadata::parse_registration_index(&body)
            .map_err(|e| format!("bad registration index from {url}: {e}"))?;

        let mut packages = Vec::new();
        for page in index.items {
            let leaves = match page.items {
                Some(leaves) => leaves,
                None => match page.id.as_deref() {
                    Some(page_url) => match self.fetch_page(page_url) {
                        Ok(leaves) => leaves,
                        Err(e) => {
                            warn!("skipping registration page for '{name}': {e}");
                            continue;
                        }
                    },
                    None => continue,
                },
            };
            for leaf in leaves {
                if let Some(entry) = leaf.catalog_entry {
                    if let Some(metadata) = entry.into_metadata() {
                        packages.push(metadata);
                    }
                }
            }
        }
        Ok(packages)
    }

    fn fetch_page(&self, url: &str) -> Result<Vec<metadata::RegistrationLeaf>, String> {
        let response = self
            .client
            .get(url)
            .send()
            .map_err(|e| format!("request to {url} failed: {e}"))?;
        if !response.status().is_success() {
            return Err(format!("HTTP {} from {url}", response.status()));
        }
        let body = response
            .text()
            .map_err(|e| format!("failed to read {url}: {e}"))?;
        let page = metadata::parse_registration_page(&body)
            .map_err(|e| format!("bad registration page {url}: {e}"))?;
        Ok(page.items.unwrap_or_default())
    }
}

impl MetadataSource for RegistrySearch {
    /// Query endpoints in order and return the first non-empty result.
    /// An unreachable endpoint is logged and skipped; only when every
    /// endpoint comes up empty does the lookup report "not found".
    fn find_packages(&self, name: &str) -> Option<Vec<PackageMetadata>> {
        for source in &self.sources {
            match self.fetch_from_source(source, name) {
                Ok(packages) if !packages.is_empty() => {
                    debug!(
                        "found {} versions of '{name}' at {}",
                        packages.len(),
                        source.name
                    );
                    return Some(packages);
                }
                Ok(_) => continue,
                Err(e) => {
                    warn!("registry '{}' failed for '{name}': {e}", source.name);
                    continue;
                }
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::{DependencyGroup, PackageIdentity};
    use nuscan_core::framework::FrameworkSpec;
    use std::collections::HashMap;

    /// In-memory metadata source for exercising the contract's provided
    /// methods without a network.
    struct FixtureSource {
        packages: HashMap<String, Vec<PackageMetadata>>,
    }

    impl MetadataSource for FixtureSource {
        fn find_packages(&self, name: &str) -> Option<Vec<PackageMetadata>> {
            self.packages.get(&name.to_ascii_lowercase()).cloned()
        }
    }

    fn package(name: &str, version: &str, deps: &[(&str, &str)]) -> PackageMetadata {
        PackageMetadata {
            identity: PackageIdentity {
                name: name.to_string(),
                version: NuGetVersion::parse(version).unwrap(),
            },
            dependency_groups: vec![DependencyGroup {
                target_framework: FrameworkSpec::Any,
                packages: deps
                    .iter()
                    .map(|(n, r)| PackageRequirement::new(*n, VersionRange::parse(r).unwrap()))
                    .collect(),
            }],
        }
    }

    fn fixture() -> FixtureSource {
        let mut packages = HashMap::new();
        packages.insert(
            "lib".to_string(),
            vec![
                package("Lib", "1.0.0", &[]),
                package("Lib", "1.5.0", &[("Dep", "[1.0.0, )")]),
                package("Lib", "2.0.0-beta", &[]),
            ],
        );
        packages.insert("dep".to_string(), vec![package("Dep", "1.2.0", &[])]);
        FixtureSource { packages }
    }

    #[test]
    fn best_package_is_highest_in_range() {
        let source = fixture();
        let range = VersionRange::parse("[1.0.0, 2.0.0)").unwrap();
        let best = source.find_best_package("Lib", &range).unwrap();
        assert_eq!(best.identity.version.normalized(), "1.5.0");
    }

    #[test]
    fn best_package_none_outside_range() {
        let source = fixture();
        let range = VersionRange::parse("[3.0.0, )").unwrap();
        assert!(source.find_best_package("Lib", &range).is_none());
    }

    #[test]
    fn unknown_package_is_none() {
        let source = fixture();
        assert!(source.find_packages("Nope").is_none());
    }

    #[test]
    fn dependencies_for_exact_version() {
        let source = fixture();
        let version = NuGetVersion::parse("1.5.0").unwrap();
        let deps = source.dependencies_for_package("Lib", &version, None);
        assert_eq!(deps.len(), 1);
        assert_eq!(deps[0].name, "Dep");
    }
}
