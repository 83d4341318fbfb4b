//! Shared-version resolution: one version per package name across the
//! whole graph, the way the legacy package manager resolves a
//! `packages.config`.
//!
//! Every requirement discovered for a name tightens that name's allowed
//! range; the registry is asked for the best version inside the
//! intersection. An empty intersection is a hard error: the whole point
//! of this strategy is reporting what the real package manager would have
//! picked or rejected.

use std::collections::{HashMap, HashSet};

use tracing::debug;

use nuscan_core::framework::TargetFramework;
use nuscan_core::package::{PackageId, PackageRequirement};
use nuscan_core::version::{NuGetVersion, VersionRange};
use nuscan_registry::metadata::compatible_packages;
use nuscan_registry::search::MetadataSource;
use nuscan_util::errors::NuscanError;

use crate::graph::PackageSetBuilder;

/// Per-name resolution state.
struct ResolutionData {
    /// Canonical name as the registry reports it.
    name: String,
    current_version: Option<NuGetVersion>,
    /// At most one externally pinned range per name; a second is a
    /// configuration error (two roots pinning the same name differently).
    external_range: Option<VersionRange>,
    /// Ranges this package declares on others, keyed by lowercase name.
    dependencies: HashMap<String, VersionRange>,
}

/// Resolver enforcing a single version per package name.
pub struct FlatResolver<'a> {
    registry: &'a dyn MetadataSource,
    data: HashMap<String, ResolutionData>,
    in_progress: HashSet<String>,
}

impl<'a> FlatResolver<'a> {
    pub fn new(registry: &'a dyn MetadataSource) -> Self {
        Self {
            registry,
            data: HashMap::new(),
            in_progress: HashSet::new(),
        }
    }

    /// Resolve every requirement and emit the result into `builder`.
    pub fn resolve_all(
        &mut self,
        requirements: &[PackageRequirement],
        builder: &mut PackageSetBuilder,
    ) -> miette::Result<()> {
        for requirement in requirements {
            self.resolve(
                &requirement.name,
                requirement.framework.as_ref(),
                Some(requirement.range.clone()),
            )?;
        }
        self.emit(builder);
        Ok(())
    }

    fn resolve(
        &mut self,
        name: &str,
        framework: Option<&TargetFramework>,
        override_range: Option<VersionRange>,
    ) -> miette::Result<()> {
        let key = name.to_ascii_lowercase();

        match self.data.get_mut(&key) {
            Some(data) => {
                if let Some(range) = override_range {
                    if data.external_range.is_some() {
                        return Err(NuscanError::Resolution {
                            message: format!(
                                "more than one external version range declared for '{name}'"
                            ),
                        }
                        .into());
                    }
                    data.external_range = Some(range);
                }
            }
            None => {
                self.data.insert(
                    key.clone(),
                    ResolutionData {
                        name: name.to_string(),
                        current_version: None,
                        external_range: override_range,
                        dependencies: HashMap::new(),
                    },
                );
            }
        }

        // A name we are already descending through is a circular
        // declaration; re-intersecting it here would recurse forever.
        if !self.in_progress.insert(key.clone()) {
            return Ok(());
        }
        let result = self.resolve_pinned(&key, framework);
        self.in_progress.remove(&key);
        result
    }

    fn resolve_pinned(
        &mut self,
        key: &str,
        framework: Option<&TargetFramework>,
    ) -> miette::Result<()> {
        let (lookup_name, external_range) = {
            let data = &self.data[key];
            (data.name.clone(), data.external_range.clone())
        };

        let mut ranges = self.ranges_recorded_for(key);
        if let Some(external) = external_range {
            ranges.push(external);
        }
        let combined = VersionRange::common_subset(&ranges);

        let Some(best) = self.registry.find_best_package(&lookup_name, &combined) else {
            return Err(NuscanError::Resolution {
                message: format!(
                    "no published version of '{lookup_name}' satisfies '{combined}'; \
                     a requirement conflict exists or the registry is misconfigured"
                ),
            }
            .into());
        };
        debug!(
            "pinned '{}' to {}",
            best.identity.name,
            best.identity.version.normalized()
        );

        let declared: Vec<PackageRequirement> =
            compatible_packages(&best.dependency_groups, framework)
                .into_iter()
                .cloned()
                .collect();

        {
            let data = self
                .data
                .get_mut(key)
                .expect("resolution record exists for in-progress name");
            data.name = best.identity.name.clone();
            data.current_version = Some(best.identity.version.clone());
            data.dependencies.clear();
        }

        for dep in declared {
            if let Some(data) = self.data.get_mut(key) {
                data.dependencies
                    .insert(dep.name.to_ascii_lowercase(), dep.range.clone());
            }
            // Revisiting an already-pinned name only tightens its range.
            self.resolve(&dep.name, framework, None)?;
        }

        Ok(())
    }

    /// Every range any already-visited package declares on `key`.
    fn ranges_recorded_for(&self, key: &str) -> Vec<VersionRange> {
        self.data
            .values()
            .filter_map(|data| data.dependencies.get(key))
            .cloned()
            .collect()
    }

    /// Emit one vertex per resolved name, with edges mapped through the
    /// final pinned versions.
    fn emit(&self, builder: &mut PackageSetBuilder) {
        for data in self.data.values() {
            let Some(ref version) = data.current_version else {
                continue;
            };
            let id = PackageId::new(data.name.clone(), version.normalized());
            let dependencies: Vec<PackageId> = data
                .dependencies
                .keys()
                .filter_map(|dep_key| {
                    let dep = self.data.get(dep_key)?;
                    let dep_version = dep.current_version.as_ref()?;
                    Some(PackageId::new(dep.name.clone(), dep_version.normalized()))
                })
                .collect();
            builder.add_or_update_with_dependencies(&id, dependencies);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::StubRegistry;

    fn requirement(name: &str, range: &str) -> PackageRequirement {
        PackageRequirement::new(name, VersionRange::parse(range).unwrap())
    }

    #[test]
    fn resolves_transitive_chain() {
        let registry = StubRegistry::new()
            .package("A", "1.5.0", &[("B", "[1.0.0]")])
            .package("B", "1.0.0", &[]);

        let mut builder = PackageSetBuilder::new();
        let mut resolver = FlatResolver::new(&registry);
        resolver
            .resolve_all(&[requirement("A", "[1.0.0, 2.0.0)")], &mut builder)
            .unwrap();

        let graph = builder.build_graph();
        assert_eq!(graph.packages.len(), 2);

        let a = graph
            .packages
            .iter()
            .find(|p| p.package_id.name == "A")
            .unwrap();
        assert_eq!(a.package_id.version, "1.5.0");
        assert_eq!(a.dependencies.len(), 1);
        assert!(a.dependencies.contains(&PackageId::new("B", "1.0.0")));

        assert_eq!(graph.dependencies, vec![PackageId::new("A", "1.5.0")]);
    }

    #[test]
    fn picks_highest_not_first() {
        let registry = StubRegistry::new()
            .package("A", "1.0.0", &[])
            .package("A", "1.2.0", &[])
            .package("A", "1.9.0", &[]);

        let mut builder = PackageSetBuilder::new();
        let mut resolver = FlatResolver::new(&registry);
        resolver
            .resolve_all(&[requirement("A", "[1.0.0, 2.0.0)")], &mut builder)
            .unwrap();

        let graph = builder.build_graph();
        assert_eq!(graph.packages[0].package_id.version, "1.9.0");
    }

    #[test]
    fn shared_version_tightens_across_branches() {
        // Both roots pull in C; the second constrains it below 2.0, so the
        // shared pin must land on 1.5.0 everywhere.
        let registry = StubRegistry::new()
            .package("A", "1.0.0", &[("C", "[1.0.0, )")])
            .package("B", "1.0.0", &[("C", "[1.0.0, 2.0.0)")])
            .package("C", "1.5.0", &[])
            .package("C", "2.5.0", &[]);

        let mut builder = PackageSetBuilder::new();
        let mut resolver = FlatResolver::new(&registry);
        resolver
            .resolve_all(
                &[requirement("A", "[1.0.0]"), requirement("B", "[1.0.0]")],
                &mut builder,
            )
            .unwrap();

        let graph = builder.build_graph();
        let c_versions: Vec<&str> = graph
            .packages
            .iter()
            .filter(|p| p.package_id.name == "C")
            .map(|p| p.package_id.version.as_str())
            .collect();
        assert_eq!(c_versions, vec!["1.5.0"]);

        let a = graph
            .packages
            .iter()
            .find(|p| p.package_id.name == "A")
            .unwrap();
        assert!(a.dependencies.contains(&PackageId::new("C", "1.5.0")));
    }

    #[test]
    fn conflicting_exact_pins_fail() {
        let registry = StubRegistry::new()
            .package("A", "1.0.0", &[])
            .package("A", "2.0.0", &[]);

        let mut builder = PackageSetBuilder::new();
        let mut resolver = FlatResolver::new(&registry);
        let result = resolver.resolve_all(
            &[requirement("A", "[1.0.0]"), requirement("A", "[2.0.0]")],
            &mut builder,
        );
        assert!(result.is_err());
    }

    #[test]
    fn unsatisfiable_range_fails_loudly() {
        let registry = StubRegistry::new().package("A", "1.0.0", &[]);

        let mut builder = PackageSetBuilder::new();
        let mut resolver = FlatResolver::new(&registry);
        let err = resolver
            .resolve_all(&[requirement("A", "[5.0.0, )")], &mut builder)
            .unwrap_err();
        assert!(err.to_string().contains('A'));
    }

    #[test]
    fn circular_declarations_terminate() {
        let registry = StubRegistry::new()
            .package("A", "1.0.0", &[("B", "[1.0.0]")])
            .package("B", "1.0.0", &[("A", "[1.0.0]")]);

        let mut builder = PackageSetBuilder::new();
        let mut resolver = FlatResolver::new(&registry);
        resolver
            .resolve_all(&[requirement("A", "[1.0.0]")], &mut builder)
            .unwrap();

        let graph = builder.build_graph();
        assert_eq!(graph.packages.len(), 2);
        // A cycle has no vertex without dependents.
        assert!(graph.dependencies.is_empty());
    }

    #[test]
    fn reruns_are_deterministic() {
        let registry = StubRegistry::new()
            .package("A", "1.0.0", &[("B", "[1.0.0, )")])
            .package("B", "1.0.0", &[])
            .package("B", "2.0.0", &[]);

        let run = || {
            let mut builder = PackageSetBuilder::new();
            let mut resolver = FlatResolver::new(&registry);
            resolver
                .resolve_all(&[requirement("A", "[1.0.0]")], &mut builder)
                .unwrap();
            builder.build_graph()
        };
        let first = run();
        let second = run();
        assert_eq!(first.packages, second.packages);
        assert_eq!(first.dependencies, second.dependencies);
    }

    #[test]
    fn reports_registry_casing() {
        let registry = StubRegistry::new().package("Newtonsoft.Json", "12.0.3", &[]);

        let mut builder = PackageSetBuilder::new();
        let mut resolver = FlatResolver::new(&registry);
        resolver
            .resolve_all(&[requirement("newtonsoft.json", "[12.0.3]")], &mut builder)
            .unwrap();

        let graph = builder.build_graph();
        assert_eq!(graph.packages[0].package_id.name, "Newtonsoft.Json");
    }
}
