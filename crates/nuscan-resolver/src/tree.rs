//! Per-branch resolution: each requirement is matched against the
//! registry independently, with no single-version-per-name guarantee.
//!
//! Two branches asking for the same name with disjoint ranges simply
//! produce two vertices. Unresolvable requirements are logged and
//! skipped, never fatal, which is why this strategy backs up the flat
//! one.

use std::collections::HashSet;

use tracing::warn;

use nuscan_core::framework::TargetFramework;
use nuscan_core::package::{PackageId, PackageRequirement};
use nuscan_registry::metadata::compatible_packages;
use nuscan_registry::search::MetadataSource;

use crate::graph::PackageSetBuilder;

/// Resolver matching every requirement against its own local range only.
pub struct TreeResolver<'a> {
    registry: &'a dyn MetadataSource,
}

impl<'a> TreeResolver<'a> {
    pub fn new(registry: &'a dyn MetadataSource) -> Self {
        Self { registry }
    }

    /// Resolve each requirement into `builder`, independently.
    pub fn add_all(&self, requirements: &[PackageRequirement], builder: &mut PackageSetBuilder) {
        let mut visited = HashSet::new();
        for requirement in requirements {
            if self
                .resolve_requirement(requirement, requirement.framework.as_ref(), builder, &mut visited)
                .is_none()
            {
                warn!(
                    "unable to find a package for '{}' matching '{}'",
                    requirement.name, requirement.range
                );
            }
        }
    }

    /// Resolve one requirement, descending into its dependencies, and
    /// return the vertex it mapped to.
    fn resolve_requirement(
        &self,
        requirement: &PackageRequirement,
        framework: Option<&TargetFramework>,
        builder: &mut PackageSetBuilder,
        visited: &mut HashSet<String>,
    ) -> Option<PackageId> {
        // Reuse an acceptable vertex we already know about instead of
        // paying another registry round-trip; its subtree is in the graph.
        if let Some(version) = builder.get_best_version(&requirement.name, &requirement.range) {
            return Some(PackageId::new(requirement.name.clone(), version));
        }

        let package = self
            .registry
            .find_best_package(&requirement.name, &requirement.range)?;
        let id = PackageId::new(
            package.identity.name.clone(),
            package.identity.version.normalized(),
        );

        // A version already being expanded closes a cycle here.
        let visit_key = format!("{}@{}", id.name.to_ascii_lowercase(), id.version);
        if !visited.insert(visit_key) {
            return Some(id);
        }

        builder.add_or_update_package(&id);

        let mut children = Vec::new();
        for dep in compatible_packages(&package.dependency_groups, framework) {
            match self.resolve_requirement(dep, framework, builder, visited) {
                Some(child) => children.push(child),
                None => warn!(
                    "unable to find a package for '{}' matching '{}'",
                    dep.name, dep.range
                ),
            }
        }
        builder.add_or_update_with_dependencies(&id, children);

        Some(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::StubRegistry;
    use nuscan_core::version::VersionRange;

    fn requirement(name: &str, range: &str) -> PackageRequirement {
        PackageRequirement::new(name, VersionRange::parse(range).unwrap())
    }

    #[test]
    fn disjoint_branches_coexist() {
        let registry = StubRegistry::new()
            .package("A", "1.0.0", &[("E", "[1.0.0]")])
            .package("B", "1.0.0", &[("E", "[2.0.0]")])
            .package("E", "1.0.0", &[])
            .package("E", "2.0.0", &[]);

        let mut builder = PackageSetBuilder::new();
        TreeResolver::new(&registry).add_all(
            &[requirement("A", "[1.0.0]"), requirement("B", "[1.0.0]")],
            &mut builder,
        );

        let graph = builder.build_graph();
        let e_versions: Vec<&str> = graph
            .packages
            .iter()
            .filter(|p| p.package_id.name == "E")
            .map(|p| p.package_id.version.as_str())
            .collect();
        assert_eq!(e_versions, vec!["1.0.0", "2.0.0"]);
    }

    #[test]
    fn missing_package_skipped_not_fatal() {
        let registry = StubRegistry::new().package("A", "1.0.0", &[("Ghost", "[1.0.0, )")]);

        let mut builder = PackageSetBuilder::new();
        TreeResolver::new(&registry).add_all(&[requirement("A", "[1.0.0]")], &mut builder);

        let graph = builder.build_graph();
        assert_eq!(graph.packages.len(), 1);
        assert!(graph.packages[0].dependencies.is_empty());
    }

    #[test]
    fn known_vertex_reused_without_registry_lookup() {
        let registry = StubRegistry::new()
            .package("A", "1.0.0", &[("Shared", "[1.0.0, )")])
            .package("B", "1.0.0", &[("Shared", "[1.0.0, )")])
            .package("Shared", "1.4.0", &[]);

        let mut builder = PackageSetBuilder::new();
        TreeResolver::new(&registry).add_all(
            &[requirement("A", "[1.0.0]"), requirement("B", "[1.0.0]")],
            &mut builder,
        );

        let graph = builder.build_graph();
        let shared: Vec<_> = graph
            .packages
            .iter()
            .filter(|p| p.package_id.name == "Shared")
            .collect();
        assert_eq!(shared.len(), 1);

        let b = graph
            .packages
            .iter()
            .find(|p| p.package_id.name == "B")
            .unwrap();
        assert!(b.dependencies.contains(&PackageId::new("Shared", "1.4.0")));
    }

    #[test]
    fn cycles_terminate() {
        let registry = StubRegistry::new()
            .package("A", "1.0.0", &[("B", "[1.0.0]")])
            .package("B", "1.0.0", &[("A", "[1.0.0]")]);

        let mut builder = PackageSetBuilder::new();
        TreeResolver::new(&registry).add_all(&[requirement("A", "[1.0.0]")], &mut builder);

        let graph = builder.build_graph();
        assert_eq!(graph.packages.len(), 2);
    }

    #[test]
    fn framework_filter_applies() {
        let registry = StubRegistry::new()
            .package_for_framework("A", "1.0.0", ".NETFramework,Version=v4.5", &[("Old", "[1.0.0]")])
            .package("Old", "1.0.0", &[])
            .package("New", "1.0.0", &[]);

        // Requesting an incompatible framework falls back to all groups,
        // so the dependency still appears.
        let req = requirement("A", "[1.0.0]").with_framework(Some(
            nuscan_core::framework::TargetFramework::new(".NETCoreApp", 6, 0),
        ));
        let mut builder = PackageSetBuilder::new();
        TreeResolver::new(&registry).add_all(&[req], &mut builder);

        let graph = builder.build_graph();
        let a = graph
            .packages
            .iter()
            .find(|p| p.package_id.name == "A")
            .unwrap();
        assert_eq!(a.dependencies.len(), 1);
    }
}
