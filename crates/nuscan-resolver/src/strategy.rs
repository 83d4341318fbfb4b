//! Strategy selection: one resolution entry point per manifest kind, with
//! the fixed fallback ladder for legacy package lists.
//!
//! The first manifest format found on disk is used exclusively; formats
//! are never combined. Only the legacy exact-pin list gets the full
//! ladder, because only flat resolution can fail outright.

use tracing::warn;

use nuscan_core::lockfile::LockDocument;
use nuscan_core::package::{PackageId, PackageRequirement};
use nuscan_registry::search::MetadataSource;

use crate::flat::FlatResolver;
use crate::graph::{PackageSetBuilder, ResolutionGraph};
use crate::lock::LockFileResolver;
use crate::tree::TreeResolver;

/// A project's declared dependencies, already parsed from whichever
/// manifest format was found.
pub enum ProjectManifest {
    /// A pre-resolved lock document: ground truth, no registry traffic.
    Lock(LockDocument),
    /// Legacy exact-pin list (`packages.config`).
    PackageList(Vec<PackageRequirement>),
    /// Structured or scanned project references.
    References(Vec<PackageRequirement>),
}

/// Resolve one project's manifest into a graph.
pub fn resolve_manifest(
    manifest: &ProjectManifest,
    registry: &dyn MetadataSource,
) -> ResolutionGraph {
    match manifest {
        ProjectManifest::Lock(lock) => {
            let mut builder = PackageSetBuilder::new();
            let roots = LockFileResolver::new(lock).process(&mut builder);
            builder.build_graph_with_roots(roots)
        }
        ProjectManifest::PackageList(requirements) => resolve_package_list(requirements, registry),
        ProjectManifest::References(requirements) => {
            let mut builder = PackageSetBuilder::new();
            TreeResolver::new(registry).add_all(requirements, &mut builder);
            builder.build_graph()
        }
    }
}

/// The ladder for exact-pin lists: flat resolution first; on failure,
/// tree resolution; if that produced nothing either, fall back to the
/// declared pins as childless vertices with no registry traffic at all.
fn resolve_package_list(
    requirements: &[PackageRequirement],
    registry: &dyn MetadataSource,
) -> ResolutionGraph {
    let mut builder = PackageSetBuilder::new();
    let mut flat = FlatResolver::new(registry);
    match flat.resolve_all(requirements, &mut builder) {
        Ok(()) => return builder.build_graph(),
        Err(e) => warn!("flat resolution failed, retrying as a tree: {e}"),
    }

    let mut builder = PackageSetBuilder::new();
    TreeResolver::new(registry).add_all(requirements, &mut builder);
    if !builder.is_empty() || requirements.is_empty() {
        return builder.build_graph();
    }

    warn!("tree resolution found nothing; emitting declared pins without lookups");
    declared_pins_only(requirements)
}

/// Each declared requirement becomes a childless vertex at its range's
/// minimum bound (the declared exact version for pin lists).
fn declared_pins_only(requirements: &[PackageRequirement]) -> ResolutionGraph {
    let mut builder = PackageSetBuilder::new();
    for requirement in requirements {
        let Some(ref min) = requirement.range.min else {
            warn!(
                "requirement '{}' has no minimum bound, skipping",
                requirement.name
            );
            continue;
        };
        builder.add_or_update_package(&PackageId::new(
            requirement.name.clone(),
            min.normalized(),
        ));
    }
    builder.build_graph()
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
    fn package_list_prefers_flat() {
        let registry = StubRegistry::new()
            .package("A", "1.0.0", &[("B", "[1.0.0]")])
            .package("B", "1.0.0", &[]);

        let graph = resolve_manifest(
            &ProjectManifest::PackageList(vec![requirement("A", "[1.0.0]")]),
            &registry,
        );
        assert_eq!(graph.packages.len(), 2);
        assert_eq!(graph.dependencies, vec![PackageId::new("A", "1.0.0")]);
    }

    #[test]
    fn conflicting_pins_fall_back_to_tree() {
        let registry = StubRegistry::new()
            .package("A", "1.0.0", &[])
            .package("A", "2.0.0", &[]);

        // Flat rejects the double pin; tree keeps both versions.
        let graph = resolve_manifest(
            &ProjectManifest::PackageList(vec![
                requirement("A", "[1.0.0]"),
                requirement("A", "[2.0.0]"),
            ]),
            &registry,
        );
        let versions: Vec<&str> = graph
            .packages
            .iter()
            .map(|p| p.package_id.version.as_str())
            .collect();
        assert_eq!(versions, vec!["1.0.0", "2.0.0"]);
    }

    #[test]
    fn dead_registry_degrades_to_declared_pins() {
        let registry = StubRegistry::new();

        let graph = resolve_manifest(
            &ProjectManifest::PackageList(vec![
                requirement("A", "[1.2.0]"),
                requirement("B", "[3.0.0]"),
            ]),
            &registry,
        );
        assert_eq!(graph.packages.len(), 2);
        assert!(graph.packages.iter().all(|p| p.dependencies.is_empty()));
        assert!(graph
            .packages
            .iter()
            .any(|p| p.package_id == PackageId::new("A", "1.2.0")));
    }

    #[test]
    fn references_resolve_as_tree() {
        let registry = StubRegistry::new()
            .package("X", "2.0.0", &[("Y", "[1.0.0, )")])
            .package("Y", "1.5.0", &[]);

        let graph = resolve_manifest(
            &ProjectManifest::References(vec![requirement("X", "[2.0.0, )")]),
            &registry,
        );
        assert_eq!(graph.packages.len(), 2);
    }

    #[test]
    fn lock_document_needs_no_registry() {
        let lock = nuscan_core::lockfile::LockDocument::from_str(
            r#"{
            "targets": {
                "net6.0": {
                    "A/1.0.0": { "dependencies": { "B": "[1.0.0, )" } },
                    "B/1.2.0": {}
                }
            }
        }"#,
        )
        .unwrap();

        let registry = StubRegistry::new();
        let graph = resolve_manifest(&ProjectManifest::Lock(lock), &registry);
        assert_eq!(graph.packages.len(), 2);
        assert_eq!(graph.dependencies, vec![PackageId::new("A", "1.0.0")]);
    }
}
