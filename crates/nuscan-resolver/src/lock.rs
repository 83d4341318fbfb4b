//! Lock-document replay: rebuild the dependency graph from an
//! already-resolved manifest instead of querying the registry.
//!
//! The lock document is ground truth, so this path never fails hard. A
//! declared range that matches nothing degrades: a lone same-named
//! candidate is assumed right, and failing that the range's own minimum
//! bound is used, loudly.

use std::collections::HashMap;

use tracing::warn;

use nuscan_core::lockfile::{parse_constraint_text, LockDocument};
use nuscan_core::package::PackageId;
use nuscan_core::version::{NuGetVersion, VersionRange};

use crate::graph::PackageSetBuilder;

/// Resolver replaying a parsed lock document.
pub struct LockFileResolver<'a> {
    lock: &'a LockDocument,
}

impl<'a> LockFileResolver<'a> {
    pub fn new(lock: &'a LockDocument) -> Self {
        Self { lock }
    }

    /// Build every library vertex into `builder` and return the declared
    /// top-level packages, empty when the document doesn't list any.
    pub fn process(&self, builder: &mut PackageSetBuilder) -> Vec<PackageId> {
        for libraries in self.lock.targets.values() {
            // Concrete versions present in this target, by lowercase name.
            let mut present: HashMap<String, Vec<(String, NuGetVersion)>> = HashMap::new();
            for key in libraries.keys() {
                let Some((name, version)) = LockDocument::split_library_key(key) else {
                    warn!("ignoring malformed library key '{key}'");
                    continue;
                };
                if let Some(parsed) = NuGetVersion::parse(version) {
                    present
                        .entry(name.to_ascii_lowercase())
                        .or_default()
                        .push((name.to_string(), parsed));
                }
            }

            for (key, library) in libraries {
                let Some((name, version)) = LockDocument::split_library_key(key) else {
                    continue;
                };
                let id = match NuGetVersion::parse(version) {
                    Some(v) => PackageId::new(name, v.normalized()),
                    // Still a valid vertex, just with the verbatim string.
                    None => PackageId::new(name, version),
                };

                let mut dependencies = Vec::new();
                for (dep_name, raw_range) in &library.dependencies {
                    if let Some(dep) = self.resolve_edge(dep_name, raw_range, &present) {
                        dependencies.push(dep);
                    }
                }
                builder.add_or_update_with_dependencies(&id, dependencies);
            }
        }

        self.declared_roots(builder)
    }

    /// Map one declared range to a concrete same-target library.
    fn resolve_edge(
        &self,
        dep_name: &str,
        raw_range: &str,
        present: &HashMap<String, Vec<(String, NuGetVersion)>>,
    ) -> Option<PackageId> {
        let range = match parse_constraint_text(raw_range) {
            Ok(range) => range,
            Err(e) => {
                warn!("treating unparseable range for '{dep_name}' as unbounded: {e}");
                VersionRange::any()
            }
        };

        let candidates = present
            .get(&dep_name.to_ascii_lowercase())
            .map(Vec::as_slice)
            .unwrap_or(&[]);

        let satisfying: Vec<&(String, NuGetVersion)> = candidates
            .iter()
            .filter(|(_, v)| range.satisfies(v))
            .collect();

        if satisfying.len() > 1 {
            warn!("duplicate libraries match '{dep_name}' with range '{range}'");
        }
        if let Some((name, version)) = satisfying
            .iter()
            .max_by(|(_, a), (_, b)| a.cmp(b))
        {
            return Some(PackageId::new(name.clone(), version.normalized()));
        }

        // Nothing satisfies the range. A single same-named library is
        // assumed correct even though its metadata disagrees.
        if let [(name, version)] = candidates {
            warn!(
                "no library satisfies '{dep_name}' range '{range}'; \
                 using the only candidate {name} {}",
                version.normalized()
            );
            return Some(PackageId::new(name.clone(), version.normalized()));
        }

        // Last resort: trust the range's own minimum bound.
        if let Some(ref min) = range.min {
            warn!(
                "no library found for '{dep_name}' with range '{range}'; \
                 guessing the range minimum {}",
                min.normalized()
            );
            return Some(PackageId::new(dep_name, min.normalized()));
        }

        warn!("no library found for '{dep_name}' with range '{range}'");
        None
    }

    /// The document's declared top-level requirement list, mapped to
    /// concrete versions through the builder. Falls back to the
    /// per-framework requirement lists.
    fn declared_roots(&self, builder: &PackageSetBuilder) -> Vec<PackageId> {
        let Some(ref project) = self.lock.project else {
            return Vec::new();
        };

        let mut declared: Vec<(&String, Option<&str>)> = Vec::new();
        if !project.dependencies.is_empty() {
            declared.extend(
                project
                    .dependencies
                    .iter()
                    .map(|(name, spec)| (name, spec.range_str())),
            );
        } else {
            for framework in project.frameworks.values() {
                declared.extend(
                    framework
                        .dependencies
                        .iter()
                        .map(|(name, spec)| (name, spec.range_str())),
                );
            }
        }

        let mut roots = Vec::new();
        for (name, raw_range) in declared {
            let range = raw_range
                .and_then(|raw| parse_constraint_text(raw).ok())
                .unwrap_or_else(VersionRange::any);
            match builder.get_best_version(name, &range) {
                Some(version) => roots.push(PackageId::new(name.clone(), version)),
                None => warn!("declared root '{name}' has no resolved library"),
            }
        }
        roots
    }
}
