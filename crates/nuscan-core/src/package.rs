//! Package identities and graph vertices.

use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt;
use std::hash::{Hash, Hasher};

use serde::Serialize;

use crate::framework::TargetFramework;
use crate::version::VersionRange;

/// Canonical vertex key of the dependency graph: a package name plus its
/// resolved version string. Names compare case-insensitively, the way the
/// package ecosystem treats them; versions compare as exact strings.
#[derive(Debug, Clone, Serialize)]
pub struct PackageId {
    pub name: String,
    pub version: String,
}

impl PackageId {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
        }
    }
}

impl PartialEq for PackageId {
    fn eq(&self, other: &Self) -> bool {
        self.name.eq_ignore_ascii_case(&other.name) && self.version == other.version
    }
}

impl Eq for PackageId {}

impl Hash for PackageId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.to_ascii_lowercase().hash(state);
        self.version.hash(state);
    }
}

impl Ord for PackageId {
    fn cmp(&self, other: &Self) -> Ordering {
        let name_ord = self
            .name
            .to_ascii_lowercase()
            .cmp(&other.name.to_ascii_lowercase());
        name_ord.then_with(|| self.version.cmp(&other.version))
    }
}

impl PartialOrd for PackageId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for PackageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.name, self.version)
    }
}

/// A graph vertex with its direct-dependency edges.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct PackageSet {
    #[serde(rename = "packageId")]
    pub package_id: PackageId,
    pub dependencies: BTreeSet<PackageId>,
}

impl PackageSet {
    pub fn new(package_id: PackageId) -> Self {
        Self {
            package_id,
            dependencies: BTreeSet::new(),
        }
    }
}

/// A declared dependency before resolution: a name, an acceptable version
/// range, and optionally the runtime profile it was declared against.
#[derive(Debug, Clone)]
pub struct PackageRequirement {
    pub name: String,
    pub range: VersionRange,
    pub framework: Option<TargetFramework>,
}

impl PackageRequirement {
    pub fn new(name: impl Into<String>, range: VersionRange) -> Self {
        Self {
            name: name.into(),
            range,
            framework: None,
        }
    }

    pub fn with_framework(mut self, framework: Option<TargetFramework>) -> Self {
        self.framework = framework;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn name_comparison_ignores_case() {
        let a = PackageId::new("Newtonsoft.Json", "13.0.1");
        let b = PackageId::new("newtonsoft.json", "13.0.1");
        assert_eq!(a, b);

        let mut set = HashSet::new();
        set.insert(a);
        assert!(!set.insert(b));
    }

    #[test]
    fn version_comparison_is_exact() {
        let a = PackageId::new("Lib", "1.0.0");
        let b = PackageId::new("Lib", "1.0");
        assert_ne!(a, b);
    }

    #[test]
    fn ordering_is_stable_across_casing() {
        let mut ids = vec![
            PackageId::new("beta", "1.0"),
            PackageId::new("Alpha", "2.0"),
            PackageId::new("alpha", "1.0"),
        ];
        ids.sort();
        assert_eq!(ids[0].version, "1.0");
        assert_eq!(ids[1].version, "2.0");
        assert_eq!(ids[2].name, "beta");
    }
}
