//! The deduplicating package graph and its builder.
//!
//! Every resolution strategy feeds the same builder: a vertex table keyed
//! by `PackageId` over a petgraph digraph. Vertices are never removed;
//! resolution only grows the graph monotonically within one run.

use std::collections::{BTreeSet, HashMap};

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use serde::Serialize;

use nuscan_core::package::{PackageId, PackageSet};
use nuscan_core::version::{NuGetVersion, VersionRange};

/// The output of one resolution run: every discovered vertex with its
/// direct dependencies, plus the root subset.
#[derive(Debug, Clone, Serialize)]
pub struct ResolutionGraph {
    pub packages: Vec<PackageSet>,
    /// Top-level packages: requested directly, reachable as nobody's
    /// dependency.
    pub dependencies: Vec<PackageId>,
}

/// Accumulates package vertices and dependency edges from any strategy,
/// deduplicating by `PackageId`.
pub struct PackageSetBuilder {
    graph: DiGraph<PackageId, ()>,
    index: HashMap<PackageId, NodeIndex>,
}

impl PackageSetBuilder {
    pub fn new() -> Self {
        Self {
            graph: DiGraph::new(),
            index: HashMap::new(),
        }
    }

    fn get_or_create(&mut self, id: &PackageId) -> NodeIndex {
        if let Some(&idx) = self.index.get(id) {
            return idx;
        }
        let idx = self.graph.add_node(id.clone());
        self.index.insert(id.clone(), idx);
        idx
    }

    /// Ensure a vertex exists; no-op when already present.
    pub fn add_or_update_package(&mut self, id: &PackageId) {
        self.get_or_create(id);
    }

    /// Ensure a vertex exists and union `dependencies` into its edge set.
    /// Dependency vertices are created as needed, so no edge ever dangles.
    /// Idempotent: repeating a call never duplicates an edge.
    pub fn add_or_update_with_dependencies<I>(&mut self, id: &PackageId, dependencies: I)
    where
        I: IntoIterator<Item = PackageId>,
    {
        let from = self.get_or_create(id);
        for dep in dependencies {
            let to = self.get_or_create(&dep);
            if !self.graph.edges(from).any(|e| e.target() == to) {
                self.graph.add_edge(from, to, ());
            }
        }
    }

    pub fn does_package_exist(&self, id: &PackageId) -> bool {
        self.index.contains_key(id)
    }

    /// The best already-known version of `name` satisfying `range`, as the
    /// raw version string of the matching vertex. `None` means "not yet
    /// resolved", not an error.
    pub fn get_best_version(&self, name: &str, range: &VersionRange) -> Option<String> {
        let candidates: Vec<(&PackageId, NuGetVersion)> = self
            .index
            .keys()
            .filter(|id| id.name.eq_ignore_ascii_case(name))
            .filter_map(|id| NuGetVersion::parse(&id.version).map(|v| (id, v)))
            .collect();

        let versions: Vec<NuGetVersion> = candidates.iter().map(|(_, v)| v.clone()).collect();
        let best = range.find_best_match(&versions)?;
        candidates
            .iter()
            .find(|(_, v)| v == best)
            .map(|(id, _)| id.version.clone())
    }

    /// Snapshot of every vertex with its direct dependencies, ordered for
    /// deterministic output. Safe to call mid-resolution as a lookup table.
    pub fn get_package_list(&self) -> Vec<PackageSet> {
        let mut packages: Vec<PackageSet> = self
            .graph
            .node_indices()
            .map(|idx| {
                let dependencies: BTreeSet<PackageId> = self
                    .graph
                    .edges_directed(idx, Direction::Outgoing)
                    .map(|e| self.graph[e.target()].clone())
                    .collect();
                PackageSet {
                    package_id: self.graph[idx].clone(),
                    dependencies,
                }
            })
            .collect();
        packages.sort_by(|a, b| a.package_id.cmp(&b.package_id));
        packages
    }

    /// Vertices that no other vertex depends on.
    pub fn root_packages(&self) -> Vec<PackageId> {
        let mut roots: Vec<PackageId> = self
            .graph
            .externals(Direction::Incoming)
            .map(|idx| self.graph[idx].clone())
            .collect();
        roots.sort();
        roots
    }

    /// Finish the run, deriving roots from the edge structure.
    pub fn build_graph(&self) -> ResolutionGraph {
        ResolutionGraph {
            packages: self.get_package_list(),
            dependencies: self.root_packages(),
        }
    }

    /// Finish the run with an explicitly declared root list (lock documents
    /// record their top-level requirements).
    pub fn build_graph_with_roots(&self, mut roots: Vec<PackageId>) -> ResolutionGraph {
        if roots.is_empty() {
            return self.build_graph();
        }
        roots.sort();
        roots.dedup();
        ResolutionGraph {
            packages: self.get_package_list(),
            dependencies: roots,
        }
    }

    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }
}

impl Default for PackageSetBuilder {
    fn default() -> Self {
        Self::new()
    }
}
