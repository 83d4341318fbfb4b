//! Inspection outcomes.

use nuscan_resolver::graph::ResolutionGraph;

/// The outcome of inspecting one project or solution member.
///
/// A failed inspection never carries a partial graph; either the whole
/// resolved graph is present or only the error is.
#[derive(Debug)]
pub struct InspectionResult {
    pub name: String,
    pub version: Option<String>,
    pub outcome: Outcome,
}

#[derive(Debug)]
pub enum Outcome {
    Success(ResolutionGraph),
    Error(miette::Report),
}

impl InspectionResult {
    pub fn success(name: String, version: Option<String>, graph: ResolutionGraph) -> Self {
        Self {
            name,
            version,
            outcome: Outcome::Success(graph),
        }
    }

    pub fn failure(name: String, error: miette::Report) -> Self {
        Self {
            name,
            version: None,
            outcome: Outcome::Error(error),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.outcome, Outcome::Success(_))
    }

    pub fn graph(&self) -> Option<&ResolutionGraph> {
        match &self.outcome {
            Outcome::Success(graph) => Some(graph),
            Outcome::Error(_) => None,
        }
    }
}
