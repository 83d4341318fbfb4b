//! Solution (`.sln`) parsing: member project discovery.

use std::path::{Path, PathBuf};

use nuscan_util::errors::NuscanError;

/// A project entry inside a solution file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolutionProject {
    pub name: String,
    pub relative_path: String,
}

impl SolutionProject {
    /// Absolute path of the project, resolved against the solution directory.
    pub fn resolve_against(&self, solution_dir: &Path) -> PathBuf {
        // Solution files always use backslash separators.
        let normalized = self.relative_path.replace('\\', std::path::MAIN_SEPARATOR_STR);
        solution_dir.join(normalized)
    }
}

/// Extract project entries from solution file text.
///
/// Entries look like
/// `Project("{GUID}") = "Name", "Rel\Path\Name.csproj", "{GUID}"`;
/// solution folders use the same syntax but have no project-file extension
/// and are skipped.
pub fn parse_solution(content: &str) -> Vec<SolutionProject> {
    let mut projects = Vec::new();

    for line in content.lines() {
        let line = line.trim();
        if !line.starts_with("Project(") {
            continue;
        }
        let Some((_, rhs)) = line.split_once('=') else {
            continue;
        };
        let mut quoted = rhs.split(',').map(|part| part.trim().trim_matches('"'));
        let (Some(name), Some(path)) = (quoted.next(), quoted.next()) else {
            continue;
        };
        if name.is_empty() || !path.to_ascii_lowercase().ends_with("proj") {
            continue;
        }
        projects.push(SolutionProject {
            name: name.to_string(),
            relative_path: path.to_string(),
        });
    }

    projects
}

/// Read a solution file and return its project entries.
pub fn load_solution(path: &Path) -> miette::Result<Vec<SolutionProject>> {
    let content = std::fs::read_to_string(path).map_err(|e| NuscanError::Generic {
        message: format!("Failed to read solution {}: {e}", path.display()),
    })?;
    Ok(parse_solution(&content))
}
