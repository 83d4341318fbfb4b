//! JSON serialization of inspection results.

use std::path::{Path, PathBuf};

use serde::Serialize;

use nuscan_core::package::{PackageId, PackageSet};
use nuscan_util::errors::NuscanError;

use crate::result::InspectionResult;

/// The serialized document shape.
#[derive(Serialize)]
struct ResultDocument<'a> {
    name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    version: Option<&'a str>,
    packages: &'a [PackageSet],
    dependencies: &'a [PackageId],
}

/// Output file path for a result.
pub fn result_path(output_dir: &Path, name: &str) -> PathBuf {
    output_dir.join(format!("{name}_inspection.json"))
}

/// Write one successful result as pretty-printed JSON, creating the
/// output directory as needed. Failed results produce no file.
pub fn write_result(
    result: &InspectionResult,
    output_dir: &Path,
) -> miette::Result<Option<PathBuf>> {
    let Some(graph) = result.graph() else {
        return Ok(None);
    };

    std::fs::create_dir_all(output_dir).map_err(NuscanError::Io)?;

    let document = ResultDocument {
        name: &result.name,
        version: result.version.as_deref(),
        packages: &graph.packages,
        dependencies: &graph.dependencies,
    };
    let json = serde_json::to_string_pretty(&document).map_err(|e| NuscanError::Generic {
        message: format!("Failed to serialize inspection result: {e}"),
    })?;

    let path = result_path(output_dir, &result.name);
    std::fs::write(&path, json).map_err(NuscanError::Io)?;
    Ok(Some(path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use nuscan_resolver::graph::PackageSetBuilder;

    #[test]
    fn writes_graph_as_json() {
        let dir = tempfile::tempdir().unwrap();

        let mut builder = PackageSetBuilder::new();
        builder.add_or_update_with_dependencies(
            &PackageId::new("App.Deps", "1.0.0"),
            [PackageId::new("Newtonsoft.Json", "12.0.3")],
        );
        let result = InspectionResult::success(
            "App".to_string(),
            Some("1.0.0".to_string()),
            builder.build_graph(),
        );

        let path = write_result(&result, dir.path()).unwrap().unwrap();
        assert!(path.ends_with("App_inspection.json"));

        let written = std::fs::read_to_string(&path).unwrap();
        let value: serde_json::Value = serde_json::from_str(&written).unwrap();
        assert_eq!(value["name"], "App");
        assert_eq!(value["packages"][0]["packageId"]["name"], "App.Deps");
        assert_eq!(value["dependencies"][0]["version"], "1.0.0");
    }

    #[test]
    fn failed_result_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let result = InspectionResult::failure(
            "App".to_string(),
            NuscanError::Generic {
                message: "nope".to_string(),
            }
            .into(),
        );
        assert!(write_result(&result, dir.path()).unwrap().is_none());
    }
}
