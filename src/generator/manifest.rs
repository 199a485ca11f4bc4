use std::path::{Path, PathBuf};

use super::test_framework::Result;
use crate::parser::SectionedEndpoints;
use crate::utils::write_to_file;

/// File name of the parsed-sections dump
pub const MANIFEST_FILE: &str = "sections.json";

/// Write the parsed sections as pretty JSON, keyed by tag
pub fn write_sections_manifest(sections: &SectionedEndpoints, output_dir: &Path) -> Result<PathBuf> {
    let manifest_path = output_dir.join(MANIFEST_FILE);
    let json_str = serde_json::to_string_pretty(sections)?;
    write_to_file(&manifest_path, json_str)?;

    tracing::info!(path = %manifest_path.display(), "wrote sections manifest");
    Ok(manifest_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::extract_endpoints;
    use serde_json::{json, Value};

    #[test]
    fn manifest_round_trips_section_order() {
        let sections = extract_endpoints(&json!({
            "paths": {
                "/store": { "get": { "tags": ["store"] } },
                "/pet": { "get": { "tags": ["pet"] } }
            }
        }))
        .unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = write_sections_manifest(&sections, dir.path()).unwrap();

        let written: Value = serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
        let tags: Vec<&String> = written.as_object().unwrap().keys().collect();
        assert_eq!(tags, vec!["store", "pet"]);
        assert_eq!(written["pet"][0]["endpoint"], "/pet");
    }
}
