// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

use anyhow::{Context, Result};
use ohud_core::{Catalog, CatalogDocument};
use std::fs;
use std::path::Path;

#[derive(Debug)]
pub struct LoadedCatalog {
    pub catalog: Catalog,
    pub permission_message: Option<String>,
    pub skipped: usize,
}

/// Reads a catalog JSON file. In lenient mode records with bad coordinates are
/// skipped instead of failing the load.
pub fn load_catalog(path: &Path, lenient: bool) -> Result<LoadedCatalog> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read catalog {}", path.display()))?;
    let doc: CatalogDocument =
        serde_json::from_str(&content).context("Failed to parse catalog JSON")?;

    let (catalog, skipped) = if lenient {
        let (catalog, skipped) = Catalog::load_lenient(doc.targets)?;
        (catalog, skipped.len())
    } else {
        (Catalog::load(doc.targets)?, 0)
    };

    log::info!(
        "Catalog ready — path={} targets={} skipped={}",
        path.display(),
        catalog.len(),
        skipped
    );
    Ok(LoadedCatalog {
        catalog,
        permission_message: doc.permission_message,
        skipped,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    const CONTENT: &str = r#"{
        "permissionMessage": "Enable motion sensors.",
        "targets": [
            { "name": "Town Hall", "lat": 58.3801, "lon": 26.7225, "tag": "history" },
            { "name": "Broken", "lat": 123.0, "lon": 26.7, "tag": "history" },
            { "name": "Observatory", "lat": 58.3793, "lon": 26.7196, "tag": "science",
              "description": "Struve's refractor." }
        ]
    }"#;

    #[test]
    fn test_strict_load_fails_on_bad_record() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("content.json");
        fs::write(&path, CONTENT).unwrap();
        let err = load_catalog(&path, false).unwrap_err();
        assert!(err.to_string().contains("Broken"), "got: {}", err);
    }

    #[test]
    fn test_lenient_load_skips_bad_record() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("content.json");
        fs::write(&path, CONTENT).unwrap();
        let loaded = load_catalog(&path, true).unwrap();
        assert_eq!(loaded.catalog.len(), 2);
        assert_eq!(loaded.skipped, 1);
        assert_eq!(
            loaded.permission_message.as_deref(),
            Some("Enable motion sensors.")
        );
        assert_eq!(
            loaded.catalog.get("Observatory").unwrap().description,
            "Struve's refractor."
        );
    }

    #[test]
    fn test_missing_file_reports_path() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nope.json");
        let err = load_catalog(&path, false).unwrap_err();
        assert!(err.to_string().contains("nope.json"));
    }
}
