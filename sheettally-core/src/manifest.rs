//! Saved batch results, reloadable without re-reading the workbooks

use crate::batch::{FileReport, TIMESTAMP_FORMAT};
use anyhow::{Context, Result};
use chrono::{DateTime, Local, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    #[serde(default)]
    pub project_name: String,
    #[serde(default)]
    pub files: Vec<FileReport>,
}

impl Manifest {
    pub fn new(project_name: impl Into<String>, files: Vec<FileReport>) -> Self {
        Self {
            project_name: project_name.into(),
            files,
        }
    }

    /// Load a manifest from a JSON file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read manifest {}", path.display()))?;
        let manifest = serde_json::from_str(&content)
            .with_context(|| format!("Invalid manifest {}", path.display()))?;
        Ok(manifest)
    }

    /// Save the manifest as pretty-printed JSON
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json).with_context(|| format!("Failed to write manifest {}", path.display()))?;
        Ok(())
    }

    /// Reports whose file changed on disk after it was last loaded.
    ///
    /// Files that no longer exist or have unparsable timestamps are not reported.
    pub fn stale_files(&self) -> Vec<&FileReport> {
        self.files
            .iter()
            .filter(|report| {
                let Ok(loaded) = NaiveDateTime::parse_from_str(&report.last_loaded, TIMESTAMP_FORMAT)
                else {
                    return false;
                };
                fs::metadata(&report.filepath)
                    .and_then(|m| m.modified())
                    .map(|modified| DateTime::<Local>::from(modified).naive_local() > loaded)
                    .unwrap_or(false)
            })
            .collect()
    }
}
