use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

const BUILTIN_MERGE_CONFIG: &str = include_str!("../config/duplicate_routes.json");

/// Per-agency groups of route short names that are variants of one logical route.
///
/// Stored as a plain JSON object on disk:
/// ```json
/// {
///   "SFMTA": [["5", "5R"], ["9", "9R"]],
///   "AC Transit": [["1", "1T"]]
/// }
/// ```
#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct MergeConfig {
    entries: HashMap<String, Vec<Vec<String>>>,
}

impl MergeConfig {
    /// The table used when no config file is given: SFMTA's Rapid variants,
    /// embedded from `config/duplicate_routes.json`.
    pub fn builtin() -> Result<Self> {
        Self::from_json(BUILTIN_MERGE_CONFIG).context("parsing built-in merge config")
    }

    /// Loads the config from a JSON file at `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading merge config {}", path.display()))?;
        Self::from_json(&content).with_context(|| format!("parsing merge config {}", path.display()))
    }

    pub fn from_json(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    /// Returns the duplicate short-name groups configured for `agency_id`.
    pub fn duplicate_groups(&self, agency_id: &str) -> &[Vec<String>] {
        self.entries.get(agency_id).map(Vec::as_slice).unwrap_or(&[])
    }

}
