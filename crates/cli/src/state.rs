//! CLI state persisted between invocations.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Contents of `.localai/state.yaml`.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CliState {
    /// Last model loaded successfully through `models load`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_model: Option<String>,
}

impl CliState {
    /// Read the state file; a missing file is an empty state.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read state file {:?}", path))?;
        let state = serde_yaml::from_str(&contents)
            .with_context(|| format!("Failed to parse state file {:?}", path))?;

        Ok(state)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {:?}", parent))?;
        }

        let contents = serde_yaml::to_string(self).context("Failed to serialize CLI state")?;
        std::fs::write(path, contents)
            .with_context(|| format!("Failed to write state file {:?}", path))?;

        tracing::debug!("Saved CLI state to {:?}", path);
        Ok(())
    }
}
