//! File-backed checkpoint store

use crate::state::PipelineState;
use crate::storage::CheckpointStore;
use crate::Result;
use std::path::{Path, PathBuf};

/// Persists pipeline state as a JSON file
///
/// Saves write to a sibling temp file and rename it into place, so an
/// interrupted save leaves the previous checkpoint intact.
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn staging_path(&self) -> PathBuf {
        let mut staging = self.path.clone();
        staging.set_extension("json.tmp");
        staging
    }
}

impl CheckpointStore for JsonFileStore {
    fn load(&self) -> Result<Option<PipelineState>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(&self.path)?;
        let state = serde_json::from_str(&content)?;
        Ok(Some(state))
    }

    fn save(&self, state: &PipelineState) -> Result<()> {
        let staging = self.staging_path();
        let json = serde_json::to_string_pretty(state)?;
        std::fs::write(&staging, json)?;
        std::fs::rename(&staging, &self.path)?;
        tracing::debug!("Checkpoint saved to {}", self.path.display());
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        if self.path.exists() {
            std::fs::remove_file(&self.path)?;
        }
        Ok(())
    }
}
