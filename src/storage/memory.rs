//! In-memory checkpoint store

use crate::state::PipelineState;
use crate::storage::CheckpointStore;
use crate::Result;
use std::sync::Mutex;

/// Keeps checkpoints in memory; used by tests and one-shot runs that don't
/// need durability
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<Option<PipelineState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current snapshot, without going through the trait
    pub fn snapshot(&self) -> Option<PipelineState> {
        self.state.lock().ok().and_then(|guard| guard.clone())
    }
}

impl CheckpointStore for MemoryStore {
    fn load(&self) -> Result<Option<PipelineState>> {
        Ok(self.snapshot())
    }

    fn save(&self, state: &PipelineState) -> Result<()> {
        if let Ok(mut guard) = self.state.lock() {
            *guard = Some(state.clone());
        }
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        if let Ok(mut guard) = self.state.lock() {
            *guard = None;
        }
        Ok(())
    }
}
