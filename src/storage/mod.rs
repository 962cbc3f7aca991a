//! Checkpoint persistence
//!
//! The durable-workflow host is modelled as an external checkpoint store with
//! one contract: state saved after a completed step is what a later
//! invocation resumes from, so completed steps are never re-executed.

mod json_store;
mod memory;

pub use json_store::JsonFileStore;
pub use memory::MemoryStore;

use crate::state::PipelineState;
use crate::Result;

/// Durable store for pipeline state between steps
pub trait CheckpointStore {
    /// Loads the most recently saved state, if any
    fn load(&self) -> Result<Option<PipelineState>>;

    /// Durably records the state after a completed step
    fn save(&self, state: &PipelineState) -> Result<()>;

    /// Discards any saved state
    fn clear(&self) -> Result<()>;
}

impl<T: CheckpointStore> CheckpointStore for std::sync::Arc<T> {
    fn load(&self) -> Result<Option<PipelineState>> {
        (**self).load()
    }

    fn save(&self, state: &PipelineState) -> Result<()> {
        (**self).save(state)
    }

    fn clear(&self) -> Result<()> {
        (**self).clear()
    }
}
