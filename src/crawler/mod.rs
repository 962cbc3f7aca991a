//! Crawl pipeline: fetcher, link walker, extraction pool, chunk coordinator,
//! and the checkpointing orchestrator that sequences them

pub mod coordinator;
pub mod fetcher;
pub mod orchestrator;
pub mod pool;
pub mod walker;

pub use coordinator::ChunkCoordinator;
pub use fetcher::{build_http_client, fetch_page};
pub use orchestrator::{HarvestReport, Orchestrator};
pub use pool::{ChunkExtractor, PoolOutcome, WorkerPool};
pub use walker::{walk, WalkOutcome};
