//! Trawline: a time-boxed catalog harvester
//!
//! This crate walks paginated listing pages to discover item links, then
//! fetches and extracts structured records from each item page. Every phase
//! runs under a wall-clock budget and checkpoints its progress so a later
//! invocation resumes exactly where the prior one stopped.

pub mod config;
pub mod crawler;
pub mod extract;
pub mod output;
pub mod regions;
pub mod state;
pub mod storage;

use thiserror::Error;

/// Main error type for Trawline operations
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Unsupported region: {0}")]
    UnsupportedRegion(String),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid CSS selector: {0}")]
    Selector(String),

    #[error("Checkpoint serialization error: {0}")]
    Checkpoint(#[from] serde_json::Error),

    #[error("CSV export error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),
}

/// Result type alias for Trawline operations
pub type Result<T> = std::result::Result<T, HarvestError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{ChunkCoordinator, HarvestReport, Orchestrator, WorkerPool};
pub use extract::{ExtractRule, Record, Review, SelectorRule};
pub use state::{CrawlTask, Phase, PipelineState, WorkState};
pub use storage::{CheckpointStore, JsonFileStore, MemoryStore};
