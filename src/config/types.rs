use serde::Deserialize;
use std::time::Duration;

/// Main configuration structure for Trawline
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default)]
    pub walker: WalkerConfig,
    #[serde(default)]
    pub pool: PoolConfig,
    #[serde(default)]
    pub chunks: ChunkConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Fetch retry and timeout configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Total attempts per URL (first try included)
    #[serde(rename = "max-retries")]
    pub max_retries: u32,

    /// Base backoff delay after a 503 or transport error (milliseconds);
    /// doubles on every failed attempt
    #[serde(rename = "initial-delay-ms")]
    pub initial_delay_ms: u64,

    /// Per-request timeout (seconds)
    #[serde(rename = "request-timeout-secs")]
    pub request_timeout_secs: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay_ms: 2_000,
            request_timeout_secs: 30,
        }
    }
}

impl FetchConfig {
    pub fn initial_delay(&self) -> Duration {
        Duration::from_millis(self.initial_delay_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Link walker configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WalkerConfig {
    /// Wall-clock budget for one walker invocation (seconds)
    #[serde(rename = "time-budget-secs")]
    pub time_budget_secs: u64,

    /// Politeness delay bounds between listing pages (milliseconds)
    #[serde(rename = "politeness-min-ms")]
    pub politeness_min_ms: u64,
    #[serde(rename = "politeness-max-ms")]
    pub politeness_max_ms: u64,
}

impl Default for WalkerConfig {
    fn default() -> Self {
        Self {
            time_budget_secs: 240,
            politeness_min_ms: 1_000,
            politeness_max_ms: 3_000,
        }
    }
}

impl WalkerConfig {
    pub fn time_budget(&self) -> Duration {
        Duration::from_secs(self.time_budget_secs)
    }
}

/// Extraction worker pool configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    /// Wall-clock budget for one batch; URLs not launched before it expires
    /// are returned as remaining (seconds)
    #[serde(rename = "time-budget-secs")]
    pub time_budget_secs: u64,

    /// Cap on concurrently in-flight fetch+extract tasks
    #[serde(rename = "max-in-flight")]
    pub max_in_flight: u32,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            time_budget_secs: 240,
            max_in_flight: 16,
        }
    }
}

impl PoolConfig {
    pub fn time_budget(&self) -> Duration {
        Duration::from_secs(self.time_budget_secs)
    }
}

/// Chunk coordinator configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ChunkConfig {
    /// Maximum links handed to the pool per chunk
    #[serde(rename = "chunk-size")]
    pub chunk_size: usize,

    /// Attempts per chunk before the whole chunk is requeued at the tail
    #[serde(rename = "max-retries-per-chunk")]
    pub max_retries_per_chunk: u32,

    /// Times a single link may be requeued before it is moved to the
    /// unresolved dead-letter list
    #[serde(rename = "max-link-requeues")]
    pub max_link_requeues: u32,

    /// Base for the exponential retry backoff between chunk attempts
    /// (milliseconds; delay = base * 2^attempt)
    #[serde(rename = "retry-backoff-base-ms")]
    pub retry_backoff_base_ms: u64,

    /// Politeness pause bounds between chunks (milliseconds)
    #[serde(rename = "pause-min-ms")]
    pub pause_min_ms: u64,
    #[serde(rename = "pause-max-ms")]
    pub pause_max_ms: u64,
}

impl Default for ChunkConfig {
    fn default() -> Self {
        Self {
            chunk_size: 120,
            max_retries_per_chunk: 3,
            max_link_requeues: 2,
            retry_backoff_base_ms: 1_000,
            pause_min_ms: 2_000,
            pause_max_ms: 5_000,
        }
    }
}

/// Output and checkpoint paths
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Path of the checkpoint file state is persisted to between steps
    #[serde(rename = "checkpoint-path")]
    pub checkpoint_path: String,

    /// Directory CSV exports are written into
    #[serde(rename = "export-dir")]
    pub export_dir: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            checkpoint_path: "./trawline-checkpoint.json".to_string(),
            export_dir: ".".to_string(),
        }
    }
}
