//! Configuration loading and validation
//!
//! Configuration is optional: every field has a default that reproduces the
//! production constants, so a partial (or absent) TOML file is fine.

mod types;

pub use types::{ChunkConfig, Config, FetchConfig, OutputConfig, PoolConfig, WalkerConfig};

use crate::{ConfigError, ConfigResult};
use std::path::Path;

/// Loads and validates a configuration file
pub fn load_config(path: &Path) -> ConfigResult<Config> {
    let content = std::fs::read_to_string(path)?;
    let config: Config = toml::from_str(&content)?;
    validate(&config)?;
    Ok(config)
}

/// Validates cross-field constraints the type system cannot express
pub fn validate(config: &Config) -> ConfigResult<()> {
    if config.chunks.chunk_size == 0 {
        return Err(ConfigError::Validation(
            "chunk-size must be at least 1".to_string(),
        ));
    }
    if config.chunks.max_retries_per_chunk == 0 {
        return Err(ConfigError::Validation(
            "max-retries-per-chunk must be at least 1".to_string(),
        ));
    }
    if config.pool.max_in_flight == 0 {
        return Err(ConfigError::Validation(
            "max-in-flight must be at least 1".to_string(),
        ));
    }
    if config.walker.politeness_min_ms > config.walker.politeness_max_ms {
        return Err(ConfigError::Validation(
            "politeness-min-ms must not exceed politeness-max-ms".to_string(),
        ));
    }
    if config.chunks.pause_min_ms > config.chunks.pause_max_ms {
        return Err(ConfigError::Validation(
            "pause-min-ms must not exceed pause-max-ms".to_string(),
        ));
    }
    Ok(())
}
