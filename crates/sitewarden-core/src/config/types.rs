//! Configuration types

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Top-level Sitewarden configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub engine: EngineConfig,
    pub crawler: CrawlerConfig,
}

/// Orchestration engine settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Per-capability execution timeout in seconds
    pub capability_timeout_secs: u64,
    /// Progress channel capacity; events beyond this are dropped rather
    /// than blocking execution
    pub channel_capacity: usize,
    /// Cap on targets expanded from a sitemap
    pub max_targets: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            capability_timeout_secs: 60,
            channel_capacity: 256,
            max_targets: 50,
        }
    }
}

impl EngineConfig {
    /// Capability timeout as a `Duration`
    pub fn capability_timeout(&self) -> Duration {
        Duration::from_secs(self.capability_timeout_secs)
    }
}

/// HTTP crawler settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// User-Agent header sent with every request
    pub user_agent: String,
    /// Request timeout in seconds
    pub request_timeout_secs: u64,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            user_agent: format!("sitewarden/{}", env!("CARGO_PKG_VERSION")),
            request_timeout_secs: 30,
        }
    }
}

impl CrawlerConfig {
    /// Request timeout as a `Duration`
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Validate a loaded configuration
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.engine.capability_timeout_secs == 0 {
        return Err(ConfigError::InvalidValue {
            field: "engine.capability_timeout_secs".to_string(),
            message: "must be greater than zero".to_string(),
        });
    }
    if config.engine.channel_capacity == 0 {
        return Err(ConfigError::InvalidValue {
            field: "engine.channel_capacity".to_string(),
            message: "must be greater than zero".to_string(),
        });
    }
    if config.engine.max_targets == 0 {
        return Err(ConfigError::InvalidValue {
            field: "engine.max_targets".to_string(),
            message: "must be greater than zero".to_string(),
        });
    }
    if config.crawler.request_timeout_secs == 0 {
        return Err(ConfigError::InvalidValue {
            field: "crawler.request_timeout_secs".to_string(),
            message: "must be greater than zero".to_string(),
        });
    }
    Ok(())
}
