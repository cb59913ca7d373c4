//! Configuration loading and validation

pub mod loader;
pub mod types;

pub use loader::{find_config, load_config, load_config_from_dir, load_config_or_default};
pub use types::{validate_config, Config, CrawlerConfig, EngineConfig};
