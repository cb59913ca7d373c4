//! Sitewarden Core - shared foundation for the audit pipeline
//!
//! This crate provides the types, error taxonomy and configuration
//! used by the orchestration engine, the capability implementations
//! and the CLI.

pub mod config;
pub mod error;
pub mod types;

pub use config::{load_config_or_default, validate_config, Config, CrawlerConfig, EngineConfig};
pub use error::{CapabilityError, ConfigError, EngineError, Result, SitewardenError};
pub use types::{
    CapabilityFailure, CapabilityId, FailureKind, Heading, ImageRef, PageData, ResultRecord, Task,
    TaskStatus,
};
