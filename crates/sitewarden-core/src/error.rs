//! Error types for Sitewarden

use std::path::PathBuf;
use thiserror::Error;

use crate::types::CapabilityId;

/// Result type alias using SitewardenError
pub type Result<T> = std::result::Result<T, SitewardenError>;

/// Main error type for Sitewarden operations
#[derive(Debug, Error)]
pub enum SitewardenError {
    /// Engine-related errors
    #[error(transparent)]
    Engine(#[from] EngineError),

    /// Configuration-related errors
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Capability-related errors
    #[error(transparent)]
    Capability(#[from] CapabilityError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic errors
    #[error("{0}")]
    Other(String),
}

impl SitewardenError {
    /// Create a new "other" error with a message
    pub fn other<S: Into<String>>(msg: S) -> Self {
        Self::Other(msg.into())
    }
}

/// Orchestration engine errors.
///
/// These are configuration-time conditions: they must surface before any
/// task starts, never mid-execution. Capability failures during a run are
/// data (`ResultRecord::Failure`), not errors.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Requested capability id is not registered
    #[error("Unknown capability: {0}")]
    UnknownCapability(String),

    /// The registry's dependency graph contains a cycle
    #[error("Cyclic dependency detected among capabilities: {0}")]
    DependencyCycle(String),

    /// A foundational capability failed, aborting the task
    #[error("Foundational capability '{capability}' failed: {message}")]
    FatalCapability {
        capability: CapabilityId,
        message: String,
    },

    /// Target URL could not be parsed
    #[error("Invalid target '{url}': {reason}")]
    InvalidTarget { url: String, reason: String },

    /// The target list is empty
    #[error("No targets to audit")]
    NoTargets,
}

/// Configuration-related errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Configuration file not found
    #[error("Configuration file not found at {0}")]
    NotFound(PathBuf),

    /// Invalid configuration value
    #[error("Invalid configuration: {field} - {message}")]
    InvalidValue { field: String, message: String },

    /// TOML parsing error
    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    /// IO error
    #[error("IO error reading config: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors returned by capability implementations.
///
/// The executor converts every one of these into a `ResultRecord::Failure`;
/// they never cross the stage fan-in barrier as errors.
#[derive(Debug, Error)]
pub enum CapabilityError {
    /// Fetching the target page failed
    #[error("Fetch failed: {0}")]
    Fetch(String),

    /// Crawled page data was not available to the capability
    #[error("Page data unavailable")]
    PageUnavailable,

    /// A declared dependency's output was missing from the context
    #[error("Missing output from dependency '{0}'")]
    MissingDependency(CapabilityId),

    /// The analysis itself failed
    #[error("{0}")]
    Analysis(String),
}
