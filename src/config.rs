//! Configuration System
//!
//! Layered configuration for the file tree. Sources, lowest precedence first:
//! built-in defaults, the global config file, the workspace config file
//! (`<root>/.canopy/config.toml`), then `CANOPY__*` environment variables
//! (`CANOPY__INDEX__MAX_SCAN_DEPTH=4`).

use crate::error::FsError;
use crate::ignore;
use crate::logging::LoggingConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

mod merge;
mod sources;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CanopyConfig {
    /// Index and scan settings
    #[serde(default)]
    pub index: IndexConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Index and scan settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexConfig {
    /// Names hidden in addition to the built-in exclusions (`name` or `*suffix`)
    #[serde(default)]
    pub extra_exclusions: Vec<String>,

    /// Maximum directory depth below the scan root (None = unlimited)
    ///
    /// Scans do not detect symlink cycles; a bound keeps a cyclic backend from
    /// recursing forever.
    #[serde(default)]
    pub max_scan_depth: Option<usize>,

    /// Capacity of the change event channel per subscriber
    #[serde(default = "default_event_capacity")]
    pub event_capacity: usize,
}

pub(crate) fn default_event_capacity() -> usize {
    256
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            extra_exclusions: Vec::new(),
            max_scan_depth: None,
            event_capacity: default_event_capacity(),
        }
    }
}

impl IndexConfig {
    /// Validate index configuration
    pub fn validate(&self) -> Result<(), String> {
        for pattern in &self.extra_exclusions {
            ignore::validate_pattern(pattern)?;
        }
        if self.event_capacity == 0 {
            return Err("Event capacity must be at least 1".to_string());
        }
        Ok(())
    }
}

/// Configuration validation errors
#[derive(Debug, Clone)]
pub enum ValidationError {
    Index(String),
    Logging(String),
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::Index(msg) => write!(f, "Index: {}", msg),
            ValidationError::Logging(msg) => write!(f, "Logging: {}", msg),
        }
    }
}

impl std::error::Error for ValidationError {}

impl CanopyConfig {
    /// Validate the entire configuration
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if let Err(e) = self.index.validate() {
            errors.push(ValidationError::Index(e));
        }
        if let Err(e) = self.logging.validate() {
            errors.push(ValidationError::Logging(e));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Loads [`CanopyConfig`] from its layered sources
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration for a workspace root
    pub fn load(workspace_root: &Path) -> Result<CanopyConfig, FsError> {
        let builder = merge::builder_with_defaults()?;
        let builder = sources::add_global_file(builder);
        let builder = sources::add_workspace_file(builder, workspace_root);
        let builder = sources::add_environment(builder);

        let config: CanopyConfig = builder.build()?.try_deserialize()?;
        Self::validated(config)
    }

    /// Load configuration from a single file on top of the defaults
    pub fn load_from_file(path: &Path) -> Result<CanopyConfig, FsError> {
        let config: CanopyConfig = merge::builder_with_defaults()?
            .add_source(config::File::from(path))
            .build()?
            .try_deserialize()?;
        Self::validated(config)
    }

    /// Path of the global config file, if a home directory is known
    pub fn global_config_path() -> Option<PathBuf> {
        sources::global_config_path()
    }

    /// Path of the workspace config file for a root
    pub fn workspace_config_path(workspace_root: &Path) -> PathBuf {
        sources::workspace_config_path(workspace_root)
    }

    fn validated(config: CanopyConfig) -> Result<CanopyConfig, FsError> {
        config.validate().map_err(|errors| {
            let error_msgs: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            FsError::ConfigError(format!(
                "Configuration validation failed:\n{}",
                error_msgs.join("\n")
            ))
        })?;
        Ok(config)
    }
}
