//! Error types for the canopy file tree.

use thiserror::Error;

/// Error reported by a storage backend.
///
/// Backends attach an errno-style `code` so the core can tell a missing path
/// apart from other failures without parsing messages.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{code}: {message}")]
pub struct BackendError {
    pub code: String,
    pub message: String,
}

impl BackendError {
    pub const NOT_FOUND: &'static str = "ENOENT";
    pub const PERMISSION_DENIED: &'static str = "EACCES";
    pub const IO: &'static str = "EIO";
    pub const ALREADY_EXISTS: &'static str = "EEXIST";
    pub const UNSUPPORTED: &'static str = "ENOTSUP";

    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }

    /// The message carries the missing path.
    pub fn not_found(path: &str) -> Self {
        Self::new(Self::NOT_FOUND, path)
    }

    pub fn permission_denied(path: &str) -> Self {
        Self::new(Self::PERMISSION_DENIED, format!("Permission denied: {}", path))
    }

    pub fn io(message: impl Into<String>) -> Self {
        Self::new(Self::IO, message)
    }

    pub fn already_exists(path: &str) -> Self {
        Self::new(Self::ALREADY_EXISTS, format!("Already exists: {}", path))
    }

    pub fn unsupported(operation: &str) -> Self {
        Self::new(
            Self::UNSUPPORTED,
            format!("Operation not supported by backend: {}", operation),
        )
    }

    pub fn is_not_found(&self) -> bool {
        self.code == Self::NOT_FOUND
    }
}

/// Errors surfaced by [`crate::FileSystem`] operations.
///
/// `Clone` is required because a single in-flight directory read hands the
/// same result to every waiting caller.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FsError {
    #[error("Path not found: {0}")]
    NotFound(String),

    #[error("Backend error [{code}]: {message}")]
    Backend { code: String, message: String },

    /// Reserved; no core operation produces it.
    #[error("Operation cancelled")]
    Cancelled,

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

pub type FsResult<T> = Result<T, FsError>;

impl From<BackendError> for FsError {
    fn from(err: BackendError) -> Self {
        if err.is_not_found() {
            FsError::NotFound(err.message)
        } else {
            FsError::Backend {
                code: err.code,
                message: err.message,
            }
        }
    }
}

impl From<config::ConfigError> for FsError {
    fn from(err: config::ConfigError) -> Self {
        FsError::ConfigError(err.to_string())
    }
}
