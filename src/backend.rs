//! Storage backend contract
//!
//! The core never touches storage directly. Everything it knows about the outside
//! world arrives through a [`Backend`]: stats, directory listings, dialogs and
//! change notifications. Implementations may be local, remote or entirely in
//! memory, and every call may be slow.

pub mod memory;

pub use memory::{BackendMetrics, MemoryBackend};

use crate::error::BackendError;
use crate::tree::entry::EntryKind;
use async_trait::async_trait;
use std::sync::Arc;

/// Metadata about a backend path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Stat {
    pub kind: EntryKind,
    /// Modification time in milliseconds since the Unix epoch
    pub mtime: u64,
    /// Size in bytes (zero for directories)
    pub size: u64,
}

impl Stat {
    pub fn file(size: u64, mtime: u64) -> Self {
        Self {
            kind: EntryKind::File,
            mtime,
            size,
        }
    }

    pub fn directory(mtime: u64) -> Self {
        Self {
            kind: EntryKind::Directory,
            mtime,
            size: 0,
        }
    }

    pub fn is_file(&self) -> bool {
        self.kind == EntryKind::File
    }

    pub fn is_directory(&self) -> bool {
        self.kind == EntryKind::Directory
    }
}

/// One name/stat pair from a directory listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReaddirEntry {
    pub name: String,
    pub stat: Stat,
}

impl ReaddirEntry {
    pub fn new(name: impl Into<String>, stat: Stat) -> Self {
        Self {
            name: name.into(),
            stat,
        }
    }
}

/// Callback invoked by the backend when a watched path changes.
///
/// The stat is optional: some backends only know that *something* changed.
pub type WatchCallback = Arc<dyn Fn(String, Option<Stat>) + Send + Sync>;

/// Options for an "Open" dialog
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OpenDialogOptions {
    pub allow_multiple_selection: bool,
    pub choose_directories: bool,
    pub title: String,
    /// Folder shown initially; backends fall back to the last browsed folder
    pub initial_path: Option<String>,
    /// Allowed extensions; `None` allows anything
    pub file_types: Option<Vec<String>>,
}

/// Options for a "Save" dialog
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SaveDialogOptions {
    pub title: String,
    pub initial_path: Option<String>,
    pub proposed_name: Option<String>,
}

/// Async storage backend trait
///
/// Only `exists`, `stat`, `readdir` and the watch registration methods are
/// required. Dialogs and mutators default to an `unsupported` error so that
/// read-only backends stay small.
#[async_trait]
pub trait Backend: Send + Sync {
    /// One-time setup, called when a [`crate::FileSystem`] takes ownership.
    fn init(&self) {}

    /// Check whether a path exists
    async fn exists(&self, path: &str) -> bool;

    /// Get metadata for a path
    ///
    /// # Errors
    ///
    /// Returns a `not_found` error when the path is absent, or any other
    /// backend failure (permission denied, I/O fault, ...).
    async fn stat(&self, path: &str) -> Result<Stat, BackendError>;

    /// List a directory (non-recursive), in the backend's enumeration order
    async fn readdir(&self, path: &str) -> Result<Vec<ReaddirEntry>, BackendError>;

    /// Show an "Open" dialog; resolves with the selected paths
    async fn show_open_dialog(
        &self,
        _options: &OpenDialogOptions,
    ) -> Result<Vec<String>, BackendError> {
        Err(BackendError::unsupported("show_open_dialog"))
    }

    /// Show a "Save" dialog; resolves with the chosen path, or `None` if dismissed
    async fn show_save_dialog(
        &self,
        _options: &SaveDialogOptions,
    ) -> Result<Option<String>, BackendError> {
        Err(BackendError::unsupported("show_save_dialog"))
    }

    /// Register the change callback, replacing any previous one
    fn init_watchers(&self, callback: WatchCallback);

    /// Start delivering notifications for a directory
    fn watch_path(&self, path: &str);

    /// Stop delivering notifications for a directory
    fn unwatch_path(&self, path: &str);

    /// Drop every registered watch
    fn unwatch_all(&self);

    async fn mkdir(&self, _path: &str, _mode: Option<u32>) -> Result<Stat, BackendError> {
        Err(BackendError::unsupported("mkdir"))
    }

    async fn rename(&self, _old_path: &str, _new_path: &str) -> Result<(), BackendError> {
        Err(BackendError::unsupported("rename"))
    }

    async fn read_file(&self, _path: &str) -> Result<Vec<u8>, BackendError> {
        Err(BackendError::unsupported("read_file"))
    }

    /// Write a file, returning its stat after the write
    async fn write_file(&self, _path: &str, _data: &[u8]) -> Result<Stat, BackendError> {
        Err(BackendError::unsupported("write_file"))
    }

    async fn chmod(&self, _path: &str, _mode: u32) -> Result<(), BackendError> {
        Err(BackendError::unsupported("chmod"))
    }

    async fn unlink(&self, _path: &str) -> Result<(), BackendError> {
        Err(BackendError::unsupported("unlink"))
    }

    async fn move_to_trash(&self, _path: &str) -> Result<(), BackendError> {
        Err(BackendError::unsupported("move_to_trash"))
    }
}
