//! Canopy: Cached, Indexed File Tree
//!
//! An in-memory view of a storage backend's directory tree. Directory listings
//! are cached and de-duplicated, every path maps to exactly one handle, and
//! backend change notifications are reconciled into the index as they arrive.
//!
//! Storage is pluggable through the async [`Backend`] trait; [`MemoryBackend`]
//! is a complete in-memory implementation.

pub mod backend;
pub mod config;
pub mod error;
pub mod filesystem;
pub mod ignore;
pub mod logging;
pub mod scanner;
pub mod tree;
pub mod watch;

pub use backend::{Backend, MemoryBackend, OpenDialogOptions, SaveDialogOptions, Stat};
pub use error::{BackendError, FsError, FsResult};
pub use filesystem::FileSystem;
pub use scanner::ScanReport;
pub use tree::entry::{Directory, Entry, EntryKind, File, TransientFile};
pub use watch::ChangeEvent;
