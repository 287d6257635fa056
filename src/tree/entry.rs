//! File and directory handles
//!
//! Handles are cheap to clone and compare by identity: two handles are equal
//! only when they point at the same indexed object. The index hands out one
//! object per path, so identity doubles as "same entry" during reconciliation.

use crate::backend::Stat;
use crate::error::{FsError, FsResult};
use crate::tree::path;
use futures::future::{BoxFuture, Shared};
use parking_lot::{Mutex, MutexGuard};
use std::fmt;
use std::sync::Arc;

/// Kind of indexed entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryKind {
    File,
    Directory,
}

/// Shared future for an in-flight directory read
pub(crate) type ListingFuture = Shared<BoxFuture<'static, FsResult<Vec<Entry>>>>;

struct FileInner {
    path: String,
    stat: Mutex<Option<Stat>>,
}

/// Handle to a file in the index. The file may not exist on the backend.
#[derive(Clone)]
pub struct File {
    inner: Arc<FileInner>,
}

impl File {
    pub(crate) fn new(path: String) -> Self {
        Self {
            inner: Arc::new(FileInner {
                path,
                stat: Mutex::new(None),
            }),
        }
    }

    pub fn full_path(&self) -> &str {
        &self.inner.path
    }

    pub fn name(&self) -> &str {
        path::file_name(&self.inner.path)
    }

    /// Last stat observed for this file, if any
    pub fn stat(&self) -> Option<Stat> {
        *self.inner.stat.lock()
    }

    pub(crate) fn set_stat(&self, stat: Option<Stat>) {
        *self.inner.stat.lock() = stat;
    }

    /// Replace the cached stat unless it is known to be current.
    ///
    /// A missing incoming stat, a missing cached stat, or a different mtime all
    /// count as stale. Returns whether the cache was replaced.
    pub(crate) fn refresh_stat(&self, stat: Option<Stat>) -> bool {
        let mut cached = self.inner.stat.lock();
        let stale = match (&stat, cached.as_ref()) {
            (Some(incoming), Some(current)) => incoming.mtime != current.mtime,
            _ => true,
        };
        if stale {
            *cached = stat;
        }
        stale
    }

    pub fn ptr_eq(&self, other: &File) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl PartialEq for File {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for File {}

impl fmt::Debug for File {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("File")
            .field("path", &self.inner.path)
            .field("stat", &self.stat())
            .finish()
    }
}

/// Mutable cache state of a directory.
///
/// `generation` is bumped on every invalidation. A read that started under an
/// older generation still answers its own callers but is never cached.
#[derive(Default)]
pub(crate) struct DirectoryState {
    pub(crate) children: Option<Vec<Entry>>,
    pub(crate) pending: Option<ListingFuture>,
    pub(crate) generation: u64,
}

struct DirectoryInner {
    path: String,
    state: Mutex<DirectoryState>,
}

/// Handle to a directory in the index. The directory may not exist on the backend.
#[derive(Clone)]
pub struct Directory {
    inner: Arc<DirectoryInner>,
}

impl Directory {
    pub(crate) fn new(path: String) -> Self {
        Self {
            inner: Arc::new(DirectoryInner {
                path,
                state: Mutex::new(DirectoryState::default()),
            }),
        }
    }

    pub fn full_path(&self) -> &str {
        &self.inner.path
    }

    pub fn name(&self) -> &str {
        path::file_name(&self.inner.path)
    }

    /// Cached listing, if the directory has been read since the last invalidation
    pub fn cached_children(&self) -> Option<Vec<Entry>> {
        self.inner.state.lock().children.clone()
    }

    /// Whether a backend read for this directory is in flight
    pub fn is_pending(&self) -> bool {
        self.inner.state.lock().pending.is_some()
    }

    pub(crate) fn state(&self) -> MutexGuard<'_, DirectoryState> {
        self.inner.state.lock()
    }

    /// Drop the cached listing and any in-flight read, returning the old listing.
    pub(crate) fn invalidate(&self) -> Option<Vec<Entry>> {
        let mut state = self.inner.state.lock();
        state.generation += 1;
        state.pending = None;
        state.children.take()
    }

    pub fn ptr_eq(&self, other: &Directory) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl PartialEq for Directory {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for Directory {}

impl fmt::Debug for Directory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.state.lock();
        f.debug_struct("Directory")
            .field("path", &self.inner.path)
            .field("children", &state.children.as_ref().map(|c| c.len()))
            .field("pending", &state.pending.is_some())
            .field("generation", &state.generation)
            .finish()
    }
}

/// An indexed entry: either a file or a directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Entry {
    File(File),
    Directory(Directory),
}

impl Entry {
    pub fn full_path(&self) -> &str {
        match self {
            Entry::File(file) => file.full_path(),
            Entry::Directory(directory) => directory.full_path(),
        }
    }

    pub fn name(&self) -> &str {
        path::file_name(self.full_path())
    }

    pub fn parent_path(&self) -> Option<&str> {
        path::parent_path(self.full_path())
    }

    pub fn kind(&self) -> EntryKind {
        match self {
            Entry::File(_) => EntryKind::File,
            Entry::Directory(_) => EntryKind::Directory,
        }
    }

    pub fn is_file(&self) -> bool {
        matches!(self, Entry::File(_))
    }

    pub fn is_directory(&self) -> bool {
        matches!(self, Entry::Directory(_))
    }

    pub fn as_file(&self) -> Option<&File> {
        match self {
            Entry::File(file) => Some(file),
            Entry::Directory(_) => None,
        }
    }

    pub fn as_directory(&self) -> Option<&Directory> {
        match self {
            Entry::Directory(directory) => Some(directory),
            Entry::File(_) => None,
        }
    }

    /// Identity comparison, same as `==`
    pub fn ptr_eq(&self, other: &Entry) -> bool {
        match (self, other) {
            (Entry::File(a), Entry::File(b)) => a.ptr_eq(b),
            (Entry::Directory(a), Entry::Directory(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

impl From<File> for Entry {
    fn from(file: File) -> Self {
        Entry::File(file)
    }
}

impl From<Directory> for Entry {
    fn from(directory: Directory) -> Self {
        Entry::Directory(directory)
    }
}

/// A file that exists only in memory, such as the target of "Save As".
///
/// Never indexed, listed or reconciled. Reading it always fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransientFile {
    path: String,
}

impl TransientFile {
    pub(crate) fn new(path: String) -> Self {
        Self { path }
    }

    pub fn full_path(&self) -> &str {
        &self.path
    }

    pub fn name(&self) -> &str {
        path::file_name(&self.path)
    }

    pub fn read(&self) -> FsResult<Vec<u8>> {
        Err(FsError::NotFound(self.path.clone()))
    }
}
