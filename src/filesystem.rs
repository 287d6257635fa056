//! FileSystem orchestrator
//!
//! Owns the backend and the path index, caches directory listings and hands out
//! one handle per path. Listing reads are de-duplicated per directory: while a
//! read is in flight every caller awaits the same shared future.

use crate::backend::{Backend, OpenDialogOptions, ReaddirEntry, SaveDialogOptions, Stat};
use crate::config::IndexConfig;
use crate::error::{FsError, FsResult};
use crate::ignore::ExclusionFilter;
use crate::tree::entry::{Directory, Entry, EntryKind, File, TransientFile};
use crate::tree::index::PathIndex;
use crate::tree::path::{self, normalize_path};
use crate::watch::ChangeEvent;
use futures::FutureExt;
use parking_lot::RwLock;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

pub(crate) struct FileSystemInner {
    pub(crate) backend: Arc<dyn Backend>,
    pub(crate) index: RwLock<PathIndex>,
    filter: ExclusionFilter,
    pub(crate) max_scan_depth: Option<usize>,
    pub(crate) events: broadcast::Sender<ChangeEvent>,
    pub(crate) closed: AtomicBool,
    /// Bumped whenever the index is reset; scans started under an older epoch stop.
    pub(crate) scan_epoch: AtomicU64,
}

/// Caching, indexing view over a [`Backend`].
///
/// Cloning is cheap and every clone shares the same index.
#[derive(Clone)]
pub struct FileSystem {
    pub(crate) inner: Arc<FileSystemInner>,
}

impl fmt::Debug for FileSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileSystem")
            .field("backend", &"<dyn Backend>")
            .field("indexed", &self.index_len())
            .field("closed", &self.is_closed())
            .finish()
    }
}

impl FileSystem {
    /// Create a file system over `backend` with default settings
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self::with_config(backend, &IndexConfig::default())
    }

    /// Create a file system over `backend`
    ///
    /// Calls [`Backend::init`] before returning.
    pub fn with_config(backend: Arc<dyn Backend>, config: &IndexConfig) -> Self {
        backend.init();
        let (events, _) = broadcast::channel(config.event_capacity.max(1));
        Self {
            inner: Arc::new(FileSystemInner {
                backend,
                index: RwLock::new(PathIndex::new()),
                filter: ExclusionFilter::with_extra(&config.extra_exclusions),
                max_scan_depth: config.max_scan_depth,
                events,
                closed: AtomicBool::new(false),
                scan_epoch: AtomicU64::new(0),
            }),
        }
    }

    pub fn backend(&self) -> &Arc<dyn Backend> {
        &self.inner.backend
    }

    /// Indexed file at `path`, created and indexed if missing.
    ///
    /// Never touches the backend. A directory indexed at the same path is replaced.
    pub fn get_file_for_path(&self, path: &str) -> File {
        let path = normalize_path(path);
        let mut index = self.inner.index.write();
        match index.get_entry(&path) {
            Some(Entry::File(file)) => file,
            existing => {
                if existing.is_some() {
                    debug!(path = %path, "Replacing indexed directory with file");
                }
                let file = File::new(path);
                index.add_entry(Entry::File(file.clone()));
                file
            }
        }
    }

    /// Indexed directory at `path`, created and indexed if missing.
    ///
    /// A trailing separator is ignored and the empty path names the backend root.
    pub fn get_directory_for_path(&self, path: &str) -> Directory {
        let path = normalize_path(path);
        let mut index = self.inner.index.write();
        match index.get_entry(&path) {
            Some(Entry::Directory(directory)) => directory,
            existing => {
                if existing.is_some() {
                    debug!(path = %path, "Replacing indexed file with directory");
                }
                let directory = Directory::new(path);
                index.add_entry(Entry::Directory(directory.clone()));
                directory
            }
        }
    }

    /// A fresh, unindexed in-memory file
    pub fn get_in_memory_file(&self, path: &str) -> TransientFile {
        TransientFile::new(normalize_path(path))
    }

    /// Entry currently indexed at `path`, without creating one
    pub fn indexed_entry(&self, path: &str) -> Option<Entry> {
        self.inner.index.read().get_entry(&normalize_path(path))
    }

    pub fn index_len(&self) -> usize {
        self.inner.index.read().len()
    }

    /// Resolve `path` to its indexed entry if the backend reports it exists.
    ///
    /// Paths that are not indexed yet are classified with a `stat` call.
    #[instrument(skip(self))]
    pub async fn path_exists(&self, path: &str) -> FsResult<Entry> {
        let path = normalize_path(path);
        self.require_exists(&path).await?;
        if let Some(entry) = self.indexed_entry(&path) {
            return Ok(entry);
        }
        let stat = self.inner.backend.stat(&path).await?;
        Ok(self.entry_for_stat(&path, stat))
    }

    /// Check existence, stat `path` and return the indexed entry of the matching kind.
    #[instrument(skip(self))]
    pub async fn resolve(&self, path: &str) -> FsResult<Entry> {
        let path = normalize_path(path);
        self.require_exists(&path).await?;
        let stat = self.inner.backend.stat(&path).await?;
        Ok(self.entry_for_stat(&path, stat))
    }

    async fn require_exists(&self, path: &str) -> FsResult<()> {
        if self.inner.backend.exists(path).await {
            Ok(())
        } else {
            Err(FsError::NotFound(path.to_string()))
        }
    }

    fn entry_for_stat(&self, path: &str, stat: Stat) -> Entry {
        match stat.kind {
            EntryKind::File => {
                let file = self.get_file_for_path(path);
                file.set_stat(Some(stat));
                Entry::File(file)
            }
            EntryKind::Directory => Entry::Directory(self.get_directory_for_path(path)),
        }
    }

    /// Children of `directory`, from cache when possible.
    ///
    /// At most one backend read is in flight per directory; concurrent callers
    /// share its result. Failures propagate and leave nothing cached.
    pub async fn get_directory_contents(&self, directory: &Directory) -> FsResult<Vec<Entry>> {
        let listing = {
            let mut state = directory.state();
            if let Some(pending) = &state.pending {
                pending.clone()
            } else if let Some(children) = &state.children {
                return Ok(children.clone());
            } else {
                let listing = self
                    .clone()
                    .read_directory(directory.clone(), state.generation)
                    .boxed()
                    .shared();
                state.pending = Some(listing.clone());
                listing
            }
        };
        listing.await
    }

    async fn read_directory(self, directory: Directory, generation: u64) -> FsResult<Vec<Entry>> {
        let epoch = self.inner.scan_epoch.load(Ordering::SeqCst);
        let result = match self.inner.backend.readdir(directory.full_path()).await {
            Ok(listing) => {
                // The index was reset or the directory forgotten while reading;
                // keep those paths out of the index
                let current = directory.state().generation == generation;
                let attach = current && epoch == self.inner.scan_epoch.load(Ordering::SeqCst);
                Ok(self.assemble_children(directory.full_path(), listing, attach))
            }
            Err(err) => {
                warn!(path = directory.full_path(), error = %err, "Failed to read directory");
                Err(FsError::from(err))
            }
        };

        let mut state = directory.state();
        if state.generation == generation {
            state.pending = None;
            if let Ok(children) = &result {
                state.children = Some(children.clone());
            }
        } else {
            debug!(
                path = directory.full_path(),
                "Directory invalidated during read, result not cached"
            );
        }
        result
    }

    fn assemble_children(
        &self,
        directory: &str,
        listing: Vec<ReaddirEntry>,
        attach: bool,
    ) -> Vec<Entry> {
        listing
            .into_iter()
            .filter_map(|item| {
                let child_path = normalize_path(&path::join(directory, &item.name));
                if !self.should_show(&child_path) {
                    return None;
                }
                let entry = match (item.stat.kind, attach) {
                    (EntryKind::File, true) => Entry::File(self.get_file_for_path(&child_path)),
                    (EntryKind::File, false) => Entry::File(File::new(child_path)),
                    (EntryKind::Directory, true) => {
                        Entry::Directory(self.get_directory_for_path(&child_path))
                    }
                    (EntryKind::Directory, false) => {
                        Entry::Directory(Directory::new(child_path))
                    }
                };
                if let Entry::File(file) = &entry {
                    file.set_stat(Some(item.stat));
                }
                Some(entry)
            })
            .collect()
    }

    /// Every indexed file, optionally filtered. Order is unspecified.
    pub fn get_file_list(&self, filter: Option<&dyn Fn(&Entry) -> bool>) -> Vec<File> {
        self.inner.index.read().get_all_files(filter)
    }

    /// Whether a path survives the exclusion rules
    pub fn should_show(&self, path: &str) -> bool {
        self.inner.filter.should_show(path)
    }

    pub async fn show_open_dialog(&self, options: &OpenDialogOptions) -> FsResult<Vec<String>> {
        Ok(self.inner.backend.show_open_dialog(options).await?)
    }

    pub async fn show_save_dialog(&self, options: &SaveDialogOptions) -> FsResult<Option<String>> {
        Ok(self.inner.backend.show_save_dialog(options).await?)
    }

    /// Reset the index and start scanning `path` as the new project root.
    ///
    /// Drops every backend watch and re-registers the change callback before the
    /// scan is spawned. The returned handle resolves with the scan summary and
    /// may be dropped.
    ///
    /// # Panics
    ///
    /// Panics when called outside a Tokio runtime.
    #[instrument(skip(self))]
    pub fn set_project_root(&self, path: &str) -> JoinHandle<crate::scanner::ScanReport> {
        let root = normalize_path(path);
        let epoch = self.inner.scan_epoch.fetch_add(1, Ordering::SeqCst) + 1;
        self.inner.index.write().clear();
        self.inner.backend.unwatch_all();
        self.inner.closed.store(false, Ordering::SeqCst);
        self.install_watchers();
        info!(root = %root, "Project root set");

        let fs = self.clone();
        tokio::spawn(async move { fs.scan_with_epoch(&root, epoch).await })
    }

    /// Drop every watch and clear the index. Later notifications are ignored.
    pub fn close(&self) {
        self.inner.closed.store(true, Ordering::SeqCst);
        self.inner.scan_epoch.fetch_add(1, Ordering::SeqCst);
        self.inner.backend.unwatch_all();
        self.inner.index.write().clear();
        info!("File system closed");
    }

    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::SeqCst)
    }

    /// Receive a [`ChangeEvent`] for every reconciled notification
    pub fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.inner.events.subscribe()
    }

    /// Remove an entry, and for directories everything beneath it, from the index.
    ///
    /// Removed directories are unwatched, nested ones first.
    pub(crate) fn forget(&self, entry: &Entry) {
        let directory = match entry {
            Entry::File(_) => {
                self.inner.index.write().remove_entry(entry);
                return;
            }
            Entry::Directory(directory) => directory,
        };

        let mut unwatch = Vec::new();
        {
            let mut index = self.inner.index.write();
            for nested in index.entries_under(directory.full_path()) {
                if index.remove_entry(&nested) {
                    if let Entry::Directory(nested) = nested {
                        unwatch.push(nested);
                    }
                }
            }
            index.remove_entry(entry);
        }
        unwatch.push(directory.clone());

        for removed in &unwatch {
            removed.invalidate();
            self.inner.backend.unwatch_path(removed.full_path());
        }
        debug!(
            path = directory.full_path(),
            directories = unwatch.len(),
            "Forgot directory subtree"
        );
    }

    pub async fn read_file(&self, file: &File) -> FsResult<Vec<u8>> {
        Ok(self.inner.backend.read_file(file.full_path()).await?)
    }

    /// Write `data` to `file` and refresh its cached stat.
    pub async fn write_file(&self, file: &File, data: &[u8]) -> FsResult<Stat> {
        let stat = self.inner.backend.write_file(file.full_path(), data).await?;
        file.set_stat(Some(stat));
        Ok(stat)
    }

    /// Create a directory and return its indexed handle
    pub async fn mkdir(&self, path: &str, mode: Option<u32>) -> FsResult<Directory> {
        let path = normalize_path(path);
        self.inner.backend.mkdir(&path, mode).await?;
        Ok(self.get_directory_for_path(&path))
    }

    /// Rename an entry. The old entry leaves the index; the entry at the new path
    /// is resolved and returned.
    pub async fn rename(&self, entry: &Entry, new_path: &str) -> FsResult<Entry> {
        let new_path = normalize_path(new_path);
        self.inner
            .backend
            .rename(entry.full_path(), &new_path)
            .await?;
        self.forget(entry);
        self.resolve(&new_path).await
    }

    pub async fn unlink(&self, entry: &Entry) -> FsResult<()> {
        self.inner.backend.unlink(entry.full_path()).await?;
        self.forget(entry);
        Ok(())
    }

    pub async fn move_to_trash(&self, entry: &Entry) -> FsResult<()> {
        self.inner.backend.move_to_trash(entry.full_path()).await?;
        self.forget(entry);
        Ok(())
    }

    pub async fn chmod(&self, entry: &Entry, mode: u32) -> FsResult<()> {
        Ok(self.inner.backend.chmod(entry.full_path(), mode).await?)
    }
}
