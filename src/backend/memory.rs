//! In-memory backend
//!
//! A complete [`Backend`] over an in-memory tree. It can add artificial latency
//! to every read, inject listing failures and fire watch notifications on
//! demand, and it counts calls so tests can assert on backend traffic.

use super::{Backend, OpenDialogOptions, ReaddirEntry, SaveDialogOptions, Stat, WatchCallback};
use crate::error::BackendError;
use crate::tree::path::{self, normalize_path, ROOT};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use std::time::Duration;

#[derive(Debug, Clone)]
enum Node {
    Directory { mtime: u64 },
    File { data: Vec<u8>, mtime: u64, mode: u32 },
}

impl Node {
    fn stat(&self) -> Stat {
        match self {
            Node::Directory { mtime } => Stat::directory(*mtime),
            Node::File { data, mtime, .. } => Stat::file(data.len() as u64, *mtime),
        }
    }

    fn is_directory(&self) -> bool {
        matches!(self, Node::Directory { .. })
    }
}

/// Call counters for backend operations
#[derive(Debug, Clone, Default)]
pub struct BackendMetrics {
    pub init_calls: usize,
    pub exists_calls: usize,
    pub stat_calls: usize,
    /// readdir calls per path
    pub readdir_calls: HashMap<String, usize>,
    /// Every watch_path call, in order
    pub watch_calls: Vec<String>,
    /// Every unwatch_path call, in order
    pub unwatch_calls: Vec<String>,
    pub unwatch_all_calls: usize,
}

impl BackendMetrics {
    pub fn readdir_count(&self, path: &str) -> usize {
        self.readdir_calls.get(path).copied().unwrap_or(0)
    }

    pub fn total_readdir_calls(&self) -> usize {
        self.readdir_calls.values().sum()
    }

    pub fn unwatch_count(&self, path: &str) -> usize {
        self.unwatch_calls.iter().filter(|p| p.as_str() == path).count()
    }
}

#[derive(Default)]
struct MemoryState {
    nodes: BTreeMap<String, Node>,
    readdir_failures: HashMap<String, BackendError>,
    watched: BTreeSet<String>,
    callback: Option<WatchCallback>,
    open_dialog_result: Option<Vec<String>>,
    save_dialog_result: Option<Option<String>>,
    clock: u64,
    metrics: BackendMetrics,
}

impl MemoryState {
    fn tick(&mut self) -> u64 {
        self.clock += 1;
        self.clock
    }

    fn ensure_directory(&mut self, path: &str) {
        if let Some(parent) = path::parent_path(path) {
            if !self.nodes.contains_key(parent) {
                self.ensure_directory(parent);
            }
        }
        if !self.nodes.contains_key(path) {
            let mtime = self.clock;
            self.nodes
                .insert(path.to_string(), Node::Directory { mtime });
        }
    }

    fn require_parent_directory(&self, path: &str) -> Result<(), BackendError> {
        match path::parent_path(path).and_then(|parent| self.nodes.get(parent)) {
            Some(node) if node.is_directory() => Ok(()),
            _ => Err(BackendError::not_found(
                path::parent_path(path).unwrap_or(path),
            )),
        }
    }

    fn subtree_keys(&self, path: &str) -> Vec<String> {
        self.nodes
            .keys()
            .filter(|key| key.as_str() == path || path::is_descendant(key, path))
            .cloned()
            .collect()
    }

    fn remove_subtree(&mut self, path: &str) -> bool {
        let keys = self.subtree_keys(path);
        for key in &keys {
            self.nodes.remove(key);
        }
        !keys.is_empty()
    }
}

/// In-memory [`Backend`] implementation
pub struct MemoryBackend {
    state: Mutex<MemoryState>,
    latency: Duration,
}

impl fmt::Debug for MemoryBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("MemoryBackend")
            .field("nodes", &state.nodes.len())
            .field("watched", &state.watched)
            .field("latency", &self.latency)
            .finish()
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryBackend {
    /// Create an empty backend containing only the root directory
    pub fn new() -> Self {
        Self::with_latency(Duration::ZERO)
    }

    /// Create an empty backend that delays every read by `latency`
    pub fn with_latency(latency: Duration) -> Self {
        let mut state = MemoryState::default();
        state
            .nodes
            .insert(ROOT.to_string(), Node::Directory { mtime: 0 });
        Self {
            state: Mutex::new(state),
            latency,
        }
    }

    /// Add a directory, creating missing parents
    pub fn add_dir(&self, path: &str) {
        let path = normalize_path(path);
        self.state.lock().ensure_directory(&path);
    }

    /// Add or replace a file, creating missing parents
    pub fn add_file(&self, path: &str, contents: &[u8], mtime: u64) {
        let path = normalize_path(path);
        let mut state = self.state.lock();
        if let Some(parent) = path::parent_path(&path) {
            state.ensure_directory(parent);
        }
        state.clock = state.clock.max(mtime);
        state.nodes.insert(
            path,
            Node::File {
                data: contents.to_vec(),
                mtime,
                mode: 0o644,
            },
        );
    }

    /// Change the modification time of an existing path
    pub fn set_mtime(&self, path: &str, new_mtime: u64) {
        let path = normalize_path(path);
        let mut state = self.state.lock();
        state.clock = state.clock.max(new_mtime);
        match state.nodes.get_mut(&path) {
            Some(Node::Directory { mtime }) | Some(Node::File { mtime, .. }) => *mtime = new_mtime,
            None => {}
        }
    }

    /// Remove a path and everything beneath it
    pub fn remove(&self, path: &str) {
        let path = normalize_path(path);
        self.state.lock().remove_subtree(&path);
    }

    /// Make every subsequent readdir of `path` fail with `error`
    pub fn fail_readdir(&self, path: &str, error: BackendError) {
        self.state
            .lock()
            .readdir_failures
            .insert(normalize_path(path), error);
    }

    pub fn clear_readdir_failure(&self, path: &str) {
        self.state
            .lock()
            .readdir_failures
            .remove(&normalize_path(path));
    }

    /// Script the selection returned by the next "Open" dialogs
    pub fn set_open_dialog_result(&self, selection: Vec<String>) {
        self.state.lock().open_dialog_result = Some(selection);
    }

    /// Script the path returned by the next "Save" dialogs
    pub fn set_save_dialog_result(&self, selection: Option<String>) {
        self.state.lock().save_dialog_result = Some(selection);
    }

    /// Fire a watch notification for `path` carrying its current stat
    ///
    /// Returns false when no watch callback is registered.
    pub fn notify(&self, path: &str) -> bool {
        let path = normalize_path(path);
        let stat = self.state.lock().nodes.get(&path).map(Node::stat);
        self.notify_with_stat(&path, stat)
    }

    /// Fire a watch notification with an explicit (possibly absent) stat
    pub fn notify_with_stat(&self, path: &str, stat: Option<Stat>) -> bool {
        let callback = self.state.lock().callback.clone();
        match callback {
            Some(callback) => {
                callback(normalize_path(path), stat);
                true
            }
            None => false,
        }
    }

    pub fn is_watched(&self, path: &str) -> bool {
        self.state.lock().watched.contains(&normalize_path(path))
    }

    pub fn watched_paths(&self) -> Vec<String> {
        self.state.lock().watched.iter().cloned().collect()
    }

    pub fn metrics(&self) -> BackendMetrics {
        self.state.lock().metrics.clone()
    }

    pub fn reset_metrics(&self) {
        self.state.lock().metrics = BackendMetrics::default();
    }

    async fn delay(&self) {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
    }
}

#[async_trait]
impl Backend for MemoryBackend {
    fn init(&self) {
        self.state.lock().metrics.init_calls += 1;
    }

    async fn exists(&self, path: &str) -> bool {
        self.state.lock().metrics.exists_calls += 1;
        self.delay().await;
        self.state.lock().nodes.contains_key(&normalize_path(path))
    }

    async fn stat(&self, path: &str) -> Result<Stat, BackendError> {
        self.state.lock().metrics.stat_calls += 1;
        self.delay().await;
        let path = normalize_path(path);
        self.state
            .lock()
            .nodes
            .get(&path)
            .map(Node::stat)
            .ok_or_else(|| BackendError::not_found(&path))
    }

    async fn readdir(&self, path: &str) -> Result<Vec<ReaddirEntry>, BackendError> {
        let path = normalize_path(path);
        *self
            .state
            .lock()
            .metrics
            .readdir_calls
            .entry(path.clone())
            .or_insert(0) += 1;
        self.delay().await;

        let state = self.state.lock();
        if let Some(error) = state.readdir_failures.get(&path) {
            return Err(error.clone());
        }
        match state.nodes.get(&path) {
            Some(Node::Directory { .. }) => Ok(state
                .nodes
                .iter()
                .filter(|(key, _)| path::parent_path(key) == Some(path.as_str()))
                .map(|(key, node)| ReaddirEntry::new(path::file_name(key), node.stat()))
                .collect()),
            Some(Node::File { .. }) => Err(BackendError::io(format!("Not a directory: {}", path))),
            None => Err(BackendError::not_found(&path)),
        }
    }

    async fn show_open_dialog(
        &self,
        _options: &OpenDialogOptions,
    ) -> Result<Vec<String>, BackendError> {
        self.state
            .lock()
            .open_dialog_result
            .clone()
            .ok_or_else(|| BackendError::unsupported("show_open_dialog"))
    }

    async fn show_save_dialog(
        &self,
        _options: &SaveDialogOptions,
    ) -> Result<Option<String>, BackendError> {
        self.state
            .lock()
            .save_dialog_result
            .clone()
            .ok_or_else(|| BackendError::unsupported("show_save_dialog"))
    }

    fn init_watchers(&self, callback: WatchCallback) {
        self.state.lock().callback = Some(callback);
    }

    fn watch_path(&self, path: &str) {
        let path = normalize_path(path);
        let mut state = self.state.lock();
        state.metrics.watch_calls.push(path.clone());
        state.watched.insert(path);
    }

    fn unwatch_path(&self, path: &str) {
        let path = normalize_path(path);
        let mut state = self.state.lock();
        state.metrics.unwatch_calls.push(path.clone());
        state.watched.remove(&path);
    }

    fn unwatch_all(&self) {
        let mut state = self.state.lock();
        state.metrics.unwatch_all_calls += 1;
        state.watched.clear();
    }

    async fn mkdir(&self, path: &str, _mode: Option<u32>) -> Result<Stat, BackendError> {
        let path = normalize_path(path);
        let mut state = self.state.lock();
        if state.nodes.contains_key(&path) {
            return Err(BackendError::already_exists(&path));
        }
        state.require_parent_directory(&path)?;
        let mtime = state.tick();
        let node = Node::Directory { mtime };
        let stat = node.stat();
        state.nodes.insert(path, node);
        Ok(stat)
    }

    async fn rename(&self, old_path: &str, new_path: &str) -> Result<(), BackendError> {
        let old_path = normalize_path(old_path);
        let new_path = normalize_path(new_path);
        let mut state = self.state.lock();
        if !state.nodes.contains_key(&old_path) {
            return Err(BackendError::not_found(&old_path));
        }
        if state.nodes.contains_key(&new_path) {
            return Err(BackendError::already_exists(&new_path));
        }
        state.require_parent_directory(&new_path)?;
        for key in state.subtree_keys(&old_path) {
            if let Some(node) = state.nodes.remove(&key) {
                let moved = format!("{}{}", new_path, &key[old_path.len()..]);
                state.nodes.insert(moved, node);
            }
        }
        Ok(())
    }

    async fn read_file(&self, path: &str) -> Result<Vec<u8>, BackendError> {
        self.delay().await;
        let path = normalize_path(path);
        match self.state.lock().nodes.get(&path) {
            Some(Node::File { data, .. }) => Ok(data.clone()),
            Some(Node::Directory { .. }) => {
                Err(BackendError::io(format!("Is a directory: {}", path)))
            }
            None => Err(BackendError::not_found(&path)),
        }
    }

    async fn write_file(&self, path: &str, data: &[u8]) -> Result<Stat, BackendError> {
        let path = normalize_path(path);
        let mut state = self.state.lock();
        if matches!(state.nodes.get(&path), Some(Node::Directory { .. })) {
            return Err(BackendError::io(format!("Is a directory: {}", path)));
        }
        state.require_parent_directory(&path)?;
        let mode = match state.nodes.get(&path) {
            Some(Node::File { mode, .. }) => *mode,
            _ => 0o644,
        };
        let mtime = state.tick();
        let node = Node::File {
            data: data.to_vec(),
            mtime,
            mode,
        };
        let stat = node.stat();
        state.nodes.insert(path, node);
        Ok(stat)
    }

    async fn chmod(&self, path: &str, new_mode: u32) -> Result<(), BackendError> {
        let path = normalize_path(path);
        match self.state.lock().nodes.get_mut(&path) {
            Some(Node::File { mode, .. }) => {
                *mode = new_mode;
                Ok(())
            }
            Some(Node::Directory { .. }) => Ok(()),
            None => Err(BackendError::not_found(&path)),
        }
    }

    async fn unlink(&self, path: &str) -> Result<(), BackendError> {
        let path = normalize_path(path);
        if self.state.lock().remove_subtree(&path) {
            Ok(())
        } else {
            Err(BackendError::not_found(&path))
        }
    }

    async fn move_to_trash(&self, path: &str) -> Result<(), BackendError> {
        self.unlink(path).await
    }
}
