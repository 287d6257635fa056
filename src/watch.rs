//! Watch notification reconciliation
//!
//! Backends report changes through a callback that only enqueues. A single
//! reconciler task drains the queue, so notifications are applied one at a time
//! in arrival order, and each applied notification is broadcast as a
//! [`ChangeEvent`].

use crate::backend::{Stat, WatchCallback};
use crate::filesystem::{FileSystem, FileSystemInner};
use crate::tree::entry::{Directory, Entry};
use crate::tree::path::normalize_path;
use std::sync::atomic::Ordering;
use std::sync::{Arc, Weak};
use tokio::sync::mpsc;
use tracing::{debug, instrument, warn};

/// An indexed entry changed on the backend
#[derive(Debug, Clone)]
pub struct ChangeEvent {
    pub entry: Entry,
}

/// Raw notification as delivered by the backend callback
#[derive(Debug)]
pub(crate) struct WatchNotification {
    pub(crate) path: String,
    pub(crate) stat: Option<Stat>,
}

impl FileSystem {
    /// Register a fresh watch callback with the backend and start its reconciler.
    ///
    /// Replacing the callback drops the previous sender, which stops the previous
    /// reconciler once its queue is drained.
    pub(crate) fn install_watchers(&self) {
        let (tx, rx) = mpsc::unbounded_channel();
        let callback: WatchCallback = Arc::new(move |path: String, stat: Option<Stat>| {
            if tx.send(WatchNotification { path, stat }).is_err() {
                debug!("Watch notification dropped, reconciler stopped");
            }
        });
        self.inner.backend.init_watchers(callback);
        tokio::spawn(run_reconciler(Arc::downgrade(&self.inner), rx));
    }

    /// Apply one change notification to the index.
    ///
    /// Unknown paths are ignored. A file gets its cached stat refreshed; a
    /// directory is re-read and its children diffed against the previous listing.
    /// Every applied notification emits exactly one [`ChangeEvent`]. A
    /// notification overtaken by `set_project_root` or `close` is dropped.
    #[instrument(skip(self, stat))]
    pub async fn reconcile(&self, path: &str, stat: Option<Stat>) {
        if self.is_closed() {
            return;
        }
        let epoch = self.inner.scan_epoch.load(Ordering::SeqCst);
        let path = normalize_path(path);
        let Some(entry) = self.indexed_entry(&path) else {
            debug!(path = %path, "Notification for unindexed path ignored");
            return;
        };

        match &entry {
            Entry::File(file) => {
                if file.refresh_stat(stat) {
                    debug!(path = %path, "File stat refreshed");
                }
            }
            Entry::Directory(directory) => {
                if !self.reconcile_directory(directory, epoch).await {
                    debug!(path = %path, "Index reset during reconcile, notification dropped");
                    return;
                }
            }
        }

        // No subscribers is not an error
        let _ = self.inner.events.send(ChangeEvent { entry });
    }

    /// Returns false when the index was reset while re-reading.
    async fn reconcile_directory(&self, directory: &Directory, epoch: u64) -> bool {
        let old = directory.invalidate().unwrap_or_default();
        let listing = self.get_directory_contents(directory).await;
        if self.scan_superseded(epoch) {
            return false;
        }
        let new = match listing {
            Ok(children) => children,
            Err(e) => {
                warn!(
                    path = directory.full_path(),
                    error = %e,
                    "Failed to re-read changed directory"
                );
                return true;
            }
        };

        let mut removed = 0;
        for child in &old {
            if !new.iter().any(|c| c.ptr_eq(child)) {
                self.forget(child);
                removed += 1;
            }
        }

        let mut added = 0;
        for child in &new {
            if let Entry::Directory(sub) = child {
                if !old.iter().any(|c| c.ptr_eq(child)) {
                    self.scan_with_epoch(sub.full_path(), epoch).await;
                    added += 1;
                }
            }
        }

        debug!(
            path = directory.full_path(),
            children = new.len(),
            removed,
            added_directories = added,
            "Directory reconciled"
        );
        true
    }
}

async fn run_reconciler(
    fs: Weak<FileSystemInner>,
    mut notifications: mpsc::UnboundedReceiver<WatchNotification>,
) {
    while let Some(notification) = notifications.recv().await {
        let Some(inner) = fs.upgrade() else {
            break;
        };
        FileSystem { inner }
            .reconcile(&notification.path, notification.stat)
            .await;
    }
    debug!("Reconciler stopped");
}
