//! Recursive directory scanner
//!
//! Walks a subtree depth-first through [`FileSystem::get_directory_contents`],
//! indexing every visible entry and registering a backend watch on each
//! directory it lists. Listing failures never abort a scan: the directory is
//! treated as empty and recorded in the [`ScanReport`].
//!
//! Symlink cycles are not detected. Backends that can produce them should be
//! paired with [`crate::config::IndexConfig::max_scan_depth`].

use crate::filesystem::FileSystem;
use crate::tree::entry::Entry;
use crate::tree::path::normalize_path;
use futures::future::BoxFuture;
use futures::FutureExt;
use std::sync::atomic::Ordering;
use std::time::Instant;
use tracing::{debug, info, instrument, warn};

/// Summary of a finished scan
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanReport {
    /// Directories visited, the scan root included
    pub directories: usize,
    /// Files indexed
    pub files: usize,
    /// Directories whose listing failed
    pub failed: Vec<String>,
}

impl FileSystem {
    /// Scan the subtree rooted at `path`
    pub async fn scan(&self, path: &str) -> ScanReport {
        let epoch = self.inner.scan_epoch.load(Ordering::SeqCst);
        self.scan_with_epoch(&normalize_path(path), epoch).await
    }

    #[instrument(skip(self, epoch))]
    pub(crate) async fn scan_with_epoch(&self, root: &str, epoch: u64) -> ScanReport {
        let start = Instant::now();
        let mut report = ScanReport::default();
        self.scan_directory(root.to_string(), 0, epoch, &mut report)
            .await;

        if self.scan_superseded(epoch) {
            debug!(root, "Scan abandoned after index reset");
        }
        info!(
            root,
            directories = report.directories,
            files = report.files,
            failed = report.failed.len(),
            duration_ms = start.elapsed().as_millis(),
            "Scan completed"
        );
        report
    }

    pub(crate) fn scan_superseded(&self, epoch: u64) -> bool {
        self.inner.scan_epoch.load(Ordering::SeqCst) != epoch
    }

    fn scan_directory<'a>(
        &'a self,
        path: String,
        depth: usize,
        epoch: u64,
        report: &'a mut ScanReport,
    ) -> BoxFuture<'a, ()> {
        async move {
            if self.scan_superseded(epoch) {
                return;
            }
            let directory = self.get_directory_for_path(&path);
            report.directories += 1;

            let children = match self.get_directory_contents(&directory).await {
                Ok(children) => children,
                Err(e) => {
                    warn!(path = %path, error = %e, "Failed to list directory during scan");
                    report.failed.push(path.clone());
                    Vec::new()
                }
            };

            if self.scan_superseded(epoch) {
                return;
            }
            self.inner.backend.watch_path(&path);

            let descend = self.inner.max_scan_depth.map_or(true, |max| depth < max);
            for child in children {
                match child {
                    Entry::File(_) => report.files += 1,
                    Entry::Directory(sub) if descend => {
                        self.scan_directory(sub.full_path().to_string(), depth + 1, epoch, report)
                            .await;
                    }
                    Entry::Directory(sub) => {
                        debug!(path = sub.full_path(), depth, "Maximum scan depth reached");
                    }
                }
            }
        }
        .boxed()
    }
}
