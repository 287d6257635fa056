//! Integration tests for switching the project root and closing

use crate::integration::test_utils::{file_paths, project_backend};
use canopy::{FileSystem, MemoryBackend};
use std::sync::Arc;
use std::time::Duration;

fn two_roots() -> Arc<MemoryBackend> {
    let backend = project_backend();
    backend.add_file("/other/z.txt", b"zeta", 100);
    backend.add_file("/other/lib/y.txt", b"upsilon", 100);
    backend
}

/// Test that the first scan indexes and watches the whole tree
#[tokio::test]
async fn test_set_project_root_scans_tree() {
    let backend = project_backend();
    let fs = FileSystem::new(backend.clone());

    let report = fs.set_project_root("/proj/").await.unwrap();
    assert_eq!(report.directories, 3);
    assert_eq!(report.files, 3);
    assert_eq!(
        file_paths(&fs),
        vec!["/proj/A.txt", "/proj/B/c.txt", "/proj/B/nested/d.txt"]
    );

    let mut watched = backend.watched_paths();
    watched.sort();
    assert_eq!(watched, vec!["/proj", "/proj/B", "/proj/B/nested"]);
    assert_eq!(backend.metrics().unwatch_all_calls, 1);
}

/// Test that switching roots leaves nothing from the old root behind
#[tokio::test]
async fn test_switching_root_forgets_old_root() {
    let backend = two_roots();
    let fs = FileSystem::new(backend.clone());

    fs.set_project_root("/proj").await.unwrap();
    fs.set_project_root("/other").await.unwrap();

    assert_eq!(file_paths(&fs), vec!["/other/lib/y.txt", "/other/z.txt"]);
    assert!(fs.indexed_entry("/proj").is_none());
    assert!(backend
        .watched_paths()
        .iter()
        .all(|path| path.starts_with("/other")));
    assert_eq!(backend.metrics().unwatch_all_calls, 2);
}

/// Test that a scan overtaken by a newer root stops without indexing
#[tokio::test]
async fn test_overtaken_scan_is_abandoned() {
    let backend = Arc::new(MemoryBackend::with_latency(Duration::from_millis(20)));
    backend.add_file("/proj/A.txt", b"alpha", 100);
    backend.add_file("/other/z.txt", b"zeta", 100);
    let fs = FileSystem::new(backend.clone());

    let first = fs.set_project_root("/proj");
    let second = fs.set_project_root("/other");

    let abandoned = first.await.unwrap();
    let report = second.await.unwrap();
    assert_eq!(abandoned.files, 0);
    assert_eq!(report.files, 1);
    assert_eq!(file_paths(&fs), vec!["/other/z.txt"]);
}

/// Test that a directory re-read overtaken by a new root indexes nothing from the old root
#[tokio::test]
async fn test_reconcile_overtaken_by_root_switch() {
    let backend = Arc::new(MemoryBackend::with_latency(Duration::from_millis(30)));
    backend.add_file("/old/a.txt", b"alpha", 100);
    backend.add_file("/new/n.txt", b"nu", 100);
    let fs = FileSystem::new(backend.clone());
    fs.set_project_root("/old").await.unwrap();

    backend.add_file("/old/added/x.txt", b"chi", 200);
    let mut events = fs.subscribe();

    let reconcile = {
        let fs = fs.clone();
        tokio::spawn(async move { fs.reconcile("/old", None).await })
    };
    tokio::time::sleep(Duration::from_millis(10)).await;
    fs.set_project_root("/new").await.unwrap();
    reconcile.await.unwrap();

    assert_eq!(file_paths(&fs), vec!["/new/n.txt"]);
    assert!(fs.indexed_entry("/old").is_none());
    assert!(fs.indexed_entry("/old/added").is_none());
    assert!(fs.indexed_entry("/old/added/x.txt").is_none());

    let mut watched = backend.watched_paths();
    watched.sort();
    assert_eq!(watched, vec!["/new"]);
    assert!(events.try_recv().is_err());
}

/// Test that close drops watches, clears the index and ignores notifications
#[tokio::test]
async fn test_close() {
    let backend = project_backend();
    let fs = FileSystem::new(backend.clone());
    fs.set_project_root("/proj").await.unwrap();
    let mut events = fs.subscribe();

    fs.close();
    assert!(fs.is_closed());
    assert_eq!(fs.index_len(), 0);
    assert!(backend.watched_paths().is_empty());

    backend.reset_metrics();
    fs.reconcile("/proj", None).await;
    assert!(events.try_recv().is_err());
    assert_eq!(backend.metrics().total_readdir_calls(), 0);

    // A new root reopens the file system
    fs.set_project_root("/proj").await.unwrap();
    assert!(!fs.is_closed());
    assert_eq!(file_paths(&fs).len(), 3);
}
