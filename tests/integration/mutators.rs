//! Integration tests for dialogs, in-memory files and pass-through mutators

use crate::integration::test_utils::{file_paths, project_backend};
use canopy::backend::{OpenDialogOptions, SaveDialogOptions};
use canopy::{Backend, BackendError, Entry, FileSystem, FsError, MemoryBackend};
use std::sync::Arc;

/// Minimal backend relying on every default method
struct ReadOnlyBackend;

#[async_trait::async_trait]
impl Backend for ReadOnlyBackend {
    async fn exists(&self, _path: &str) -> bool {
        false
    }

    async fn stat(&self, path: &str) -> Result<canopy::Stat, BackendError> {
        Err(BackendError::not_found(path))
    }

    async fn readdir(&self, path: &str) -> Result<Vec<canopy::backend::ReaddirEntry>, BackendError> {
        Err(BackendError::not_found(path))
    }

    fn init_watchers(&self, _callback: canopy::backend::WatchCallback) {}
    fn watch_path(&self, _path: &str) {}
    fn unwatch_path(&self, _path: &str) {}
    fn unwatch_all(&self) {}
}

#[tokio::test]
async fn test_default_backend_methods_are_unsupported() {
    let fs = FileSystem::new(Arc::new(ReadOnlyBackend));
    let file = fs.get_file_for_path("/x.txt");

    match fs.write_file(&file, b"data").await {
        Err(FsError::Backend { code, .. }) => assert_eq!(code, BackendError::UNSUPPORTED),
        other => panic!("Unexpected result: {:?}", other),
    }
    assert!(fs.mkdir("/dir", None).await.is_err());
    assert!(fs
        .show_save_dialog(&SaveDialogOptions::default())
        .await
        .is_err());
    // Failed mutators leave the index alone
    assert!(fs.indexed_entry("/dir").is_none());
    assert!(fs.indexed_entry("/x.txt").is_some());
}

#[tokio::test]
async fn test_open_and_save_dialogs() {
    let backend = project_backend();
    let fs = FileSystem::new(backend.clone());
    backend.set_open_dialog_result(vec!["/proj/A.txt".to_string(), "/proj/B".to_string()]);
    backend.set_save_dialog_result(Some("/proj/new.txt".to_string()));

    let options = OpenDialogOptions {
        allow_multiple_selection: true,
        title: "Open".to_string(),
        ..OpenDialogOptions::default()
    };
    assert_eq!(
        fs.show_open_dialog(&options).await.unwrap(),
        vec!["/proj/A.txt", "/proj/B"]
    );

    let target = fs
        .show_save_dialog(&SaveDialogOptions::default())
        .await
        .unwrap()
        .unwrap();
    let untitled = fs.get_in_memory_file(&target);
    assert_eq!(untitled.name(), "new.txt");
    assert!(matches!(untitled.read(), Err(FsError::NotFound(_))));
    assert!(fs.indexed_entry("/proj/new.txt").is_none());
}

#[tokio::test]
async fn test_write_refreshes_cached_stat() {
    let backend = project_backend();
    let fs = FileSystem::new(backend.clone());
    fs.set_project_root("/proj").await.unwrap();
    let a = fs.get_file_for_path("/proj/A.txt");

    let stat = fs.write_file(&a, b"alpha, revised").await.unwrap();
    assert_eq!(stat.size, 14);
    assert!(stat.mtime > 100);
    assert_eq!(a.stat(), Some(stat));
    assert_eq!(fs.read_file(&a).await.unwrap(), b"alpha, revised".to_vec());
}

#[tokio::test]
async fn test_rename_directory_moves_index_entries() {
    let backend = project_backend();
    let fs = FileSystem::new(backend.clone());
    fs.set_project_root("/proj").await.unwrap();
    let b = fs.get_directory_for_path("/proj/B");

    let renamed = fs
        .rename(&Entry::Directory(b), "/proj/Renamed")
        .await
        .unwrap();
    assert!(renamed.is_directory());
    assert!(fs.indexed_entry("/proj/B").is_none());
    assert!(fs.indexed_entry("/proj/B/c.txt").is_none());
    assert_eq!(backend.metrics().unwatch_count("/proj/B"), 1);

    let children = fs
        .get_directory_contents(renamed.as_directory().unwrap())
        .await
        .unwrap();
    assert_eq!(children.len(), 2);
}

#[tokio::test]
async fn test_unlink_and_trash_forget_entries() {
    let backend = project_backend();
    let fs = FileSystem::new(backend.clone());
    fs.set_project_root("/proj").await.unwrap();

    let a = fs.indexed_entry("/proj/A.txt").unwrap();
    fs.unlink(&a).await.unwrap();
    let nested = fs.indexed_entry("/proj/B/nested").unwrap();
    fs.move_to_trash(&nested).await.unwrap();

    assert_eq!(file_paths(&fs), vec!["/proj/B/c.txt"]);
    assert!(!backend.exists("/proj/A.txt").await);
    assert!(!backend.exists("/proj/B/nested").await);

    let err = fs.unlink(&a).await.unwrap_err();
    assert_eq!(err, FsError::NotFound("/proj/A.txt".to_string()));
}

#[tokio::test]
async fn test_mkdir_and_chmod() {
    let backend = Arc::new(MemoryBackend::new());
    let fs = FileSystem::new(backend.clone());

    let dir = fs.mkdir("/work/", Some(0o755)).await.unwrap();
    assert_eq!(dir.full_path(), "/work");
    assert!(dir.ptr_eq(&fs.get_directory_for_path("/work")));

    let err = fs.mkdir("/work", None).await.unwrap_err();
    assert!(matches!(err, FsError::Backend { ref code, .. } if code == BackendError::ALREADY_EXISTS));

    let file = fs.get_file_for_path("/work/run.sh");
    fs.write_file(&file, b"#!/bin/sh").await.unwrap();
    fs.chmod(&Entry::File(file), 0o755).await.unwrap();

    let missing = Entry::File(fs.get_file_for_path("/work/missing"));
    assert!(matches!(
        fs.chmod(&missing, 0o600).await,
        Err(FsError::NotFound(_))
    ));
}
