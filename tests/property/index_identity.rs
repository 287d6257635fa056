//! Property-based tests for one-handle-per-path identity

use canopy::{FileSystem, MemoryBackend};
use proptest::prelude::*;
use std::sync::Arc;

/// Any spelling of a directory path with trailing separators yields the same handle
#[test]
fn test_directory_handle_identity() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(
            &(prop::collection::vec("[a-z0-9]{1,6}", 0..5), 0usize..3),
            |(parts, trailing)| {
                let fs = FileSystem::new(Arc::new(MemoryBackend::new()));
                let bare = format!("/{}", parts.join("/"));
                let slashed = format!("{}{}", bare, "/".repeat(trailing));

                let first = fs.get_directory_for_path(&bare);
                let second = fs.get_directory_for_path(&slashed);
                prop_assert!(first.ptr_eq(&second));
                prop_assert_eq!(fs.index_len(), 1);
                Ok(())
            },
        )
        .unwrap();
}

/// Indexing a set of distinct files yields exactly that set from the file list
#[test]
fn test_file_list_matches_indexed_paths() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(
            &prop::collection::btree_set("/[a-z]{1,4}(/[a-z]{1,4}){0,2}", 0..20),
            |paths| {
                let fs = FileSystem::new(Arc::new(MemoryBackend::new()));
                for path in &paths {
                    let file = fs.get_file_for_path(path);
                    prop_assert!(file.ptr_eq(&fs.get_file_for_path(path)));
                }

                let mut listed: Vec<String> = fs
                    .get_file_list(None)
                    .iter()
                    .map(|f| f.full_path().to_string())
                    .collect();
                listed.sort();
                let expected: Vec<String> = paths.into_iter().collect();
                prop_assert_eq!(listed, expected);
                Ok(())
            },
        )
        .unwrap();
}
