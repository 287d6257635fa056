//! Property-based tests for path normalization

use canopy::tree::path::{is_descendant, join, normalize_path, parent_path};
use proptest::prelude::*;

fn components() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec("[a-zA-Z0-9._-]{1,8}", 0..6)
}

fn absolute(components: &[String]) -> String {
    format!("/{}", components.join("/"))
}

/// Normalizing twice changes nothing
#[test]
fn test_normalization_is_idempotent() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(&(components(), 0usize..4), |(parts, trailing)| {
            let raw = format!("{}{}", absolute(&parts), "/".repeat(trailing));
            let once = normalize_path(&raw);
            let twice = normalize_path(&once);
            prop_assert_eq!(&once, &twice);
            prop_assert!(once == "/" || !once.ends_with('/'));
            Ok(())
        })
        .unwrap();
}

/// Trailing separators never change the normalized path
#[test]
fn test_trailing_separators_are_dropped() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(&(components(), 1usize..4), |(parts, trailing)| {
            let bare = absolute(&parts);
            let slashed = format!("{}{}", bare, "/".repeat(trailing));
            prop_assert_eq!(normalize_path(&bare), normalize_path(&slashed));
            Ok(())
        })
        .unwrap();
}

/// A joined child is a descendant of its parent, and its parent path round-trips
#[test]
fn test_join_and_parent_agree() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(&(components(), "[a-z0-9]{1,8}"), |(parts, name)| {
            let directory = normalize_path(&absolute(&parts));
            let child = join(&directory, &name);

            prop_assert!(is_descendant(&child, &directory));
            prop_assert_eq!(parent_path(&child), Some(directory.as_str()));
            Ok(())
        })
        .unwrap();
}

/// Sharing a name prefix does not make a sibling a descendant
#[test]
fn test_sibling_with_shared_prefix_is_not_descendant() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(&(prop::collection::vec("[a-z]{1,8}", 1..5), "[a-z]{1,4}"), |(parts, suffix)| {
            let directory = absolute(&parts);
            let sibling = format!("{}{}", directory, suffix);
            prop_assert!(!is_descendant(&sibling, &directory));
            Ok(())
        })
        .unwrap();
}
