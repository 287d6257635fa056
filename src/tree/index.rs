//! Path index
//!
//! Flat map from normalized path to the single handle for that path.

use crate::tree::entry::{Entry, File};
use crate::tree::path;
use std::collections::HashMap;

/// Index: path -> Entry
#[derive(Debug, Default)]
pub struct PathIndex {
    entries: HashMap<String, Entry>,
}

impl PathIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_entry(&self, path: &str) -> Option<Entry> {
        self.entries.get(path).cloned()
    }

    /// Insert an entry, replacing whatever was indexed at its path.
    pub fn add_entry(&mut self, entry: Entry) {
        self.entries.insert(entry.full_path().to_string(), entry);
    }

    /// Remove an entry by path.
    ///
    /// Only removes when the indexed handle is this very entry, so a stale
    /// handle cannot evict a newer entry that replaced it. Returns whether
    /// anything was removed.
    pub fn remove_entry(&mut self, entry: &Entry) -> bool {
        match self.entries.get(entry.full_path()) {
            Some(indexed) if indexed.ptr_eq(entry) => {
                self.entries.remove(entry.full_path());
                true
            }
            _ => false,
        }
    }

    /// All indexed files, optionally filtered. Order is unspecified.
    pub fn get_all_files(&self, filter: Option<&dyn Fn(&Entry) -> bool>) -> Vec<File> {
        self.entries
            .values()
            .filter_map(|entry| match entry {
                Entry::File(file) if filter.map_or(true, |keep| keep(entry)) => {
                    Some(file.clone())
                }
                _ => None,
            })
            .collect()
    }

    /// All entries (files and directories) strictly beneath a directory path.
    pub fn entries_under(&self, directory: &str) -> Vec<Entry> {
        self.entries
            .iter()
            .filter(|(key, _)| path::is_descendant(key, directory))
            .map(|(_, entry)| entry.clone())
            .collect()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
