//! Exclusion rules for scan and directory listings.
//!
//! Names matched here are never indexed nor surfaced in listings. The built-in
//! set covers VCS metadata and OS housekeeping files; configuration can add more
//! (see [`crate::config::IndexConfig::extra_exclusions`]).
//!
//! A pattern is either an exact name (`.git`) or a `*` followed by a suffix
//! (`*.pyc`). Patterns match the last path component only.

use crate::tree::path;
use std::collections::HashSet;

/// Built-in exclusions.
pub const BUILTIN_EXCLUSIONS: &[&str] = &[
    ".git",
    ".gitignore",
    ".gitmodules",
    ".gitattributes",
    ".svn",
    ".hg",
    ".hgignore",
    ".hgtags",
    "CVS",
    ".cvsignore",
    ".DS_Store",
    "Thumbs.db",
    "*.pyc",
];

/// Compiled exclusion patterns
#[derive(Debug, Clone)]
pub struct ExclusionFilter {
    names: HashSet<String>,
    suffixes: Vec<String>,
}

impl Default for ExclusionFilter {
    fn default() -> Self {
        Self::builtin()
    }
}

impl ExclusionFilter {
    /// Filter with only the built-in exclusions.
    pub fn builtin() -> Self {
        Self::with_extra(&[])
    }

    /// Built-in exclusions plus `extra` patterns.
    pub fn with_extra(extra: &[String]) -> Self {
        let mut filter = Self {
            names: HashSet::new(),
            suffixes: Vec::new(),
        };
        for pattern in BUILTIN_EXCLUSIONS {
            filter.add_pattern(pattern);
        }
        for pattern in extra {
            filter.add_pattern(pattern);
        }
        filter
    }

    fn add_pattern(&mut self, pattern: &str) {
        match pattern.strip_prefix('*') {
            Some(suffix) => self.suffixes.push(suffix.to_string()),
            None => {
                self.names.insert(pattern.to_string());
            }
        }
    }

    /// Returns false for paths whose name is excluded.
    pub fn should_show(&self, path: &str) -> bool {
        let name = path::file_name(path);
        if self.names.contains(name) {
            return false;
        }
        !self.suffixes.iter().any(|suffix| name.ends_with(suffix.as_str()))
    }
}

/// Check a pattern for use as an exclusion.
pub fn validate_pattern(pattern: &str) -> Result<(), String> {
    if pattern.is_empty() || pattern == "*" {
        return Err(format!("Exclusion pattern '{}' would hide everything", pattern));
    }
    if pattern.contains('/') {
        return Err(format!(
            "Exclusion pattern '{}' must be a name, not a path",
            pattern
        ));
    }
    if pattern.chars().skip(1).any(|c| c == '*') {
        return Err(format!(
            "Exclusion pattern '{}' may only use '*' as a leading wildcard",
            pattern
        ));
    }
    Ok(())
}
