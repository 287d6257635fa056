//! Path normalization utilities
//!
//! Backend paths are `/`-separated strings. Every path that enters the index goes
//! through [`normalize_path`] so that one location maps to one key.

use unicode_normalization::UnicodeNormalization;

/// Path of the backend root.
pub const ROOT: &str = "/";

/// Normalize a backend path string for use as an index key
///
/// This function:
/// 1. Normalizes Unicode to NFC
/// 2. Removes trailing slashes (except root)
/// 3. Maps the empty path to the backend root
pub fn normalize_path(path: &str) -> String {
    let mut result: String = path.nfc().collect();

    while result.len() > 1 && result.ends_with('/') {
        result.pop();
    }

    if result.is_empty() {
        result.push_str(ROOT);
    }

    result
}

/// Join a child name onto a directory path.
pub fn join(directory: &str, name: &str) -> String {
    if directory.ends_with('/') {
        format!("{}{}", directory, name)
    } else {
        format!("{}/{}", directory, name)
    }
}

/// Last path component (the whole path when it has no separator).
pub fn file_name(path: &str) -> &str {
    match path.rfind('/') {
        Some(idx) => &path[idx + 1..],
        None => path,
    }
}

/// Parent directory of a normalized path, or `None` for the root.
pub fn parent_path(path: &str) -> Option<&str> {
    if path == ROOT {
        return None;
    }
    match path.rfind('/') {
        Some(0) => Some(ROOT),
        Some(idx) => Some(&path[..idx]),
        None => None,
    }
}

/// Whether `path` lies strictly beneath `ancestor`.
///
/// Matches on component boundaries: `/a/bc` is not beneath `/a/b`.
pub fn is_descendant(path: &str, ancestor: &str) -> bool {
    if ancestor == ROOT {
        return path.len() > 1 && path.starts_with('/');
    }
    path.len() > ancestor.len()
        && path.starts_with(ancestor)
        && path.as_bytes()[ancestor.len()] == b'/'
}
