//! File tree model
//!
//! Handles for files and directories, the flat path index that owns them, and
//! the path normalization rules used to key it.

pub mod entry;
pub mod index;
pub mod path;
