//! Property-based tests for path handling and index identity

mod index_identity;
mod path_normalization;
