//! Integration tests for the canopy file tree

mod config_logging;
mod mutators;
mod project_root;
