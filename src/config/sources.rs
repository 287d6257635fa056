//! Config sources: global file, workspace file, environment.

use config::builder::DefaultState;
use config::{ConfigBuilder, Environment, File};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Path to the global config file.
/// Uses `$XDG_CONFIG_HOME/canopy/config.toml`, otherwise `~/.config/canopy/config.toml`.
pub fn global_config_path() -> Option<PathBuf> {
    let base = match std::env::var("XDG_CONFIG_HOME") {
        Ok(xdg) if !xdg.is_empty() => PathBuf::from(xdg),
        _ => PathBuf::from(std::env::var("HOME").ok()?).join(".config"),
    };
    Some(base.join("canopy").join("config.toml"))
}

/// Path to the workspace config file: `<root>/.canopy/config.toml`.
pub fn workspace_config_path(workspace_root: &Path) -> PathBuf {
    workspace_root.join(".canopy").join("config.toml")
}

/// Add the global config file to the builder if it exists.
pub fn add_global_file(builder: ConfigBuilder<DefaultState>) -> ConfigBuilder<DefaultState> {
    match global_config_path() {
        Some(path) if path.exists() => {
            debug!(config_path = %path.display(), "Loading global configuration");
            builder.add_source(File::from(path).required(false))
        }
        _ => builder,
    }
}

/// Add the workspace config file to the builder if it exists.
pub fn add_workspace_file(
    builder: ConfigBuilder<DefaultState>,
    workspace_root: &Path,
) -> ConfigBuilder<DefaultState> {
    let path = workspace_config_path(workspace_root);
    if path.exists() {
        debug!(config_path = %path.display(), "Loading workspace configuration");
        builder.add_source(File::from(path).required(false))
    } else {
        builder
    }
}

/// Add `CANOPY__SECTION__KEY` environment overrides.
pub fn add_environment(builder: ConfigBuilder<DefaultState>) -> ConfigBuilder<DefaultState> {
    builder.add_source(
        Environment::with_prefix("CANOPY")
            .prefix_separator("__")
            .separator("__")
            .try_parsing(true),
    )
}
