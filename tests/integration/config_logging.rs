//! Integration tests for configuration driving the file system, and logging setup

use canopy::config::ConfigLoader;
use canopy::logging::{init_logging, LoggingConfig};
use canopy::{FileSystem, MemoryBackend};
use std::sync::Arc;
use tempfile::TempDir;

#[tokio::test]
async fn test_config_file_drives_index_settings() {
    let temp_dir = TempDir::new().unwrap();
    let config_file = temp_dir.path().join("canopy.toml");
    std::fs::write(
        &config_file,
        "[index]\nextra_exclusions = [\"node_modules\", \"*.log\"]\nmax_scan_depth = 1\n",
    )
    .unwrap();
    let config = ConfigLoader::load_from_file(&config_file).unwrap();

    let backend = Arc::new(MemoryBackend::new());
    backend.add_file("/app/index.js", b"", 1);
    backend.add_file("/app/debug.log", b"", 1);
    backend.add_file("/app/node_modules/dep/index.js", b"", 1);
    backend.add_file("/app/src/lib/util.js", b"", 1);
    let fs = FileSystem::with_config(backend.clone(), &config.index);

    let report = fs.set_project_root("/app").await.unwrap();
    assert_eq!(report.directories, 2);
    assert!(fs.indexed_entry("/app/index.js").is_some());
    assert!(fs.indexed_entry("/app/debug.log").is_none());
    assert!(fs.indexed_entry("/app/node_modules").is_none());
    assert!(fs.indexed_entry("/app/src/lib").is_some());
    assert!(fs.indexed_entry("/app/src/lib/util.js").is_none());
}

#[test]
fn test_init_logging_twice_reports_error() {
    let config = LoggingConfig {
        level: "warn".to_string(),
        output: "stderr".to_string(),
        ..LoggingConfig::default()
    };

    // The first call may race other tests in this binary; the second never succeeds
    let _ = init_logging(Some(&config));
    let second = init_logging(Some(&config));
    assert!(matches!(second, Err(canopy::FsError::ConfigError(_))));
}
