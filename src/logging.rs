//! Logging System
//!
//! Structured logging using the `tracing` crate. The library itself only emits
//! events; binaries and tests that embed it call [`init_logging`] once to install
//! a subscriber with the configured level, format and destination.

use crate::error::FsError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing_subscriber::fmt::time::ChronoUtc;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error, off
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format: json, text (default: text)
    #[serde(default = "default_format")]
    pub format: String,

    /// Output destination: stdout, stderr, file
    #[serde(default = "default_output")]
    pub output: String,

    /// Log file path (when output is "file")
    #[serde(default = "default_log_file")]
    pub file: PathBuf,

    /// Enable colored output (text format only, stdout/stderr only)
    #[serde(default = "default_true")]
    pub color: bool,

    /// Module-specific log levels
    #[serde(default)]
    pub modules: HashMap<String, String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_format() -> String {
    "text".to_string()
}

fn default_output() -> String {
    "stdout".to_string()
}

fn default_log_file() -> PathBuf {
    PathBuf::from(".canopy/canopy.log")
}

fn default_true() -> bool {
    true
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_format(),
            output: default_output(),
            file: default_log_file(),
            color: default_true(),
            modules: HashMap::new(),
        }
    }
}

const LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error", "off"];

impl LoggingConfig {
    pub fn validate(&self) -> Result<(), String> {
        if !LEVELS.contains(&self.level.as_str()) {
            return Err(format!("Invalid log level: {}", self.level));
        }
        parse_format(&self.format)?;
        parse_output(&self.output)?;
        for (module, level) in &self.modules {
            if !LEVELS.contains(&level.as_str()) {
                return Err(format!("Invalid log level for {}: {}", module, level));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LogOutput {
    Stdout,
    Stderr,
    File,
}

/// Initialize the logging system
///
/// Priority order (highest to lowest):
/// 1. Environment variables (CANOPY_LOG, CANOPY_LOG_FORMAT, CANOPY_LOG_OUTPUT, CANOPY_LOG_MODULES)
/// 2. Configuration
/// 3. Defaults
///
/// Fails with a configuration error if a global subscriber is already installed.
pub fn init_logging(config: Option<&LoggingConfig>) -> Result<(), FsError> {
    let filter = build_env_filter(config)?;
    let format = determine_format(config)?;
    let output = determine_output(config)?;
    let use_color = config.map(|c| c.color).unwrap_or(true) && output != LogOutput::File;

    let writer = match output {
        LogOutput::Stdout => BoxMakeWriter::new(std::io::stdout),
        LogOutput::Stderr => BoxMakeWriter::new(std::io::stderr),
        LogOutput::File => BoxMakeWriter::new(Mutex::new(open_log_file(config)?)),
    };

    let registry = Registry::default().with(filter);
    let installed = match format {
        LogFormat::Json => registry
            .with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_timer(ChronoUtc::rfc_3339())
                    .with_writer(writer),
            )
            .try_init(),
        LogFormat::Text => registry
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_timer(ChronoUtc::rfc_3339())
                    .with_ansi(use_color)
                    .with_writer(writer),
            )
            .try_init(),
    };

    installed.map_err(|e| FsError::ConfigError(format!("Failed to install log subscriber: {}", e)))
}

fn open_log_file(config: Option<&LoggingConfig>) -> Result<std::fs::File, FsError> {
    let log_file = config
        .map(|c| c.file.clone())
        .unwrap_or_else(default_log_file);

    if let Some(parent) = log_file.parent() {
        std::fs::create_dir_all(parent).map_err(|e| {
            FsError::ConfigError(format!("Failed to create log directory: {}", e))
        })?;
    }
    std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_file)
        .map_err(|e| {
            FsError::ConfigError(format!("Failed to open log file {:?}: {}", log_file, e))
        })
}

/// Build environment filter from config or environment variables
fn build_env_filter(config: Option<&LoggingConfig>) -> Result<EnvFilter, FsError> {
    if let Ok(filter) = EnvFilter::try_from_env("CANOPY_LOG") {
        return Ok(filter);
    }

    let level = config.map(|c| c.level.as_str()).unwrap_or("info");
    if level == "off" {
        return Ok(EnvFilter::new("off"));
    }

    let mut filter = EnvFilter::new(level);

    if let Some(config) = config {
        for (module, module_level) in &config.modules {
            let directive = format!("{}={}", module, module_level);
            filter = filter.add_directive(
                directive
                    .parse()
                    .map_err(|e| FsError::ConfigError(format!("Invalid log directive: {}", e)))?,
            );
        }
    }

    if let Ok(modules_str) = std::env::var("CANOPY_LOG_MODULES") {
        for module_spec in modules_str.split(',') {
            let parts: Vec<&str> = module_spec.split('=').collect();
            if parts.len() == 2 {
                let directive = format!("{}={}", parts[0].trim(), parts[1].trim());
                filter = filter.add_directive(directive.parse().map_err(|e| {
                    FsError::ConfigError(format!("Invalid log directive from env: {}", e))
                })?);
            }
        }
    }

    Ok(filter)
}

fn determine_format(config: Option<&LoggingConfig>) -> Result<LogFormat, FsError> {
    if let Ok(format) = std::env::var("CANOPY_LOG_FORMAT") {
        if let Ok(parsed) = parse_format(&format) {
            return Ok(parsed);
        }
    }

    parse_format(config.map(|c| c.format.as_str()).unwrap_or("text")).map_err(FsError::ConfigError)
}

fn determine_output(config: Option<&LoggingConfig>) -> Result<LogOutput, FsError> {
    if let Ok(output) = std::env::var("CANOPY_LOG_OUTPUT") {
        return parse_output(&output).map_err(FsError::ConfigError);
    }

    parse_output(config.map(|c| c.output.as_str()).unwrap_or("stdout")).map_err(FsError::ConfigError)
}

fn parse_format(format: &str) -> Result<LogFormat, String> {
    match format {
        "text" => Ok(LogFormat::Text),
        "json" => Ok(LogFormat::Json),
        _ => Err(format!(
            "Invalid log format: {} (must be 'json' or 'text')",
            format
        )),
    }
}

fn parse_output(output: &str) -> Result<LogOutput, String> {
    match output {
        "stdout" => Ok(LogOutput::Stdout),
        "stderr" => Ok(LogOutput::Stderr),
        "file" => Ok(LogOutput::File),
        _ => Err(format!(
            "Invalid log output: {} (must be 'stdout', 'stderr' or 'file')",
            output
        )),
    }
}
