// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Unified logging initialization
//!
//! Installs a console layer and, with the `file-logging` feature, JSON log
//! files in a timestamped run folder:
//! ```text
//! ./logs/
//!   └── run_20250101_120000/
//!       ├── neurograph-engine.log
//!       ├── neurograph-bundle.log
//!       └── neurograph.log (combined)
//! ```

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer, Registry};

use crate::cli::CrateDebugFlags;

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Console output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Compact,
    Json,
}

impl FromStr for LogFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "pretty" => Ok(LogFormat::Pretty),
            "compact" => Ok(LogFormat::Compact),
            "json" => Ok(LogFormat::Json),
            other => bail!("Unknown log format '{}'", other),
        }
    }
}

/// Settings for [`init_logging`]
#[derive(Debug, Clone)]
pub struct LoggingOptions {
    /// Base level for everything not enabled through debug flags
    pub level: String,
    pub format: LogFormat,
    /// Base directory for log files; `None` disables file output
    pub log_dir: Option<PathBuf>,
    /// Keep N most recent run folders
    pub retention_runs: usize,
}

impl Default for LoggingOptions {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
            log_dir: None,
            retention_runs: 10,
        }
    }
}

/// Keeps file writers alive; logs are flushed when dropped
pub struct LoggingGuard {
    #[cfg(feature = "file-logging")]
    _file_guards: Vec<tracing_appender::non_blocking::WorkerGuard>,
    log_dir: Option<PathBuf>,
}

impl LoggingGuard {
    /// Run folder receiving log files, if file logging is active
    pub fn log_dir(&self) -> Option<&Path> {
        self.log_dir.as_deref()
    }
}

/// Combine debug flags with a base level into an `EnvFilter`
pub fn build_filter(debug_flags: &CrateDebugFlags, level: &str) -> Result<EnvFilter> {
    let directives = debug_flags.to_filter_string_with_base(level);
    EnvFilter::try_new(&directives)
        .with_context(|| format!("Invalid log filter '{}'", directives))
}

fn console_layer(format: LogFormat, filter: EnvFilter) -> BoxedLayer {
    match format {
        LogFormat::Pretty => fmt::layer().with_target(true).with_filter(filter).boxed(),
        LogFormat::Compact => fmt::layer()
            .compact()
            .with_target(false)
            .with_filter(filter)
            .boxed(),
        LogFormat::Json => fmt::layer().json().with_filter(filter).boxed(),
    }
}

/// Install the global subscriber
///
/// # Errors
/// Fails if the filter is invalid, the log directory cannot be created, or a
/// global subscriber is already installed.
pub fn init_logging(debug_flags: &CrateDebugFlags, options: &LoggingOptions) -> Result<LoggingGuard> {
    let mut layers: Vec<BoxedLayer> = vec![console_layer(
        options.format,
        build_filter(debug_flags, &options.level)?,
    )];

    #[cfg(feature = "file-logging")]
    let guard = match &options.log_dir {
        Some(base) => {
            let (mut file_layers, file_guards, run_folder) =
                file_layers(debug_flags, &options.level, base, options.retention_runs)?;
            layers.append(&mut file_layers);
            LoggingGuard {
                _file_guards: file_guards,
                log_dir: Some(run_folder),
            }
        }
        None => LoggingGuard {
            _file_guards: Vec::new(),
            log_dir: None,
        },
    };

    #[cfg(not(feature = "file-logging"))]
    let guard = LoggingGuard { log_dir: None };

    Registry::default()
        .with(layers)
        .try_init()
        .context("A global tracing subscriber is already installed")?;

    if cfg!(not(feature = "file-logging")) && options.log_dir.is_some() {
        tracing::warn!("File logging requested but the file-logging feature is disabled");
    }

    Ok(guard)
}

/// Initialize console logging at `info` with debug flags from the environment
pub fn init_logging_default() -> Result<LoggingGuard> {
    init_logging(&crate::cli::parse_debug_flags(), &LoggingOptions::default())
}

#[cfg(feature = "file-logging")]
fn file_layers(
    debug_flags: &CrateDebugFlags,
    level: &str,
    base_log_dir: &Path,
    retention_runs: usize,
) -> Result<(
    Vec<BoxedLayer>,
    Vec<tracing_appender::non_blocking::WorkerGuard>,
    PathBuf,
)> {
    use tracing_appender::rolling;

    let timestamp = chrono::Utc::now().format("%Y%m%d_%H%M%S");
    let run_folder = base_log_dir.join(format!("run_{}", timestamp));
    std::fs::create_dir_all(&run_folder)
        .with_context(|| format!("Failed to create log directory: {}", run_folder.display()))?;

    cleanup_old_runs(base_log_dir, retention_runs)?;

    let mut layers: Vec<BoxedLayer> = Vec::new();
    let mut guards = Vec::new();

    // One file per member crate; the umbrella target prefix-matches all of them
    for crate_name in crate::KNOWN_CRATES.iter().filter(|c| **c != "neurograph") {
        let appender = rolling::daily(&run_folder, format!("{}.log", crate_name));
        let (writer, guard) = tracing_appender::non_blocking(appender);
        guards.push(guard);

        let filter = EnvFilter::try_new(format!("{}=debug", crate_name.replace('-', "_")))?;
        layers.push(
            fmt::layer()
                .with_writer(writer)
                .with_target(true)
                .with_file(true)
                .with_line_number(true)
                .json()
                .with_filter(filter)
                .boxed(),
        );
    }

    let combined = rolling::daily(&run_folder, "neurograph.log");
    let (writer, guard) = tracing_appender::non_blocking(combined);
    guards.push(guard);
    layers.push(
        fmt::layer()
            .with_writer(writer)
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .json()
            .with_filter(build_filter(debug_flags, level)?)
            .boxed(),
    );

    Ok((layers, guards, run_folder))
}

/// Remove all but the `keep` most recent `run_*` folders
#[cfg(feature = "file-logging")]
fn cleanup_old_runs(base_log_dir: &Path, keep: usize) -> Result<()> {
    if !base_log_dir.exists() {
        return Ok(());
    }

    let mut runs: Vec<(PathBuf, chrono::NaiveDateTime)> = Vec::new();
    for entry in std::fs::read_dir(base_log_dir)? {
        let path = entry?.path();
        if !path.is_dir() {
            continue;
        }
        let stamp = path
            .file_name()
            .and_then(|n| n.to_str())
            .and_then(|n| n.strip_prefix("run_"))
            .and_then(|s| chrono::NaiveDateTime::parse_from_str(s, "%Y%m%d_%H%M%S").ok());
        if let Some(stamp) = stamp {
            runs.push((path, stamp));
        }
    }

    // Oldest first
    runs.sort_by_key(|(_, stamp)| *stamp);
    let excess = runs.len().saturating_sub(keep);
    for (path, _) in runs.iter().take(excess) {
        if let Err(e) = std::fs::remove_dir_all(path) {
            eprintln!(
                "Warning: Failed to remove old log directory {}: {}",
                path.display(),
                e
            );
        }
    }

    Ok(())
}
