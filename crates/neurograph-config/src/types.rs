// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Configuration type definitions
//!
//! Each struct maps to a section of `neurograph.toml`. Every field has a
//! default, so an empty file is a valid configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct NeurographConfig {
    pub network: NetworkConfig,
    pub bundle: BundleConfig,
    pub logging: LoggingConfig,
}

/// Network execution settings
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Collect per-region compute timings
    pub profiling: bool,
    /// Emit a progress log line every N iterations (0 = never)
    pub log_interval: u64,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            profiling: false,
            log_interval: 0,
        }
    }
}

/// Bundle persistence settings
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct BundleConfig {
    /// LZ4-compress bundle files
    pub compression: bool,
    /// Directory relative bundle names are resolved against
    pub directory: PathBuf,
}

impl Default for BundleConfig {
    fn default() -> Self {
        Self {
            compression: true,
            directory: PathBuf::from("bundles"),
        }
    }
}

impl BundleConfig {
    /// Resolve a bundle file name against the configured directory
    pub fn bundle_path(&self, name: &str) -> PathBuf {
        self.directory.join(name)
    }
}

/// Logging settings
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// trace, debug, info, warn or error
    pub level: String,
    /// pretty, compact or json
    pub format: String,
    pub file_logging: bool,
    pub log_dir: PathBuf,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
            file_logging: false,
            log_dir: PathBuf::from("logs"),
        }
    }
}
