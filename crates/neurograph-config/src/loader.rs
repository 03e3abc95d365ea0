// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Configuration file loading with override support
//!
//! Three tiers, later ones winning:
//! 1. TOML file (base defaults)
//! 2. Environment variables (runtime overrides)
//! 3. CLI arguments (explicit user overrides)

use crate::{ConfigError, ConfigResult, NeurographConfig};
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Environment variable naming an explicit config file
pub const CONFIG_PATH_ENV: &str = "NEUROGRAPH_CONFIG_PATH";

/// Config file name searched for when no path is given
pub const CONFIG_FILE_NAME: &str = "neurograph.toml";

/// Find the neurograph configuration file
///
/// Search order:
/// 1. `NEUROGRAPH_CONFIG_PATH` environment variable
/// 2. Current working directory: `./neurograph.toml`
/// 3. Up to 5 parent directories
///
/// # Errors
///
/// Returns `ConfigError::FileNotFound` if no config file is found in any location
pub fn find_config_file() -> ConfigResult<PathBuf> {
    if let Ok(env_path) = env::var(CONFIG_PATH_ENV) {
        let path = PathBuf::from(env_path);
        if path.exists() {
            return Ok(path);
        }
        return Err(ConfigError::FileNotFound(format!(
            "Config file specified by {} not found: {}",
            CONFIG_PATH_ENV,
            path.display()
        )));
    }

    let mut search_paths = Vec::new();
    if let Ok(cwd) = env::current_dir() {
        search_paths.push(cwd.join(CONFIG_FILE_NAME));
        let mut current = cwd.as_path();
        for _ in 0..5 {
            match current.parent() {
                Some(parent) => {
                    search_paths.push(parent.join(CONFIG_FILE_NAME));
                    current = parent;
                }
                None => break,
            }
        }
    }

    if let Some(found) = search_paths.iter().find(|p| p.exists()) {
        return Ok(found.clone());
    }

    let search_list = search_paths
        .iter()
        .map(|p| format!("  - {}", p.display()))
        .collect::<Vec<_>>()
        .join("\n");

    Err(ConfigError::FileNotFound(format!(
        "'{}' not found in any of these locations:\n{}\n\nSet {} to specify a custom location.",
        CONFIG_FILE_NAME, search_list, CONFIG_PATH_ENV
    )))
}

/// Load configuration from TOML file
///
/// # Arguments
///
/// * `config_path` - Optional path to config file. If `None`, will search for config file.
/// * `cli_args` - Optional CLI argument overrides
///
/// # Errors
///
/// Returns error if config file is not found or contains invalid TOML
pub fn load_config(
    config_path: Option<&Path>,
    cli_args: Option<&HashMap<String, String>>,
) -> ConfigResult<NeurographConfig> {
    let config_file = match config_path {
        Some(path) => path.to_path_buf(),
        None => find_config_file()?,
    };

    let content = fs::read_to_string(&config_file)?;
    let mut config: NeurographConfig = toml::from_str(&content)?;

    apply_environment_overrides(&mut config);
    if let Some(cli) = cli_args {
        apply_cli_overrides(&mut config, cli);
    }

    Ok(config)
}

fn parse_flag(value: &str) -> bool {
    let lower = value.to_lowercase();
    lower == "true" || lower == "1" || lower == "yes"
}

/// Apply environment variable overrides to configuration
///
/// Supported environment variables:
/// - `NEUROGRAPH_LOG_LEVEL` -> `logging.level`
/// - `NEUROGRAPH_PROFILING` -> `network.profiling`
/// - `NEUROGRAPH_LOG_INTERVAL` -> `network.log_interval`
/// - `NEUROGRAPH_BUNDLE_COMPRESSION` -> `bundle.compression`
/// - `NEUROGRAPH_BUNDLE_DIR` -> `bundle.directory`
pub fn apply_environment_overrides(config: &mut NeurographConfig) {
    if let Ok(value) = env::var("NEUROGRAPH_LOG_LEVEL") {
        config.logging.level = value;
    }
    if let Ok(value) = env::var("NEUROGRAPH_PROFILING") {
        config.network.profiling = parse_flag(&value);
    }
    if let Ok(value) = env::var("NEUROGRAPH_LOG_INTERVAL") {
        if let Ok(interval) = value.parse::<u64>() {
            config.network.log_interval = interval;
        }
    }
    if let Ok(value) = env::var("NEUROGRAPH_BUNDLE_COMPRESSION") {
        config.bundle.compression = parse_flag(&value);
    }
    if let Ok(value) = env::var("NEUROGRAPH_BUNDLE_DIR") {
        config.bundle.directory = PathBuf::from(value);
    }
}

/// Apply CLI argument overrides to configuration
///
/// # Arguments
///
/// * `config` - Configuration to modify
/// * `cli_args` - CLI arguments (e.g., `{"log_level": "debug", "profiling": "true"}`)
pub fn apply_cli_overrides(config: &mut NeurographConfig, cli_args: &HashMap<String, String>) {
    if let Some(value) = cli_args.get("log_level") {
        config.logging.level = value.clone();
    }
    if let Some(value) = cli_args.get("log_format") {
        config.logging.format = value.clone();
    }
    if let Some(value) = cli_args.get("file_logging") {
        config.logging.file_logging = parse_flag(value);
    }
    if let Some(value) = cli_args.get("log_dir") {
        config.logging.log_dir = PathBuf::from(value);
    }
    if let Some(value) = cli_args.get("profiling") {
        config.network.profiling = parse_flag(value);
    }
    if let Some(value) = cli_args.get("log_interval") {
        if let Ok(interval) = value.parse::<u64>() {
            config.network.log_interval = interval;
        }
    }
    if let Some(value) = cli_args.get("bundle_compression") {
        config.bundle.compression = parse_flag(value);
    }
    if let Some(value) = cli_args.get("bundle_dir") {
        config.bundle.directory = PathBuf::from(value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use std::sync::Mutex;
    use tempfile::tempdir;

    static ENV_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn test_find_config_file_env_var() {
        let _env_lock = ENV_LOCK.lock().unwrap();
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("custom.toml");
        File::create(&config_path).unwrap();

        env::set_var(CONFIG_PATH_ENV, config_path.to_str().unwrap());
        let result = find_config_file();
        env::remove_var(CONFIG_PATH_ENV);

        assert_eq!(result.unwrap(), config_path);
    }

    #[test]
    fn test_find_config_file_env_var_missing_file() {
        let _env_lock = ENV_LOCK.lock().unwrap();
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("absent.toml");

        env::set_var(CONFIG_PATH_ENV, config_path.to_str().unwrap());
        let result = find_config_file();
        env::remove_var(CONFIG_PATH_ENV);

        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
    }

    #[test]
    fn test_load_minimal_config() {
        let _env_lock = ENV_LOCK.lock().unwrap();
        env::remove_var("NEUROGRAPH_PROFILING");
        env::remove_var("NEUROGRAPH_LOG_INTERVAL");
        let dir = tempdir().unwrap();
        let config_path = dir.path().join(CONFIG_FILE_NAME);

        let mut file = File::create(&config_path).unwrap();
        writeln!(file, "[network]").unwrap();
        writeln!(file, "profiling = true").unwrap();
        writeln!(file, "log_interval = 100").unwrap();

        let config = load_config(Some(&config_path), None).unwrap();

        assert!(config.network.profiling);
        assert_eq!(config.network.log_interval, 100);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_invalid_toml() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join(CONFIG_FILE_NAME);
        fs::write(&config_path, "[network\nprofiling = ").unwrap();

        assert!(matches!(
            load_config(Some(&config_path), None),
            Err(ConfigError::ParseError(_))
        ));
    }

    #[test]
    fn test_environment_overrides() {
        let _env_lock = ENV_LOCK.lock().unwrap();
        let mut config = NeurographConfig::default();

        env::set_var("NEUROGRAPH_BUNDLE_COMPRESSION", "no");
        env::set_var("NEUROGRAPH_BUNDLE_DIR", "/tmp/ng");
        env::set_var("NEUROGRAPH_LOG_INTERVAL", "not-a-number");

        apply_environment_overrides(&mut config);

        env::remove_var("NEUROGRAPH_BUNDLE_COMPRESSION");
        env::remove_var("NEUROGRAPH_BUNDLE_DIR");
        env::remove_var("NEUROGRAPH_LOG_INTERVAL");

        assert!(!config.bundle.compression);
        assert_eq!(config.bundle.directory, PathBuf::from("/tmp/ng"));
        assert_eq!(config.network.log_interval, 0);
    }

    #[test]
    fn test_cli_overrides() {
        let mut config = NeurographConfig::default();
        let mut cli_args = HashMap::new();
        cli_args.insert("log_level".to_string(), "debug".to_string());
        cli_args.insert("profiling".to_string(), "1".to_string());

        apply_cli_overrides(&mut config, &cli_args);

        assert_eq!(config.logging.level, "debug");
        assert!(config.network.profiling);
    }

    #[test]
    fn test_override_precedence() {
        let _env_lock = ENV_LOCK.lock().unwrap();
        let dir = tempdir().unwrap();
        let config_path = dir.path().join(CONFIG_FILE_NAME);

        let mut file = File::create(&config_path).unwrap();
        writeln!(file, "[logging]").unwrap();
        writeln!(file, "level = \"warn\"").unwrap();
        writeln!(file, "[network]").unwrap();
        writeln!(file, "log_interval = 5").unwrap();

        env::set_var("NEUROGRAPH_LOG_LEVEL", "error");
        env::set_var("NEUROGRAPH_LOG_INTERVAL", "50");

        let mut cli_args = HashMap::new();
        cli_args.insert("log_level".to_string(), "trace".to_string());

        let config = load_config(Some(&config_path), Some(&cli_args)).unwrap();

        env::remove_var("NEUROGRAPH_LOG_LEVEL");
        env::remove_var("NEUROGRAPH_LOG_INTERVAL");

        // CLI wins for level, env wins for interval (no CLI override)
        assert_eq!(config.logging.level, "trace");
        assert_eq!(config.network.log_interval, 50);
    }
}
