// crates/pavilion-config/src/process.rs
// ============================================================================
// Module: Process-Level Configuration
// Description: The `pavilion.toml` configuration model: working directory
//              root, `test_src` search paths, plugin directories, and
//              scheduler defaults.
// Purpose: Give every Pavilion entry point one strict, fail-closed source of
//          truth for where things live on disk, independent of any one
//          suite/host/mode map (those are handled by `crate::overlay`).
// Dependencies: serde, toml
// ============================================================================

//! ## Overview
//! [`ProcessConfig::load`] resolves the config path (explicit argument, then
//! `PAV_CONFIG_FILE`, then `pavilion.toml` in the current directory), reads
//! it under a hard size limit, and validates every path field before
//! returning. This mirrors the teacher's own `DecisionGateConfig::load`:
//! resolve path, enforce size/length limits, parse, then validate.

use std::env;
use std::fs;
use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;
use serde::Serialize;

use crate::error::ConfigError;

/// Default configuration filename when no path is specified.
const DEFAULT_CONFIG_NAME: &str = "pavilion.toml";
/// Environment variable used to override the config path (per spec.md §5's
/// run-side environment contract, `PAV_CONFIG_FILE`).
pub const CONFIG_ENV_VAR: &str = "PAV_CONFIG_FILE";
/// Maximum configuration file size in bytes.
const MAX_CONFIG_FILE_SIZE: usize = 1024 * 1024;
/// Maximum length of a single path component.
const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
const MAX_TOTAL_PATH_LENGTH: usize = 4096;

/// The process-level Pavilion configuration (`pavilion.toml`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessConfig {
    /// Root of the shared working directory (`builds/`, `test_runs/`,
    /// `jobs/`, `series/`, `downloads/` all live under this).
    pub working_dir: PathBuf,
    /// Directories searched, in order, for a relative `source_path` (first
    /// match wins).
    #[serde(default)]
    pub test_src: Vec<PathBuf>,
    /// Directories scanned at startup for user-supplied plugins.
    #[serde(default)]
    pub plugin_dirs: Vec<PathBuf>,
    /// Scheduler defaults applied when a suite/host/mode map leaves its own
    /// `schedule` section unset.
    #[serde(default)]
    pub scheduler: SchedulerDefaults,
}

/// Scheduler defaults overlaid onto an unconfigured `schedule` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerDefaults {
    /// Name of the scheduler capability to dispatch through
    /// (e.g. `"raw"`, `"slurm"`) when a test spec names none.
    #[serde(default = "default_scheduler_name")]
    pub name: String,
    /// Seconds between scheduler job-status polls.
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
}

impl Default for SchedulerDefaults {
    fn default() -> Self {
        Self { name: default_scheduler_name(), poll_interval_secs: default_poll_interval_secs() }
    }
}

fn default_scheduler_name() -> String {
    "raw".to_string()
}

const fn default_poll_interval_secs() -> u64 {
    30
}

impl ProcessConfig {
    /// Loads and validates the process configuration from `path`, or from
    /// the default resolution rules when `path` is `None`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the path cannot be resolved, the file
    /// cannot be read, exceeds the size limit, fails to parse, or fails
    /// validation.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let resolved = resolve_path(path)?;
        validate_path(&resolved)?;
        let bytes = fs::read(&resolved).map_err(|err| ConfigError::Io(err.to_string()))?;
        if bytes.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
        }
        let content =
            std::str::from_utf8(&bytes).map_err(|_| ConfigError::Invalid("config file must be utf-8".to_string()))?;
        let config: Self = toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates every path-shaped field for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if `working_dir` is empty, or any
    /// `test_src`/`plugin_dirs` entry fails path-length limits.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.working_dir.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("working_dir must be non-empty".to_string()));
        }
        validate_path(&self.working_dir)?;
        for path in self.test_src.iter().chain(&self.plugin_dirs) {
            validate_path(path)?;
        }
        if self.scheduler.name.trim().is_empty() {
            return Err(ConfigError::Invalid("scheduler.name must be non-empty".to_string()));
        }
        if self.scheduler.poll_interval_secs == 0 {
            return Err(ConfigError::Invalid("scheduler.poll_interval_secs must be positive".to_string()));
        }
        Ok(())
    }
}

/// Resolves the config path from an explicit argument, then
/// [`CONFIG_ENV_VAR`], then [`DEFAULT_CONFIG_NAME`] in the current
/// directory.
fn resolve_path(path: Option<&Path>) -> Result<PathBuf, ConfigError> {
    if let Some(path) = path {
        return Ok(path.to_path_buf());
    }
    if let Ok(env_path) = env::var(CONFIG_ENV_VAR) {
        if env_path.len() > MAX_TOTAL_PATH_LENGTH {
            return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
        }
        return Ok(PathBuf::from(env_path));
    }
    Ok(PathBuf::from(DEFAULT_CONFIG_NAME))
}

/// Validates a path against the fail-closed length limits shared by every
/// path-shaped configuration field.
fn validate_path(path: &Path) -> Result<(), ConfigError> {
    let text = path.to_string_lossy();
    if text.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid("path exceeds max length".to_string()));
    }
    for component in path.components() {
        let value = component.as_os_str().to_string_lossy();
        if value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid("path component too long".to_string()));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_config(dir: &tempfile::TempDir, contents: &str) -> PathBuf {
        let path = dir.path().join("pavilion.toml");
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn loads_minimal_config_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(&dir, "working_dir = \"/srv/pav\"\n");
        let config = ProcessConfig::load(Some(&path)).unwrap();
        assert_eq!(config.scheduler.name, "raw");
        assert_eq!(config.scheduler.poll_interval_secs, 30);
        assert!(config.test_src.is_empty());
    }

    #[test]
    fn rejects_empty_scheduler_name() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(&dir, "working_dir = \"/srv/pav\"\n[scheduler]\nname = \"\"\n");
        let err = ProcessConfig::load(Some(&path)).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn rejects_oversized_file() {
        let dir = tempfile::tempdir().unwrap();
        let huge = "# ".to_string() + &"x".repeat(MAX_CONFIG_FILE_SIZE + 1);
        let path = write_config(&dir, &huge);
        let err = ProcessConfig::load(Some(&path)).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = ProcessConfig::load(Some(&dir.path().join("missing.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
