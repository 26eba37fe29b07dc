// crates/pavilion-config/src/error.rs
// ============================================================================
// Module: Configuration Errors
// Description: Errors raised while resolving, reading, parsing, or
//              validating the process-level Pavilion configuration file.
// Purpose: Fail closed: a missing, oversized, or malformed config file is
//          always an error, never silently defaulted.
// Dependencies: thiserror
// ============================================================================

/// Errors raised while loading or validating [`crate::ProcessConfig`] or a
/// suite/host/mode configuration map.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// I/O failure while reading the configuration file.
    #[error("config io error: {0}")]
    Io(String),
    /// TOML parsing error.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Invalid configuration data.
    #[error("invalid config: {0}")]
    Invalid(String),
}

impl From<pavilion_core::ConfigError> for ConfigError {
    fn from(err: pavilion_core::ConfigError) -> Self {
        Self::Invalid(err.to_string())
    }
}
