// crates/pavilion-config/src/lib.rs
// ============================================================================
// Crate: pavilion-config
// Description: Process-level Pavilion configuration (`pavilion.toml`) plus
//              validation/overlay of already-parsed suite/host/mode maps.
// Purpose: One strict, fail-closed source of truth for where things live on
//          disk and what a test's schedule defaults to, independent of the
//          (externally-owned) YAML loader.
// ============================================================================

//! # pavilion-config
//!
//! [`ProcessConfig`] is `pavilion.toml`: working directory root, `test_src`
//! search paths, plugin directories, scheduler defaults. [`overlay`]
//! validates and overlays already-parsed suite/host/mode maps (the YAML
//! loader itself is out of scope, per spec.md §1) before
//! `pavilion_resolver` takes over inheritance and permutation expansion.

pub mod error;
pub mod overlay;
pub mod process;

pub use error::ConfigError;
pub use overlay::validate_map;
pub use overlay::with_scheduler_defaults;
pub use process::CONFIG_ENV_VAR;
pub use process::ProcessConfig;
pub use process::SchedulerDefaults;
