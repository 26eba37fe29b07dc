// crates/pavilion-config/src/overlay.rs
// ============================================================================
// Module: Suite/Host/Mode Map Validation & Overlay
// Description: Accepts already-parsed suite/host/mode configuration maps
//              (the YAML loader itself is out of scope, per spec.md §1) and
//              validates their top-level shape, then overlays this
//              process's scheduler defaults onto any map that leaves its
//              own `schedule` section unset.
// Purpose: Give the resolver a process-config-aware starting layer without
//          duplicating its own overlay/inheritance/permutation machinery.
// Dependencies: pavilion-core, pavilion-resolver, serde_json
// ============================================================================

//! ## Overview
//! [`validate_map`] enforces the one structural invariant every
//! suite/host/mode map must satisfy before [`pavilion_resolver`] can merge
//! it: it is a JSON object, not a scalar or array. [`with_scheduler_defaults`]
//! then reuses [`pavilion_resolver::merge_layer`] to overlay this process's
//! [`crate::SchedulerDefaults`] as the *base* layer, so an explicit
//! `schedule` section in the map always wins.

use pavilion_resolver::ConfigLayer;
use pavilion_resolver::merge_layer;
use serde_json::Value;
use serde_json::json;

use crate::error::ConfigError;
use crate::process::SchedulerDefaults;

/// Validates that `map` is a JSON object, returning it as a [`ConfigLayer`].
///
/// # Errors
///
/// Returns [`ConfigError::Invalid`] if `map` is not a JSON object.
pub fn validate_map(name: &str, map: &Value) -> Result<ConfigLayer, ConfigError> {
    map.as_object()
        .cloned()
        .ok_or_else(|| ConfigError::Invalid(format!("{name} configuration must be a mapping, got {map}")))
}

/// Overlays `defaults` as the base layer under `map`'s own `schedule`
/// section, so any `schedule` key the map already sets is preserved.
///
/// # Errors
///
/// Returns [`ConfigError::Invalid`] if `map` is not a JSON object.
pub fn with_scheduler_defaults(map: &Value, defaults: &SchedulerDefaults) -> Result<ConfigLayer, ConfigError> {
    let layer = validate_map("suite", map)?;
    let base: ConfigLayer = json!({
        "schedule": {
            "scheduler": defaults.name,
            "poll_interval_secs": defaults.poll_interval_secs,
        }
    })
    .as_object()
    .cloned()
    .unwrap_or_default();
    Ok(merge_layer(&base, &layer))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_map_rejects_non_object() {
        let err = validate_map("host", &json!([1, 2, 3])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn scheduler_defaults_fill_in_when_schedule_absent() {
        let defaults = SchedulerDefaults { name: "slurm".to_string(), poll_interval_secs: 15 };
        let merged = with_scheduler_defaults(&json!({"name": "my_test"}), &defaults).unwrap();
        assert_eq!(merged["schedule"]["scheduler"], json!("slurm"));
    }

    #[test]
    fn explicit_schedule_section_overrides_defaults() {
        let defaults = SchedulerDefaults { name: "slurm".to_string(), poll_interval_secs: 15 };
        let merged = with_scheduler_defaults(&json!({"schedule": {"scheduler": "raw"}}), &defaults).unwrap();
        assert_eq!(merged["schedule"]["scheduler"], json!("raw"));
        assert_eq!(merged["schedule"]["poll_interval_secs"], json!(15));
    }
}
