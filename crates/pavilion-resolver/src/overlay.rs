// crates/pavilion-resolver/src/overlay.rs
// ============================================================================
// Module: Configuration Overlay
// Description: Deep-merges ordered configuration layers (defaults, host,
//              suite test spec, mode configs, command-line overrides).
// Purpose: Produce one merged raw config before inheritance and typed
//          deserialization run.
// Dependencies: serde_json
// ============================================================================

//! ## Overview
//! Each layer is a `serde_json` object. A later layer's scalar and mapping
//! values override an earlier layer's; array values replace outright (the
//! `prepend_cmds`/`append_cmds` special case belongs to [`crate::inherit`],
//! which is the only stage list-replacement semantics differ for).

use serde_json::Map;
use serde_json::Value;

/// One configuration layer: an unparsed JSON object.
pub type ConfigLayer = Map<String, Value>;

/// Deep-merges `patch` onto `base`, returning the merged result. Objects
/// merge key-wise and recursively; any other value (array, scalar, null)
/// in `patch` replaces the corresponding value in `base` outright.
#[must_use]
pub fn merge_layer(base: &ConfigLayer, patch: &ConfigLayer) -> ConfigLayer {
    let mut merged = base.clone();
    for (key, patch_value) in patch {
        match (merged.get_mut(key), patch_value) {
            (Some(Value::Object(base_obj)), Value::Object(patch_obj)) => {
                *base_obj = merge_layer(base_obj, patch_obj);
            }
            _ => {
                merged.insert(key.clone(), patch_value.clone());
            }
        }
    }
    merged
}

/// Folds [`merge_layer`] over an ordered sequence of layers, earliest first.
#[must_use]
pub fn overlay_chain(layers: &[&ConfigLayer]) -> ConfigLayer {
    layers.iter().fold(ConfigLayer::new(), |acc, layer| merge_layer(&acc, layer))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn layer(value: Value) -> ConfigLayer {
        match value {
            Value::Object(map) => map,
            _ => panic!("test fixture must be a JSON object"),
        }
    }

    #[test]
    fn later_scalar_overrides_earlier() {
        let base = layer(json!({"timeout": 30, "name": "base"}));
        let patch = layer(json!({"timeout": 60}));
        let merged = merge_layer(&base, &patch);
        assert_eq!(merged["timeout"], json!(60));
        assert_eq!(merged["name"], json!("base"));
    }

    #[test]
    fn nested_objects_merge_recursively() {
        let base = layer(json!({"schedule": {"nodes": 1, "partition": "debug"}}));
        let patch = layer(json!({"schedule": {"nodes": 4}}));
        let merged = merge_layer(&base, &patch);
        assert_eq!(merged["schedule"]["nodes"], json!(4));
        assert_eq!(merged["schedule"]["partition"], json!("debug"));
    }

    #[test]
    fn arrays_are_replaced_outright() {
        let base = layer(json!({"cmds": ["a", "b"]}));
        let patch = layer(json!({"cmds": ["c"]}));
        let merged = merge_layer(&base, &patch);
        assert_eq!(merged["cmds"], json!(["c"]));
    }

    #[test]
    fn overlay_chain_applies_in_order() {
        let defaults = layer(json!({"timeout": 30}));
        let host = layer(json!({"timeout": 45}));
        let suite = layer(json!({"timeout": 60, "scheduler": "slurm"}));
        let merged = overlay_chain(&[&defaults, &host, &suite]);
        assert_eq!(merged["timeout"], json!(60));
        assert_eq!(merged["scheduler"], json!("slurm"));
    }
}
