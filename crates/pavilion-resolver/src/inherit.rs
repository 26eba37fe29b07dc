// crates/pavilion-resolver/src/inherit.rs
// ============================================================================
// Module: Inheritance Expansion
// Description: Resolves `inherits_from` chains within one suite map.
// Purpose: Merge a test spec with its ancestor chain before permutation,
//          detecting cycles and honoring the cmds prepend/append exception.
// Dependencies: pavilion-core, crate::overlay, crate::error
// ============================================================================

//! ## Overview
//! `inherits_from` names another test in the *same* suite map. The merge
//! walks from the most distant ancestor toward the requested test, applying
//! [`crate::overlay::merge_layer`] at each step, except that `prepend_cmds`
//! and `append_cmds` in the child splice into the inherited `cmds` list
//! rather than overwriting it.

use std::collections::BTreeMap;
use std::collections::BTreeSet;

use serde_json::Value;

use crate::error::ResolverError;
use crate::overlay::ConfigLayer;
use crate::overlay::merge_layer;
use pavilion_core::ConfigError;

/// Resolves the full inheritance chain for `name` within `suite`, returning
/// the merged configuration layer.
///
/// # Errors
///
/// Returns [`ResolverError::Config`] wrapping [`ConfigError::CyclicInheritance`]
/// if the chain cycles, or [`ConfigError::Malformed`] if a named base is
/// absent from the suite.
pub fn resolve_inheritance(
    suite: &BTreeMap<String, ConfigLayer>,
    name: &str,
) -> Result<ConfigLayer, ResolverError> {
    let mut chain = Vec::new();
    let mut visited = BTreeSet::new();
    let mut current = name.to_string();

    loop {
        if !visited.insert(current.clone()) {
            return Err(ResolverError::Config(ConfigError::CyclicInheritance(current)));
        }
        let layer = suite
            .get(&current)
            .ok_or_else(|| ConfigError::Malformed(format!("unknown test '{current}'")))?;
        chain.push(layer);
        match layer.get("inherits_from").and_then(Value::as_str) {
            Some(parent) => current = parent.to_string(),
            None => break,
        }
    }

    chain.reverse();
    let mut merged = ConfigLayer::new();
    for layer in chain {
        merged = merge_with_cmds_splice(&merged, layer);
    }
    merged.remove("inherits_from");
    Ok(merged)
}

fn merge_with_cmds_splice(base: &ConfigLayer, patch: &ConfigLayer) -> ConfigLayer {
    let mut merged = merge_layer(base, patch);
    splice_cmds_section(&mut merged, base, patch, "build");
    splice_cmds_section(&mut merged, base, patch, "run");
    merged
}

/// Splices `prepend_cmds`/`append_cmds` from `patch[section]` around the
/// inherited `base[section].cmds`, since [`merge_layer`] would otherwise
/// have already replaced `cmds` outright with the patch's own list.
fn splice_cmds_section(merged: &mut ConfigLayer, base: &ConfigLayer, patch: &ConfigLayer, section: &str) {
    let Some(Value::Object(patch_section)) = patch.get(section) else { return };
    let prepend = patch_section.get("prepend_cmds").and_then(Value::as_array).cloned();
    let append = patch_section.get("append_cmds").and_then(Value::as_array).cloned();
    if prepend.is_none() && append.is_none() {
        return;
    }

    let inherited_cmds = base
        .get(section)
        .and_then(|v| v.get("cmds"))
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();

    let mut spliced = prepend.unwrap_or_default();
    spliced.extend(inherited_cmds);
    spliced.extend(append.unwrap_or_default());

    if let Some(Value::Object(merged_section)) = merged.get_mut(section) {
        merged_section.insert("cmds".to_string(), Value::Array(spliced));
        merged_section.remove("prepend_cmds");
        merged_section.remove("append_cmds");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn obj(value: Value) -> ConfigLayer {
        match value {
            Value::Object(map) => map,
            _ => panic!("test fixture must be a JSON object"),
        }
    }

    #[test]
    fn merges_simple_chain() {
        let mut suite = BTreeMap::new();
        suite.insert("base".to_string(), obj(json!({"scheduler": "slurm"})));
        suite.insert(
            "child".to_string(),
            obj(json!({"inherits_from": "base", "schedule": {"nodes": 4}})),
        );
        let merged = resolve_inheritance(&suite, "child").unwrap();
        assert_eq!(merged["scheduler"], json!("slurm"));
        assert_eq!(merged["schedule"]["nodes"], json!(4));
        assert!(!merged.contains_key("inherits_from"));
    }

    #[test]
    fn detects_cycles() {
        let mut suite = BTreeMap::new();
        suite.insert("a".to_string(), obj(json!({"inherits_from": "b"})));
        suite.insert("b".to_string(), obj(json!({"inherits_from": "a"})));
        assert!(matches!(
            resolve_inheritance(&suite, "a"),
            Err(ResolverError::Config(ConfigError::CyclicInheritance(_)))
        ));
    }

    #[test]
    fn prepend_and_append_cmds_splice_around_inherited() {
        let mut suite = BTreeMap::new();
        suite.insert("base".to_string(), obj(json!({"build": {"cmds": ["make"]}})));
        suite.insert(
            "child".to_string(),
            obj(json!({
                "inherits_from": "base",
                "build": {"prepend_cmds": ["module load gcc"], "append_cmds": ["make install"]},
            })),
        );
        let merged = resolve_inheritance(&suite, "child").unwrap();
        assert_eq!(merged["build"]["cmds"], json!(["module load gcc", "make", "make install"]));
    }
}
