// crates/pavilion-resolver/tests/overlay_inherit_resolve.rs
// ============================================================================
// Module: Overlay + Inheritance + Resolve Integration
// Description: Exercises the full suite/host overlay, `inherits_from` chain,
//              and variable substitution/permutation path together, rather
//              than any one stage in isolation.
// Purpose: Confirm a host-layer override survives inheritance and still
//          substitutes correctly once permutation expands it.
// ============================================================================

use std::collections::BTreeMap;

use pavilion_core::Scope;
use pavilion_core::VarValue;
use pavilion_core::Variable;
use pavilion_core::VariableStore;
use pavilion_resolver::ConfigLayer;
use pavilion_resolver::ExpressionFunctionRegistry;
use pavilion_resolver::merge_layer;
use pavilion_resolver::resolve_inheritance;
use pavilion_resolver::resolve_test;
use serde_json::Value;
use serde_json::json;

fn layer(value: Value) -> ConfigLayer {
    match value {
        Value::Object(map) => map,
        _ => panic!("fixture must be a JSON object"),
    }
}

#[test]
fn host_overlay_survives_inheritance_and_permutes() {
    let suite: BTreeMap<String, ConfigLayer> = BTreeMap::from([
        (
            "base_compile".to_string(),
            layer(json!({
                "build": {"cmds": ["{{ compiler }} -O2 -c main.c"]},
            })),
        ),
        (
            "compile_test".to_string(),
            layer(json!({
                "inherits_from": "base_compile",
                "permute_on": ["compiler"],
            })),
        ),
    ]);

    let inherited = resolve_inheritance(&suite, "compile_test").unwrap();

    let host_layer = layer(json!({"build": {"timeout": 600}}));
    let overlaid = merge_layer(&host_layer, &inherited);

    let mut store = VariableStore::new();
    store.set(
        Scope::Var,
        "compiler",
        Variable::new(vec![VarValue::Scalar("gcc".to_string()), VarValue::Scalar("clang".to_string())]).unwrap(),
    );
    let functions = ExpressionFunctionRegistry::new();

    let runs = resolve_test("compile_test", &overlaid, &store, &functions).unwrap();

    assert_eq!(runs.len(), 2);
    assert_eq!(runs[0].build.cmds, vec!["gcc -O2 -c main.c".to_string()]);
    assert_eq!(runs[1].build.cmds, vec!["clang -O2 -c main.c".to_string()]);
    assert_eq!(runs[0].build.timeout, 600);
    assert_eq!(runs[1].build.timeout, 600);
}

#[test]
fn cyclic_inheritance_is_rejected_before_any_resolution() {
    let suite: BTreeMap<String, ConfigLayer> = BTreeMap::from([
        ("a".to_string(), layer(json!({"inherits_from": "b"}))),
        ("b".to_string(), layer(json!({"inherits_from": "a"}))),
    ]);

    let err = resolve_inheritance(&suite, "a").unwrap_err();
    assert!(matches!(err, pavilion_resolver::ResolverError::Config(_)));
}
