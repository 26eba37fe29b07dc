// crates/pavilion-resolver/src/resolve.rs
// ============================================================================
// Module: Test Resolver Pipeline
// Description: Orchestrates overlay, inheritance, permutation, substitution,
//              and skip evaluation into the candidate Test-Run set for one
//              suite-map entry.
// Purpose: The single entry point the orchestrator calls per test name.
// Dependencies: pavilion-core, pavilion-expr, crate::{overlay,inherit,
//               permute,skip,error}
// ============================================================================

//! ## Overview
//! [`resolve_test`] implements the five-step order from the component
//! design: overlay layers, expand `inherits_from`, expand `permute_on`,
//! substitute the scheduler section first and everything else after, then
//! evaluate `only_if`/`not_if`. Fields evaluated before dispatch (`build`,
//! `schedule`, `subtitle`) reject deferred and `sched.*` references outright;
//! everything else defers substitutions it cannot yet resolve rather than
//! failing, recording the field path in [`ResolvedRun::deferred_points`].

use std::collections::BTreeMap;

use pavilion_core::BuildSpec;
use pavilion_core::TestSpec;
use pavilion_core::VariableStore;
use pavilion_core::interfaces::ExpressionFunction;
use pavilion_core::interfaces::Registry;
use pavilion_expr::ExprError;
use pavilion_expr::template;

use crate::error::ResolverError;
use crate::overlay::ConfigLayer;
use crate::permute::expand_permutations;
use crate::skip::should_skip;

/// The expression-function registry type threaded through the resolver.
pub type ExpressionFunctionRegistry = Registry<dyn ExpressionFunction>;

/// One fully-resolved candidate test run, prior to build and dispatch.
#[derive(Debug, Clone)]
pub struct ResolvedRun {
    /// Namespaced identifier suffix (the base test name; the caller assigns
    /// the numeric id and label prefix).
    pub test_name: String,
    /// The rendered subtitle, if the spec declared one.
    pub subtitle: Option<String>,
    /// The finalized, pre-dispatch-substituted build spec.
    pub build: BuildSpec,
    /// The finalized, pre-dispatch-substituted schedule spec (still on the
    /// typed `TestSpec` returned alongside, kept here only by reference).
    pub spec: TestSpec,
    /// The variable store as it stood after permutation, for the run script
    /// writer and later scheduler-variable substitution.
    pub store: VariableStore,
    /// Field paths (dotted, e.g. `run.cmds.0`) whose substitution could not
    /// complete because it referenced a `sched.*` or deferred variable.
    pub deferred_points: Vec<String>,
    /// Whether `only_if`/`not_if` marked this run skipped.
    pub skip: bool,
}

/// Resolves one suite-map entry (already overlaid with its ancestor chain
/// via [`crate::inherit::resolve_inheritance`]) into its candidate runs.
///
/// # Errors
///
/// Returns [`ResolverError`] on malformed configuration, cyclic or missing
/// `inherits_from` targets (caller's responsibility before this is called),
/// a deferred or `sched.*` reference in a pre-dispatch field, or an invalid
/// `only_if`/`not_if` regex.
pub fn resolve_test(
    test_name: &str,
    layer: &ConfigLayer,
    base_store: &VariableStore,
    functions: &ExpressionFunctionRegistry,
) -> Result<Vec<ResolvedRun>, ResolverError> {
    let spec: TestSpec = serde_json::from_value(serde_json::Value::Object(layer.clone()))
        .map_err(|err| pavilion_core::ConfigError::Malformed(err.to_string()))?;

    let variants = expand_permutations(base_store, &spec.permute_on)?;

    let mut runs = Vec::with_capacity(variants.len());
    for store in variants {
        runs.push(resolve_one_variant(test_name, &spec, store, functions)?);
    }
    Ok(runs)
}

fn resolve_one_variant(
    test_name: &str,
    spec: &TestSpec,
    store: VariableStore,
    functions: &ExpressionFunctionRegistry,
) -> Result<ResolvedRun, ResolverError> {
    let mut finalized = spec.clone();
    let mut deferred_points = Vec::new();

    finalized.build.cmds = render_pre_dispatch(&spec.build.cmds, &store, functions)?;
    for value in finalized.build.env.values_mut() {
        *value = template::render(value, &store, functions, true)?;
    }

    if let Some(partition) = &spec.schedule.partition {
        finalized.schedule.partition = Some(template::render(partition, &store, functions, true)?);
    }
    if let Some(time_limit) = &spec.schedule.time_limit {
        finalized.schedule.time_limit = Some(template::render(time_limit, &store, functions, true)?);
    }
    if let Some(mem) = &spec.schedule.mem_per_node {
        finalized.schedule.mem_per_node = Some(template::render(mem, &store, functions, true)?);
    }
    if let Some(wrapper) = &spec.schedule.wrapper {
        finalized.schedule.wrapper = Some(template::render(wrapper, &store, functions, true)?);
    }

    let subtitle = spec
        .subtitle
        .as_ref()
        .map(|raw| template::render(raw, &store, functions, true))
        .transpose()?;
    finalized.subtitle.clone_from(&subtitle);

    finalized.run.cmds = render_deferrable(&spec.run.cmds, "run.cmds", &store, functions, &mut deferred_points)?;
    for (key, value) in &spec.run.env {
        let field = format!("run.env.{key}");
        let rendered = render_deferrable_one(value, &field, &store, functions, &mut deferred_points)?;
        finalized.run.env.insert(key.clone(), rendered);
    }

    let resolved_keys = resolved_condition_keys(spec, &store, functions)?;
    let skip = should_skip(&resolved_keys, &spec.only_if, &spec.not_if)?;

    Ok(ResolvedRun {
        test_name: test_name.to_string(),
        subtitle,
        build: finalized.build.clone(),
        spec: finalized,
        store,
        deferred_points,
        skip,
    })
}

fn render_pre_dispatch(
    lines: &[String],
    store: &VariableStore,
    functions: &ExpressionFunctionRegistry,
) -> Result<Vec<String>, ResolverError> {
    lines.iter().map(|line| template::render(line, store, functions, true).map_err(Into::into)).collect()
}

fn render_deferrable(
    lines: &[String],
    field_prefix: &str,
    store: &VariableStore,
    functions: &ExpressionFunctionRegistry,
    deferred_points: &mut Vec<String>,
) -> Result<Vec<String>, ResolverError> {
    lines
        .iter()
        .enumerate()
        .map(|(i, line)| {
            let field = format!("{field_prefix}.{i}");
            render_deferrable_one(line, &field, store, functions, deferred_points)
        })
        .collect()
}

fn render_deferrable_one(
    raw: &str,
    field: &str,
    store: &VariableStore,
    functions: &ExpressionFunctionRegistry,
    deferred_points: &mut Vec<String>,
) -> Result<String, ResolverError> {
    match template::render(raw, store, functions, false) {
        Ok(rendered) => Ok(rendered),
        Err(ExprError::SchedulerVariableBeforeDispatch(_) | ExprError::UnknownReference(_)) => {
            deferred_points.push(field.to_string());
            Ok(raw.to_string())
        }
        Err(other) => Err(other.into()),
    }
}

fn resolved_condition_keys(
    spec: &TestSpec,
    store: &VariableStore,
    functions: &ExpressionFunctionRegistry,
) -> Result<BTreeMap<String, String>, ResolverError> {
    let mut resolved = BTreeMap::new();
    for key in spec.only_if.keys().chain(spec.not_if.keys()) {
        if store.lookup(key).is_ok() {
            let rendered = template::render(&format!("{{{{ {key} }}}}"), store, functions, true)?;
            resolved.insert(key.clone(), rendered);
        }
    }
    Ok(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pavilion_core::Scope;
    use pavilion_core::VarValue;
    use pavilion_core::Variable;
    use serde_json::json;

    fn layer(value: serde_json::Value) -> ConfigLayer {
        match value {
            serde_json::Value::Object(map) => map,
            _ => panic!("fixture must be an object"),
        }
    }

    #[test]
    fn resolves_build_cmds_and_permutes() {
        let mut store = VariableStore::new();
        store.set(
            Scope::Var,
            "compiler",
            Variable::new(vec![VarValue::Scalar("gcc".to_string()), VarValue::Scalar("clang".to_string())])
                .unwrap(),
        );
        let spec = layer(json!({
            "permute_on": ["compiler"],
            "build": {"cmds": ["{{ compiler }} -c main.c"]},
        }));
        let functions = ExpressionFunctionRegistry::new();
        let runs = resolve_test("example", &spec, &store, &functions).unwrap();
        assert_eq!(runs.len(), 2);
        assert_eq!(runs[0].build.cmds, vec!["gcc -c main.c".to_string()]);
        assert_eq!(runs[1].build.cmds, vec!["clang -c main.c".to_string()]);
    }

    #[test]
    fn defers_scheduler_reference_in_run_cmds() {
        let store = VariableStore::new();
        let spec = layer(json!({"run": {"cmds": ["echo {{ sched.node_list }}"]}}));
        let functions = ExpressionFunctionRegistry::new();
        let runs = resolve_test("example", &spec, &store, &functions).unwrap();
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].deferred_points, vec!["run.cmds.0".to_string()]);
        assert_eq!(runs[0].spec.run.cmds, vec!["echo {{ sched.node_list }}".to_string()]);
    }

    #[test]
    fn rejects_scheduler_reference_in_build_section() {
        let store = VariableStore::new();
        let spec = layer(json!({"build": {"cmds": ["echo {{ sched.node_list }}"]}}));
        let functions = ExpressionFunctionRegistry::new();
        assert!(resolve_test("example", &spec, &store, &functions).is_err());
    }
}
