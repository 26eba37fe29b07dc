// crates/pavilion-result/src/pipeline.rs
// ============================================================================
// Module: Result Pipeline
// Description: Orchestrates Phases A-D for every configured result key,
//              assembles the default keys every result carries, and applies
//              the reserved `result` key's pass/fail derivation.
// Purpose: The single entry point a completed run hands its working
//          directory to in order to get back a result JSON document.
// Dependencies: pavilion-core, serde_json
// ============================================================================

//! ## Overview
//! A key's failure (an unreadable glob target, a bad regex, an unresolved
//! `result_evaluate` reference) is recorded in the result's `errors` list
//! rather than aborting the run (§4.6): every other key still resolves.
//! `result` itself defaults to `return_value == 0` when no parser key and
//! no evaluated expression writes it explicitly.

use std::path::Path;

use pavilion_core::interfaces::Registry;
use pavilion_core::interfaces::ResultParser;
use serde_json::Map;
use serde_json::Value as Json;

use crate::action::Action;
use crate::action::apply as apply_action;
use crate::action::coerce_result_bool;
use crate::action::render_result;
use crate::aggregate::FileResult;
use crate::aggregate::PerFile;
use crate::aggregate::reduce as reduce_per_file;
use crate::error::KeyError;
use crate::evaluate::evaluate_against;
use crate::parser::MatchSelect;
use crate::window::WindowConfig;
use crate::window::select as select_window;

/// One result key's full parse configuration: where to look, which parser
/// capability to invoke, and how to select and store what it returns.
#[derive(Debug, Clone)]
pub struct KeyConfig {
    /// The file/line-window selection for this key.
    pub window: WindowConfig,
    /// The registered [`ResultParser`] capability name to invoke.
    pub parser_name: String,
    /// Arguments passed through to the parser capability.
    pub parser_args: Json,
    /// How to reduce a file's several matched-line results to one.
    pub match_select: MatchSelect,
    /// How to reduce several files' results to one.
    pub per_file: PerFile,
    /// How the reduced value is written into the result key.
    pub action: Action,
}

/// A `result_evaluate` key/expression pair, evaluated after every parser
/// key has resolved.
#[derive(Debug, Clone)]
pub struct EvaluateConfig {
    /// The result key the expression's value is stored under.
    pub key: String,
    /// The expression source, in the same syntax as template expressions.
    pub expression: String,
}

/// Runs every configured parser key and `result_evaluate` expression
/// against `working_dir`, starting from `base_keys` (the run's own default
/// keys: `name`, `id`, `created`, `started`, `finished`, `duration`,
/// `return_value`).
#[must_use]
pub fn run(
    working_dir: &Path,
    base_keys: Map<String, Json>,
    registry: &Registry<dyn ResultParser>,
    keys: &[(String, KeyConfig)],
    evaluate: &[EvaluateConfig],
) -> Map<String, Json> {
    let mut result = base_keys;
    let mut errors = Vec::new();

    for (name, cfg) in keys {
        match run_key(working_dir, cfg, registry) {
            Ok(value) => {
                result.insert(name.clone(), value);
            }
            Err(message) => errors.push(KeyError::new(name.clone(), message)),
        }
    }

    for cfg in evaluate {
        match evaluate_against(&cfg.expression, &result) {
            Ok(value) => {
                result.insert(cfg.key.clone(), value);
            }
            Err(err) => errors.push(KeyError::new(cfg.key.clone(), err.to_string())),
        }
    }

    finalize_result_key(&mut result);

    result.insert(
        "errors".to_string(),
        Json::Array(
            errors
                .iter()
                .map(|e| serde_json::json!({"key": e.key, "message": e.message}))
                .collect(),
        ),
    );
    result
}

fn run_key(working_dir: &Path, cfg: &KeyConfig, registry: &Registry<dyn ResultParser>) -> Result<Json, String> {
    let parser = registry.resolve(&cfg.parser_name).map_err(|err| err.to_string())?;
    let windows = select_window(&cfg.window, working_dir).map_err(|err| err.to_string())?;

    let mut file_results = Vec::with_capacity(windows.len());
    for window in windows {
        let Some(path) = window.path.as_ref() else {
            file_results.push(FileResult { file_name: window.file_name.clone(), value: Json::Null });
            continue;
        };
        let contents = window.lines.join("\n");
        let mut matches = Vec::with_capacity(window.matched_lines.len());
        for line in &window.matched_lines {
            let value = parser.parse(&contents, *line, &cfg.parser_args).map_err(|err| err.to_string())?;
            matches.push(value);
        }
        let match_count = matches.len();
        let reduced = cfg.match_select.apply(matches);
        let value = apply_action(cfg.action, match_count, reduced);
        let _ = path;
        file_results.push(FileResult { file_name: window.file_name.clone(), value });
    }

    Ok(reduce_per_file(cfg.per_file, &file_results))
}

/// Coerces whatever the `result` key holds (explicit parser output,
/// evaluated expression, or nothing at all) to its final boolean-derived
/// `PASS`/`FAIL` string, defaulting to `return_value == 0` when unset.
fn finalize_result_key(result: &mut Map<String, Json>) {
    let passed = result.get("result").map_or_else(
        || result.get("return_value").and_then(Json::as_i64).is_some_and(|rv| rv == 0),
        coerce_result_bool,
    );
    result.insert("result".to_string(), Json::String(render_result(passed).to_string()));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::ConstParser;
    use serde_json::json;
    use std::sync::Arc;

    fn registry_with_const() -> Registry<dyn ResultParser> {
        let mut registry = Registry::new();
        registry.register("const", 0, Arc::new(ConstParser) as Arc<dyn ResultParser>);
        registry
    }

    fn base(return_value: i64) -> Map<String, Json> {
        let mut map = Map::new();
        map.insert("name".to_string(), json!("test"));
        map.insert("return_value".to_string(), json!(return_value));
        map
    }

    #[test]
    fn result_defaults_to_pass_when_return_value_is_zero() {
        let dir = tempfile::tempdir().unwrap();
        let registry = registry_with_const();
        let result = run(dir.path(), base(0), &registry, &[], &[]);
        assert_eq!(result.get("result"), Some(&json!("PASS")));
    }

    #[test]
    fn result_defaults_to_fail_on_nonzero_return_value() {
        let dir = tempfile::tempdir().unwrap();
        let registry = registry_with_const();
        let result = run(dir.path(), base(1), &registry, &[], &[]);
        assert_eq!(result.get("result"), Some(&json!("FAIL")));
    }

    #[test]
    fn evaluate_runs_after_parser_keys_and_can_override_result() {
        let dir = tempfile::tempdir().unwrap();
        let registry = registry_with_const();
        let evaluate = vec![EvaluateConfig { key: "result".to_string(), expression: "1 == 1".to_string() }];
        let result = run(dir.path(), base(7), &registry, &[], &evaluate);
        assert_eq!(result.get("result"), Some(&json!("PASS")));
    }

    #[test]
    fn unresolvable_key_is_recorded_in_errors_without_aborting() {
        let dir = tempfile::tempdir().unwrap();
        let registry = registry_with_const();
        let evaluate = vec![EvaluateConfig { key: "derived".to_string(), expression: "missing + 1".to_string() }];
        let result = run(dir.path(), base(0), &registry, &[], &evaluate);
        assert_eq!(result.get("result"), Some(&json!("PASS")));
        let errors = result.get("errors").and_then(Json::as_array).unwrap();
        assert_eq!(errors.len(), 1);
    }
}
