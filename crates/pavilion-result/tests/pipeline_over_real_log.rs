// crates/pavilion-result/tests/pipeline_over_real_log.rs
// ============================================================================
// Module: Result Pipeline Over a Real Log File Integration
// Description: Runs the full window-select/parse/aggregate/action chain
//              against an actual run log on disk, not the `ConstParser`
//              fixture the pipeline's own unit tests use.
// Purpose: Confirm glob resolution, candidate-line matching, a real parser
//          capability, and the reserved `result`/`errors` keys compose
//          correctly end to end.
// ============================================================================

//! ## Overview
//! The pipeline's own tests exercise `result`/`errors` bookkeeping with a
//! parser that ignores file content entirely. This instead writes a
//! `run.log` under a temp working directory and drives [`pavilion_result::pipeline::run`]
//! with [`pavilion_result::parser::RegexParser`] through a real window
//! selection and `Store` auto-conversion.

#![allow(clippy::unwrap_used, reason = "Test-only panic-based assertions are permitted.")]

use std::fs;
use std::sync::Arc;

use pavilion_core::interfaces::Registry;
use pavilion_core::interfaces::ResultParser;
use pavilion_result::action::Action;
use pavilion_result::aggregate::PerFile;
use pavilion_result::parser::MatchSelect;
use pavilion_result::parser::RegexParser;
use pavilion_result::pipeline::EvaluateConfig;
use pavilion_result::pipeline::KeyConfig;
use pavilion_result::pipeline::run;
use pavilion_result::window::WindowConfig;
use serde_json::Map;
use serde_json::Value as Json;
use serde_json::json;

fn registry() -> Registry<dyn ResultParser> {
    let mut registry = Registry::new();
    registry.register("regex", 0, Arc::new(RegexParser) as Arc<dyn ResultParser>);
    registry
}

fn base_keys(return_value: i64) -> Map<String, Json> {
    let mut map = Map::new();
    map.insert("name".to_string(), json!("perf_test"));
    map.insert("return_value".to_string(), json!(return_value));
    map
}

#[test]
fn regex_key_parses_real_log_and_feeds_into_result_evaluation() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("run.log"),
        "starting run\nscore: 97\ndone\n",
    )
    .unwrap();

    let window = WindowConfig {
        files: vec!["run.log".to_string()],
        for_lines_matching: Some(r"^score:".to_string()),
        preceded_by: Vec::new(),
    };
    let keys = vec![(
        "score".to_string(),
        KeyConfig {
            window,
            parser_name: "regex".to_string(),
            parser_args: json!({"regex": r"score: (\d+)"}),
            match_select: MatchSelect::First,
            per_file: PerFile::First,
            action: Action::Store,
        },
    )];
    let evaluate = vec![EvaluateConfig { key: "result".to_string(), expression: "score > 90".to_string() }];

    let result = run(dir.path(), base_keys(0), &registry(), &keys, &evaluate);

    assert_eq!(result.get("score"), Some(&json!(97)));
    assert_eq!(result.get("result"), Some(&json!("PASS")));
    assert_eq!(result.get("errors"), Some(&json!([])));
}

#[test]
fn unmatched_glob_records_error_but_still_defaults_result() {
    let dir = tempfile::tempdir().unwrap();

    let window = WindowConfig { files: vec!["missing-*.log".to_string()], ..WindowConfig::default() };
    let keys = vec![(
        "absent".to_string(),
        KeyConfig {
            window,
            parser_name: "nonexistent".to_string(),
            parser_args: Json::Null,
            match_select: MatchSelect::First,
            per_file: PerFile::First,
            action: Action::Store,
        },
    )];

    let result = run(dir.path(), base_keys(0), &registry(), &keys, &[]);

    assert_eq!(result.get("result"), Some(&json!("PASS")));
    let errors = result.get("errors").and_then(Json::as_array).unwrap();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].get("key"), Some(&json!("absent")));
}
