// crates/pavilion-result/src/aggregate.rs
// ============================================================================
// Module: Per-File Aggregation
// Description: Phase C of the result pipeline: reduces one key's per-file
//              values (from Phase B) down to the single JSON value stored
//              under that key, and normalizes file names for the
//              `per_file` nested-mapping case.
// Purpose: Give `all`/`any`/`list`/`name`-family actions their defined
//          reduction over however many files a glob matched.
// Dependencies: serde_json
// ============================================================================

//! ## Overview
//! A file's value counts as *empty* when Phase B produced [`Value::Null`]
//! or an empty string; everything else counts as present for `any`/`all`.
//! `name`/`fullname` variants report which file(s) contributed rather than
//! the parsed value itself.

use serde_json::Value;
use serde_json::json;

/// One file's contribution to a key: its (possibly sentinel) name and the
/// value Phase B produced for it.
#[derive(Debug, Clone)]
pub struct FileResult {
    /// Base file name, or the `_unmatched_glob` sentinel.
    pub file_name: String,
    /// The value [`MatchSelect::apply`](crate::parser::MatchSelect::apply) produced for this file.
    pub value: Value,
}

/// The per-file reduction strategy for a result key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PerFile {
    /// The first file's value.
    #[default]
    First,
    /// The last file's value.
    Last,
    /// Every file's value, nested under its (normalized) file name.
    All,
    /// True if any file's value is non-empty.
    Any,
    /// Every non-empty value, as a flat list.
    List,
    /// The (normalized) name of the first non-empty file.
    Name,
    /// The full path of the first non-empty file.
    Fullname,
    /// The (normalized) names of every non-empty file, as a list.
    NameList,
    /// The full paths of every non-empty file, as a list.
    FullnameList,
}

impl PerFile {
    /// Parses a `per_file` configuration string, defaulting to [`Self::First`].
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        match raw {
            "last" => Self::Last,
            "all" => Self::All,
            "any" => Self::Any,
            "list" => Self::List,
            "name" => Self::Name,
            "fullname" => Self::Fullname,
            "name_list" => Self::NameList,
            "fullname_list" => Self::FullnameList,
            _ => Self::First,
        }
    }
}

/// True when a file's contributed value should count as present for
/// `any`/`all`/name-family reductions.
fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(s) => !s.is_empty(),
        _ => true,
    }
}

/// Normalizes a file name for use as a JSON object key: non-alphanumeric
/// runs collapse to a single underscore, and `result` is rejected since
/// it would shadow the reserved top-level key.
#[must_use]
pub fn normalize_file_key(file_name: &str) -> String {
    let mut normalized = String::with_capacity(file_name.len());
    let mut last_was_sep = false;
    for ch in file_name.chars() {
        if ch.is_alphanumeric() {
            normalized.push(ch);
            last_was_sep = false;
        } else if !last_was_sep {
            normalized.push('_');
            last_was_sep = true;
        }
    }
    let normalized = normalized.trim_matches('_').to_string();
    if normalized.is_empty() || normalized == "result" { format!("{normalized}_file") } else { normalized }
}

/// Assigns unique keys to a set of normalized file names, suffixing
/// collisions with `_2`, `_3`, and so on in encounter order.
#[must_use]
pub fn unique_keys(file_names: &[String]) -> Vec<String> {
    let mut seen: std::collections::HashMap<String, usize> = std::collections::HashMap::new();
    file_names
        .iter()
        .map(|name| {
            let base = normalize_file_key(name);
            let count = seen.entry(base.clone()).or_insert(0);
            *count += 1;
            if *count == 1 { base } else { format!("{base}_{count}") }
        })
        .collect()
}

/// Reduces `results` (one entry per glob-matched file) to the single value
/// stored under a result key, per `mode`.
#[must_use]
pub fn reduce(mode: PerFile, results: &[FileResult]) -> Value {
    match mode {
        PerFile::First => results.first().map_or(Value::Null, |r| r.value.clone()),
        PerFile::Last => results.last().map_or(Value::Null, |r| r.value.clone()),
        PerFile::All => {
            let names = unique_keys(&results.iter().map(|r| r.file_name.clone()).collect::<Vec<_>>());
            let map: serde_json::Map<String, Value> =
                names.into_iter().zip(results.iter().map(|r| r.value.clone())).collect();
            json!(map)
        }
        PerFile::Any => json!(results.iter().any(|r| is_present(&r.value))),
        PerFile::List => json!(results.iter().map(|r| r.value.clone()).collect::<Vec<_>>()),
        PerFile::Name => results
            .iter()
            .find(|r| is_present(&r.value))
            .map_or(Value::Null, |r| Value::String(normalize_file_key(&r.file_name))),
        PerFile::Fullname => results
            .iter()
            .find(|r| is_present(&r.value))
            .map_or(Value::Null, |r| Value::String(r.file_name.clone())),
        PerFile::NameList => json!(
            results
                .iter()
                .filter(|r| is_present(&r.value))
                .map(|r| normalize_file_key(&r.file_name))
                .collect::<Vec<_>>()
        ),
        PerFile::FullnameList => json!(
            results.iter().filter(|r| is_present(&r.value)).map(|r| r.file_name.clone()).collect::<Vec<_>>()
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(name: &str, value: Value) -> FileResult {
        FileResult { file_name: name.to_string(), value }
    }

    #[test]
    fn any_is_true_when_one_file_matched() {
        let results = vec![file("a.log", Value::Null), file("b.log", json!("hit"))];
        assert_eq!(reduce(PerFile::Any, &results), json!(true));
    }

    #[test]
    fn any_is_false_when_all_empty() {
        let results = vec![file("a.log", Value::Null), file("b.log", json!(""))];
        assert_eq!(reduce(PerFile::Any, &results), json!(false));
    }

    #[test]
    fn list_preserves_every_value_in_order() {
        let results = vec![file("a.log", json!(1)), file("b.log", json!(2))];
        assert_eq!(reduce(PerFile::List, &results), json!([1, 2]));
    }

    #[test]
    fn name_list_skips_empty_files() {
        let results = vec![file("a.log", Value::Null), file("b.log", json!("hit"))];
        assert_eq!(reduce(PerFile::NameList, &results), json!(["b_log"]));
    }

    #[test]
    fn normalize_rejects_reserved_result_key() {
        assert_eq!(normalize_file_key("result"), "result_file");
    }

    #[test]
    fn unique_keys_suffix_collisions() {
        let keys = unique_keys(&["a.log".to_string(), "a-log".to_string(), "a.log".to_string()]);
        assert_eq!(keys, vec!["a_log".to_string(), "a_log_2".to_string(), "a_log_3".to_string()]);
    }
}
