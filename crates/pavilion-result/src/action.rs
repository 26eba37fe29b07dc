// crates/pavilion-result/src/action.rs
// ============================================================================
// Module: Result Actions
// Description: Applies a parsed-and-aggregated value to a result key:
//              type auto-conversion (`store`), forced string/bool/count
//              variants, and the reserved `result` key's boolean coercion.
// Purpose: Turn Phase C's aggregated JSON value into the exact value the
//          result JSON stores under a key, per §4.6.
// Dependencies: serde_json
// ============================================================================

//! ## Overview
//! `store` auto-converts the way [`pavilion_expr::Value::parse_auto`] does
//! for plain variables: int, then float, then bool, then string, applied
//! only when the aggregated value itself is a string (a parser that
//! already returned a number or list passes through untouched). The
//! `result` key is always coerced to a boolean and rendered as `PASS`/`FAIL`
//! by the pipeline, never stored as a raw auto-converted scalar.

use serde_json::Value;

/// How an aggregated value should be written into a result key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Action {
    /// Auto-convert a string value to int, float, bool, or leave as string.
    #[default]
    Store,
    /// Always store as a string, skipping auto-conversion.
    StoreStr,
    /// Ignore the parsed value; store `true` if the key's file window
    /// produced at least one match.
    StoreTrue,
    /// Ignore the parsed value; store `false` if the key's file window
    /// produced at least one match (else leave the existing default).
    StoreFalse,
    /// Store the number of matched lines rather than a parsed value.
    Count,
}

impl Action {
    /// Parses an `action` configuration string, defaulting to [`Self::Store`].
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        match raw {
            "store_str" => Self::StoreStr,
            "store_true" => Self::StoreTrue,
            "store_false" => Self::StoreFalse,
            "count" => Self::Count,
            _ => Self::Store,
        }
    }
}

/// Auto-converts a string the way a plain Pavilion variable would: int,
/// then float, then bool (`True`/`False`), else left as a string.
#[must_use]
pub fn auto_convert(raw: &str) -> Value {
    if let Ok(i) = raw.parse::<i64>() {
        return Value::from(i);
    }
    if let Ok(f) = raw.parse::<f64>() {
        return Value::from(f);
    }
    match raw {
        "True" => return Value::Bool(true),
        "False" => return Value::Bool(false),
        _ => {}
    }
    Value::String(raw.to_string())
}

/// Applies `action` to an aggregated value and the number of matched
/// lines that produced it, returning the value to store under the key.
#[must_use]
pub fn apply(action: Action, matched_count: usize, aggregated: Value) -> Value {
    match action {
        Action::Store => match aggregated {
            Value::String(s) => auto_convert(&s),
            other => other,
        },
        Action::StoreStr => match aggregated {
            Value::String(s) => Value::String(s),
            other => Value::String(other.to_string()),
        },
        Action::StoreTrue => Value::Bool(matched_count > 0),
        Action::StoreFalse => Value::Bool(matched_count == 0),
        Action::Count => Value::from(matched_count as u64),
    }
}

/// Coerces any value into the `result` key's boolean, per the reserved
/// key's rules: booleans pass through, numeric zero is failure, an empty
/// or `"False"`/`"fail"`/`"no"` string is failure, everything else passes.
#[must_use]
pub fn coerce_result_bool(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_none_or(|f| f != 0.0),
        Value::String(s) => !matches!(s.as_str(), "" | "False" | "false" | "fail" | "no" | "0"),
        Value::Null => false,
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

/// Renders the `result` key's stored value as `PASS`/`FAIL`, the string
/// form every result JSON carries regardless of how the boolean was derived.
#[must_use]
pub fn render_result(passed: bool) -> &'static str {
    if passed { "PASS" } else { "FAIL" }
}
