// crates/pavilion-result/src/evaluate.rs
// ============================================================================
// Module: Result Evaluation
// Description: Phase D of the result pipeline: `result_evaluate` key/
//              expression pairs, evaluated against the result JSON built so
//              far rather than the run's `VariableStore`.
// Purpose: Let a suite derive new result keys (`speedup`, `efficiency`, a
//          composite `result`) from earlier parse/aggregate output, keeping
//          native JSON types (ints, floats, lists) instead of flattening
//          everything to strings.
// Dependencies: pavilion-expr, serde_json
// ============================================================================

//! ## Overview
//! [`pavilion_expr::parser::parse`] builds the same [`Expr`] tree template
//! expressions use, but [`pavilion_expr::eval::evaluate`] is hard-wired to
//! resolve references against a [`pavilion_core::VariableStore`], whose
//! [`pavilion_core::VarValue`] is string-only and cannot represent a list or
//! nested object a parser already produced. This module walks the same tree
//! with its own small evaluator that resolves references directly against
//! the result JSON map, using [`Value::from_json`]/[`Value::to_json`] as the
//! type bridge so arithmetic and comparisons reuse `pavilion-expr`'s numeric
//! and list semantics untouched.

use std::cmp::Ordering;

use pavilion_expr::Expr;
use pavilion_expr::ExprError;
use pavilion_expr::PathSegment;
use pavilion_expr::Value;
use pavilion_expr::ast::BinOp;
use pavilion_expr::parse;
use pavilion_expr::parse_reference;
use serde_json::Value as Json;
use serde_json::Map;

/// Evaluates a `result_evaluate` expression string against the result JSON
/// built so far.
///
/// # Errors
///
/// Returns [`ExprError`] for a syntax error, an unknown reference, or a
/// type mismatch (e.g. adding a string to a list).
pub fn evaluate_against(expression: &str, result: &Map<String, Json>) -> Result<Json, ExprError> {
    let expr = parse(expression)?;
    let value = evaluate(&expr, result)?;
    Ok(value.to_json())
}

fn evaluate(expr: &Expr, result: &Map<String, Json>) -> Result<Value, ExprError> {
    match expr {
        Expr::Int(i) => Ok(Value::Int(*i)),
        Expr::Float(f) => Ok(Value::Float(*f)),
        Expr::Str(s) => Ok(Value::Str(s.clone())),
        Expr::Reference(raw) => resolve_json_reference(raw, result),
        Expr::Not(inner) => Ok(Value::Bool(!evaluate(inner, result)?.is_truthy())),
        Expr::Neg(inner) => negate(&evaluate(inner, result)?),
        Expr::Call(name, _) => Err(ExprError::UnknownFunction(name.clone())),
        Expr::BinOp(op, lhs, rhs) => evaluate_binop(*op, lhs, rhs, result),
    }
}

fn resolve_json_reference(raw: &str, result: &Map<String, Json>) -> Result<Value, ExprError> {
    let parsed = parse_reference(raw)?;
    let mut current = result
        .get(&parsed.name)
        .ok_or_else(|| ExprError::UnknownReference(parsed.name.clone()))?
        .clone();

    let mut segments = parsed.path.iter().peekable();
    while let Some(segment) = segments.next() {
        current = match segment {
            PathSegment::Key(key) => current
                .get(key)
                .cloned()
                .ok_or_else(|| ExprError::MissingSubkey(format!("{}.{key}", parsed.name)))?,
            PathSegment::Index(index) => current
                .get(index)
                .cloned()
                .ok_or_else(|| ExprError::UnknownReference(format!("{}.{index}", parsed.name)))?,
            PathSegment::Wildcard => {
                let Some(PathSegment::Key(subkey)) = segments.next() else {
                    return Err(ExprError::UnexpectedToken {
                        expected: "a subkey after the wildcard",
                        found: parsed.name.clone(),
                        position: 0,
                    });
                };
                let Json::Array(items) = current else {
                    return Err(ExprError::NotAMapping(parsed.name.clone()));
                };
                let collected: Result<Vec<Json>, ExprError> = items
                    .iter()
                    .map(|item| {
                        item.get(subkey)
                            .cloned()
                            .ok_or_else(|| ExprError::UnknownReference(format!("{}.*.{subkey}", parsed.name)))
                    })
                    .collect();
                Json::Array(collected?)
            }
        };
    }
    Ok(Value::from_json(&current))
}

fn negate(value: &Value) -> Result<Value, ExprError> {
    match value {
        Value::Int(i) => Ok(Value::Int(-i)),
        Value::Float(f) => Ok(Value::Float(-f)),
        Value::Bool(b) => Ok(Value::Int(-i64::from(*b))),
        Value::List(items) => Ok(Value::List(items.iter().map(negate).collect::<Result<_, _>>()?)),
        Value::Str(_) => Err(ExprError::TypeMismatch("cannot negate a string".to_string())),
    }
}

fn evaluate_binop(
    op: BinOp,
    lhs: &Expr,
    rhs: &Expr,
    result: &Map<String, Json>,
) -> Result<Value, ExprError> {
    if matches!(op, BinOp::And | BinOp::Or) {
        let left = evaluate(lhs, result)?;
        return match op {
            BinOp::And if !left.is_truthy() => Ok(left),
            BinOp::And => evaluate(rhs, result),
            BinOp::Or if left.is_truthy() => Ok(left),
            BinOp::Or => evaluate(rhs, result),
            _ => unreachable!("guarded by outer match"),
        };
    }

    let left = evaluate(lhs, result)?;
    let right = evaluate(rhs, result)?;
    match op {
        BinOp::Add => left.add(&right),
        BinOp::Sub => left.sub(&right),
        BinOp::Mul => left.mul(&right),
        BinOp::TrueDiv => left.true_div(&right),
        BinOp::FloorDiv => left.floor_div(&right),
        BinOp::Mod => left.modulo(&right),
        BinOp::Pow => left.pow(&right),
        BinOp::Eq => Ok(Value::Bool(left.compare(&right).map(|o| o == Ordering::Equal).unwrap_or(false))),
        BinOp::Ne => Ok(Value::Bool(left.compare(&right).map(|o| o != Ordering::Equal).unwrap_or(true))),
        BinOp::Lt => left.compare(&right).map(|o| Value::Bool(o == Ordering::Less)),
        BinOp::Le => left.compare(&right).map(|o| Value::Bool(o != Ordering::Greater)),
        BinOp::Gt => left.compare(&right).map(|o| Value::Bool(o == Ordering::Greater)),
        BinOp::Ge => left.compare(&right).map(|o| Value::Bool(o != Ordering::Less)),
        BinOp::And | BinOp::Or => unreachable!("handled above"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn result_map(pairs: &[(&str, Json)]) -> Map<String, Json> {
        pairs.iter().map(|(k, v)| ((*k).to_string(), v.clone())).collect()
    }

    #[test]
    fn arithmetic_over_prior_keys_preserves_numeric_type() {
        let result = result_map(&[("before", json!(10)), ("after", json!(4))]);
        let value = evaluate_against("before / after", &result).unwrap();
        assert_eq!(value, json!(2.5));
    }

    #[test]
    fn list_reference_stays_a_list() {
        let result = result_map(&[("samples", json!([1, 2, 3]))]);
        let value = evaluate_against("samples", &result).unwrap();
        assert_eq!(value, json!([1, 2, 3]));
    }

    #[test]
    fn nested_key_reference_descends_into_object() {
        let result = result_map(&[("node", json!({"cpus": 4}))]);
        let value = evaluate_against("node.cpus", &result).unwrap();
        assert_eq!(value, json!(4));
    }

    #[test]
    fn unknown_reference_is_an_error() {
        let result = result_map(&[]);
        let err = evaluate_against("missing", &result).unwrap_err();
        assert!(matches!(err, ExprError::UnknownReference(_)));
    }

    #[test]
    fn comparison_composes_into_boolean_result_key() {
        let result = result_map(&[("passes", json!(5)), ("total", json!(5))]);
        let value = evaluate_against("passes == total", &result).unwrap();
        assert_eq!(value, json!(true));
    }
}
