// crates/pavilion-expr/src/eval.rs
// ============================================================================
// Module: Expression Evaluator
// Description: Walks an `Expr` tree, resolving references against a variable
//              store and dispatching calls to registered functions.
// Purpose: Turn parsed syntax into a `Value`, the last step before a
//          template substitutes it back into source text.
// Dependencies: pavilion-core, crate::ast, crate::reference, crate::value
// ============================================================================

use std::cmp::Ordering;

use pavilion_core::ResolutionError;
use pavilion_core::interfaces::ExpressionFunction;
use pavilion_core::interfaces::Registry;

use crate::ast::BinOp;
use crate::ast::Expr;
use crate::error::ExprError;
use crate::reference::IterationBindings;
use crate::reference::parse_reference;
use crate::reference::resolve as resolve_reference;
use crate::reference::resolve_keys;
use crate::value::Value;

/// Evaluation context: the variable store, the active iteration index
/// bindings, and whether the expression sits in a pre-dispatch field.
pub struct EvalContext<'a> {
    /// The variable store expressions resolve references against.
    pub store: &'a pavilion_core::VariableStore,
    /// Current iteration bindings, for multi-valued variable resolution.
    pub bindings: &'a IterationBindings,
    /// Whether `sched.*` references and deferred variables are forbidden.
    pub pre_dispatch: bool,
    /// Registered expression functions, keyed by name.
    pub functions: &'a Registry<dyn ExpressionFunction>,
}

/// Evaluates a parsed expression tree to a [`Value`].
///
/// # Errors
///
/// Returns [`ExprError`] for any unresolved reference, unknown function,
/// arity mismatch, or type error encountered during evaluation.
pub fn evaluate(expr: &Expr, ctx: &EvalContext<'_>) -> Result<Value, ExprError> {
    match expr {
        Expr::Int(i) => Ok(Value::Int(*i)),
        Expr::Float(f) => Ok(Value::Float(*f)),
        Expr::Str(s) => Ok(Value::Str(s.clone())),
        Expr::Reference(raw) => {
            let parsed = parse_reference(raw)?;
            resolve_reference(ctx.store, ctx.bindings, &parsed, ctx.pre_dispatch)
        }
        Expr::Not(inner) => Ok(Value::Bool(!evaluate(inner, ctx)?.is_truthy())),
        Expr::Neg(inner) => negate(&evaluate(inner, ctx)?),
        Expr::Call(name, arg_exprs) if name == "keys" => evaluate_keys(arg_exprs, ctx),
        Expr::Call(name, arg_exprs) => evaluate_call(name, arg_exprs, ctx),
        Expr::BinOp(op, lhs, rhs) => evaluate_binop(*op, lhs, rhs, ctx),
    }
}

fn evaluate_keys(arg_exprs: &[Expr], ctx: &EvalContext<'_>) -> Result<Value, ExprError> {
    let [Expr::Reference(raw)] = arg_exprs else {
        return Err(ExprError::ArityMismatch {
            name: "keys".to_string(),
            expected: 1,
            actual: arg_exprs.len(),
        });
    };
    let parsed = parse_reference(raw)?;
    resolve_keys(ctx.store, ctx.bindings, &parsed)
}

fn evaluate_call(name: &str, arg_exprs: &[Expr], ctx: &EvalContext<'_>) -> Result<Value, ExprError> {
    let args = arg_exprs.iter().map(|e| evaluate(e, ctx)).collect::<Result<Vec<_>, _>>()?;
    let json_args: Vec<serde_json::Value> = args.iter().map(Value::to_json).collect();
    let function =
        ctx.functions.resolve(name).map_err(|_| ExprError::UnknownFunction(name.to_string()))?;
    let result = function.call(&json_args).map_err(|err: ResolutionError| {
        ExprError::TypeMismatch(err.to_string())
    })?;
    Ok(Value::from_json(&result))
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
    ctx: &EvalContext<'_>,
) -> Result<Value, ExprError> {
    if matches!(op, BinOp::And | BinOp::Or) {
        let left = evaluate(lhs, ctx)?;
        return match op {
            BinOp::And if !left.is_truthy() => Ok(left),
            BinOp::And => evaluate(rhs, ctx),
            BinOp::Or if left.is_truthy() => Ok(left),
            BinOp::Or => evaluate(rhs, ctx),
            _ => unreachable!("guarded by outer match"),
        };
    }

    let left = evaluate(lhs, ctx)?;
    let right = evaluate(rhs, ctx)?;
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
    use pavilion_core::Scope;
    use pavilion_core::VarValue;
    use pavilion_core::Variable;
    use pavilion_core::VariableStore;
    use crate::parser::parse;

    fn ctx<'a>(
        store: &'a VariableStore,
        bindings: &'a IterationBindings,
        functions: &'a Registry<dyn ExpressionFunction>,
    ) -> EvalContext<'a> {
        EvalContext { store, bindings, pre_dispatch: false, functions }
    }

    #[test]
    fn evaluates_arithmetic_over_references() {
        let mut store = VariableStore::new();
        store.set(Scope::Var, "x", Variable::new(vec![VarValue::Scalar("3".to_string())]).unwrap());
        store.set(Scope::Var, "y", Variable::new(vec![VarValue::Scalar("4".to_string())]).unwrap());
        let functions = Registry::new();
        let bindings = IterationBindings::new();
        let expr = parse("x + y * 2").unwrap();
        let value = evaluate(&expr, &ctx(&store, &bindings, &functions)).unwrap();
        assert_eq!(value, Value::Int(11));
    }

    #[test]
    fn short_circuits_and() {
        let store = VariableStore::new();
        let functions = Registry::new();
        let bindings = IterationBindings::new();
        let expr = parse("0 and (1 / 0)").unwrap();
        let value = evaluate(&expr, &ctx(&store, &bindings, &functions)).unwrap();
        assert_eq!(value, Value::Int(0));
    }

    #[test]
    fn comparison_yields_bool() {
        let store = VariableStore::new();
        let functions = Registry::new();
        let bindings = IterationBindings::new();
        let expr = parse("2 < 3").unwrap();
        let value = evaluate(&expr, &ctx(&store, &bindings, &functions)).unwrap();
        assert_eq!(value, Value::Bool(true));
    }

    #[test]
    fn keys_lists_mapping_subkeys() {
        let mut store = VariableStore::new();
        let mut mapping = std::collections::BTreeMap::new();
        mapping.insert(
            "cpus".to_string(),
            pavilion_core::variable::MappingEntry::Scalar("4".to_string()),
        );
        store.set(Scope::Var, "node", Variable::new(vec![VarValue::Mapping(mapping)]).unwrap());
        let functions = Registry::new();
        let bindings = IterationBindings::new();
        let expr = parse("keys(node)").unwrap();
        let value = evaluate(&expr, &ctx(&store, &bindings, &functions)).unwrap();
        assert_eq!(value, Value::List(vec![Value::Str("cpus".to_string())]));
    }
}
