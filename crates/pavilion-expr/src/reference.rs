// crates/pavilion-expr/src/reference.rs
// ============================================================================
// Module: Variable Reference Resolution
// Description: Parses and resolves `name`, `scope.name`, `name.index`,
//              `name.subkey`, `scope.name.index.subkey`, and the wildcard
//              `a.*.b` reference forms against a variable store.
// Purpose: Give the evaluator one place that understands reference syntax,
//          independent of expression arithmetic.
// Dependencies: pavilion-core, crate::error, crate::value
// ============================================================================

//! ## Overview
//! A reference is lexed as one dotted run (see [`crate::lexer`]) and parsed
//! here into a [`ParsedReference`]. Resolution walks the variable store
//! using the documented scope precedence, then the remaining dotted
//! segments descend into mapping values or select by index, with the
//! wildcard form (`a.*.b`) collecting the named sub-entry of every element.

use std::collections::BTreeMap;

use pavilion_core::Scope;
use pavilion_core::VarValue;
use pavilion_core::Variable;
use pavilion_core::VariableStore;
use pavilion_core::variable::MappingEntry;

use crate::error::ExprError;
use crate::value::Value;

/// Per-iteration index bindings: variable name to the value index the
/// enclosing iteration body has currently selected for it.
pub type IterationBindings = BTreeMap<String, usize>;

/// A parsed reference: optional explicit scope, the variable name, and the
/// remaining dotted path segments (indices, subkeys, or `*`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedReference {
    /// Explicit scope, if the reference began with `var.`/`sys.`/`pav.`/`sched.`.
    pub scope: Option<Scope>,
    /// The variable name.
    pub name: String,
    /// Remaining path segments after the name.
    pub path: Vec<PathSegment>,
}

/// One segment of a reference path after the variable name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    /// A numeric index into a multi-valued variable.
    Index(usize),
    /// A mapping subkey.
    Key(String),
    /// The wildcard `*`, collecting the named sub-entry of every element.
    Wildcard,
}

/// Parses a raw dotted reference string (as produced by the lexer).
///
/// # Errors
///
/// Returns [`ExprError::UnexpectedToken`] if the reference is malformed
/// (e.g. an empty segment).
pub fn parse_reference(raw: &str) -> Result<ParsedReference, ExprError> {
    let mut segments = raw.split('.');
    let first = segments.next().ok_or_else(|| ExprError::UnexpectedToken {
        expected: "a variable reference",
        found: raw.to_string(),
        position: 0,
    })?;

    let (scope, name, rest_start): (Option<Scope>, &str, Option<&str>) =
        if let Some(scope) = Scope::parse(first) {
            match segments.next() {
                Some(name) => (Some(scope), name, None),
                None => {
                    return Err(ExprError::UnexpectedToken {
                        expected: "a variable name after the scope",
                        found: raw.to_string(),
                        position: 0,
                    });
                }
            }
        } else {
            (None, first, None)
        };
    let _ = rest_start;

    let mut path = Vec::new();
    for segment in segments {
        if segment.is_empty() {
            return Err(ExprError::UnexpectedToken {
                expected: "a non-empty path segment",
                found: raw.to_string(),
                position: 0,
            });
        }
        if segment == "*" {
            path.push(PathSegment::Wildcard);
        } else if let Ok(index) = segment.parse::<usize>() {
            path.push(PathSegment::Index(index));
        } else {
            path.push(PathSegment::Key(segment.to_string()));
        }
    }

    Ok(ParsedReference { scope, name: name.to_string(), path })
}

fn mapping_entry_to_value(entry: &MappingEntry) -> Value {
    match entry {
        MappingEntry::Scalar(s) => Value::parse_auto(s),
        MappingEntry::List(items) => Value::List(items.iter().map(|s| Value::parse_auto(s)).collect()),
    }
}

fn var_value_to_value(value: &VarValue) -> Value {
    match value {
        VarValue::Scalar(s) => Value::parse_auto(s),
        VarValue::Mapping(_) => {
            // A bare mapping reference without a subkey is a resolver error,
            // caught before this point; this fallback only protects `keys()`
            // or other full-mapping consumers working a level up.
            Value::Str(String::new())
        }
    }
}

/// Selects a single value out of `variable`, consulting `bindings` for a
/// multi-valued variable's currently iterated index.
fn select_value<'v>(
    name: &str,
    variable: &'v Variable,
    bindings: &IterationBindings,
) -> Result<&'v VarValue, ExprError> {
    if variable.len() == 1 {
        return variable.get(0).ok_or_else(|| ExprError::UnknownReference(name.to_string()));
    }
    let index = bindings
        .get(name)
        .copied()
        .ok_or_else(|| ExprError::UnknownReference(format!("{name} (multi-valued, not indexed)")))?;
    variable.get(index).ok_or_else(|| ExprError::UnknownReference(name.to_string()))
}

/// Resolves a parsed reference against a variable store.
///
/// # Errors
///
/// Returns [`ExprError::UnknownReference`] if no scope has the name,
/// [`ExprError::MissingSubkey`] if a mapping is referenced without a
/// subkey, [`ExprError::SchedulerVariableBeforeDispatch`] if a `sched.`
/// variable is referenced while `pre_dispatch` is set, and
/// [`ExprError::DeferredInForbiddenContext`] if a deferred variable is used
/// while `pre_dispatch` is set.
pub fn resolve(
    store: &VariableStore,
    bindings: &IterationBindings,
    reference: &ParsedReference,
    pre_dispatch: bool,
) -> Result<Value, ExprError> {
    let variable = match reference.scope {
        Some(scope) => store
            .get_scoped(scope, &reference.name)
            .ok_or_else(|| ExprError::UnknownReference(reference.name.clone()))?,
        None => {
            let (scope, variable) = store
                .lookup(&reference.name)
                .map_err(|_| ExprError::UnknownReference(reference.name.clone()))?;
            if pre_dispatch && scope == Scope::Sched {
                return Err(ExprError::SchedulerVariableBeforeDispatch(reference.name.clone()));
            }
            variable
        }
    };

    if pre_dispatch && variable.deferred {
        return Err(ExprError::DeferredInForbiddenContext(reference.name.clone()));
    }
    if pre_dispatch && reference.scope == Some(Scope::Sched) {
        return Err(ExprError::SchedulerVariableBeforeDispatch(reference.name.clone()));
    }

    if reference.path.first() == Some(&PathSegment::Wildcard) {
        return resolve_wildcard(&reference.name, variable, &reference.path[1 ..]);
    }

    let (index_consumed, base) = match reference.path.first() {
        Some(PathSegment::Index(i)) => {
            (true, variable.get(*i).ok_or_else(|| ExprError::UnknownReference(reference.name.clone()))?)
        }
        _ => (false, select_value(&reference.name, variable, bindings)?),
    };

    let remaining = if index_consumed { &reference.path[1 ..] } else { &reference.path[..] };
    descend(&reference.name, base, remaining)
}

fn descend(name: &str, value: &VarValue, path: &[PathSegment]) -> Result<Value, ExprError> {
    match (value, path.first()) {
        (VarValue::Scalar(_), None) => Ok(var_value_to_value(value)),
        (VarValue::Scalar(_), Some(_)) => Err(ExprError::NotAMapping(name.to_string())),
        (VarValue::Mapping(_), None) => Err(ExprError::MissingSubkey(name.to_string())),
        (VarValue::Mapping(map), Some(PathSegment::Key(key))) => {
            let entry = map.get(key).ok_or_else(|| ExprError::UnknownReference(format!("{name}.{key}")))?;
            if path.len() > 1 {
                return Err(ExprError::NotAMapping(format!("{name}.{key}")));
            }
            Ok(mapping_entry_to_value(entry))
        }
        (VarValue::Mapping(_), Some(PathSegment::Index(_) | PathSegment::Wildcard)) => {
            Err(ExprError::MissingSubkey(name.to_string()))
        }
    }
}

/// Resolves the `keys(x)` function: `x` must be a reference to a mapping
/// variable with no trailing path, and the result is the sorted list of its
/// subkeys.
///
/// # Errors
///
/// Returns [`ExprError::NotAMapping`] if the referenced variable (at the
/// bound index) is a scalar.
pub fn resolve_keys(
    store: &VariableStore,
    bindings: &IterationBindings,
    reference: &ParsedReference,
) -> Result<Value, ExprError> {
    let variable = match reference.scope {
        Some(scope) => store
            .get_scoped(scope, &reference.name)
            .ok_or_else(|| ExprError::UnknownReference(reference.name.clone()))?,
        None => store.lookup(&reference.name).map(|(_, v)| v).map_err(|_| ExprError::UnknownReference(reference.name.clone()))?,
    };
    let base = select_value(&reference.name, variable, bindings)?;
    match base {
        VarValue::Mapping(map) => {
            Ok(Value::List(map.keys().map(|k| Value::Str(k.clone())).collect()))
        }
        VarValue::Scalar(_) => Err(ExprError::NotAMapping(reference.name.clone())),
    }
}

fn resolve_wildcard(name: &str, variable: &Variable, rest: &[PathSegment]) -> Result<Value, ExprError> {
    let Some(PathSegment::Key(subkey)) = rest.first() else {
        return Err(ExprError::UnexpectedToken {
            expected: "a subkey after the wildcard",
            found: name.to_string(),
            position: 0,
        });
    };
    let mut results = Vec::with_capacity(variable.len());
    for value in variable.values() {
        let VarValue::Mapping(map) = value else {
            return Err(ExprError::NotAMapping(name.to_string()));
        };
        let entry = map.get(subkey).ok_or_else(|| ExprError::UnknownReference(format!("{name}.*.{subkey}")))?;
        results.push(mapping_entry_to_value(entry));
    }
    Ok(Value::List(results))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pavilion_core::VarValue;

    #[test]
    fn parses_scope_name_index_subkey() {
        let parsed = parse_reference("sys.node.0.cpus").unwrap();
        assert_eq!(parsed.scope, Some(Scope::Sys));
        assert_eq!(parsed.name, "node");
        assert_eq!(parsed.path, vec![PathSegment::Index(0), PathSegment::Key("cpus".to_string())]);
    }

    #[test]
    fn parses_wildcard_form() {
        let parsed = parse_reference("a.*.b").unwrap();
        assert_eq!(parsed.path, vec![PathSegment::Wildcard, PathSegment::Key("b".to_string())]);
    }

    #[test]
    fn resolves_unqualified_scalar() {
        let mut store = VariableStore::new();
        store.set(Scope::Var, "x", Variable::new(vec![VarValue::Scalar("42".to_string())]).unwrap());
        let parsed = parse_reference("x").unwrap();
        let value = resolve(&store, &IterationBindings::new(), &parsed, false).unwrap();
        assert_eq!(value, Value::Int(42));
    }

    #[test]
    fn rejects_scheduler_scope_before_dispatch() {
        let mut store = VariableStore::new();
        store.set(
            Scope::Sched,
            "launch",
            Variable::new(vec![VarValue::Scalar("srun".to_string())]).unwrap(),
        );
        let parsed = parse_reference("sched.launch").unwrap();
        let err = resolve(&store, &IterationBindings::new(), &parsed, true).unwrap_err();
        assert!(matches!(err, ExprError::SchedulerVariableBeforeDispatch(_)));
    }

    #[test]
    fn wildcard_collects_subkey_across_values() {
        let mut store = VariableStore::new();
        let mut first = BTreeMap::new();
        first.insert("b".to_string(), MappingEntry::Scalar("1".to_string()));
        let mut second = BTreeMap::new();
        second.insert("b".to_string(), MappingEntry::Scalar("2".to_string()));
        store.set(
            Scope::Var,
            "a",
            Variable::new(vec![VarValue::Mapping(first), VarValue::Mapping(second)]).unwrap(),
        );
        let parsed = parse_reference("a.*.b").unwrap();
        let value = resolve(&store, &IterationBindings::new(), &parsed, false).unwrap();
        assert_eq!(value, Value::List(vec![Value::Int(1), Value::Int(2)]));
    }
}
