// crates/pavilion-core/src/variable.rs
// ============================================================================
// Module: Pavilion Variable Store
// Description: Scoped variable storage backing the expression engine.
// Purpose: Hold the four named scopes and enforce same-shape and deferred
//          invariants independent of expression evaluation itself.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! A [`VariableStore`] holds four scopes — `var`, `sys`, `pav`, `sched` —
//! looked up in that order for an unqualified reference. Each [`Variable`] is
//! an ordered sequence of [`VarValue`]; within one variable every value must
//! share the same shape (all scalar, or all mapping with the same key set
//! shape), checked at insertion rather than at every lookup.

use std::collections::BTreeMap;
use std::fmt;

use serde::Deserialize;
use serde::Serialize;

use crate::error::ResolutionError;

/// The four variable scopes, searched in this order for an unqualified name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    /// User-supplied variables.
    Var,
    /// Host-provided variables.
    Sys,
    /// Process (Pavilion-internal) variables.
    Pav,
    /// Scheduler-provided variables, only valid after dispatch.
    Sched,
}

impl Scope {
    /// Scopes in unqualified lookup order.
    pub const LOOKUP_ORDER: [Self; 4] = [Self::Var, Self::Sys, Self::Pav, Self::Sched];

    /// Returns the lowercase scope name used in `scope.name` references.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Var => "var",
            Self::Sys => "sys",
            Self::Pav => "pav",
            Self::Sched => "sched",
        }
    }

    /// Parses a scope name, returning `None` for anything else (the caller
    /// then treats the first path segment as part of an unqualified name).
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "var" => Some(Self::Var),
            "sys" => Some(Self::Sys),
            "pav" => Some(Self::Pav),
            "sched" => Some(Self::Sched),
            _ => None,
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single value held by a variable: a bare string, or a mapping whose
/// values are either strings or an ordered sequence of strings (one level of
/// nesting, per the data model).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum VarValue {
    /// A scalar string value.
    Scalar(String),
    /// A mapping with unique keys, string or string-list values.
    Mapping(BTreeMap<String, MappingEntry>),
}

impl VarValue {
    /// Returns the shape discriminant used to enforce "every value in one
    /// variable has the same shape".
    fn shape(&self) -> Shape {
        match self {
            Self::Scalar(_) => Shape::Scalar,
            Self::Mapping(map) => Shape::Mapping(map.keys().cloned().collect()),
        }
    }
}

/// A mapping entry: either a string or an ordered sequence of strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MappingEntry {
    /// A single string value.
    Scalar(String),
    /// An ordered sequence of strings.
    List(Vec<String>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Shape {
    Scalar,
    Mapping(Vec<String>),
}

/// An ordered sequence of values under one name within one scope.
///
/// # Invariants
/// - Every element of `values` has the same [`Shape`] (enforced by
///   [`Variable::new`] / [`Variable::push`]).
/// - `expected` (the `?` suffix) and `appended` (the `+` suffix) reflect name
///   suffixes stripped before storage; the stored name never carries them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variable {
    values: Vec<VarValue>,
    /// Whether this variable was declared with the `?` (expected) suffix.
    pub expected: bool,
    /// Whether this variable was declared with the `+` (appended) suffix.
    pub appended: bool,
    /// Whether this is a deferred variable: resolution is postponed until
    /// after allocation. A deferred variable has at most one value and is
    /// forbidden in any field evaluated before dispatch.
    pub deferred: bool,
}

impl Variable {
    /// Creates a variable from a non-empty, same-shaped sequence of values.
    ///
    /// # Errors
    ///
    /// Returns [`ResolutionError::TypeMismatch`] if the values do not share a
    /// shape.
    pub fn new(values: Vec<VarValue>) -> Result<Self, ResolutionError> {
        let mut variable = Self {
            values: Vec::new(),
            expected: false,
            appended: false,
            deferred: false,
        };
        for value in values {
            variable.push(value)?;
        }
        Ok(variable)
    }

    /// Marks this variable deferred (sets [`Self::deferred`]); the caller is
    /// responsible for ensuring it carries at most one value.
    #[must_use]
    pub const fn into_deferred(mut self) -> Self {
        self.deferred = true;
        self
    }

    /// Appends a value, checking it matches the shape of existing values.
    ///
    /// # Errors
    ///
    /// Returns [`ResolutionError::TypeMismatch`] on a shape disagreement.
    pub fn push(&mut self, value: VarValue) -> Result<(), ResolutionError> {
        if let Some(first) = self.values.first()
            && first.shape() != value.shape()
        {
            return Err(ResolutionError::TypeMismatch(
                "all values of a variable must share the same shape".to_string(),
            ));
        }
        self.values.push(value);
        Ok(())
    }

    /// Returns the number of values (for iteration product computation).
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` when the variable holds no values.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Returns `true` when the variable holds more than one value (is
    /// "multi-valued", contributing to iteration and permutation products).
    #[must_use]
    pub fn is_multi_valued(&self) -> bool {
        self.values.len() > 1
    }

    /// Returns the value at `index`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&VarValue> {
        self.values.get(index)
    }

    /// Returns all values in order.
    #[must_use]
    pub fn values(&self) -> &[VarValue] {
        &self.values
    }
}

/// Holds every scope's variables for one resolution context.
///
/// # Invariants
/// - Lookup order for an unqualified name is [`Scope::LOOKUP_ORDER`].
#[derive(Debug, Clone, Default)]
pub struct VariableStore {
    scopes: BTreeMap<Scope, BTreeMap<String, Variable>>,
}

impl VariableStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a variable in the given scope.
    pub fn set(&mut self, scope: Scope, name: impl Into<String>, variable: Variable) {
        self.scopes.entry(scope).or_default().insert(name.into(), variable);
    }

    /// Looks up a variable in a specific scope.
    #[must_use]
    pub fn get_scoped(&self, scope: Scope, name: &str) -> Option<&Variable> {
        self.scopes.get(&scope).and_then(|vars| vars.get(name))
    }

    /// Looks up a variable by unqualified name, trying scopes in
    /// [`Scope::LOOKUP_ORDER`].
    ///
    /// # Errors
    ///
    /// Returns [`ResolutionError::UnknownReference`] if no scope has the name.
    pub fn lookup(&self, name: &str) -> Result<(Scope, &Variable), ResolutionError> {
        for scope in Scope::LOOKUP_ORDER {
            if let Some(variable) = self.get_scoped(scope, name) {
                return Ok((scope, variable));
            }
        }
        Err(ResolutionError::UnknownReference(name.to_string()))
    }

    /// Returns an iterator over every `(scope, name)` pair currently defined.
    pub fn names(&self) -> impl Iterator<Item = (Scope, &str)> {
        self.scopes
            .iter()
            .flat_map(|(scope, vars)| vars.keys().map(move |name| (*scope, name.as_str())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_mixed_shape_values() {
        let scalar = VarValue::Scalar("a".to_string());
        let mapping = VarValue::Mapping(BTreeMap::new());
        assert!(Variable::new(vec![scalar, mapping]).is_err());
    }

    #[test]
    fn lookup_order_prefers_var_over_sys() {
        let mut store = VariableStore::new();
        store.set(
            Scope::Sys,
            "host",
            Variable::new(vec![VarValue::Scalar("node01".to_string())]).unwrap(),
        );
        store.set(
            Scope::Var,
            "host",
            Variable::new(vec![VarValue::Scalar("overridden".to_string())]).unwrap(),
        );
        let (scope, variable) = store.lookup("host").unwrap();
        assert_eq!(scope, Scope::Var);
        assert_eq!(variable.get(0), Some(&VarValue::Scalar("overridden".to_string())));
    }

    #[test]
    fn multi_valued_detection() {
        let single = Variable::new(vec![VarValue::Scalar("a".to_string())]).unwrap();
        let multi = Variable::new(vec![
            VarValue::Scalar("a".to_string()),
            VarValue::Scalar("b".to_string()),
        ])
        .unwrap();
        assert!(!single.is_multi_valued());
        assert!(multi.is_multi_valued());
    }
}
