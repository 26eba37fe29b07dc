// crates/pavilion-expr/src/value.rs
// ============================================================================
// Module: Expression Values
// Description: The dynamically-typed value expressions evaluate to, with
//              the numeric auto-conversion and element-wise arithmetic rules.
// Purpose: Give the evaluator and the per-file result aggregator one shared
//          runtime value shape.
// Dependencies: serde_json
// ============================================================================

//! ## Overview
//! Every expression operand and result is a [`Value`]. A bare string is
//! auto-converted to integer, then float, then boolean (`True`/`False`),
//! else left as a string — the order fixed by the reference syntax rules.
//! List operands combine element-wise against another list of equal length,
//! or are distributed against a scalar.

use std::fmt;

use serde_json::Number;
use serde_json::Value as JsonValue;

use crate::error::ExprError;

/// A value produced or consumed by expression evaluation.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// A 64-bit signed integer.
    Int(i64),
    /// A 64-bit float.
    Float(f64),
    /// A boolean.
    Bool(bool),
    /// A string, the fallback when no numeric or boolean conversion applies.
    Str(String),
    /// An ordered list of values (from a multi-valued variable reference).
    List(Vec<Value>),
}

impl Value {
    /// Parses a raw string using the fixed auto-conversion order: integer,
    /// then float, then boolean (`True`/`False`), else string.
    #[must_use]
    pub fn parse_auto(raw: &str) -> Self {
        if let Ok(i) = raw.parse::<i64>() {
            return Self::Int(i);
        }
        if let Ok(f) = raw.parse::<f64>() {
            return Self::Float(f);
        }
        match raw {
            "True" => return Self::Bool(true),
            "False" => return Self::Bool(false),
            _ => {}
        }
        Self::Str(raw.to_string())
    }

    /// Returns this value's truthiness, used by logical operators.
    #[must_use]
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Int(i) => *i != 0,
            Self::Float(f) => *f != 0.0,
            Self::Bool(b) => *b,
            Self::Str(s) => !s.is_empty(),
            Self::List(items) => !items.is_empty(),
        }
    }

    /// Returns this value as an `f64`, for mixed-type arithmetic.
    fn as_f64(&self) -> Result<f64, ExprError> {
        match self {
            Self::Int(i) => Ok(*i as f64),
            Self::Float(f) => Ok(*f),
            Self::Bool(b) => Ok(f64::from(*b)),
            Self::Str(_) | Self::List(_) => {
                Err(ExprError::TypeMismatch("expected a number".to_string()))
            }
        }
    }

    /// Applies a scalar binary arithmetic/comparison operator element-wise
    /// when either operand is a list: list-to-list requires equal length;
    /// list-to-scalar distributes the scalar.
    ///
    /// # Errors
    ///
    /// Returns [`ExprError::ListArityMismatch`] for unequal-length lists, or
    /// whatever `op` itself returns for non-list operands.
    pub fn zip_with(
        left: &Self,
        right: &Self,
        op: impl Fn(&Self, &Self) -> Result<Self, ExprError> + Copy,
    ) -> Result<Self, ExprError> {
        match (left, right) {
            (Self::List(lhs), Self::List(rhs)) => {
                if lhs.len() != rhs.len() {
                    return Err(ExprError::ListArityMismatch {
                        left: lhs.len(),
                        right: rhs.len(),
                    });
                }
                let items = lhs
                    .iter()
                    .zip(rhs.iter())
                    .map(|(l, r)| Self::zip_with(l, r, op))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Self::List(items))
            }
            (Self::List(lhs), scalar) => {
                let items =
                    lhs.iter().map(|l| Self::zip_with(l, scalar, op)).collect::<Result<Vec<_>, _>>()?;
                Ok(Self::List(items))
            }
            (scalar, Self::List(rhs)) => {
                let items =
                    rhs.iter().map(|r| Self::zip_with(scalar, r, op)).collect::<Result<Vec<_>, _>>()?;
                Ok(Self::List(items))
            }
            (lhs, rhs) => op(lhs, rhs),
        }
    }

    /// Arithmetic addition, scalar or element-wise.
    ///
    /// # Errors
    ///
    /// Returns [`ExprError::TypeMismatch`] on non-numeric, non-list operands,
    /// or [`ExprError::ListArityMismatch`] on mismatched list lengths.
    pub fn add(&self, other: &Self) -> Result<Self, ExprError> {
        Self::zip_with(self, other, |a, b| match (a, b) {
            (Self::Int(x), Self::Int(y)) => Ok(Self::Int(x + y)),
            (Self::Str(x), Self::Str(y)) => Ok(Self::Str(format!("{x}{y}"))),
            _ => Ok(Self::Float(a.as_f64()? + b.as_f64()?)),
        })
    }

    /// Arithmetic subtraction, scalar or element-wise.
    ///
    /// # Errors
    ///
    /// Returns [`ExprError::TypeMismatch`] on non-numeric, non-list operands,
    /// or [`ExprError::ListArityMismatch`] on mismatched list lengths.
    pub fn sub(&self, other: &Self) -> Result<Self, ExprError> {
        Self::zip_with(self, other, |a, b| match (a, b) {
            (Self::Int(x), Self::Int(y)) => Ok(Self::Int(x - y)),
            _ => Ok(Self::Float(a.as_f64()? - b.as_f64()?)),
        })
    }

    /// Arithmetic multiplication, scalar or element-wise.
    ///
    /// # Errors
    ///
    /// Returns [`ExprError::TypeMismatch`] on non-numeric, non-list operands,
    /// or [`ExprError::ListArityMismatch`] on mismatched list lengths.
    pub fn mul(&self, other: &Self) -> Result<Self, ExprError> {
        Self::zip_with(self, other, |a, b| match (a, b) {
            (Self::Int(x), Self::Int(y)) => Ok(Self::Int(x * y)),
            _ => Ok(Self::Float(a.as_f64()? * b.as_f64()?)),
        })
    }

    /// True division, scalar or element-wise; always yields a float.
    ///
    /// # Errors
    ///
    /// Returns [`ExprError::DivisionByZero`] on a zero divisor.
    pub fn true_div(&self, other: &Self) -> Result<Self, ExprError> {
        Self::zip_with(self, other, |a, b| {
            let divisor = b.as_f64()?;
            if divisor == 0.0 {
                return Err(ExprError::DivisionByZero);
            }
            Ok(Self::Float(a.as_f64()? / divisor))
        })
    }

    /// Floor division, scalar or element-wise; integer if both operands are
    /// integers, float otherwise.
    ///
    /// # Errors
    ///
    /// Returns [`ExprError::DivisionByZero`] on a zero divisor.
    pub fn floor_div(&self, other: &Self) -> Result<Self, ExprError> {
        Self::zip_with(self, other, |a, b| match (a, b) {
            (Self::Int(x), Self::Int(y)) => {
                if *y == 0 {
                    return Err(ExprError::DivisionByZero);
                }
                Ok(Self::Int(x.div_euclid(*y)))
            }
            _ => {
                let divisor = b.as_f64()?;
                if divisor == 0.0 {
                    return Err(ExprError::DivisionByZero);
                }
                Ok(Self::Float((a.as_f64()? / divisor).floor()))
            }
        })
    }

    /// Modulus, scalar or element-wise.
    ///
    /// # Errors
    ///
    /// Returns [`ExprError::DivisionByZero`] on a zero divisor.
    pub fn modulo(&self, other: &Self) -> Result<Self, ExprError> {
        Self::zip_with(self, other, |a, b| match (a, b) {
            (Self::Int(x), Self::Int(y)) => {
                if *y == 0 {
                    return Err(ExprError::DivisionByZero);
                }
                Ok(Self::Int(x.rem_euclid(*y)))
            }
            _ => {
                let divisor = b.as_f64()?;
                if divisor == 0.0 {
                    return Err(ExprError::DivisionByZero);
                }
                Ok(Self::Float(a.as_f64()?.rem_euclid(divisor)))
            }
        })
    }

    /// Exponentiation, scalar or element-wise.
    ///
    /// # Errors
    ///
    /// Returns [`ExprError::TypeMismatch`] on non-numeric operands.
    pub fn pow(&self, other: &Self) -> Result<Self, ExprError> {
        Self::zip_with(self, other, |a, b| match (a, b) {
            (Self::Int(x), Self::Int(y)) if *y >= 0 => {
                Ok(Self::Int(x.pow(u32::try_from(*y).unwrap_or(u32::MAX))))
            }
            _ => Ok(Self::Float(a.as_f64()?.powf(b.as_f64()?))),
        })
    }

    /// Three-way comparison used by relational operators; numeric values
    /// compare by magnitude, strings lexicographically, booleans as 0/1.
    ///
    /// # Errors
    ///
    /// Returns [`ExprError::TypeMismatch`] if the operands are not
    /// comparable (a list on either side).
    pub fn compare(&self, other: &Self) -> Result<std::cmp::Ordering, ExprError> {
        match (self, other) {
            (Self::Str(a), Self::Str(b)) => Ok(a.cmp(b)),
            (Self::List(_), _) | (_, Self::List(_)) => {
                Err(ExprError::TypeMismatch("cannot compare lists directly".to_string()))
            }
            _ => {
                let a = self.as_f64()?;
                let b = other.as_f64()?;
                a.partial_cmp(&b).ok_or_else(|| ExprError::TypeMismatch("NaN comparison".to_string()))
            }
        }
    }

    /// Converts to a `serde_json::Value`, preserving native type (used by
    /// the result evaluate phase, which does not coerce to strings).
    #[must_use]
    pub fn to_json(&self) -> JsonValue {
        match self {
            Self::Int(i) => JsonValue::Number((*i).into()),
            Self::Float(f) => {
                Number::from_f64(*f).map_or(JsonValue::Null, JsonValue::Number)
            }
            Self::Bool(b) => JsonValue::Bool(*b),
            Self::Str(s) => JsonValue::String(s.clone()),
            Self::List(items) => JsonValue::Array(items.iter().map(Self::to_json).collect()),
        }
    }

    /// Converts from a `serde_json::Value` (e.g. a registered function's
    /// return value), collapsing anything outside this type's range to a
    /// string via its JSON text form.
    #[must_use]
    pub fn from_json(value: &JsonValue) -> Self {
        match value {
            JsonValue::Bool(b) => Self::Bool(*b),
            JsonValue::Number(n) => {
                n.as_i64().map_or_else(|| Self::Float(n.as_f64().unwrap_or(0.0)), Self::Int)
            }
            JsonValue::String(s) => Self::Str(s.clone()),
            JsonValue::Array(items) => Self::List(items.iter().map(Self::from_json).collect()),
            JsonValue::Null | JsonValue::Object(_) => Self::Str(value.to_string()),
        }
    }

    /// Renders the value for substitution at the end of expression
    /// evaluation, which always produces a string.
    #[must_use]
    pub fn render(&self) -> String {
        match self {
            Self::Int(i) => i.to_string(),
            Self::Float(f) => f.to_string(),
            Self::Bool(b) => if *b { "True" } else { "False" }.to_string(),
            Self::Str(s) => s.clone(),
            Self::List(items) => items.iter().map(Self::render).collect::<Vec<_>>().join(","),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auto_conversion_order() {
        assert_eq!(Value::parse_auto("42"), Value::Int(42));
        assert_eq!(Value::parse_auto("3.5"), Value::Float(3.5));
        assert_eq!(Value::parse_auto("True"), Value::Bool(true));
        assert_eq!(Value::parse_auto("hello"), Value::Str("hello".to_string()));
    }

    #[test]
    fn list_to_scalar_distributes() {
        let list = Value::List(vec![Value::Int(1), Value::Int(2), Value::Int(3)]);
        let result = list.add(&Value::Int(10)).unwrap();
        assert_eq!(result, Value::List(vec![Value::Int(11), Value::Int(12), Value::Int(13)]));
    }

    #[test]
    fn list_arity_mismatch_is_rejected() {
        let a = Value::List(vec![Value::Int(1), Value::Int(2)]);
        let b = Value::List(vec![Value::Int(1)]);
        assert!(matches!(a.add(&b), Err(ExprError::ListArityMismatch { .. })));
    }

    #[test]
    fn division_by_zero_is_rejected() {
        assert!(matches!(Value::Int(4).true_div(&Value::Int(0)), Err(ExprError::DivisionByZero)));
    }
}
