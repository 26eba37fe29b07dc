// crates/pavilion-expr/src/error.rs
// ============================================================================
// Module: Expression Engine Errors
// Description: Lexer, parser, and evaluator errors for the `{{ }}`/`[~ ~]`
//              reference syntax.
// Purpose: Carry byte-offset diagnostics through parsing, then translate
//          into the shared resolution error taxonomy at the crate seam.
// Dependencies: pavilion-core, thiserror
// ============================================================================

use thiserror::Error;

use pavilion_core::ResolutionError;

/// Errors raised while lexing, parsing, or evaluating a reference string.
///
/// # Invariants
/// - Every variant carries enough context to report a byte offset in the
///   original template string where applicable.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExprError {
    /// Unexpected character or token encountered during lexing/parsing.
    #[error("unexpected token `{found}` at {position}, expected {expected}")]
    UnexpectedToken {
        /// Human-readable expectation summary.
        expected: &'static str,
        /// The token actually found.
        found: String,
        /// Byte offset in the original input.
        position: usize,
    },
    /// Input ended before a complete expression was parsed.
    #[error("unexpected end of expression")]
    UnexpectedEof,
    /// Trailing input followed a complete expression.
    #[error("unexpected trailing input at {0}")]
    TrailingInput(usize),
    /// A numeric literal failed to parse.
    #[error("invalid number `{raw}` at {position}")]
    InvalidNumber {
        /// Raw numeric text.
        raw: String,
        /// Byte offset in the original input.
        position: usize,
    },
    /// An unknown expression function was called.
    #[error("unknown function `{0}`")]
    UnknownFunction(String),
    /// A function was called with the wrong number of arguments.
    #[error("function `{name}` expects {expected} argument(s), got {actual}")]
    ArityMismatch {
        /// Function name.
        name: String,
        /// Expected argument count.
        expected: usize,
        /// Actual argument count supplied.
        actual: usize,
    },
    /// An unknown variable reference.
    #[error("unknown variable reference: {0}")]
    UnknownReference(String),
    /// A mapping variable was referenced without a subkey.
    #[error("variable '{0}' is a mapping and requires a subkey")]
    MissingSubkey(String),
    /// A scalar variable was indexed or subkeyed as if it were a mapping.
    #[error("variable '{0}' is not a mapping")]
    NotAMapping(String),
    /// A scheduler-scope variable was referenced before dispatch.
    #[error("scheduler variable '{0}' cannot be used before dispatch")]
    SchedulerVariableBeforeDispatch(String),
    /// A deferred variable was referenced in a forbidden pre-dispatch context.
    #[error("deferred variable '{0}' used in a pre-dispatch context")]
    DeferredInForbiddenContext(String),
    /// Type mismatch during evaluation (e.g. arithmetic on a list pair).
    #[error("type mismatch: {0}")]
    TypeMismatch(String),
    /// List operands of unequal length in an element-wise operation.
    #[error("list arity mismatch: {left} vs {right}")]
    ListArityMismatch {
        /// Left operand length.
        left: usize,
        /// Right operand length.
        right: usize,
    },
    /// Division or modulus by zero.
    #[error("division by zero")]
    DivisionByZero,
    /// An unrecognized backslash escape sequence (§9: fail fast rather than
    /// silently pass it through).
    #[error("unknown escape sequence `\\{0}` at {1}")]
    UnknownEscape(char, usize),
    /// A nested iteration was found inside a string (explicitly rejected).
    #[error("nested iteration at {0} is not supported")]
    NestedIteration(usize),
    /// A format spec following `:` failed to apply to the evaluated value.
    #[error("invalid format spec `{0}`")]
    InvalidFormatSpec(String),
}

impl From<ExprError> for ResolutionError {
    fn from(err: ExprError) -> Self {
        match err {
            ExprError::UnknownReference(name) => Self::UnknownReference(name),
            ExprError::MissingSubkey(name) => Self::MissingSubkey(name),
            ExprError::SchedulerVariableBeforeDispatch(name) => {
                Self::SchedulerVariableBeforeDispatch(name)
            }
            ExprError::DivisionByZero => Self::DivisionByZero,
            ExprError::ListArityMismatch { left, right } => Self::ListArityMismatch { left, right },
            other => Self::TypeMismatch(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_into_core_resolution_error() {
        let err: ResolutionError = ExprError::DivisionByZero.into();
        assert!(matches!(err, ResolutionError::DivisionByZero));
    }
}
