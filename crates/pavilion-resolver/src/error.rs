// crates/pavilion-resolver/src/error.rs
// ============================================================================
// Module: Test Resolver Errors
// Description: Wraps the shared configuration/resolution error kinds with
//              resolver-specific context.
// Purpose: Let every resolver stage return one error type while still
//          classifying cleanly into pavilion_core::ErrorKind.
// Dependencies: pavilion-core, pavilion-expr, regex, thiserror
// ============================================================================

use thiserror::Error;

use pavilion_core::ConfigError;
use pavilion_core::ResolutionError;
use pavilion_expr::ExprError;

/// Errors raised while resolving one test spec into one or more test runs.
#[derive(Debug, Error)]
pub enum ResolverError {
    /// Configuration-stage failure (bad overlay, cyclic inheritance, ...).
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// Variable/expression resolution failure.
    #[error(transparent)]
    Resolution(#[from] ResolutionError),
    /// A regex in `only_if`/`not_if` failed to compile.
    #[error("invalid regex in {field}: {source}")]
    InvalidRegex {
        /// Field the pattern was attached to.
        field: String,
        /// Underlying regex compiler error text.
        source: String,
    },
}

impl From<ExprError> for ResolverError {
    fn from(err: ExprError) -> Self {
        Self::Resolution(err.into())
    }
}
