// crates/pavilion-core/src/error.rs
// ============================================================================
// Module: Pavilion Core Errors
// Description: The error-kind taxonomy shared by every component boundary.
// Purpose: Translate every component failure into a stable kind plus a
//          terminal run state, never an uncaught exception.
// Dependencies: thiserror
// ============================================================================

//! ## Overview
//! One enum per error kind named in the error handling design, plus
//! [`ErrorKind`] which classifies any [`CoreError`] into the taxonomy used to
//! pick a terminal [`crate::state::RunStatus`] and an exit code.

use thiserror::Error;

/// Coarse error classification, independent of which component raised it.
///
/// # Invariants
/// - Stable for programmatic handling and exit-code mapping; do not reorder
///   variants in a way that changes their `Display` text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed suite, unknown key, invalid regex, cyclic inheritance,
    /// deferred variable used in a forbidden context.
    Configuration,
    /// Unresolved variable, empty expected variable, expression type mismatch.
    Resolution,
    /// Fetch failure, extraction failure, non-zero build script, stalled lock.
    Build,
    /// Submission rejected, cancel failed, inventory fetch failed.
    Scheduler,
    /// Run script exit status / `result_evaluate` disagreement.
    Runtime,
    /// Unreadable file, regex error, malformed parser return.
    Parse,
    /// Lock acquisition timeout, torn journal.
    Concurrency,
}

impl ErrorKind {
    /// Returns whether this kind always aborts only the single affected test
    /// run rather than the whole invocation.
    #[must_use]
    pub const fn is_test_scoped(self) -> bool {
        !matches!(self, Self::Concurrency)
    }
}

/// Errors raised while loading or validating configuration (suite, host,
/// mode layers) before resolution begins.
///
/// # Invariants
/// - Every variant maps to [`ErrorKind::Configuration`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A suite, host, or mode map failed schema validation.
    #[error("malformed configuration: {0}")]
    Malformed(String),
    /// A key was referenced that the schema does not recognize.
    #[error("unknown configuration key: {0}")]
    UnknownKey(String),
    /// A regex field failed to compile.
    #[error("invalid regex in {field}: {source}")]
    InvalidRegex {
        /// Name of the field containing the invalid pattern.
        field: String,
        /// Underlying regex compiler error.
        source: String,
    },
    /// `inherits_from` formed a cycle.
    #[error("cyclic inheritance detected: {0}")]
    CyclicInheritance(String),
    /// A deferred variable appeared in a field evaluated before dispatch.
    #[error("deferred variable '{0}' used in a pre-dispatch context")]
    DeferredInForbiddenContext(String),
}

/// Errors raised while resolving variables and expressions.
///
/// # Invariants
/// - Every variant maps to [`ErrorKind::Resolution`].
#[derive(Debug, Error)]
pub enum ResolutionError {
    /// No variable matched the given reference.
    #[error("unknown variable reference: {0}")]
    UnknownReference(String),
    /// A variable marked `?` (expected) had no value supplied by any layer.
    #[error("expected variable '{0}' was never supplied")]
    ExpectedVariableMissing(String),
    /// An expression mixed incompatible types.
    #[error("type mismatch evaluating expression: {0}")]
    TypeMismatch(String),
    /// A mapping variable was referenced without a subkey.
    #[error("variable '{0}' is a mapping and requires a subkey")]
    MissingSubkey(String),
    /// A scheduler-scope variable was referenced from permutation or skip context.
    #[error("scheduler variable '{0}' cannot be used before dispatch")]
    SchedulerVariableBeforeDispatch(String),
    /// Division by zero in an arithmetic expression.
    #[error("division by zero")]
    DivisionByZero,
    /// Two list operands of unequal length in an element-wise operation.
    #[error("list arity mismatch: {left} vs {right}")]
    ListArityMismatch {
        /// Left operand length.
        left: usize,
        /// Right operand length.
        right: usize,
    },
}

/// Errors raised by the build engine.
///
/// # Invariants
/// - Every variant maps to [`ErrorKind::Build`].
#[derive(Debug, Error)]
pub enum BuildError {
    /// Source acquisition (local copy or download) failed.
    #[error("source fetch failed: {0}")]
    Fetch(String),
    /// Archive extraction failed.
    #[error("source extraction failed: {0}")]
    Extraction(String),
    /// The build script exited non-zero.
    #[error("build script exited with status {0}")]
    ScriptFailed(i32),
    /// A held build lock was reclaimed after the holder stalled.
    #[error("build lock for '{0}' reclaimed after stall")]
    LockStallReclaimed(String),
    /// Underlying filesystem I/O failure.
    #[error("build i/o error: {0}")]
    Io(String),
}

/// Errors raised by a scheduler capability module.
///
/// # Invariants
/// - Every variant maps to [`ErrorKind::Scheduler`].
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// The scheduler rejected job submission.
    #[error("job submission rejected: {0}")]
    SubmissionRejected(String),
    /// The scheduler rejected a cancel request.
    #[error("cancel request failed: {0}")]
    CancelFailed(String),
    /// Fetching raw node inventory failed.
    #[error("inventory fetch failed: {0}")]
    InventoryFetch(String),
    /// The scheduler capability is unavailable on this host.
    #[error("scheduler unavailable: {0}")]
    Unavailable(String),
}

/// Errors raised while parsing result output.
///
/// # Invariants
/// - Every variant maps to [`ErrorKind::Parse`]; these are recorded into a
///   result's `errors` array rather than aborting the pipeline.
#[derive(Debug, Error)]
pub enum ParseError {
    /// A file referenced by a parser glob could not be read.
    #[error("unreadable file '{0}': {1}")]
    UnreadableFile(String, String),
    /// A `for_lines_matching` or `preceded_by` regex failed to compile.
    #[error("invalid parser regex: {0}")]
    InvalidRegex(String),
    /// A parser returned a value that could not be represented as JSON.
    #[error("malformed parser result: {0}")]
    MalformedResult(String),
}

/// Errors raised by cross-process coordination primitives.
///
/// # Invariants
/// - Every variant maps to [`ErrorKind::Concurrency`].
#[derive(Debug, Error)]
pub enum ConcurrencyError {
    /// Lock acquisition exceeded the configured timeout without reclaiming.
    #[error("lock acquisition timed out after {0}s")]
    LockTimeout(u64),
    /// The status journal contained a record that failed to parse cleanly.
    #[error("torn status journal entry: {0}")]
    TornJournal(String),
}

/// The union of every component error kind, used at crate seams that must
/// return one error type regardless of which subsystem failed.
///
/// # Invariants
/// - `kind()` always agrees with the variant's documented [`ErrorKind`].
#[derive(Debug, Error)]
pub enum CoreError {
    /// Configuration-stage failure.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// Resolution-stage failure.
    #[error(transparent)]
    Resolution(#[from] ResolutionError),
    /// Build-stage failure.
    #[error(transparent)]
    Build(#[from] BuildError),
    /// Scheduler-stage failure.
    #[error(transparent)]
    Scheduler(#[from] SchedulerError),
    /// Parse-stage failure.
    #[error(transparent)]
    Parse(#[from] ParseError),
    /// Concurrency-stage failure.
    #[error(transparent)]
    Concurrency(#[from] ConcurrencyError),
}

impl CoreError {
    /// Classifies this error into the coarse taxonomy.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Config(_) => ErrorKind::Configuration,
            Self::Resolution(_) => ErrorKind::Resolution,
            Self::Build(_) => ErrorKind::Build,
            Self::Scheduler(_) => ErrorKind::Scheduler,
            Self::Parse(_) => ErrorKind::Parse,
            Self::Concurrency(_) => ErrorKind::Concurrency,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_mapping_is_stable() {
        let err = CoreError::from(ResolutionError::DivisionByZero);
        assert_eq!(err.kind(), ErrorKind::Resolution);
    }

    #[test]
    fn concurrency_errors_are_not_test_scoped() {
        assert!(!ErrorKind::Concurrency.is_test_scoped());
        assert!(ErrorKind::Build.is_test_scoped());
    }
}
