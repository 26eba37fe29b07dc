// crates/pavilion-resolver/src/lib.rs
// ============================================================================
// Crate: pavilion-resolver
// Description: The Test Resolver: overlay, inheritance, permutation,
//              substitution, and skip-condition evaluation.
// Purpose: Turn one suite-map entry into its candidate Test-Run set, ready
//          for the build engine and scheduler abstraction.
// ============================================================================

//! # pavilion-resolver
//!
//! Implements the resolution order from the component design: overlay
//! configuration layers, expand `inherits_from` ([`inherit`]), expand
//! `permute_on` ([`permute`]), substitute scheduler-section fields first and
//! everything else after ([`resolve`], via [`pavilion_expr`]), then evaluate
//! `only_if`/`not_if` ([`skip`]).

pub mod error;
pub mod inherit;
pub mod overlay;
pub mod permute;
pub mod resolve;
pub mod skip;

pub use error::ResolverError;
pub use inherit::resolve_inheritance;
pub use overlay::ConfigLayer;
pub use overlay::merge_layer;
pub use overlay::overlay_chain;
pub use permute::expand_permutations;
pub use resolve::ExpressionFunctionRegistry;
pub use resolve::ResolvedRun;
pub use resolve::resolve_test;
pub use skip::should_skip;
