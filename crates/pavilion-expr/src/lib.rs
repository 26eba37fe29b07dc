// crates/pavilion-expr/src/lib.rs
// ============================================================================
// Crate: pavilion-expr
// Description: The variable reference and expression engine: lexer, parser,
//              evaluator, and top-level template substitution.
// Purpose: Give the resolver, build engine, and result pipeline one shared
//          implementation of `{{ }}` expressions, `[~ ~]` iteration, and
//          reference syntax, independent of where a rendered string came
//          from.
// ============================================================================

//! # pavilion-expr
//!
//! Turns a configured string containing `{{ expr }}`, `[~ ... ~<sep>]`, and
//! backslash escapes into its fully substituted form, resolving references
//! against a [`pavilion_core::VariableStore`]. [`template::render`] is the
//! entry point most callers want; the lower-level [`lexer`], [`parser`],
//! [`ast`], [`eval`], and [`reference`] modules are exposed for the resolver,
//! which needs to evaluate `permute_on` and skip conditions directly against
//! parsed expressions rather than through full template substitution.

pub mod ast;
pub mod error;
pub mod eval;
pub mod lexer;
pub mod parser;
pub mod reference;
pub mod template;
pub mod value;

pub use ast::BinOp;
pub use ast::Expr;
pub use error::ExprError;
pub use eval::EvalContext;
pub use eval::evaluate;
pub use parser::parse;
pub use reference::IterationBindings;
pub use reference::ParsedReference;
pub use reference::PathSegment;
pub use reference::parse_reference;
pub use reference::resolve;
pub use reference::resolve_keys;
pub use template::render;
pub use value::Value;
