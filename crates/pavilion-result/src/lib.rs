// crates/pavilion-result/src/lib.rs
// ============================================================================
// Crate: pavilion-result
// Description: The Result Pipeline: turns a finished run's log output into
//              its result JSON document.
// Purpose: Carry line-window selection, parsing, per-file aggregation, and
//          expression evaluation under one dependency-ordered pipeline so
//          the orchestrator only ever calls `pipeline::run`.
// ============================================================================

//! # pavilion-result
//!
//! Four phases, run in order for every configured result key:
//! [`window`] selects the candidate lines a parser should see,
//! [`parser`] dispatches the built-in `regex`/`split`/`const`/`table`
//! capabilities and reduces a file's several matches via `match_select`,
//! [`aggregate`] reduces several files' results into the one value stored
//! under the key, and [`evaluate`] runs `result_evaluate` expressions
//! against the keys assembled so far. [`action`] governs how a reduced
//! value lands in the result JSON, and [`pipeline::run`] is the entry
//! point that wires all four phases together and assembles the reserved
//! `result`/`errors` keys.

pub mod action;
pub mod aggregate;
pub mod error;
pub mod evaluate;
pub mod parser;
pub mod pipeline;
pub mod window;

pub use action::Action;
pub use aggregate::PerFile;
pub use error::KeyError;
pub use error::PipelineError;
pub use parser::ConstParser;
pub use parser::MatchSelect;
pub use parser::RegexParser;
pub use parser::SplitParser;
pub use parser::TableParser;
pub use pipeline::EvaluateConfig;
pub use pipeline::KeyConfig;
pub use pipeline::run;
pub use window::FileWindow;
pub use window::WindowConfig;

use std::sync::Arc;

use pavilion_core::interfaces::Registry;
use pavilion_core::interfaces::ResultParser;

/// Builds a parser registry pre-populated with the `regex`, `split`,
/// `const`, and `table` built-ins every suite can name without a plugin.
#[must_use]
pub fn with_builtin_parsers() -> Registry<dyn ResultParser> {
    let mut registry = Registry::new();
    registry.register("regex", 0, Arc::new(RegexParser) as Arc<dyn ResultParser>);
    registry.register("split", 0, Arc::new(SplitParser) as Arc<dyn ResultParser>);
    registry.register("const", 0, Arc::new(ConstParser) as Arc<dyn ResultParser>);
    registry.register("table", 0, Arc::new(TableParser) as Arc<dyn ResultParser>);
    registry
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_registry_resolves_every_parser_by_name() {
        let registry = with_builtin_parsers();
        for name in ["regex", "split", "const", "table"] {
            assert!(registry.resolve(name).is_ok(), "{name} should resolve");
        }
    }
}
