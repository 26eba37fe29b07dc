// crates/pavilion-core/src/lib.rs
// ============================================================================
// Crate: pavilion-core
// Description: The shared data model and capability interfaces for the
//              Pavilion test-lifecycle engine.
// Purpose: Give every other workspace crate one vocabulary for identifiers,
//          variables, specs, runs, builds, jobs, nodes, series, state, and
//          the plugin capability traits, without depending on any one
//          subsystem's algorithms.
// ============================================================================

//! # pavilion-core
//!
//! Data model and capability interfaces shared across the Pavilion
//! workspace. Downstream crates (`pavilion-expr`, `pavilion-resolver`,
//! `pavilion-build`, `pavilion-sched`, `pavilion-result`,
//! `pavilion-orchestrator`, `pavilion-config`, `pavilion-cli`) depend on
//! this crate for identifiers, the variable store, the suite/test spec
//! shape, the run state machine, and the plugin traits; this crate never
//! depends back on them.

pub mod build_artifact;
pub mod error;
pub mod ident;
pub mod interfaces;
pub mod job;
pub mod node;
pub mod series;
pub mod spec;
pub mod state;
pub mod testrun;
pub mod time;
pub mod variable;

pub use build_artifact::BuildArtifact;
pub use build_artifact::BuildArtifactState;
pub use error::ConcurrencyError;
pub use error::ConfigError;
pub use error::CoreError;
pub use error::ErrorKind;
pub use error::ParseError;
pub use error::ResolutionError;
pub use error::SchedulerError;
pub use ident::BuildHash;
pub use ident::ChunkId;
pub use ident::Label;
pub use ident::RunId;
pub use ident::SeriesId;
pub use ident::TestName;
pub use job::Job;
pub use job::JobHandle;
pub use job::SchedulerStatus;
pub use node::Chunk;
pub use node::NodeInventory;
pub use node::NodeRecord;
pub use node::NodeState;
pub use series::Series;
pub use series::SeriesStatus;
pub use series::TestSetDef;
pub use spec::BuildSpec;
pub use spec::ScheduleSpec;
pub use spec::SuiteMap;
pub use spec::TestSpec;
pub use state::RunState;
pub use state::StatusEntry;
pub use state::StatusJournal;
pub use testrun::TestRun;
pub use variable::Scope;
pub use variable::VarValue;
pub use variable::Variable;
pub use variable::VariableStore;
