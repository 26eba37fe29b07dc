// crates/pavilion-orchestrator/src/lib.rs
// ============================================================================
// Crate: pavilion-orchestrator
// Description: The Run Directory & State Machine persistence layer (§4.4)
//              and the Worker-Pool Orchestrator (§4.7): series lifecycle,
//              a bounded thread pool, and cancellation propagation.
// Purpose: Give every Pavilion process on every host the same crash-safe
//          view of run and series progress, coordinated purely through the
//          shared working directory.
// ============================================================================

//! # pavilion-orchestrator
//!
//! [`rundir`] is the on-disk layout: the append-only status journal and the
//! atomic `RUN_COMPLETE` marker are the only cross-host coordination
//! channel a run needs. [`pool`] is the in-process bounded worker pool that
//! executes resolution, build, and dispatch work items independently.
//! [`series`] layers lazy repeat generation and completion detection over
//! `pavilion_core::Series`. [`cancel`] implements idempotent run- and
//! series-level cancellation.

pub mod cancel;
pub mod error;
pub mod pool;
pub mod rundir;
pub mod series;

pub use cancel::cancel_run;
pub use error::OrchestratorError;
pub use pool::WorkerPool;
pub use rundir::RunPaths;
pub use series::RepeatPlan;
pub use series::begin_next_repeat;
pub use series::mark_complete_if_finished;
pub use series::record_runs;
