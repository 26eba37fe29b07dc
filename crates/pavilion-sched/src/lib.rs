// crates/pavilion-sched/src/lib.rs
// ============================================================================
// Crate: pavilion-sched
// Description: The Scheduler Abstraction: node filtering and chunking,
//              kickoff script composition, job sharing, and a bundled
//              `raw` scheduler for hosts with no HPC resource manager.
// Purpose: Give every scheduler plugin the same capability surface so the
//          orchestrator never branches on which one is configured.
// ============================================================================

//! # pavilion-sched
//!
//! Carves a filtered node inventory into deterministic chunks
//! ([`chunk`]), composes and runs kickoff scripts ([`kickoff`]), groups
//! runs with identical dispatch parameters into shared jobs ([`sharing`]),
//! and routes scheduler plugins by name ([`registry`]). [`raw::RawScheduler`]
//! is the bundled local-subprocess scheduler; [`slurm::SlurmScheduler`] is
//! the bundled advanced, inventory-backed one.

pub mod chunk;
pub mod error;
pub mod kickoff;
pub mod raw;
pub mod registry;
pub mod sharing;
pub mod slurm;

pub use chunk::carve;
pub use error::SchedEngineError;
pub use kickoff::HeaderComposer;
pub use kickoff::ShebangHeader;
pub use raw::RawScheduler;
pub use registry::AdvancedSchedulerRegistry;
pub use registry::SchedulerRegistry;
pub use registry::with_builtin_schedulers;
pub use slurm::SlurmScheduler;
