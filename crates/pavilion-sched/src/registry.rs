// crates/pavilion-sched/src/registry.rs
// ============================================================================
// Module: Scheduler Registry
// Description: Routes scheduler plugins by name, basic and advanced alike.
// Purpose: Let the worker-pool orchestrator resolve the scheduler a test's
//          `schedule` section names without knowing its concrete type.
// Dependencies: pavilion-core
// ============================================================================

//! ## Overview
//! Two registries exist side by side: [`SchedulerRegistry`] holds every
//! scheduler by its basic capability, [`AdvancedSchedulerRegistry`] holds
//! only the subset that also implements node inventory. A plugin offering
//! both registers itself in both registries under the same name.

use std::sync::Arc;

use pavilion_core::interfaces::AdvancedScheduler;
use pavilion_core::interfaces::Registry;
use pavilion_core::interfaces::Scheduler;

use crate::raw::RawScheduler;
use crate::slurm::SlurmScheduler;

/// Registry of basic scheduler capabilities, keyed by scheduler name.
pub type SchedulerRegistry = Registry<dyn Scheduler>;

/// Registry of advanced scheduler capabilities (live node inventory), keyed
/// by scheduler name.
pub type AdvancedSchedulerRegistry = Registry<dyn AdvancedScheduler>;

/// Builds a [`SchedulerRegistry`] with the bundled `raw` and `slurm`
/// schedulers registered under their own names.
///
/// # Errors
///
/// Returns an error only if determining the local hostname fails.
pub fn with_builtin_schedulers() -> Result<SchedulerRegistry, pavilion_core::SchedulerError> {
    let mut registry = SchedulerRegistry::new();
    let raw = RawScheduler::new()?;
    registry.register("raw", 0, Arc::new(raw) as Arc<dyn Scheduler>);
    let slurm = SlurmScheduler::new()?;
    registry.register("slurm", 0, Arc::new(slurm) as Arc<dyn Scheduler>);
    Ok(registry)
}

/// Builds an [`AdvancedSchedulerRegistry`] with the bundled `slurm`
/// scheduler registered under its own name. `raw` has no live inventory to
/// report and is absent from this registry.
///
/// # Errors
///
/// Returns an error only if determining the local hostname fails.
pub fn with_builtin_advanced_schedulers() -> Result<AdvancedSchedulerRegistry, pavilion_core::SchedulerError> {
    let mut registry = AdvancedSchedulerRegistry::new();
    let slurm = SlurmScheduler::new()?;
    registry.register("slurm", 0, Arc::new(slurm) as Arc<dyn AdvancedScheduler>);
    Ok(registry)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_scheduler_resolves_by_name() {
        let registry = with_builtin_schedulers().unwrap();
        let scheduler = registry.resolve("raw").unwrap();
        assert_eq!(scheduler.name(), "raw");
    }

    #[test]
    fn slurm_scheduler_resolves_in_both_registries() {
        let basic = with_builtin_schedulers().unwrap();
        assert_eq!(basic.resolve("slurm").unwrap().name(), "slurm");
        let advanced = with_builtin_advanced_schedulers().unwrap();
        assert_eq!(advanced.resolve("slurm").unwrap().name(), "slurm");
    }
}
