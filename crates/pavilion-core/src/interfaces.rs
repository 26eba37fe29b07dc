// crates/pavilion-core/src/interfaces.rs
// ============================================================================
// Module: Pavilion Capability Interfaces
// Description: The plugin capability traits (scheduler, result parser,
//              expression function, system variable, module wrapper) and the
//              generic capability registry every built-in and user plugin is
//              dispatched through.
// Purpose: Replace the source project's dynamic subclass discovery with
//          explicit, typed registration (design note in §9).
// Dependencies: thiserror
// ============================================================================

//! ## Overview
//! Each capability a plugin can provide is a small trait. [`Registry`] is the
//! generic, name-keyed, priority-ordered, access-policy-checked dispatch
//! table every capability kind is instantiated against — one monomorphized
//! registry per kind (schedulers, result parsers, expression functions,
//! system variables, module wrappers).

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;

use crate::error::BuildError;
use crate::error::ParseError;
use crate::error::ResolutionError;
use crate::error::SchedulerError;
use crate::ident::RunId;
use crate::job::JobHandle;
use crate::job::SchedulerStatus;
use crate::node::NodeInventory;
use crate::spec::ModuleAction;
use crate::variable::VarValue;

/// A basic scheduler capability: submit, poll, cancel, and report the
/// allocation's node list from inside the allocation.
pub trait Scheduler: Send + Sync {
    /// Stable capability name used as the registry key.
    fn name(&self) -> &str;

    /// Cheap probe: `true` if scheduler commands work on this host.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError`] if the probe itself fails to run.
    fn available(&self) -> Result<bool, SchedulerError>;

    /// Submits `script_path` to run against the requested allocation, on
    /// behalf of the given test runs (more than one only when job-shared).
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::SubmissionRejected`] on rejection.
    fn kickoff(&self, run_list: &[RunId], script_path: &Path) -> Result<JobHandle, SchedulerError>;

    /// Coarse mapping of the scheduler's native job state.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError`] if the poll itself fails.
    fn job_status(&self, handle: &JobHandle) -> Result<SchedulerStatus, SchedulerError>;

    /// Requests cancellation of a submitted job.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::CancelFailed`] on rejection.
    fn cancel(&self, handle: &JobHandle) -> Result<(), SchedulerError>;

    /// Returns the allocation's node list; valid only when called from
    /// inside the allocation.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError`] if called outside an allocation or if the
    /// underlying query fails.
    fn get_alloc_nodes(&self) -> Result<Vec<String>, SchedulerError>;
}

/// An advanced scheduler additionally exposes live node inventory.
pub trait AdvancedScheduler: Scheduler {
    /// Fetches the scheduler's raw, native-format inventory.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::InventoryFetch`] on failure.
    fn raw_node_data(&self) -> Result<Value, SchedulerError>;

    /// Normalizes raw inventory into Pavilion's node record shape.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError`] if the raw data cannot be normalized.
    fn normalize(&self, raw: &Value) -> Result<NodeInventory, SchedulerError>;
}

/// A result parser capability: positioned at a matched line, returns any
/// JSON-compatible value.
pub trait ResultParser: Send + Sync {
    /// Stable capability name used as the registry key.
    fn name(&self) -> &str;

    /// Parses starting at the matched line of `contents`, returning the
    /// matches selected according to the parser's own `match_select` policy.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError`] on an unreadable file or malformed result.
    fn parse(&self, contents: &str, matched_line: usize, args: &Value) -> Result<Value, ParseError>;
}

/// An expression function capability: `name(args...) -> value`.
pub trait ExpressionFunction: Send + Sync {
    /// Stable capability name used as the registry key.
    fn name(&self) -> &str;

    /// Calls the function with already-resolved positional arguments.
    ///
    /// # Errors
    ///
    /// Returns [`ResolutionError`] on arity or type mismatch.
    fn call(&self, args: &[Value]) -> Result<Value, ResolutionError>;
}

/// A system (`sys`-scope) variable capability.
pub trait SystemVariable: Send + Sync {
    /// Stable capability name used as the registry key.
    fn name(&self) -> &str;

    /// Whether this variable's value is only known post-dispatch.
    fn is_deferred(&self) -> bool {
        false
    }

    /// Retrieves the current value.
    ///
    /// # Errors
    ///
    /// Returns [`ResolutionError`] if retrieval fails.
    fn retrieve(&self) -> Result<VarValue, ResolutionError>;
}

/// A module-wrapper capability: generates the shell lines for one
/// load/unload/swap action, including its post-action verification line.
pub trait ModuleWrapper: Send + Sync {
    /// Stable capability name used as the registry key.
    fn name(&self) -> &str;

    /// Generates the shell lines implementing `action`.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError`] if the action cannot be represented.
    fn generate(&self, action: &ModuleAction) -> Result<Vec<String>, BuildError>;
}

/// A persistence capability for run state, so a future network-backed store
/// can report unavailability without changing callers.
pub trait RunStore: Send + Sync {
    /// Reports whether the store is currently reachable.
    ///
    /// # Errors
    ///
    /// Returns a [`crate::error::ConcurrencyError`] when the store cannot be
    /// reached; the default implementation always succeeds.
    fn readiness(&self) -> Result<(), crate::error::ConcurrencyError> {
        Ok(())
    }
}

/// Which plugin names a registry will dispatch to.
#[derive(Debug, Clone)]
pub enum AccessPolicy {
    /// Every registered name is dispatchable.
    AllowAll,
    /// Only the listed names are dispatchable.
    Allow(BTreeSet<String>),
    /// Every registered name except the listed ones is dispatchable.
    Deny(BTreeSet<String>),
}

impl AccessPolicy {
    fn permits(&self, name: &str) -> bool {
        match self {
            Self::AllowAll => true,
            Self::Allow(allowed) => allowed.contains(name),
            Self::Deny(denied) => !denied.contains(name),
        }
    }
}

/// Errors raised while resolving a capability from a [`Registry`].
#[derive(Debug, Error)]
pub enum RegistryError {
    /// No capability is registered under the requested name.
    #[error("no capability registered for '{0}'")]
    NotFound(String),
    /// The access policy denies dispatch to the requested name.
    #[error("access policy denies capability '{0}'")]
    Denied(String),
}

struct RegistryEntry<T: ?Sized> {
    priority: i32,
    capability: Arc<T>,
}

/// A name-keyed, priority-ordered, access-policy-checked capability
/// registry, generic over one capability trait.
///
/// # Invariants
/// - Registration is explicit: built-ins register at startup; user plugins
///   register after a filesystem scan of plugin directories (§9 design
///   note). No dynamic subclass discovery is performed.
/// - A later registration at the same name and equal-or-higher priority
///   overwrites an earlier one; a lower-priority registration is ignored.
pub struct Registry<T: ?Sized> {
    entries: BTreeMap<String, RegistryEntry<T>>,
    policy: AccessPolicy,
}

impl<T: ?Sized> Registry<T> {
    /// Creates an empty registry that allows every registered name.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
            policy: AccessPolicy::AllowAll,
        }
    }

    /// Creates an empty registry with an explicit access policy.
    #[must_use]
    pub fn with_policy(policy: AccessPolicy) -> Self {
        Self {
            entries: BTreeMap::new(),
            policy,
        }
    }

    /// Registers a capability under `name` at the given priority. A lower
    /// priority than an already-registered entry of the same name is a no-op.
    pub fn register(&mut self, name: impl Into<String>, priority: i32, capability: Arc<T>) {
        let name = name.into();
        let should_insert = self.entries.get(&name).is_none_or(|existing| priority >= existing.priority);
        if should_insert {
            self.entries.insert(name, RegistryEntry { priority, capability });
        }
    }

    /// Resolves a capability by name, subject to the registry's access policy.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Denied`] if the policy excludes `name`, or
    /// [`RegistryError::NotFound`] if nothing is registered under it.
    pub fn resolve(&self, name: &str) -> Result<Arc<T>, RegistryError> {
        if !self.policy.permits(name) {
            return Err(RegistryError::Denied(name.to_string()));
        }
        self.entries
            .get(name)
            .map(|entry| Arc::clone(&entry.capability))
            .ok_or_else(|| RegistryError::NotFound(name.to_string()))
    }

    /// Returns every registered name, regardless of access policy.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}

impl<T: ?Sized> Default for Registry<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    trait Greeter: Send + Sync {
        fn greet(&self) -> String;
    }

    struct Hello;
    impl Greeter for Hello {
        fn greet(&self) -> String {
            "hello".to_string()
        }
    }

    #[test]
    fn higher_priority_registration_wins() {
        struct Goodbye;
        impl Greeter for Goodbye {
            fn greet(&self) -> String {
                "goodbye".to_string()
            }
        }

        let mut registry: Registry<dyn Greeter> = Registry::new();
        registry.register("g", 0, Arc::new(Hello));
        registry.register("g", 10, Arc::new(Goodbye));
        registry.register("g", 5, Arc::new(Hello));
        assert_eq!(registry.resolve("g").unwrap().greet(), "goodbye");
    }

    #[test]
    fn deny_policy_blocks_dispatch() {
        let mut registry: Registry<dyn Greeter> =
            Registry::with_policy(AccessPolicy::Deny(BTreeSet::from(["g".to_string()])));
        registry.register("g", 0, Arc::new(Hello));
        assert!(matches!(registry.resolve("g"), Err(RegistryError::Denied(_))));
    }

    #[test]
    fn missing_capability_is_not_found() {
        let registry: Registry<dyn Greeter> = Registry::new();
        assert!(matches!(registry.resolve("missing"), Err(RegistryError::NotFound(_))));
    }
}
