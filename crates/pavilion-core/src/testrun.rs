// crates/pavilion-core/src/testrun.rs
// ============================================================================
// Module: Pavilion Test Run
// Description: The fully-resolved, trackable unit of execution.
// Purpose: Tie together a resolved config, build signature, job handle, and
//          status journal under one namespaced identifier.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! A [`TestRun`] is created from a fully-resolved test spec (§4.2's output).
//! It carries everything needed to track one run through the lifecycle in
//! [`crate::state::RunState`]: its build signature, job handle, status
//! journal, and eventual result JSON.

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

use crate::ident::BuildHash;
use crate::ident::Label;
use crate::ident::RunId;
use crate::job::JobHandle;
use crate::spec::TestSpec;
use crate::state::StatusJournal;

/// A fully-resolved test run.
///
/// # Invariants
/// - `id` is unique within `label`.
/// - `result` is `Some` only once `status.is_complete()` and the completed
///   state is `Complete` (the only state in which a result JSON is written).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestRun {
    /// Run identifier, unique within `label`.
    pub id: RunId,
    /// Label namespace this run belongs to.
    pub label: Label,
    /// The test base-name this run was resolved from.
    pub test_name: String,
    /// The fully-resolved test spec (after inheritance, overlay, permutation).
    pub resolved: TestSpec,
    /// The content hash computed by the build engine for this run's build.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub build_signature: Option<BuildHash>,
    /// The scheduler-assigned job handle, once dispatched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_handle: Option<JobHandle>,
    /// The append-only status journal.
    pub status: StatusJournal,
    /// Whether the `RUN_COMPLETE` sentinel has been written.
    #[serde(default)]
    pub run_complete: bool,
    /// The final result JSON, present only once the run is `Complete`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
}

impl TestRun {
    /// Creates a freshly-created run record (state `Created`, everything
    /// else empty).
    #[must_use]
    pub fn new(id: RunId, label: Label, test_name: impl Into<String>, resolved: TestSpec) -> Self {
        Self {
            id,
            label,
            test_name: test_name.into(),
            resolved,
            build_signature: None,
            job_handle: None,
            status: StatusJournal::new(),
            run_complete: false,
            result: None,
        }
    }

    /// Returns the namespaced identifier `<label>.<id>`.
    #[must_use]
    pub fn namespaced_id(&self) -> String {
        self.id.namespaced(&self.label)
    }

    /// Returns `true` when this run is in a terminal state.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        self.status.current().is_some_and(|entry| entry.state.is_terminal())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn namespaced_id_combines_label_and_run_id() {
        let run = TestRun::new(
            RunId::from_raw(7).unwrap(),
            Label::new("default"),
            "hello",
            TestSpec::default(),
        );
        assert_eq!(run.namespaced_id(), "default.7");
    }
}
