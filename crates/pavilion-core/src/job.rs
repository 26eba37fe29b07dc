// crates/pavilion-core/src/job.rs
// ============================================================================
// Module: Pavilion Job
// Description: The unit handed to the underlying scheduler.
// Purpose: Carry a scheduler's opaque handle plus the test runs sharing it.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! A [`Job`] is the unit the scheduler abstraction submits: one kickoff
//! script, one scheduler-assigned [`JobHandle`], and an ordered list of the
//! test runs sharing the allocation (job sharing, §4.5).

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::Deserialize;
use serde::Serialize;

use crate::ident::RunId;

/// Well-known keys always present in a [`JobHandle`].
pub mod handle_keys {
    /// The scheduler-assigned job id.
    pub const SCHEDULER_ID: &str = "scheduler_id";
    /// The host the job was submitted from.
    pub const ORIGIN_HOST: &str = "origin_host";
}

/// An opaque mapping of strings identifying a submitted job to its
/// scheduler, so later operations (poll, cancel) can act on it.
///
/// # Invariants
/// - Always carries [`handle_keys::SCHEDULER_ID`] and
///   [`handle_keys::ORIGIN_HOST`] so later operations can refuse to act
///   from an unrelated host.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobHandle(BTreeMap<String, String>);

impl JobHandle {
    /// Creates a handle from the scheduler-assigned id and originating host.
    #[must_use]
    pub fn new(scheduler_id: impl Into<String>, origin_host: impl Into<String>) -> Self {
        let mut fields = BTreeMap::new();
        fields.insert(handle_keys::SCHEDULER_ID.to_string(), scheduler_id.into());
        fields.insert(handle_keys::ORIGIN_HOST.to_string(), origin_host.into());
        Self(fields)
    }

    /// Attaches an additional scheduler-specific field.
    #[must_use]
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    /// Returns a field by key.
    #[must_use]
    pub fn field(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Returns the scheduler-assigned id.
    #[must_use]
    pub fn scheduler_id(&self) -> &str {
        self.field(handle_keys::SCHEDULER_ID).unwrap_or_default()
    }

    /// Returns the originating host name.
    #[must_use]
    pub fn origin_host(&self) -> &str {
        self.field(handle_keys::ORIGIN_HOST).unwrap_or_default()
    }

    /// Returns `true` when `host` matches the originating host, the
    /// precondition for operations (cancel, poll) that must not act from an
    /// unrelated host.
    #[must_use]
    pub fn originated_from(&self, host: &str) -> bool {
        self.origin_host() == host
    }
}

/// Coarse scheduler-native status, reported by `job_status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SchedulerStatus {
    /// The scheduler itself reported an error for this job.
    Error,
    /// The job was cancelled, natively or by a prior cancel request.
    Cancelled,
    /// The job is running.
    Running,
    /// The job is queued, waiting on an allocation.
    Scheduled,
}

/// The unit handed to the underlying scheduler: a kickoff script plus the
/// test runs sharing its allocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    /// Path to the kickoff script on shared storage.
    pub kickoff_script: PathBuf,
    /// Scheduler-assigned handle, set once submission succeeds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub handle: Option<JobHandle>,
    /// Test runs attached to this job, in submission order.
    pub runs: Vec<RunId>,
}

impl Job {
    /// Creates an unsubmitted job for the given kickoff script and run list.
    #[must_use]
    pub fn new(kickoff_script: PathBuf, runs: Vec<RunId>) -> Self {
        Self {
            kickoff_script,
            handle: None,
            runs,
        }
    }

    /// Returns `true` when more than one run shares this job's allocation.
    #[must_use]
    pub fn is_shared(&self) -> bool {
        self.runs.len() > 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handle_tracks_origin_host() {
        let handle = JobHandle::new("12345", "login01");
        assert!(handle.originated_from("login01"));
        assert!(!handle.originated_from("login02"));
    }

    #[test]
    fn job_sharing_detection() {
        let single = Job::new(PathBuf::from("/jobs/a/kickoff.sh"), vec![RunId::from_raw(1).unwrap()]);
        let shared = Job::new(
            PathBuf::from("/jobs/b/kickoff.sh"),
            vec![RunId::from_raw(1).unwrap(), RunId::from_raw(2).unwrap()],
        );
        assert!(!single.is_shared());
        assert!(shared.is_shared());
    }
}
