// crates/pavilion-sched/src/raw.rs
// ============================================================================
// Module: Raw Scheduler
// Description: A basic scheduler capability that runs the kickoff script as
//              a local background process, with no real queueing.
// Purpose: Give hosts with no HPC resource manager, and Pavilion's own test
//          suite, a working scheduler without an external dependency.
// Dependencies: pavilion-core, std::process
// ============================================================================

//! ## Overview
//! [`RawScheduler`] treats "submission" as `sh kickoff.sh &`, recording the
//! child's pid as the scheduler id. `job_status` checks whether that pid is
//! still alive via `kill -0`; `cancel` sends `SIGTERM`. It implements only
//! the basic [`Scheduler`] capability — it has no live inventory to report,
//! so `nodes: all` falls back to `cluster_info.node_count`.

use std::path::Path;
use std::process::Command;
use std::process::Stdio;

use pavilion_core::JobHandle;
use pavilion_core::RunId;
use pavilion_core::SchedulerError;
use pavilion_core::SchedulerStatus;
use pavilion_core::interfaces::Scheduler;

/// Hostname read once at construction, used to stamp [`JobHandle`]'s origin.
#[derive(Debug, Clone)]
pub struct RawScheduler {
    host: String,
}

impl RawScheduler {
    /// Creates a raw scheduler stamping handles with the current hostname.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::Unavailable`] if the hostname cannot be
    /// determined.
    pub fn new() -> Result<Self, SchedulerError> {
        let host = hostname()?;
        Ok(Self { host })
    }
}

impl Scheduler for RawScheduler {
    fn name(&self) -> &str {
        "raw"
    }

    fn available(&self) -> Result<bool, SchedulerError> {
        Ok(Command::new("sh").arg("-c").arg("true").status().is_ok())
    }

    fn kickoff(&self, run_list: &[RunId], script_path: &Path) -> Result<JobHandle, SchedulerError> {
        if run_list.is_empty() {
            return Err(SchedulerError::SubmissionRejected("no runs attached to kickoff".to_string()));
        }
        let child = Command::new("sh")
            .arg(script_path)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|err| SchedulerError::SubmissionRejected(err.to_string()))?;

        Ok(JobHandle::new(child.id().to_string(), self.host.clone()))
    }

    fn job_status(&self, handle: &JobHandle) -> Result<SchedulerStatus, SchedulerError> {
        if !handle.originated_from(&self.host) {
            return Err(SchedulerError::Unavailable(format!(
                "job handle originated from '{}', not this host",
                handle.origin_host()
            )));
        }
        let pid = handle.scheduler_id();
        let alive = Command::new("kill")
            .arg("-0")
            .arg(pid)
            .status()
            .map(|status| status.success())
            .unwrap_or(false);
        Ok(if alive { SchedulerStatus::Running } else { SchedulerStatus::Cancelled })
    }

    fn cancel(&self, handle: &JobHandle) -> Result<(), SchedulerError> {
        if !handle.originated_from(&self.host) {
            return Err(SchedulerError::CancelFailed(format!(
                "job handle originated from '{}', not this host",
                handle.origin_host()
            )));
        }
        let status = Command::new("kill")
            .arg(handle.scheduler_id())
            .status()
            .map_err(|err| SchedulerError::CancelFailed(err.to_string()))?;
        if status.success() {
            Ok(())
        } else {
            Err(SchedulerError::CancelFailed(format!("kill {} failed", handle.scheduler_id())))
        }
    }

    fn get_alloc_nodes(&self) -> Result<Vec<String>, SchedulerError> {
        Ok(vec![self.host.clone()])
    }
}

fn hostname() -> Result<String, SchedulerError> {
    let output = Command::new("hostname")
        .output()
        .map_err(|err| SchedulerError::Unavailable(err.to_string()))?;
    if !output.status.success() {
        return Err(SchedulerError::Unavailable("hostname command failed".to_string()));
    }
    String::from_utf8(output.stdout)
        .map(|name| name.trim().to_string())
        .map_err(|err| SchedulerError::Unavailable(err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kickoff_rejects_empty_run_list() {
        let scheduler = RawScheduler { host: "testhost".to_string() };
        let err = scheduler.kickoff(&[], Path::new("/tmp/does-not-matter.sh")).unwrap_err();
        assert!(matches!(err, SchedulerError::SubmissionRejected(_)));
    }

    #[test]
    fn status_rejects_handle_from_another_host() {
        let scheduler = RawScheduler { host: "here".to_string() };
        let handle = JobHandle::new("123", "elsewhere");
        let err = scheduler.job_status(&handle).unwrap_err();
        assert!(matches!(err, SchedulerError::Unavailable(_)));
    }
}
