// crates/pavilion-sched/src/slurm.rs
// ============================================================================
// Module: Slurm Scheduler
// Description: An advanced scheduler capability backed by the Slurm resource
//              manager's command-line tools (`sbatch`, `squeue`, `scancel`,
//              `sinfo`).
// Purpose: Give clusters running Slurm live node inventory and real queueing,
//          the canonical "advanced" scheduler the basic `raw` one stands in
//          for on hosts with no resource manager.
// Dependencies: pavilion-core, std::process
// ============================================================================

//! ## Overview
//! [`SlurmScheduler`] submits the kickoff script with `sbatch`, recording the
//! numeric job id `sbatch` prints as the scheduler id. `job_status` polls
//! `squeue` by job id, falling back to `sacct` once the job has left the
//! queue (`squeue` drops completed jobs). [`raw_node_data`] shells out to
//! `sinfo` in its pipe-separated `--format` mode rather than Slurm's JSON
//! plugin, since the latter is only available on sites that built `sinfo`
//! with `--enable-json`; [`normalize`] turns that line-oriented inventory
//! into Pavilion's [`NodeInventory`] shape.

use std::path::Path;
use std::process::Command;

use pavilion_core::JobHandle;
use pavilion_core::RunId;
use pavilion_core::SchedulerError;
use pavilion_core::SchedulerStatus;
use pavilion_core::interfaces::AdvancedScheduler;
use pavilion_core::interfaces::Scheduler;
use pavilion_core::node::NodeInventory;
use pavilion_core::node::NodeRecord;
use pavilion_core::node::NodeState;
use serde_json::Value;

const SINFO_FORMAT: &str = "%N|%T|%c|%m|%P";

/// Hostname read once at construction, used to stamp [`JobHandle`]'s origin.
#[derive(Debug, Clone)]
pub struct SlurmScheduler {
    host: String,
}

impl SlurmScheduler {
    /// Creates a Slurm scheduler stamping handles with the current hostname.
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

impl Scheduler for SlurmScheduler {
    fn name(&self) -> &str {
        "slurm"
    }

    fn available(&self) -> Result<bool, SchedulerError> {
        Ok(Command::new("sinfo").arg("--version").status().is_ok())
    }

    fn kickoff(&self, run_list: &[RunId], script_path: &Path) -> Result<JobHandle, SchedulerError> {
        if run_list.is_empty() {
            return Err(SchedulerError::SubmissionRejected("no runs attached to kickoff".to_string()));
        }
        let output = Command::new("sbatch")
            .arg("--parsable")
            .arg(script_path)
            .output()
            .map_err(|err| SchedulerError::SubmissionRejected(err.to_string()))?;
        if !output.status.success() {
            return Err(SchedulerError::SubmissionRejected(String::from_utf8_lossy(&output.stderr).trim().to_string()));
        }
        let job_id = String::from_utf8_lossy(&output.stdout).trim().split(';').next().unwrap_or_default().to_string();
        if job_id.is_empty() {
            return Err(SchedulerError::SubmissionRejected("sbatch produced no job id".to_string()));
        }
        Ok(JobHandle::new(job_id, self.host.clone()))
    }

    fn job_status(&self, handle: &JobHandle) -> Result<SchedulerStatus, SchedulerError> {
        if !handle.originated_from(&self.host) {
            return Err(SchedulerError::Unavailable(format!(
                "job handle originated from '{}', not this host",
                handle.origin_host()
            )));
        }
        let job_id = handle.scheduler_id();
        let output = Command::new("squeue")
            .arg("--noheader")
            .arg("--format=%T")
            .arg("--job")
            .arg(job_id)
            .output()
            .map_err(|err| SchedulerError::Unavailable(err.to_string()))?;
        let state = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if state.is_empty() {
            return sacct_status(job_id);
        }
        Ok(map_slurm_state(&state))
    }

    fn cancel(&self, handle: &JobHandle) -> Result<(), SchedulerError> {
        if !handle.originated_from(&self.host) {
            return Err(SchedulerError::CancelFailed(format!(
                "job handle originated from '{}', not this host",
                handle.origin_host()
            )));
        }
        let status = Command::new("scancel")
            .arg(handle.scheduler_id())
            .status()
            .map_err(|err| SchedulerError::CancelFailed(err.to_string()))?;
        if status.success() {
            Ok(())
        } else {
            Err(SchedulerError::CancelFailed(format!("scancel {} failed", handle.scheduler_id())))
        }
    }

    fn get_alloc_nodes(&self) -> Result<Vec<String>, SchedulerError> {
        let raw = std::env::var("SLURM_JOB_NODELIST")
            .map_err(|_| SchedulerError::Unavailable("SLURM_JOB_NODELIST is not set; not inside an allocation".to_string()))?;
        expand_nodelist(&raw)
    }
}

impl AdvancedScheduler for SlurmScheduler {
    fn raw_node_data(&self) -> Result<Value, SchedulerError> {
        let output = Command::new("sinfo")
            .arg("--noheader")
            .arg("--format")
            .arg(SINFO_FORMAT)
            .output()
            .map_err(|err| SchedulerError::InventoryFetch(err.to_string()))?;
        if !output.status.success() {
            return Err(SchedulerError::InventoryFetch(String::from_utf8_lossy(&output.stderr).trim().to_string()));
        }
        let text = String::from_utf8(output.stdout).map_err(|err| SchedulerError::InventoryFetch(err.to_string()))?;
        Ok(Value::String(text))
    }

    fn normalize(&self, raw: &Value) -> Result<NodeInventory, SchedulerError> {
        let text = raw.as_str().ok_or_else(|| SchedulerError::InventoryFetch("raw inventory is not sinfo text".to_string()))?;
        let mut inventory = NodeInventory::new();
        for line in text.lines().filter(|line| !line.trim().is_empty()) {
            let fields: Vec<&str> = line.split('|').collect();
            let &[names, state, cpus, memory_mb, partition] = fields.as_slice() else {
                return Err(SchedulerError::InventoryFetch(format!("malformed sinfo line: {line}")));
            };
            let cpus: u32 = cpus.parse().map_err(|_| SchedulerError::InventoryFetch(format!("bad cpu count: {cpus}")))?;
            let memory_mb: u64 =
                memory_mb.parse().map_err(|_| SchedulerError::InventoryFetch(format!("bad memory value: {memory_mb}")))?;
            for name in expand_nodelist(names)? {
                let record = inventory.entry(name).or_insert_with(|| NodeRecord {
                    state: map_node_state(state),
                    cpus,
                    memory_bytes: memory_mb * 1024 * 1024,
                    groups: Default::default(),
                    attributes: Default::default(),
                });
                record.groups.insert(partition.trim_end_matches('*').to_string());
            }
        }
        Ok(inventory)
    }
}

fn sacct_status(job_id: &str) -> Result<SchedulerStatus, SchedulerError> {
    let output = Command::new("sacct")
        .arg("--noheader")
        .arg("--format=State")
        .arg("--jobs")
        .arg(job_id)
        .output()
        .map_err(|err| SchedulerError::Unavailable(err.to_string()))?;
    let state = String::from_utf8_lossy(&output.stdout).lines().next().unwrap_or_default().trim().to_string();
    if state.is_empty() {
        return Err(SchedulerError::Unavailable(format!("job {job_id} not found by squeue or sacct")));
    }
    Ok(map_slurm_state(&state))
}

// Mirrors `raw::RawScheduler::job_status`'s own conflation: this status is a
// coarse external signal for detecting stalled jobs, not the primary
// completion source (the run directory's own `RUN_COMPLETE` marker is), so
// "job left the queue" and "job was cancelled" both map to `Cancelled`.
fn map_slurm_state(state: &str) -> SchedulerStatus {
    match state {
        "PENDING" | "CONFIGURING" => SchedulerStatus::Scheduled,
        "RUNNING" | "COMPLETING" => SchedulerStatus::Running,
        "FAILED" | "NODE_FAIL" | "BOOT_FAIL" => SchedulerStatus::Error,
        _ => SchedulerStatus::Cancelled,
    }
}

fn map_node_state(state: &str) -> NodeState {
    let base = state.trim_end_matches(['*', '~', '#', '!', '%', '$', '@']);
    match base {
        "idle" => NodeState::Up,
        "alloc" | "mix" | "allocated" | "completing" => NodeState::Allocated,
        "down" | "drain" | "drained" | "fail" | "failing" | "maint" => NodeState::Down,
        _ => NodeState::Unknown,
    }
}

/// Expands a Slurm hostlist expression (`node[01-03,05]`) into individual
/// node names. Slurm's grammar allows multiple bracketed ranges per prefix;
/// this handles the single-bracket case `sinfo`/`SLURM_JOB_NODELIST` emit.
fn expand_nodelist(raw: &str) -> Result<Vec<String>, SchedulerError> {
    let mut names = Vec::new();
    for group in split_top_level(raw) {
        match group.find('[') {
            None => names.push(group.to_string()),
            Some(open) => {
                let close = group.rfind(']').ok_or_else(|| SchedulerError::InventoryFetch(format!("unbalanced nodelist: {group}")))?;
                let prefix = &group[..open];
                let body = &group[open + 1 .. close];
                for part in body.split(',') {
                    if let Some((start, end)) = part.split_once('-') {
                        let width = start.len();
                        let start: u32 =
                            start.parse().map_err(|_| SchedulerError::InventoryFetch(format!("bad range start: {part}")))?;
                        let end: u32 =
                            end.parse().map_err(|_| SchedulerError::InventoryFetch(format!("bad range end: {part}")))?;
                        for n in start ..= end {
                            names.push(format!("{prefix}{n:0width$}"));
                        }
                    } else {
                        let width = part.len();
                        let n: u32 = part.parse().map_err(|_| SchedulerError::InventoryFetch(format!("bad node index: {part}")))?;
                        names.push(format!("{prefix}{n:0width$}"));
                    }
                }
            }
        }
    }
    Ok(names)
}

/// Splits a nodelist on commas that are not inside a bracketed range.
fn split_top_level(raw: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0usize;
    for (i, c) in raw.char_indices() {
        match c {
            '[' => depth += 1,
            ']' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                parts.push(&raw[start .. i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&raw[start ..]);
    parts
}

fn hostname() -> Result<String, SchedulerError> {
    let output = Command::new("hostname").output().map_err(|err| SchedulerError::Unavailable(err.to_string()))?;
    if !output.status.success() {
        return Err(SchedulerError::Unavailable("hostname command failed".to_string()));
    }
    String::from_utf8(output.stdout).map(|name| name.trim().to_string()).map_err(|err| SchedulerError::Unavailable(err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expand_nodelist_handles_ranges_and_singletons() {
        let names = expand_nodelist("node[01-03,05],gpu1").unwrap();
        assert_eq!(names, vec!["node01", "node02", "node03", "node05", "gpu1"]);
    }

    #[test]
    fn expand_nodelist_preserves_zero_padding_width() {
        let names = expand_nodelist("n[008-010]").unwrap();
        assert_eq!(names, vec!["n008", "n009", "n010"]);
    }

    #[test]
    fn normalize_parses_sinfo_pipe_format_into_node_records() {
        let scheduler = SlurmScheduler { host: "login1".to_string() };
        let raw = Value::String("node[01-02]|idle|32|128000|batch*\n".to_string());
        let inventory = scheduler.normalize(&raw).unwrap();
        assert_eq!(inventory.len(), 2);
        let node = &inventory["node01"];
        assert_eq!(node.cpus, 32);
        assert_eq!(node.state, NodeState::Up);
        assert!(node.groups.contains("batch"));
    }

    #[test]
    fn job_handle_from_another_host_is_rejected() {
        let scheduler = SlurmScheduler { host: "here".to_string() };
        let handle = JobHandle::new("42", "elsewhere");
        let err = scheduler.cancel(&handle).unwrap_err();
        assert!(matches!(err, SchedulerError::CancelFailed(_)));
    }
}
