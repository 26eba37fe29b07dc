// crates/pavilion-sched/src/sharing.rs
// ============================================================================
// Module: Job Sharing
// Description: Groups runs with identical dispatch parameters into one Job.
// Purpose: Implement §4.5's job-sharing rule: same scheduler, same
//          normalized `schedule` section, same chunk selection, and both
//          runs opted in via `share_allocation`.
// Dependencies: pavilion-core
// ============================================================================

//! ## Overview
//! [`fingerprint`] reduces a run's dispatch parameters to a value two runs
//! can compare for equality; [`group`] buckets runs by that fingerprint,
//! but only when every run in the bucket has `share_allocation = true` —
//! a single non-sharing run in an otherwise-identical group stays solo.

use pavilion_core::RunId;
use pavilion_core::ScheduleSpec;

/// A dispatch-parameter fingerprint: runs compare equal only when every
/// field that would change the allocation request matches.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Fingerprint {
    scheduler: String,
    nodes: String,
    min_nodes: String,
    tasks_per_node: Option<u32>,
    partition: Option<String>,
    time_limit: Option<String>,
    mem_per_node: Option<String>,
    chunk: Option<u32>,
}

/// Builds the fingerprint for one run's scheduler name and resolved
/// `schedule` section.
#[must_use]
pub fn fingerprint(scheduler: &str, schedule: &ScheduleSpec) -> Fingerprint {
    Fingerprint {
        scheduler: scheduler.to_string(),
        nodes: format!("{:?}", schedule.nodes),
        min_nodes: format!("{:?}", schedule.min_nodes),
        tasks_per_node: schedule.tasks_per_node,
        partition: schedule.partition.clone(),
        time_limit: schedule.time_limit.clone(),
        mem_per_node: schedule.mem_per_node.clone(),
        chunk: schedule.chunk,
    }
}

/// Groups `runs` into jobs: runs with the same fingerprint and
/// `share_allocation = true` are grouped together; everyone else gets a
/// singleton group. Group order follows first occurrence of each
/// fingerprint in `runs`.
#[must_use]
pub fn group(runs: &[(RunId, &str, &ScheduleSpec)]) -> Vec<Vec<RunId>> {
    let mut groups: Vec<(Fingerprint, Vec<RunId>)> = Vec::new();

    for (run_id, scheduler, schedule) in runs {
        if !schedule.share_allocation {
            groups.push((fingerprint(scheduler, schedule), vec![*run_id]));
            continue;
        }

        let fp = fingerprint(scheduler, schedule);
        if let Some((_, existing)) = groups
            .iter_mut()
            .find(|(candidate, members)| *candidate == fp && members_share(members, runs))
        {
            existing.push(*run_id);
        } else {
            groups.push((fp, vec![*run_id]));
        }
    }

    groups.into_iter().map(|(_, members)| members).collect()
}

/// A group only absorbs a new member if every existing member also opted
/// into sharing; a `share_allocation = false` run would already have been
/// routed to its own singleton above, so this just guards against reusing a
/// singleton group created for a different reason.
fn members_share(members: &[RunId], runs: &[(RunId, &str, &ScheduleSpec)]) -> bool {
    members.iter().all(|member| {
        runs.iter()
            .find(|(id, _, _)| id == member)
            .is_some_and(|(_, _, schedule)| schedule.share_allocation)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(n: u64) -> RunId {
        RunId::from_raw(n).unwrap()
    }

    #[test]
    fn identical_sharing_runs_are_grouped() {
        let mut schedule = ScheduleSpec::default();
        schedule.share_allocation = true;
        let runs = vec![
            (run(1), "slurm", &schedule),
            (run(2), "slurm", &schedule),
        ];
        let groups = group(&runs);
        assert_eq!(groups, vec![vec![run(1), run(2)]]);
    }

    #[test]
    fn non_sharing_runs_stay_solo() {
        let schedule = ScheduleSpec::default();
        let runs = vec![
            (run(1), "slurm", &schedule),
            (run(2), "slurm", &schedule),
        ];
        let groups = group(&runs);
        assert_eq!(groups, vec![vec![run(1)], vec![run(2)]]);
    }

    #[test]
    fn different_partitions_do_not_share() {
        let mut a = ScheduleSpec::default();
        a.share_allocation = true;
        a.partition = Some("batch".to_string());
        let mut b = ScheduleSpec::default();
        b.share_allocation = true;
        b.partition = Some("gpu".to_string());
        let runs = vec![(run(1), "slurm", &a), (run(2), "slurm", &b)];
        let groups = group(&runs);
        assert_eq!(groups, vec![vec![run(1)], vec![run(2)]]);
    }
}
