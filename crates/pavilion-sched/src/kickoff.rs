// crates/pavilion-sched/src/kickoff.rs
// ============================================================================
// Module: Kickoff Script Composition
// Description: Builds the shell script a scheduler submits, and the
//              `sched.launch` command-launcher variable runs are templated
//              against.
// Purpose: Give every scheduler plugin the same run-dispatch shape, only the
//          header (in-script directives) varying by plugin.
// Dependencies: pavilion-core
// ============================================================================

//! ## Overview
//! A kickoff script redirects all output to a per-job log, exports the
//! Pavilion config path and bin path, then invokes `_run <id>` once per
//! attached test run. [`HeaderComposer`] lets a scheduler plugin prepend its
//! own in-script directives (e.g. `#SBATCH` lines); [`ShebangHeader`] is the
//! default, a bare shebang.

use std::fmt::Write as _;
use std::path::Path;

use pavilion_core::RunId;
use pavilion_core::ScheduleSpec;

/// Generates the scheduler-specific in-script header for a kickoff script.
pub trait HeaderComposer: Send + Sync {
    /// Returns the header lines (including the shebang, if any) to prepend.
    fn compose(&self, schedule: &ScheduleSpec) -> String;
}

/// The default header composer: a bare shebang, no scheduler directives.
#[derive(Debug, Clone, Copy, Default)]
pub struct ShebangHeader;

impl HeaderComposer for ShebangHeader {
    fn compose(&self, _schedule: &ScheduleSpec) -> String {
        "#!/bin/sh\n".to_string()
    }
}

/// Composes the kickoff script body for `runs`, sharing one allocation.
///
/// `pav_config_file` and `pav_bin_path` are exported so the `_run`
/// entrypoint can locate Pavilion's configuration without relying on the
/// submitting shell's environment.
#[must_use]
pub fn compose(
    header: &dyn HeaderComposer,
    schedule: &ScheduleSpec,
    runs: &[RunId],
    pav_config_file: &Path,
    pav_bin_path: &Path,
    kickoff_log: &Path,
) -> String {
    let mut script = header.compose(schedule);
    let _ = writeln!(script, "exec > {} 2>&1", shell_quote(&kickoff_log.display().to_string()));
    let _ = writeln!(script, "export PAV_CONFIG_FILE={}", shell_quote(&pav_config_file.display().to_string()));
    let _ = writeln!(script, "export PATH={}:$PATH", shell_quote(&pav_bin_path.display().to_string()));
    for run in runs {
        let _ = writeln!(script, "pav _run {run}");
    }
    script
}

/// Builds the `sched.launch` command-launcher variable: the scheduler's
/// native parallel-launch prefix, with an optional `wrapper` fragment
/// inserted between the launcher and the user command.
#[must_use]
pub fn launch_prefix(launcher: &str, wrapper: Option<&str>) -> String {
    match wrapper {
        Some(wrapper) if !wrapper.is_empty() => format!("{launcher} {wrapper}"),
        _ => launcher.to_string(),
    }
}

fn shell_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', "'\\''"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compose_invokes_run_once_per_attached_test() {
        let schedule = ScheduleSpec::default();
        let runs = vec![RunId::from_raw(1).unwrap(), RunId::from_raw(2).unwrap()];
        let script = compose(
            &ShebangHeader,
            &schedule,
            &runs,
            Path::new("/cfg/pavilion.yaml"),
            Path::new("/opt/pavilion/bin"),
            Path::new("/jobs/a/kickoff.log"),
        );
        assert!(script.starts_with("#!/bin/sh\n"));
        assert_eq!(script.matches("pav _run").count(), 2);
    }

    #[test]
    fn launch_prefix_inserts_wrapper_between_launcher_and_command() {
        assert_eq!(launch_prefix("srun -N 2 -n 4", Some("numactl")), "srun -N 2 -n 4 numactl");
        assert_eq!(launch_prefix("srun -N 2 -n 4", None), "srun -N 2 -n 4");
    }
}
