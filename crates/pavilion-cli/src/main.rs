// crates/pavilion-cli/src/main.rs
// ============================================================================
// Module: Pavilion CLI Entry Point
// Description: Command dispatcher for process configuration, run status,
//              cancellation, and scheduler inspection.
// Purpose: Provide one synchronous, fail-closed front door onto the shared
//          working directory that every other Pavilion process reads and
//          writes.
// Dependencies: clap, pavilion-config, pavilion-core, pavilion-orchestrator,
//               pavilion-sched, thiserror, tracing, tracing-subscriber
// ============================================================================

//! ## Overview
//! This binary never parses suite/host/mode YAML itself (that loader is out
//! of scope); it discovers [`pavilion_config::ProcessConfig`], then reads or
//! mutates one run's state under `<working_dir>/test_runs/<id>/` via
//! `pavilion_orchestrator::rundir`, or inspects a scheduler capability via
//! `pavilion_sched`. Every subcommand returns a [`pavilion_core::ErrorKind`]
//! alongside its message so `main` can map it to a stable exit code.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::ArgAction;
use clap::Parser;
use clap::Subcommand;
use pavilion_config::ProcessConfig;
use pavilion_core::ErrorKind;
use pavilion_core::JobHandle;
use pavilion_core::Label;
use pavilion_core::RunId;
use pavilion_core::TestRun;
use pavilion_core::TestSpec;
use pavilion_orchestrator::cancel_run;
use pavilion_orchestrator::rundir;
use pavilion_orchestrator::rundir::RunPaths;
use pavilion_sched::registry::with_builtin_advanced_schedulers;
use pavilion_sched::with_builtin_schedulers;
use thiserror::Error;

#[derive(Parser, Debug)]
#[command(name = "pavilion", disable_help_subcommand = true, disable_version_flag = true)]
struct Cli {
    /// Print version information and exit.
    #[arg(long = "version", action = ArgAction::SetTrue, global = true)]
    show_version: bool,
    /// Path to `pavilion.toml`, overriding `PAV_CONFIG_FILE` and the default.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Selected subcommand to execute.
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Supported CLI subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Configuration utilities.
    Config {
        /// Selected config subcommand.
        #[command(subcommand)]
        command: ConfigCommand,
    },
    /// Run inspection and control utilities.
    Run {
        /// Selected run subcommand.
        #[command(subcommand)]
        command: RunCommand,
    },
    /// Scheduler capability utilities.
    Scheduler {
        /// Selected scheduler subcommand.
        #[command(subcommand)]
        command: SchedulerCommand,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Loads and validates `pavilion.toml`, printing the resolved config.
    Validate,
}

#[derive(Subcommand, Debug)]
enum RunCommand {
    /// Prints a run's current state and whether `RUN_COMPLETE` is set.
    Status {
        /// Run identifier, unique within its label.
        #[arg(long)]
        run: u64,
        /// Label namespace the run belongs to.
        #[arg(long, default_value = "default")]
        label: String,
    },
    /// Forces a run to `Cancelled` and writes `RUN_COMPLETE`.
    Cancel {
        /// Run identifier, unique within its label.
        #[arg(long)]
        run: u64,
        /// Label namespace the run belongs to.
        #[arg(long, default_value = "default")]
        label: String,
    },
}

#[derive(Subcommand, Debug)]
enum SchedulerCommand {
    /// Lists the scheduler capability names bundled in this binary.
    List,
    /// Fetches and normalizes one scheduler's node inventory.
    Nodes {
        /// Name of a bundled advanced scheduler (e.g. `slurm`).
        #[arg(long)]
        name: String,
    },
}

/// A CLI-level failure, carrying the taxonomy kind used to pick an exit code.
#[derive(Debug, Error)]
#[error("{message}")]
struct CliError {
    message: String,
    kind: ErrorKind,
}

impl CliError {
    fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self { message: message.into(), kind }
    }
}

impl From<pavilion_config::ConfigError> for CliError {
    fn from(err: pavilion_config::ConfigError) -> Self {
        Self::new(ErrorKind::Configuration, err.to_string())
    }
}

impl From<pavilion_orchestrator::OrchestratorError> for CliError {
    fn from(err: pavilion_orchestrator::OrchestratorError) -> Self {
        Self::new(ErrorKind::Concurrency, err.to_string())
    }
}

impl From<pavilion_core::SchedulerError> for CliError {
    fn from(err: pavilion_core::SchedulerError) -> Self {
        Self::new(ErrorKind::Scheduler, err.to_string())
    }
}

impl From<pavilion_core::interfaces::RegistryError> for CliError {
    fn from(err: pavilion_core::interfaces::RegistryError) -> Self {
        Self::new(ErrorKind::Scheduler, err.to_string())
    }
}

/// CLI result alias for fallible operations.
type CliResult<T> = Result<T, CliError>;

/// CLI entry point returning an exit code.
fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    match run() {
        Ok(code) => code,
        Err(err) => emit_error(&err),
    }
}

/// Executes the CLI command dispatcher.
fn run() -> CliResult<ExitCode> {
    let cli = Cli::parse();

    if cli.show_version {
        println!("pavilion {}", env!("CARGO_PKG_VERSION"));
        return Ok(ExitCode::SUCCESS);
    }

    let Some(command) = cli.command else {
        println!("usage: pavilion <config|run|scheduler> ...");
        return Ok(ExitCode::SUCCESS);
    };

    match command {
        Commands::Config { command } => command_config(command, cli.config.as_deref()),
        Commands::Run { command } => command_run(command, cli.config.as_deref()),
        Commands::Scheduler { command } => command_scheduler(command),
    }
}

fn command_config(command: ConfigCommand, config_path: Option<&std::path::Path>) -> CliResult<ExitCode> {
    match command {
        ConfigCommand::Validate => {
            let config = ProcessConfig::load(config_path)?;
            println!("{}", serde_json::to_string_pretty(&config).map_err(|err| {
                CliError::new(ErrorKind::Configuration, format!("failed to render config: {err}"))
            })?);
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn command_run(command: RunCommand, config_path: Option<&std::path::Path>) -> CliResult<ExitCode> {
    let config = ProcessConfig::load(config_path)?;
    match command {
        RunCommand::Status { run, label } => {
            let id = parse_run_id(run)?;
            let paths = RunPaths::new(&config.working_dir, id);
            let journal = rundir::read_status(&paths)?;
            match journal.current() {
                Some(entry) => println!("{label}.{run}: {:?} ({})", entry.state, entry.note),
                None => println!("{label}.{run}: no status recorded"),
            }
            println!("complete: {}", rundir::is_complete(&paths));
            Ok(ExitCode::SUCCESS)
        }
        RunCommand::Cancel { run, label } => {
            let id = parse_run_id(run)?;
            let paths = RunPaths::new(&config.working_dir, id);
            let mut test_run = TestRun::new(id, Label::new(label.clone()), "unknown", TestSpec::default());
            test_run.status = rundir::read_status(&paths)?;
            test_run.job_handle = read_job_handle(&paths);

            let registry = with_builtin_schedulers()?;
            let scheduler = registry.resolve(&config.scheduler.name)?;
            cancel_run(&paths, &mut test_run, time::OffsetDateTime::now_utc(), Some(scheduler.as_ref()))?;
            println!("{label}.{run}: cancelled");
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn command_scheduler(command: SchedulerCommand) -> CliResult<ExitCode> {
    match command {
        SchedulerCommand::List => {
            let registry = with_builtin_schedulers()?;
            for name in registry.names() {
                println!("{name}");
            }
            Ok(ExitCode::SUCCESS)
        }
        SchedulerCommand::Nodes { name } => {
            let registry = with_builtin_advanced_schedulers()?;
            let scheduler = registry.resolve(&name)?;
            let raw = scheduler.raw_node_data()?;
            let inventory = scheduler.normalize(&raw)?;
            println!("{}", serde_json::to_string_pretty(&inventory).map_err(|err| {
                CliError::new(ErrorKind::Scheduler, format!("failed to render node inventory: {err}"))
            })?);
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Reads a previously written job handle, if any. An absent or malformed
/// file is treated as "never dispatched", not an error: a run cancelled
/// before dispatch has no scheduler job to forward the cancel to.
fn read_job_handle(paths: &RunPaths) -> Option<JobHandle> {
    std::fs::read_to_string(paths.job_id()).ok().and_then(|contents| serde_json::from_str(&contents).ok())
}

fn parse_run_id(raw: u64) -> CliResult<RunId> {
    RunId::from_raw(raw).ok_or_else(|| CliError::new(ErrorKind::Configuration, "run id must be non-zero".to_string()))
}

/// Maps a [`CliError`]'s taxonomy kind to a stable non-zero exit code and
/// prints its message to stderr.
fn emit_error(err: &CliError) -> ExitCode {
    eprintln!("error: {err}");
    ExitCode::from(exit_code_for(err.kind))
}

/// Maps a taxonomy kind to its stable non-zero exit code.
const fn exit_code_for(kind: ErrorKind) -> u8 {
    match kind {
        ErrorKind::Configuration => 2,
        ErrorKind::Resolution => 3,
        ErrorKind::Build => 4,
        ErrorKind::Scheduler => 5,
        ErrorKind::Runtime => 6,
        ErrorKind::Parse => 7,
        ErrorKind::Concurrency => 8,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_run_id_rejects_zero() {
        let err = parse_run_id(0).unwrap_err();
        assert!(matches!(err.kind, ErrorKind::Configuration));
    }

    #[test]
    fn parse_run_id_accepts_nonzero() {
        assert_eq!(parse_run_id(7).unwrap(), RunId::from_raw(7).unwrap());
    }

    #[test]
    fn exit_codes_are_stable_per_kind() {
        let cases = [
            (ErrorKind::Configuration, 2u8),
            (ErrorKind::Resolution, 3),
            (ErrorKind::Build, 4),
            (ErrorKind::Scheduler, 5),
            (ErrorKind::Runtime, 6),
            (ErrorKind::Parse, 7),
            (ErrorKind::Concurrency, 8),
        ];
        for (kind, expected) in cases {
            assert_eq!(exit_code_for(kind), expected);
        }
    }

    #[test]
    fn read_job_handle_returns_none_when_absent() {
        let dir = tempfile::tempdir().unwrap();
        let paths = RunPaths::new(dir.path(), RunId::from_raw(1).unwrap());
        rundir::ensure_dir(&paths).unwrap();
        assert!(read_job_handle(&paths).is_none());
    }
}
