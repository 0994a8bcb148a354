// crates/run-outputs-cli/src/main.rs
// ============================================================================
// Module: Run Outputs CLI Entry Point
// Description: Command dispatcher for run output resolution and artifacts.
// Purpose: Resolve run storage locations and move artifacts from CI scripts.
// Dependencies: clap, run-outputs-backend, run-outputs-config, run-outputs-core,
// run-outputs-github, serde_json, thiserror.
// ============================================================================

//! ## Overview
//! `run-outputs` answers "where do this run's outputs live" and moves build
//! artifacts to and from that place. Location commands print JSON on stdout;
//! structured events (`bucket_resolved`, `artifact_transfer`) go to stderr or
//! to `--event-log`. Inputs come from flags, then the environment, then the
//! optional `run-outputs.toml`.

// ============================================================================
// SECTION: Modules
// ============================================================================

mod context;
mod report;

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::ArgAction;
use clap::Args;
use clap::Parser;
use clap::Subcommand;
use run_outputs_backend::ArtifactBackend;
use run_outputs_backend::create_backend;
use run_outputs_core::RepositoryId;
use run_outputs_github::FileWrite;
use serde::Serialize;
use thiserror::Error;

use crate::context::CliContext;
use crate::context::RunSelection;
use crate::report::GroupReport;
use crate::report::PathsReport;
use crate::report::RootReport;
use crate::report::summary_markdown;

// ============================================================================
// SECTION: CLI Types
// ============================================================================

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(name = "run-outputs", version, disable_help_subcommand = true)]
struct Cli {
    /// Config file path (overrides `RUN_OUTPUTS_CONFIG`).
    #[arg(long, value_name = "PATH", global = true)]
    config: Option<PathBuf>,
    /// Append structured events to this JSON-lines file instead of stderr.
    #[arg(long, value_name = "PATH", global = true)]
    event_log: Option<PathBuf>,
    /// Selected subcommand to execute.
    #[command(subcommand)]
    command: Commands,
}

/// Supported CLI subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Resolve the bucket and run root for a workflow run.
    Resolve(ResolveCommand),
    /// Print the storage locations of a run and an artifact group.
    Paths(PathsCommand),
    /// Build artifact utilities.
    Artifacts {
        /// Selected artifacts subcommand.
        #[command(subcommand)]
        command: ArtifactsCommand,
    },
    /// List runs of a workflow for a commit.
    WorkflowRuns(WorkflowRunsCommand),
}

/// Flags selecting the workflow run.
#[derive(Args, Debug, Clone, Default)]
struct RunArgs {
    /// Workflow run id (defaults to `THEROCK_RUN_ID`, `GITHUB_RUN_ID`, then `local`).
    #[arg(long, value_name = "ID")]
    run_id: Option<String>,
    /// Platform label (defaults to `THEROCK_PLATFORM`, then the host).
    #[arg(long, value_name = "PLATFORM")]
    platform: Option<String>,
    /// Repository as `owner/name` (defaults to `GITHUB_REPOSITORY`).
    #[arg(long, value_name = "OWNER/NAME")]
    repository: Option<String>,
    /// Resolve without fetching workflow run metadata.
    #[arg(long, action = ArgAction::SetTrue)]
    offline: bool,
}

impl RunArgs {
    /// Converts flags into a run selection.
    fn selection(&self) -> RunSelection {
        RunSelection {
            run_id: self.run_id.clone(),
            platform: self.platform.clone(),
            repository: self.repository.clone(),
            offline: self.offline,
        }
    }
}

/// Configuration for the `resolve` command.
#[derive(Args, Debug)]
struct ResolveCommand {
    /// Run selection flags.
    #[command(flatten)]
    run: RunArgs,
    /// Write the result as step outputs to `GITHUB_OUTPUT`.
    #[arg(long, action = ArgAction::SetTrue)]
    github_output: bool,
    /// Append a link to the run root to `GITHUB_STEP_SUMMARY`.
    #[arg(long, action = ArgAction::SetTrue)]
    step_summary: bool,
}

/// Configuration for the `paths` command.
#[derive(Args, Debug)]
struct PathsCommand {
    /// Run selection flags.
    #[command(flatten)]
    run: RunArgs,
    /// Artifact group to report locations for.
    #[arg(long, value_name = "GROUP")]
    artifact_group: Option<String>,
}

/// Artifact subcommands.
#[derive(Subcommand, Debug)]
enum ArtifactsCommand {
    /// List artifact archives.
    List(ArtifactsListCommand),
    /// Check whether an artifact exists (exit code 1 when absent).
    Exists(ArtifactKeyCommand),
    /// Upload a local file (and its `.sha256sum` sidecar).
    Upload(ArtifactsUploadCommand),
    /// Download an artifact (and its `.sha256sum` sidecar).
    Download(ArtifactsDownloadCommand),
}

/// Configuration for `artifacts list`.
#[derive(Args, Debug)]
struct ArtifactsListCommand {
    /// Run selection flags.
    #[command(flatten)]
    run: RunArgs,
    /// Only list artifacts named `{NAME}_*`.
    #[arg(long, value_name = "NAME")]
    name: Option<String>,
}

/// Configuration for `artifacts exists`.
#[derive(Args, Debug)]
struct ArtifactKeyCommand {
    /// Run selection flags.
    #[command(flatten)]
    run: RunArgs,
    /// Artifact key relative to the run root.
    key: String,
}

/// Configuration for `artifacts upload`.
#[derive(Args, Debug)]
struct ArtifactsUploadCommand {
    /// Run selection flags.
    #[command(flatten)]
    run: RunArgs,
    /// Local file to upload.
    source: PathBuf,
    /// Artifact key (defaults to the source file name).
    #[arg(long, value_name = "KEY")]
    key: Option<String>,
}

/// Configuration for `artifacts download`.
#[derive(Args, Debug)]
struct ArtifactsDownloadCommand {
    /// Run selection flags.
    #[command(flatten)]
    run: RunArgs,
    /// Artifact key relative to the run root.
    key: String,
    /// Destination file (defaults to the key's file name in the working directory).
    #[arg(long, value_name = "PATH")]
    dest: Option<PathBuf>,
}

/// Configuration for the `workflow-runs` command.
#[derive(Args, Debug)]
struct WorkflowRunsCommand {
    /// Workflow file name (`ci.yml`) or numeric id.
    #[arg(long, value_name = "FILE")]
    workflow: String,
    /// Head commit SHA.
    #[arg(long, value_name = "SHA")]
    head_sha: String,
    /// Repository as `owner/name` (defaults to `GITHUB_REPOSITORY`, then ROCm/TheRock).
    #[arg(long, value_name = "OWNER/NAME")]
    repository: Option<String>,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// CLI error wrapper for user-facing messages.
#[derive(Debug, Error)]
#[error("{message}")]
struct CliError {
    /// Human-readable error message.
    message: String,
}

impl CliError {
    /// Constructs a new [`CliError`].
    const fn new(message: String) -> Self {
        Self {
            message,
        }
    }
}

/// CLI result alias for fallible operations.
type CliResult<T> = Result<T, CliError>;

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// CLI entry point returning an exit code.
fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(err) => emit_error(&err.to_string()),
    }
}

/// Executes the CLI command dispatcher.
fn run() -> CliResult<ExitCode> {
    let cli = Cli::parse();
    let context = CliContext::load(cli.config.as_deref(), cli.event_log.as_deref())
        .map_err(CliError::new)?;
    dispatch(&context, cli.command)
}

/// Routes a parsed command to its handler.
fn dispatch(context: &CliContext, command: Commands) -> CliResult<ExitCode> {
    match command {
        Commands::Resolve(command) => command_resolve(context, &command),
        Commands::Paths(command) => command_paths(context, &command),
        Commands::Artifacts {
            command,
        } => command_artifacts(context, command),
        Commands::WorkflowRuns(command) => command_workflow_runs(context, &command),
    }
}

// ============================================================================
// SECTION: Location Commands
// ============================================================================

/// Executes the `resolve` command.
fn command_resolve(context: &CliContext, command: &ResolveCommand) -> CliResult<ExitCode> {
    let root = context.storage_root(&command.run.selection()).map_err(CliError::new)?;
    let report = RootReport::new(&root, None);
    write_json(&report)?;

    if (command.github_output || command.step_summary) && !context.is_ci() {
        write_stderr_line("warning: CI is not set; workflow command files may not be read")
            .map_err(|err| CliError::new(output_error(&err)))?;
    }
    let files = context.workflow_files();
    if command.github_output {
        let written = files
            .set_output(report.step_outputs())
            .map_err(|err| CliError::new(err.to_string()))?;
        warn_if_skipped(written, "GITHUB_OUTPUT", "step outputs")?;
    }
    if command.step_summary {
        let written = files
            .append_step_summary(&summary_markdown(&report))
            .map_err(|err| CliError::new(err.to_string()))?;
        warn_if_skipped(written, "GITHUB_STEP_SUMMARY", "the job summary")?;
    }
    Ok(ExitCode::SUCCESS)
}

/// Executes the `paths` command.
fn command_paths(context: &CliContext, command: &PathsCommand) -> CliResult<ExitCode> {
    let selection = context.backend_selection(&command.run.selection()).map_err(CliError::new)?;
    let staging_dir = context.staging_dir();
    let root = selection.root();
    let report = PathsReport {
        root: RootReport::new(root, staging_dir.as_deref()),
        group: command.artifact_group.as_deref().map(|group| GroupReport::new(root, group)),
    };
    write_json(&report)?;
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Artifact Commands
// ============================================================================

/// Executes an `artifacts` subcommand.
fn command_artifacts(context: &CliContext, command: ArtifactsCommand) -> CliResult<ExitCode> {
    match command {
        ArtifactsCommand::List(command) => {
            let backend = open_backend(context, &command.run)?;
            let names = backend
                .list_artifacts(command.name.as_deref())
                .map_err(|err| CliError::new(err.to_string()))?;
            for name in names {
                write_stdout_line(&name).map_err(|err| CliError::new(output_error(&err)))?;
            }
            Ok(ExitCode::SUCCESS)
        }
        ArtifactsCommand::Exists(command) => {
            let backend = open_backend(context, &command.run)?;
            let exists = backend
                .artifact_exists(&command.key)
                .map_err(|err| CliError::new(err.to_string()))?;
            write_stdout_line(if exists { "true" } else { "false" })
                .map_err(|err| CliError::new(output_error(&err)))?;
            Ok(if exists { ExitCode::SUCCESS } else { ExitCode::FAILURE })
        }
        ArtifactsCommand::Upload(command) => {
            let key = match &command.key {
                Some(key) => key.clone(),
                None => default_key(&command.source)?,
            };
            let backend = open_backend(context, &command.run)?;
            backend
                .upload_artifact(&command.source, &key)
                .map_err(|err| CliError::new(err.to_string()))?;
            Ok(ExitCode::SUCCESS)
        }
        ArtifactsCommand::Download(command) => {
            let dest = command.dest.clone().unwrap_or_else(|| default_dest(&command.key));
            let backend = open_backend(context, &command.run)?;
            backend
                .download_artifact(&command.key, &dest)
                .map_err(|err| CliError::new(err.to_string()))?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Builds the backend for a run selection.
fn open_backend(context: &CliContext, run: &RunArgs) -> CliResult<Box<dyn ArtifactBackend>> {
    let selection = context.backend_selection(&run.selection()).map_err(CliError::new)?;
    create_backend(selection, context.sink()).map_err(|err| CliError::new(err.to_string()))
}

/// Returns the file name of an upload source.
fn default_key(source: &Path) -> CliResult<String> {
    source
        .file_name()
        .and_then(|name| name.to_str())
        .map(str::to_string)
        .ok_or_else(|| {
            CliError::new(format!("cannot derive an artifact key from {}", source.display()))
        })
}

/// Returns the default download destination for a key.
fn default_dest(key: &str) -> PathBuf {
    PathBuf::from(key.rsplit('/').next().unwrap_or(key))
}

// ============================================================================
// SECTION: Workflow Run Commands
// ============================================================================

/// Executes the `workflow-runs` command.
fn command_workflow_runs(
    context: &CliContext,
    command: &WorkflowRunsCommand,
) -> CliResult<ExitCode> {
    let repository = match &command.repository {
        Some(value) => RepositoryId::parse(value),
        None => context.default_repository(),
    }
    .map_err(|err| CliError::new(err.to_string()))?;
    let client = context.github_client().map_err(|err| CliError::new(err.to_string()))?;
    let runs = client
        .list_workflow_runs_for_commit(&repository, &command.workflow, &command.head_sha)
        .map_err(|err| CliError::new(err.to_string()))?;
    write_json(&runs)?;
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Output Helpers
// ============================================================================

/// Writes a value as pretty JSON followed by a newline.
fn write_json<T: Serialize>(value: &T) -> CliResult<()> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|err| CliError::new(format!("failed to render json: {err}")))?;
    write_stdout_line(&text).map_err(|err| CliError::new(output_error(&err)))
}

/// Warns on stderr when a workflow command file was not provided.
fn warn_if_skipped(written: FileWrite, variable: &str, what: &str) -> CliResult<()> {
    if written == FileWrite::Skipped {
        write_stderr_line(&format!("warning: {variable} is not set; skipped writing {what}"))
            .map_err(|err| CliError::new(output_error(&err)))?;
    }
    Ok(())
}

/// Writes a single line to stdout.
fn write_stdout_line(message: &str) -> std::io::Result<()> {
    let mut stdout = std::io::stdout();
    writeln!(&mut stdout, "{message}")
}

/// Writes a single line to stderr.
fn write_stderr_line(message: &str) -> std::io::Result<()> {
    let mut stderr = std::io::stderr();
    writeln!(&mut stderr, "{message}")
}

/// Formats an output stream error.
fn output_error(error: &std::io::Error) -> String {
    format!("failed to write output: {error}")
}

/// Emits an error message and returns a failure exit code.
fn emit_error(message: &str) -> ExitCode {
    let _ = write_stderr_line(&format!("error: {message}"));
    ExitCode::FAILURE
}
