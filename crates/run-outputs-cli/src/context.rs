// crates/run-outputs-cli/src/context.rs
// ============================================================================
// Module: CLI Run Context
// Description: Process-boundary wiring for CLI commands.
// Purpose: Combine config, environment, and flags into resolver and backends.
// Dependencies: run-outputs-backend, run-outputs-config, run-outputs-core, run-outputs-github
// ============================================================================

//! ## Overview
//! The environment and config file are read exactly once, here. Everything
//! downstream receives typed values: resolver settings, GitHub client
//! settings, S3 client settings, and the staging directory.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;

use run_outputs_backend::BackendSelection;
use run_outputs_backend::S3ClientSettings;
use run_outputs_config::EnvSnapshot;
use run_outputs_config::OutputsConfig;
use run_outputs_core::BucketResolver;
use run_outputs_core::FileEventSink;
use run_outputs_core::IdentifierError;
use run_outputs_core::OutputsEventSink;
use run_outputs_core::Platform;
use run_outputs_core::RepositoryId;
use run_outputs_core::ResolveError;
use run_outputs_core::RunId;
use run_outputs_core::RunOutputRoot;
use run_outputs_core::StderrEventSink;
use run_outputs_core::WorkflowRunContext;
use run_outputs_core::WorkflowRunSource;
use run_outputs_github::GitHubApiError;
use run_outputs_github::GitHubClient;
use run_outputs_github::GitHubClientConfig;
use run_outputs_github::WorkflowCommandFiles;

// ============================================================================
// SECTION: Run Selection
// ============================================================================

/// Flags selecting the workflow run a command operates on.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSelection {
    /// Run identifier override.
    pub run_id: Option<String>,
    /// Platform override.
    pub platform: Option<String>,
    /// Repository override (`owner/name`).
    pub repository: Option<String>,
    /// Skip the workflow run lookup.
    pub offline: bool,
}

// ============================================================================
// SECTION: Context
// ============================================================================

/// Typed inputs shared by every command.
pub struct CliContext {
    /// Environment snapshot.
    env: EnvSnapshot,
    /// Loaded configuration.
    config: OutputsConfig,
    /// Structured event sink.
    sink: Arc<dyn OutputsEventSink>,
}

impl CliContext {
    /// Creates a context from already-loaded inputs.
    pub fn new(env: EnvSnapshot, config: OutputsConfig, sink: Arc<dyn OutputsEventSink>) -> Self {
        Self {
            env,
            config,
            sink,
        }
    }

    /// Loads config and environment, routing events to `event_log` or stderr.
    ///
    /// # Errors
    ///
    /// Returns a message when the config, environment, or event log is invalid.
    pub fn load(config_path: Option<&Path>, event_log: Option<&Path>) -> Result<Self, String> {
        let env = EnvSnapshot::from_env().map_err(|err| err.to_string())?;
        let config = OutputsConfig::load(config_path, env.config_path.as_deref())
            .map_err(|err| err.to_string())?;
        let sink: Arc<dyn OutputsEventSink> = match event_log {
            Some(path) => Arc::new(
                FileEventSink::new(path)
                    .map_err(|err| format!("failed to open event log {}: {err}", path.display()))?,
            ),
            None => Arc::new(StderrEventSink),
        };
        Ok(Self::new(env, config, sink))
    }

    /// Returns the event sink.
    pub fn sink(&self) -> Arc<dyn OutputsEventSink> {
        Arc::clone(&self.sink)
    }

    /// Returns the runner's workflow command files.
    pub fn workflow_files(&self) -> WorkflowCommandFiles {
        let paths = &self.env.workflow_files;
        WorkflowCommandFiles {
            output: paths.output.clone(),
            env: paths.env.clone(),
            path: paths.path.clone(),
            step_summary: paths.step_summary.clone(),
        }
    }

    /// Returns true when running under a CI runner.
    pub const fn is_ci(&self) -> bool {
        self.env.ci
    }

    /// Returns the staging directory, if local staging is configured.
    pub fn staging_dir(&self) -> Option<PathBuf> {
        self.env.staging_dir(&self.config.local)
    }

    /// Builds the GitHub client with the environment token.
    ///
    /// # Errors
    ///
    /// Returns [`GitHubApiError`] when the client settings are rejected.
    pub fn github_client(&self) -> Result<GitHubClient, GitHubApiError> {
        let settings = &self.config.github;
        GitHubClient::new(GitHubClientConfig {
            api_base_url: settings.api_base_url.clone(),
            timeout_ms: settings.timeout_ms,
            user_agent: settings.user_agent.clone(),
            max_response_bytes: settings.max_response_bytes,
            allow_http: settings.allow_http,
            token: self.env.github_token.clone(),
        })
    }

    /// Builds the bucket resolver over the GitHub client.
    ///
    /// # Errors
    ///
    /// Returns [`GitHubApiError`] when the client cannot be built.
    pub fn resolver(&self) -> Result<BucketResolver<GitHubClient>, GitHubApiError> {
        Ok(BucketResolver::new(self.env.resolver_settings(), self.github_client()?)
            .with_sink(self.sink()))
    }

    /// Returns S3 client settings.
    ///
    /// Requests are unsigned unless configured otherwise or a full set of
    /// session credentials is present.
    pub fn s3_settings(&self) -> S3ClientSettings {
        let store = &self.config.object_store;
        S3ClientSettings {
            region: store.region.clone(),
            endpoint: store.endpoint.clone(),
            force_path_style: store.force_path_style,
            allow_http: store.allow_http,
            anonymous: store.anonymous.unwrap_or(!self.env.aws_session_credentials),
        }
    }

    /// Returns `GITHUB_REPOSITORY`, or the canonical repository when unset.
    ///
    /// # Errors
    ///
    /// Returns [`IdentifierError`] when `GITHUB_REPOSITORY` is malformed.
    pub fn default_repository(&self) -> Result<RepositoryId, IdentifierError> {
        self.env
            .github_repository
            .as_deref()
            .map_or_else(|| Ok(RepositoryId::canonical()), RepositoryId::parse)
    }

    /// Builds the resolver input for a run selection.
    pub fn run_context(&self, selection: &RunSelection) -> WorkflowRunContext {
        let run_id = selection.run_id.clone().map_or_else(|| self.env.run_id.clone(), RunId::new);
        let platform =
            selection.platform.clone().map_or_else(|| self.env.platform_or_host(), Platform::new);
        let context = WorkflowRunContext::new(run_id, platform);
        match &selection.repository {
            Some(repository) => context.with_repository(repository.clone()),
            None => context,
        }
    }

    /// Returns true when resolution must not consult the GitHub API.
    ///
    /// The `local` run id has no workflow record to look up.
    pub fn is_offline(&self, selection: &RunSelection) -> bool {
        selection.offline || self.run_context(selection).run_id.as_str() == RunId::LOCAL
    }

    /// Resolves the storage root for a run, ignoring local staging.
    ///
    /// # Errors
    ///
    /// Returns a message when the client cannot be built or resolution fails.
    pub fn storage_root(&self, selection: &RunSelection) -> Result<RunOutputRoot, String> {
        let context = self.run_context(selection);
        let resolver = self.resolver().map_err(|err| err.to_string())?;
        if self.is_offline(selection) {
            let resolved = resolver
                .resolve(context.repository.as_deref(), WorkflowRunSource::None)
                .map_err(|err| resolve_message(&err))?;
            return Ok(RunOutputRoot::from_resolved(resolved, context.run_id, context.platform));
        }
        RunOutputRoot::from_workflow_run(&resolver, context).map_err(|err| resolve_message(&err))
    }

    /// Chooses the artifact backend for a run.
    ///
    /// # Errors
    ///
    /// Returns a message when the client cannot be built or resolution fails.
    pub fn backend_selection(&self, selection: &RunSelection) -> Result<BackendSelection, String> {
        let staging_dir = self.staging_dir();
        if staging_dir.is_none() && self.is_offline(selection) {
            return Ok(BackendSelection::S3 {
                root: self.storage_root(selection)?,
                settings: self.s3_settings(),
            });
        }
        let resolver = self.resolver().map_err(|err| err.to_string())?;
        BackendSelection::resolve(
            staging_dir,
            self.run_context(selection),
            &resolver,
            self.s3_settings(),
        )
        .map_err(|err| resolve_message(&err))
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Formats a resolution error with its lookup cause.
fn resolve_message(err: &ResolveError) -> String {
    format!("bucket resolution failed: {err}")
}

#[cfg(test)]
mod tests;
