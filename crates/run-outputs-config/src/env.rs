// crates/run-outputs-config/src/env.rs
// ============================================================================
// Module: Environment Snapshot
// Description: Typed snapshot of the process environment.
// Purpose: Read CI environment variables once at the process boundary.
// Dependencies: run-outputs-core
// ============================================================================

//! ## Overview
//! [`EnvSnapshot`] is the only place that reads CI environment variables.
//! Values are parsed eagerly so malformed input fails at startup instead of
//! silently defaulting. Boolean flags use the strict vocabulary of
//! [`parse_bool`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::env;
use std::path::PathBuf;

use run_outputs_core::Platform;
use run_outputs_core::ResolverSettings;
use run_outputs_core::RunId;

use crate::config::CONFIG_ENV_VAR;
use crate::config::ConfigError;
use crate::config::LocalSettings;
use crate::config::validate_path_string;

// ============================================================================
// SECTION: Variable Names
// ============================================================================

/// Repository running the workflow (`owner/name`).
pub const GITHUB_REPOSITORY: &str = "GITHUB_REPOSITORY";
/// Whether the run is a pull request from a fork.
pub const IS_PR_FROM_FORK: &str = "IS_PR_FROM_FORK";
/// Release type override.
pub const RELEASE_TYPE: &str = "RELEASE_TYPE";
/// Local staging directory; selects the local backend.
pub const THEROCK_LOCAL_STAGING_DIR: &str = "THEROCK_LOCAL_STAGING_DIR";
/// Run identifier override.
pub const THEROCK_RUN_ID: &str = "THEROCK_RUN_ID";
/// Provider-assigned run identifier.
pub const GITHUB_RUN_ID: &str = "GITHUB_RUN_ID";
/// Platform override.
pub const THEROCK_PLATFORM: &str = "THEROCK_PLATFORM";
/// GitHub API token.
pub const GITHUB_TOKEN: &str = "GITHUB_TOKEN";
/// Step output file.
pub const GITHUB_OUTPUT: &str = "GITHUB_OUTPUT";
/// Environment file for later steps.
pub const GITHUB_ENV: &str = "GITHUB_ENV";
/// Path file for later steps.
pub const GITHUB_PATH: &str = "GITHUB_PATH";
/// Job summary file.
pub const GITHUB_STEP_SUMMARY: &str = "GITHUB_STEP_SUMMARY";
/// Set by CI runners.
pub const CI: &str = "CI";
/// Session credential variables; all three must be present for signed S3 access.
pub const AWS_SESSION_VARIABLES: [&str; 3] =
    ["AWS_ACCESS_KEY_ID", "AWS_SECRET_ACCESS_KEY", "AWS_SESSION_TOKEN"];

// ============================================================================
// SECTION: Boolean Parsing
// ============================================================================

/// Values accepted as `true`.
const TRUE_VALUES: [&str; 9] = ["1", "true", "t", "yes", "y", "on", "enable", "enabled", "found"];
/// Values accepted as `false`.
const FALSE_VALUES: [&str; 14] = [
    "0",
    "false",
    "f",
    "no",
    "n",
    "off",
    "disable",
    "disabled",
    "notfound",
    "none",
    "null",
    "nil",
    "undefined",
    "n/a",
];

/// Parses a boolean-like environment value.
///
/// Unset and empty values are `false`. Otherwise the value is trimmed,
/// lowercased, and matched against a fixed vocabulary.
///
/// # Errors
///
/// Returns [`ConfigError::Invalid`] for values outside the vocabulary.
pub fn parse_bool(name: &str, value: Option<&str>) -> Result<bool, ConfigError> {
    let Some(raw) = value.filter(|value| !value.is_empty()) else {
        return Ok(false);
    };
    let normalized = raw.trim().to_ascii_lowercase();
    if TRUE_VALUES.contains(&normalized.as_str()) {
        return Ok(true);
    }
    if FALSE_VALUES.contains(&normalized.as_str()) {
        return Ok(false);
    }
    Err(ConfigError::Invalid(format!("{name} has invalid boolean value '{raw}'")))
}

// ============================================================================
// SECTION: Snapshot
// ============================================================================

/// Parsed CI environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvSnapshot {
    /// `GITHUB_REPOSITORY`, when set and non-empty.
    pub github_repository: Option<String>,
    /// Parsed `IS_PR_FROM_FORK`.
    pub is_pr_from_fork: bool,
    /// `RELEASE_TYPE`, when set and non-empty.
    pub release_type: Option<String>,
    /// `THEROCK_LOCAL_STAGING_DIR`, when set and non-empty.
    pub local_staging_dir: Option<PathBuf>,
    /// `THEROCK_RUN_ID`, else `GITHUB_RUN_ID`, else `local`.
    pub run_id: RunId,
    /// `THEROCK_PLATFORM`, when set and non-empty.
    pub platform: Option<Platform>,
    /// `GITHUB_TOKEN`, when set and non-empty.
    pub github_token: Option<String>,
    /// True when all AWS session credential variables are set.
    pub aws_session_credentials: bool,
    /// True when `CI` is set to any non-empty value.
    pub ci: bool,
    /// `RUN_OUTPUTS_CONFIG`, when set and non-empty.
    pub config_path: Option<String>,
    /// Workflow command file paths.
    pub workflow_files: WorkflowFilePaths,
}

/// Workflow command file paths exported by the CI runner.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkflowFilePaths {
    /// `GITHUB_OUTPUT`.
    pub output: Option<PathBuf>,
    /// `GITHUB_ENV`.
    pub env: Option<PathBuf>,
    /// `GITHUB_PATH`.
    pub path: Option<PathBuf>,
    /// `GITHUB_STEP_SUMMARY`.
    pub step_summary: Option<PathBuf>,
}

impl EnvSnapshot {
    /// Captures the current process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when a value is malformed.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds a snapshot from explicit name/value pairs.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when a value is malformed.
    pub fn from_pairs<I, K, V>(pairs: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let vars: BTreeMap<String, String> =
            pairs.into_iter().map(|(key, value)| (key.into(), value.into())).collect();
        Self::from_lookup(|name| vars.get(name).cloned())
    }

    /// Builds a snapshot from a variable lookup function.
    fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |name: &str| lookup(name).filter(|value| !value.is_empty());

        let is_pr_from_fork = parse_bool(IS_PR_FROM_FORK, lookup(IS_PR_FROM_FORK).as_deref())?;
        let local_staging_dir = match non_empty(THEROCK_LOCAL_STAGING_DIR) {
            Some(value) => {
                validate_path_string(THEROCK_LOCAL_STAGING_DIR, &value)?;
                Some(PathBuf::from(value))
            }
            None => None,
        };
        let run_id = non_empty(THEROCK_RUN_ID)
            .or_else(|| non_empty(GITHUB_RUN_ID))
            .map_or_else(|| RunId::new(RunId::LOCAL), RunId::new);

        Ok(Self {
            github_repository: non_empty(GITHUB_REPOSITORY),
            is_pr_from_fork,
            release_type: non_empty(RELEASE_TYPE),
            local_staging_dir,
            run_id,
            platform: non_empty(THEROCK_PLATFORM).map(Platform::new),
            github_token: non_empty(GITHUB_TOKEN),
            aws_session_credentials: AWS_SESSION_VARIABLES
                .into_iter()
                .all(|name| non_empty(name).is_some()),
            ci: non_empty(CI).is_some(),
            config_path: non_empty(CONFIG_ENV_VAR),
            workflow_files: WorkflowFilePaths {
                output: non_empty(GITHUB_OUTPUT).map(PathBuf::from),
                env: non_empty(GITHUB_ENV).map(PathBuf::from),
                path: non_empty(GITHUB_PATH).map(PathBuf::from),
                step_summary: non_empty(GITHUB_STEP_SUMMARY).map(PathBuf::from),
            },
        })
    }

    /// Returns bucket resolver settings derived from the environment.
    #[must_use]
    pub fn resolver_settings(&self) -> ResolverSettings {
        ResolverSettings {
            default_repository: self.github_repository.clone(),
            is_pr_from_fork: self.is_pr_from_fork,
            release_type: self.release_type.clone(),
        }
    }

    /// Returns the staging directory, preferring the environment over config.
    #[must_use]
    pub fn staging_dir(&self, local: &LocalSettings) -> Option<PathBuf> {
        self.local_staging_dir.clone().or_else(|| {
            local.staging_dir.as_deref().map(|value| PathBuf::from(value.trim()))
        })
    }

    /// Returns the platform override or the host platform.
    #[must_use]
    pub fn platform_or_host(&self) -> Platform {
        self.platform.clone().unwrap_or_else(Platform::host)
    }
}
