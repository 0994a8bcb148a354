// crates/run-outputs-config/src/config.rs
// ============================================================================
// Module: Run Outputs Configuration
// Description: Config file loading and validation for run output tooling.
// Purpose: Provide strict, fail-closed parsing of run-outputs.toml.
// Dependencies: serde, thiserror, toml
// ============================================================================

//! ## Overview
//! Configuration is loaded from an optional TOML file with strict size and
//! path limits. An explicitly requested file (CLI flag or
//! `RUN_OUTPUTS_CONFIG`) must exist; the default `run-outputs.toml` in the
//! working directory is optional and its absence yields defaults. Unknown
//! keys are rejected.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::io;
use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default configuration filename when no path is specified.
pub const DEFAULT_CONFIG_NAME: &str = "run-outputs.toml";
/// Environment variable used to override the config path.
pub const CONFIG_ENV_VAR: &str = "RUN_OUTPUTS_CONFIG";
/// Maximum configuration file size in bytes.
pub(crate) const MAX_CONFIG_FILE_SIZE: usize = 1024 * 1024;
/// Maximum length of a single path component.
pub(crate) const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
pub(crate) const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Default GitHub REST API base URL.
pub const DEFAULT_GITHUB_API_BASE_URL: &str = "https://api.github.com";
/// Default GitHub request timeout in milliseconds.
pub const DEFAULT_GITHUB_TIMEOUT_MS: u64 = 30_000;
/// Minimum GitHub request timeout in milliseconds.
pub(crate) const MIN_GITHUB_TIMEOUT_MS: u64 = 100;
/// Maximum GitHub request timeout in milliseconds.
pub(crate) const MAX_GITHUB_TIMEOUT_MS: u64 = 300_000;
/// Default maximum GitHub response body size in bytes.
pub const DEFAULT_GITHUB_MAX_RESPONSE_BYTES: usize = 8 * 1024 * 1024;
/// Upper bound for the configurable GitHub response size.
pub(crate) const MAX_GITHUB_RESPONSE_BYTES: usize = 64 * 1024 * 1024;
/// Default GitHub user agent.
pub const DEFAULT_GITHUB_USER_AGENT: &str = concat!("run-outputs/", env!("CARGO_PKG_VERSION"));

// ============================================================================
// SECTION: Config Model
// ============================================================================

/// Root configuration for run output tooling.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OutputsConfig {
    /// GitHub REST API client settings.
    #[serde(default)]
    pub github: GitHubSettings,
    /// Object store client settings.
    #[serde(default)]
    pub object_store: ObjectStoreSettings,
    /// Local staging settings.
    #[serde(default)]
    pub local: LocalSettings,
}

impl OutputsConfig {
    /// Loads configuration from disk using the default resolution rules.
    ///
    /// `env_path` is the value of [`CONFIG_ENV_VAR`] captured by
    /// [`crate::EnvSnapshot`]; an explicit `path` takes precedence.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when loading or validation fails.
    pub fn load(path: Option<&Path>, env_path: Option<&str>) -> Result<Self, ConfigError> {
        let (resolved, required) = resolve_path(path, env_path)?;
        validate_path(&resolved)?;
        let bytes = match fs::read(&resolved) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == io::ErrorKind::NotFound && !required => {
                return Ok(Self::default());
            }
            Err(err) => return Err(ConfigError::Io(format!("{}: {err}", resolved.display()))),
        };
        if bytes.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
        }
        let content = std::str::from_utf8(&bytes)
            .map_err(|_| ConfigError::Invalid("config file must be utf-8".to_string()))?;
        Self::from_toml_str(content)
    }

    /// Parses and validates configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when parsing or validation fails.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        if content.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
        }
        let config: Self =
            toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.github.validate()?;
        self.object_store.validate()?;
        self.local.validate()?;
        Ok(())
    }
}

/// GitHub REST API client settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GitHubSettings {
    /// API base URL (`https://api.github.com` or an enterprise host).
    #[serde(default = "default_github_api_base_url")]
    pub api_base_url: String,
    /// Request timeout in milliseconds.
    #[serde(default = "default_github_timeout_ms")]
    pub timeout_ms: u64,
    /// User agent sent with every request.
    #[serde(default = "default_github_user_agent")]
    pub user_agent: String,
    /// Maximum response body size in bytes.
    #[serde(default = "default_github_max_response_bytes")]
    pub max_response_bytes: usize,
    /// Allow a cleartext `http://` base URL (explicit opt-in).
    #[serde(default)]
    pub allow_http: bool,
}

impl Default for GitHubSettings {
    fn default() -> Self {
        Self {
            api_base_url: default_github_api_base_url(),
            timeout_ms: DEFAULT_GITHUB_TIMEOUT_MS,
            user_agent: default_github_user_agent(),
            max_response_bytes: DEFAULT_GITHUB_MAX_RESPONSE_BYTES,
            allow_http: false,
        }
    }
}

impl GitHubSettings {
    /// Validates GitHub client settings.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when a setting is out of range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_endpoint("github.api_base_url", &self.api_base_url, self.allow_http)?;
        if !(MIN_GITHUB_TIMEOUT_MS ..= MAX_GITHUB_TIMEOUT_MS).contains(&self.timeout_ms) {
            return Err(ConfigError::Invalid(format!(
                "github.timeout_ms must be between {MIN_GITHUB_TIMEOUT_MS} and \
                 {MAX_GITHUB_TIMEOUT_MS}"
            )));
        }
        if self.user_agent.trim().is_empty() {
            return Err(ConfigError::Invalid("github.user_agent must be non-empty".to_string()));
        }
        if self.max_response_bytes == 0 || self.max_response_bytes > MAX_GITHUB_RESPONSE_BYTES {
            return Err(ConfigError::Invalid(format!(
                "github.max_response_bytes must be between 1 and {MAX_GITHUB_RESPONSE_BYTES}"
            )));
        }
        Ok(())
    }
}

/// Object store client settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ObjectStoreSettings {
    /// Optional region (defaults to the AWS environment).
    #[serde(default)]
    pub region: Option<String>,
    /// Optional S3-compatible endpoint.
    #[serde(default)]
    pub endpoint: Option<String>,
    /// Force path-style addressing (S3-compatible).
    #[serde(default)]
    pub force_path_style: bool,
    /// Allow non-TLS endpoints (explicit opt-in).
    #[serde(default)]
    pub allow_http: bool,
    /// Force unsigned requests. When unset, requests are unsigned unless
    /// session credentials are present in the environment.
    #[serde(default)]
    pub anonymous: Option<bool>,
}

impl ObjectStoreSettings {
    /// Validates object store settings.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when object store settings are invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(region) = &self.region
            && region.trim().is_empty()
        {
            return Err(ConfigError::Invalid("object_store.region must be non-empty".to_string()));
        }
        if let Some(endpoint) = &self.endpoint {
            validate_endpoint("object_store.endpoint", endpoint, self.allow_http)?;
        }
        Ok(())
    }
}

/// Local staging settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LocalSettings {
    /// Staging directory; selects the local backend when set.
    #[serde(default)]
    pub staging_dir: Option<String>,
}

impl LocalSettings {
    /// Validates local staging settings.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the staging path is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(staging_dir) = &self.staging_dir {
            validate_path_string("local.staging_dir", staging_dir)?;
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration loading or validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O failure while reading configuration.
    #[error("config io error: {0}")]
    Io(String),
    /// TOML parsing error.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Invalid configuration data.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Resolves the config path and whether it must exist.
pub(crate) fn resolve_path(
    path: Option<&Path>,
    env_path: Option<&str>,
) -> Result<(PathBuf, bool), ConfigError> {
    if let Some(path) = path {
        return Ok((path.to_path_buf(), true));
    }
    if let Some(env_path) = env_path.filter(|value| !value.is_empty()) {
        if env_path.len() > MAX_TOTAL_PATH_LENGTH {
            return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
        }
        return Ok((PathBuf::from(env_path), true));
    }
    Ok((PathBuf::from(DEFAULT_CONFIG_NAME), false))
}

/// Validates the resolved path against length limits.
fn validate_path(path: &Path) -> Result<(), ConfigError> {
    let text = path.to_string_lossy();
    if text.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
    }
    for component in path.components() {
        let value = component.as_os_str().to_string_lossy();
        if value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid("config path component too long".to_string()));
        }
    }
    Ok(())
}

/// Validates a path string against length constraints.
pub(crate) fn validate_path_string(field: &str, value: &str) -> Result<(), ConfigError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::Invalid(format!("{field} must be non-empty")));
    }
    if trimmed.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid(format!("{field} exceeds max length")));
    }
    for component in Path::new(trimmed).components() {
        let component_value = component.as_os_str().to_string_lossy();
        if component_value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid(format!("{field} path component too long")));
        }
    }
    Ok(())
}

/// Validates an HTTP(S) endpoint string.
fn validate_endpoint(field: &str, value: &str, allow_http: bool) -> Result<(), ConfigError> {
    let trimmed = value.trim();
    if !(trimmed.starts_with("https://") || trimmed.starts_with("http://")) {
        return Err(ConfigError::Invalid(format!("{field} must include http:// or https://")));
    }
    if trimmed.starts_with("http://") && !allow_http {
        return Err(ConfigError::Invalid(format!("{field} uses http:// without allow_http")));
    }
    Ok(())
}

/// Default GitHub API base URL.
fn default_github_api_base_url() -> String {
    DEFAULT_GITHUB_API_BASE_URL.to_string()
}

/// Default GitHub timeout.
const fn default_github_timeout_ms() -> u64 {
    DEFAULT_GITHUB_TIMEOUT_MS
}

/// Default GitHub user agent.
fn default_github_user_agent() -> String {
    DEFAULT_GITHUB_USER_AGENT.to_string()
}

/// Default GitHub response size limit.
const fn default_github_max_response_bytes() -> usize {
    DEFAULT_GITHUB_MAX_RESPONSE_BYTES
}
