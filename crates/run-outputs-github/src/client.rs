// crates/run-outputs-github/src/client.rs
// ============================================================================
// Module: GitHub REST Client
// Description: Blocking GitHub REST API client for workflow run metadata.
// Purpose: Fetch workflow runs with bounded timeouts and response sizes.
// Dependencies: reqwest, run-outputs-core, serde, serde_json, thiserror
// ============================================================================

//! ## Overview
//! [`GitHubClient`] issues authenticated or anonymous GET requests against the
//! GitHub REST API. Redirects are disabled, cleartext HTTP requires an explicit
//! opt-in, and response bodies are read under a byte limit. Every failure is
//! classified into a [`GitHubApiError`] variant; nothing is retried here.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Read;
use std::time::Duration;

use reqwest::StatusCode;
use reqwest::Url;
use reqwest::blocking::Client;
use reqwest::blocking::Response;
use reqwest::header::ACCEPT;
use reqwest::header::AUTHORIZATION;
use reqwest::redirect::Policy;
use run_outputs_core::RepositoryId;
use run_outputs_core::RunId;
use run_outputs_core::WorkflowRun;
use run_outputs_core::WorkflowRunLookup;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default GitHub REST API base URL.
pub const DEFAULT_API_BASE_URL: &str = "https://api.github.com";
/// Media type requested from the REST API.
const GITHUB_MEDIA_TYPE: &str = "application/vnd.github+json";
/// REST API version header name.
const API_VERSION_HEADER: &str = "X-GitHub-Api-Version";
/// REST API version pinned by this client.
const API_VERSION: &str = "2022-11-28";

// ============================================================================
// SECTION: Configuration
// ============================================================================

/// Configuration for the GitHub client.
#[derive(Clone, PartialEq, Eq)]
pub struct GitHubClientConfig {
    /// API base URL.
    pub api_base_url: String,
    /// Request timeout in milliseconds.
    pub timeout_ms: u64,
    /// User agent string for outbound requests.
    pub user_agent: String,
    /// Maximum response size allowed, in bytes.
    pub max_response_bytes: usize,
    /// Allow cleartext HTTP (disabled by default).
    pub allow_http: bool,
    /// Bearer token; requests are anonymous when unset.
    pub token: Option<String>,
}

impl Default for GitHubClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            timeout_ms: 30_000,
            max_response_bytes: 8 * 1024 * 1024,
            user_agent: concat!("run-outputs/", env!("CARGO_PKG_VERSION")).to_string(),
            allow_http: false,
            token: None,
        }
    }
}

impl std::fmt::Debug for GitHubClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitHubClientConfig")
            .field("api_base_url", &self.api_base_url)
            .field("timeout_ms", &self.timeout_ms)
            .field("user_agent", &self.user_agent)
            .field("max_response_bytes", &self.max_response_bytes)
            .field("allow_http", &self.allow_http)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// GitHub API errors.
///
/// # Invariants
/// - Messages never include the bearer token.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GitHubApiError {
    /// Client configuration or request construction failed.
    #[error("invalid GitHub API request: {0}")]
    Invalid(String),
    /// Server answered with a non-success status.
    #[error("GitHub API request to {url} failed with status {status}: {message}")]
    Status {
        /// Request URL.
        url: String,
        /// HTTP status code.
        status: u16,
        /// Human-readable explanation.
        message: String,
    },
    /// Request exceeded the configured timeout.
    #[error("GitHub API request to {url} timed out")]
    Timeout {
        /// Request URL.
        url: String,
    },
    /// Connection or transport failure.
    #[error("Network error contacting GitHub API at {url}: {message}")]
    Network {
        /// Request URL.
        url: String,
        /// Transport error message.
        message: String,
    },
    /// Response body exceeded the size limit.
    #[error("GitHub API response from {url} exceeds {max_bytes} bytes")]
    TooLarge {
        /// Request URL.
        url: String,
        /// Configured limit.
        max_bytes: usize,
    },
    /// Response body was not the expected JSON.
    #[error("Invalid JSON in GitHub API response from {url}: {message}")]
    InvalidJson {
        /// Request URL.
        url: String,
        /// Decoder error message.
        message: String,
    },
}

impl GitHubApiError {
    /// Returns the HTTP status when the server rejected the request.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Status {
                status, ..
            } => Some(*status),
            _ => None,
        }
    }
}

// ============================================================================
// SECTION: Client
// ============================================================================

/// Response envelope for workflow run listings.
#[derive(Debug, Deserialize)]
struct WorkflowRunsPage {
    /// Runs on this page.
    workflow_runs: Vec<WorkflowRun>,
}

/// Blocking GitHub REST API client.
pub struct GitHubClient {
    /// Client configuration, including limits and policy.
    config: GitHubClientConfig,
    /// Parsed API base URL.
    base_url: Url,
    /// HTTP client used for outbound requests.
    client: Client,
}

impl GitHubClient {
    /// Creates a new client with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns [`GitHubApiError::Invalid`] when the base URL is malformed or
    /// disallowed, or the HTTP client cannot be created.
    pub fn new(config: GitHubClientConfig) -> Result<Self, GitHubApiError> {
        let base_url = Url::parse(config.api_base_url.trim())
            .map_err(|err| GitHubApiError::Invalid(format!("invalid api base url: {err}")))?;
        validate_url(&base_url, config.allow_http)?;
        if base_url.cannot_be_a_base() {
            return Err(GitHubApiError::Invalid("api base url cannot be a base".to_string()));
        }
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .user_agent(config.user_agent.clone())
            .redirect(Policy::none())
            .build()
            .map_err(|_| GitHubApiError::Invalid("http client build failed".to_string()))?;
        Ok(Self {
            config,
            base_url,
            client,
        })
    }

    /// Returns true when requests carry a bearer token.
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        self.config.token.is_some()
    }

    /// Fetches a single workflow run.
    ///
    /// # Errors
    ///
    /// Returns [`GitHubApiError`] on status, transport, or payload failures.
    pub fn workflow_run(
        &self,
        repository: &RepositoryId,
        run_id: &RunId,
    ) -> Result<WorkflowRun, GitHubApiError> {
        let url = self.endpoint(&[
            "repos",
            repository.owner(),
            repository.name(),
            "actions",
            "runs",
            run_id.as_str(),
        ])?;
        self.get_json(url)
    }

    /// Lists runs of a workflow file for a head commit.
    ///
    /// `workflow_file` is the workflow's file name (`ci.yml`) or numeric ID.
    ///
    /// # Errors
    ///
    /// Returns [`GitHubApiError`] on status, transport, or payload failures.
    pub fn list_workflow_runs_for_commit(
        &self,
        repository: &RepositoryId,
        workflow_file: &str,
        head_sha: &str,
    ) -> Result<Vec<WorkflowRun>, GitHubApiError> {
        if workflow_file.is_empty() || head_sha.is_empty() {
            return Err(GitHubApiError::Invalid(
                "workflow file and head sha must be non-empty".to_string(),
            ));
        }
        let mut url = self.endpoint(&[
            "repos",
            repository.owner(),
            repository.name(),
            "actions",
            "workflows",
            workflow_file,
            "runs",
        ])?;
        url.query_pairs_mut().append_pair("head_sha", head_sha);
        let page: WorkflowRunsPage = self.get_json(url)?;
        Ok(page.workflow_runs)
    }

    /// Builds an API URL from path segments under the base URL.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, GitHubApiError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| GitHubApiError::Invalid("api base url cannot be a base".to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Sends a GET request and decodes the JSON body.
    fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, GitHubApiError> {
        let url_text = url.to_string();
        let mut request = self
            .client
            .get(url)
            .header(ACCEPT, GITHUB_MEDIA_TYPE)
            .header(API_VERSION_HEADER, API_VERSION);
        if let Some(token) = &self.config.token {
            request = request.header(AUTHORIZATION, format!("Bearer {token}"));
        }
        let mut response = request.send().map_err(|err| transport_error(&url_text, &err))?;
        let status = response.status();
        if !status.is_success() {
            return Err(GitHubApiError::Status {
                url: url_text,
                status: status.as_u16(),
                message: status_message(status),
            });
        }
        let body =
            read_response_limited(&mut response, self.config.max_response_bytes, &url_text)?;
        serde_json::from_slice(&body).map_err(|err| GitHubApiError::InvalidJson {
            url: url_text,
            message: err.to_string(),
        })
    }
}

impl WorkflowRunLookup for GitHubClient {
    type Error = GitHubApiError;

    fn get_workflow_run(
        &self,
        repository: &RepositoryId,
        run_id: &RunId,
    ) -> Result<WorkflowRun, Self::Error> {
        self.workflow_run(repository, run_id)
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Validates the URL scheme.
fn validate_url(url: &Url, allow_http: bool) -> Result<(), GitHubApiError> {
    match url.scheme() {
        "https" => Ok(()),
        "http" if allow_http => Ok(()),
        "http" => Err(GitHubApiError::Invalid("http:// requires allow_http".to_string())),
        _ => Err(GitHubApiError::Invalid("unsupported url scheme".to_string())),
    }
}

/// Explains a non-success status.
fn status_message(status: StatusCode) -> String {
    match status {
        StatusCode::UNAUTHORIZED => "Authentication failed (check GITHUB_TOKEN)".to_string(),
        StatusCode::FORBIDDEN => {
            "Access denied (check token permissions or API rate limit)".to_string()
        }
        StatusCode::NOT_FOUND => "Resource not found".to_string(),
        other => other.canonical_reason().unwrap_or("unexpected status").to_string(),
    }
}

/// Classifies a transport error.
fn transport_error(url: &str, err: &reqwest::Error) -> GitHubApiError {
    if err.is_timeout() {
        GitHubApiError::Timeout {
            url: url.to_string(),
        }
    } else {
        GitHubApiError::Network {
            url: url.to_string(),
            message: err.to_string(),
        }
    }
}

/// Reads the response body while enforcing a byte limit.
fn read_response_limited(
    response: &mut Response,
    max_bytes: usize,
    url: &str,
) -> Result<Vec<u8>, GitHubApiError> {
    let too_large = || GitHubApiError::TooLarge {
        url: url.to_string(),
        max_bytes,
    };
    let expected_len = response.content_length();
    let max_bytes_u64 = u64::try_from(max_bytes)
        .map_err(|_| GitHubApiError::Invalid("response size limit exceeds u64".to_string()))?;
    if let Some(expected) = expected_len
        && expected > max_bytes_u64
    {
        return Err(too_large());
    }
    let mut buf = Vec::new();
    let limit = max_bytes_u64.saturating_add(1);
    let mut handle = response.take(limit);
    handle.read_to_end(&mut buf).map_err(|err| {
        if err.kind() == std::io::ErrorKind::TimedOut {
            GitHubApiError::Timeout {
                url: url.to_string(),
            }
        } else {
            GitHubApiError::Network {
                url: url.to_string(),
                message: err.to_string(),
            }
        }
    })?;
    if buf.len() > max_bytes {
        return Err(too_large());
    }
    Ok(buf)
}
