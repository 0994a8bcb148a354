// crates/run-outputs-backend/src/backend.rs
// ============================================================================
// Module: Artifact Backend Interface
// Description: Storage-agnostic interface for run artifacts.
// Purpose: Define the backend trait, errors, and shared key rules.
// Dependencies: thiserror
// ============================================================================

//! ## Overview
//! An [`ArtifactBackend`] stores build artifact archives for one run root.
//! Keys are file names relative to the root; every operation validates its
//! key before touching storage. Listings only report archives
//! (`.tar.zst`, `.tar.xz`) and never their `.sha256sum` sidecars; uploads and
//! downloads carry the sidecar along when it exists.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::Component;
use std::path::Path;

use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Recognized artifact archive extensions.
pub const ARCHIVE_EXTENSIONS: [&str; 2] = [".tar.zst", ".tar.xz"];
/// Checksum sidecar suffix.
pub const SHA256_SIDECAR_SUFFIX: &str = ".sha256sum";
/// Maximum length of a single key segment.
pub(crate) const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total key length.
pub(crate) const MAX_TOTAL_PATH_LENGTH: usize = 4096;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Artifact backend errors.
#[derive(Debug, Error)]
pub enum BackendError {
    /// Artifact or source file does not exist.
    #[error("artifact not found: {0}")]
    NotFound(String),
    /// Invalid key or configuration.
    #[error("invalid artifact request: {0}")]
    Invalid(String),
    /// Local filesystem failure.
    #[error("artifact io error: {0}")]
    Io(String),
    /// Storage service failure.
    #[error("artifact backend error: {0}")]
    Backend(String),
}

// ============================================================================
// SECTION: Backend Trait
// ============================================================================

/// Storage backend for one run's artifacts.
pub trait ArtifactBackend: Send + Sync {
    /// Location of the run root (`s3://bucket/prefix` or a local directory).
    fn base_uri(&self) -> String;

    /// Lists archive file names, sorted and de-duplicated.
    ///
    /// With `name_filter`, only names starting with `{name_filter}_` are
    /// returned.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError`] when storage cannot be listed.
    fn list_artifacts(&self, name_filter: Option<&str>) -> Result<Vec<String>, BackendError>;

    /// Copies an artifact (and its sidecar, if any) to `dest`.
    ///
    /// The sidecar is written next to `dest` as `{artifact_key}.sha256sum`.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::NotFound`] when the artifact is missing.
    fn download_artifact(&self, artifact_key: &str, dest: &Path) -> Result<(), BackendError>;

    /// Stores a local file (and its sidecar, if any) under `artifact_key`.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::NotFound`] when `source` is missing.
    fn upload_artifact(&self, source: &Path, artifact_key: &str) -> Result<(), BackendError>;

    /// Returns true when the artifact exists.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError`] when existence cannot be determined.
    fn artifact_exists(&self, artifact_key: &str) -> Result<bool, BackendError>;
}

// ============================================================================
// SECTION: Key Rules
// ============================================================================

/// Returns true for recognized archive file names.
#[must_use]
pub fn is_artifact_archive(filename: &str) -> bool {
    ARCHIVE_EXTENSIONS.iter().any(|extension| filename.ends_with(extension))
}

/// Returns true when `filename` passes the optional artifact name filter.
#[must_use]
pub fn matches_name_filter(filename: &str, name_filter: Option<&str>) -> bool {
    name_filter.is_none_or(|name| {
        filename.strip_prefix(name).is_some_and(|rest| rest.starts_with('_'))
    })
}

/// Returns the sidecar key for an artifact key.
#[must_use]
pub fn sidecar_key(artifact_key: &str) -> String {
    format!("{artifact_key}{SHA256_SIDECAR_SUFFIX}")
}

/// Validates an artifact key relative to the run root.
///
/// # Errors
///
/// Returns [`BackendError::Invalid`] for empty, absolute, traversing,
/// backslashed, or over-long keys.
pub fn validate_artifact_key(key: &str) -> Result<(), BackendError> {
    if key.is_empty() {
        return Err(BackendError::Invalid("artifact key must be set".to_string()));
    }
    if key.contains('\\') {
        return Err(BackendError::Invalid("artifact key must not contain backslashes".to_string()));
    }
    if key.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(BackendError::Invalid("artifact key exceeds length limit".to_string()));
    }
    if key.starts_with('/') || Path::new(key).is_absolute() {
        return Err(BackendError::Invalid("artifact key must be relative".to_string()));
    }
    for segment in key.split('/') {
        validate_segment(segment)?;
    }
    for component in Path::new(key).components() {
        if !matches!(component, Component::Normal(_)) {
            return Err(BackendError::Invalid(
                "artifact key must be relative without traversal".to_string(),
            ));
        }
    }
    Ok(())
}

/// Validates a single key segment.
fn validate_segment(value: &str) -> Result<(), BackendError> {
    if value.is_empty() || value == "." || value == ".." {
        return Err(BackendError::Invalid(format!("artifact key segment '{value}' is invalid")));
    }
    if value.len() > MAX_PATH_COMPONENT_LENGTH {
        return Err(BackendError::Invalid("artifact key segment exceeds length limit".to_string()));
    }
    Ok(())
}

/// Sorts, de-duplicates, and filters candidate file names.
pub(crate) fn collect_archives<I>(names: I, name_filter: Option<&str>) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let mut archives: Vec<String> = names
        .into_iter()
        .filter(|name| is_artifact_archive(name) && matches_name_filter(name, name_filter))
        .collect();
    archives.sort();
    archives.dedup();
    archives
}
