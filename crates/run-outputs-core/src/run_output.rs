// crates/run-outputs-core/src/run_output.rs
// ============================================================================
// Module: Run Output Root
// Description: Canonical storage layout for all outputs of a workflow run.
// Purpose: Single source of truth for keys, URIs, URLs, and local paths.
// Dependencies: crate::{bucket, identifiers, workflow}
// ============================================================================

//! ## Overview
//! A [`RunOutputRoot`] maps one workflow run on one platform to a directory
//! of outputs. Every key is rooted at `{external_repo}{run_id}-{platform}`:
//!
//! ```text
//! {prefix}/
//! ├── {name}_{component}_{family}.tar.xz     build artifacts (at the root)
//! ├── index-{artifact_group}.html            per-group artifact index
//! ├── logs/{artifact_group}/...              build logs and log index
//! ├── manifests/{artifact_group}/therock_manifest.json
//! ├── python/{artifact_group}/...            python packages
//! ├── packages/{artifact_group}/...          native packages
//! └── reports/{artifact_group}/...           reports
//! ```
//!
//! Multiple jobs of one run share the prefix and are separated by artifact
//! group. The same layout is mirrored under a local staging directory by
//! [`RunOutputRoot::local_path`].
//!
//! Roots are immutable once built; fields are only readable:
//!
//! ```compile_fail
//! use run_outputs_core::RunOutputRoot;
//!
//! let mut root = RunOutputRoot::for_local(None, None, None);
//! root.bucket = "other".to_string();
//! ```

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::Path;
use std::path::PathBuf;

use serde::Serialize;

use crate::bucket::BucketResolver;
use crate::bucket::ResolveError;
use crate::bucket::ResolvedBucket;
use crate::bucket::WorkflowRunSource;
use crate::identifiers::Platform;
use crate::identifiers::RunId;
use crate::workflow::WorkflowRun;
use crate::workflow::WorkflowRunLookup;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Public hostname suffix for bucket HTTPS URLs.
pub const PUBLIC_STORAGE_DOMAIN: &str = "s3.amazonaws.com";
/// Storage URI scheme.
pub const STORAGE_SCHEME: &str = "s3";
/// Bucket placeholder for local roots.
pub const LOCAL_BUCKET: &str = "local";
/// Manifest filename inside `manifests/{artifact_group}/`.
pub const MANIFEST_FILENAME: &str = "therock_manifest.json";
/// Log index filename inside `logs/{artifact_group}/`.
pub const LOG_INDEX_FILENAME: &str = "index.html";
/// Build timing report filename inside `logs/{artifact_group}/`.
pub const BUILD_TIME_ANALYSIS_FILENAME: &str = "build_time_analysis.html";

// ============================================================================
// SECTION: Factory Inputs
// ============================================================================

/// Inputs for [`RunOutputRoot::from_workflow_run`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkflowRunContext {
    /// Workflow run identifier.
    pub run_id: RunId,
    /// Platform label.
    pub platform: Platform,
    /// Explicit repository (`owner/name`), overriding settings.
    pub repository: Option<String>,
    /// Pre-fetched workflow metadata; skips the lookup when set.
    pub workflow_run: Option<WorkflowRun>,
}

impl WorkflowRunContext {
    /// Creates a context with no repository override or metadata.
    #[must_use]
    pub fn new(run_id: impl Into<RunId>, platform: impl Into<Platform>) -> Self {
        Self {
            run_id: run_id.into(),
            platform: platform.into(),
            repository: None,
            workflow_run: None,
        }
    }

    /// Sets the explicit repository.
    #[must_use]
    pub fn with_repository(mut self, repository: impl Into<String>) -> Self {
        self.repository = Some(repository.into());
        self
    }

    /// Sets pre-fetched workflow metadata.
    #[must_use]
    pub fn with_workflow_run(mut self, workflow_run: WorkflowRun) -> Self {
        self.workflow_run = Some(workflow_run);
        self
    }
}

// ============================================================================
// SECTION: Run Output Root
// ============================================================================

/// Root location for a workflow run's outputs.
///
/// # Invariants
/// - Fields never change after construction; every accessor is a pure
///   function of them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct RunOutputRoot {
    /// Bucket name.
    bucket: String,
    /// Namespace prefix (`""` or `{owner}-{name}/`).
    external_repo: String,
    /// Workflow run identifier.
    run_id: RunId,
    /// Platform label.
    platform: Platform,
}

impl RunOutputRoot {
    /// Builds a root from an already-resolved bucket.
    ///
    /// [`ResolvedBucket`] is only produced by the selection rules, so the
    /// namespace prefix is always `""` or `{owner}-{name}/`.
    #[must_use]
    pub fn from_resolved(
        resolved: ResolvedBucket,
        run_id: impl Into<RunId>,
        platform: impl Into<Platform>,
    ) -> Self {
        let (external_repo, bucket) = resolved.into_parts();
        Self {
            bucket,
            external_repo,
            run_id: run_id.into(),
            platform: platform.into(),
        }
    }

    /// Builds a root for a CI workflow run.
    ///
    /// The run identifier is always handed to the resolver, so metadata is
    /// fetched through the lookup unless `context.workflow_run` is set.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError`] when bucket resolution fails.
    pub fn from_workflow_run<L: WorkflowRunLookup>(
        resolver: &BucketResolver<L>,
        context: WorkflowRunContext,
    ) -> Result<Self, ResolveError> {
        let source = match context.workflow_run {
            Some(run) => WorkflowRunSource::Record(run),
            None => WorkflowRunSource::Lookup(context.run_id.clone()),
        };
        let resolved = resolver.resolve(context.repository.as_deref(), source)?;
        Ok(Self::from_resolved(resolved, context.run_id, context.platform))
    }

    /// Builds a root for local development and testing.
    ///
    /// Defaults: run id `local`, the host platform, bucket `local`. Never
    /// touches the network.
    #[must_use]
    pub fn for_local(
        run_id: Option<RunId>,
        platform: Option<Platform>,
        bucket: Option<String>,
    ) -> Self {
        Self {
            bucket: bucket.unwrap_or_else(|| LOCAL_BUCKET.to_string()),
            external_repo: String::new(),
            run_id: run_id.unwrap_or_else(|| RunId::new(RunId::LOCAL)),
            platform: platform.unwrap_or_else(Platform::host),
        }
    }

    // ------------------------------------------------------------------------
    // Fields
    // ------------------------------------------------------------------------

    /// Returns the bucket name.
    #[must_use]
    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Returns the namespace prefix.
    #[must_use]
    pub fn external_repo(&self) -> &str {
        &self.external_repo
    }

    /// Returns the run identifier.
    #[must_use]
    pub const fn run_id(&self) -> &RunId {
        &self.run_id
    }

    /// Returns the platform label.
    #[must_use]
    pub const fn platform(&self) -> &Platform {
        &self.platform
    }

    // ------------------------------------------------------------------------
    // Root paths
    // ------------------------------------------------------------------------

    /// Key prefix for this run (no leading or trailing slash).
    #[must_use]
    pub fn prefix(&self) -> String {
        format!("{}{}-{}", self.external_repo, self.run_id, self.platform)
    }

    /// Storage URI for the run root.
    #[must_use]
    pub fn s3_uri(&self) -> String {
        self.s3_uri_for(&self.prefix())
    }

    /// Public HTTPS URL for the run root.
    #[must_use]
    pub fn https_url(&self) -> String {
        self.https_url_for(&self.prefix())
    }

    /// Local directory mirroring the storage layout under `staging_dir`.
    #[must_use]
    pub fn local_path(&self, staging_dir: &Path) -> PathBuf {
        let mut path = staging_dir.to_path_buf();
        for segment in self.prefix().split('/').filter(|segment| !segment.is_empty()) {
            path.push(segment);
        }
        path
    }

    /// Storage URI for an arbitrary key in this bucket.
    #[must_use]
    pub fn s3_uri_for(&self, key: &str) -> String {
        format!("{STORAGE_SCHEME}://{}/{key}", self.bucket)
    }

    /// Public HTTPS URL for an arbitrary key in this bucket.
    #[must_use]
    pub fn https_url_for(&self, key: &str) -> String {
        format!("https://{}.{PUBLIC_STORAGE_DOMAIN}/{key}", self.bucket)
    }

    // ------------------------------------------------------------------------
    // Build artifacts (stored at the run root)
    // ------------------------------------------------------------------------

    /// Key for a build artifact file.
    #[must_use]
    pub fn artifact_s3_key(&self, filename: &str) -> String {
        format!("{}/{filename}", self.prefix())
    }

    /// Storage URI for a build artifact file.
    #[must_use]
    pub fn artifact_s3_uri(&self, filename: &str) -> String {
        self.s3_uri_for(&self.artifact_s3_key(filename))
    }

    /// Public URL for a build artifact file.
    #[must_use]
    pub fn artifact_https_url(&self, filename: &str) -> String {
        self.https_url_for(&self.artifact_s3_key(filename))
    }

    /// Key for the per-group artifact index page.
    #[must_use]
    pub fn artifact_index_s3_key(&self, artifact_group: &str) -> String {
        format!("{}/index-{artifact_group}.html", self.prefix())
    }

    /// Storage URI for the per-group artifact index page.
    #[must_use]
    pub fn artifact_index_s3_uri(&self, artifact_group: &str) -> String {
        self.s3_uri_for(&self.artifact_index_s3_key(artifact_group))
    }

    /// Public URL for the per-group artifact index page.
    #[must_use]
    pub fn artifact_index_url(&self, artifact_group: &str) -> String {
        self.https_url_for(&self.artifact_index_s3_key(artifact_group))
    }

    // ------------------------------------------------------------------------
    // Logs
    // ------------------------------------------------------------------------

    /// Key prefix for a group's logs directory (no trailing slash).
    #[must_use]
    pub fn logs_prefix(&self, artifact_group: &str) -> String {
        format!("{}/logs/{artifact_group}", self.prefix())
    }

    /// Storage URI for a group's logs directory.
    #[must_use]
    pub fn logs_s3_uri(&self, artifact_group: &str) -> String {
        self.s3_uri_for(&self.logs_prefix(artifact_group))
    }

    /// Public URL for a group's logs directory.
    #[must_use]
    pub fn logs_https_url(&self, artifact_group: &str) -> String {
        self.https_url_for(&self.logs_prefix(artifact_group))
    }

    /// Key for a log file.
    #[must_use]
    pub fn log_file_s3_key(&self, artifact_group: &str, filename: &str) -> String {
        format!("{}/{filename}", self.logs_prefix(artifact_group))
    }

    /// Public URL for the log index page.
    #[must_use]
    pub fn log_index_url(&self, artifact_group: &str) -> String {
        self.https_url_for(&self.log_file_s3_key(artifact_group, LOG_INDEX_FILENAME))
    }

    /// Public URL for the build timing report (produced on Linux only).
    #[must_use]
    pub fn build_time_analysis_url(&self, artifact_group: &str) -> String {
        self.https_url_for(&self.log_file_s3_key(artifact_group, BUILD_TIME_ANALYSIS_FILENAME))
    }

    // ------------------------------------------------------------------------
    // Manifests
    // ------------------------------------------------------------------------

    /// Key prefix for a group's manifests directory (no trailing slash).
    #[must_use]
    pub fn manifests_prefix(&self, artifact_group: &str) -> String {
        format!("{}/manifests/{artifact_group}", self.prefix())
    }

    /// Key for a group's build manifest.
    #[must_use]
    pub fn manifest_s3_key(&self, artifact_group: &str) -> String {
        format!("{}/{MANIFEST_FILENAME}", self.manifests_prefix(artifact_group))
    }

    /// Storage URI for a group's build manifest.
    #[must_use]
    pub fn manifest_s3_uri(&self, artifact_group: &str) -> String {
        self.s3_uri_for(&self.manifest_s3_key(artifact_group))
    }

    /// Public URL for a group's build manifest.
    #[must_use]
    pub fn manifest_url(&self, artifact_group: &str) -> String {
        self.https_url_for(&self.manifest_s3_key(artifact_group))
    }

    // ------------------------------------------------------------------------
    // Python packages
    // ------------------------------------------------------------------------

    /// Key prefix for a group's python packages (no trailing slash).
    #[must_use]
    pub fn python_packages_prefix(&self, artifact_group: &str) -> String {
        format!("{}/python/{artifact_group}", self.prefix())
    }

    /// Key for a python package file.
    #[must_use]
    pub fn python_package_s3_key(&self, artifact_group: &str, filename: &str) -> String {
        format!("{}/{filename}", self.python_packages_prefix(artifact_group))
    }

    /// Storage URI for a python package file.
    #[must_use]
    pub fn python_package_s3_uri(&self, artifact_group: &str, filename: &str) -> String {
        self.s3_uri_for(&self.python_package_s3_key(artifact_group, filename))
    }

    /// Public URL for a python package file.
    #[must_use]
    pub fn python_package_url(&self, artifact_group: &str, filename: &str) -> String {
        self.https_url_for(&self.python_package_s3_key(artifact_group, filename))
    }

    // ------------------------------------------------------------------------
    // Native packages
    // ------------------------------------------------------------------------

    /// Key prefix for a group's native packages (no trailing slash).
    #[must_use]
    pub fn packages_prefix(&self, artifact_group: &str) -> String {
        format!("{}/packages/{artifact_group}", self.prefix())
    }

    /// Key for a native package file.
    #[must_use]
    pub fn package_s3_key(&self, artifact_group: &str, filename: &str) -> String {
        format!("{}/{filename}", self.packages_prefix(artifact_group))
    }

    /// Storage URI for a native package file.
    #[must_use]
    pub fn package_s3_uri(&self, artifact_group: &str, filename: &str) -> String {
        self.s3_uri_for(&self.package_s3_key(artifact_group, filename))
    }

    /// Public URL for a native package file.
    #[must_use]
    pub fn package_url(&self, artifact_group: &str, filename: &str) -> String {
        self.https_url_for(&self.package_s3_key(artifact_group, filename))
    }

    // ------------------------------------------------------------------------
    // Reports
    // ------------------------------------------------------------------------

    /// Key prefix for a group's reports (no trailing slash).
    #[must_use]
    pub fn reports_prefix(&self, artifact_group: &str) -> String {
        format!("{}/reports/{artifact_group}", self.prefix())
    }

    /// Key for a report file.
    #[must_use]
    pub fn report_s3_key(&self, artifact_group: &str, filename: &str) -> String {
        format!("{}/{filename}", self.reports_prefix(artifact_group))
    }

    /// Storage URI for a report file.
    #[must_use]
    pub fn report_s3_uri(&self, artifact_group: &str, filename: &str) -> String {
        self.s3_uri_for(&self.report_s3_key(artifact_group, filename))
    }

    /// Public URL for a report file.
    #[must_use]
    pub fn report_url(&self, artifact_group: &str, filename: &str) -> String {
        self.https_url_for(&self.report_s3_key(artifact_group, filename))
    }
}
