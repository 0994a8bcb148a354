// crates/run-outputs-cli/src/report.rs
// ============================================================================
// Module: CLI Reports
// Description: JSON views of run output locations.
// Purpose: Stable machine-readable output for `resolve` and `paths`.
// Dependencies: run-outputs-core, serde
// ============================================================================

//! ## Overview
//! Serializable location reports. Field names are part of the CLI contract
//! and are read by CI scripts.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::Path;

use run_outputs_core::RunOutputRoot;
use serde::Serialize;

// ============================================================================
// SECTION: Reports
// ============================================================================

/// Location of a run root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RootReport {
    /// Bucket name.
    pub bucket: String,
    /// Namespace prefix (`""` or `{owner}-{name}/`).
    pub external_repo: String,
    /// Run identifier.
    pub run_id: String,
    /// Platform label.
    pub platform: String,
    /// Run key prefix.
    pub prefix: String,
    /// Storage URI of the run root.
    pub s3_uri: String,
    /// Public URL of the run root.
    pub https_url: String,
    /// Local mirror of the run root, when staging locally.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub local_path: Option<String>,
}

impl RootReport {
    /// Builds the report for a root.
    pub fn new(root: &RunOutputRoot, staging_dir: Option<&Path>) -> Self {
        Self {
            bucket: root.bucket().to_string(),
            external_repo: root.external_repo().to_string(),
            run_id: root.run_id().to_string(),
            platform: root.platform().to_string(),
            prefix: root.prefix(),
            s3_uri: root.s3_uri(),
            https_url: root.https_url(),
            local_path: staging_dir.map(|dir| root.local_path(dir).display().to_string()),
        }
    }

    /// Returns `(name, value)` pairs for step outputs.
    pub fn step_outputs(&self) -> Vec<(&'static str, &str)> {
        vec![
            ("bucket", self.bucket.as_str()),
            ("external_repo", self.external_repo.as_str()),
            ("run_prefix", self.prefix.as_str()),
            ("s3_uri", self.s3_uri.as_str()),
            ("https_url", self.https_url.as_str()),
        ]
    }
}

/// Locations of one artifact group's outputs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupReport {
    /// Artifact group name.
    pub artifact_group: String,
    /// Artifact index page.
    pub artifact_index_url: String,
    /// Log directory URI.
    pub logs_s3_uri: String,
    /// Log directory URL.
    pub logs_https_url: String,
    /// Log index page.
    pub log_index_url: String,
    /// Build timing report.
    pub build_time_analysis_url: String,
    /// Manifest URI.
    pub manifest_s3_uri: String,
    /// Manifest URL.
    pub manifest_url: String,
    /// Python package key prefix.
    pub python_packages_prefix: String,
    /// Native package key prefix.
    pub packages_prefix: String,
    /// Report key prefix.
    pub reports_prefix: String,
}

impl GroupReport {
    /// Builds the report for an artifact group.
    pub fn new(root: &RunOutputRoot, artifact_group: &str) -> Self {
        Self {
            artifact_group: artifact_group.to_string(),
            artifact_index_url: root.artifact_index_url(artifact_group),
            logs_s3_uri: root.logs_s3_uri(artifact_group),
            logs_https_url: root.logs_https_url(artifact_group),
            log_index_url: root.log_index_url(artifact_group),
            build_time_analysis_url: root.build_time_analysis_url(artifact_group),
            manifest_s3_uri: root.manifest_s3_uri(artifact_group),
            manifest_url: root.manifest_url(artifact_group),
            python_packages_prefix: root.python_packages_prefix(artifact_group),
            packages_prefix: root.packages_prefix(artifact_group),
            reports_prefix: root.reports_prefix(artifact_group),
        }
    }
}

/// Output of the `paths` command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PathsReport {
    /// Run root.
    pub root: RootReport,
    /// Artifact group locations, when a group was requested.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group: Option<GroupReport>,
}

/// Markdown line linking a run root from a job summary.
pub fn summary_markdown(report: &RootReport) -> String {
    format!("Run outputs: [{}]({})", report.s3_uri, report.https_url)
}
