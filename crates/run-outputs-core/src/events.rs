// crates/run-outputs-core/src/events.rs
// ============================================================================
// Module: Run Outputs Events
// Description: Structured events for bucket resolution and artifact transfers.
// Purpose: Emit JSON log lines without a hard dependency on a logging stack.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! Resolution and transfer decisions are recorded as structured events and
//! routed through an [`OutputsEventSink`]. CI jobs use [`StderrEventSink`] so
//! the chosen bucket shows up in job logs; tests use [`NoopEventSink`] or a
//! capturing sink.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs::OpenOptions;
use std::io;
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use serde::Serialize;

// ============================================================================
// SECTION: Types
// ============================================================================

/// How the repository used for resolution was chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RepositorySource {
    /// Supplied by the caller.
    Explicit,
    /// Taken from settings or the canonical default.
    Implicit,
}

/// Bucket resolution event payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BucketResolvedEvent {
    /// Event identifier.
    pub event: &'static str,
    /// Event timestamp (milliseconds since epoch).
    pub timestamp_ms: u128,
    /// Repository used for resolution.
    pub repository: String,
    /// Whether the repository was explicit or defaulted.
    pub repository_source: RepositorySource,
    /// Workflow run identifier when metadata was available.
    pub workflow_run_id: Option<u64>,
    /// Head repository from workflow metadata.
    pub head_repository: Option<String>,
    /// Whether the run was classified as a fork PR.
    pub is_pr_from_fork: bool,
    /// Release type override, if any.
    pub release_type: Option<String>,
    /// Resolved namespace prefix.
    pub external_repo: String,
    /// Resolved bucket name.
    pub bucket: String,
}

/// Direction of an artifact transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferDirection {
    /// Local file copied into the backend.
    Upload,
    /// Backend object copied to a local file.
    Download,
}

/// Artifact transfer event payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArtifactTransferEvent {
    /// Event identifier.
    pub event: &'static str,
    /// Event timestamp (milliseconds since epoch).
    pub timestamp_ms: u128,
    /// Transfer direction.
    pub direction: TransferDirection,
    /// Backend base URI.
    pub base_uri: String,
    /// Artifact key relative to the run root.
    pub artifact_key: String,
    /// Whether a `.sha256sum` sidecar was transferred too.
    pub sidecar: bool,
}

impl ArtifactTransferEvent {
    /// Builds a transfer event stamped with the current time.
    #[must_use]
    pub fn new(
        direction: TransferDirection,
        base_uri: impl Into<String>,
        artifact_key: impl Into<String>,
        sidecar: bool,
    ) -> Self {
        Self {
            event: "artifact_transfer",
            timestamp_ms: now_ms(),
            direction,
            base_uri: base_uri.into(),
            artifact_key: artifact_key.into(),
            sidecar,
        }
    }
}

// ============================================================================
// SECTION: Sinks
// ============================================================================

/// Event sink for run output operations.
pub trait OutputsEventSink: Send + Sync {
    /// Records a bucket resolution.
    fn record_resolution(&self, event: &BucketResolvedEvent);

    /// Records an artifact transfer.
    fn record_transfer(&self, _event: &ArtifactTransferEvent) {}
}

/// Sink that writes JSON lines to stderr.
pub struct StderrEventSink;

impl OutputsEventSink for StderrEventSink {
    fn record_resolution(&self, event: &BucketResolvedEvent) {
        if let Ok(payload) = serde_json::to_string(event) {
            let _ = writeln!(std::io::stderr(), "{payload}");
        }
    }

    fn record_transfer(&self, event: &ArtifactTransferEvent) {
        if let Ok(payload) = serde_json::to_string(event) {
            let _ = writeln!(std::io::stderr(), "{payload}");
        }
    }
}

/// Sink that appends JSON lines to a file.
pub struct FileEventSink {
    /// Output file guarded for concurrent writers.
    file: Mutex<std::fs::File>,
}

impl FileEventSink {
    /// Opens (or creates) the log file in append mode.
    ///
    /// # Errors
    ///
    /// Returns [`io::Error`] when the file cannot be opened.
    pub fn new(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }

    /// Writes one serialized payload line.
    fn write_line<T: Serialize>(&self, event: &T) {
        let Ok(payload) = serde_json::to_string(event) else {
            return;
        };
        if let Ok(mut file) = self.file.lock() {
            let _ = writeln!(file, "{payload}");
        }
    }
}

impl OutputsEventSink for FileEventSink {
    fn record_resolution(&self, event: &BucketResolvedEvent) {
        self.write_line(event);
    }

    fn record_transfer(&self, event: &ArtifactTransferEvent) {
        self.write_line(event);
    }
}

/// Sink that drops all events.
pub struct NoopEventSink;

impl OutputsEventSink for NoopEventSink {
    fn record_resolution(&self, _event: &BucketResolvedEvent) {}
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Returns the current time in milliseconds since the Unix epoch.
pub(crate) fn now_ms() -> u128 {
    SystemTime::now().duration_since(UNIX_EPOCH).map(|elapsed| elapsed.as_millis()).unwrap_or(0)
}
