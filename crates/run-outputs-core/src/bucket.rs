// crates/run-outputs-core/src/bucket.rs
// ============================================================================
// Module: Bucket Resolution
// Description: Storage bucket and namespace selection for workflow runs.
// Purpose: Map repository, fork status, release type, and run date to a bucket.
// Dependencies: serde, thiserror, time
// ============================================================================

//! ## Overview
//! Bucket resolution decides where a workflow run's outputs live. The rules
//! are evaluated in a fixed priority order:
//!
//! 1. A release type forces `therock-{release_type}-artifacts`.
//! 2. The canonical repository (not a fork) uses `therock-ci-artifacts`, or
//!    the legacy `therock-artifacts` for runs updated at or before the cutover.
//! 3. The internal releases repository (not a fork) uses
//!    `therock-artifacts-internal`.
//! 4. Everything else uses `therock-ci-artifacts-external`, or the legacy
//!    `therock-artifacts-external` for runs updated at or before the cutover.
//!
//! Non-canonical repositories and forks are namespaced with an
//! `{owner}-{name}/` prefix. When no workflow metadata is available the
//! date rule is skipped and the fork flag comes from [`ResolverSettings`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::error::Error;
use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use time::OffsetDateTime;
use time::macros::datetime;

use crate::events::BucketResolvedEvent;
use crate::events::NoopEventSink;
use crate::events::OutputsEventSink;
use crate::events::RepositorySource;
use crate::events::now_ms;
use crate::identifiers::CANONICAL_REPOSITORY;
use crate::identifiers::IdentifierError;
use crate::identifiers::RepositoryId;
use crate::identifiers::RunId;
use crate::workflow::WorkflowRun;
use crate::workflow::WorkflowRunLookup;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Runs updated at or before this instant use the legacy bucket names.
pub const BUCKET_CUTOVER: OffsetDateTime = datetime!(2025-11-11 16:18:48 UTC);
/// Bucket for the canonical repository.
pub const CI_BUCKET: &str = "therock-ci-artifacts";
/// Legacy bucket for the canonical repository.
pub const LEGACY_CI_BUCKET: &str = "therock-artifacts";
/// Bucket for the internal releases repository.
pub const INTERNAL_BUCKET: &str = "therock-artifacts-internal";
/// Bucket for forks and non-canonical repositories.
pub const EXTERNAL_BUCKET: &str = "therock-ci-artifacts-external";
/// Legacy bucket for forks and non-canonical repositories.
pub const LEGACY_EXTERNAL_BUCKET: &str = "therock-artifacts-external";

// ============================================================================
// SECTION: Settings
// ============================================================================

/// Process-level inputs to bucket resolution.
///
/// Populated once at the process boundary (environment or config file) and
/// passed in explicitly.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolverSettings {
    /// Repository used when the caller does not supply one.
    pub default_repository: Option<String>,
    /// Fork flag used when no workflow metadata is available.
    pub is_pr_from_fork: bool,
    /// Release type override (`nightly`, `release`, ...).
    pub release_type: Option<String>,
}

impl ResolverSettings {
    /// Returns the release type, treating an empty value as unset.
    #[must_use]
    pub fn effective_release_type(&self) -> Option<&str> {
        self.release_type.as_deref().filter(|value| !value.is_empty())
    }
}

// ============================================================================
// SECTION: Inputs and Outputs
// ============================================================================

/// Where workflow metadata for a resolution comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkflowRunSource {
    /// No metadata; fork status comes from settings and the date rule is skipped.
    None,
    /// Fetch metadata for this run through the lookup.
    Lookup(RunId),
    /// Use an already-fetched record.
    Record(WorkflowRun),
}

/// Resolved storage location for a run.
///
/// # Invariants
/// - `external_repo` is empty or `{owner}-{name}/` (exactly one trailing `/`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ResolvedBucket {
    /// Namespace prefix inside the bucket.
    external_repo: String,
    /// Bucket name.
    bucket: String,
}

impl ResolvedBucket {
    /// Returns the namespace prefix (`""` or `{owner}-{name}/`).
    #[must_use]
    pub fn external_repo(&self) -> &str {
        &self.external_repo
    }

    /// Returns the bucket name.
    #[must_use]
    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Splits into `(external_repo, bucket)`.
    #[must_use]
    pub fn into_parts(self) -> (String, String) {
        (self.external_repo, self.bucket)
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Bucket resolution errors.
///
/// # Invariants
/// - Lookup failures keep the original error as their source.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// Repository identifier is malformed.
    #[error(transparent)]
    InvalidRepository(#[from] IdentifierError),
    /// Workflow metadata lookup failed.
    #[error("workflow run lookup failed: {0}")]
    Lookup(#[source] Box<dyn Error + Send + Sync>),
    /// Workflow metadata carried an unparseable timestamp.
    #[error("invalid workflow run updated_at '{value}': {reason}")]
    InvalidTimestamp {
        /// Raw timestamp value.
        value: String,
        /// Parser error message.
        reason: String,
    },
}

// ============================================================================
// SECTION: Resolver
// ============================================================================

/// Resolves storage buckets for workflow runs.
pub struct BucketResolver<L> {
    /// Process-level settings.
    settings: ResolverSettings,
    /// Workflow metadata lookup.
    lookup: L,
    /// Event sink for resolution decisions.
    sink: Arc<dyn OutputsEventSink>,
}

impl<L: WorkflowRunLookup> BucketResolver<L> {
    /// Creates a resolver that discards events.
    #[must_use]
    pub fn new(settings: ResolverSettings, lookup: L) -> Self {
        Self {
            settings,
            lookup,
            sink: Arc::new(NoopEventSink),
        }
    }

    /// Routes resolution events to the given sink.
    #[must_use]
    pub fn with_sink(mut self, sink: Arc<dyn OutputsEventSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Returns the resolver settings.
    #[must_use]
    pub const fn settings(&self) -> &ResolverSettings {
        &self.settings
    }

    /// Resolves the bucket and namespace prefix for a run.
    ///
    /// `repository` falls back to [`ResolverSettings::default_repository`] and
    /// then to the canonical repository.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError`] when the repository is malformed, the lookup
    /// fails, or the metadata timestamp cannot be parsed.
    pub fn resolve(
        &self,
        repository: Option<&str>,
        source: WorkflowRunSource,
    ) -> Result<ResolvedBucket, ResolveError> {
        let (raw_repository, repository_source) = match repository {
            Some(value) if !value.is_empty() => (value, RepositorySource::Explicit),
            _ => (
                self.settings
                    .default_repository
                    .as_deref()
                    .filter(|value| !value.is_empty())
                    .unwrap_or(CANONICAL_REPOSITORY),
                RepositorySource::Implicit,
            ),
        };
        let repository = RepositoryId::parse(raw_repository)?;

        let workflow_run = match source {
            WorkflowRunSource::None => None,
            WorkflowRunSource::Record(run) => Some(run),
            WorkflowRunSource::Lookup(run_id) => Some(
                self.lookup
                    .get_workflow_run(&repository, &run_id)
                    .map_err(|err| ResolveError::Lookup(Box::new(err)))?,
            ),
        };

        let (is_pr_from_fork, commit_time) = match &workflow_run {
            Some(run) => {
                let is_fork = run.head_repository.full_name != repository.full_name();
                let updated_at =
                    run.updated_at_utc().map_err(|err| ResolveError::InvalidTimestamp {
                        value: run.updated_at.clone(),
                        reason: err.to_string(),
                    })?;
                (is_fork, Some(updated_at))
            }
            None => (self.settings.is_pr_from_fork, None),
        };

        let release_type = self.settings.effective_release_type();
        let resolved = select_bucket(&repository, is_pr_from_fork, release_type, commit_time);

        self.sink.record_resolution(&BucketResolvedEvent {
            event: "bucket_resolved",
            timestamp_ms: now_ms(),
            repository: repository.full_name(),
            repository_source,
            workflow_run_id: workflow_run.as_ref().map(|run| run.id),
            head_repository: workflow_run.as_ref().map(|run| run.head_repository.full_name.clone()),
            is_pr_from_fork,
            release_type: release_type.map(str::to_string),
            external_repo: resolved.external_repo.clone(),
            bucket: resolved.bucket.clone(),
        });
        Ok(resolved)
    }
}

// ============================================================================
// SECTION: Selection Rules
// ============================================================================

/// Applies the bucket selection rules to already-resolved inputs.
///
/// `commit_time` of `None` means "date unknown" and never selects a legacy
/// bucket.
#[must_use]
pub fn select_bucket(
    repository: &RepositoryId,
    is_pr_from_fork: bool,
    release_type: Option<&str>,
    commit_time: Option<OffsetDateTime>,
) -> ResolvedBucket {
    let external_repo = if repository.is_canonical() && !is_pr_from_fork {
        String::new()
    } else {
        repository.namespace_prefix()
    };
    let legacy = commit_time.is_some_and(|at| at <= BUCKET_CUTOVER);

    let bucket = if let Some(release_type) = release_type.filter(|value| !value.is_empty()) {
        format!("therock-{release_type}-artifacts")
    } else if external_repo.is_empty() {
        let name = if legacy { LEGACY_CI_BUCKET } else { CI_BUCKET };
        name.to_string()
    } else if repository.is_internal_releases() && !is_pr_from_fork {
        INTERNAL_BUCKET.to_string()
    } else if legacy {
        LEGACY_EXTERNAL_BUCKET.to_string()
    } else {
        EXTERNAL_BUCKET.to_string()
    };

    ResolvedBucket {
        external_repo,
        bucket,
    }
}
