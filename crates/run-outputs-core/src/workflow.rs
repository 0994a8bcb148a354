// crates/run-outputs-core/src/workflow.rs
// ============================================================================
// Module: Workflow Run Metadata
// Description: Workflow run records and the lookup interface used to fetch them.
// Purpose: Decouple bucket resolution from the hosting provider's API client.
// Dependencies: serde, time
// ============================================================================

//! ## Overview
//! A [`WorkflowRun`] is the subset of the hosting provider's workflow-run
//! payload that bucket resolution depends on. Records are fetched through a
//! [`WorkflowRunLookup`] implementation (the GitHub client in production, a
//! fixture in tests) or supplied directly by callers that already have one.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::error::Error;

use serde::Deserialize;
use serde::Serialize;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use crate::identifiers::RepositoryId;
use crate::identifiers::RunId;

// ============================================================================
// SECTION: Records
// ============================================================================

/// Repository reference embedded in a workflow run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeadRepository {
    /// Repository in `owner/name` form.
    pub full_name: String,
}

/// Workflow run metadata.
///
/// Unknown payload fields are ignored so the full API response can be
/// deserialized directly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowRun {
    /// Provider-assigned run identifier.
    pub id: u64,
    /// Repository the run's head commit came from.
    pub head_repository: HeadRepository,
    /// Last update timestamp (`YYYY-MM-DDTHH:MM:SSZ`).
    pub updated_at: String,
    /// Run status (`queued`, `in_progress`, `completed`, ...).
    #[serde(default)]
    pub status: Option<String>,
    /// Web URL for the run.
    #[serde(default)]
    pub html_url: Option<String>,
}

impl WorkflowRun {
    /// Parses [`WorkflowRun::updated_at`] as a UTC instant.
    ///
    /// # Errors
    ///
    /// Returns [`time::error::Parse`] when the timestamp is malformed.
    pub fn updated_at_utc(&self) -> Result<OffsetDateTime, time::error::Parse> {
        OffsetDateTime::parse(&self.updated_at, &Rfc3339)
    }

    /// Returns the run identifier in its string form.
    #[must_use]
    pub fn run_id(&self) -> RunId {
        RunId::from(self.id)
    }
}

// ============================================================================
// SECTION: Lookup Interface
// ============================================================================

/// Fetches workflow run metadata from the hosting provider.
pub trait WorkflowRunLookup {
    /// Error returned by the lookup; surfaced to callers unchanged.
    type Error: Error + Send + Sync + 'static;

    /// Fetches a single workflow run.
    ///
    /// # Errors
    ///
    /// Returns [`Self::Error`] on network, status, or payload failures.
    fn get_workflow_run(
        &self,
        repository: &RepositoryId,
        run_id: &RunId,
    ) -> Result<WorkflowRun, Self::Error>;
}

/// Lookup error used when no provider is available.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("workflow run lookup unavailable for {repository} run {run_id}")]
pub struct LookupUnavailable {
    /// Repository the lookup was attempted for.
    pub repository: String,
    /// Run identifier the lookup was attempted for.
    pub run_id: String,
}

/// Lookup that always fails; used for fully offline resolution.
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineLookup;

impl WorkflowRunLookup for OfflineLookup {
    type Error = LookupUnavailable;

    fn get_workflow_run(
        &self,
        repository: &RepositoryId,
        run_id: &RunId,
    ) -> Result<WorkflowRun, Self::Error> {
        Err(LookupUnavailable {
            repository: repository.full_name(),
            run_id: run_id.to_string(),
        })
    }
}

impl<L: WorkflowRunLookup + ?Sized> WorkflowRunLookup for &L {
    type Error = L::Error;

    fn get_workflow_run(
        &self,
        repository: &RepositoryId,
        run_id: &RunId,
    ) -> Result<WorkflowRun, Self::Error> {
        (**self).get_workflow_run(repository, run_id)
    }
}
