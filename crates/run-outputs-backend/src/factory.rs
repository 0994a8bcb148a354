// crates/run-outputs-backend/src/factory.rs
// ============================================================================
// Module: Backend Factory
// Description: Chooses and constructs the artifact backend for a run.
// Purpose: Local staging when a staging directory is configured, S3 otherwise.
// Dependencies: run-outputs-core
// ============================================================================

//! ## Overview
//! [`BackendSelection::resolve`] applies the selection rule: a configured
//! staging directory always wins and yields a local root that never touches
//! the network; otherwise the run's bucket is resolved and S3 is used.
//! [`create_backend`] turns a selection into a boxed [`ArtifactBackend`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::PathBuf;
use std::sync::Arc;

use run_outputs_core::BucketResolver;
use run_outputs_core::OutputsEventSink;
use run_outputs_core::ResolveError;
use run_outputs_core::RunOutputRoot;
use run_outputs_core::WorkflowRunContext;
use run_outputs_core::WorkflowRunLookup;

use crate::backend::ArtifactBackend;
use crate::backend::BackendError;
use crate::local::LocalDirectoryBackend;
use crate::object_store::S3ClientSettings;
use crate::s3::S3Backend;

// ============================================================================
// SECTION: Selection
// ============================================================================

/// Backend choice with everything needed to build it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendSelection {
    /// Local staging directory.
    Local {
        /// Staging directory root.
        staging_dir: PathBuf,
        /// Run output root (bucket `local`).
        root: RunOutputRoot,
    },
    /// S3 bucket.
    S3 {
        /// Resolved run output root.
        root: RunOutputRoot,
        /// S3 client settings.
        settings: S3ClientSettings,
    },
}

impl BackendSelection {
    /// Chooses the backend for a run.
    ///
    /// With a staging directory the root is built with
    /// [`RunOutputRoot::for_local`] from the context's run id and platform;
    /// the resolver is not consulted.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError`] when S3 bucket resolution fails.
    pub fn resolve<L: WorkflowRunLookup>(
        staging_dir: Option<PathBuf>,
        context: WorkflowRunContext,
        resolver: &BucketResolver<L>,
        settings: S3ClientSettings,
    ) -> Result<Self, ResolveError> {
        match staging_dir {
            Some(staging_dir) => Ok(Self::Local {
                staging_dir,
                root: RunOutputRoot::for_local(Some(context.run_id), Some(context.platform), None),
            }),
            None => Ok(Self::S3 {
                root: RunOutputRoot::from_workflow_run(resolver, context)?,
                settings,
            }),
        }
    }

    /// Returns the run output root.
    #[must_use]
    pub const fn root(&self) -> &RunOutputRoot {
        match self {
            Self::Local { root, .. } | Self::S3 { root, .. } => root,
        }
    }
}

// ============================================================================
// SECTION: Construction
// ============================================================================

/// Builds the selected backend, routing transfer events to `sink`.
///
/// # Errors
///
/// Returns [`BackendError`] when the staging directory cannot be created or
/// the S3 client cannot be built.
pub fn create_backend(
    selection: BackendSelection,
    sink: Arc<dyn OutputsEventSink>,
) -> Result<Box<dyn ArtifactBackend>, BackendError> {
    match selection {
        BackendSelection::Local { staging_dir, root } => {
            Ok(Box::new(LocalDirectoryBackend::new(&staging_dir, root)?.with_sink(sink)))
        }
        BackendSelection::S3 { root, settings } => {
            Ok(Box::new(S3Backend::new(root, &settings)?.with_sink(sink)))
        }
    }
}
