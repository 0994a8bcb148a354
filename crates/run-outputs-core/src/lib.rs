// crates/run-outputs-core/src/lib.rs
// ============================================================================
// Module: Run Outputs Core Library
// Description: Public API surface for run output layout and bucket resolution.
// Purpose: Expose identifiers, workflow metadata, resolver, and layout types.
// Dependencies: crate::{bucket, events, identifiers, run_output, workflow}
// ============================================================================

//! ## Overview
//! Run outputs core computes where a CI workflow run's outputs are stored.
//! [`BucketResolver`] picks a bucket and namespace from repository, fork,
//! release, and date context; [`RunOutputRoot`] derives every key, URI, URL,
//! and local path from the result. Nothing here performs storage I/O; the
//! only external call is the workflow metadata lookup behind
//! [`WorkflowRunLookup`].

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod bucket;
pub mod events;
pub mod identifiers;
pub mod run_output;
pub mod workflow;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use bucket::BUCKET_CUTOVER;
pub use bucket::BucketResolver;
pub use bucket::ResolveError;
pub use bucket::ResolvedBucket;
pub use bucket::ResolverSettings;
pub use bucket::WorkflowRunSource;
pub use bucket::select_bucket;
pub use events::ArtifactTransferEvent;
pub use events::BucketResolvedEvent;
pub use events::FileEventSink;
pub use events::NoopEventSink;
pub use events::OutputsEventSink;
pub use events::StderrEventSink;
pub use events::TransferDirection;
pub use identifiers::IdentifierError;
pub use identifiers::Platform;
pub use identifiers::RepositoryId;
pub use identifiers::RunId;
pub use run_output::RunOutputRoot;
pub use run_output::WorkflowRunContext;
pub use workflow::HeadRepository;
pub use workflow::LookupUnavailable;
pub use workflow::OfflineLookup;
pub use workflow::WorkflowRun;
pub use workflow::WorkflowRunLookup;
