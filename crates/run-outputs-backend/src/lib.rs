// crates/run-outputs-backend/src/lib.rs
// ============================================================================
// Module: Run Outputs Backend Library
// Description: Artifact storage backends for workflow run outputs.
// Purpose: Move build artifacts between disk and run output roots.
// Dependencies: aws-config, aws-sdk-s3, run-outputs-core, tokio
// ============================================================================

//! ## Overview
//! [`ArtifactBackend`] is implemented by [`LocalDirectoryBackend`] (a
//! staging directory mirroring the bucket layout) and [`S3Backend`]. Both
//! derive their locations from a [`run_outputs_core::RunOutputRoot`], so an
//! artifact key names the same file in either place.
//! [`create_backend`] builds whichever one a [`BackendSelection`] names.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod backend;
pub mod factory;
pub mod local;
pub mod object_store;
pub mod s3;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use backend::ARCHIVE_EXTENSIONS;
pub use backend::ArtifactBackend;
pub use backend::BackendError;
pub use backend::SHA256_SIDECAR_SUFFIX;
pub use backend::is_artifact_archive;
pub use backend::matches_name_filter;
pub use backend::sidecar_key;
pub use backend::validate_artifact_key;
pub use factory::BackendSelection;
pub use factory::create_backend;
pub use local::LocalDirectoryBackend;
pub use object_store::MemoryObjectStore;
pub use object_store::ObjectStoreClient;
pub use object_store::ObjectStoreError;
pub use object_store::S3ClientSettings;
pub use object_store::S3ObjectStoreClient;
pub use s3::S3Backend;
