// crates/run-outputs-backend/src/s3.rs
// ============================================================================
// Module: S3 Artifact Backend
// Description: Artifact backend over an S3 bucket.
// Purpose: Store and fetch run artifacts at `s3://{bucket}/{run prefix}/`.
// Dependencies: run-outputs-core, aws-sdk-s3 (via object_store)
// ============================================================================

//! ## Overview
//! [`S3Backend`] maps artifact keys onto object keys under the run prefix of
//! a [`RunOutputRoot`]. Listings only report direct children of the run
//! prefix. All object traffic goes through an [`ObjectStoreClient`], so the
//! backend runs unchanged against [`MemoryObjectStore`](crate::MemoryObjectStore).

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::Path;
use std::sync::Arc;

use run_outputs_core::ArtifactTransferEvent;
use run_outputs_core::NoopEventSink;
use run_outputs_core::OutputsEventSink;
use run_outputs_core::RunOutputRoot;
use run_outputs_core::TransferDirection;

use crate::backend::ArtifactBackend;
use crate::backend::BackendError;
use crate::backend::collect_archives;
use crate::backend::sidecar_key;
use crate::backend::validate_artifact_key;
use crate::local::create_parent;
use crate::local::local_sidecar;
use crate::local::sidecar_destination;
use crate::object_store::ObjectStoreClient;
use crate::object_store::ObjectStoreError;
use crate::object_store::S3ClientSettings;
use crate::object_store::S3ObjectStoreClient;

// ============================================================================
// SECTION: Backend
// ============================================================================

/// Artifact backend backed by S3.
pub struct S3Backend {
    /// Run output root used for key derivation.
    root: RunOutputRoot,
    /// Object-store client.
    client: Arc<dyn ObjectStoreClient>,
    /// Transfer event sink.
    sink: Arc<dyn OutputsEventSink>,
}

impl S3Backend {
    /// Creates a backend with an AWS SDK client.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError`] when the client cannot be built.
    pub fn new(root: RunOutputRoot, settings: &S3ClientSettings) -> Result<Self, BackendError> {
        let client = S3ObjectStoreClient::new(settings)?;
        Ok(Self::from_client(root, Arc::new(client)))
    }

    /// Creates a backend over an existing client.
    #[must_use]
    pub fn from_client(root: RunOutputRoot, client: Arc<dyn ObjectStoreClient>) -> Self {
        Self {
            root,
            client,
            sink: Arc::new(NoopEventSink),
        }
    }

    /// Routes transfer events to the given sink.
    #[must_use]
    pub fn with_sink(mut self, sink: Arc<dyn OutputsEventSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Returns the run output root.
    #[must_use]
    pub const fn root(&self) -> &RunOutputRoot {
        &self.root
    }

    /// Returns the bucket name.
    #[must_use]
    pub fn bucket(&self) -> &str {
        self.root.bucket()
    }

    /// Returns the object key for a validated artifact key.
    fn object_key(&self, artifact_key: &str) -> Result<String, BackendError> {
        validate_artifact_key(artifact_key)?;
        Ok(self.root.artifact_s3_key(artifact_key))
    }
}

impl ArtifactBackend for S3Backend {
    fn base_uri(&self) -> String {
        self.root.s3_uri()
    }

    fn list_artifacts(&self, name_filter: Option<&str>) -> Result<Vec<String>, BackendError> {
        let list_prefix = format!("{}/", self.root.prefix());
        let keys = self.client.list_keys(self.bucket(), &list_prefix)?;
        let names = keys.into_iter().filter_map(|key| {
            key.strip_prefix(&list_prefix)
                .filter(|name| !name.is_empty() && !name.contains('/'))
                .map(str::to_string)
        });
        Ok(collect_archives(names, name_filter))
    }

    fn download_artifact(&self, artifact_key: &str, dest: &Path) -> Result<(), BackendError> {
        let object_key = self.object_key(artifact_key)?;
        create_parent(dest)?;
        self.client.download_to_path(self.bucket(), &object_key, dest).map_err(|err| match err {
            ObjectStoreError::NotFound(_) => BackendError::NotFound(format!(
                "artifact not found in S3: {}",
                self.root.s3_uri_for(&object_key)
            )),
            other => other.into(),
        })?;

        let sidecar_object = sidecar_key(&object_key);
        let sidecar = self.client.exists(self.bucket(), &sidecar_object)?;
        if sidecar {
            let sidecar_dest = sidecar_destination(dest, artifact_key);
            self.client.download_to_path(self.bucket(), &sidecar_object, &sidecar_dest)?;
        }
        self.sink.record_transfer(&ArtifactTransferEvent::new(
            TransferDirection::Download,
            self.base_uri(),
            artifact_key,
            sidecar,
        ));
        Ok(())
    }

    fn upload_artifact(&self, source: &Path, artifact_key: &str) -> Result<(), BackendError> {
        let object_key = self.object_key(artifact_key)?;
        if !source.is_file() {
            return Err(BackendError::NotFound(format!(
                "source artifact not found: {}",
                source.display()
            )));
        }
        self.client.upload_from_path(self.bucket(), &object_key, source)?;

        let sidecar_source = local_sidecar(source).filter(|path| path.is_file());
        let sidecar = sidecar_source.is_some();
        if let Some(sidecar_source) = &sidecar_source {
            self.client.upload_from_path(self.bucket(), &sidecar_key(&object_key), sidecar_source)?;
        }
        self.sink.record_transfer(&ArtifactTransferEvent::new(
            TransferDirection::Upload,
            self.base_uri(),
            artifact_key,
            sidecar,
        ));
        Ok(())
    }

    fn artifact_exists(&self, artifact_key: &str) -> Result<bool, BackendError> {
        let object_key = self.object_key(artifact_key)?;
        Ok(self.client.exists(self.bucket(), &object_key)?)
    }
}

#[cfg(test)]
mod tests;
