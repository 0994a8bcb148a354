// crates/run-outputs-backend/src/object_store.rs
// ============================================================================
// Module: Object Store Clients
// Description: Blocking object-store client abstraction over S3.
// Purpose: Move artifact files between local disk and object storage.
// Dependencies: aws-config, aws-sdk-s3, tokio
// ============================================================================

//! ## Overview
//! [`ObjectStoreClient`] is the minimal surface the S3 backend needs: list,
//! download to a file, upload from a file, and existence checks.
//! [`S3ObjectStoreClient`] drives the async AWS SDK from a private Tokio
//! runtime. [`MemoryObjectStore`] keeps objects in memory for offline runs
//! and tests.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::fs;
use std::future::Future;
use std::path::Path;
use std::sync::Arc;
use std::sync::Mutex;

use aws_config::BehaviorVersion;
use aws_config::Region;
use aws_config::meta::region::RegionProviderChain;
use aws_sdk_s3::Client;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::operation::get_object::GetObjectError;
use aws_sdk_s3::operation::head_object::HeadObjectError;
use aws_sdk_s3::primitives::ByteStream;
use tokio::io::AsyncWriteExt;
use tokio::runtime::Handle;
use tokio::runtime::Runtime;
use tokio::runtime::RuntimeFlavor;

use crate::backend::BackendError;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Region used when neither settings nor the environment provide one.
pub const DEFAULT_REGION: &str = "us-east-1";

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Object-store errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ObjectStoreError {
    /// Object does not exist.
    #[error("object not found: {0}")]
    NotFound(String),
    /// Invalid configuration or key input.
    #[error("object store invalid: {0}")]
    Invalid(String),
    /// Local I/O failure.
    #[error("object store io error: {0}")]
    Io(String),
    /// Backend returned an error.
    #[error("object store backend error: {0}")]
    Backend(String),
}

impl From<ObjectStoreError> for BackendError {
    fn from(err: ObjectStoreError) -> Self {
        match err {
            ObjectStoreError::NotFound(key) => Self::NotFound(key),
            ObjectStoreError::Invalid(message) => Self::Invalid(message),
            ObjectStoreError::Io(message) => Self::Io(message),
            ObjectStoreError::Backend(message) => Self::Backend(message),
        }
    }
}

// ============================================================================
// SECTION: Settings
// ============================================================================

/// S3 client settings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct S3ClientSettings {
    /// Region override.
    pub region: Option<String>,
    /// S3-compatible endpoint override.
    pub endpoint: Option<String>,
    /// Force path-style addressing.
    pub force_path_style: bool,
    /// Allow a cleartext endpoint.
    pub allow_http: bool,
    /// Send unsigned requests.
    pub anonymous: bool,
}

impl S3ClientSettings {
    /// Validates client settings.
    ///
    /// # Errors
    ///
    /// Returns [`ObjectStoreError::Invalid`] for malformed endpoints.
    pub fn validate(&self) -> Result<(), ObjectStoreError> {
        if let Some(endpoint) = &self.endpoint {
            let trimmed = endpoint.trim();
            if !(trimmed.starts_with("https://") || trimmed.starts_with("http://")) {
                return Err(ObjectStoreError::Invalid(
                    "endpoint must include http:// or https://".to_string(),
                ));
            }
            if trimmed.starts_with("http://") && !self.allow_http {
                return Err(ObjectStoreError::Invalid(
                    "endpoint uses http:// without allow_http".to_string(),
                ));
            }
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Runtime Helpers
// ============================================================================

/// Blocks on an object-store future using a compatible runtime.
fn block_on_with_runtime<F, T>(runtime: &Runtime, future: F) -> Result<T, ObjectStoreError>
where
    F: Future<Output = Result<T, ObjectStoreError>> + Send + 'static,
    T: Send + 'static,
{
    if let Ok(handle) = Handle::try_current() {
        if matches!(handle.runtime_flavor(), RuntimeFlavor::MultiThread) {
            return tokio::task::block_in_place(|| handle.block_on(future));
        }
        let (tx, rx) = std::sync::mpsc::sync_channel(1);
        std::thread::spawn(move || {
            let result = Runtime::new()
                .map_err(|err| ObjectStoreError::Io(err.to_string()))
                .and_then(|runtime| runtime.block_on(future));
            let _ = tx.send(result);
        });
        return rx.recv().unwrap_or_else(|_| {
            Err(ObjectStoreError::Io("object store thread join failed".to_string()))
        });
    }

    runtime.block_on(future)
}

/// Formats an SDK error with its full source chain.
fn sdk_message<E: std::error::Error>(err: &E) -> String {
    DisplayErrorContext(err).to_string()
}

// ============================================================================
// SECTION: Client Interface
// ============================================================================

/// Minimal object-store client abstraction.
pub trait ObjectStoreClient: Send + Sync {
    /// Lists every key under `prefix`.
    ///
    /// # Errors
    ///
    /// Returns [`ObjectStoreError`] when listing fails.
    fn list_keys(&self, bucket: &str, prefix: &str) -> Result<Vec<String>, ObjectStoreError>;

    /// Downloads an object into `dest`, replacing it.
    ///
    /// # Errors
    ///
    /// Returns [`ObjectStoreError::NotFound`] when the object is missing.
    fn download_to_path(&self, bucket: &str, key: &str, dest: &Path)
    -> Result<(), ObjectStoreError>;

    /// Uploads `source` to an object, replacing it.
    ///
    /// # Errors
    ///
    /// Returns [`ObjectStoreError`] when reading or uploading fails.
    fn upload_from_path(
        &self,
        bucket: &str,
        key: &str,
        source: &Path,
    ) -> Result<(), ObjectStoreError>;

    /// Returns true when the object exists.
    ///
    /// # Errors
    ///
    /// Returns [`ObjectStoreError`] for failures other than "not found".
    fn exists(&self, bucket: &str, key: &str) -> Result<bool, ObjectStoreError>;
}

// ============================================================================
// SECTION: S3 Client
// ============================================================================

/// S3-backed object-store client.
pub struct S3ObjectStoreClient {
    /// Underlying S3 client.
    client: Client,
    /// Tokio runtime for blocking S3 operations.
    runtime: Option<Arc<Runtime>>,
}

impl Drop for S3ObjectStoreClient {
    fn drop(&mut self) {
        if let Some(runtime) = self.runtime.take() {
            let _ = std::thread::spawn(move || drop(runtime));
        }
    }
}

impl S3ObjectStoreClient {
    /// Builds a new S3 client.
    ///
    /// # Errors
    ///
    /// Returns [`ObjectStoreError`] when settings are invalid or the runtime
    /// cannot start.
    pub fn new(settings: &S3ClientSettings) -> Result<Self, ObjectStoreError> {
        settings.validate()?;
        let runtime = Runtime::new().map_err(|err| ObjectStoreError::Io(err.to_string()))?;
        let region = settings.region.clone();
        let endpoint = settings.endpoint.clone();
        let anonymous = settings.anonymous;
        let shared_config = block_on_with_runtime(&runtime, async move {
            let region_provider = RegionProviderChain::first_try(region.map(Region::new))
                .or_default_provider()
                .or_else(Region::new(DEFAULT_REGION));
            let mut loader = aws_config::defaults(BehaviorVersion::latest()).region(region_provider);
            if let Some(endpoint) = endpoint {
                loader = loader.endpoint_url(endpoint);
            }
            if anonymous {
                loader = loader.no_credentials();
            }
            Ok(loader.load().await)
        })?;
        let mut s3_builder = aws_sdk_s3::config::Builder::from(&shared_config);
        if settings.force_path_style {
            s3_builder = s3_builder.force_path_style(true);
        }
        Ok(Self {
            client: Client::from_conf(s3_builder.build()),
            runtime: Some(Arc::new(runtime)),
        })
    }

    /// Returns the runtime or an error if shut down.
    fn runtime(&self) -> Result<&Runtime, ObjectStoreError> {
        self.runtime
            .as_deref()
            .ok_or_else(|| ObjectStoreError::Io("object store runtime closed".to_string()))
    }
}

impl ObjectStoreClient for S3ObjectStoreClient {
    fn list_keys(&self, bucket: &str, prefix: &str) -> Result<Vec<String>, ObjectStoreError> {
        let client = self.client.clone();
        let bucket = bucket.to_string();
        let prefix = prefix.to_string();
        block_on_with_runtime(self.runtime()?, async move {
            let mut keys = Vec::new();
            let mut pages =
                client.list_objects_v2().bucket(bucket).prefix(prefix).into_paginator().send();
            while let Some(page) = pages.next().await {
                let page = page.map_err(|err| ObjectStoreError::Backend(sdk_message(&err)))?;
                keys.extend(page.contents().iter().filter_map(|object| object.key()).map(str::to_string));
            }
            Ok(keys)
        })
    }

    fn download_to_path(
        &self,
        bucket: &str,
        key: &str,
        dest: &Path,
    ) -> Result<(), ObjectStoreError> {
        let client = self.client.clone();
        let bucket = bucket.to_string();
        let key = key.to_string();
        let dest = dest.to_path_buf();
        block_on_with_runtime(self.runtime()?, async move {
            let output =
                client.get_object().bucket(bucket).key(key.clone()).send().await.map_err(|err| {
                    if err.as_service_error().is_some_and(GetObjectError::is_no_such_key) {
                        ObjectStoreError::NotFound(key.clone())
                    } else {
                        ObjectStoreError::Backend(sdk_message(&err))
                    }
                })?;
            let io_error = |err: std::io::Error| ObjectStoreError::Io(format!("{}: {err}", dest.display()));
            let mut reader = output.body.into_async_read();
            let mut file = tokio::fs::File::create(&dest).await.map_err(io_error)?;
            let copied = tokio::io::copy(&mut reader, &mut file).await;
            if let Err(err) = copied {
                drop(file);
                let _ = tokio::fs::remove_file(&dest).await;
                return Err(io_error(err));
            }
            file.flush().await.map_err(io_error)?;
            Ok(())
        })
    }

    fn upload_from_path(
        &self,
        bucket: &str,
        key: &str,
        source: &Path,
    ) -> Result<(), ObjectStoreError> {
        let client = self.client.clone();
        let bucket = bucket.to_string();
        let key = key.to_string();
        let source = source.to_path_buf();
        block_on_with_runtime(self.runtime()?, async move {
            let body = ByteStream::from_path(&source)
                .await
                .map_err(|err| ObjectStoreError::Io(format!("{}: {err}", source.display())))?;
            client
                .put_object()
                .bucket(bucket)
                .key(key)
                .body(body)
                .send()
                .await
                .map_err(|err| ObjectStoreError::Backend(sdk_message(&err)))?;
            Ok(())
        })
    }

    fn exists(&self, bucket: &str, key: &str) -> Result<bool, ObjectStoreError> {
        let client = self.client.clone();
        let bucket = bucket.to_string();
        let key = key.to_string();
        block_on_with_runtime(self.runtime()?, async move {
            match client.head_object().bucket(bucket).key(key).send().await {
                Ok(_) => Ok(true),
                Err(err) if err.as_service_error().is_some_and(HeadObjectError::is_not_found) => {
                    Ok(false)
                }
                Err(err) => Err(ObjectStoreError::Backend(sdk_message(&err))),
            }
        })
    }
}

// ============================================================================
// SECTION: In-Memory Client
// ============================================================================

/// Object store held in memory, keyed by `(bucket, key)`.
#[derive(Debug, Default)]
pub struct MemoryObjectStore {
    /// Stored objects.
    objects: Mutex<BTreeMap<(String, String), Vec<u8>>>,
}

impl MemoryObjectStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts an object directly.
    ///
    /// # Errors
    ///
    /// Returns [`ObjectStoreError::Io`] when the store lock is poisoned.
    pub fn insert(&self, bucket: &str, key: &str, bytes: Vec<u8>) -> Result<(), ObjectStoreError> {
        self.lock()?.insert((bucket.to_string(), key.to_string()), bytes);
        Ok(())
    }

    /// Returns a copy of an object.
    ///
    /// # Errors
    ///
    /// Returns [`ObjectStoreError::Io`] when the store lock is poisoned.
    pub fn get(&self, bucket: &str, key: &str) -> Result<Option<Vec<u8>>, ObjectStoreError> {
        Ok(self.lock()?.get(&(bucket.to_string(), key.to_string())).cloned())
    }

    /// Locks the object map.
    fn lock(
        &self,
    ) -> Result<std::sync::MutexGuard<'_, BTreeMap<(String, String), Vec<u8>>>, ObjectStoreError>
    {
        self.objects
            .lock()
            .map_err(|_| ObjectStoreError::Io("object store lock poisoned".to_string()))
    }
}

impl ObjectStoreClient for MemoryObjectStore {
    fn list_keys(&self, bucket: &str, prefix: &str) -> Result<Vec<String>, ObjectStoreError> {
        Ok(self
            .lock()?
            .keys()
            .filter(|(object_bucket, key)| object_bucket == bucket && key.starts_with(prefix))
            .map(|(_, key)| key.clone())
            .collect())
    }

    fn download_to_path(
        &self,
        bucket: &str,
        key: &str,
        dest: &Path,
    ) -> Result<(), ObjectStoreError> {
        let bytes =
            self.get(bucket, key)?.ok_or_else(|| ObjectStoreError::NotFound(key.to_string()))?;
        fs::write(dest, bytes).map_err(|err| local_io_error(dest, &err))
    }

    fn upload_from_path(
        &self,
        bucket: &str,
        key: &str,
        source: &Path,
    ) -> Result<(), ObjectStoreError> {
        let bytes = fs::read(source).map_err(|err| local_io_error(source, &err))?;
        self.insert(bucket, key, bytes)
    }

    fn exists(&self, bucket: &str, key: &str) -> Result<bool, ObjectStoreError> {
        Ok(self.get(bucket, key)?.is_some())
    }
}

/// Formats a local I/O error with its path.
fn local_io_error(path: &Path, err: &std::io::Error) -> ObjectStoreError {
    ObjectStoreError::Io(format!("{}: {err}", path.display()))
}
