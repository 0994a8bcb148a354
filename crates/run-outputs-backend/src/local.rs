// crates/run-outputs-backend/src/local.rs
// ============================================================================
// Module: Local Directory Backend
// Description: Artifact backend over a local staging directory.
// Purpose: Mirror the object storage layout on disk for local builds and tests.
// Dependencies: run-outputs-core
// ============================================================================

//! ## Overview
//! Artifacts live under `{staging_dir}/{run prefix}/`, the same relative
//! layout the S3 backend uses, so a staging directory can be synced to a
//! bucket verbatim. The run directory is created on construction.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::io;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;

use run_outputs_core::ArtifactTransferEvent;
use run_outputs_core::NoopEventSink;
use run_outputs_core::OutputsEventSink;
use run_outputs_core::RunOutputRoot;
use run_outputs_core::TransferDirection;

use crate::backend::ArtifactBackend;
use crate::backend::BackendError;
use crate::backend::SHA256_SIDECAR_SUFFIX;
use crate::backend::collect_archives;
use crate::backend::validate_artifact_key;

// ============================================================================
// SECTION: Backend
// ============================================================================

/// Artifact backend backed by a local directory.
pub struct LocalDirectoryBackend {
    /// Staging directory root.
    staging_dir: PathBuf,
    /// Run output root used for path derivation.
    root: RunOutputRoot,
    /// Run directory (`root.local_path(staging_dir)`).
    base_path: PathBuf,
    /// Transfer event sink.
    sink: Arc<dyn OutputsEventSink>,
}

impl LocalDirectoryBackend {
    /// Creates the backend and its run directory.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::Io`] when the run directory cannot be created.
    pub fn new(staging_dir: &Path, root: RunOutputRoot) -> Result<Self, BackendError> {
        let base_path = root.local_path(staging_dir);
        fs::create_dir_all(&base_path).map_err(|err| io_error(&base_path, &err))?;
        Ok(Self {
            staging_dir: staging_dir.to_path_buf(),
            root,
            base_path,
            sink: Arc::new(NoopEventSink),
        })
    }

    /// Routes transfer events to the given sink.
    #[must_use]
    pub fn with_sink(mut self, sink: Arc<dyn OutputsEventSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Returns the staging directory.
    #[must_use]
    pub fn staging_dir(&self) -> &Path {
        &self.staging_dir
    }

    /// Returns the run output root.
    #[must_use]
    pub const fn root(&self) -> &RunOutputRoot {
        &self.root
    }

    /// Returns the run directory.
    #[must_use]
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Resolves a validated key to a path under the run directory.
    fn artifact_path(&self, artifact_key: &str) -> Result<PathBuf, BackendError> {
        validate_artifact_key(artifact_key)?;
        let mut path = self.base_path.clone();
        for segment in artifact_key.split('/') {
            path.push(segment);
        }
        Ok(path)
    }
}

impl ArtifactBackend for LocalDirectoryBackend {
    fn base_uri(&self) -> String {
        self.base_path.display().to_string()
    }

    fn list_artifacts(&self, name_filter: Option<&str>) -> Result<Vec<String>, BackendError> {
        let entries = match fs::read_dir(&self.base_path) {
            Ok(entries) => entries,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(io_error(&self.base_path, &err)),
        };
        let mut names = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|err| io_error(&self.base_path, &err))?;
            if let Ok(name) = entry.file_name().into_string() {
                names.push(name);
            }
        }
        Ok(collect_archives(names, name_filter))
    }

    fn download_artifact(&self, artifact_key: &str, dest: &Path) -> Result<(), BackendError> {
        let source = self.artifact_path(artifact_key)?;
        if !source.is_file() {
            return Err(BackendError::NotFound(format!(
                "artifact not found in local staging: {}",
                source.display()
            )));
        }
        let sidecar_source = local_sidecar(&source).filter(|path| path.is_file());
        let sidecar_dest = sidecar_destination(dest, artifact_key);
        ensure_distinct(&source, dest)?;
        if let Some(sidecar_source) = &sidecar_source {
            ensure_distinct(sidecar_source, &sidecar_dest)?;
        }
        create_parent(dest)?;
        fs::copy(&source, dest).map_err(|err| io_error(dest, &err))?;

        let sidecar = sidecar_source.is_some();
        if let Some(sidecar_source) = &sidecar_source {
            fs::copy(sidecar_source, &sidecar_dest).map_err(|err| io_error(&sidecar_dest, &err))?;
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
        let dest = self.artifact_path(artifact_key)?;
        if !source.is_file() {
            return Err(BackendError::NotFound(format!(
                "source artifact not found: {}",
                source.display()
            )));
        }
        let sidecar_source = local_sidecar(source).filter(|path| path.is_file());
        let sidecar_dest = local_sidecar(&dest);
        ensure_distinct(source, &dest)?;
        if let (Some(sidecar_source), Some(sidecar_dest)) = (&sidecar_source, &sidecar_dest) {
            ensure_distinct(sidecar_source, sidecar_dest)?;
        }
        create_parent(&dest)?;
        fs::copy(source, &dest).map_err(|err| io_error(&dest, &err))?;

        let sidecar = sidecar_source.is_some();
        if let (Some(sidecar_source), Some(sidecar_dest)) = (&sidecar_source, &sidecar_dest) {
            fs::copy(sidecar_source, sidecar_dest).map_err(|err| io_error(sidecar_dest, &err))?;
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
        let path = self.artifact_path(artifact_key)?;
        path.try_exists().map_err(|err| io_error(&path, &err))
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Returns the sidecar path next to a local file.
pub(crate) fn local_sidecar(path: &Path) -> Option<PathBuf> {
    let name = path.file_name()?.to_string_lossy();
    Some(path.with_file_name(format!("{name}{SHA256_SIDECAR_SUFFIX}")))
}

/// Returns where a downloaded sidecar lands: next to `dest`, named after
/// the artifact's file name.
pub(crate) fn sidecar_destination(dest: &Path, artifact_key: &str) -> PathBuf {
    let file_name = artifact_key.rsplit('/').next().unwrap_or(artifact_key);
    let sidecar_name = format!("{file_name}{SHA256_SIDECAR_SUFFIX}");
    dest.parent().map_or_else(|| PathBuf::from(&sidecar_name), |parent| parent.join(&sidecar_name))
}

/// Rejects a copy whose source and destination resolve to the same file.
///
/// Copying a file onto itself truncates it.
fn ensure_distinct(source: &Path, dest: &Path) -> Result<(), BackendError> {
    let (Ok(source_path), Ok(dest_path)) = (fs::canonicalize(source), fs::canonicalize(dest))
    else {
        return Ok(());
    };
    if source_path == dest_path {
        return Err(BackendError::Invalid(format!(
            "source and destination are the same file: {}",
            dest_path.display()
        )));
    }
    Ok(())
}

/// Creates the parent directory of a destination file.
pub(crate) fn create_parent(path: &Path) -> Result<(), BackendError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(|err| io_error(parent, &err))?;
    }
    Ok(())
}

/// Formats an I/O error with its path.
pub(crate) fn io_error(path: &Path, err: &io::Error) -> BackendError {
    BackendError::Io(format!("{}: {err}", path.display()))
}

#[cfg(test)]
mod tests;
