// crates/run-outputs-backend/src/local/tests.rs
// ============================================================================
// Module: Local Backend Tests
// Description: Unit tests for the staging directory backend.
// Purpose: Validate layout, sidecar handling, and missing-file errors.
// Dependencies: run-outputs-backend, tempfile
// ============================================================================

// ============================================================================
// SECTION: Lint Configuration
// ============================================================================

#![allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::panic,
    clippy::missing_docs_in_private_items,
    reason = "Test-only assertions favor direct unwrap/expect for clarity."
)]

use std::sync::Mutex;

use run_outputs_core::BucketResolvedEvent;
use tempfile::TempDir;

use super::*;

// ============================================================================
// SECTION: Fixtures
// ============================================================================

/// Sink capturing transfer events.
#[derive(Default)]
struct RecordingSink {
    transfers: Mutex<Vec<ArtifactTransferEvent>>,
}

impl OutputsEventSink for RecordingSink {
    fn record_resolution(&self, _event: &BucketResolvedEvent) {}

    fn record_transfer(&self, event: &ArtifactTransferEvent) {
        self.transfers.lock().unwrap().push(event.clone());
    }
}

fn backend(staging: &TempDir) -> LocalDirectoryBackend {
    let root = RunOutputRoot::for_local(Some("12345".into()), Some("linux".into()), None);
    LocalDirectoryBackend::new(staging.path(), root).unwrap()
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[test]
fn new_creates_run_directory() {
    let staging = TempDir::new().unwrap();
    let backend = backend(&staging);
    assert_eq!(backend.base_path(), staging.path().join("12345-linux"));
    assert!(backend.base_path().is_dir());
    assert_eq!(backend.base_uri(), staging.path().join("12345-linux").display().to_string());
    assert_eq!(backend.staging_dir(), staging.path());
    assert_eq!(backend.root().bucket(), "local");
}

#[test]
fn upload_then_list_and_exists() {
    let staging = TempDir::new().unwrap();
    let scratch = TempDir::new().unwrap();
    let backend = backend(&staging);
    for name in ["rocm_lib.tar.zst", "blas_lib.tar.xz", "blas_dev.tar.xz"] {
        let source = scratch.path().join(name);
        fs::write(&source, name).unwrap();
        backend.upload_artifact(&source, name).unwrap();
    }
    fs::write(backend.base_path().join("notes.txt"), "ignored").unwrap();

    assert_eq!(
        backend.list_artifacts(None).unwrap(),
        vec!["blas_dev.tar.xz", "blas_lib.tar.xz", "rocm_lib.tar.zst"]
    );
    assert_eq!(backend.list_artifacts(Some("blas")).unwrap(), vec!["blas_dev.tar.xz", "blas_lib.tar.xz"]);
    assert!(backend.artifact_exists("blas_lib.tar.xz").unwrap());
    assert!(!backend.artifact_exists("missing.tar.xz").unwrap());
}

#[test]
fn list_is_empty_when_run_directory_was_removed() {
    let staging = TempDir::new().unwrap();
    let backend = backend(&staging);
    fs::remove_dir(backend.base_path()).unwrap();
    assert!(backend.list_artifacts(None).unwrap().is_empty());
}

#[test]
fn sidecars_travel_with_artifacts() {
    let staging = TempDir::new().unwrap();
    let scratch = TempDir::new().unwrap();
    let sink = Arc::new(RecordingSink::default());
    let backend = backend(&staging).with_sink(sink.clone());

    let source = scratch.path().join("blas_lib.tar.xz");
    fs::write(&source, "archive").unwrap();
    fs::write(scratch.path().join("blas_lib.tar.xz.sha256sum"), "abc  blas_lib.tar.xz").unwrap();
    backend.upload_artifact(&source, "blas_lib.tar.xz").unwrap();
    assert!(backend.base_path().join("blas_lib.tar.xz.sha256sum").is_file());
    assert_eq!(backend.list_artifacts(None).unwrap(), vec!["blas_lib.tar.xz"]);

    let dest = scratch.path().join("out").join("renamed.tar.xz");
    backend.download_artifact("blas_lib.tar.xz", &dest).unwrap();
    assert_eq!(fs::read_to_string(&dest).unwrap(), "archive");
    assert_eq!(
        fs::read_to_string(scratch.path().join("out").join("blas_lib.tar.xz.sha256sum")).unwrap(),
        "abc  blas_lib.tar.xz"
    );

    let transfers = sink.transfers.lock().unwrap();
    assert_eq!(transfers.len(), 2);
    assert_eq!(transfers[0].direction, TransferDirection::Upload);
    assert_eq!(transfers[1].direction, TransferDirection::Download);
    assert!(transfers.iter().all(|event| event.sidecar && event.artifact_key == "blas_lib.tar.xz"));
}

#[test]
fn download_without_sidecar_writes_only_artifact() {
    let staging = TempDir::new().unwrap();
    let scratch = TempDir::new().unwrap();
    let backend = backend(&staging);
    fs::write(backend.base_path().join("blas_lib.tar.xz"), "archive").unwrap();

    let dest = scratch.path().join("blas_lib.tar.xz");
    backend.download_artifact("blas_lib.tar.xz", &dest).unwrap();
    assert!(dest.is_file());
    assert!(!scratch.path().join("blas_lib.tar.xz.sha256sum").exists());
}

#[test]
fn missing_artifact_and_source_are_not_found() {
    let staging = TempDir::new().unwrap();
    let scratch = TempDir::new().unwrap();
    let backend = backend(&staging);

    let err = backend.download_artifact("missing.tar.xz", &scratch.path().join("x")).unwrap_err();
    assert!(matches!(err, BackendError::NotFound(message) if message.contains("missing.tar.xz")));

    let err = backend.upload_artifact(&scratch.path().join("absent.tar.xz"), "absent.tar.xz").unwrap_err();
    assert!(matches!(err, BackendError::NotFound(message) if message.contains("absent.tar.xz")));
}

#[test]
fn traversal_keys_never_touch_disk() {
    let staging = TempDir::new().unwrap();
    let scratch = TempDir::new().unwrap();
    let backend = backend(&staging);
    let source = scratch.path().join("payload.tar.xz");
    fs::write(&source, "x").unwrap();

    let err = backend.upload_artifact(&source, "../escape.tar.xz").unwrap_err();
    assert!(matches!(err, BackendError::Invalid(_)));
    assert!(!staging.path().join("escape.tar.xz").exists());
    assert!(matches!(backend.artifact_exists("/etc/passwd"), Err(BackendError::Invalid(_))));
}

#[test]
fn sidecar_destination_uses_key_file_name() {
    assert_eq!(
        sidecar_destination(Path::new("/tmp/out/renamed.tar.xz"), "logs/blas_lib.tar.xz"),
        PathBuf::from("/tmp/out/blas_lib.tar.xz.sha256sum")
    );
    assert_eq!(
        sidecar_destination(Path::new("renamed.tar.xz"), "blas_lib.tar.xz"),
        PathBuf::from("blas_lib.tar.xz.sha256sum")
    );
}

#[test]
fn upload_of_staged_file_onto_itself_is_rejected() {
    let staging = TempDir::new().unwrap();
    let backend = backend(&staging);
    let staged = backend.base_path().join("blas_lib_gfx94X.tar.xz");
    fs::write(&staged, "payload-bytes").unwrap();

    let err = backend.upload_artifact(&staged, "blas_lib_gfx94X.tar.xz").unwrap_err();
    assert!(matches!(err, BackendError::Invalid(message) if message.contains("same file")));
    assert_eq!(fs::read(&staged).unwrap(), b"payload-bytes");
}

#[test]
fn download_onto_staged_file_is_rejected() {
    let staging = TempDir::new().unwrap();
    let backend = backend(&staging);
    let staged = backend.base_path().join("blas_lib.tar.xz");
    fs::write(&staged, "payload-bytes").unwrap();

    let err = backend.download_artifact("blas_lib.tar.xz", &staged).unwrap_err();
    assert!(matches!(err, BackendError::Invalid(_)));
    assert_eq!(fs::read(&staged).unwrap(), b"payload-bytes");
}

#[test]
fn download_next_to_staged_sidecar_leaves_it_intact() {
    let staging = TempDir::new().unwrap();
    let backend = backend(&staging);
    fs::write(backend.base_path().join("blas_lib.tar.xz"), "archive").unwrap();
    let sidecar = backend.base_path().join("blas_lib.tar.xz.sha256sum");
    fs::write(&sidecar, "abc  blas_lib.tar.xz").unwrap();

    let dest = backend.base_path().join("copy.tar.xz");
    let err = backend.download_artifact("blas_lib.tar.xz", &dest).unwrap_err();
    assert!(matches!(err, BackendError::Invalid(_)));
    assert_eq!(fs::read_to_string(&sidecar).unwrap(), "abc  blas_lib.tar.xz");
    assert!(!dest.exists());
}

#[test]
fn ensure_distinct_allows_missing_destination() {
    let scratch = TempDir::new().unwrap();
    let source = scratch.path().join("a.tar.xz");
    fs::write(&source, "a").unwrap();
    assert!(ensure_distinct(&source, &scratch.path().join("b.tar.xz")).is_ok());
    assert!(ensure_distinct(&source, &scratch.path().join(".").join("a.tar.xz")).is_err());
}
