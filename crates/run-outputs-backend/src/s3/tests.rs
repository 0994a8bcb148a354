// crates/run-outputs-backend/src/s3/tests.rs
// ============================================================================
// Module: S3 Backend Tests
// Description: Unit tests for the S3 backend over the in-memory store.
// Purpose: Validate key mapping, listing scope, and sidecar transfers.
// Dependencies: run-outputs-backend, tempfile
// ============================================================================

// ============================================================================
// SECTION: Lint Configuration
// ============================================================================

#![allow(
    clippy::expect_used,
    clippy::use_debug,
    clippy::unwrap_used,
    clippy::panic,
    clippy::missing_docs_in_private_items,
    reason = "Test-only assertions favor direct unwrap/expect for clarity."
)]

use std::fs;

use run_outputs_core::RepositoryId;
use run_outputs_core::select_bucket;
use tempfile::TempDir;

use super::*;
use crate::object_store::MemoryObjectStore;

// ============================================================================
// SECTION: Fixtures
// ============================================================================

const BUCKET: &str = "therock-ci-artifacts";

fn root() -> RunOutputRoot {
    let resolved = select_bucket(&RepositoryId::canonical(), false, None, None);
    RunOutputRoot::from_resolved(resolved, "12345678901", "linux")
}

fn backend(store: &Arc<MemoryObjectStore>) -> S3Backend {
    S3Backend::from_client(root(), store.clone())
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[test]
fn base_uri_is_run_root() {
    let store = Arc::new(MemoryObjectStore::new());
    let backend = backend(&store);
    assert_eq!(backend.base_uri(), "s3://therock-ci-artifacts/12345678901-linux");
    assert_eq!(backend.bucket(), BUCKET);
    assert_eq!(backend.root(), &root());
}

#[test]
fn list_reports_direct_child_archives_only() {
    let store = Arc::new(MemoryObjectStore::new());
    for key in [
        "12345678901-linux/blas_lib_gfx94X.tar.xz",
        "12345678901-linux/blas_lib_gfx94X.tar.xz.sha256sum",
        "12345678901-linux/rocm_lib_gfx94X.tar.zst",
        "12345678901-linux/index-gfx94X.html",
        "12345678901-linux/logs/gfx94X/nested.tar.xz",
        "12345678901-linux-extra/other.tar.xz",
        "12345678901-windows/blas_lib_gfx94X.tar.xz",
    ] {
        store.insert(BUCKET, key, Vec::new()).unwrap();
    }
    let backend = backend(&store);
    assert_eq!(
        backend.list_artifacts(None).unwrap(),
        vec!["blas_lib_gfx94X.tar.xz", "rocm_lib_gfx94X.tar.zst"]
    );
    assert_eq!(backend.list_artifacts(Some("rocm")).unwrap(), vec!["rocm_lib_gfx94X.tar.zst"]);
    assert!(backend.list_artifacts(Some("hip")).unwrap().is_empty());
}

#[test]
fn list_excludes_archives_nested_under_group_directories() {
    let store = Arc::new(MemoryObjectStore::new());
    for key in [
        "12345678901-linux/logs/gfx94X-dcgpu/blas_lib_gfx94X.tar.xz",
        "12345678901-linux/python/gfx94X-dcgpu/rocm_sdk.tar.zst",
        "12345678901-linux/packages/gfx94X-dcgpu/rocm_lib.tar.xz",
        "12345678901-linux/manifests/gfx94X-dcgpu/therock_manifest.json",
    ] {
        store.insert(BUCKET, key, Vec::new()).unwrap();
    }
    let backend = backend(&store);
    assert!(backend.list_artifacts(None).unwrap().is_empty());
    assert!(backend.list_artifacts(Some("blas")).unwrap().is_empty());

    store.insert(BUCKET, "12345678901-linux/blas_lib_gfx94X.tar.xz", Vec::new()).unwrap();
    assert_eq!(backend.list_artifacts(None).unwrap(), vec!["blas_lib_gfx94X.tar.xz"]);
}

#[test]
fn upload_writes_artifact_and_sidecar_keys() {
    let store = Arc::new(MemoryObjectStore::new());
    let scratch = TempDir::new().unwrap();
    let source = scratch.path().join("blas_lib_gfx94X.tar.xz");
    fs::write(&source, "archive").unwrap();
    fs::write(scratch.path().join("blas_lib_gfx94X.tar.xz.sha256sum"), "sum").unwrap();

    backend(&store).upload_artifact(&source, "blas_lib_gfx94X.tar.xz").unwrap();
    assert_eq!(
        store.get(BUCKET, "12345678901-linux/blas_lib_gfx94X.tar.xz").unwrap(),
        Some(b"archive".to_vec())
    );
    assert_eq!(
        store.get(BUCKET, "12345678901-linux/blas_lib_gfx94X.tar.xz.sha256sum").unwrap(),
        Some(b"sum".to_vec())
    );
}

#[test]
fn download_copies_sidecar_when_present() {
    let store = Arc::new(MemoryObjectStore::new());
    store.insert(BUCKET, "12345678901-linux/a_lib.tar.xz", b"a".to_vec()).unwrap();
    store.insert(BUCKET, "12345678901-linux/a_lib.tar.xz.sha256sum", b"s".to_vec()).unwrap();
    store.insert(BUCKET, "12345678901-linux/b_lib.tar.xz", b"b".to_vec()).unwrap();
    let scratch = TempDir::new().unwrap();
    let backend = backend(&store);

    let dest = scratch.path().join("nested").join("a_lib.tar.xz");
    backend.download_artifact("a_lib.tar.xz", &dest).unwrap();
    assert_eq!(fs::read(&dest).unwrap(), b"a");
    assert_eq!(fs::read(scratch.path().join("nested").join("a_lib.tar.xz.sha256sum")).unwrap(), b"s");

    let dest = scratch.path().join("b_lib.tar.xz");
    backend.download_artifact("b_lib.tar.xz", &dest).unwrap();
    assert_eq!(fs::read(&dest).unwrap(), b"b");
    assert!(!scratch.path().join("b_lib.tar.xz.sha256sum").exists());
}

#[test]
fn missing_artifact_reports_object_uri() {
    let store = Arc::new(MemoryObjectStore::new());
    let scratch = TempDir::new().unwrap();
    let err = backend(&store).download_artifact("gone.tar.xz", &scratch.path().join("gone")).unwrap_err();
    match err {
        BackendError::NotFound(message) => {
            assert!(message.contains("s3://therock-ci-artifacts/12345678901-linux/gone.tar.xz"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn exists_follows_store_contents() {
    let store = Arc::new(MemoryObjectStore::new());
    store.insert(BUCKET, "12345678901-linux/a_lib.tar.xz", Vec::new()).unwrap();
    let backend = backend(&store);
    assert!(backend.artifact_exists("a_lib.tar.xz").unwrap());
    assert!(!backend.artifact_exists("b_lib.tar.xz").unwrap());
}

#[test]
fn external_namespace_is_part_of_keys() {
    let store = Arc::new(MemoryObjectStore::new());
    let scratch = TempDir::new().unwrap();
    let source = scratch.path().join("a_lib.tar.xz");
    fs::write(&source, "x").unwrap();
    let repository = RepositoryId::parse("SomeOrg/SomeRepo").unwrap();
    let root =
        RunOutputRoot::from_resolved(select_bucket(&repository, false, None, None), "99", "windows");
    let backend = S3Backend::from_client(root, store.clone());

    backend.upload_artifact(&source, "a_lib.tar.xz").unwrap();
    assert!(store.exists("therock-ci-artifacts-external", "SomeOrg-SomeRepo/99-windows/a_lib.tar.xz").unwrap());
    assert_eq!(backend.list_artifacts(None).unwrap(), vec!["a_lib.tar.xz"]);
}

#[test]
fn invalid_keys_are_rejected_before_store_access() {
    let store = Arc::new(MemoryObjectStore::new());
    let backend = backend(&store);
    assert!(matches!(backend.artifact_exists("../other-run/a.tar.xz"), Err(BackendError::Invalid(_))));
    assert!(matches!(
        backend.upload_artifact(Path::new("/nonexistent"), ""),
        Err(BackendError::Invalid(_))
    ));
}
