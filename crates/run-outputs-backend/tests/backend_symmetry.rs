//! Local and S3 backends agree on layout and listing behavior.
// crates/run-outputs-backend/tests/backend_symmetry.rs
// ============================================================================
// Module: Backend Symmetry Tests
// Description: Cross-backend checks through the public trait.
// Purpose: A staging directory and a bucket hold the same keys for a run.
// Dependencies: run-outputs-backend, run-outputs-core, proptest, tempfile
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
use std::path::Path;
use std::sync::Arc;

use proptest::prelude::*;
use run_outputs_backend::ArtifactBackend;
use run_outputs_backend::BackendError;
use run_outputs_backend::LocalDirectoryBackend;
use run_outputs_backend::MemoryObjectStore;
use run_outputs_backend::S3Backend;
use run_outputs_backend::ObjectStoreClient;
use run_outputs_backend::validate_artifact_key;
use run_outputs_core::RepositoryId;
use run_outputs_core::RunOutputRoot;
use run_outputs_core::select_bucket;
use tempfile::TempDir;

// ============================================================================
// SECTION: Fixtures
// ============================================================================

const ARTIFACTS: [&str; 4] = [
    "blas_lib_gfx94X.tar.xz",
    "blas_dev_gfx94X.tar.zst",
    "rocm-libraries_lib_gfx94X.tar.xz",
    "hipify_run_generic.tar.xz",
];

fn ci_root(run_id: &str, platform: &str) -> RunOutputRoot {
    let resolved = select_bucket(&RepositoryId::canonical(), false, None, None);
    RunOutputRoot::from_resolved(resolved, run_id, platform)
}

fn stage_sources(dir: &Path) {
    for name in ARTIFACTS {
        fs::write(dir.join(name), name).unwrap();
        fs::write(dir.join(format!("{name}.sha256sum")), format!("sum {name}")).unwrap();
    }
}

fn upload_all(backend: &dyn ArtifactBackend, dir: &Path) {
    for name in ARTIFACTS {
        backend.upload_artifact(&dir.join(name), name).unwrap();
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[test]
fn local_and_s3_backends_list_identically() {
    let sources = TempDir::new().unwrap();
    stage_sources(sources.path());

    let root = ci_root("12345678901", "linux");
    let staging = TempDir::new().unwrap();
    let local = LocalDirectoryBackend::new(staging.path(), root.clone()).unwrap();
    let store = Arc::new(MemoryObjectStore::new());
    let s3 = S3Backend::from_client(root.clone(), store.clone());

    upload_all(&local, sources.path());
    upload_all(&s3, sources.path());

    for filter in [None, Some("blas"), Some("rocm-libraries"), Some("missing")] {
        assert_eq!(local.list_artifacts(filter).unwrap(), s3.list_artifacts(filter).unwrap());
    }
    assert_eq!(
        local.list_artifacts(Some("blas")).unwrap(),
        vec!["blas_dev_gfx94X.tar.zst", "blas_lib_gfx94X.tar.xz"]
    );

    for name in ARTIFACTS {
        let relative = root.artifact_s3_key(name);
        assert!(staging.path().join(&relative).is_file(), "{relative} missing locally");
        assert!(store.exists("therock-ci-artifacts", &relative).unwrap());
        let sidecar = format!("{relative}.sha256sum");
        assert!(staging.path().join(&sidecar).is_file());
        assert!(store.exists("therock-ci-artifacts", &sidecar).unwrap());
    }
}

#[test]
fn downloads_match_across_backends() {
    let sources = TempDir::new().unwrap();
    stage_sources(sources.path());
    let root = ci_root("1", "windows");
    let staging = TempDir::new().unwrap();
    let local = LocalDirectoryBackend::new(staging.path(), root.clone()).unwrap();
    let s3 = S3Backend::from_client(root, Arc::new(MemoryObjectStore::new()));
    upload_all(&local, sources.path());
    upload_all(&s3, sources.path());

    let out = TempDir::new().unwrap();
    let backends: [(&str, &dyn ArtifactBackend); 2] = [("local", &local), ("s3", &s3)];
    for (label, backend) in backends {
        let dir = out.path().join(label);
        backend.download_artifact(ARTIFACTS[0], &dir.join(ARTIFACTS[0])).unwrap();
    }
    for file in [ARTIFACTS[0].to_string(), format!("{}.sha256sum", ARTIFACTS[0])] {
        assert_eq!(
            fs::read(out.path().join("local").join(&file)).unwrap(),
            fs::read(out.path().join("s3").join(&file)).unwrap()
        );
    }
}

#[test]
fn missing_artifacts_are_not_found_on_both_backends() {
    let root = RunOutputRoot::for_local(Some("7".into()), Some("linux".into()), None);
    let staging = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    let local = LocalDirectoryBackend::new(staging.path(), root.clone()).unwrap();
    let s3 = S3Backend::from_client(root, Arc::new(MemoryObjectStore::new()));
    for backend in [&local as &dyn ArtifactBackend, &s3 as &dyn ArtifactBackend] {
        assert!(!backend.artifact_exists("absent.tar.xz").unwrap());
        let err = backend.download_artifact("absent.tar.xz", &out.path().join("absent")).unwrap_err();
        assert!(matches!(err, BackendError::NotFound(_)), "{err:?}");
    }
}

// ============================================================================
// SECTION: Properties
// ============================================================================

fn segment() -> impl Strategy<Value = String> {
    "[A-Za-z0-9_][A-Za-z0-9_.-]{0,15}".prop_filter("dot segments", |value| {
        value != "." && value != ".."
    })
}

proptest! {
    #[test]
    fn valid_keys_stay_under_run_directory(segments in prop::collection::vec(segment(), 1..4)) {
        let key = segments.join("/");
        prop_assert!(validate_artifact_key(&key).is_ok());

        let root = RunOutputRoot::for_local(Some("9".into()), Some("linux".into()), None);
        let staging = TempDir::new().unwrap();
        let local = LocalDirectoryBackend::new(staging.path(), root).unwrap();
        let source = staging.path().join("source.bin");
        fs::write(&source, b"x").unwrap();
        local.upload_artifact(&source, &key).unwrap();

        let stored = local.base_path().join(&key);
        prop_assert!(stored.is_file());
        prop_assert!(stored.starts_with(local.base_path()));
        prop_assert!(local.artifact_exists(&key).unwrap());
    }

    #[test]
    fn traversal_keys_are_rejected(prefix in segment(), suffix in segment()) {
        let key = format!("{prefix}/../{suffix}");
        prop_assert!(matches!(validate_artifact_key(&key), Err(BackendError::Invalid(_))));
    }
}
