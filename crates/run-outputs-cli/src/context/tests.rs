// crates/run-outputs-cli/src/context/tests.rs
// ============================================================================
// Module: CLI Run Context Tests
// Description: Unit tests for environment and config wiring.
// Purpose: Pin defaults, overrides, offline resolution, and backend choice.
// Dependencies: run-outputs-cli context
// ============================================================================

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::missing_docs_in_private_items,
    reason = "Test-only output and panic-based assertions are permitted."
)]

// ============================================================================
// SECTION: Imports
// ============================================================================

use run_outputs_config::LocalSettings;
use run_outputs_config::ObjectStoreSettings;
use run_outputs_core::NoopEventSink;

use super::*;

// ============================================================================
// SECTION: Helpers
// ============================================================================

fn context_with(pairs: &[(&str, &str)], config: OutputsConfig) -> CliContext {
    let env = EnvSnapshot::from_pairs(pairs.iter().copied()).unwrap();
    CliContext::new(env, config, Arc::new(NoopEventSink))
}

fn context(pairs: &[(&str, &str)]) -> CliContext {
    context_with(pairs, OutputsConfig::default())
}

fn offline(run_id: &str, platform: &str) -> RunSelection {
    RunSelection {
        run_id: Some(run_id.to_string()),
        platform: Some(platform.to_string()),
        repository: None,
        offline: true,
    }
}

// ============================================================================
// SECTION: Settings
// ============================================================================

#[test]
fn s3_requests_are_unsigned_without_session_credentials() {
    assert!(context(&[]).s3_settings().anonymous);
    let partial = context(&[("AWS_ACCESS_KEY_ID", "a"), ("AWS_SECRET_ACCESS_KEY", "b")]);
    assert!(partial.s3_settings().anonymous);
    let signed = context(&[
        ("AWS_ACCESS_KEY_ID", "a"),
        ("AWS_SECRET_ACCESS_KEY", "b"),
        ("AWS_SESSION_TOKEN", "c"),
    ]);
    assert!(!signed.s3_settings().anonymous);
}

#[test]
fn config_overrides_s3_signing_and_endpoint() {
    let config = OutputsConfig {
        object_store: ObjectStoreSettings {
            region: Some("us-west-2".to_string()),
            endpoint: Some("https://minio.example.com".to_string()),
            force_path_style: true,
            allow_http: false,
            anonymous: Some(false),
        },
        ..OutputsConfig::default()
    };
    let settings = context_with(&[], config).s3_settings();
    assert!(!settings.anonymous);
    assert!(settings.force_path_style);
    assert_eq!(settings.region.as_deref(), Some("us-west-2"));
    assert_eq!(settings.endpoint.as_deref(), Some("https://minio.example.com"));
}

#[test]
fn staging_dir_prefers_environment_over_config() {
    let config = OutputsConfig {
        local: LocalSettings {
            staging_dir: Some("/from/config".to_string()),
        },
        ..OutputsConfig::default()
    };
    let from_config = context_with(&[], config.clone());
    assert_eq!(from_config.staging_dir(), Some(PathBuf::from("/from/config")));
    let from_env = context_with(&[("THEROCK_LOCAL_STAGING_DIR", "/from/env")], config);
    assert_eq!(from_env.staging_dir(), Some(PathBuf::from("/from/env")));
    assert_eq!(context(&[]).staging_dir(), None);
}

#[test]
fn workflow_files_follow_environment() {
    let files = context(&[("GITHUB_OUTPUT", "/tmp/out"), ("GITHUB_STEP_SUMMARY", "/tmp/summary")])
        .workflow_files();
    assert_eq!(files.output, Some(PathBuf::from("/tmp/out")));
    assert_eq!(files.step_summary, Some(PathBuf::from("/tmp/summary")));
    assert_eq!(files.env, None);
    assert_eq!(files.path, None);
}

#[test]
fn ci_flag_follows_environment() {
    assert!(!context(&[]).is_ci());
    assert!(context(&[("CI", "true")]).is_ci());
}

#[test]
fn default_repository_uses_environment_then_canonical() {
    assert_eq!(context(&[]).default_repository().unwrap(), RepositoryId::canonical());
    let fork = context(&[("GITHUB_REPOSITORY", "SomeOrg/TheRock")]);
    assert_eq!(fork.default_repository().unwrap().full_name(), "SomeOrg/TheRock");
    assert!(context(&[("GITHUB_REPOSITORY", "no-slash")]).default_repository().is_err());
}

// ============================================================================
// SECTION: Run Selection
// ============================================================================

#[test]
fn run_context_defaults_come_from_environment() {
    let context = context(&[("GITHUB_RUN_ID", "987"), ("THEROCK_PLATFORM", "windows")]);
    let run = context.run_context(&RunSelection::default());
    assert_eq!(run.run_id.as_str(), "987");
    assert_eq!(run.platform.as_str(), "windows");
    assert_eq!(run.repository, None);

    let run = context.run_context(&RunSelection {
        run_id: Some("1".to_string()),
        platform: Some("linux".to_string()),
        repository: Some("SomeOrg/SomeRepo".to_string()),
        offline: false,
    });
    assert_eq!(run.run_id.as_str(), "1");
    assert_eq!(run.platform.as_str(), "linux");
    assert_eq!(run.repository.as_deref(), Some("SomeOrg/SomeRepo"));
}

#[test]
fn local_run_id_is_always_offline() {
    let context = context(&[]);
    assert!(context.is_offline(&RunSelection::default()));
    let online = RunSelection {
        run_id: Some("12345".to_string()),
        ..RunSelection::default()
    };
    assert!(!context.is_offline(&online));
}

// ============================================================================
// SECTION: Offline Resolution
// ============================================================================

#[test]
fn offline_root_for_canonical_repository() {
    let root = context(&[]).storage_root(&offline("12345", "linux")).unwrap();
    assert_eq!(root.bucket(), "therock-ci-artifacts");
    assert_eq!(root.external_repo(), "");
    assert_eq!(root.prefix(), "12345-linux");
}

#[test]
fn offline_root_for_fork_flag_and_external_repository() {
    let fork =
        context(&[("IS_PR_FROM_FORK", "true")]).storage_root(&offline("1", "linux")).unwrap();
    assert_eq!(fork.bucket(), "therock-ci-artifacts-external");
    assert_eq!(fork.external_repo(), "ROCm-TheRock/");

    let mut selection = offline("1", "windows");
    selection.repository = Some("SomeOrg/SomeRepo".to_string());
    let external = context(&[]).storage_root(&selection).unwrap();
    assert_eq!(external.bucket(), "therock-ci-artifacts-external");
    assert_eq!(external.prefix(), "SomeOrg-SomeRepo/1-windows");
}

#[test]
fn offline_root_honors_release_type() {
    let root =
        context(&[("RELEASE_TYPE", "nightly")]).storage_root(&offline("5", "linux")).unwrap();
    assert_eq!(root.bucket(), "therock-nightly-artifacts");
}

#[test]
fn offline_root_rejects_malformed_repository() {
    let mut selection = offline("1", "linux");
    selection.repository = Some("not a repo".to_string());
    let err = context(&[]).storage_root(&selection).unwrap_err();
    assert!(err.starts_with("bucket resolution failed"), "{err}");
}

// ============================================================================
// SECTION: Backend Selection
// ============================================================================

#[test]
fn staging_dir_selects_local_backend() {
    let context =
        context(&[("THEROCK_LOCAL_STAGING_DIR", "/tmp/staging"), ("GITHUB_RUN_ID", "42")]);
    let selection = context
        .backend_selection(&RunSelection {
            platform: Some("linux".to_string()),
            ..RunSelection::default()
        })
        .unwrap();
    match selection {
        BackendSelection::Local { staging_dir, root } => {
            assert_eq!(staging_dir, PathBuf::from("/tmp/staging"));
            assert_eq!(root.bucket(), "local");
            assert_eq!(root.prefix(), "42-linux");
        }
        other => panic!("expected local selection, got {other:?}"),
    }
}

#[test]
fn offline_without_staging_selects_s3_backend() {
    let selection = context(&[]).backend_selection(&offline("77", "linux")).unwrap();
    match selection {
        BackendSelection::S3 { root, settings } => {
            assert_eq!(root.s3_uri(), "s3://therock-ci-artifacts/77-linux");
            assert!(settings.anonymous);
        }
        other => panic!("expected S3 selection, got {other:?}"),
    }
}
