// crates/run-outputs-github/src/actions/tests.rs
// ============================================================================
// Module: Workflow Command File Tests
// Description: Unit tests for workflow command file formatting and appends.
// Purpose: Ensure outputs land in the runner's expected file format.
// Dependencies: run-outputs-github, tempfile
// ============================================================================

#![allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::panic,
    clippy::missing_docs_in_private_items,
    reason = "Test-only assertions favor direct unwrap/expect for clarity."
)]

use super::*;

fn files_in(dir: &Path) -> WorkflowCommandFiles {
    WorkflowCommandFiles {
        output: Some(dir.join("output")),
        env: Some(dir.join("env")),
        path: Some(dir.join("path")),
        step_summary: Some(dir.join("summary.md")),
    }
}

#[test]
fn set_output_appends_key_values() {
    let dir = tempfile::tempdir().unwrap();
    let files = files_in(dir.path());
    let outcome = files
        .set_output([("bucket", "therock-ci-artifacts"), ("prefix", "12345-linux")])
        .unwrap();
    assert_eq!(outcome, FileWrite::Written);
    files.set_output([("external_repo", "")]).unwrap();
    let content = std::fs::read_to_string(dir.path().join("output")).unwrap();
    assert_eq!(content, "bucket=therock-ci-artifacts\nprefix=12345-linux\nexternal_repo=\n");
}

#[test]
fn set_env_accepts_owned_pairs() {
    let dir = tempfile::tempdir().unwrap();
    let files = files_in(dir.path());
    let values = vec![("THEROCK_RUN_ID".to_string(), "42".to_string())];
    files.set_env(values).unwrap();
    let content = std::fs::read_to_string(dir.path().join("env")).unwrap();
    assert_eq!(content, "THEROCK_RUN_ID=42\n");
}

#[test]
fn add_to_path_writes_one_line_per_entry() {
    let dir = tempfile::tempdir().unwrap();
    let files = files_in(dir.path());
    files.add_to_path(Path::new("/opt/rocm/bin")).unwrap();
    files.add_to_path(Path::new("/opt/tools")).unwrap();
    let content = std::fs::read_to_string(dir.path().join("path")).unwrap();
    assert_eq!(content, "/opt/rocm/bin\n/opt/tools\n");
}

#[test]
fn step_summary_sections_are_separated() {
    let dir = tempfile::tempdir().unwrap();
    let files = files_in(dir.path());
    files.append_step_summary("## Artifacts").unwrap();
    files.append_step_summary("- blas").unwrap();
    let content = std::fs::read_to_string(dir.path().join("summary.md")).unwrap();
    assert_eq!(content, "## Artifacts\n\n- blas\n\n");
}

#[test]
fn missing_files_are_skipped() {
    let files = WorkflowCommandFiles::default();
    assert_eq!(files.set_output([("a", "b")]).unwrap(), FileWrite::Skipped);
    assert_eq!(files.set_env([("a", "b")]).unwrap(), FileWrite::Skipped);
    assert_eq!(files.add_to_path(Path::new("/bin")).unwrap(), FileWrite::Skipped);
    assert_eq!(files.append_step_summary("text").unwrap(), FileWrite::Skipped);
}

#[test]
fn invalid_names_are_rejected() {
    for name in ["", "a=b", "a\nb"] {
        assert!(matches!(format_entry(name, "v"), Err(WorkflowCommandError::InvalidName(_))));
    }
}

#[test]
fn multiline_values_use_heredoc() {
    let entry = format_entry("summary", "line one\nline two").unwrap();
    assert_eq!(entry, "summary<<RUN_OUTPUTS_EOF\nline one\nline two\nRUN_OUTPUTS_EOF\n");
}

#[test]
fn heredoc_delimiter_avoids_value_lines() {
    let entry = format_entry("body", "RUN_OUTPUTS_EOF\nmore").unwrap();
    assert_eq!(entry, "body<<RUN_OUTPUTS_EOF_1\nRUN_OUTPUTS_EOF\nmore\nRUN_OUTPUTS_EOF_1\n");
}

#[test]
fn unwritable_path_reports_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let files = WorkflowCommandFiles {
        output: Some(dir.path().join("missing").join("output")),
        ..WorkflowCommandFiles::default()
    };
    let err = files.set_output([("a", "b")]).unwrap_err();
    assert!(matches!(err, WorkflowCommandError::Io { .. }));
}
