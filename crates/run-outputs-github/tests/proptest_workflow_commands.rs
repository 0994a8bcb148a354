//! Workflow command file property-based tests.
// crates/run-outputs-github/tests/proptest_workflow_commands.rs
// ============================================================================
// Module: Workflow Command Property-Based Tests
// Description: Randomized checks for step output encoding.
// Purpose: Ensure arbitrary values never corrupt neighbouring entries.
// ============================================================================

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    clippy::missing_docs_in_private_items,
    reason = "Test-only assertions and helpers are permitted."
)]

use proptest::prelude::*;
use run_outputs_github::WorkflowCommandFiles;

/// Decodes `name=value` and heredoc entries back into pairs.
fn decode(content: &str) -> Vec<(String, String)> {
    let mut entries = Vec::new();
    let mut lines = content.split('\n');
    while let Some(line) = lines.next() {
        if line.is_empty() {
            continue;
        }
        let name_end = line
            .find(|c: char| !(c.is_ascii_lowercase() || c == '_'))
            .unwrap_or(line.len());
        let (name, rest) = line.split_at(name_end);
        if let Some(delimiter) = rest.strip_prefix("<<") {
            let mut value_lines = Vec::new();
            for next in lines.by_ref() {
                if next == delimiter {
                    break;
                }
                value_lines.push(next);
            }
            entries.push((name.to_string(), value_lines.join("\n")));
        } else if let Some(value) = rest.strip_prefix('=') {
            entries.push((name.to_string(), value.to_string()));
        }
    }
    entries
}

proptest! {
    #[test]
    fn outputs_decode_to_original_pairs(
        first in "[a-z_]{1,12}",
        first_value in "[ -~]{0,24}",
        second in "[a-z_]{1,12}",
        second_value in "[a-zA-Z0-9 ]{0,12}(\n[a-zA-Z0-9 ]{1,12}){1,3}",
    ) {
        let dir = tempfile::tempdir().unwrap();
        let files = WorkflowCommandFiles {
            output: Some(dir.path().join("output")),
            ..WorkflowCommandFiles::default()
        };
        files.set_output([(first.as_str(), first_value.as_str())]).unwrap();
        files.set_output([(second.as_str(), second_value.as_str())]).unwrap();
        let content = std::fs::read_to_string(dir.path().join("output")).unwrap();
        let decoded = decode(&content);
        prop_assert_eq!(decoded, vec![(first, first_value), (second, second_value)]);
    }
}
