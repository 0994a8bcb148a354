// crates/run-outputs-github/src/actions.rs
// ============================================================================
// Module: Workflow Command Files
// Description: Writers for GitHub Actions environment files.
// Purpose: Publish step outputs, env vars, PATH entries, and job summaries.
// Dependencies: thiserror
// ============================================================================

//! ## Overview
//! The Actions runner exposes one file per channel (`GITHUB_OUTPUT`,
//! `GITHUB_ENV`, `GITHUB_PATH`, `GITHUB_STEP_SUMMARY`). Each write appends
//! to the file. When the runner did not provide a file the write is skipped
//! and reported as [`FileWrite::Skipped`] so callers can warn.
//!
//! Values containing newlines use the runner's heredoc form
//! (`name<<DELIMITER`) with a delimiter that does not occur in the value.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;

use thiserror::Error;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Result of a workflow command file write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileWrite {
    /// Content was appended.
    Written,
    /// The runner did not provide the file; nothing was written.
    Skipped,
}

/// Workflow command file errors.
#[derive(Debug, Error)]
pub enum WorkflowCommandError {
    /// Entry name is empty or contains `=` or a newline.
    #[error("invalid workflow command name '{0}'")]
    InvalidName(String),
    /// Appending to the file failed.
    #[error("failed to write {path}: {message}")]
    Io {
        /// File path.
        path: String,
        /// I/O error message.
        message: String,
    },
}

/// Paths of the runner-provided workflow command files.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkflowCommandFiles {
    /// Step output file (`GITHUB_OUTPUT`).
    pub output: Option<PathBuf>,
    /// Environment file for later steps (`GITHUB_ENV`).
    pub env: Option<PathBuf>,
    /// PATH file for later steps (`GITHUB_PATH`).
    pub path: Option<PathBuf>,
    /// Job summary file (`GITHUB_STEP_SUMMARY`).
    pub step_summary: Option<PathBuf>,
}

impl WorkflowCommandFiles {
    /// Sets step output parameters.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowCommandError`] for invalid names or write failures.
    pub fn set_output<I, K, V>(&self, values: I) -> Result<FileWrite, WorkflowCommandError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        append_key_values(self.output.as_deref(), values)
    }

    /// Sets environment variables for later steps.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowCommandError`] for invalid names or write failures.
    pub fn set_env<I, K, V>(&self, values: I) -> Result<FileWrite, WorkflowCommandError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        append_key_values(self.env.as_deref(), values)
    }

    /// Prepends a directory to PATH for later steps.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowCommandError`] when the write fails.
    pub fn add_to_path(&self, entry: &Path) -> Result<FileWrite, WorkflowCommandError> {
        append(self.path.as_deref(), &format!("{}\n", entry.display()))
    }

    /// Appends markdown to the job summary, followed by a blank line.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowCommandError`] when the write fails.
    pub fn append_step_summary(&self, summary: &str) -> Result<FileWrite, WorkflowCommandError> {
        append(self.step_summary.as_deref(), &format!("{summary}\n\n"))
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Formats and appends `name=value` entries.
fn append_key_values<I, K, V>(
    path: Option<&Path>,
    values: I,
) -> Result<FileWrite, WorkflowCommandError>
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    let mut content = String::new();
    for (name, value) in values {
        content.push_str(&format_entry(name.as_ref(), value.as_ref())?);
    }
    append(path, &content)
}

/// Formats one entry, switching to heredoc form for multi-line values.
pub(crate) fn format_entry(name: &str, value: &str) -> Result<String, WorkflowCommandError> {
    if name.is_empty() || name.contains(['=', '\n', '\r']) {
        return Err(WorkflowCommandError::InvalidName(name.to_string()));
    }
    if !value.contains(['\n', '\r']) {
        return Ok(format!("{name}={value}\n"));
    }
    let mut delimiter = String::from("RUN_OUTPUTS_EOF");
    let mut counter = 0u32;
    while value.lines().any(|line| line == delimiter) {
        counter = counter.saturating_add(1);
        delimiter = format!("RUN_OUTPUTS_EOF_{counter}");
    }
    Ok(format!("{name}<<{delimiter}\n{value}\n{delimiter}\n"))
}

/// Appends content to a command file when one is configured.
fn append(path: Option<&Path>, content: &str) -> Result<FileWrite, WorkflowCommandError> {
    let Some(path) = path else {
        return Ok(FileWrite::Skipped);
    };
    let io_error = |err: std::io::Error| WorkflowCommandError::Io {
        path: path.display().to_string(),
        message: err.to_string(),
    };
    let mut file = OpenOptions::new().create(true).append(true).open(path).map_err(io_error)?;
    file.write_all(content.as_bytes()).map_err(io_error)?;
    Ok(FileWrite::Written)
}

#[cfg(test)]
mod tests;
