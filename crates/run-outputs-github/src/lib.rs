// crates/run-outputs-github/src/lib.rs
// ============================================================================
// Module: Run Outputs GitHub Library
// Description: GitHub REST client and Actions workflow command files.
// Purpose: Provide workflow run metadata and step output plumbing.
// Dependencies: reqwest, run-outputs-core, serde_json, thiserror
// ============================================================================

//! ## Overview
//! [`GitHubClient`] implements [`run_outputs_core::WorkflowRunLookup`] over
//! the GitHub REST API so bucket resolution can inspect fork status and run
//! dates. [`WorkflowCommandFiles`] appends to the runner's environment files.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod actions;
pub mod client;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use actions::FileWrite;
pub use actions::WorkflowCommandError;
pub use actions::WorkflowCommandFiles;
pub use client::DEFAULT_API_BASE_URL;
pub use client::GitHubApiError;
pub use client::GitHubClient;
pub use client::GitHubClientConfig;
