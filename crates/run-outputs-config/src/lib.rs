// crates/run-outputs-config/src/lib.rs
// ============================================================================
// Module: Run Outputs Config Library
// Description: Config file model and environment adapter.
// Purpose: Single source of truth for run-outputs.toml and CI env semantics.
// Dependencies: run-outputs-core, serde, toml
// ============================================================================

//! ## Overview
//! `run-outputs-config` turns process inputs into typed values: the optional
//! `run-outputs.toml` file and a one-shot snapshot of CI environment
//! variables. Nothing downstream reads the environment directly.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;
pub mod env;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::*;
pub use env::EnvSnapshot;
pub use env::WorkflowFilePaths;
pub use env::parse_bool;
