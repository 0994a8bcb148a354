// crates/run-outputs-core/src/identifiers.rs
// ============================================================================
// Module: Run Outputs Identifiers
// Description: Typed identifiers for workflow runs, repositories, and platforms.
// Purpose: Provide serializable IDs with stable string forms for path derivation.
// Dependencies: serde, thiserror
// ============================================================================

//! ## Overview
//! Identifiers used to address run outputs. [`RunId`] and [`Platform`] are
//! opaque and interpolated verbatim into storage keys. [`RepositoryId`] is the
//! only identifier with structure: it must parse as exactly `owner/name`.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Owner of the canonical repository.
pub const CANONICAL_OWNER: &str = "ROCm";
/// Name of the canonical repository.
pub const CANONICAL_NAME: &str = "TheRock";
/// Canonical repository in `owner/name` form.
pub const CANONICAL_REPOSITORY: &str = "ROCm/TheRock";
/// Name of the internal releases repository (owned by [`CANONICAL_OWNER`]).
pub const INTERNAL_RELEASES_NAME: &str = "therock-releases-internal";

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Identifier parse errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentifierError {
    /// Repository string is not exactly `owner/name`.
    #[error("invalid repository '{0}': expected 'owner/name'")]
    InvalidRepository(String),
}

// ============================================================================
// SECTION: Run Identifier
// ============================================================================

/// Workflow run identifier (usually the provider-assigned numeric run ID).
///
/// # Invariants
/// - Used verbatim in storage keys; no validation is performed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunId(String);

impl RunId {
    /// Sentinel run identifier used for local staging.
    pub const LOCAL: &'static str = "local";

    /// Creates a new run identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for RunId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for RunId {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl From<u64> for RunId {
    fn from(value: u64) -> Self {
        Self::new(value.to_string())
    }
}

// ============================================================================
// SECTION: Platform
// ============================================================================

/// Platform label embedded in the run prefix.
///
/// Any string is accepted and used verbatim, so outputs already stored under
/// unusual platform names stay addressable.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Platform(String);

impl Platform {
    /// Linux platform label.
    pub const LINUX: &'static str = "linux";
    /// Windows platform label.
    pub const WINDOWS: &'static str = "windows";

    /// Creates a new platform label.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Returns the platform label of the current host.
    ///
    /// Labels match the lowercase operating system names used by existing
    /// stored outputs (`linux`, `windows`, `darwin`).
    #[must_use]
    pub fn host() -> Self {
        let name = match std::env::consts::OS {
            "macos" => "darwin",
            other => other,
        };
        Self::new(name)
    }

    /// Returns the platform label as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for Platform {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Platform {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

// ============================================================================
// SECTION: Repository Identifier
// ============================================================================

/// Source repository identity in `owner/name` form.
///
/// # Invariants
/// - `owner` and `name` are non-empty and contain no `/`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RepositoryId {
    /// Repository owner (user or organization).
    owner: String,
    /// Repository name.
    name: String,
}

impl RepositoryId {
    /// Parses an `owner/name` string.
    ///
    /// # Errors
    ///
    /// Returns [`IdentifierError::InvalidRepository`] unless the input splits
    /// into exactly two non-empty parts.
    pub fn parse(value: &str) -> Result<Self, IdentifierError> {
        let mut parts = value.split('/');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(owner), Some(name), None) if !owner.is_empty() && !name.is_empty() => {
                Ok(Self {
                    owner: owner.to_string(),
                    name: name.to_string(),
                })
            }
            _ => Err(IdentifierError::InvalidRepository(value.to_string())),
        }
    }

    /// Returns the canonical repository.
    #[must_use]
    pub fn canonical() -> Self {
        Self {
            owner: CANONICAL_OWNER.to_string(),
            name: CANONICAL_NAME.to_string(),
        }
    }

    /// Returns the repository owner.
    #[must_use]
    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// Returns the repository name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the `owner/name` form.
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }

    /// Returns true for the canonical repository.
    #[must_use]
    pub fn is_canonical(&self) -> bool {
        self.owner == CANONICAL_OWNER && self.name == CANONICAL_NAME
    }

    /// Returns true for the internal releases repository.
    #[must_use]
    pub fn is_internal_releases(&self) -> bool {
        self.owner == CANONICAL_OWNER && self.name == INTERNAL_RELEASES_NAME
    }

    /// Returns the storage namespace segment (`{owner}-{name}/`).
    #[must_use]
    pub fn namespace_prefix(&self) -> String {
        format!("{}-{}/", self.owner, self.name)
    }
}

impl fmt::Display for RepositoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

impl FromStr for RepositoryId {
    type Err = IdentifierError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::parse(value)
    }
}
