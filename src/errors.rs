//! Typed error hierarchy for bindery.
//!
//! One enum per subsystem:
//! - `StoreError` — customer config file CRUD failures
//! - `RegistryError` — chemical list mutations and lookups
//! - `GithubError` — the closed status classification for the GitHub API
//! - `RenderError` — template loading and substitution
//! - `DeployError` — deployment pipeline and post-publish verification

use std::path::PathBuf;

use thiserror::Error;

/// Errors from the customer configuration store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Customer '{slug}' not found")]
    CustomerNotFound { slug: String },

    #[error("Customer '{slug}' already exists")]
    AlreadyExists { slug: String },

    #[error("Failed to read or write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid customer config at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Errors from chemical registry operations.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// One or more required fields are missing or malformed. Each entry
    /// names the field and what is wrong with it.
    #[error("Invalid chemical: {}", problems.join("; "))]
    Validation { problems: Vec<String> },

    #[error("Chemical '{id}' not found")]
    ChemicalNotFound { id: String },

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Status classification for GitHub API responses.
///
/// Callers match on `NotFound` (existence probes) and `Conflict`
/// (already-exists / already-enabled recovery) instead of comparing status
/// codes; every other non-success status surfaces as `Api`.
#[derive(Debug, Error)]
pub enum GithubError {
    #[error("GitHub resource not found")]
    NotFound,

    #[error("GitHub reports the resource already exists")]
    Conflict,

    #[error("GitHub API returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("GitHub request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

/// Errors from site template rendering.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Embedded template '{name}' is missing")]
    TemplateMissing { name: String },

    #[error("Template placeholder '{{{{{name}}}}}' was not substituted")]
    UnresolvedPlaceholder { name: String },

    #[error("Failed to serialize site data: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors from the deployment pipeline.
#[derive(Debug, Error)]
pub enum DeployError {
    #[error(transparent)]
    Github(#[from] GithubError),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error("Failed to read local file {path}: {source}")]
    LocalFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Verification failed for {url}: {reason}")]
    Verification { url: String, reason: String },
}
