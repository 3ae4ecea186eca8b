//! Errors of the bridge facade.
//!
//! Script-visible errors live in [`netbridge_core::error`]. This module only
//! adds the failures of loading configuration and snapshots.

use thiserror::Error;

use netbridge_core::PersistError;

/// Configuration could not be loaded.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid bridge config: {0}")]
    Json(#[from] serde_json::Error),
}

/// A runtime snapshot could not be encoded or restored.
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("snapshot is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Persist(#[from] PersistError),
}
