//! Shared error types for the services crate.

use thiserror::Error;

use onboard_core::ProgressError;
use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;

/// Errors emitted by `ProgressTracker` and the services built on it.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum TrackerError {
    #[error("no onboarding record for {0}")]
    NotFound(String),
    #[error(transparent)]
    Validation(#[from] ProgressError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl TrackerError {
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

/// Errors emitted by `ReportService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ReportError {
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted while bootstrapping onboarding services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}
