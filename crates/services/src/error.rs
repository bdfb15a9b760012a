//! Shared error types for the services crate.

use thiserror::Error;

use guessr_core::model::{SessionConfigError, SessionSummaryError};
use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;

/// Errors emitted by the HTTP catalog adapter.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CatalogError {
    #[error("catalog request failed with status {0}")]
    HttpStatus(reqwest::StatusCode),
    #[error("catalog returned no ids for category {0}")]
    EmptyCategory(u32),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `StatsService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StatsError {
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Reasons a session cannot start from the current catalog snapshot.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ReadinessError {
    #[error("catalog snapshot is malformed: {0}")]
    InvalidSnapshot(String),
    #[error("selected categories have no items")]
    EmptyPool,
    #[error("settings changed while waiting for the catalog")]
    Stale,
    #[error("catalog initialization failed: {0}")]
    CatalogUnavailable(String),
    #[error("catalog was not ready after {polls} polls")]
    TimedOut { polls: u32 },
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by session services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionError {
    #[error("no items available for session")]
    Empty,
    #[error("session already completed")]
    Completed,
    #[error("session is not finished yet")]
    NotFinished,
    #[error("the current item's name is unresolved; it can only be passed")]
    Unresolved,
    #[error(transparent)]
    Readiness(#[from] ReadinessError),
    #[error(transparent)]
    Summary(#[from] SessionSummaryError),
    #[error(transparent)]
    Stats(#[from] StatsError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `SessionSettingsService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SettingsServiceError {
    #[error(transparent)]
    Validation(#[from] SessionConfigError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
}
