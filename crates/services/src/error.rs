//! Shared error types for the services crate.

use thiserror::Error;

use patrol_core::model::LedgerError;
use storage::sqlite::SqliteInitError;

/// Errors from a single ledger fetch attempt. `LedgerService` never surfaces these;
/// they only decide whether the cached copy is used.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LedgerFetchError {
    #[error("ledger request failed with status {0}")]
    HttpStatus(reqwest::StatusCode),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error("failed to read ledger file: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
}
