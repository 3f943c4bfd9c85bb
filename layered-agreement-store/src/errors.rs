//! Error types for store-backed agreement.

use layered_agreement::AgreementError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Table configuration rejected during validation.
    #[error("invalid table configuration: {0}")]
    Config(String),

    /// A query was issued without any label to filter on.
    #[error("at least one annotation label is required")]
    EmptyTypeFilter,

    #[error("failed to load {path}: {message}")]
    Load { path: String, message: String },

    #[error(transparent)]
    Agreement(#[from] AgreementError),
}

pub type StoreResult<T> = Result<T, StoreError>;
