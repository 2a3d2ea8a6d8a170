use smting_core::StoreError;
use thiserror::Error;

/// Errors raised inside the SQLite layer before they cross into the core.
#[derive(Error, Debug)]
pub enum DbError {
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("DB lock poisoned: {0}")]
    LockPoisoned(String),

    /// A column held something we cannot decode.
    #[error("Corrupt {column} on row {id}: {detail}")]
    Corrupt {
        column: &'static str,
        id: String,
        detail: String,
    },

    /// A domain-level failure detected mid-transaction.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<DbError> for StoreError {
    fn from(e: DbError) -> Self {
        match e {
            DbError::Store(inner) => inner,
            DbError::LockPoisoned(msg) => StoreError::LockPoisoned(msg),
            corrupt @ DbError::Corrupt { .. } => StoreError::Corrupt(corrupt.to_string()),
            other => StoreError::Backend(Box::new(other)),
        }
    }
}
