use thiserror::Error;

use crate::validation::ValidationError;

/// Error taxonomy for the share ledger.
///
/// Validation and not-found errors are reported to the caller verbatim and
/// never retried. `Oversold` and `InsufficientShares` are business rejections:
/// the engine never partially fulfills a request. `Consistency` means a ledger
/// invariant was violated and is surfaced as an internal error.
#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("oversold: requested {requested} shares but only {available} available")]
    Oversold { requested: i64, available: i64 },

    #[error("insufficient shares: requested {requested} but only {remaining} remaining")]
    InsufficientShares { requested: i64, remaining: i64 },

    #[error("user holds no shares")]
    NoShares,

    #[error("ledger consistency violation: {0}")]
    Consistency(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl LedgerError {
    pub fn not_found(entity: &str, id: impl std::fmt::Display) -> Self {
        LedgerError::NotFound(format!("{} {}", entity, id))
    }

    /// Whether the caller may retry the operation as-is. Pool/connection
    /// timeouts are transient; everything else needs a changed request or
    /// an operator.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            LedgerError::Database(sqlx::Error::PoolTimedOut)
                | LedgerError::Database(sqlx::Error::Io(_))
        )
    }
}

pub type LedgerResult<T> = Result<T, LedgerError>;
