use crate::domain::{LedgerError, ValidationError};
use crate::storage::StorageError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("console io error: {0}")]
    Io(#[from] std::io::Error),

    /// Standard input reached end of file. Treated as a quit.
    #[error("input closed")]
    InputClosed,

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

impl AppError {
    /// Failures the command loop reports and moves past.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            AppError::Storage(_) | AppError::Ledger(_) | AppError::Validation(_)
        )
    }
}
