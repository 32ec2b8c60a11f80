use thiserror::Error;

use crate::domain::LedgerError;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Invalid item id: {0}")]
    InvalidId(i64),

    #[error("Invalid category code: {0} (expected 0=flight, 1=hotel, 2=bus, 3=other)")]
    InvalidCategory(i64),

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Ledger is inconsistent: {0}")]
    Inconsistent(String),

    #[error("Database error: {0}")]
    Database(#[from] anyhow::Error),
}

impl From<LedgerError> for AppError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::InvalidId(id) => AppError::InvalidId(id),
            LedgerError::InvalidCategory(code) => AppError::InvalidCategory(code),
            LedgerError::OutOfSequence { .. } => AppError::Inconsistent(err.to_string()),
        }
    }
}
