//! Error types for the points ledger

use thiserror::Error;

/// Result type for points ledger operations
pub type Result<T> = std::result::Result<T, Error>;

/// Points ledger errors
#[derive(Error, Debug)]
pub enum Error {
    /// Operation references an unregistered payer
    #[error("Payer was not found: {0}")]
    PayerNotFound(String),

    /// Payer id is already registered
    #[error("Payer already registered: {0}")]
    PayerExists(String),

    /// Malformed ledger write (empty payer id, negative purchase, ...)
    #[error("Invalid entry: {0}")]
    InvalidEntry(String),

    /// Malformed spend request (negative amount)
    #[error("Invalid spend request: {0}")]
    InvalidSpendRequest(String),

    /// Spend exceeds the total balance and the policy rejects shortfalls
    #[error("Insufficient points: requested {requested}, available {available}")]
    InsufficientPoints {
        /// Points requested by the caller
        requested: i64,
        /// Points available across all payers
        available: i64,
    },

    /// Balance index diverged from the ledger
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    /// Concurrency error (actor mailbox closed, etc.)
    #[error("Concurrency error: {0}")]
    Concurrency(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// True for errors caused by the caller's input rather than the service
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Error::PayerNotFound(_)
                | Error::PayerExists(_)
                | Error::InvalidEntry(_)
                | Error::InvalidSpendRequest(_)
                | Error::InsufficientPoints { .. }
        )
    }
}
