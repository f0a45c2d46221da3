//! Failure taxonomy for the core
//!
//! Invalid input and invariant violations are rejected synchronously with a
//! specific reason and no partial mutation; a sub-interval `advance` call is
//! not an error, it is a defined no-op. The core never retries.

use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum BankError {
    #[error("stock not found: {0}")]
    StockNotFound(String),

    #[error("amount must be positive, got {0}")]
    InvalidAmount(f64),

    #[error("insufficient balance: required {required:.2}, available {available:.2}")]
    InsufficientBalance { required: f64, available: f64 },

    #[error("insufficient shares of {symbol}: requested {requested}, held {held}")]
    InsufficientShares {
        symbol: String,
        requested: f64,
        held: f64,
    },

    #[error("account {0} already has an active loan")]
    LoanAlreadyActive(String),

    #[error("account {0} has no active loan")]
    NoActiveLoan(String),

    #[error("stability must be between 0 and 1, got {0}")]
    StabilityOutOfRange(f64),

    #[error("instrument {0} has an empty price history")]
    EmptyPriceHistory(String),

    #[error("invalid configuration: {0}")]
    BadConfig(String),
}
