//! Error types for the transfer gate

use crate::types::{AccountId, Amount};
use thiserror::Error;

/// Result type for gate operations
pub type Result<T> = std::result::Result<T, Error>;

/// Transfer gate errors
///
/// Every variant is raised before any state is mutated, so a failed
/// operation leaves balances, quotas, snapshots and the event log untouched.
#[derive(Error, Debug)]
pub enum Error {
    /// Sender is inside the hard-lock phase and not exempt
    #[error("Account locked: {0}")]
    AccountLocked(AccountId),

    /// Sender is inside the quota window but never held a non-zero balance
    #[error("Initial balance not set: {0}")]
    InitialBalanceNotSet(AccountId),

    /// Requested amount exceeds the releasable quota
    #[error("Quota exceeded for {account}: requested {requested}, available {available}")]
    QuotaExceeded {
        /// Paying account
        account: AccountId,
        /// Requested amount
        requested: Amount,
        /// Quota still available
        available: Amount,
    },

    /// Balance ledger cannot cover the movement
    #[error("Insufficient funds for {account}: balance {balance}, requested {requested}")]
    InsufficientFunds {
        /// Paying account
        account: AccountId,
        /// Current balance
        balance: Amount,
        /// Requested amount
        requested: Amount,
    },

    /// Delegated transfer exceeds the approved allowance
    #[error("Insufficient allowance from {owner} to {spender}: allowance {allowance}, requested {requested}")]
    InsufficientAllowance {
        /// Account whose funds are spent
        owner: AccountId,
        /// Account spending them
        spender: AccountId,
        /// Remaining allowance
        allowance: Amount,
        /// Requested amount
        requested: Amount,
    },

    /// Caller is not an administrator
    #[error("Unauthorized: {0}")]
    Unauthorized(AccountId),

    /// Checked arithmetic overflowed
    #[error("Arithmetic overflow: {0}")]
    ArithmeticOverflow(String),

    /// Concurrency error (actor mailbox closed, etc.)
    #[error("Concurrency error: {0}")]
    Concurrency(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Metrics registry error
    #[error("Metrics error: {0}")]
    Metrics(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Stable label for logs and metrics
    pub fn reason(&self) -> &'static str {
        match self {
            Error::AccountLocked(_) => "account_locked",
            Error::InitialBalanceNotSet(_) => "initial_balance_not_set",
            Error::QuotaExceeded { .. } => "quota_exceeded",
            Error::InsufficientFunds { .. } => "insufficient_funds",
            Error::InsufficientAllowance { .. } => "insufficient_allowance",
            Error::Unauthorized(_) => "unauthorized",
            Error::ArithmeticOverflow(_) => "arithmetic_overflow",
            Error::Concurrency(_) => "concurrency",
            Error::Config(_) => "config",
            Error::Metrics(_) => "metrics",
            Error::Io(_) => "io",
        }
    }
}

impl From<prometheus::Error> for Error {
    fn from(err: prometheus::Error) -> Self {
        Error::Metrics(err.to_string())
    }
}
