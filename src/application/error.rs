use thiserror::Error;

use crate::domain::{AccountId, Amount, BalanceError, UserId, format_amount};
use crate::storage::StoreError;

/// Coarse classification used by outer surfaces (HTTP status, CLI exit).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    NotFound,
    Conflict,
    Forbidden,
    Internal,
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error(
        "Insufficient funds in account {account_number}: balance {}, required {}",
        two_dp(.balance),
        two_dp(.required)
    )]
    InsufficientFunds {
        account_number: String,
        balance: Amount,
        required: Amount,
    },

    #[error("Currency mismatch between accounts: {from_currency} vs {to_currency}")]
    CurrencyMismatch {
        from_currency: String,
        to_currency: String,
    },

    #[error("Invalid currency code: {0}")]
    InvalidCurrency(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("User not found: {0}")]
    UserNotFound(String),

    #[error("Account not found: {0}")]
    AccountNotFound(String),

    #[error("Transaction not found: {0}")]
    TransactionNotFound(String),

    #[error("Username already exists: {0}")]
    UsernameTaken(String),

    #[error("Email already exists: {0}")]
    EmailTaken(String),

    #[error("User {0} already has an account")]
    AccountAlreadyExists(UserId),

    #[error("User {user_id} still owns {accounts} account(s)")]
    UserHasAccounts { user_id: UserId, accounts: usize },

    #[error("Account {0} was modified concurrently, retry the operation")]
    ConcurrentModification(String),

    #[error("User is blocked: {0}")]
    UserBlocked(String),

    #[error("Storage error: {0}")]
    Storage(#[from] anyhow::Error),
}

impl AppError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::InvalidAmount(_)
            | AppError::InsufficientFunds { .. }
            | AppError::CurrencyMismatch { .. }
            | AppError::InvalidCurrency(_)
            | AppError::InvalidInput(_) => ErrorKind::Validation,
            AppError::UserNotFound(_)
            | AppError::AccountNotFound(_)
            | AppError::TransactionNotFound(_) => ErrorKind::NotFound,
            AppError::UsernameTaken(_)
            | AppError::EmailTaken(_)
            | AppError::AccountAlreadyExists(_)
            | AppError::UserHasAccounts { .. }
            | AppError::ConcurrentModification(_) => ErrorKind::Conflict,
            AppError::UserBlocked(_) => ErrorKind::Forbidden,
            AppError::Storage(_) => ErrorKind::Internal,
        }
    }

    pub(crate) fn account_id_not_found(id: AccountId) -> Self {
        AppError::AccountNotFound(format!("id {}", id))
    }

    pub(crate) fn user_id_not_found(id: UserId) -> Self {
        AppError::UserNotFound(format!("id {}", id))
    }

    pub(crate) fn from_balance(account_number: &str, err: BalanceError) -> Self {
        match err {
            BalanceError::NonPositiveAmount(amount) => {
                AppError::InvalidAmount(format!("amount must be positive, got {}", amount))
            }
            BalanceError::InsufficientFunds { balance, required } => AppError::InsufficientFunds {
                account_number: account_number.to_string(),
                balance,
                required,
            },
            BalanceError::Overflow { amount, .. } => AppError::InvalidAmount(format!(
                "{} exceeds the maximum balance of account {}",
                amount, account_number
            )),
        }
    }
}

fn two_dp(amount: &Amount) -> String {
    format_amount(*amount)
}

/// Constraint failures that a service did not anticipate are internal errors;
/// services translate the ones they expect before reaching this.
impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Other(e) => AppError::Storage(e),
            other => AppError::Storage(anyhow::Error::new(other)),
        }
    }
}
