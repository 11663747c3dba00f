use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{Amount, User, UserId, format_amount, format_money, reference_code};

pub type AccountId = i64;

/// Prefix of every generated account number.
pub const ACCOUNT_NUMBER_PREFIX: &str = "ACC";

/// Generate a fresh account number: "ACC" + 8 uppercase alphanumerics.
/// Uniqueness against the store is checked by the caller.
pub fn generate_account_number() -> String {
    reference_code(ACCOUNT_NUMBER_PREFIX)
}

/// A bank account with its owner resolved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: AccountId,
    pub account_number: String,
    /// Never negative; only `deposit` and `withdraw` move it.
    pub balance: Amount,
    /// Fixed at creation, there is no conversion path.
    pub currency: String,
    pub owner: User,
    pub created_at: DateTime<Utc>,
}

impl Account {
    /// Add a positive amount to the balance.
    pub fn deposit(&mut self, amount: Amount) -> Result<(), BalanceError> {
        if amount <= Decimal::ZERO {
            return Err(BalanceError::NonPositiveAmount(amount));
        }
        self.balance = self
            .balance
            .checked_add(amount)
            .ok_or(BalanceError::Overflow {
                balance: self.balance,
                amount,
            })?;
        Ok(())
    }

    /// Remove a positive amount, refusing to go below zero.
    pub fn withdraw(&mut self, amount: Amount) -> Result<(), BalanceError> {
        if amount <= Decimal::ZERO {
            return Err(BalanceError::NonPositiveAmount(amount));
        }
        if !self.has_sufficient_balance(amount) {
            return Err(BalanceError::InsufficientFunds {
                balance: self.balance,
                required: amount,
            });
        }
        self.balance -= amount;
        Ok(())
    }

    pub fn has_sufficient_balance(&self, amount: Amount) -> bool {
        self.balance >= amount
    }

    pub fn owner_id(&self) -> UserId {
        self.owner.id
    }

    pub fn is_owner_blocked(&self) -> bool {
        self.owner.blocked
    }

    /// Balance with currency, e.g. "USD 1000.00".
    pub fn formatted_balance(&self) -> String {
        format_money(&self.currency, self.balance)
    }
}

/// An account row ready to be inserted; the store assigns the id.
#[derive(Debug, Clone)]
pub struct AccountDraft {
    pub account_number: String,
    pub user_id: UserId,
    pub balance: Amount,
    pub currency: String,
    pub created_at: DateTime<Utc>,
}

impl AccountDraft {
    pub fn new(account_number: String, user_id: UserId, currency: String) -> Self {
        Self {
            account_number,
            user_id,
            balance: Decimal::ZERO,
            currency,
            created_at: Utc::now(),
        }
    }

    pub fn with_balance(mut self, balance: Amount) -> Self {
        self.balance = balance;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BalanceError {
    NonPositiveAmount(Amount),
    InsufficientFunds { balance: Amount, required: Amount },
    /// The new balance would not fit in a decimal.
    Overflow { balance: Amount, amount: Amount },
}

impl std::fmt::Display for BalanceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BalanceError::NonPositiveAmount(amount) => {
                write!(f, "amount must be positive, got {}", amount)
            }
            BalanceError::InsufficientFunds { balance, required } => write!(
                f,
                "insufficient funds: balance {}, required {}",
                format_amount(*balance),
                format_amount(*required)
            ),
            BalanceError::Overflow { balance, amount } => write!(
                f,
                "amount {} overflows balance {}",
                amount,
                format_amount(*balance)
            ),
        }
    }
}

impl std::error::Error for BalanceError {}
