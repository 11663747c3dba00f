use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Amount, reference_code};

/// Prefix of every transaction identifier.
pub const TRANSACTION_ID_PREFIX: &str = "TXN";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TransactionType {
    Deposit,
    Withdraw,
    Transfer,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Deposit => "DEPOSIT",
            TransactionType::Withdraw => "WITHDRAW",
            TransactionType::Transfer => "TRANSFER",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "DEPOSIT" => Some(TransactionType::Deposit),
            "WITHDRAW" => Some(TransactionType::Withdraw),
            "TRANSFER" => Some(TransactionType::Transfer),
            _ => None,
        }
    }
}

impl std::fmt::Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TransactionStatus {
    Success,
    Failed,
}

impl TransactionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::Success => "SUCCESS",
            TransactionStatus::Failed => "FAILED",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "SUCCESS" => Some(TransactionStatus::Success),
            "FAILED" => Some(TransactionStatus::Failed),
            _ => None,
        }
    }
}

impl std::fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Immutable audit entry describing one completed ledger operation.
/// Account numbers are plain strings, not live references.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRecord {
    pub transaction_id: String,
    /// None for deposits
    pub from_account: Option<String>,
    /// None for withdrawals
    pub to_account: Option<String>,
    pub amount: Amount,
    pub currency: String,
    #[serde(rename = "type")]
    pub kind: TransactionType,
    pub status: TransactionStatus,
    pub timestamp: DateTime<Utc>,
    pub description: String,
}

impl TransactionRecord {
    fn new(
        from_account: Option<String>,
        to_account: Option<String>,
        amount: Amount,
        currency: &str,
        kind: TransactionType,
        description: String,
    ) -> Self {
        Self {
            transaction_id: reference_code(TRANSACTION_ID_PREFIX),
            from_account,
            to_account,
            amount,
            currency: currency.to_string(),
            kind,
            status: TransactionStatus::Success,
            timestamp: Utc::now(),
            description,
        }
    }

    pub fn deposit(account_number: &str, amount: Amount, currency: &str) -> Self {
        Self::new(
            None,
            Some(account_number.to_string()),
            amount,
            currency,
            TransactionType::Deposit,
            format!("Deposit to account: {}", account_number),
        )
    }

    pub fn withdrawal(account_number: &str, amount: Amount, currency: &str) -> Self {
        Self::new(
            Some(account_number.to_string()),
            None,
            amount,
            currency,
            TransactionType::Withdraw,
            format!("Withdrawal from account: {}", account_number),
        )
    }

    pub fn transfer(from: &str, to: &str, amount: Amount, currency: &str) -> Self {
        Self::new(
            Some(from.to_string()),
            Some(to.to_string()),
            amount,
            currency,
            TransactionType::Transfer,
            format!("Transfer from {} to {}", from, to),
        )
    }

    /// True if the account is the source or the destination.
    pub fn involves(&self, account_number: &str) -> bool {
        self.from_account.as_deref() == Some(account_number)
            || self.to_account.as_deref() == Some(account_number)
    }
}
