//! Persistence gateways.
//!
//! Two independent stores back the bank: a relational one for users and
//! accounts (unique keys, account -> owner foreign key) and a document one for
//! transaction records (no foreign keys, queried by field).

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::{
    Account, AccountDraft, AccountId, Amount, TransactionRecord, TransactionStatus,
    TransactionType, User, UserDraft, UserId,
};

#[derive(Debug, Error)]
pub enum StoreError {
    /// A unique constraint rejected the write. Carries the store's message,
    /// which names the offending column.
    #[error("Duplicate value: {0}")]
    Duplicate(String),

    /// A foreign key or check constraint rejected the write.
    #[error("Constraint violation: {0}")]
    Constraint(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// A conditional balance write: applied only if the stored balance still equals `expected`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BalanceUpdate {
    pub account_id: AccountId,
    pub expected: Amount,
    pub new_balance: Amount,
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn insert_user(&self, draft: &UserDraft) -> StoreResult<User>;

    /// Overwrite every mutable column of an existing user.
    async fn update_user(&self, user: &User) -> StoreResult<()>;

    async fn find_user_by_id(&self, id: UserId) -> StoreResult<Option<User>>;

    async fn find_user_by_username(&self, username: &str) -> StoreResult<Option<User>>;

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;

    async fn username_exists(&self, username: &str) -> StoreResult<bool>;

    async fn email_exists(&self, email: &str) -> StoreResult<bool>;

    async fn list_users(&self) -> StoreResult<Vec<User>>;

    async fn count_users(&self) -> StoreResult<i64>;

    /// Returns false if no such user existed.
    async fn delete_user(&self, id: UserId) -> StoreResult<bool>;
}

#[async_trait]
pub trait AccountStore: Send + Sync {
    async fn insert_account(&self, draft: &AccountDraft) -> StoreResult<Account>;

    async fn find_account_by_id(&self, id: AccountId) -> StoreResult<Option<Account>>;

    async fn find_account_by_number(&self, account_number: &str) -> StoreResult<Option<Account>>;

    async fn account_number_exists(&self, account_number: &str) -> StoreResult<bool>;

    async fn find_accounts_by_user(&self, user_id: UserId) -> StoreResult<Vec<Account>>;

    async fn list_accounts(&self) -> StoreResult<Vec<Account>>;

    async fn count_accounts(&self) -> StoreResult<i64>;

    /// Returns false if no such account existed.
    async fn delete_account(&self, id: AccountId) -> StoreResult<bool>;

    /// Balance-only fast path. Returns false when the stored balance no longer
    /// matches `update.expected` (another writer got there first).
    async fn update_balance(&self, update: BalanceUpdate) -> StoreResult<bool>;

    /// Apply both sides of a transfer in one storage transaction.
    /// Returns false, with nothing written, if either side lost a race.
    async fn transfer_balances(&self, debit: BalanceUpdate, credit: BalanceUpdate)
    -> StoreResult<bool>;
}

/// Append-only document store for transaction records. No update or delete.
///
/// Queries make no complexity promise; the JSON lines implementation scans
/// the whole log on every call.
#[async_trait]
pub trait TransactionStore: Send + Sync {
    async fn append(&self, record: &TransactionRecord) -> StoreResult<()>;

    async fn find_by_id(&self, transaction_id: &str) -> StoreResult<Option<TransactionRecord>>;

    /// Records where the account is the source or the destination.
    async fn find_by_account(&self, account_number: &str) -> StoreResult<Vec<TransactionRecord>>;

    async fn find_by_type(&self, kind: TransactionType) -> StoreResult<Vec<TransactionRecord>>;

    async fn find_by_status(
        &self,
        status: TransactionStatus,
    ) -> StoreResult<Vec<TransactionRecord>>;

    async fn find_all(&self) -> StoreResult<Vec<TransactionRecord>>;
}
