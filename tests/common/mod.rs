// Allow dead_code because these helpers are used across different test files
// which are compiled separately
#![allow(dead_code)]

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use bankline::application::Bank;
use bankline::domain::{
    Account, Amount, NewUser, TransactionRecord, TransactionStatus, TransactionType, User,
};
use bankline::storage::{SqliteStore, StoreResult, TransactionStore};
use std::sync::Arc;
use tempfile::TempDir;

/// Helper to create a bank backed by a temporary database and log directory
pub async fn test_bank() -> Result<(Bank, TempDir)> {
    let temp_dir = TempDir::new()?;
    let db_path = temp_dir.path().join("test.db");
    let bank = Bank::init(db_path.to_str().unwrap(), temp_dir.path().join("txlog")).await?;
    Ok((bank, temp_dir))
}

/// A bank whose transaction log rejects every write
pub async fn bank_with_broken_log() -> Result<(Bank, TempDir)> {
    let temp_dir = TempDir::new()?;
    let db_path = temp_dir.path().join("test.db");
    let relational = Arc::new(SqliteStore::open(db_path.to_str().unwrap()).await?);
    let bank = Bank::with_stores(
        relational.clone(),
        relational,
        Arc::new(BrokenTransactionStore),
    );
    Ok((bank, temp_dir))
}

pub struct BrokenTransactionStore;

#[async_trait]
impl TransactionStore for BrokenTransactionStore {
    async fn append(&self, _record: &TransactionRecord) -> StoreResult<()> {
        Err(anyhow!("transaction log is read-only").into())
    }

    async fn find_by_id(&self, _transaction_id: &str) -> StoreResult<Option<TransactionRecord>> {
        Ok(None)
    }

    async fn find_by_account(&self, _account_number: &str) -> StoreResult<Vec<TransactionRecord>> {
        Ok(Vec::new())
    }

    async fn find_by_type(&self, _kind: TransactionType) -> StoreResult<Vec<TransactionRecord>> {
        Ok(Vec::new())
    }

    async fn find_by_status(
        &self,
        _status: TransactionStatus,
    ) -> StoreResult<Vec<TransactionRecord>> {
        Ok(Vec::new())
    }

    async fn find_all(&self) -> StoreResult<Vec<TransactionRecord>> {
        Ok(Vec::new())
    }
}

/// Test fixture: customers with one account each
pub struct Customers;

impl Customers {
    /// Register `username` (email derived from it) and open an empty account
    pub async fn open(bank: &Bank, username: &str, currency: &str) -> Result<(User, Account)> {
        let user = bank
            .users
            .register_user(NewUser::new(
                username,
                format!("{}@email.com", username),
                "password123",
                username.replace('_', " "),
            ))
            .await?;
        let account = bank.accounts.create_account(user.id, currency).await?;
        Ok((user, account))
    }

    /// Register and open an account holding `amount`, funded by a deposit
    pub async fn funded(
        bank: &Bank,
        username: &str,
        currency: &str,
        amount: Amount,
    ) -> Result<(User, Account)> {
        let (user, account) = Self::open(bank, username, currency).await?;
        let posted = bank.accounts.deposit(&account.account_number, amount).await?;
        Ok((user, posted.value))
    }
}
