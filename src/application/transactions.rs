use chrono::NaiveDate;
use std::sync::Arc;
use tracing::debug;

use crate::domain::{TransactionRecord, TransactionStatus, TransactionType};
use crate::storage::TransactionStore;

use super::AppError;

/// Append-only audit log of ledger operations.
#[derive(Clone)]
pub struct TransactionLogger {
    store: Arc<dyn TransactionStore>,
}

impl TransactionLogger {
    pub fn new(store: Arc<dyn TransactionStore>) -> Self {
        Self { store }
    }

    pub async fn record(&self, record: &TransactionRecord) -> Result<(), AppError> {
        self.store.append(record).await?;
        debug!(
            transaction_id = %record.transaction_id,
            kind = %record.kind,
            "transaction recorded"
        );
        Ok(())
    }

    pub async fn by_id(&self, transaction_id: &str) -> Result<Option<TransactionRecord>, AppError> {
        Ok(self.store.find_by_id(transaction_id).await?)
    }

    /// Records where the account is the source or the destination, in log order.
    pub async fn by_account(&self, account_number: &str) -> Result<Vec<TransactionRecord>, AppError> {
        Ok(self.store.find_by_account(account_number).await?)
    }

    pub async fn by_type(&self, kind: TransactionType) -> Result<Vec<TransactionRecord>, AppError> {
        Ok(self.store.find_by_type(kind).await?)
    }

    pub async fn by_status(
        &self,
        status: TransactionStatus,
    ) -> Result<Vec<TransactionRecord>, AppError> {
        Ok(self.store.find_by_status(status).await?)
    }

    pub async fn all(&self) -> Result<Vec<TransactionRecord>, AppError> {
        Ok(self.store.find_all().await?)
    }

    /// Records touching the account whose UTC date falls within `start..=end`,
    /// oldest first.
    pub async fn for_account_in_period(
        &self,
        account_number: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<TransactionRecord>, AppError> {
        let mut records: Vec<_> = self
            .store
            .find_by_account(account_number)
            .await?
            .into_iter()
            .filter(|r| {
                let day = r.timestamp.date_naive();
                day >= start && day <= end
            })
            .collect();
        records.sort_by_key(|r| r.timestamp);
        Ok(records)
    }
}
