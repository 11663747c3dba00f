use anyhow::{Context, Result};
use async_trait::async_trait;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs::{File, OpenOptions};
use tokio::io::{AsyncWriteExt, BufWriter};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::domain::{TransactionRecord, TransactionStatus, TransactionType};

use super::{StoreResult, TransactionStore};

/// File holding the records inside the log directory.
pub const TXLOG_FILE_NAME: &str = "transactions.jsonl";

/// Append-only document store: one JSON object per line.
///
/// Appends are serialized behind an async mutex around the open file handle
/// and flushed before returning, so readers always see complete lines.
///
/// There is no index: every query reads and parses the whole file, so lookups
/// (including `find_by_id`) cost O(n) in the number of records.
pub struct JsonlTransactionStore {
    path: PathBuf,
    writer: Mutex<Option<BufWriter<File>>>,
}

impl JsonlTransactionStore {
    /// Open the store rooted at `dir`, creating the directory if missing.
    /// The log file itself is created on first append.
    pub fn open<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create transaction log dir {}", dir.display()))?;

        Ok(Self {
            path: dir.join(TXLOG_FILE_NAME),
            writer: Mutex::new(None),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn write_line(&self, line: &str) -> Result<()> {
        let mut guard = self.writer.lock().await;

        if guard.is_none() {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&self.path)
                .await
                .with_context(|| format!("Failed to open {}", self.path.display()))?;
            *guard = Some(BufWriter::new(file));
        }

        if let Some(writer) = guard.as_mut() {
            writer
                .write_all(format!("{}\n", line).as_bytes())
                .await
                .context("Failed to write transaction record")?;
            writer.flush().await.context("Failed to flush transaction log")?;
        }
        Ok(())
    }

    /// Read every record in file order, skipping lines that do not parse.
    async fn load(&self) -> Result<Vec<TransactionRecord>> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to read {}", self.path.display()));
            }
        };

        let mut records = Vec::new();
        for (index, line) in content.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<TransactionRecord>(line) {
                Ok(record) => records.push(record),
                Err(e) => warn!(line = index + 1, error = %e, "skipping malformed transaction record"),
            }
        }
        Ok(records)
    }

    async fn filter<F>(&self, predicate: F) -> StoreResult<Vec<TransactionRecord>>
    where
        F: Fn(&TransactionRecord) -> bool + Send,
    {
        let records = self.load().await?;
        Ok(records.into_iter().filter(|r| predicate(r)).collect())
    }
}

#[async_trait]
impl TransactionStore for JsonlTransactionStore {
    async fn append(&self, record: &TransactionRecord) -> StoreResult<()> {
        let line = serde_json::to_string(record).context("Failed to serialize transaction")?;
        self.write_line(&line).await?;
        debug!(transaction_id = %record.transaction_id, "transaction appended");
        Ok(())
    }

    async fn find_by_id(&self, transaction_id: &str) -> StoreResult<Option<TransactionRecord>> {
        let records = self.load().await?;
        Ok(records
            .into_iter()
            .find(|r| r.transaction_id == transaction_id))
    }

    async fn find_by_account(&self, account_number: &str) -> StoreResult<Vec<TransactionRecord>> {
        self.filter(|r| r.involves(account_number)).await
    }

    async fn find_by_type(&self, kind: TransactionType) -> StoreResult<Vec<TransactionRecord>> {
        self.filter(|r| r.kind == kind).await
    }

    async fn find_by_status(
        &self,
        status: TransactionStatus,
    ) -> StoreResult<Vec<TransactionRecord>> {
        self.filter(|r| r.status == status).await
    }

    async fn find_all(&self) -> StoreResult<Vec<TransactionRecord>> {
        Ok(self.load().await?)
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;
    use std::io::Write;
    use tempfile::TempDir;

    use super::*;

    #[tokio::test]
    async fn test_empty_store_reads_nothing() {
        let dir = TempDir::new().unwrap();
        let store = JsonlTransactionStore::open(dir.path().join("log")).unwrap();

        assert!(store.find_all().await.unwrap().is_empty());
        assert!(store.find_by_id("TXN00000000").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_append_and_query_by_field() {
        let dir = TempDir::new().unwrap();
        let store = JsonlTransactionStore::open(dir.path()).unwrap();

        let deposit = TransactionRecord::deposit("ACC1", dec!(100), "USD");
        let transfer = TransactionRecord::transfer("ACC1", "ACC2", dec!(40), "USD");
        let withdrawal = TransactionRecord::withdrawal("ACC3", dec!(5), "EUR");
        for record in [&deposit, &transfer, &withdrawal] {
            store.append(record).await.unwrap();
        }

        let acc1 = store.find_by_account("ACC1").await.unwrap();
        assert_eq!(acc1, vec![deposit.clone(), transfer.clone()]);
        assert_eq!(store.find_by_account("ACC2").await.unwrap(), vec![transfer.clone()]);

        let withdrawals = store.find_by_type(TransactionType::Withdraw).await.unwrap();
        assert_eq!(withdrawals, vec![withdrawal]);

        assert_eq!(
            store.find_by_status(TransactionStatus::Success).await.unwrap().len(),
            3
        );
        assert!(
            store
                .find_by_status(TransactionStatus::Failed)
                .await
                .unwrap()
                .is_empty()
        );

        let found = store.find_by_id(&transfer.transaction_id).await.unwrap();
        assert_eq!(found, Some(transfer));
    }

    #[tokio::test]
    async fn test_records_survive_reopen() {
        let dir = TempDir::new().unwrap();
        let record = TransactionRecord::deposit("ACC1", dec!(1.23), "USD");
        {
            let store = JsonlTransactionStore::open(dir.path()).unwrap();
            store.append(&record).await.unwrap();
        }

        let reopened = JsonlTransactionStore::open(dir.path()).unwrap();
        assert_eq!(reopened.find_all().await.unwrap(), vec![record]);
    }

    #[tokio::test]
    async fn test_malformed_lines_are_skipped() {
        let dir = TempDir::new().unwrap();
        let store = JsonlTransactionStore::open(dir.path()).unwrap();
        let record = TransactionRecord::deposit("ACC1", dec!(10), "USD");
        store.append(&record).await.unwrap();

        let mut file = std::fs::OpenOptions::new()
            .append(true)
            .open(store.path())
            .unwrap();
        writeln!(file, "{{not json").unwrap();

        assert_eq!(store.find_all().await.unwrap(), vec![record]);
    }
}
