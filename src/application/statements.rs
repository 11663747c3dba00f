use chrono::NaiveDate;
use tracing::info;

use crate::io::DocumentRenderer;

use super::{AccountService, AppError, TransactionLogger};

/// A rendered document ready to be written to disk or sent as an attachment.
#[derive(Debug, Clone)]
pub struct Document {
    pub file_name: String,
    pub content_type: &'static str,
    pub bytes: Vec<u8>,
}

/// Assembles account statements and transaction receipts.
#[derive(Clone)]
pub struct StatementService {
    accounts: AccountService,
    logger: TransactionLogger,
}

impl StatementService {
    pub fn new(accounts: AccountService, logger: TransactionLogger) -> Self {
        Self { accounts, logger }
    }

    /// Statement for one account over an inclusive `YYYY-MM-DD` date range.
    pub async fn statement(
        &self,
        account_number: &str,
        period_start: &str,
        period_end: &str,
        renderer: &dyn DocumentRenderer,
    ) -> Result<Document, AppError> {
        let start = parse_date(period_start)?;
        let end = parse_date(period_end)?;
        if start > end {
            return Err(AppError::InvalidInput(format!(
                "period start {} is after period end {}",
                start, end
            )));
        }

        let account = self.accounts.require_account(account_number).await?;
        let records = self
            .logger
            .for_account_in_period(account_number, start, end)
            .await?;
        let bytes = renderer.account_statement(&account, &records, start, end)?;

        info!(
            account_number,
            rows = records.len(),
            format = renderer.file_extension(),
            "statement generated"
        );
        Ok(Document {
            file_name: format!(
                "statement_{}_{}_{}.{}",
                account_number,
                start,
                end,
                renderer.file_extension()
            ),
            content_type: renderer.content_type(),
            bytes,
        })
    }

    pub async fn receipt(
        &self,
        transaction_id: &str,
        renderer: &dyn DocumentRenderer,
    ) -> Result<Document, AppError> {
        let record = self
            .logger
            .by_id(transaction_id)
            .await?
            .ok_or_else(|| AppError::TransactionNotFound(transaction_id.to_string()))?;
        let bytes = renderer.transaction_receipt(&record)?;

        Ok(Document {
            file_name: format!("receipt_{}.{}", transaction_id, renderer.file_extension()),
            content_type: renderer.content_type(),
            bytes,
        })
    }
}

/// Parse a calendar date in `YYYY-MM-DD` form.
pub fn parse_date(input: &str) -> Result<NaiveDate, AppError> {
    NaiveDate::parse_from_str(input.trim(), "%Y-%m-%d")
        .map_err(|_| AppError::InvalidInput(format!("invalid date '{}', expected YYYY-MM-DD", input)))
}
