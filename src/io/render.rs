use anyhow::Result;
use chrono::{NaiveDate, Utc};
use std::fmt::Write as _;

use crate::domain::{Account, TransactionRecord, format_amount, format_money};

const RULE_WIDTH: usize = 96;

/// Turns ledger data into a downloadable document.
pub trait DocumentRenderer: Send + Sync {
    fn content_type(&self) -> &'static str;

    fn file_extension(&self) -> &'static str;

    fn account_statement(
        &self,
        account: &Account,
        records: &[TransactionRecord],
        period_start: NaiveDate,
        period_end: NaiveDate,
    ) -> Result<Vec<u8>>;

    fn transaction_receipt(&self, record: &TransactionRecord) -> Result<Vec<u8>>;
}

/// Output formats selectable from the CLI and the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Text,
    Csv,
}

impl DocumentFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentFormat::Text => "text",
            DocumentFormat::Csv => "csv",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "text" | "txt" => Some(DocumentFormat::Text),
            "csv" => Some(DocumentFormat::Csv),
            _ => None,
        }
    }

    pub fn renderer(&self) -> Box<dyn DocumentRenderer> {
        match self {
            DocumentFormat::Text => Box::new(TextRenderer),
            DocumentFormat::Csv => Box::new(CsvRenderer),
        }
    }
}

impl std::fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

fn or_dash(account: &Option<String>) -> &str {
    account.as_deref().unwrap_or("-")
}

/// Printable plain-text statements and receipts.
pub struct TextRenderer;

impl DocumentRenderer for TextRenderer {
    fn content_type(&self) -> &'static str {
        "text/plain; charset=utf-8"
    }

    fn file_extension(&self) -> &'static str {
        "txt"
    }

    fn account_statement(
        &self,
        account: &Account,
        records: &[TransactionRecord],
        period_start: NaiveDate,
        period_end: NaiveDate,
    ) -> Result<Vec<u8>> {
        let mut out = String::new();
        let rule = "=".repeat(RULE_WIDTH);

        writeln!(out, "{}", rule)?;
        writeln!(out, "{:^width$}", "BANK ACCOUNT STATEMENT", width = RULE_WIDTH)?;
        writeln!(out, "{}", rule)?;
        writeln!(out)?;
        writeln!(out, "Account Number:   {}", account.account_number)?;
        writeln!(out, "Account Holder:   {}", account.owner.full_name)?;
        writeln!(
            out,
            "Statement Period: {} to {}",
            period_start.format("%Y-%m-%d"),
            period_end.format("%Y-%m-%d")
        )?;
        writeln!(out, "Current Balance:  {}", account.formatted_balance())?;
        writeln!(out)?;

        if records.is_empty() {
            writeln!(out, "No transactions during this period.")?;
        } else {
            writeln!(
                out,
                "{:<17} {:<9} {:<12} {:<12} {:>14}  {}",
                "Date", "Type", "From Account", "To Account", "Amount", "Description"
            )?;
            writeln!(out, "{}", "-".repeat(RULE_WIDTH))?;
            for record in records {
                writeln!(
                    out,
                    "{:<17} {:<9} {:<12} {:<12} {:>14}  {}",
                    record.timestamp.format("%Y-%m-%d %H:%M"),
                    record.kind.as_str(),
                    or_dash(&record.from_account),
                    or_dash(&record.to_account),
                    format_money(&record.currency, record.amount),
                    record.description
                )?;
            }
        }

        writeln!(out)?;
        writeln!(out, "Generated on: {}", Utc::now().format("%Y-%m-%d %H:%M:%S UTC"))?;
        Ok(out.into_bytes())
    }

    fn transaction_receipt(&self, record: &TransactionRecord) -> Result<Vec<u8>> {
        let mut out = String::new();
        let rule = "=".repeat(48);

        writeln!(out, "{}", rule)?;
        writeln!(out, "{:^48}", "TRANSACTION RECEIPT")?;
        writeln!(out, "{}", rule)?;
        writeln!(out)?;
        writeln!(out, "Transaction ID: {}", record.transaction_id)?;
        writeln!(out, "Date:           {}", record.timestamp.format("%Y-%m-%d"))?;
        writeln!(out, "Time:           {}", record.timestamp.format("%H:%M:%S"))?;
        writeln!(out, "Type:           {}", record.kind)?;
        writeln!(
            out,
            "Amount:         {}",
            format_money(&record.currency, record.amount)
        )?;
        writeln!(out, "From:           {}", or_dash(&record.from_account))?;
        writeln!(out, "To:             {}", or_dash(&record.to_account))?;
        writeln!(out, "Status:         {}", record.status)?;
        writeln!(out, "Description:    {}", record.description)?;
        writeln!(out)?;
        writeln!(out, "Thank you for banking with us!")?;
        Ok(out.into_bytes())
    }
}

/// Statement rows and receipts as CSV.
pub struct CsvRenderer;

const CSV_HEADER: [&str; 8] = [
    "transaction_id",
    "timestamp",
    "type",
    "from_account",
    "to_account",
    "amount",
    "currency",
    "description",
];

fn csv_row(record: &TransactionRecord) -> [String; 8] {
    [
        record.transaction_id.clone(),
        record.timestamp.to_rfc3339(),
        record.kind.as_str().to_string(),
        record.from_account.clone().unwrap_or_default(),
        record.to_account.clone().unwrap_or_default(),
        format_amount(record.amount),
        record.currency.clone(),
        record.description.clone(),
    ]
}

impl DocumentRenderer for CsvRenderer {
    fn content_type(&self) -> &'static str {
        "text/csv; charset=utf-8"
    }

    fn file_extension(&self) -> &'static str {
        "csv"
    }

    /// Only the transaction rows; account details go in the file name.
    fn account_statement(
        &self,
        _account: &Account,
        records: &[TransactionRecord],
        _period_start: NaiveDate,
        _period_end: NaiveDate,
    ) -> Result<Vec<u8>> {
        let mut csv_writer = csv::Writer::from_writer(Vec::new());
        csv_writer.write_record(CSV_HEADER)?;
        for record in records {
            csv_writer.write_record(csv_row(record))?;
        }
        Ok(csv_writer.into_inner()?)
    }

    fn transaction_receipt(&self, record: &TransactionRecord) -> Result<Vec<u8>> {
        let mut csv_writer = csv::Writer::from_writer(Vec::new());
        csv_writer.write_record(CSV_HEADER.iter().copied().chain(["status"]))?;
        csv_writer.write_record(
            csv_row(record)
                .into_iter()
                .chain([record.status.as_str().to_string()]),
        )?;
        Ok(csv_writer.into_inner()?)
    }
}
