mod common;

use anyhow::Result;
use bankline::application::AppError;
use bankline::io::{CsvRenderer, TextRenderer};
use chrono::{Duration, Utc};
use common::{Customers, test_bank};
use rust_decimal_macros::dec;

fn today() -> String {
    Utc::now().date_naive().format("%Y-%m-%d").to_string()
}

#[tokio::test]
async fn test_text_statement_for_current_period() -> Result<()> {
    let (bank, _temp) = test_bank().await?;
    let (_, alice) = Customers::funded(&bank, "alice_smith", "USD", dec!(1000)).await?;
    let (_, bob) = Customers::open(&bank, "bob", "USD").await?;
    bank.accounts
        .transfer(&alice.account_number, &bob.account_number, dec!(250.5))
        .await?;

    let start = (Utc::now().date_naive() - Duration::days(1)).to_string();
    let document = bank
        .statements
        .statement(&alice.account_number, &start, &today(), &TextRenderer)
        .await?;
    let text = String::from_utf8(document.bytes)?;

    assert!(text.contains(&alice.account_number));
    assert!(text.contains("alice smith"));
    assert!(text.contains("USD 749.50"));
    assert!(text.contains("DEPOSIT"));
    assert!(text.contains("TRANSFER"));
    assert!(text.contains(&bob.account_number));
    assert_eq!(document.content_type, "text/plain; charset=utf-8");
    assert!(document.file_name.starts_with(&format!("statement_{}", alice.account_number)));
    assert!(document.file_name.ends_with(".txt"));

    Ok(())
}

#[tokio::test]
async fn test_statement_excludes_out_of_period_rows() -> Result<()> {
    let (bank, _temp) = test_bank().await?;
    let (_, alice) = Customers::funded(&bank, "alice", "USD", dec!(10)).await?;

    let document = bank
        .statements
        .statement(&alice.account_number, "2020-01-01", "2020-12-31", &TextRenderer)
        .await?;
    let text = String::from_utf8(document.bytes)?;
    assert!(text.contains("No transactions during this period."));
    assert!(text.contains("USD 10.00"));

    let csv = bank
        .statements
        .statement(&alice.account_number, "2020-01-01", "2020-12-31", &CsvRenderer)
        .await?;
    // Header only.
    assert_eq!(String::from_utf8(csv.bytes)?.lines().count(), 1);

    Ok(())
}

#[tokio::test]
async fn test_statement_rejections() -> Result<()> {
    let (bank, _temp) = test_bank().await?;
    let (_, alice) = Customers::open(&bank, "alice", "USD").await?;

    let err = bank
        .statements
        .statement("ACC00000000", "2024-01-01", "2024-01-31", &TextRenderer)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::AccountNotFound(_)));

    let err = bank
        .statements
        .statement(&alice.account_number, "2024-13-01", "2024-01-31", &TextRenderer)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidInput(_)));

    let err = bank
        .statements
        .statement(&alice.account_number, "2024-02-01", "2024-01-31", &TextRenderer)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidInput(_)));

    Ok(())
}

#[tokio::test]
async fn test_receipts() -> Result<()> {
    let (bank, _temp) = test_bank().await?;
    let (_, alice) = Customers::open(&bank, "alice", "EUR").await?;
    let posted = bank
        .accounts
        .deposit(&alice.account_number, dec!(42))
        .await?;
    let transaction_id = posted.audit.record().unwrap().transaction_id.clone();

    let receipt = bank.statements.receipt(&transaction_id, &TextRenderer).await?;
    let text = String::from_utf8(receipt.bytes)?;
    assert!(text.contains(&transaction_id));
    assert!(text.contains("EUR 42.00"));
    assert!(text.contains("SUCCESS"));
    assert_eq!(receipt.file_name, format!("receipt_{}.txt", transaction_id));

    let csv = bank.statements.receipt(&transaction_id, &CsvRenderer).await?;
    assert_eq!(String::from_utf8(csv.bytes)?.lines().count(), 2);

    let err = bank
        .statements
        .receipt("TXN00000000", &TextRenderer)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::TransactionNotFound(_)));

    Ok(())
}
