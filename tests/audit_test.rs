mod common;

use anyhow::Result;
use bankline::application::AuditEntry;
use common::{Customers, bank_with_broken_log};
use rust_decimal_macros::dec;

#[tokio::test]
async fn test_log_failure_keeps_deposit_and_reports_missing_record() -> Result<()> {
    let (bank, _temp) = bank_with_broken_log().await?;
    let (_, account) = Customers::open(&bank, "alice", "USD").await?;

    let posted = bank
        .accounts
        .deposit(&account.account_number, dec!(250))
        .await?;

    match &posted.audit {
        AuditEntry::Missing { reason } => assert!(reason.contains("read-only"), "{reason}"),
        AuditEntry::Recorded(_) => panic!("broken log cannot record"),
    }
    assert!(!posted.audit.is_recorded());

    // No rollback: the balance change is committed.
    assert_eq!(posted.value.balance, dec!(250));
    assert_eq!(
        bank.accounts.get_balance(&account.account_number).await?,
        dec!(250)
    );

    Ok(())
}

#[tokio::test]
async fn test_log_failure_keeps_transfer() -> Result<()> {
    let (bank, _temp) = bank_with_broken_log().await?;
    let (_, alice) = Customers::funded(&bank, "alice", "USD", dec!(100)).await?;
    let (_, bob) = Customers::open(&bank, "bob", "USD").await?;

    let posted = bank
        .accounts
        .transfer(&alice.account_number, &bob.account_number, dec!(40))
        .await?;

    assert!(matches!(posted.audit, AuditEntry::Missing { .. }));
    assert_eq!(
        bank.accounts.get_balance(&alice.account_number).await?,
        dec!(60)
    );
    assert_eq!(
        bank.accounts.get_balance(&bob.account_number).await?,
        dec!(40)
    );

    let json = serde_json::to_value(&posted)?;
    assert_eq!(json["audit"]["status"], "missing");
    assert_eq!(json["fromAccount"]["balance"], "60");

    Ok(())
}
