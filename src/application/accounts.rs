use rust_decimal::Decimal;
use serde::Serialize;
use serde::ser::{SerializeStruct, Serializer};
use std::sync::Arc;
use tracing::{error, info};

use crate::domain::{
    Account, AccountDraft, AccountId, Amount, TransactionRecord, UserId, generate_account_number,
    normalize_currency,
};
use crate::storage::{AccountStore, BalanceUpdate, StoreError, UserStore};

use super::{AppError, TransactionLogger};

const ACCOUNT_NUMBER_ATTEMPTS: usize = 16;

/// Outcome of writing the audit record for a committed ledger change.
#[derive(Debug, Clone, PartialEq)]
pub enum AuditEntry {
    Recorded(TransactionRecord),
    /// The balance change stands; only the record is missing.
    Missing { reason: String },
}

impl AuditEntry {
    pub fn is_recorded(&self) -> bool {
        matches!(self, AuditEntry::Recorded(_))
    }

    pub fn record(&self) -> Option<&TransactionRecord> {
        match self {
            AuditEntry::Recorded(record) => Some(record),
            AuditEntry::Missing { .. } => None,
        }
    }
}

impl Serialize for AuditEntry {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("AuditEntry", 2)?;
        match self {
            AuditEntry::Recorded(record) => {
                s.serialize_field("status", "recorded")?;
                s.serialize_field("transactionId", &record.transaction_id)?;
            }
            AuditEntry::Missing { reason } => {
                s.serialize_field("status", "missing")?;
                s.serialize_field("reason", reason)?;
            }
        }
        s.end()
    }
}

/// A committed ledger change together with its audit outcome.
#[derive(Debug, Clone, Serialize)]
pub struct Posted<T> {
    #[serde(flatten)]
    pub value: T,
    pub audit: AuditEntry,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferResult {
    pub from_account: Account,
    pub to_account: Account,
    pub amount: Amount,
    pub currency: String,
}

/// Account ledger: opening accounts and moving money.
///
/// Every successful mutation is followed by exactly one call to the
/// transaction logger. Balance writes are conditional on the balance that was
/// read, so a concurrent writer causes a conflict instead of a lost update.
#[derive(Clone)]
pub struct AccountService {
    users: Arc<dyn UserStore>,
    accounts: Arc<dyn AccountStore>,
    logger: TransactionLogger,
}

impl AccountService {
    pub fn new(
        users: Arc<dyn UserStore>,
        accounts: Arc<dyn AccountStore>,
        logger: TransactionLogger,
    ) -> Self {
        Self {
            users,
            accounts,
            logger,
        }
    }

    // ========================
    // Account lifecycle
    // ========================

    /// Open a zero-balance account for a user that has none yet.
    pub async fn create_account(&self, user_id: UserId, currency: &str) -> Result<Account, AppError> {
        let currency =
            normalize_currency(currency).map_err(|e| AppError::InvalidCurrency(e.0))?;

        if self.users.find_user_by_id(user_id).await?.is_none() {
            return Err(AppError::user_id_not_found(user_id));
        }
        if !self.accounts.find_accounts_by_user(user_id).await?.is_empty() {
            return Err(AppError::AccountAlreadyExists(user_id));
        }

        let account_number = self.fresh_account_number().await?;
        let account = self
            .insert(AccountDraft::new(account_number, user_id, currency))
            .await?;

        info!(
            account_number = %account.account_number,
            user_id,
            currency = %account.currency,
            "account created"
        );
        Ok(account)
    }

    /// Insert a pre-numbered account with an opening balance (demo data).
    pub(crate) async fn open_seeded_account(
        &self,
        user_id: UserId,
        account_number: &str,
        currency: &str,
        balance: Amount,
    ) -> Result<Account, AppError> {
        let currency =
            normalize_currency(currency).map_err(|e| AppError::InvalidCurrency(e.0))?;
        let draft = AccountDraft::new(account_number.to_string(), user_id, currency)
            .with_balance(balance);
        self.insert(draft).await
    }

    async fn insert(&self, draft: AccountDraft) -> Result<Account, AppError> {
        match self.accounts.insert_account(&draft).await {
            Ok(account) => Ok(account),
            Err(StoreError::Duplicate(msg)) if msg.contains("user_id") => {
                Err(AppError::AccountAlreadyExists(draft.user_id))
            }
            Err(StoreError::Constraint(_)) => Err(AppError::user_id_not_found(draft.user_id)),
            Err(e) => Err(e.into()),
        }
    }

    async fn fresh_account_number(&self) -> Result<String, AppError> {
        for _ in 0..ACCOUNT_NUMBER_ATTEMPTS {
            let candidate = generate_account_number();
            if !self.accounts.account_number_exists(&candidate).await? {
                return Ok(candidate);
            }
        }
        Err(anyhow::anyhow!("Could not generate a unique account number").into())
    }

    pub async fn delete_account(&self, id: AccountId) -> Result<(), AppError> {
        if !self.accounts.delete_account(id).await? {
            return Err(AppError::account_id_not_found(id));
        }
        info!(account_id = id, "account deleted");
        Ok(())
    }

    // ========================
    // Lookups
    // ========================

    pub async fn list_accounts(&self) -> Result<Vec<Account>, AppError> {
        Ok(self.accounts.list_accounts().await?)
    }

    pub async fn count_accounts(&self) -> Result<i64, AppError> {
        Ok(self.accounts.count_accounts().await?)
    }

    pub async fn get_account_by_id(&self, id: AccountId) -> Result<Option<Account>, AppError> {
        Ok(self.accounts.find_account_by_id(id).await?)
    }

    pub async fn get_account_by_number(
        &self,
        account_number: &str,
    ) -> Result<Option<Account>, AppError> {
        Ok(self.accounts.find_account_by_number(account_number).await?)
    }

    pub async fn get_user_accounts(&self, user_id: UserId) -> Result<Vec<Account>, AppError> {
        Ok(self.accounts.find_accounts_by_user(user_id).await?)
    }

    /// Resolve an account or fail with `AccountNotFound`.
    pub async fn require_account(&self, account_number: &str) -> Result<Account, AppError> {
        self.accounts
            .find_account_by_number(account_number)
            .await?
            .ok_or_else(|| AppError::AccountNotFound(account_number.to_string()))
    }

    pub async fn get_balance(&self, account_number: &str) -> Result<Amount, AppError> {
        Ok(self.require_account(account_number).await?.balance)
    }

    pub async fn has_sufficient_balance(
        &self,
        account_number: &str,
        amount: Amount,
    ) -> Result<bool, AppError> {
        Ok(self
            .require_account(account_number)
            .await?
            .has_sufficient_balance(amount))
    }

    // ========================
    // Money movement
    // ========================

    pub async fn deposit(
        &self,
        account_number: &str,
        amount: Amount,
    ) -> Result<Posted<Account>, AppError> {
        ensure_positive(amount)?;
        let mut account = self.require_account(account_number).await?;
        ensure_owner_active(&account)?;

        let expected = account.balance;
        account
            .deposit(amount)
            .map_err(|e| AppError::from_balance(account_number, e))?;
        self.write_balance(&account, expected).await?;

        info!(
            account_number = %account.account_number,
            amount = %amount,
            balance = %account.balance,
            "deposit posted"
        );
        let record =
            TransactionRecord::deposit(&account.account_number, amount, &account.currency);
        Ok(self.post(account, record).await)
    }

    pub async fn withdraw(
        &self,
        account_number: &str,
        amount: Amount,
    ) -> Result<Posted<Account>, AppError> {
        ensure_positive(amount)?;
        let mut account = self.require_account(account_number).await?;
        ensure_owner_active(&account)?;

        let expected = account.balance;
        account
            .withdraw(amount)
            .map_err(|e| AppError::from_balance(account_number, e))?;
        self.write_balance(&account, expected).await?;

        info!(
            account_number = %account.account_number,
            amount = %amount,
            balance = %account.balance,
            "withdrawal posted"
        );
        let record =
            TransactionRecord::withdrawal(&account.account_number, amount, &account.currency);
        Ok(self.post(account, record).await)
    }

    /// Move money between two accounts of the same currency. Both balance
    /// writes happen in one storage transaction.
    pub async fn transfer(
        &self,
        from_number: &str,
        to_number: &str,
        amount: Amount,
    ) -> Result<Posted<TransferResult>, AppError> {
        ensure_positive(amount)?;
        let mut from = self.require_account(from_number).await?;
        let mut to = self.require_account(to_number).await?;
        ensure_owner_active(&from)?;

        if from.currency != to.currency {
            return Err(AppError::CurrencyMismatch {
                from_currency: from.currency,
                to_currency: to.currency,
            });
        }
        if !from.has_sufficient_balance(amount) {
            return Err(AppError::InsufficientFunds {
                account_number: from.account_number,
                balance: from.balance,
                required: amount,
            });
        }
        if from.id == to.id {
            return Err(AppError::InvalidInput(
                "cannot transfer to the same account".into(),
            ));
        }

        let debit_expected = from.balance;
        let credit_expected = to.balance;
        from.withdraw(amount)
            .map_err(|e| AppError::from_balance(from_number, e))?;
        to.deposit(amount)
            .map_err(|e| AppError::from_balance(to_number, e))?;

        let applied = self
            .accounts
            .transfer_balances(
                BalanceUpdate {
                    account_id: from.id,
                    expected: debit_expected,
                    new_balance: from.balance,
                },
                BalanceUpdate {
                    account_id: to.id,
                    expected: credit_expected,
                    new_balance: to.balance,
                },
            )
            .await?;
        if !applied {
            return Err(AppError::ConcurrentModification(from.account_number));
        }

        info!(
            from = %from.account_number,
            to = %to.account_number,
            amount = %amount,
            "transfer posted"
        );
        let record = TransactionRecord::transfer(
            &from.account_number,
            &to.account_number,
            amount,
            &from.currency,
        );
        let currency = from.currency.clone();
        let result = TransferResult {
            from_account: from,
            to_account: to,
            amount,
            currency,
        };
        Ok(self.post(result, record).await)
    }

    async fn write_balance(&self, account: &Account, expected: Amount) -> Result<(), AppError> {
        let applied = self
            .accounts
            .update_balance(BalanceUpdate {
                account_id: account.id,
                expected,
                new_balance: account.balance,
            })
            .await?;
        if !applied {
            return Err(AppError::ConcurrentModification(
                account.account_number.clone(),
            ));
        }
        Ok(())
    }

    /// Write the audit record for an already committed change. A failure here
    /// does not undo the change; it is reported in the result and logged.
    async fn post<T>(&self, value: T, record: TransactionRecord) -> Posted<T> {
        let audit = match self.logger.record(&record).await {
            Ok(()) => AuditEntry::Recorded(record),
            Err(e) => {
                error!(
                    target: "bankline::audit",
                    transaction_id = %record.transaction_id,
                    kind = %record.kind,
                    amount = %record.amount,
                    error = %e,
                    "ledger change committed without a transaction record"
                );
                AuditEntry::Missing {
                    reason: e.to_string(),
                }
            }
        };
        Posted { value, audit }
    }
}

fn ensure_positive(amount: Amount) -> Result<(), AppError> {
    if amount <= Decimal::ZERO {
        return Err(AppError::InvalidAmount(format!(
            "amount must be positive, got {}",
            amount
        )));
    }
    Ok(())
}

fn ensure_owner_active(account: &Account) -> Result<(), AppError> {
    if account.is_owner_blocked() {
        return Err(AppError::UserBlocked(account.owner.username.clone()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn test_audit_entry_json() {
        let record = TransactionRecord::deposit("ACC1", dec!(5), "USD");
        let recorded = serde_json::to_value(AuditEntry::Recorded(record.clone())).unwrap();
        assert_eq!(recorded["status"], "recorded");
        assert_eq!(recorded["transactionId"], record.transaction_id.as_str());

        let missing = serde_json::to_value(AuditEntry::Missing {
            reason: "disk full".into(),
        })
        .unwrap();
        assert_eq!(missing["status"], "missing");
        assert_eq!(missing["reason"], "disk full");
    }

    #[test]
    fn test_ensure_positive() {
        assert!(ensure_positive(dec!(0.01)).is_ok());
        assert!(matches!(
            ensure_positive(Decimal::ZERO),
            Err(AppError::InvalidAmount(_))
        ));
        assert!(ensure_positive(dec!(-5)).is_err());
    }
}
