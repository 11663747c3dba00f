use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::error::ErrorKind;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use std::str::FromStr;
use tracing::debug;

use crate::domain::{Account, AccountDraft, AccountId, Role, User, UserDraft, UserId};

use super::{
    AccountStore, BalanceUpdate, MIGRATION_001_INITIAL, StoreError, StoreResult, UserStore,
};

const USER_COLUMNS: &str =
    "id, username, email, password_hash, full_name, blocked, role, created_at";

const ACCOUNT_SELECT: &str = r#"
    SELECT a.id, a.account_number, a.balance, a.currency, a.created_at,
           u.id AS owner_id, u.username AS owner_username, u.email AS owner_email,
           u.password_hash AS owner_password_hash, u.full_name AS owner_full_name,
           u.blocked AS owner_blocked, u.role AS owner_role, u.created_at AS owner_created_at
    FROM accounts a
    JOIN users u ON u.id = a.user_id
"#;

const UPDATE_BALANCE: &str = "UPDATE accounts SET balance = ? WHERE id = ? AND balance = ?";

/// Relational gateway for users and accounts, backed by SQLite.
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Create a new store with the given SQLite connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Connect to a SQLite database URL, e.g. "sqlite:bank.db?mode=rwc".
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = SqlitePool::connect(database_url)
            .await
            .context("Failed to connect to database")?;
        Ok(Self::new(pool))
    }

    /// Run database migrations. Safe to run more than once.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::raw_sql(MIGRATION_001_INITIAL)
            .execute(&self.pool)
            .await
            .context("Failed to run migration 001")?;
        Ok(())
    }

    /// Initialize a database (connect + migrate).
    pub async fn init(database_url: &str) -> Result<Self> {
        let store = Self::connect(database_url).await?;
        store.migrate().await?;
        Ok(store)
    }

    /// Open (creating if needed) and migrate a database file.
    pub async fn open(database_path: &str) -> Result<Self> {
        Self::init(&format!("sqlite:{}?mode=rwc", database_path)).await
    }

    fn row_to_user(row: &SqliteRow) -> Result<User> {
        let role_str: String = row.get("role");
        let created_at_str: String = row.get("created_at");

        Ok(User {
            id: row.get("id"),
            username: row.get("username"),
            email: row.get("email"),
            password_hash: row.get("password_hash"),
            full_name: row.get("full_name"),
            blocked: row.get::<i32, _>("blocked") != 0,
            role: Role::from_str(&role_str)
                .ok_or_else(|| anyhow!("Invalid role: {}", role_str))?,
            created_at: parse_timestamp(&created_at_str).context("Invalid created_at")?,
        })
    }

    fn row_to_account(row: &SqliteRow) -> Result<Account> {
        let balance_str: String = row.get("balance");
        let created_at_str: String = row.get("created_at");
        let owner_role_str: String = row.get("owner_role");
        let owner_created_at_str: String = row.get("owner_created_at");

        let owner = User {
            id: row.get("owner_id"),
            username: row.get("owner_username"),
            email: row.get("owner_email"),
            password_hash: row.get("owner_password_hash"),
            full_name: row.get("owner_full_name"),
            blocked: row.get::<i32, _>("owner_blocked") != 0,
            role: Role::from_str(&owner_role_str)
                .ok_or_else(|| anyhow!("Invalid role: {}", owner_role_str))?,
            created_at: parse_timestamp(&owner_created_at_str)
                .context("Invalid owner created_at")?,
        };

        Ok(Account {
            id: row.get("id"),
            account_number: row.get("account_number"),
            balance: Decimal::from_str(&balance_str)
                .with_context(|| format!("Invalid balance: {}", balance_str))?,
            currency: row.get("currency"),
            owner,
            created_at: parse_timestamp(&created_at_str).context("Invalid created_at")?,
        })
    }

    async fn fetch_user(&self, filter: &str, value: &str) -> StoreResult<Option<User>> {
        let sql = format!("SELECT {} FROM users WHERE {} = ?", USER_COLUMNS, filter);
        let row = sqlx::query(&sql)
            .bind(value)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch user")?;

        match row {
            Some(row) => Ok(Some(Self::row_to_user(&row)?)),
            None => Ok(None),
        }
    }

    async fn exists(&self, sql: &str, value: &str) -> StoreResult<bool> {
        let row = sqlx::query(sql)
            .bind(value)
            .fetch_one(&self.pool)
            .await
            .context("Failed to check existence")?;
        Ok(row.get::<i64, _>("found") != 0)
    }
}

#[async_trait]
impl UserStore for SqliteStore {
    async fn insert_user(&self, draft: &UserDraft) -> StoreResult<User> {
        let result = sqlx::query(
            r#"
            INSERT INTO users (username, email, password_hash, full_name, blocked, role, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&draft.username)
        .bind(&draft.email)
        .bind(&draft.password_hash)
        .bind(&draft.full_name)
        .bind(draft.blocked)
        .bind(draft.role.as_str())
        .bind(draft.created_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| classify(e, "Failed to save user"))?;

        let id = result.last_insert_rowid();
        debug!(user_id = id, username = %draft.username, "user inserted");

        Ok(User {
            id,
            username: draft.username.clone(),
            email: draft.email.clone(),
            password_hash: draft.password_hash.clone(),
            full_name: draft.full_name.clone(),
            blocked: draft.blocked,
            role: draft.role,
            created_at: draft.created_at,
        })
    }

    async fn update_user(&self, user: &User) -> StoreResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET username = ?, email = ?, password_hash = ?, full_name = ?, blocked = ?, role = ?
            WHERE id = ?
            "#,
        )
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.full_name)
        .bind(user.blocked)
        .bind(user.role.as_str())
        .bind(user.id)
        .execute(&self.pool)
        .await
        .map_err(|e| classify(e, "Failed to update user"))?;

        if result.rows_affected() == 0 {
            return Err(anyhow!("User {} vanished during update", user.id).into());
        }
        Ok(())
    }

    async fn find_user_by_id(&self, id: UserId) -> StoreResult<Option<User>> {
        let sql = format!("SELECT {} FROM users WHERE id = ?", USER_COLUMNS);
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch user")?;

        match row {
            Some(row) => Ok(Some(Self::row_to_user(&row)?)),
            None => Ok(None),
        }
    }

    async fn find_user_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        self.fetch_user("username", username).await
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        self.fetch_user("email", email).await
    }

    async fn username_exists(&self, username: &str) -> StoreResult<bool> {
        self.exists(
            "SELECT EXISTS(SELECT 1 FROM users WHERE username = ?) AS found",
            username,
        )
        .await
    }

    async fn email_exists(&self, email: &str) -> StoreResult<bool> {
        self.exists(
            "SELECT EXISTS(SELECT 1 FROM users WHERE email = ?) AS found",
            email,
        )
        .await
    }

    async fn list_users(&self) -> StoreResult<Vec<User>> {
        let sql = format!("SELECT {} FROM users ORDER BY id", USER_COLUMNS);
        let rows = sqlx::query(&sql)
            .fetch_all(&self.pool)
            .await
            .context("Failed to list users")?;

        Ok(rows.iter().map(Self::row_to_user).collect::<Result<_>>()?)
    }

    async fn count_users(&self) -> StoreResult<i64> {
        let row = sqlx::query("SELECT COUNT(*) AS count FROM users")
            .fetch_one(&self.pool)
            .await
            .context("Failed to count users")?;
        Ok(row.get("count"))
    }

    async fn delete_user(&self, id: UserId) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| classify(e, "Failed to delete user"))?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl AccountStore for SqliteStore {
    async fn insert_account(&self, draft: &AccountDraft) -> StoreResult<Account> {
        let result = sqlx::query(
            r#"
            INSERT INTO accounts (account_number, user_id, balance, currency, created_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&draft.account_number)
        .bind(draft.user_id)
        .bind(draft.balance.to_string())
        .bind(&draft.currency)
        .bind(draft.created_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| classify(e, "Failed to save account"))?;

        let id = result.last_insert_rowid();
        debug!(account_id = id, account_number = %draft.account_number, "account inserted");

        self.find_account_by_id(id)
            .await?
            .ok_or_else(|| anyhow!("Account {} missing right after insert", id).into())
    }

    async fn find_account_by_id(&self, id: AccountId) -> StoreResult<Option<Account>> {
        let sql = format!("{} WHERE a.id = ?", ACCOUNT_SELECT);
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch account")?;

        match row {
            Some(row) => Ok(Some(Self::row_to_account(&row)?)),
            None => Ok(None),
        }
    }

    async fn find_account_by_number(&self, account_number: &str) -> StoreResult<Option<Account>> {
        let sql = format!("{} WHERE a.account_number = ?", ACCOUNT_SELECT);
        let row = sqlx::query(&sql)
            .bind(account_number)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch account by number")?;

        match row {
            Some(row) => Ok(Some(Self::row_to_account(&row)?)),
            None => Ok(None),
        }
    }

    async fn account_number_exists(&self, account_number: &str) -> StoreResult<bool> {
        self.exists(
            "SELECT EXISTS(SELECT 1 FROM accounts WHERE account_number = ?) AS found",
            account_number,
        )
        .await
    }

    async fn find_accounts_by_user(&self, user_id: UserId) -> StoreResult<Vec<Account>> {
        let sql = format!("{} WHERE a.user_id = ? ORDER BY a.id", ACCOUNT_SELECT);
        let rows = sqlx::query(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await
            .context("Failed to list accounts for user")?;

        Ok(rows.iter().map(Self::row_to_account).collect::<Result<_>>()?)
    }

    async fn list_accounts(&self) -> StoreResult<Vec<Account>> {
        let sql = format!("{} ORDER BY a.id", ACCOUNT_SELECT);
        let rows = sqlx::query(&sql)
            .fetch_all(&self.pool)
            .await
            .context("Failed to list accounts")?;

        Ok(rows.iter().map(Self::row_to_account).collect::<Result<_>>()?)
    }

    async fn count_accounts(&self) -> StoreResult<i64> {
        let row = sqlx::query("SELECT COUNT(*) AS count FROM accounts")
            .fetch_one(&self.pool)
            .await
            .context("Failed to count accounts")?;
        Ok(row.get("count"))
    }

    async fn delete_account(&self, id: AccountId) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM accounts WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| classify(e, "Failed to delete account"))?;
        Ok(result.rows_affected() > 0)
    }

    async fn update_balance(&self, update: BalanceUpdate) -> StoreResult<bool> {
        let result = sqlx::query(UPDATE_BALANCE)
            .bind(update.new_balance.to_string())
            .bind(update.account_id)
            .bind(update.expected.to_string())
            .execute(&self.pool)
            .await
            .map_err(|e| classify(e, "Failed to update balance"))?;
        Ok(result.rows_affected() == 1)
    }

    async fn transfer_balances(
        &self,
        debit: BalanceUpdate,
        credit: BalanceUpdate,
    ) -> StoreResult<bool> {
        let mut tx = self
            .pool
            .begin()
            .await
            .context("Failed to begin transfer")?;

        for update in [debit, credit] {
            let result = sqlx::query(UPDATE_BALANCE)
                .bind(update.new_balance.to_string())
                .bind(update.account_id)
                .bind(update.expected.to_string())
                .execute(&mut *tx)
                .await
                .map_err(|e| classify(e, "Failed to apply transfer"))?;

            if result.rows_affected() != 1 {
                tx.rollback().await.context("Failed to roll back transfer")?;
                return Ok(false);
            }
        }

        tx.commit().await.context("Failed to commit transfer")?;
        Ok(true)
    }
}

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    Ok(DateTime::parse_from_rfc3339(value)?.with_timezone(&Utc))
}

/// Map constraint failures to their own variants so services can report conflicts.
fn classify(err: sqlx::Error, what: &'static str) -> StoreError {
    if let Some(db_err) = err.as_database_error() {
        match db_err.kind() {
            ErrorKind::UniqueViolation => {
                return StoreError::Duplicate(db_err.message().to_string());
            }
            ErrorKind::ForeignKeyViolation | ErrorKind::CheckViolation => {
                return StoreError::Constraint(db_err.message().to_string());
            }
            _ => {}
        }
    }
    StoreError::Other(anyhow::Error::new(err).context(what))
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;
    use tempfile::TempDir;

    use super::*;
    use crate::domain::NewUser;

    async fn test_store() -> (SqliteStore, TempDir) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("store.db");
        let store = SqliteStore::open(path.to_str().unwrap()).await.unwrap();
        (store, dir)
    }

    fn draft(username: &str) -> UserDraft {
        let new_user = NewUser::new(username, format!("{username}@email.com"), "pw", "Some One");
        UserDraft::customer(&new_user, "hash".into())
    }

    #[tokio::test]
    async fn test_insert_and_find_user() {
        let (store, _dir) = test_store().await;
        let user = store.insert_user(&draft("john_doe")).await.unwrap();

        let found = store.find_user_by_id(user.id).await.unwrap().unwrap();
        assert_eq!(found, user);
        assert!(store.username_exists("john_doe").await.unwrap());
        assert!(!store.username_exists("JOHN_DOE").await.unwrap());
        assert!(store.email_exists("john_doe@email.com").await.unwrap());
        assert_eq!(store.count_users().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_username_is_classified() {
        let (store, _dir) = test_store().await;
        store.insert_user(&draft("john_doe")).await.unwrap();

        let mut again = draft("john_doe");
        again.email = "other@email.com".into();
        let err = store.insert_user(&again).await.unwrap_err();
        match err {
            StoreError::Duplicate(msg) => assert!(msg.contains("username"), "{msg}"),
            other => panic!("expected duplicate, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_account_resolves_owner_and_keeps_precision() {
        let (store, _dir) = test_store().await;
        let user = store.insert_user(&draft("john_doe")).await.unwrap();
        let account = store
            .insert_account(
                &AccountDraft::new("ACC123456".into(), user.id, "USD".into())
                    .with_balance(dec!(1000.125)),
            )
            .await
            .unwrap();

        assert_eq!(account.owner, user);
        assert_eq!(account.balance, dec!(1000.125));
        assert!(store.account_number_exists("ACC123456").await.unwrap());
        assert_eq!(store.find_accounts_by_user(user.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_one_account_per_user_constraint() {
        let (store, _dir) = test_store().await;
        let user = store.insert_user(&draft("john_doe")).await.unwrap();
        store
            .insert_account(&AccountDraft::new("ACC00000001".into(), user.id, "USD".into()))
            .await
            .unwrap();

        let err = store
            .insert_account(&AccountDraft::new("ACC00000002".into(), user.id, "USD".into()))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Duplicate(_)));
    }

    #[tokio::test]
    async fn test_update_balance_is_conditional() {
        let (store, _dir) = test_store().await;
        let user = store.insert_user(&draft("john_doe")).await.unwrap();
        let account = store
            .insert_account(&AccountDraft::new("ACC1".into(), user.id, "USD".into()))
            .await
            .unwrap();

        let applied = store
            .update_balance(BalanceUpdate {
                account_id: account.id,
                expected: account.balance,
                new_balance: dec!(50.00),
            })
            .await
            .unwrap();
        assert!(applied);

        // Stale expectation: the balance is no longer zero.
        let stale = store
            .update_balance(BalanceUpdate {
                account_id: account.id,
                expected: account.balance,
                new_balance: dec!(75.00),
            })
            .await
            .unwrap();
        assert!(!stale);

        let reloaded = store.find_account_by_id(account.id).await.unwrap().unwrap();
        assert_eq!(reloaded.balance, dec!(50.00));
    }

    #[tokio::test]
    async fn test_transfer_balances_rolls_back_on_stale_credit() {
        let (store, _dir) = test_store().await;
        let alice = store.insert_user(&draft("alice")).await.unwrap();
        let bob = store.insert_user(&draft("bob")).await.unwrap();
        let from = store
            .insert_account(
                &AccountDraft::new("ACC1".into(), alice.id, "USD".into()).with_balance(dec!(100)),
            )
            .await
            .unwrap();
        let to = store
            .insert_account(&AccountDraft::new("ACC2".into(), bob.id, "USD".into()))
            .await
            .unwrap();

        let applied = store
            .transfer_balances(
                BalanceUpdate {
                    account_id: from.id,
                    expected: dec!(100),
                    new_balance: dec!(60),
                },
                BalanceUpdate {
                    account_id: to.id,
                    expected: dec!(999),
                    new_balance: dec!(40),
                },
            )
            .await
            .unwrap();
        assert!(!applied);

        let from_after = store.find_account_by_id(from.id).await.unwrap().unwrap();
        assert_eq!(from_after.balance, dec!(100));
    }

    #[tokio::test]
    async fn test_delete_user_with_account_violates_foreign_key() {
        let (store, _dir) = test_store().await;
        let user = store.insert_user(&draft("john_doe")).await.unwrap();
        store
            .insert_account(&AccountDraft::new("ACC1".into(), user.id, "USD".into()))
            .await
            .unwrap();

        let err = store.delete_user(user.id).await.unwrap_err();
        assert!(matches!(err, StoreError::Constraint(_)));
        assert!(!store.delete_user(9999).await.unwrap());
    }
}
