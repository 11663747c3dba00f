// Application layer - use cases and orchestration.
// Clients (API, CLI) talk to the services below; the services talk to the
// storage gateways and never to each other's stores.

mod accounts;
pub mod error;
mod password;
pub mod seed;
mod statements;
mod transactions;
mod users;

pub use accounts::*;
pub use error::*;
pub use statements::*;
pub use transactions::*;
pub use users::*;

use anyhow::Result;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

use crate::storage::{AccountStore, JsonlTransactionStore, SqliteStore, TransactionStore, UserStore};

/// Wires the stores into the services. Cheap to clone.
#[derive(Clone)]
pub struct Bank {
    pub users: UserService,
    pub accounts: AccountService,
    pub transactions: TransactionLogger,
    pub statements: StatementService,
}

impl Bank {
    /// Open (creating if needed) the SQLite database and the transaction log directory.
    pub async fn init(database_path: &str, txlog_dir: impl AsRef<Path>) -> Result<Self> {
        let relational = Arc::new(SqliteStore::open(database_path).await?);
        let documents = Arc::new(JsonlTransactionStore::open(txlog_dir.as_ref())?);

        info!(
            database = database_path,
            txlog = %documents.path().display(),
            "bank storage ready"
        );
        Ok(Self::with_stores(relational.clone(), relational, documents))
    }

    /// Build the services on top of arbitrary store implementations.
    pub fn with_stores(
        users: Arc<dyn UserStore>,
        accounts: Arc<dyn AccountStore>,
        transactions: Arc<dyn TransactionStore>,
    ) -> Self {
        let logger = TransactionLogger::new(transactions);
        let account_service = AccountService::new(users.clone(), accounts.clone(), logger.clone());
        Self {
            users: UserService::new(users, accounts),
            statements: StatementService::new(account_service.clone(), logger.clone()),
            accounts: account_service,
            transactions: logger,
        }
    }
}
