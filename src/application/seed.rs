use rust_decimal::Decimal;
use tracing::info;

use crate::domain::{NewUser, Role};

use super::{AppError, Bank};

/// What a seeding run did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeedReport {
    pub users: i64,
    pub accounts: i64,
    /// True when data already existed and nothing was inserted.
    pub skipped: bool,
}

struct DemoUser {
    username: &'static str,
    email: &'static str,
    password: &'static str,
    full_name: &'static str,
    role: Role,
    account_number: &'static str,
    currency: &'static str,
    /// Opening balance in cents.
    balance_cents: i64,
}

const DEMO_USERS: [DemoUser; 3] = [
    DemoUser {
        username: "john_doe",
        email: "john@email.com",
        password: "password123",
        full_name: "John Doe",
        role: Role::Customer,
        account_number: "ACC123456",
        currency: "USD",
        balance_cents: 100_000,
    },
    DemoUser {
        username: "jane_smith",
        email: "jane@email.com",
        password: "password123",
        full_name: "Jane Smith",
        role: Role::Customer,
        account_number: "ACC789012",
        currency: "USD",
        balance_cents: 50_000,
    },
    DemoUser {
        username: "bank_manager",
        email: "manager@bank.com",
        password: "admin123",
        full_name: "Bank Manager",
        role: Role::Manager,
        account_number: "ACC345678",
        currency: "EUR",
        balance_cents: 250_000,
    },
];

/// Insert the demo users and their accounts into an empty bank.
/// Does nothing if any user already exists.
pub async fn load_demo_data(bank: &Bank) -> Result<SeedReport, AppError> {
    let existing_users = bank.users.count_users().await?;
    if existing_users > 0 {
        let existing_accounts = bank.accounts.count_accounts().await?;
        info!(
            users = existing_users,
            accounts = existing_accounts,
            "data already present, skipping demo seed"
        );
        return Ok(SeedReport {
            users: existing_users,
            accounts: existing_accounts,
            skipped: true,
        });
    }

    for demo in &DEMO_USERS {
        let user = bank
            .users
            .register_with_role(
                NewUser::new(demo.username, demo.email, demo.password, demo.full_name),
                demo.role,
            )
            .await?;
        bank.accounts
            .open_seeded_account(
                user.id,
                demo.account_number,
                demo.currency,
                Decimal::new(demo.balance_cents, 2),
            )
            .await?;
    }

    let report = SeedReport {
        users: bank.users.count_users().await?,
        accounts: bank.accounts.count_accounts().await?,
        skipped: false,
    };
    info!(users = report.users, accounts = report.accounts, "demo data loaded");
    Ok(report)
}
