mod common;

use anyhow::Result;
use bankline::application::{AppError, ErrorKind, OperationStatus};
use bankline::domain::{NewUser, Role};
use common::{Customers, test_bank};

fn john() -> NewUser {
    NewUser::new("john_doe", "john@email.com", "password123", "John Doe")
}

#[tokio::test]
async fn test_register_forces_customer_defaults() -> Result<()> {
    let (bank, _temp) = test_bank().await?;
    let user = bank.users.register_user(john()).await?;

    assert!(user.id > 0);
    assert!(!user.blocked);
    assert_eq!(user.role, Role::Customer);
    assert_ne!(user.password_hash, "password123");
    assert!(user.password_hash.starts_with("$argon2"));

    let stored = bank.users.get_user_by_username("john_doe").await?;
    assert_eq!(stored, Some(user.clone()));
    assert_eq!(
        bank.users.get_user_by_email("john@email.com").await?,
        Some(user.clone())
    );
    assert_eq!(bank.users.get_user_by_id(user.id).await?, Some(user));

    Ok(())
}

#[tokio::test]
async fn test_duplicate_username_conflicts_even_with_new_email() -> Result<()> {
    let (bank, _temp) = test_bank().await?;
    bank.users.register_user(john()).await?;

    let err = bank
        .users
        .register_user(NewUser::new("john_doe", "other@email.com", "pw", "Other"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::UsernameTaken(_)));
    assert_eq!(err.kind(), ErrorKind::Conflict);

    // Usernames are case-sensitive.
    bank.users
        .register_user(NewUser::new("John_Doe", "john2@email.com", "pw", "John"))
        .await?;
    assert_eq!(bank.users.get_all_users().await?.len(), 2);

    Ok(())
}

#[tokio::test]
async fn test_duplicate_email_conflicts() -> Result<()> {
    let (bank, _temp) = test_bank().await?;
    bank.users.register_user(john()).await?;

    let err = bank
        .users
        .register_user(NewUser::new("johnny", "john@email.com", "pw", "Johnny"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::EmailTaken(_)));

    Ok(())
}

#[tokio::test]
async fn test_register_rejects_bad_input() -> Result<()> {
    let (bank, _temp) = test_bank().await?;

    let err = bank
        .users
        .register_user(NewUser::new("", "x@email.com", "pw", "X"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
    assert!(bank.users.get_all_users().await?.is_empty());

    Ok(())
}

#[tokio::test]
async fn test_lookups_of_unknown_users() -> Result<()> {
    let (bank, _temp) = test_bank().await?;

    assert_eq!(bank.users.get_user_by_id(99).await?, None);
    assert_eq!(bank.users.get_user_by_username("ghost").await?, None);
    assert!(matches!(
        bank.users.block_user(99).await,
        Err(AppError::UserNotFound(_))
    ));
    assert!(matches!(
        bank.users.unblock_user(99).await,
        Err(AppError::UserNotFound(_))
    ));

    Ok(())
}

#[tokio::test]
async fn test_block_and_unblock_status() -> Result<()> {
    let (bank, _temp) = test_bank().await?;
    let user = bank.users.register_user(john()).await?;

    assert_eq!(
        bank.users.operation_status(user.id).await?,
        OperationStatus::Allowed
    );
    assert!(bank.users.can_user_perform_operations(user.id).await?);

    let blocked = bank.users.block_user(user.id).await?;
    assert!(blocked.blocked);
    assert_eq!(
        bank.users.operation_status(user.id).await?,
        OperationStatus::Blocked
    );
    assert!(!bank.users.can_user_perform_operations(user.id).await?);

    let unblocked = bank.users.unblock_user(user.id).await?;
    assert!(!unblocked.blocked);
    assert!(bank.users.can_user_perform_operations(user.id).await?);

    // Unknown ids are distinguishable from blocked users.
    assert_eq!(
        bank.users.operation_status(12345).await?,
        OperationStatus::NotFound
    );
    assert!(!bank.users.can_user_perform_operations(12345).await?);

    Ok(())
}

#[tokio::test]
async fn test_validate_credentials() -> Result<()> {
    let (bank, _temp) = test_bank().await?;
    let user = bank.users.register_user(john()).await?;

    let valid = bank
        .users
        .validate_credentials("john_doe", "password123")
        .await?;
    assert_eq!(valid.map(|u| u.id), Some(user.id));

    assert!(
        bank.users
            .validate_credentials("john_doe", "Password123")
            .await?
            .is_none()
    );
    assert!(
        bank.users
            .validate_credentials("ghost", "password123")
            .await?
            .is_none()
    );

    Ok(())
}

#[tokio::test]
async fn test_delete_user_requires_no_accounts() -> Result<()> {
    let (bank, _temp) = test_bank().await?;
    let (user, account) = Customers::open(&bank, "alice", "USD").await?;

    let err = bank.users.delete_user(user.id).await.unwrap_err();
    assert!(matches!(err, AppError::UserHasAccounts { accounts: 1, .. }));
    assert_eq!(err.kind(), ErrorKind::Conflict);

    bank.accounts.delete_account(account.id).await?;
    bank.users.delete_user(user.id).await?;
    assert_eq!(bank.users.get_user_by_id(user.id).await?, None);

    assert!(matches!(
        bank.users.delete_user(user.id).await,
        Err(AppError::UserNotFound(_))
    ));

    Ok(())
}
