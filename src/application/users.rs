use serde::Serialize;
use std::sync::Arc;
use tracing::info;

use crate::domain::{NewUser, Role, User, UserDraft, UserId};
use crate::storage::{AccountStore, StoreError, UserStore};

use super::AppError;
use super::password::{hash_password_off_thread, verify_password_off_thread};

/// Whether a user may move money, with "no such user" kept distinct from "blocked".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OperationStatus {
    Allowed,
    Blocked,
    NotFound,
}

impl OperationStatus {
    pub fn is_allowed(&self) -> bool {
        matches!(self, OperationStatus::Allowed)
    }
}

/// User directory: registration, lookup, blocking and credential checks.
#[derive(Clone)]
pub struct UserService {
    users: Arc<dyn UserStore>,
    accounts: Arc<dyn AccountStore>,
}

impl UserService {
    pub fn new(users: Arc<dyn UserStore>, accounts: Arc<dyn AccountStore>) -> Self {
        Self { users, accounts }
    }

    /// Register a new customer. The stored user is never blocked and always a customer.
    pub async fn register_user(&self, new_user: NewUser) -> Result<User, AppError> {
        self.register_with_role(new_user, Role::Customer).await
    }

    pub(crate) async fn register_with_role(
        &self,
        new_user: NewUser,
        role: Role,
    ) -> Result<User, AppError> {
        validate_new_user(&new_user)?;

        if self.users.username_exists(&new_user.username).await? {
            return Err(AppError::UsernameTaken(new_user.username));
        }
        if self.users.email_exists(&new_user.email).await? {
            return Err(AppError::EmailTaken(new_user.email));
        }

        let password_hash = hash_password_off_thread(new_user.password.clone()).await?;
        let draft = UserDraft::customer(&new_user, password_hash).with_role(role);

        let user = match self.users.insert_user(&draft).await {
            Ok(user) => user,
            // Lost a race with a concurrent registration.
            Err(StoreError::Duplicate(msg)) if msg.contains("email") => {
                return Err(AppError::EmailTaken(new_user.email));
            }
            Err(StoreError::Duplicate(_)) => {
                return Err(AppError::UsernameTaken(new_user.username));
            }
            Err(e) => return Err(e.into()),
        };

        info!(user_id = user.id, username = %user.username, role = %user.role, "user registered");
        Ok(user)
    }

    pub async fn get_user_by_id(&self, id: UserId) -> Result<Option<User>, AppError> {
        Ok(self.users.find_user_by_id(id).await?)
    }

    pub async fn get_user_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        Ok(self.users.find_user_by_username(username).await?)
    }

    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        Ok(self.users.find_user_by_email(email).await?)
    }

    pub async fn get_all_users(&self) -> Result<Vec<User>, AppError> {
        Ok(self.users.list_users().await?)
    }

    pub async fn count_users(&self) -> Result<i64, AppError> {
        Ok(self.users.count_users().await?)
    }

    async fn require_user(&self, id: UserId) -> Result<User, AppError> {
        self.users
            .find_user_by_id(id)
            .await?
            .ok_or_else(|| AppError::user_id_not_found(id))
    }

    pub async fn block_user(&self, id: UserId) -> Result<User, AppError> {
        let mut user = self.require_user(id).await?;
        user.block();
        self.users.update_user(&user).await?;
        info!(user_id = id, "user blocked");
        Ok(user)
    }

    pub async fn unblock_user(&self, id: UserId) -> Result<User, AppError> {
        let mut user = self.require_user(id).await?;
        user.unblock();
        self.users.update_user(&user).await?;
        info!(user_id = id, "user unblocked");
        Ok(user)
    }

    pub async fn operation_status(&self, id: UserId) -> Result<OperationStatus, AppError> {
        let status = match self.users.find_user_by_id(id).await? {
            None => OperationStatus::NotFound,
            Some(user) if user.can_perform_operations() => OperationStatus::Allowed,
            Some(_) => OperationStatus::Blocked,
        };
        Ok(status)
    }

    /// False both for blocked users and for unknown ids; use `operation_status`
    /// to tell them apart.
    pub async fn can_user_perform_operations(&self, id: UserId) -> Result<bool, AppError> {
        Ok(self.operation_status(id).await?.is_allowed())
    }

    /// Some(user) only if the username exists and the password matches its hash.
    pub async fn validate_credentials(
        &self,
        username: &str,
        password: &str,
    ) -> Result<Option<User>, AppError> {
        let Some(user) = self.users.find_user_by_username(username).await? else {
            return Ok(None);
        };
        let matches =
            verify_password_off_thread(password.to_string(), user.password_hash.clone()).await?;
        Ok(matches.then_some(user))
    }

    /// Remove a user that no longer owns any account.
    pub async fn delete_user(&self, id: UserId) -> Result<(), AppError> {
        self.require_user(id).await?;

        let owned = self.accounts.find_accounts_by_user(id).await?;
        if !owned.is_empty() {
            return Err(AppError::UserHasAccounts {
                user_id: id,
                accounts: owned.len(),
            });
        }

        match self.users.delete_user(id).await {
            Ok(true) => {
                info!(user_id = id, "user deleted");
                Ok(())
            }
            Ok(false) => Err(AppError::user_id_not_found(id)),
            // An account was opened in between.
            Err(StoreError::Constraint(_)) => Err(AppError::UserHasAccounts {
                user_id: id,
                accounts: 1,
            }),
            Err(e) => Err(e.into()),
        }
    }
}

fn validate_new_user(new_user: &NewUser) -> Result<(), AppError> {
    if new_user.username.trim().is_empty() {
        return Err(AppError::InvalidInput("username is required".into()));
    }
    if !new_user.email.contains('@') {
        return Err(AppError::InvalidInput(format!(
            "invalid email address: {}",
            new_user.email
        )));
    }
    if new_user.password.is_empty() {
        return Err(AppError::InvalidInput("password is required".into()));
    }
    Ok(())
}
