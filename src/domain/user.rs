use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub type UserId = i64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    /// Regular bank customer; every self-registered user gets this role
    Customer,
    /// Bank staff, only created by seeding or administration
    Manager,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Customer => "CUSTOMER",
            Role::Manager => "MANAGER",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "CUSTOMER" => Some(Role::Customer),
            "MANAGER" => Some(Role::Manager),
            _ => None,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub email: String,
    /// Argon2 PHC string. Never leaves the service.
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub full_name: String,
    pub blocked: bool,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn can_perform_operations(&self) -> bool {
        !self.blocked
    }

    pub fn block(&mut self) {
        self.blocked = true;
    }

    pub fn unblock(&mut self) {
        self.blocked = false;
    }
}

/// Registration input. There is deliberately no way to pass a role or a blocked flag.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password: String,
    pub full_name: String,
}

impl NewUser {
    pub fn new(
        username: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
        full_name: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            email: email.into(),
            password: password.into(),
            full_name: full_name.into(),
        }
    }
}

/// A user row ready to be inserted; the store assigns the id.
#[derive(Debug, Clone)]
pub struct UserDraft {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub full_name: String,
    pub blocked: bool,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

impl UserDraft {
    pub fn customer(new_user: &NewUser, password_hash: String) -> Self {
        Self {
            username: new_user.username.clone(),
            email: new_user.email.clone(),
            password_hash,
            full_name: new_user.full_name.clone(),
            blocked: false,
            role: Role::Customer,
            created_at: Utc::now(),
        }
    }

    pub fn with_role(mut self, role: Role) -> Self {
        self.role = role;
        self
    }
}
