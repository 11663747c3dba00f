pub mod gateway;
mod sqlite;
mod txlog;

pub use gateway::*;
pub use sqlite::*;
pub use txlog::*;

/// SQL migration for the users/accounts schema
pub const MIGRATION_001_INITIAL: &str = include_str!("migrations/001_initial.sql");
