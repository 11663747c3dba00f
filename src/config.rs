use clap::Args;
use std::net::SocketAddr;
use std::path::PathBuf;

pub const DEFAULT_DATABASE: &str = "bankline.db";
pub const DEFAULT_TXLOG_DIR: &str = "txlog";
pub const DEFAULT_LOG_LEVEL: &str = "info";
pub const DEFAULT_BIND: &str = "127.0.0.1:8080";

/// Options shared by every subcommand.
#[derive(Debug, Clone, Args)]
pub struct GlobalOptions {
    /// SQLite database file holding users and accounts
    #[arg(short, long, global = true, env = "BANKLINE_DATABASE", default_value = DEFAULT_DATABASE)]
    pub database: String,

    /// Directory of the append-only transaction log
    #[arg(long, global = true, env = "BANKLINE_TXLOG_DIR", default_value = DEFAULT_TXLOG_DIR)]
    pub txlog_dir: PathBuf,

    /// Log level or filter directive (RUST_LOG overrides it)
    #[arg(long, global = true, env = "BANKLINE_LOG", default_value = DEFAULT_LOG_LEVEL)]
    pub log_level: String,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub log_json: bool,
}

/// Options of the `serve` subcommand.
#[derive(Debug, Clone, Args)]
pub struct ServeOptions {
    /// Address the HTTP server listens on
    #[arg(long, env = "BANKLINE_BIND", default_value = DEFAULT_BIND)]
    pub bind: SocketAddr,

    /// Load demo users and accounts into an empty database before serving
    #[arg(long)]
    pub seed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    pub level: String,
    pub json: bool,
}

/// Resolved runtime configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub database: String,
    pub txlog_dir: PathBuf,
    pub log: LogConfig,
}

impl From<&GlobalOptions> for AppConfig {
    fn from(options: &GlobalOptions) -> Self {
        Self {
            database: options.database.clone(),
            txlog_dir: options.txlog_dir.clone(),
            log: LogConfig {
                level: options.log_level.clone(),
                json: options.log_json,
            },
        }
    }
}
