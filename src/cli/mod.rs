use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::io::Write;

use crate::application::{Bank, Document, seed};
use crate::config::{AppConfig, GlobalOptions, ServeOptions};
use crate::io::DocumentFormat;
use crate::{api, logging};

/// Bankline - banking record-keeping service
#[derive(Parser)]
#[command(name = "bankline")]
#[command(about = "Users, accounts and an audited ledger behind a small HTTP API")]
#[command(version)]
pub struct Cli {
    #[command(flatten)]
    pub options: GlobalOptions,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create the database schema and the transaction log directory
    Init,

    /// Load demo users and accounts into an empty database
    Seed,

    /// Run the HTTP API
    Serve(ServeOptions),

    /// Render an account statement for a date range
    Statement {
        /// Account number (e.g., ACC123456)
        account: String,

        /// First day of the period (YYYY-MM-DD)
        #[arg(long)]
        from: String,

        /// Last day of the period (YYYY-MM-DD)
        #[arg(long)]
        to: String,

        /// Format: text, csv
        #[arg(short, long, default_value = "text")]
        format: String,

        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Render a receipt for one transaction
    Receipt {
        /// Transaction ID (e.g., TXN1A2B3C4D)
        transaction_id: String,

        /// Format: text, csv
        #[arg(short, long, default_value = "text")]
        format: String,

        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<String>,
    },
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        let config = AppConfig::from(&self.options);
        logging::init_logging(&config.log)?;

        let bank = Bank::init(&config.database, &config.txlog_dir).await?;

        match self.command {
            Commands::Init => {
                println!(
                    "Database initialized: {} (transaction log: {})",
                    config.database,
                    config.txlog_dir.display()
                );
            }

            Commands::Seed => {
                let report = seed::load_demo_data(&bank).await?;
                if report.skipped {
                    println!(
                        "Database already has {} users and {} accounts, nothing seeded",
                        report.users, report.accounts
                    );
                } else {
                    println!(
                        "Seeded {} users and {} accounts",
                        report.users, report.accounts
                    );
                }
            }

            Commands::Serve(serve) => {
                if serve.seed {
                    seed::load_demo_data(&bank).await?;
                }
                api::serve(bank, serve.bind).await?;
            }

            Commands::Statement {
                account,
                from,
                to,
                format,
                output,
            } => {
                let renderer = parse_format(&format)?.renderer();
                let document = bank
                    .statements
                    .statement(&account, &from, &to, renderer.as_ref())
                    .await?;
                write_document(&document, output.as_deref())?;
            }

            Commands::Receipt {
                transaction_id,
                format,
                output,
            } => {
                let renderer = parse_format(&format)?.renderer();
                let document = bank
                    .statements
                    .receipt(&transaction_id, renderer.as_ref())
                    .await?;
                write_document(&document, output.as_deref())?;
            }
        }

        Ok(())
    }
}

fn parse_format(format: &str) -> Result<DocumentFormat> {
    DocumentFormat::from_str(format)
        .with_context(|| format!("Invalid format '{}'. Valid formats: text, csv", format))
}

fn write_document(document: &Document, output: Option<&str>) -> Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, &document.bytes)
                .with_context(|| format!("Failed to write output file: {}", path))?;
            eprintln!("Wrote {} ({} bytes)", path, document.bytes.len());
        }
        None => {
            let mut stdout = std::io::stdout();
            stdout.write_all(&document.bytes)?;
            stdout.flush()?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::SocketAddr;

    #[test]
    fn test_parse_statement_command() {
        let cli = Cli::try_parse_from([
            "bankline",
            "--database",
            "test.db",
            "statement",
            "ACC123456",
            "--from",
            "2024-01-01",
            "--to",
            "2024-01-31",
            "--format",
            "csv",
        ])
        .unwrap();

        assert_eq!(cli.options.database, "test.db");
        match cli.command {
            Commands::Statement {
                account,
                from,
                format,
                output,
                ..
            } => {
                assert_eq!(account, "ACC123456");
                assert_eq!(from, "2024-01-01");
                assert_eq!(format, "csv");
                assert!(output.is_none());
            }
            _ => panic!("expected statement command"),
        }
    }

    #[test]
    fn test_parse_serve_command() {
        let cli = Cli::try_parse_from([
            "bankline",
            "serve",
            "--bind",
            "0.0.0.0:9000",
            "--seed",
            "--log-json",
        ])
        .unwrap();

        assert!(cli.options.log_json);
        match cli.command {
            Commands::Serve(serve) => {
                assert_eq!(serve.bind, "0.0.0.0:9000".parse::<SocketAddr>().unwrap());
                assert!(serve.seed);
            }
            _ => panic!("expected serve command"),
        }
    }

    #[test]
    fn test_parse_format() {
        assert_eq!(parse_format("csv").unwrap(), DocumentFormat::Csv);
        assert!(parse_format("pdf").is_err());
    }
}
