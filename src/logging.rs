use anyhow::{Result, anyhow};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use crate::config::LogConfig;

/// Install the global subscriber. Logs go to stderr so CLI output on stdout
/// stays clean. `RUST_LOG` takes precedence over the configured level.
pub fn init_logging(config: &LogConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .map_err(|e| anyhow!("Invalid log level '{}': {}", config.level, e))?;

    let registry = tracing_subscriber::registry().with(filter);

    let result = if config.json {
        let layer = fmt::layer()
            .json()
            .with_target(true)
            .with_writer(std::io::stderr)
            .with_ansi(false);
        registry.with(layer).try_init()
    } else {
        // Keep the target so audit failures (`bankline::audit`) stand out.
        let layer = fmt::layer().with_target(true).with_writer(std::io::stderr);
        registry.with(layer).try_init()
    };

    result.map_err(|e| anyhow!("Failed to install log subscriber: {}", e))
}
