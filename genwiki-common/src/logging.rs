//! Tracing subscriber setup
//!
//! `RUST_LOG` wins when set; otherwise the configured level is used.
//! Log output goes to stderr so stdout stays free for command output.

use crate::config::LoggingConfig;
use crate::{Error, Result};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Build the filter used by [`init`]
pub fn env_filter(config: &LoggingConfig) -> Result<EnvFilter> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(&config.level)
            .map_err(|e| Error::Config(format!("Invalid log level '{}': {}", config.level, e))),
    }
}

/// Install the global fmt subscriber. Fails if one is already installed.
pub fn init(config: &LoggingConfig) -> Result<()> {
    let filter = env_filter(config)?;

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true),
        )
        .try_init()
        .map_err(|e| Error::Internal(format!("Failed to install tracing subscriber: {}", e)))
}
