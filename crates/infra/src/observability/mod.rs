//! Tracing subscriber setup
//!
//! `RUST_LOG` wins over the configured level. JSON output is meant for log
//! aggregation; the default is human-readable.

use consentflow_domain::{ConsentError, LoggingConfig, Result};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer};

/// Install the global subscriber.
///
/// Returns `Ok(false)` when a subscriber was already installed.
///
/// # Errors
/// Returns `ConsentError::Config` if the configured level is not a valid
/// filter directive.
pub fn init_tracing(config: &LoggingConfig) -> Result<bool> {
    let filter = build_filter(config)?;

    let fmt_layer = if config.json {
        fmt::layer().json().with_target(true).flatten_event(true).boxed()
    } else {
        fmt::layer().with_target(false).boxed()
    };

    let installed = tracing_subscriber::registry().with(fmt_layer).with(filter).try_init().is_ok();
    if installed {
        tracing::debug!(level = %config.level, json = config.json, "Logging initialized");
    }
    Ok(installed)
}

fn build_filter(config: &LoggingConfig) -> Result<EnvFilter> {
    EnvFilter::try_from_default_env().or_else(|_| {
        EnvFilter::try_new(&config.level)
            .map_err(|e| ConsentError::Config(format!("invalid log level '{}': {e}", config.level)))
    })
}
