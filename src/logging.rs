//! Structured logging for the provider process.
//!
//! Logs go to **stderr**; stdout belongs to the plugin host. Statements are
//! logged at `debug` from the client, resource lifecycle events at `info`.
//!
//! # Environment Variables
//!
//! - `SNOWFLAKE_PROVIDER_LOG`: filter directives for this provider, e.g.
//!   `snowflake_provider_sdk=debug`
//! - `RUST_LOG`: used when `SNOWFLAKE_PROVIDER_LOG` is unset
//!
//! ```bash
//! # Show every statement sent to the account
//! SNOWFLAKE_PROVIDER_LOG=snowflake_provider_sdk::client=debug ./provider
//! ```

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Filter variable read before `RUST_LOG`.
pub const LOG_ENV: &str = "SNOWFLAKE_PROVIDER_LOG";

fn filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(default_level))
}

fn subscriber(filter: EnvFilter) -> impl tracing::Subscriber + Send + Sync {
    tracing_subscriber::registry().with(filter).with(
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false),
    )
}

/// Install the stderr subscriber with an `info` default.
///
/// # Panics
///
/// Panics if a global subscriber has already been set.
pub fn init_logging() {
    init_logging_with_default("info");
}

/// Like [`init_logging`], with a different level when no filter variable is set.
///
/// # Panics
///
/// Panics if a global subscriber has already been set.
pub fn init_logging_with_default(default_level: &str) {
    subscriber(filter(default_level)).init();
}

/// Try to install the subscriber; `false` if one is already set.
pub fn try_init_logging() -> bool {
    subscriber(filter("info")).try_init().is_ok()
}

#[cfg(test)]
mod tests {
    // The global subscriber can only be set once per process, so only the
    // filter side is exercised here.

    use super::*;

    #[test]
    fn test_env_filter_parsing() {
        assert!(EnvFilter::try_new("info").is_ok());
        assert!(EnvFilter::try_new("snowflake_provider_sdk=debug").is_ok());
        assert!(EnvFilter::try_new("warn,snowflake_provider_sdk::client=debug").is_ok());
    }

    #[test]
    fn test_try_init_is_idempotent() {
        let first = try_init_logging();
        assert!(!try_init_logging() || !first);
    }
}
