//! Tracing subscriber setup for the `replybuddy` binary
//!
//! Logs go to stderr so stdout carries only command output (replies, JSON).

use anyhow::Result;
use tracing_subscriber::{fmt, prelude::*, registry::Registry, EnvFilter};

use crate::config::LoggingConfig;

/// Env var consulted before `RUST_LOG`
pub const LOG_ENV: &str = "REPLYBUDDY_LOG";

/// Filter directive for a `-v` count, falling back to the configured level
pub fn filter_directive(verbosity: u8, configured: &str) -> String {
    match verbosity {
        0 => configured.to_string(),
        1 => "info,replybuddy=debug".to_string(),
        _ => "debug,replybuddy=trace".to_string(),
    }
}

/// Install the global subscriber. Fails if one is already installed.
pub fn init_logging(config: &LoggingConfig, verbosity: u8, force_json: bool) -> Result<()> {
    let env_filter = EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(filter_directive(verbosity, &config.level)));

    let registry = Registry::default().with(env_filter);

    if config.json || force_json {
        registry
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .json(),
            )
            .try_init()?;
    } else {
        registry
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(false),
            )
            .try_init()?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_directive() {
        assert_eq!(filter_directive(0, "replybuddy=warn"), "replybuddy=warn");
        assert_eq!(filter_directive(1, "replybuddy=warn"), "info,replybuddy=debug");
        assert_eq!(filter_directive(3, "replybuddy=warn"), "debug,replybuddy=trace");
    }

    #[test]
    fn test_directives_parse() {
        for verbosity in 0..3 {
            let directive = filter_directive(verbosity, &LoggingConfig::default().level);
            assert!(EnvFilter::try_new(&directive).is_ok(), "{}", directive);
        }
    }
}
