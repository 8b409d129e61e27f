//! Tracing subscriber setup

use anyhow::Result;
use tracing_subscriber::EnvFilter;

use crate::config::{LogFormat, LoggingConfig};

/// Filter directive for the given verbosity.
///
/// Each `-v` raises the configured level one step; `RUST_LOG`, when set,
/// takes precedence over both.
pub fn filter_directive(config: &LoggingConfig, verbose: u8) -> &'static str {
    config.level.raised(verbose).as_str()
}

/// Install the global tracing subscriber
pub fn init_tracing(config: &LoggingConfig, verbose: u8) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter_directive(config, verbose)));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);

    let installed = match config.format {
        LogFormat::Json => builder
            .json()
            .flatten_event(true)
            .with_current_span(true)
            .with_span_list(false)
            .try_init(),
        LogFormat::Text => builder.try_init(),
    };

    installed.map_err(|e| anyhow::anyhow!("Failed to install tracing subscriber: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LogLevel;

    #[test]
    fn test_verbosity_steps_up_from_level() {
        let config = LoggingConfig {
            format: LogFormat::Text,
            level: LogLevel::Warn,
        };
        assert_eq!(filter_directive(&config, 0), "warn");
        assert_eq!(filter_directive(&config, 1), "info");
        assert_eq!(filter_directive(&config, 2), "debug");
        assert_eq!(filter_directive(&config, 5), "trace");
    }

    #[test]
    fn test_verbosity_never_lowers_trace() {
        let config = LoggingConfig {
            format: LogFormat::Json,
            level: LogLevel::Trace,
        };
        assert_eq!(filter_directive(&config, 1), "trace");
    }
}
