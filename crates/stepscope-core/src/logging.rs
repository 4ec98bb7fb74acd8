//! Structured logging with environment variable configuration.
//!
//! Per-file indexing failures are reported through `tracing` rather than
//! surfaced as errors, so hosts embedding the engine get observability
//! without the engine aborting a batch.

use tracing_subscriber::EnvFilter;

use crate::config::IndexConfig;

fn filter_from_config(config: &IndexConfig) -> EnvFilter {
    EnvFilter::new(config.log_level.as_filter_str())
}

/// Initialise the logging subsystem based on configuration.
///
/// Logs are written to stderr so hosts that multiplex stdout (for example
/// over JSON-RPC) are not disturbed.
///
/// # Note
///
/// If a global subscriber is already set, this function silently ignores
/// the error. This is expected behaviour in tests or when multiple
/// components attempt to initialise logging.
pub fn init_logging(config: &IndexConfig) {
    let filter = filter_from_config(config);

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .finish();

    // The first subscriber wins, which is the expected behaviour.
    let _ = tracing::subscriber::set_global_default(subscriber);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LogLevel;

    #[test]
    fn init_logging_is_idempotent() {
        let config = IndexConfig::default();
        init_logging(&config);
        init_logging(&config);
    }

    #[test]
    fn filter_uses_config_log_level() {
        let mut config = IndexConfig::default();
        config.log_level = LogLevel::Debug;
        let filter = filter_from_config(&config);
        assert_eq!(filter.to_string(), "debug");
    }
}
