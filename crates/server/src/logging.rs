//! Logging initialization.
//!
//! Structured `tracing` output to stderr. `SPAWNGUARD_LOG` overrides the
//! configured directive.

use tracing_subscriber::EnvFilter;

use crate::config::GuardConfig;

/// Environment variable that overrides the configured log filter.
pub const LOG_ENV_VAR: &str = "SPAWNGUARD_LOG";

/// Build the filter: `SPAWNGUARD_LOG` if set and valid, else `default_directive`.
pub fn build_filter(default_directive: &str) -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV_VAR).unwrap_or_else(|_| EnvFilter::new(default_directive))
}

/// Install the global subscriber.
///
/// Uses `try_init()`, so repeated calls (e.g. from tests) are ignored.
pub fn init_logging(default_directive: &str) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(build_filter(default_directive))
        .with_target(true)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Install the global subscriber using the config's `log_filter` as default.
pub fn init_from_config(config: &GuardConfig) {
    init_logging(&config.log_filter);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_logging_is_idempotent() {
        init_logging("info");
        init_logging("spawnguard=debug");
    }

    #[test]
    fn test_config_filter_parses() {
        let mut config = GuardConfig::default();
        config.log_filter = "spawnguard::guard=debug,warn".to_string();
        assert!(EnvFilter::try_new(&config.log_filter).is_ok());
        init_from_config(&config);
    }
}
