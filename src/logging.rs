//! Diagnostic logging setup.

use tracing_subscriber::layer::SubscriberExt as _;
use tracing_subscriber::util::SubscriberInitExt as _;
use tracing_subscriber::{fmt, EnvFilter};

/// Environment variable holding the filter directive.
pub const LOG_ENV: &str = "TASKDECK_LOG";

/// Directive used when the variable is unset or invalid.
pub const DEFAULT_DIRECTIVE: &str = "warn";

/// Build the filter from `TASKDECK_LOG`, or the default.
pub fn env_filter() -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVE))
}

/// Install a stderr subscriber.
///
/// Calling this more than once is harmless; later calls are ignored.
pub fn init() {
    let _ = tracing_subscriber::registry()
        .with(env_filter())
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_default_filter() {
        std::env::remove_var(LOG_ENV);
        assert_eq!(env_filter().to_string(), DEFAULT_DIRECTIVE);
    }

    #[test]
    #[serial]
    fn test_env_filter_override() {
        std::env::set_var(LOG_ENV, "taskdeck=debug");
        assert_eq!(env_filter().to_string(), "taskdeck=debug");
        std::env::remove_var(LOG_ENV);
    }

    #[test]
    fn test_init_twice() {
        init();
        init();
    }
}
