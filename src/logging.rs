//! Tracing setup for the binary.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Environment variable holding the log filter.
pub const LOG_ENV: &str = "QUICKFIRE_LOG";

/// Filter used when `QUICKFIRE_LOG` is unset or invalid.
pub const DEFAULT_FILTER: &str = "warn";

/// Build the filter from a directive string, falling back to `warn`.
pub fn env_filter(directives: Option<&str>) -> EnvFilter {
    directives
        .and_then(|d| EnvFilter::try_new(d).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_FILTER))
}

/// Install the global subscriber. Logs go to stderr so they never mix with
/// session output.
pub fn init_tracing() {
    let directives = std::env::var(LOG_ENV).ok();
    let layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true);

    // A second call (tests, embedding) leaves the first subscriber in place.
    let _ = tracing_subscriber::registry()
        .with(env_filter(directives.as_deref()))
        .with(layer)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_filter_default() {
        assert_eq!(env_filter(None).to_string(), "warn");
    }

    #[test]
    fn test_env_filter_custom() {
        assert_eq!(env_filter(Some("quickfire=debug")).to_string(), "quickfire=debug");
    }

    #[test]
    fn test_env_filter_invalid_falls_back() {
        assert_eq!(env_filter(Some("quickfire=[[")).to_string(), "warn");
    }

    #[test]
    fn test_init_twice_is_harmless() {
        init_tracing();
        init_tracing();
    }
}
