//! Tracing subscriber setup for the binary.

use tracing_subscriber::EnvFilter;

/// Filter used by `--debug`.
pub const DEBUG_FILTER: &str =
    "fieldmeta=debug,fieldmeta_schema=debug,fieldmeta_editor=debug,fieldmeta_config=debug";

/// Pick the log filter: `--debug` wins, then `RUST_LOG`, then the configured filter.
pub fn build_filter(debug: bool, configured: &str) -> EnvFilter {
    if debug {
        return EnvFilter::new(DEBUG_FILTER);
    }
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(configured))
        .unwrap_or_else(|_| EnvFilter::new(fieldmeta_config::DEFAULT_LOG_FILTER))
}

/// Install the global subscriber, writing to stderr.
pub fn init(filter: EnvFilter) {
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_ansi(false)
        .with_writer(std::io::stderr)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_debug_flag_wins() {
        std::env::set_var("RUST_LOG", "error");
        let filter = build_filter(true, "warn");
        std::env::remove_var("RUST_LOG");
        assert!(filter.to_string().contains("fieldmeta_editor=debug"));
    }

    #[test]
    #[serial]
    fn test_rust_log_overrides_config() {
        std::env::set_var("RUST_LOG", "error");
        let filter = build_filter(false, "info");
        std::env::remove_var("RUST_LOG");
        assert_eq!(filter.to_string(), "error");
    }

    #[test]
    #[serial]
    fn test_configured_filter_used_without_env() {
        std::env::remove_var("RUST_LOG");
        assert_eq!(build_filter(false, "info").to_string(), "info");
        assert_eq!(build_filter(false, "fieldmeta=loud").to_string(), "warn");
    }
}
