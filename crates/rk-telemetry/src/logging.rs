//! Subscriber setup for the `rk` binary.
//!
//! Everything goes to stderr. Stdout carries exactly one JSON document per
//! run (the reconcile result), and callers parse it.

use tracing_subscriber::{fmt, EnvFilter};

/// `RUST_LOG` wins over the level from `[logging] level`.
fn filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
}

/// Plain-text log lines for interactive use.
///
/// `default_level` takes directive syntax, e.g. `"rk_core=debug,warn"`.
/// Only the first call in a process installs a subscriber.
pub fn init_logging(service_name: &str, default_level: &str) {
    let installed = fmt()
        .with_env_filter(filter(default_level))
        .with_writer(std::io::stderr)
        .with_target(true)
        .try_init()
        .is_ok();

    if installed {
        tracing::debug!(service = service_name, format = "text", "logging ready");
    }
}

/// One JSON object per log line, for runs driven by automation.
///
/// Only the first call in a process installs a subscriber.
pub fn init_logging_json(service_name: &str, default_level: &str) {
    let installed = fmt()
        .json()
        .with_env_filter(filter(default_level))
        .with_writer(std::io::stderr)
        .with_current_span(true)
        .with_file(true)
        .with_line_number(true)
        .try_init()
        .is_ok();

    if installed {
        tracing::debug!(service = service_name, format = "json", "logging ready");
    }
}

/// Install the subscriber chosen by `[logging] json` or `--log-json`.
pub fn init(service_name: &str, default_level: &str, json: bool) {
    if json {
        init_logging_json(service_name, default_level);
    } else {
        init_logging(service_name, default_level);
    }
}
