//! Logging and tracing setup for repokeeper.
//!
//! - **Logging**: human-readable or JSON output via `tracing-subscriber`,
//!   always on stderr so stdout stays free for the run result
//! - **Tracing**: per-invocation operation spans with OpenTelemetry-compatible
//!   trace/span IDs for correlating log lines

pub mod logging;
pub mod tracing_setup;
