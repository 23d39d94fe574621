//! JSON result reporting on stdout.

use rk_core::types::Outcome;
use serde::Serialize;

/// Failure record: always carries a human-readable message.
#[derive(Debug, Serialize)]
pub struct Failure {
    pub failed: bool,
    pub msg: String,
}

impl Failure {
    pub fn new(msg: impl Into<String>) -> Self {
        Self {
            failed: true,
            msg: msg.into(),
        }
    }
}

pub fn render_success(outcome: &Outcome) -> serde_json::Result<String> {
    serde_json::to_string(outcome)
}

pub fn render_failure(msg: &str) -> serde_json::Result<String> {
    serde_json::to_string(&Failure::new(msg))
}

pub fn print_success(outcome: &Outcome) {
    match render_success(outcome) {
        Ok(line) => println!("{line}"),
        Err(e) => tracing::error!(error = %e, "failed to serialize result"),
    }
}

pub fn print_failure(msg: &str) {
    match render_failure(msg) {
        Ok(line) => println!("{line}"),
        Err(e) => tracing::error!(error = %e, msg, "failed to serialize failure"),
    }
}
