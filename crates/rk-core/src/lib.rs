//! Core of repokeeper: desired-state types, the provider seam and the
//! reconciliation engine for a single remote repository.

pub mod config;
pub mod provider;
pub mod reconcile;
pub mod types;
