//! Remote repository providers for repokeeper.

pub mod github;

pub use github::{GitHubClient, GitHubProvider};
