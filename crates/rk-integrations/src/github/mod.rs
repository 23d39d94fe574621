pub mod client;
pub mod provider;

pub use client::GitHubClient;
pub use provider::GitHubProvider;
