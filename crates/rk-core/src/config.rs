use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::types::{DesiredState, TargetState};

/// Top-level configuration loaded from `~/.repokeeper/config.toml`.
///
/// **Security**: This struct NEVER stores tokens or passwords. It only names
/// the environment variables they are read from; see [`Credentials`].
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub github: GitHubConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Desired state for the repository, when driven by a manifest.
    #[serde(default)]
    pub repository: RepositorySpec,
}

impl Config {
    /// Load config from `~/.repokeeper/config.toml`, falling back to
    /// defaults when the file does not exist.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(path)
        } else {
            let cfg = Config::default();
            cfg.validate()?;
            Ok(cfg)
        }
    }

    /// Load from a specific path.
    pub fn load_from(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let text = std::fs::read_to_string(&path)
            .map_err(|e| ConfigError::Io(format!("{}: {e}", path.display())))?;
        let cfg: Config = toml::from_str(&text).map_err(|e| ConfigError::Parse(e.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Serialize config to TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        self.validate()?;
        toml::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Semantic validation for settings that are not fully expressible via type checks.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.github.validate()?;
        self.logging.validate()?;
        Ok(())
    }

    pub fn default_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".repokeeper")
            .join("config.toml")
    }
}

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("io: {0}")]
    Io(String),
    #[error("parse: {0}")]
    Parse(String),
    #[error("validation: {0}")]
    Validation(String),
}

// ---------------------------------------------------------------------------
// Section structs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitHubConfig {
    /// API base URL. Point at `https://<host>/api/v3` for GitHub Enterprise.
    #[serde(default = "default_api_url")]
    pub api_url: String,
    /// Login used for password authentication.
    #[serde(default)]
    pub user: Option<String>,
    /// Env var name for a personal access token (default: `GITHUB_TOKEN`).
    #[serde(default = "default_token_env")]
    pub token_env: String,
    /// Env var name for a password (default: `GITHUB_PASSWORD`).
    #[serde(default = "default_password_env")]
    pub password_env: String,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            user: None,
            token_env: default_token_env(),
            password_env: default_password_env(),
        }
    }
}

impl GitHubConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        let url = self.api_url.trim();
        if !(url.starts_with("https://") || url.starts_with("http://")) {
            return Err(ConfigError::Validation(format!(
                "github.api_url '{}' must be an http(s) URL",
                self.api_url
            )));
        }
        Ok(())
    }

    /// Token from the configured env var, if set and non-empty.
    pub fn env_token(&self) -> Option<String> {
        read_env(&self.token_env)
    }

    /// Password from the configured env var, if set and non-empty.
    pub fn env_password(&self) -> Option<String> {
        read_env(&self.password_env)
    }
}

fn read_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn default_api_url() -> String {
    "https://api.github.com".into()
}
fn default_token_env() -> String {
    "GITHUB_TOKEN".into()
}
fn default_password_env() -> String {
    "GITHUB_PASSWORD".into()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Emit JSON log lines instead of human-readable ones.
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

impl LoggingConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.level.trim().is_empty() {
            return Err(ConfigError::Validation(
                "logging.level must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

fn default_log_level() -> String {
    "info".into()
}

// ---------------------------------------------------------------------------
// RepositorySpec
// ---------------------------------------------------------------------------

/// Unvalidated desired state, as read from a manifest or the command line.
///
/// Every field is optional so that layers can be merged; defaults are applied
/// in [`RepositorySpec::validate`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositorySpec {
    #[serde(default)]
    pub owner: Option<String>,
    #[serde(default)]
    pub repository: Option<String>,
    #[serde(default)]
    pub state: Option<TargetState>,
    #[serde(default)]
    pub private: Option<bool>,
    #[serde(default)]
    pub force: Option<bool>,
    #[serde(default)]
    pub owner_is_organization: Option<bool>,
}

impl RepositorySpec {
    /// Layer `overrides` on top of `self`; fields set in `overrides` win.
    pub fn merged_with(self, overrides: RepositorySpec) -> Self {
        Self {
            owner: overrides.owner.or(self.owner),
            repository: overrides.repository.or(self.repository),
            state: overrides.state.or(self.state),
            private: overrides.private.or(self.private),
            force: overrides.force.or(self.force),
            owner_is_organization: overrides.owner_is_organization.or(self.owner_is_organization),
        }
    }

    /// Produce the immutable [`DesiredState`] handed to the reconciler.
    ///
    /// `owner` and `repository` must be non-blank and carry no surrounding
    /// whitespace.
    pub fn validate(&self) -> Result<DesiredState, ConfigError> {
        let owner = required(&self.owner, "owner")?;
        let repository = required(&self.repository, "repository")?;

        Ok(DesiredState {
            owner,
            repository,
            owner_is_organization: self.owner_is_organization.unwrap_or(false),
            target: self.state.unwrap_or_default(),
            private: self.private,
            force: self.force.unwrap_or(false),
        })
    }
}

/// Blank values count as missing. Names are used verbatim in API paths, so
/// leading or trailing whitespace is rejected rather than trimmed.
fn required(value: &Option<String>, field: &str) -> Result<String, ConfigError> {
    let value = value
        .as_deref()
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| ConfigError::Validation(format!("missing required argument: {field}")))?;

    if value.trim() != value {
        return Err(ConfigError::Validation(format!(
            "{field} must not have leading or trailing whitespace: {value:?}"
        )));
    }
    Ok(value.to_string())
}

// ---------------------------------------------------------------------------
// Credentials
// ---------------------------------------------------------------------------

/// How the provider client authenticates. Exactly one of token or password.
#[derive(Clone, PartialEq, Eq)]
pub enum Credentials {
    Token(String),
    Basic { user: String, password: String },
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Credentials::Token(_) => f.debug_tuple("Token").field(&"<redacted>").finish(),
            Credentials::Basic { user, .. } => f
                .debug_struct("Basic")
                .field("user", user)
                .field("password", &"<redacted>")
                .finish(),
        }
    }
}

impl Credentials {
    /// Enforce that token and password are mutually exclusive and that one of
    /// them is present. Blank values count as absent.
    pub fn resolve(
        user: Option<String>,
        token: Option<String>,
        password: Option<String>,
    ) -> Result<Self, ConfigError> {
        let non_blank = |v: Option<String>| v.filter(|s| !s.trim().is_empty());

        match (non_blank(token), non_blank(password)) {
            (Some(_), Some(_)) => Err(ConfigError::Validation(
                "parameters are mutually exclusive: password|token".to_string(),
            )),
            (None, None) => Err(ConfigError::Validation(
                "one of the following is required: password, token".to_string(),
            )),
            (Some(token), None) => Ok(Credentials::Token(token)),
            (None, Some(password)) => {
                let user = non_blank(user).ok_or_else(|| {
                    ConfigError::Validation(
                        "user is required when authenticating with a password".to_string(),
                    )
                })?;
                Ok(Credentials::Basic { user, password })
            }
        }
    }
}
