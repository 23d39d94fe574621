use octocrab::Octocrab;
use rk_core::config::Credentials;
use rk_core::provider::ProviderError;

pub type Result<T> = std::result::Result<T, ProviderError>;

#[derive(Debug, Clone)]
pub struct GitHubClient {
    pub(crate) octocrab: Octocrab,
    pub(crate) api_url: String,
}

impl GitHubClient {
    /// Build an authenticated client for `api_url`.
    ///
    /// No request is sent. A client that cannot be built is reported as
    /// [`ProviderError::Unavailable`].
    pub fn new(credentials: &Credentials, api_url: &str) -> Result<Self> {
        let builder = Octocrab::builder()
            .base_uri(api_url)
            .map_err(|e| ProviderError::Unavailable(format!("invalid API URL '{api_url}': {e}")))?;

        let builder = match credentials {
            Credentials::Token(token) => builder.personal_token(token.clone()),
            Credentials::Basic { user, password } => {
                builder.basic_auth(user.clone(), password.clone())
            }
        };

        let octocrab = builder
            .build()
            .map_err(|e| ProviderError::Unavailable(e.to_string()))?;

        Ok(Self {
            octocrab,
            api_url: api_url.to_string(),
        })
    }

    /// Returns the API base URL this client talks to.
    pub fn api_url(&self) -> &str {
        &self.api_url
    }
}

/// Translate an octocrab error, keeping the HTTP status when GitHub sent one.
pub(crate) fn provider_error(err: octocrab::Error) -> ProviderError {
    match err {
        octocrab::Error::GitHub { source, .. } => {
            ProviderError::api(source.status_code.as_u16(), source.message.clone())
        }
        other => ProviderError::Transport(other.to_string()),
    }
}
