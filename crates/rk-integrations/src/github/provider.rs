use async_trait::async_trait;
use rk_core::provider::RepositoryProvider;
use rk_core::types::{Account, AccountKind, Lookup, Repository};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::client::{provider_error, GitHubClient, Result};

/// [`RepositoryProvider`] backed by the GitHub REST API.
#[derive(Debug, Clone)]
pub struct GitHubProvider {
    client: GitHubClient,
}

impl GitHubProvider {
    pub fn new(client: GitHubClient) -> Self {
        Self { client }
    }
}

// Only the fields the reconciler needs; GitHub sends far more.
#[derive(Debug, Deserialize)]
struct AccountBody {
    login: String,
}

#[derive(Debug, Deserialize)]
struct RepositoryBody {
    name: String,
    #[serde(default)]
    private: Option<bool>,
    #[serde(default)]
    html_url: Option<String>,
    #[serde(default)]
    owner: Option<AccountBody>,
}

#[derive(Debug, Serialize)]
struct CreateRepositoryBody<'a> {
    name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    private: Option<bool>,
}

#[derive(Debug, Serialize)]
struct UpdateVisibilityBody {
    private: bool,
}

#[async_trait]
impl RepositoryProvider for GitHubProvider {
    async fn resolve_account(&self, owner: &str, is_organization: bool) -> Result<Account> {
        if is_organization {
            let org: AccountBody = self
                .client
                .octocrab
                .get(format!("/orgs/{owner}"), None::<&()>)
                .await
                .map_err(provider_error)?;
            Ok(Account::organization(org.login))
        } else {
            let user: AccountBody = self
                .client
                .octocrab
                .get("/user", None::<&()>)
                .await
                .map_err(provider_error)?;
            if !user.login.eq_ignore_ascii_case(owner) {
                debug!(
                    owner,
                    login = %user.login,
                    "owner differs from authenticated user; using the authenticated account"
                );
            }
            Ok(Account::user(user.login))
        }
    }

    async fn lookup_repository(&self, account: &Account, name: &str) -> Result<Lookup> {
        let found: std::result::Result<RepositoryBody, _> = self
            .client
            .octocrab
            .get(format!("/repos/{}/{name}", account.login), None::<&()>)
            .await;

        match found.map_err(provider_error) {
            Ok(body) => Ok(Lookup::Found(to_repository(account, body))),
            Err(err) if err.is_not_found() => Ok(Lookup::NotFound),
            Err(err) => Err(err),
        }
    }

    async fn create_repository(
        &self,
        account: &Account,
        name: &str,
        private: Option<bool>,
    ) -> Result<Repository> {
        let route = match account.kind {
            AccountKind::Organization => format!("/orgs/{}/repos", account.login),
            AccountKind::User => "/user/repos".to_string(),
        };
        let body: RepositoryBody = self
            .client
            .octocrab
            .post(route, Some(&CreateRepositoryBody { name, private }))
            .await
            .map_err(provider_error)?;
        Ok(to_repository(account, body))
    }

    async fn delete_repository(&self, repository: &Repository) -> Result<()> {
        self.client
            .octocrab
            .repos(&repository.owner, &repository.name)
            .delete()
            .await
            .map_err(provider_error)
    }

    async fn update_visibility(
        &self,
        repository: &Repository,
        private: bool,
    ) -> Result<()> {
        let _: RepositoryBody = self
            .client
            .octocrab
            .patch(
                format!("/repos/{}/{}", repository.owner, repository.name),
                Some(&UpdateVisibilityBody { private }),
            )
            .await
            .map_err(provider_error)?;
        Ok(())
    }
}

fn to_repository(account: &Account, body: RepositoryBody) -> Repository {
    Repository {
        owner: body
            .owner
            .map(|o| o.login)
            .unwrap_or_else(|| account.login.clone()),
        name: body.name,
        private: body.private.unwrap_or(false),
        html_url: body.html_url,
    }
}
