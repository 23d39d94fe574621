use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, ValueEnum};
use rk_core::config::{Config, ConfigError, Credentials, RepositorySpec};
use rk_core::reconcile::{ReconcileError, Reconciler};
use rk_core::types::{DesiredState, ExecutionMode, Outcome, TargetState};
use rk_integrations::github::{GitHubClient, GitHubProvider};
use tracing::Instrument;

use super::load_config;
use crate::report;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StateArg {
    Present,
    Absent,
}

impl From<StateArg> for TargetState {
    fn from(state: StateArg) -> Self {
        match state {
            StateArg::Present => TargetState::Present,
            StateArg::Absent => TargetState::Absent,
        }
    }
}

/// Arguments for `rk apply`. Values given here override the `[repository]`
/// and `[github]` sections of the config file.
#[derive(Debug, Clone, Default, Args)]
pub struct ApplyArgs {
    /// Account that owns the repository.
    #[arg(long)]
    pub owner: Option<String>,

    /// Repository name.
    #[arg(long)]
    pub repository: Option<String>,

    /// Treat `--owner` as an organization instead of the authenticated user.
    #[arg(long)]
    pub owner_is_organization: bool,

    /// Whether the repository should exist.
    #[arg(long, value_enum)]
    pub state: Option<StateArg>,

    /// Desired visibility (`true` or `false`). Left alone when omitted.
    #[arg(long)]
    pub private: Option<bool>,

    /// Allow deleting an existing repository when `--state absent`.
    #[arg(long)]
    pub force: bool,

    /// Login for password authentication.
    #[arg(long)]
    pub user: Option<String>,

    /// Personal access token. Falls back to the configured env var.
    #[arg(long, conflicts_with = "password")]
    pub token: Option<String>,

    /// Password. Falls back to the configured env var.
    #[arg(long)]
    pub password: Option<String>,

    /// GitHub API base URL (e.g. `https://ghe.example.com/api/v3`).
    #[arg(long)]
    pub github_url: Option<String>,

    /// Dry run: report without contacting GitHub.
    #[arg(long)]
    pub check: bool,

    /// Config file to read instead of `~/.repokeeper/config.toml`.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Emit JSON log lines on stderr.
    #[arg(long)]
    pub log_json: bool,
}

impl ApplyArgs {
    /// Desired-state fields set on the command line. Unset flags stay `None`
    /// so they do not mask values from the config file.
    fn repository_spec(&self) -> RepositorySpec {
        RepositorySpec {
            owner: self.owner.clone(),
            repository: self.repository.clone(),
            state: self.state.map(TargetState::from),
            private: self.private,
            force: self.force.then_some(true),
            owner_is_organization: self.owner_is_organization.then_some(true),
        }
    }

    pub fn mode(&self) -> ExecutionMode {
        if self.check {
            ExecutionMode::Check
        } else {
            ExecutionMode::Apply
        }
    }
}

/// Merge the config file's `[repository]` section with the command line.
pub fn desired_state(args: &ApplyArgs, config: &Config) -> Result<DesiredState, ConfigError> {
    config
        .repository
        .clone()
        .merged_with(args.repository_spec())
        .validate()
}

/// Credentials from flags when any are given, otherwise from the env vars
/// named in `[github]`.
pub fn credentials(args: &ApplyArgs, config: &Config) -> Result<Credentials, ConfigError> {
    let user = args.user.clone().or_else(|| config.github.user.clone());
    if args.token.is_some() || args.password.is_some() {
        Credentials::resolve(user, args.token.clone(), args.password.clone())
    } else {
        Credentials::resolve(user, config.github.env_token(), config.github.env_password())
    }
}

pub fn api_url(args: &ApplyArgs, config: &Config) -> String {
    args.github_url
        .clone()
        .unwrap_or_else(|| config.github.api_url.clone())
}

/// Validate inputs, build the GitHub provider and reconcile once.
///
/// In check mode nothing past input validation runs: the client is not
/// built, so a bad API URL cannot fail a dry run.
pub async fn reconcile(args: &ApplyArgs, config: &Config) -> anyhow::Result<Outcome> {
    let desired = desired_state(args, config)?;
    let credentials = credentials(args, config)?;
    if args.mode() == ExecutionMode::Check {
        tracing::info!(
            owner = %desired.owner,
            repository = %desired.repository,
            "check mode: skipping GitHub client"
        );
        return Ok(Outcome::unchanged());
    }
    let api_url = api_url(args, config);

    let client = GitHubClient::new(&credentials, &api_url).map_err(ReconcileError::from)?;
    let reconciler = Reconciler::new(GitHubProvider::new(client), args.mode());

    Ok(reconciler.reconcile(&desired).await?)
}

async fn apply_loaded(
    args: &ApplyArgs,
    config: Result<Config, ConfigError>,
    trace_id: &str,
) -> anyhow::Result<Outcome> {
    tracing::debug!(trace_id, check = args.check, "starting apply");
    let config = config?;
    reconcile(args, &config).await
}

/// Run `rk apply`, printing the JSON result and returning the exit status.
pub async fn run(args: &ApplyArgs) -> ExitCode {
    let config = load_config(args.config.as_deref());

    let (level, json) = match &config {
        Ok(cfg) => (cfg.logging.level.as_str(), cfg.logging.json || args.log_json),
        Err(_) => ("info", args.log_json),
    };
    rk_telemetry::logging::init("rk", level, json);

    let (span, trace_id) = rk_telemetry::tracing_setup::create_operation_span("apply");
    let result = apply_loaded(args, config, &trace_id).instrument(span).await;

    match result {
        Ok(outcome) => {
            report::print_success(&outcome);
            ExitCode::SUCCESS
        }
        Err(err) => {
            let msg = format!("{err:#}");
            tracing::error!(error = %msg, "apply failed");
            report::print_failure(&msg);
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use axum::{extract::Json, http::StatusCode, routing::get, routing::post, Router};
    use serde_json::json;

    use super::*;

    fn base_args() -> ApplyArgs {
        ApplyArgs {
            owner: Some("acme".into()),
            repository: Some("widgets".into()),
            owner_is_organization: true,
            token: Some("ghp_test".into()),
            ..Default::default()
        }
    }

    #[test]
    fn command_line_overrides_manifest() {
        let mut config = Config::default();
        config.repository = RepositorySpec {
            owner: Some("someone".into()),
            repository: Some("widgets".into()),
            private: Some(true),
            force: Some(true),
            ..Default::default()
        };
        let args = ApplyArgs {
            owner: Some("acme".into()),
            private: Some(false),
            ..Default::default()
        };

        let desired = desired_state(&args, &config).unwrap();
        assert_eq!(desired.owner, "acme");
        assert_eq!(desired.repository, "widgets");
        assert_eq!(desired.private, Some(false));
        // an unset --force flag does not clear the manifest value
        assert!(desired.force);
    }

    #[test]
    fn missing_repository_is_rejected() {
        let args = ApplyArgs {
            owner: Some("acme".into()),
            ..Default::default()
        };
        let err = desired_state(&args, &Config::default()).unwrap_err();
        assert!(err.to_string().contains("repository"));
    }

    #[test]
    fn flag_credentials_take_precedence() {
        let args = ApplyArgs {
            user: Some("octocat".into()),
            password: Some("pw".into()),
            ..Default::default()
        };
        let mut config = Config::default();
        // point the token lookup at a variable that is never set
        config.github.token_env = "RK_TEST_UNSET_TOKEN_VAR".into();

        let creds = credentials(&args, &config).unwrap();
        assert_eq!(
            creds,
            Credentials::Basic {
                user: "octocat".into(),
                password: "pw".into()
            }
        );
    }

    #[test]
    fn no_credentials_is_rejected() {
        let mut config = Config::default();
        config.github.token_env = "RK_TEST_UNSET_TOKEN_VAR".into();
        config.github.password_env = "RK_TEST_UNSET_PASSWORD_VAR".into();

        let err = credentials(&ApplyArgs::default(), &config).unwrap_err();
        assert!(err.to_string().contains("one of the following is required"));
    }

    #[test]
    fn github_url_flag_overrides_config() {
        let args = ApplyArgs {
            github_url: Some("https://ghe.example.com/api/v3".into()),
            ..Default::default()
        };
        assert_eq!(api_url(&args, &Config::default()), "https://ghe.example.com/api/v3");
        assert_eq!(
            api_url(&ApplyArgs::default(), &Config::default()),
            "https://api.github.com"
        );
    }

    #[tokio::test]
    async fn invalid_github_url_reports_unavailable_client() {
        let args = ApplyArgs {
            github_url: Some("http://exa mple.com".into()),
            ..base_args()
        };
        let err = reconcile(&args, &Config::default()).await.unwrap_err();
        assert!(format!("{err:#}").starts_with("GitHub client unavailable"));
    }

    #[tokio::test]
    async fn creates_repository_against_api() {
        let app = Router::new()
            .route("/orgs/acme", get(|| async { Json(json!({"login": "acme"})) }))
            .route(
                "/repos/acme/widgets",
                get(|| async {
                    (
                        StatusCode::NOT_FOUND,
                        Json(json!({"message": "Not Found", "documentation_url": "https://docs.github.com/rest"})),
                    )
                }),
            )
            .route(
                "/orgs/acme/repos",
                post(|Json(body): Json<serde_json::Value>| async move {
                    assert_eq!(body["private"], true);
                    (
                        StatusCode::CREATED,
                        Json(json!({"id": 7, "name": "widgets", "private": true})),
                    )
                }),
            );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let args = ApplyArgs {
            private: Some(true),
            github_url: Some(format!("http://{addr}")),
            ..base_args()
        };
        let outcome = reconcile(&args, &Config::default()).await.unwrap();
        assert!(outcome.changed);
    }

    #[tokio::test]
    async fn check_mode_skips_api() {
        // Nothing listens on this port.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let args = ApplyArgs {
            state: Some(StateArg::Absent),
            force: true,
            check: true,
            github_url: Some(format!("http://{addr}")),
            ..base_args()
        };
        let outcome = reconcile(&args, &Config::default()).await.unwrap();
        assert!(!outcome.changed);
    }

    #[tokio::test]
    async fn check_mode_ignores_unusable_github_url() {
        let args = ApplyArgs {
            check: true,
            github_url: Some("http://exa mple.com".into()),
            ..base_args()
        };
        let outcome = reconcile(&args, &Config::default()).await.unwrap();
        assert!(!outcome.changed);
        assert_eq!(outcome, Outcome::unchanged());
    }

    #[tokio::test]
    async fn check_mode_still_validates_inputs() {
        let args = ApplyArgs {
            repository: None,
            check: true,
            ..base_args()
        };
        let err = reconcile(&args, &Config::default()).await.unwrap_err();
        assert!(format!("{err:#}").contains("missing required argument: repository"));
    }
}
