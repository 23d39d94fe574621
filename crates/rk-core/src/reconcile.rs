//! Repository reconciliation: observe, decide, apply.
//!
//! One invocation performs at most one state transition. There is no
//! convergence loop; if the remote state still differs afterwards, the next
//! invocation starts again from a fresh [`Snapshot`].

use tracing::{debug, info, Instrument};

use crate::provider::{ProviderError, RepositoryProvider};
use crate::types::{Action, DesiredState, ExecutionMode, Lookup, Outcome, Snapshot, TargetState};

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReconcileError {
    /// The desired state cannot be reached without an action the caller did
    /// not authorize.
    #[error("{reason}")]
    Precondition { reason: String },

    /// The provider client could not be constructed.
    #[error("GitHub client unavailable: {0}")]
    Unavailable(String),

    #[error("GitHub error: {0}")]
    Provider(ProviderError),
}

impl From<ProviderError> for ReconcileError {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::Unavailable(detail) => Self::Unavailable(detail),
            other => Self::Provider(other),
        }
    }
}

pub type Result<T> = std::result::Result<T, ReconcileError>;

/// Failure message for an existing repository that should be absent.
pub fn absent_precondition_reason(repository: &str) -> String {
    format!("expected repository {repository} to be absent")
}

// ---------------------------------------------------------------------------
// Snapshot fetcher
// ---------------------------------------------------------------------------

/// Resolve the owning account and look the repository up under it.
///
/// Read-only: issues the account resolution call and one lookup.
pub async fn fetch_snapshot<P>(provider: &P, desired: &DesiredState) -> Result<Snapshot>
where
    P: RepositoryProvider + ?Sized,
{
    let account = provider
        .resolve_account(&desired.owner, desired.owner_is_organization)
        .await?;
    debug!(account = %account.login, kind = ?account.kind, "resolved owning account");

    match provider
        .lookup_repository(&account, &desired.repository)
        .await?
    {
        Lookup::Found(repo) => Ok(Snapshot::present(account, repo)),
        Lookup::NotFound => Ok(Snapshot::absent(account)),
    }
}

// ---------------------------------------------------------------------------
// Decision
// ---------------------------------------------------------------------------

/// Pick the single action that moves `snapshot` toward `desired`.
///
/// Total and deterministic. Rules are evaluated in order and the first match
/// wins: check mode, creation, deletion (gated by `force`), visibility, no-op.
pub fn decide(desired: &DesiredState, snapshot: &Snapshot, mode: ExecutionMode) -> Action {
    if mode == ExecutionMode::Check {
        return Action::NoOp;
    }

    match (snapshot.exists(), desired.target) {
        (false, TargetState::Present) => Action::Create {
            private: desired.private,
        },
        (true, TargetState::Absent) if desired.force => Action::Delete,
        (true, TargetState::Absent) => Action::Fail {
            reason: absent_precondition_reason(&desired.repository),
        },
        (true, TargetState::Present) => match desired.private {
            Some(private) if snapshot.is_private() != Some(private) => {
                Action::UpdateVisibility { private }
            }
            _ => Action::NoOp,
        },
        (false, TargetState::Absent) => Action::NoOp,
    }
}

// ---------------------------------------------------------------------------
// Executor
// ---------------------------------------------------------------------------

/// Apply `action` with at most one mutating provider call.
pub async fn execute<P>(
    provider: &P,
    desired: &DesiredState,
    snapshot: &Snapshot,
    action: &Action,
) -> Result<Outcome>
where
    P: RepositoryProvider + ?Sized,
{
    match action {
        Action::NoOp => Ok(Outcome::unchanged()),
        Action::Create { private } => {
            let repo = provider
                .create_repository(&snapshot.account, &desired.repository, *private)
                .await?;
            info!(repository = %repo.full_name(), private = repo.private, "repository created");
            Ok(Outcome::changed())
        }
        Action::Delete => {
            let repo = existing(desired, snapshot)?;
            provider.delete_repository(repo).await?;
            info!(repository = %repo.full_name(), "repository deleted");
            Ok(Outcome::changed())
        }
        Action::UpdateVisibility { private } => {
            let repo = existing(desired, snapshot)?;
            provider.update_visibility(repo, *private).await?;
            info!(repository = %repo.full_name(), private, "repository visibility updated");
            Ok(Outcome::changed())
        }
        Action::Fail { reason } => Err(ReconcileError::Precondition {
            reason: reason.clone(),
        }),
    }
}

fn existing<'a>(
    desired: &DesiredState,
    snapshot: &'a Snapshot,
) -> Result<&'a crate::types::Repository> {
    snapshot
        .repository
        .as_ref()
        .ok_or_else(|| ReconcileError::Precondition {
            reason: format!("repository {} does not exist", desired.repository),
        })
}

// ---------------------------------------------------------------------------
// Reconciler
// ---------------------------------------------------------------------------

/// Runs one reconciliation against a provider.
pub struct Reconciler<P> {
    provider: P,
    mode: ExecutionMode,
}

impl<P: RepositoryProvider> Reconciler<P> {
    pub fn new(provider: P, mode: ExecutionMode) -> Self {
        Self { provider, mode }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Fetch, decide and apply for `desired`.
    ///
    /// In check mode this returns an unchanged outcome before any provider
    /// call, reads included.
    pub async fn reconcile(&self, desired: &DesiredState) -> Result<Outcome> {
        let span = tracing::info_span!(
            "reconcile",
            owner = %desired.owner,
            repository = %desired.repository,
            target = %desired.target,
        );

        async {
            if self.mode == ExecutionMode::Check {
                info!("check mode: skipping remote calls");
                return Ok(Outcome::unchanged());
            }

            let snapshot = fetch_snapshot(&self.provider, desired).await?;
            let action = decide(desired, &snapshot, self.mode);
            info!(
                exists = snapshot.exists(),
                private = ?snapshot.is_private(),
                mutating = action.is_mutating(),
                %action,
                "decided action"
            );

            execute(&self.provider, desired, &snapshot, &action).await
        }
        .instrument(span)
        .await
    }
}
