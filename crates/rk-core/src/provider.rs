use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use crate::types::{Account, AccountKind, Lookup, Repository};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors raised by a [`RepositoryProvider`].
///
/// The reconciler never inspects these beyond propagating them, except for
/// the lookup path where providers translate "not found" into
/// [`Lookup::NotFound`] themselves.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProviderError {
    /// The remote API answered with an error status.
    #[error("{message} (HTTP {status})")]
    Api { status: u16, message: String },

    /// The request never produced an API answer (connection, TLS, decoding).
    #[error("{0}")]
    Transport(String),

    /// The client could not be built, so no request was attempted.
    #[error("GitHub client unavailable: {0}")]
    Unavailable(String),
}

impl ProviderError {
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    /// HTTP status code, when the error came from the API.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }
}

// ---------------------------------------------------------------------------
// RepositoryProvider trait
// ---------------------------------------------------------------------------

/// Authenticated access to a remote repository host.
///
/// Every call is a single request; retries and timeouts belong to the
/// implementation, never to the caller.
#[async_trait]
pub trait RepositoryProvider: Send + Sync {
    /// Resolve the owning account: the named organization when
    /// `is_organization` is set, otherwise the authenticated user.
    async fn resolve_account(
        &self,
        owner: &str,
        is_organization: bool,
    ) -> Result<Account, ProviderError>;

    /// Look up `name` under `account`. A missing repository is
    /// `Ok(Lookup::NotFound)`.
    async fn lookup_repository(
        &self,
        account: &Account,
        name: &str,
    ) -> Result<Lookup, ProviderError>;

    async fn create_repository(
        &self,
        account: &Account,
        name: &str,
        private: Option<bool>,
    ) -> Result<Repository, ProviderError>;

    async fn delete_repository(&self, repository: &Repository) -> Result<(), ProviderError>;

    /// Change only the visibility of `repository`.
    async fn update_visibility(
        &self,
        repository: &Repository,
        private: bool,
    ) -> Result<(), ProviderError>;
}

// ---------------------------------------------------------------------------
// MemoryProvider
// ---------------------------------------------------------------------------

/// A provider call as recorded by [`MemoryProvider`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderCall {
    ResolveAccount { owner: String, organization: bool },
    Lookup { owner: String, name: String },
    Create { owner: String, name: String, private: Option<bool> },
    Delete { owner: String, name: String },
    UpdateVisibility { owner: String, name: String, private: bool },
}

impl ProviderCall {
    pub fn is_mutating(&self) -> bool {
        matches!(
            self,
            ProviderCall::Create { .. }
                | ProviderCall::Delete { .. }
                | ProviderCall::UpdateVisibility { .. }
        )
    }
}

/// Which provider operation an injected failure applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderOp {
    ResolveAccount,
    Lookup,
    Create,
    Delete,
    UpdateVisibility,
}

#[derive(Default)]
struct MemoryState {
    organizations: BTreeSet<String>,
    repositories: BTreeMap<(String, String), Repository>,
    calls: Vec<ProviderCall>,
    failures: VecDeque<(ProviderOp, ProviderError)>,
}

/// An in-memory repository host that records every call.
///
/// Behaves like a real backing store: creates, deletes and visibility
/// updates persist across invocations, so it can be used to check that a
/// second reconciliation is a no-op.
pub struct MemoryProvider {
    login: String,
    state: Mutex<MemoryState>,
}

impl MemoryProvider {
    /// Create a provider authenticated as `login` with no repositories.
    pub fn new(login: impl Into<String>) -> Self {
        Self {
            login: login.into(),
            state: Mutex::new(MemoryState::default()),
        }
    }

    /// Register an organization the authenticated user can see.
    pub fn with_organization(self, org: impl Into<String>) -> Self {
        self.lock().organizations.insert(org.into());
        self
    }

    /// Seed an existing repository.
    pub fn with_repository(self, owner: &str, name: &str, private: bool) -> Self {
        self.lock().repositories.insert(
            (owner.to_string(), name.to_string()),
            Repository {
                owner: owner.to_string(),
                name: name.to_string(),
                private,
                html_url: None,
            },
        );
        self
    }

    /// Make the next call to `op` fail with `error`.
    pub fn with_failure(self, op: ProviderOp, error: ProviderError) -> Self {
        self.lock().failures.push_back((op, error));
        self
    }

    /// Every call issued so far, in order.
    pub fn calls(&self) -> Vec<ProviderCall> {
        self.lock().calls.clone()
    }

    pub fn mutating_calls(&self) -> usize {
        self.lock().calls.iter().filter(|c| c.is_mutating()).count()
    }

    /// Current state of a stored repository.
    pub fn repository(&self, owner: &str, name: &str) -> Option<Repository> {
        self.lock()
            .repositories
            .get(&(owner.to_string(), name.to_string()))
            .cloned()
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn take_failure(state: &mut MemoryState, op: ProviderOp) -> Result<(), ProviderError> {
        match state.failures.iter().position(|(o, _)| *o == op) {
            Some(idx) => match state.failures.remove(idx) {
                Some((_, err)) => Err(err),
                None => Ok(()),
            },
            None => Ok(()),
        }
    }
}

#[async_trait]
impl RepositoryProvider for MemoryProvider {
    async fn resolve_account(
        &self,
        owner: &str,
        is_organization: bool,
    ) -> Result<Account, ProviderError> {
        let mut state = self.lock();
        state.calls.push(ProviderCall::ResolveAccount {
            owner: owner.to_string(),
            organization: is_organization,
        });
        Self::take_failure(&mut state, ProviderOp::ResolveAccount)?;

        if !is_organization {
            return Ok(Account::user(self.login.clone()));
        }
        if state.organizations.contains(owner) {
            Ok(Account::organization(owner))
        } else {
            Err(ProviderError::api(404, "Not Found"))
        }
    }

    async fn lookup_repository(
        &self,
        account: &Account,
        name: &str,
    ) -> Result<Lookup, ProviderError> {
        let mut state = self.lock();
        state.calls.push(ProviderCall::Lookup {
            owner: account.login.clone(),
            name: name.to_string(),
        });
        Self::take_failure(&mut state, ProviderOp::Lookup)?;

        Ok(state
            .repositories
            .get(&(account.login.clone(), name.to_string()))
            .cloned()
            .map_or(Lookup::NotFound, Lookup::Found))
    }

    async fn create_repository(
        &self,
        account: &Account,
        name: &str,
        private: Option<bool>,
    ) -> Result<Repository, ProviderError> {
        let mut state = self.lock();
        state.calls.push(ProviderCall::Create {
            owner: account.login.clone(),
            name: name.to_string(),
            private,
        });
        Self::take_failure(&mut state, ProviderOp::Create)?;

        let key = (account.login.clone(), name.to_string());
        if state.repositories.contains_key(&key) {
            return Err(ProviderError::api(
                422,
                "Repository creation failed: name already exists on this account",
            ));
        }
        if account.kind == AccountKind::Organization && !state.organizations.contains(&account.login)
        {
            return Err(ProviderError::api(404, "Not Found"));
        }

        let repo = Repository {
            owner: account.login.clone(),
            name: name.to_string(),
            private: private.unwrap_or(false),
            html_url: None,
        };
        state.repositories.insert(key, repo.clone());
        Ok(repo)
    }

    async fn delete_repository(&self, repository: &Repository) -> Result<(), ProviderError> {
        let mut state = self.lock();
        state.calls.push(ProviderCall::Delete {
            owner: repository.owner.clone(),
            name: repository.name.clone(),
        });
        Self::take_failure(&mut state, ProviderOp::Delete)?;

        state
            .repositories
            .remove(&(repository.owner.clone(), repository.name.clone()))
            .map(|_| ())
            .ok_or_else(|| ProviderError::api(404, "Not Found"))
    }

    async fn update_visibility(
        &self,
        repository: &Repository,
        private: bool,
    ) -> Result<(), ProviderError> {
        let mut state = self.lock();
        state.calls.push(ProviderCall::UpdateVisibility {
            owner: repository.owner.clone(),
            name: repository.name.clone(),
            private,
        });
        Self::take_failure(&mut state, ProviderOp::UpdateVisibility)?;

        match state
            .repositories
            .get_mut(&(repository.owner.clone(), repository.name.clone()))
        {
            Some(stored) => {
                stored.private = private;
                Ok(())
            }
            None => Err(ProviderError::api(404, "Not Found")),
        }
    }
}
