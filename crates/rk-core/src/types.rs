use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// TargetState
// ---------------------------------------------------------------------------

/// Whether the repository should exist after reconciliation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetState {
    #[default]
    Present,
    Absent,
}

impl std::fmt::Display for TargetState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TargetState::Present => write!(f, "present"),
            TargetState::Absent => write!(f, "absent"),
        }
    }
}

// ---------------------------------------------------------------------------
// DesiredState
// ---------------------------------------------------------------------------

/// The validated target configuration for a single repository.
///
/// Built once per invocation by [`crate::config::RepositorySpec::validate`];
/// the fields are read-only afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DesiredState {
    pub owner: String,
    pub repository: String,
    pub owner_is_organization: bool,
    pub target: TargetState,
    /// `None` means the caller did not ask for a particular visibility.
    pub private: Option<bool>,
    /// Required before an existing repository may be deleted.
    pub force: bool,
}

// ---------------------------------------------------------------------------
// ExecutionMode
// ---------------------------------------------------------------------------

/// Process-wide execution mode, read once per invocation and passed
/// explicitly into the reconciler.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionMode {
    #[default]
    Apply,
    /// Dry run: no provider call of any kind is issued.
    Check,
}

// ---------------------------------------------------------------------------
// Account / Repository
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountKind {
    Organization,
    User,
}

/// The account that owns (or would own) the repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub login: String,
    pub kind: AccountKind,
}

impl Account {
    pub fn organization(login: impl Into<String>) -> Self {
        Self {
            login: login.into(),
            kind: AccountKind::Organization,
        }
    }

    pub fn user(login: impl Into<String>) -> Self {
        Self {
            login: login.into(),
            kind: AccountKind::User,
        }
    }
}

/// A repository as reported by the provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Repository {
    pub owner: String,
    pub name: String,
    pub private: bool,
    #[serde(default)]
    pub html_url: Option<String>,
}

impl Repository {
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }
}

/// Result of a repository lookup. A missing repository is a normal answer,
/// not an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    Found(Repository),
    NotFound,
}

// ---------------------------------------------------------------------------
// Snapshot
// ---------------------------------------------------------------------------

/// Observed remote state, fetched fresh for every invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub account: Account,
    pub repository: Option<Repository>,
}

impl Snapshot {
    pub fn absent(account: Account) -> Self {
        Self {
            account,
            repository: None,
        }
    }

    pub fn present(account: Account, repository: Repository) -> Self {
        Self {
            account,
            repository: Some(repository),
        }
    }

    pub fn exists(&self) -> bool {
        self.repository.is_some()
    }

    /// Visibility of the repository; `None` iff it does not exist.
    pub fn is_private(&self) -> Option<bool> {
        self.repository.as_ref().map(|r| r.private)
    }
}

// ---------------------------------------------------------------------------
// Action
// ---------------------------------------------------------------------------

/// The single step chosen to move the observed state toward the desired one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Action {
    NoOp,
    Create { private: Option<bool> },
    Delete,
    UpdateVisibility { private: bool },
    Fail { reason: String },
}

impl Action {
    /// `true` for actions that issue a remote write.
    pub fn is_mutating(&self) -> bool {
        matches!(
            self,
            Action::Create { .. } | Action::Delete | Action::UpdateVisibility { .. }
        )
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Action::NoOp => write!(f, "no-op"),
            Action::Create { private: Some(p) } => write!(f, "create (private={p})"),
            Action::Create { private: None } => write!(f, "create"),
            Action::Delete => write!(f, "delete"),
            Action::UpdateVisibility { private } => {
                write!(f, "update visibility (private={private})")
            }
            Action::Fail { reason } => write!(f, "fail: {reason}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Outcome
// ---------------------------------------------------------------------------

/// What a successful invocation reports back to the caller.
///
/// `original_message` and `message` are reserved for future payload data and
/// are always empty today.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outcome {
    pub changed: bool,
    #[serde(default)]
    pub original_message: String,
    #[serde(default)]
    pub message: String,
}

impl Outcome {
    pub fn unchanged() -> Self {
        Self::default()
    }

    pub fn changed() -> Self {
        Self {
            changed: true,
            ..Self::default()
        }
    }
}
