use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

/// Per-category violation counters for one account.
///
/// The category set is closed; every counter is always present and never
/// decreases. Only `toxic` and `spam` feed the deactivation decision, the
/// other five are tracked but inert.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct ViolationCounts {
    pub spam: i64,
    pub toxic: i64,
    pub severe_toxic: i64,
    pub obscene: i64,
    pub threat: i64,
    pub insult: i64,
    pub identity_hate: i64,
}

impl ViolationCounts {
    /// Element-wise sum of two counter sets.
    #[must_use]
    pub const fn add(&self, other: &Self) -> Self {
        Self {
            spam: self.spam + other.spam,
            toxic: self.toxic + other.toxic,
            severe_toxic: self.severe_toxic + other.severe_toxic,
            obscene: self.obscene + other.obscene,
            threat: self.threat + other.threat,
            insult: self.insult + other.insult,
            identity_hate: self.identity_hate + other.identity_hate,
        }
    }

    /// Counters after folding in one analysis event: each flagged category
    /// gains one, the rest carry over unchanged.
    #[must_use]
    pub fn accumulate(&self, analysis: &MessageAnalysis) -> Self {
        self.add(&analysis.increments())
    }

    /// The score gating deactivation: toxic + spam, nothing else.
    #[must_use]
    pub const fn violation_score(&self) -> i64 {
        self.toxic + self.spam
    }
}

/// Per-message moderation flags delivered by the analysis feed.
#[derive(ToSchema, Serialize, Deserialize, Debug, Clone, Copy, Default)]
pub struct MessageAnalysis {
    #[serde(default)]
    pub spam: bool,
    #[serde(default)]
    pub toxic: bool,
    #[serde(default)]
    pub severe_toxic: bool,
    #[serde(default)]
    pub obscene: bool,
    #[serde(default)]
    pub threat: bool,
    #[serde(default)]
    pub insult: bool,
    #[serde(default)]
    pub identity_hate: bool,
}

impl MessageAnalysis {
    /// One-or-zero increment per category for a single event.
    #[must_use]
    pub fn increments(&self) -> ViolationCounts {
        ViolationCounts {
            spam: i64::from(self.spam),
            toxic: i64::from(self.toxic),
            severe_toxic: i64::from(self.severe_toxic),
            obscene: i64::from(self.obscene),
            threat: i64::from(self.threat),
            insult: i64::from(self.insult),
            identity_hate: i64::from(self.identity_hate),
        }
    }
}

/// Persisted account record. Credential material stays inside the engine;
/// callers only ever see a [`UserView`].
#[derive(Debug, Clone, FromRow)]
pub struct Account {
    pub id: Uuid,
    pub login: String,
    pub email: String,
    /// Base64 of the salted hash, set once at registration.
    pub password: String,
    /// Base64 of the per-account random salt.
    pub salt: String,
    pub active: bool,
    /// Unix seconds, set once at creation.
    pub created_at: i64,
    #[sqlx(flatten)]
    pub analysis: ViolationCounts,
}

/// Fields for a new account row. The id is assigned by the repository.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub login: String,
    pub email: String,
    pub password: String,
    pub salt: String,
    pub active: bool,
    pub created_at: i64,
}

/// Credential-free projection of an account returned to callers.
#[derive(ToSchema, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct UserView {
    pub id: Uuid,
    pub login: String,
    pub email: String,
    pub active: bool,
    pub created_at: i64,
}

impl From<Account> for UserView {
    fn from(account: Account) -> Self {
        Self {
            id: account.id,
            login: account.login,
            email: account.email,
            active: account.active,
            created_at: account.created_at,
        }
    }
}

/// Page of accounts plus the total count of active accounts.
#[derive(ToSchema, Serialize, Deserialize, Debug, Clone)]
pub struct UsersList {
    pub users: Vec<UserView>,
    pub count: i64,
}

/// Sortable columns for the list view. A closed set so the repository
/// never interpolates caller input into SQL.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortField {
    #[default]
    Id,
    Login,
    CreatedAt,
}

impl SortField {
    #[must_use]
    pub fn parse(field: Option<&str>) -> Self {
        match field {
            Some("login") => Self::Login,
            Some("created_at") => Self::CreatedAt,
            _ => Self::Id,
        }
    }

    #[must_use]
    pub const fn column(self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::Login => "login",
            Self::CreatedAt => "created_at",
        }
    }
}

/// Paging and filtering for the account list view.
#[derive(Debug, Clone)]
pub struct FindAllParams {
    pub skip: i64,
    pub limit: i64,
    pub sort_field: SortField,
    pub ascending: bool,
    /// Substring filter on login; empty means no filter.
    pub login: String,
    pub exclude_ids: Vec<Uuid>,
}

impl Default for FindAllParams {
    fn default() -> Self {
        Self {
            skip: 0,
            limit: 2,
            sort_field: SortField::default(),
            ascending: true,
            login: String::new(),
            exclude_ids: Vec::new(),
        }
    }
}
