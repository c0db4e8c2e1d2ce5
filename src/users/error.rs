use thiserror::Error;

/// Failures from the credential codec.
#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("empty password")]
    EmptyPassword,
    #[error("hash error")]
    Hash,
}

/// Failures from an account repository.
#[derive(Debug, Error)]
pub enum RepoError {
    /// A unique constraint (login) was violated on insert.
    #[error("duplicate key")]
    Duplicate,
    #[error("storage error: {0}")]
    Storage(anyhow::Error),
}

/// Failures surfaced by the user service to its callers.
///
/// Every kind is distinguishable; the HTTP layer maps them to the
/// user-facing messages without inspecting causes.
#[derive(Debug, Error)]
pub enum UserError {
    /// Unknown login or id, including an empty login identifier.
    #[error("user not found")]
    NotFound,
    /// The account exists but is deactivated. Reported at login time
    /// before the credential is checked.
    #[error("user blocked")]
    Blocked,
    #[error("password invalid")]
    InvalidCredential,
    #[error("duplicate user")]
    DuplicateAccount,
    #[error("credential error: {0}")]
    Credential(#[from] CredentialError),
    #[error("storage error: {0}")]
    Storage(anyhow::Error),
}

impl From<RepoError> for UserError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::Duplicate => Self::DuplicateAccount,
            RepoError::Storage(err) => Self::Storage(err),
        }
    }
}

impl From<sqlx::Error> for RepoError {
    fn from(err: sqlx::Error) -> Self {
        if err
            .as_database_error()
            .is_some_and(|db| db.is_unique_violation())
        {
            Self::Duplicate
        } else {
            Self::Storage(err.into())
        }
    }
}
