//! The engine itself: login, registration, lookups, and the violation
//! policy that converts analysis events into counters and deactivation.

use crate::users::{
    credential,
    error::UserError,
    models::{FindAllParams, MessageAnalysis, NewAccount, UserView, UsersList},
    policy::PolicyConfig,
    repo::AccountRepository,
};
use secrecy::SecretString;
use tracing::{debug, info};
use uuid::Uuid;

/// Credential & violation-policy engine over an injected account store
/// and policy configuration.
#[derive(Clone)]
pub struct UserService<R, C> {
    repo: R,
    policy: C,
}

impl<R, C> UserService<R, C>
where
    R: AccountRepository,
    C: PolicyConfig,
{
    #[must_use]
    pub fn new(repo: R, policy: C) -> Self {
        Self { repo, policy }
    }

    /// Authenticate a user by login and password.
    ///
    /// The checks run in a fixed order and each one short-circuits:
    /// empty or unknown login, then the active flag, then the credential.
    /// The active check deliberately precedes the credential check, so a
    /// blocked account answers "user blocked" even to a wrong password.
    /// Callers rely on that ordering; do not reorder it.
    ///
    /// # Errors
    ///
    /// [`UserError::NotFound`], [`UserError::Blocked`] or
    /// [`UserError::InvalidCredential`] per the sequence above, and
    /// [`UserError::Storage`] for repository failures.
    pub async fn login(
        &self,
        login: &str,
        password: &SecretString,
    ) -> Result<UserView, UserError> {
        if login.is_empty() {
            return Err(UserError::NotFound);
        }

        let account = self
            .repo
            .find_by_login(login)
            .await?
            .ok_or(UserError::NotFound)?;

        if !account.active {
            return Err(UserError::Blocked);
        }

        if !credential::verify(password, &account.salt, &account.password) {
            return Err(UserError::InvalidCredential);
        }

        Ok(account.into())
    }

    /// Register a new account bound to a freshly derived credential.
    ///
    /// Password/confirmation equality is the transport layer's concern and
    /// is not re-checked here.
    ///
    /// # Errors
    ///
    /// [`UserError::DuplicateAccount`] when the login is already taken,
    /// [`UserError::Credential`] for an empty password, and
    /// [`UserError::Storage`] for repository failures.
    pub async fn registration(
        &self,
        login: &str,
        email: &str,
        password: &SecretString,
    ) -> Result<UserView, UserError> {
        let (hash, salt) = credential::generate(password)?;

        let account = self
            .repo
            .insert(NewAccount {
                login: login.to_string(),
                email: email.to_string(),
                password: hash,
                salt,
                active: true,
                created_at: unix_now(),
            })
            .await?;

        info!(id = %account.id, "registered new account");

        Ok(account.into())
    }

    /// Active-account lookup by id.
    ///
    /// # Errors
    ///
    /// [`UserError::Storage`] for repository failures.
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<UserView>, UserError> {
        Ok(self.repo.find_active_by_id(id).await?.map(Into::into))
    }

    /// Paged list of active accounts.
    ///
    /// # Errors
    ///
    /// [`UserError::Storage`] for repository failures.
    pub async fn find_all(&self, params: &FindAllParams) -> Result<UsersList, UserError> {
        let (accounts, count) = self.repo.find_all(params).await?;
        Ok(UsersList {
            users: accounts.into_iter().map(Into::into).collect(),
            count,
        })
    }

    /// Active accounts among the given ids.
    ///
    /// # Errors
    ///
    /// [`UserError::Storage`] for repository failures.
    pub async fn find_by_ids(&self, ids: &[Uuid]) -> Result<UsersList, UserError> {
        let accounts = self.repo.find_by_ids(ids).await?;
        let count = i64::try_from(accounts.len()).unwrap_or(i64::MAX);
        Ok(UsersList {
            users: accounts.into_iter().map(Into::into).collect(),
            count,
        })
    }

    /// Fold one analysis event into the account's violation counters and
    /// deactivate the account once toxic + spam strictly exceeds the
    /// configured limit. Reaching the limit exactly does not deactivate.
    ///
    /// An id that no longer resolves is a silent skip: the feed is
    /// best-effort and may deliver late or duplicate events. Nothing is
    /// written in that case.
    ///
    /// The repository folds the increments in and re-checks the threshold
    /// against the stored values in one atomic update, so events racing on
    /// the same account never lose counts.
    ///
    /// # Errors
    ///
    /// [`UserError::Storage`] for repository failures.
    pub async fn record_analysis(
        &self,
        id: Uuid,
        analysis: &MessageAnalysis,
    ) -> Result<(), UserError> {
        let Some(account) = self.repo.find_by_id(id).await? else {
            debug!(%id, "analysis event for unknown account, skipping");
            return Ok(());
        };

        let limit = self.policy.violation_limit();

        // The score from this read is only for the log line; the
        // authoritative decision happens inside the repository update.
        let counters = account.analysis.accumulate(analysis);
        if counters.violation_score() > limit && account.active {
            info!(
                %id,
                score = counters.violation_score(),
                limit,
                "violation limit exceeded, deactivating account"
            );
        }

        self.repo
            .apply_analysis(account.id, &analysis.increments(), limit)
            .await?;

        Ok(())
    }
}

fn unix_now() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|duration| i64::try_from(duration.as_secs()).unwrap_or(i64::MAX))
        .unwrap_or_default()
}
