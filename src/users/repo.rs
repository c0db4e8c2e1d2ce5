//! Account persistence seam.
//!
//! The engine only ever talks to [`AccountRepository`]; production wiring
//! uses [`PgAccountRepository`], tests substitute an in-memory fake.
//! Methods return `impl Future + Send` so the trait stays free of any
//! async-runtime helper crates while remaining usable from axum handlers.

use crate::users::{
    error::RepoError,
    models::{Account, FindAllParams, NewAccount, ViolationCounts},
};
use sqlx::PgPool;
use std::future::Future;
use uuid::Uuid;

/// Durable store of account records.
pub trait AccountRepository: Send + Sync {
    /// Look up an account by its unique login.
    fn find_by_login(
        &self,
        login: &str,
    ) -> impl Future<Output = Result<Option<Account>, RepoError>> + Send;

    /// Look up an account by id regardless of its active flag.
    fn find_by_id(
        &self,
        id: Uuid,
    ) -> impl Future<Output = Result<Option<Account>, RepoError>> + Send;

    /// Look up an account by id, restricted to active accounts.
    fn find_active_by_id(
        &self,
        id: Uuid,
    ) -> impl Future<Output = Result<Option<Account>, RepoError>> + Send;

    /// Page through active accounts; returns the page and the total number
    /// of active accounts.
    fn find_all(
        &self,
        params: &FindAllParams,
    ) -> impl Future<Output = Result<(Vec<Account>, i64), RepoError>> + Send;

    /// Active accounts among the given ids.
    fn find_by_ids(
        &self,
        ids: &[Uuid],
    ) -> impl Future<Output = Result<Vec<Account>, RepoError>> + Send;

    /// Insert a new account, assigning its id. A unique-constraint
    /// violation surfaces as [`RepoError::Duplicate`].
    fn insert(
        &self,
        account: NewAccount,
    ) -> impl Future<Output = Result<Account, RepoError>> + Send;

    /// Fold one event's increments into the account's counters and, when
    /// the post-increment toxic + spam score strictly exceeds
    /// `violation_limit`, deactivate the account, all as one per-record
    /// update. The increments and the threshold check both apply against
    /// the stored values, so racing events for the same account never
    /// lose counts, and the active flag can only ever be forced to false.
    fn apply_analysis(
        &self,
        id: Uuid,
        increments: &ViolationCounts,
        violation_limit: i64,
    ) -> impl Future<Output = Result<(), RepoError>> + Send;
}

/// Postgres-backed account repository.
#[derive(Clone)]
pub struct PgAccountRepository {
    pool: PgPool,
}

impl PgAccountRepository {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl AccountRepository for PgAccountRepository {
    async fn find_by_login(&self, login: &str) -> Result<Option<Account>, RepoError> {
        let account = sqlx::query_as::<_, Account>("SELECT * FROM accounts WHERE login = $1")
            .bind(login)
            .fetch_optional(&self.pool)
            .await?;
        Ok(account)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Account>, RepoError> {
        let account = sqlx::query_as::<_, Account>("SELECT * FROM accounts WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(account)
    }

    async fn find_active_by_id(&self, id: Uuid) -> Result<Option<Account>, RepoError> {
        let account =
            sqlx::query_as::<_, Account>("SELECT * FROM accounts WHERE id = $1 AND active")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(account)
    }

    async fn find_all(&self, params: &FindAllParams) -> Result<(Vec<Account>, i64), RepoError> {
        // Sort column comes from a closed enum, never from caller input.
        let order = if params.ascending { "ASC" } else { "DESC" };
        let query = format!(
            r"
            SELECT * FROM accounts
            WHERE active
              AND ($1 = '' OR login ILIKE '%' || $1 || '%')
              AND id != ALL($2)
            ORDER BY {} {order}
            OFFSET $3 LIMIT $4
            ",
            params.sort_field.column()
        );

        let users = sqlx::query_as::<_, Account>(&query)
            .bind(&params.login)
            .bind(&params.exclude_ids)
            .bind(params.skip)
            .bind(params.limit)
            .fetch_all(&self.pool)
            .await?;

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM accounts WHERE active")
            .fetch_one(&self.pool)
            .await?;

        Ok((users, count))
    }

    async fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Account>, RepoError> {
        let users =
            sqlx::query_as::<_, Account>("SELECT * FROM accounts WHERE active AND id = ANY($1)")
                .bind(ids)
                .fetch_all(&self.pool)
                .await?;
        Ok(users)
    }

    async fn insert(&self, account: NewAccount) -> Result<Account, RepoError> {
        let inserted = sqlx::query_as::<_, Account>(
            r"
            INSERT INTO accounts (id, login, email, password, salt, active, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            ",
        )
        .bind(Uuid::new_v4())
        .bind(&account.login)
        .bind(&account.email)
        .bind(&account.password)
        .bind(&account.salt)
        .bind(account.active)
        .bind(account.created_at)
        .fetch_one(&self.pool)
        .await?;
        Ok(inserted)
    }

    async fn apply_analysis(
        &self,
        id: Uuid,
        increments: &ViolationCounts,
        violation_limit: i64,
    ) -> Result<(), RepoError> {
        // Single-statement read-modify-write. Column references on the
        // right-hand side are the pre-update values, so `toxic + $3 +
        // spam + $2` is the post-increment score and concurrent events
        // for the same account serialize on the row without losing
        // increments.
        sqlx::query(
            r"
            UPDATE accounts SET
                spam = spam + $2,
                toxic = toxic + $3,
                severe_toxic = severe_toxic + $4,
                obscene = obscene + $5,
                threat = threat + $6,
                insult = insult + $7,
                identity_hate = identity_hate + $8,
                active = active AND (toxic + $3 + spam + $2 <= $9)
            WHERE id = $1
            ",
        )
        .bind(id)
        .bind(increments.spam)
        .bind(increments.toxic)
        .bind(increments.severe_toxic)
        .bind(increments.obscene)
        .bind(increments.threat)
        .bind(increments.insult)
        .bind(increments.identity_hate)
        .bind(violation_limit)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
