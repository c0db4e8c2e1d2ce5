//! Engine tests against in-memory fakes.
//!
//! The fakes implement the same seams production wiring uses, so the
//! login sequence, registration, and the violation policy run here
//! exactly as they do against Postgres.

use crate::users::{
    credential,
    error::{RepoError, UserError},
    models::{Account, FindAllParams, MessageAnalysis, NewAccount, SortField, ViolationCounts},
    policy::PolicyConfig,
    repo::AccountRepository,
    service::UserService,
};
use secrecy::SecretString;
use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicI64, AtomicUsize, Ordering},
        Arc, Mutex,
    },
};
use uuid::Uuid;

#[derive(Default, Clone)]
struct MemoryRepo {
    accounts: Arc<Mutex<HashMap<Uuid, Account>>>,
    login_lookups: Arc<AtomicUsize>,
    updates: Arc<AtomicUsize>,
}

impl MemoryRepo {
    fn seed(&self, login: &str, password: &str, active: bool) -> Uuid {
        let (hash, salt) = credential::generate(&secret(password)).unwrap();
        let id = Uuid::new_v4();
        let account = Account {
            id,
            login: login.to_string(),
            email: format!("{login}@example.com"),
            password: hash,
            salt,
            active,
            created_at: 1_700_000_000,
            analysis: ViolationCounts::default(),
        };
        self.accounts.lock().unwrap().insert(id, account);
        id
    }

    fn get(&self, id: Uuid) -> Account {
        self.accounts.lock().unwrap().get(&id).cloned().unwrap()
    }
}

impl AccountRepository for MemoryRepo {
    async fn find_by_login(&self, login: &str) -> Result<Option<Account>, RepoError> {
        self.login_lookups.fetch_add(1, Ordering::SeqCst);
        let accounts = self.accounts.lock().unwrap();
        Ok(accounts.values().find(|a| a.login == login).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Account>, RepoError> {
        Ok(self.accounts.lock().unwrap().get(&id).cloned())
    }

    async fn find_active_by_id(&self, id: Uuid) -> Result<Option<Account>, RepoError> {
        let accounts = self.accounts.lock().unwrap();
        Ok(accounts.get(&id).filter(|a| a.active).cloned())
    }

    async fn find_all(&self, params: &FindAllParams) -> Result<(Vec<Account>, i64), RepoError> {
        let accounts = self.accounts.lock().unwrap();
        let total = i64::try_from(accounts.values().filter(|a| a.active).count()).unwrap();

        let mut page: Vec<Account> = accounts
            .values()
            .filter(|a| a.active)
            .filter(|a| params.login.is_empty() || a.login.contains(&params.login))
            .filter(|a| !params.exclude_ids.contains(&a.id))
            .cloned()
            .collect();
        page.sort_by(|a, b| match params.sort_field {
            SortField::Id => a.id.cmp(&b.id),
            SortField::Login => a.login.cmp(&b.login),
            SortField::CreatedAt => a.created_at.cmp(&b.created_at),
        });
        if !params.ascending {
            page.reverse();
        }

        let page = page
            .into_iter()
            .skip(usize::try_from(params.skip).unwrap_or(0))
            .take(usize::try_from(params.limit).unwrap_or(0))
            .collect();
        Ok((page, total))
    }

    async fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Account>, RepoError> {
        let accounts = self.accounts.lock().unwrap();
        Ok(accounts
            .values()
            .filter(|a| a.active && ids.contains(&a.id))
            .cloned()
            .collect())
    }

    async fn insert(&self, account: NewAccount) -> Result<Account, RepoError> {
        let mut accounts = self.accounts.lock().unwrap();
        if accounts.values().any(|a| a.login == account.login) {
            return Err(RepoError::Duplicate);
        }
        let stored = Account {
            id: Uuid::new_v4(),
            login: account.login,
            email: account.email,
            password: account.password,
            salt: account.salt,
            active: account.active,
            created_at: account.created_at,
            analysis: ViolationCounts::default(),
        };
        accounts.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn apply_analysis(
        &self,
        id: Uuid,
        increments: &ViolationCounts,
        violation_limit: i64,
    ) -> Result<(), RepoError> {
        self.updates.fetch_add(1, Ordering::SeqCst);
        let mut accounts = self.accounts.lock().unwrap();
        if let Some(account) = accounts.get_mut(&id) {
            // Same contract as the SQL update: increments and the
            // threshold check run against the stored values.
            account.analysis = account.analysis.add(increments);
            if account.analysis.violation_score() > violation_limit {
                account.active = false;
            }
        }
        Ok(())
    }
}

/// Serves every `find_by_id` from the snapshot taken on the first call,
/// imitating events that all read the account before any update landed.
#[derive(Clone)]
struct StaleReadRepo {
    inner: MemoryRepo,
    snapshot: Arc<Mutex<Option<Account>>>,
}

impl StaleReadRepo {
    fn new(inner: MemoryRepo) -> Self {
        Self {
            inner,
            snapshot: Arc::new(Mutex::new(None)),
        }
    }
}

impl AccountRepository for StaleReadRepo {
    async fn find_by_login(&self, login: &str) -> Result<Option<Account>, RepoError> {
        self.inner.find_by_login(login).await
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Account>, RepoError> {
        let mut snapshot = self.snapshot.lock().unwrap();
        if snapshot.is_none() {
            *snapshot = self.inner.accounts.lock().unwrap().get(&id).cloned();
        }
        Ok(snapshot.clone())
    }

    async fn find_active_by_id(&self, id: Uuid) -> Result<Option<Account>, RepoError> {
        self.inner.find_active_by_id(id).await
    }

    async fn find_all(&self, params: &FindAllParams) -> Result<(Vec<Account>, i64), RepoError> {
        self.inner.find_all(params).await
    }

    async fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Account>, RepoError> {
        self.inner.find_by_ids(ids).await
    }

    async fn insert(&self, account: NewAccount) -> Result<Account, RepoError> {
        self.inner.insert(account).await
    }

    async fn apply_analysis(
        &self,
        id: Uuid,
        increments: &ViolationCounts,
        violation_limit: i64,
    ) -> Result<(), RepoError> {
        self.inner.apply_analysis(id, increments, violation_limit).await
    }
}

/// Fixed threshold, but stored behind an atomic so tests can retune it
/// between calls and observe that the service re-reads it every time.
#[derive(Default, Clone)]
struct FakePolicy {
    limit: Arc<AtomicI64>,
}

impl FakePolicy {
    fn with_limit(limit: i64) -> Self {
        let policy = Self::default();
        policy.limit.store(limit, Ordering::SeqCst);
        policy
    }

    fn set_limit(&self, limit: i64) {
        self.limit.store(limit, Ordering::SeqCst);
    }
}

impl PolicyConfig for FakePolicy {
    fn violation_limit(&self) -> i64 {
        self.limit.load(Ordering::SeqCst)
    }
}

fn secret(s: &str) -> SecretString {
    SecretString::from(s.to_string())
}

fn service_with_limit(limit: i64) -> (UserService<MemoryRepo, FakePolicy>, MemoryRepo, FakePolicy) {
    let repo = MemoryRepo::default();
    let policy = FakePolicy::with_limit(limit);
    (
        UserService::new(repo.clone(), policy.clone()),
        repo,
        policy,
    )
}

fn toxic_spam() -> MessageAnalysis {
    MessageAnalysis {
        toxic: true,
        spam: true,
        ..MessageAnalysis::default()
    }
}

#[tokio::test]
async fn empty_login_fails_before_any_repository_call() {
    let (service, repo, _) = service_with_limit(10);

    let err = service.login("", &secret("whatever")).await.unwrap_err();

    assert!(matches!(err, UserError::NotFound));
    assert_eq!(repo.login_lookups.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn unknown_login_fails_not_found() {
    let (service, _, _) = service_with_limit(10);

    let err = service.login("ghost", &secret("pw")).await.unwrap_err();

    assert!(matches!(err, UserError::NotFound));
}

#[tokio::test]
async fn blocked_account_wins_over_credential_check() {
    let (service, repo, _) = service_with_limit(10);
    repo.seed("mallory", "right password", false);

    // Blocked is reported regardless of password correctness.
    let err = service
        .login("mallory", &secret("right password"))
        .await
        .unwrap_err();
    assert!(matches!(err, UserError::Blocked));

    let err = service
        .login("mallory", &secret("wrong password"))
        .await
        .unwrap_err();
    assert!(matches!(err, UserError::Blocked));
}

#[tokio::test]
async fn wrong_password_fails_invalid_credential() {
    let (service, repo, _) = service_with_limit(10);
    repo.seed("alice", "correct horse", true);

    let err = service
        .login("alice", &secret("battery staple"))
        .await
        .unwrap_err();

    assert!(matches!(err, UserError::InvalidCredential));
}

#[tokio::test]
async fn successful_login_returns_credential_free_view() {
    let (service, repo, _) = service_with_limit(10);
    let id = repo.seed("alice", "correct horse", true);

    let view = service
        .login("alice", &secret("correct horse"))
        .await
        .unwrap();

    assert_eq!(view.id, id);
    assert_eq!(view.login, "alice");
    assert_eq!(view.email, "alice@example.com");
    assert!(view.active);

    let value = serde_json::to_value(&view).unwrap();
    let object = value.as_object().unwrap();
    assert!(!object.contains_key("password"));
    assert!(!object.contains_key("salt"));
    assert!(!object.contains_key("analysis"));
}

#[tokio::test]
async fn registration_persists_active_account_with_zeroed_counters() {
    let (service, repo, _) = service_with_limit(10);

    let view = service
        .registration("bob", "bob@example.com", &secret("hunter2"))
        .await
        .unwrap();

    let stored = repo.get(view.id);
    assert!(stored.active);
    assert_eq!(stored.analysis, ViolationCounts::default());
    assert!(stored.created_at > 0);
    // Only derived material is at rest, never the plaintext.
    assert_ne!(stored.password, "hunter2");
    assert!(!stored.salt.is_empty());
    assert!(credential::verify(
        &secret("hunter2"),
        &stored.salt,
        &stored.password
    ));
}

#[tokio::test]
async fn duplicate_login_fails_duplicate_account() {
    let (service, repo, _) = service_with_limit(10);
    repo.seed("bob", "pw", true);

    let err = service
        .registration("bob", "other@example.com", &secret("pw2"))
        .await
        .unwrap_err();

    assert!(matches!(err, UserError::DuplicateAccount));
}

#[tokio::test]
async fn empty_password_registration_is_rejected() {
    let (service, _, _) = service_with_limit(10);

    let err = service
        .registration("carol", "carol@example.com", &secret(""))
        .await
        .unwrap_err();

    assert!(matches!(err, UserError::Credential(_)));
}

#[tokio::test]
async fn analysis_accumulates_and_deactivates_past_limit() {
    let (service, repo, _) = service_with_limit(2);
    let id = repo.seed("dave", "pw", true);

    // First event: toxic=1, spam=1, score 2 == limit, still active.
    service.record_analysis(id, &toxic_spam()).await.unwrap();
    let account = repo.get(id);
    assert_eq!(account.analysis.toxic, 1);
    assert_eq!(account.analysis.spam, 1);
    assert!(account.active);

    // Second identical event: score 4 > 2, deactivated in the same update.
    service.record_analysis(id, &toxic_spam()).await.unwrap();
    let account = repo.get(id);
    assert_eq!(account.analysis.toxic, 2);
    assert_eq!(account.analysis.spam, 2);
    assert!(!account.active);
}

#[tokio::test]
async fn score_one_over_limit_deactivates() {
    let (service, repo, _) = service_with_limit(2);
    let id = repo.seed("erin", "pw", true);

    service.record_analysis(id, &toxic_spam()).await.unwrap();
    assert!(repo.get(id).active, "score equal to the limit must not deactivate");

    let toxic_only = MessageAnalysis {
        toxic: true,
        ..MessageAnalysis::default()
    };
    service.record_analysis(id, &toxic_only).await.unwrap();
    assert!(!repo.get(id).active, "score of limit + 1 must deactivate");
}

#[tokio::test]
async fn inert_categories_never_deactivate() {
    let (service, repo, _) = service_with_limit(0);
    let id = repo.seed("frank", "pw", true);

    let inert = MessageAnalysis {
        severe_toxic: true,
        obscene: true,
        threat: true,
        insult: true,
        identity_hate: true,
        ..MessageAnalysis::default()
    };

    for _ in 0..5 {
        service.record_analysis(id, &inert).await.unwrap();
    }

    let account = repo.get(id);
    assert_eq!(account.analysis.threat, 5);
    assert_eq!(account.analysis.identity_hate, 5);
    assert!(account.active, "only toxic and spam drive deactivation");
}

#[tokio::test]
async fn unknown_account_analysis_is_a_silent_noop() {
    let (service, repo, _) = service_with_limit(2);

    service
        .record_analysis(Uuid::new_v4(), &toxic_spam())
        .await
        .unwrap();

    assert_eq!(repo.updates.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn deactivated_account_keeps_accumulating() {
    let (service, repo, _) = service_with_limit(0);
    let id = repo.seed("grace", "pw", false);

    service.record_analysis(id, &toxic_spam()).await.unwrap();

    let account = repo.get(id);
    assert_eq!(account.analysis.toxic, 1);
    assert!(!account.active);
}

#[tokio::test]
async fn stale_reads_never_lose_counter_increments() {
    let repo = MemoryRepo::default();
    let id = repo.seed("oscar", "pw", true);
    let service = UserService::new(StaleReadRepo::new(repo.clone()), FakePolicy::with_limit(2));

    // Both events observe the account before either update lands, as two
    // racing deliveries would. The store still has to count both.
    service.record_analysis(id, &toxic_spam()).await.unwrap();
    service.record_analysis(id, &toxic_spam()).await.unwrap();

    let account = repo.get(id);
    assert_eq!(account.analysis.toxic, 2);
    assert_eq!(account.analysis.spam, 2);
    assert!(!account.active, "post-increment score of 4 must deactivate");
}

#[tokio::test]
async fn violation_limit_is_reread_on_every_event() {
    let (service, repo, policy) = service_with_limit(10);
    let id = repo.seed("heidi", "pw", true);

    service.record_analysis(id, &toxic_spam()).await.unwrap();
    assert!(repo.get(id).active);

    // Operator lowers the limit between two events.
    policy.set_limit(0);
    service.record_analysis(id, &toxic_spam()).await.unwrap();
    assert!(!repo.get(id).active);
}

#[tokio::test]
async fn find_by_id_only_returns_active_accounts() {
    let (service, repo, _) = service_with_limit(10);
    let active = repo.seed("ivan", "pw", true);
    let blocked = repo.seed("judy", "pw", false);

    assert!(service.find_by_id(active).await.unwrap().is_some());
    assert!(service.find_by_id(blocked).await.unwrap().is_none());
}

#[tokio::test]
async fn find_all_pages_and_counts_active_accounts() {
    let (service, repo, _) = service_with_limit(10);
    repo.seed("amy", "pw", true);
    repo.seed("ben", "pw", true);
    let excluded = repo.seed("cleo", "pw", true);
    repo.seed("dora", "pw", false);

    let list = service
        .find_all(&FindAllParams {
            limit: 10,
            sort_field: SortField::Login,
            exclude_ids: vec![excluded],
            ..FindAllParams::default()
        })
        .await
        .unwrap();

    let logins: Vec<&str> = list.users.iter().map(|u| u.login.as_str()).collect();
    assert_eq!(logins, ["amy", "ben"]);
    // Count covers all active accounts, not just the returned page.
    assert_eq!(list.count, 3);
}

#[tokio::test]
async fn find_by_ids_returns_active_subset() {
    let (service, repo, _) = service_with_limit(10);
    let a = repo.seed("kim", "pw", true);
    let b = repo.seed("liam", "pw", false);

    let list = service.find_by_ids(&[a, b, Uuid::new_v4()]).await.unwrap();

    assert_eq!(list.count, 1);
    assert_eq!(list.users[0].id, a);
}
