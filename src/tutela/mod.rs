use crate::users::{policy::EnvPolicyConfig, repo::PgAccountRepository, service::UserService};
use anyhow::{Context, Result};
use axum::{
    routing::{get, post},
    Extension, Router,
};
use sqlx::postgres::PgPoolOptions;
use std::{sync::Arc, time::Duration};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;

pub mod handlers;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

/// Production service wiring: Postgres-backed repository, env-backed policy.
pub type AppService = UserService<PgAccountRepository, EnvPolicyConfig>;

/// Build the application router.
pub fn router(service: Arc<AppService>) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/users/login", post(handlers::login))
        .route("/users/registration", post(handlers::register))
        .route("/users/find-one/:id", get(handlers::find_one))
        .route("/users/find-all", get(handlers::find_all))
        .route("/users/find-by-ids", get(handlers::find_by_ids))
        .route("/users/analysis", post(handlers::receive_analysis))
        .layer(TraceLayer::new_for_http())
        .layer(Extension(service))
}

/// Start the server
/// # Errors
/// Return error if failed to start the server
pub async fn new(port: u16, dsn: String, violation_limit: i64) -> Result<()> {
    let pool = PgPoolOptions::new()
        .min_connections(1)
        .max_connections(5)
        .max_lifetime(Duration::from_secs(60 * 2))
        .test_before_acquire(true)
        .connect(&dsn)
        .await
        .context("Failed to connect to database")?;

    let repo = PgAccountRepository::new(pool);
    let service = Arc::new(UserService::new(
        repo,
        EnvPolicyConfig::new(violation_limit),
    ));

    let listener = TcpListener::bind(format!("::0:{port}")).await?;

    info!("listening on port {port}");

    axum::serve(listener, router(service).into_make_service()).await?;

    Ok(())
}
