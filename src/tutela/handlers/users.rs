use crate::tutela::{handlers::error_response, AppService};
use crate::users::models::{FindAllParams, SortField, UserView, UsersList};
use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::instrument;
use utoipa::IntoParams;
use uuid::Uuid;

#[derive(Deserialize, IntoParams, Debug)]
pub struct FindAllQuery {
    skip: Option<i64>,
    limit: Option<i64>,
    sort_field: Option<String>,
    sort_asc: Option<String>,
    login: Option<String>,
    /// Comma-separated account ids to leave out of the page.
    exclude_ids: Option<String>,
}

#[derive(Deserialize, IntoParams, Debug)]
pub struct FindByIdsQuery {
    /// Comma-separated account ids.
    ids: Option<String>,
}

fn parse_ids(csv: Option<&str>) -> Result<Vec<Uuid>, String> {
    csv.map_or_else(
        || Ok(Vec::new()),
        |csv| {
            csv.split(',')
                .filter(|s| !s.is_empty())
                .map(|s| Uuid::parse_str(s.trim()).map_err(|_| format!("Invalid id: {s}")))
                .collect()
        },
    )
}

#[utoipa::path(
    get,
    path = "/users/find-one/{id}",
    params(("id" = Uuid, Path, description = "Account id")),
    responses (
        (status = 200, description = "Success", body = UserView, content_type = "application/json"),
        (status = 404, description = "No active account with this id"),
    ),
    tag = "users"
)]
// axum handler for a single active account
#[instrument(skip(service))]
pub async fn find_one(
    service: Extension<Arc<AppService>>,
    Path(id): Path<Uuid>,
) -> impl IntoResponse {
    match service.find_by_id(id).await {
        Ok(Some(user)) => (StatusCode::OK, Json(user)).into_response(),
        Ok(None) => (StatusCode::NOT_FOUND, "User not found".to_string()).into_response(),
        Err(err) => error_response(&err),
    }
}

#[utoipa::path(
    get,
    path = "/users/find-all",
    params(FindAllQuery),
    responses (
        (status = 200, description = "Success", body = UsersList, content_type = "application/json"),
    ),
    tag = "users"
)]
// axum handler for the paged list view
#[instrument(skip(service))]
pub async fn find_all(
    service: Extension<Arc<AppService>>,
    Query(query): Query<FindAllQuery>,
) -> impl IntoResponse {
    let exclude_ids = match parse_ids(query.exclude_ids.as_deref()) {
        Ok(ids) => ids,
        Err(err) => return (StatusCode::BAD_REQUEST, err).into_response(),
    };

    let defaults = FindAllParams::default();
    let params = FindAllParams {
        skip: query.skip.unwrap_or(defaults.skip),
        limit: query.limit.unwrap_or(defaults.limit),
        sort_field: SortField::parse(query.sort_field.as_deref()),
        ascending: query.sort_asc.as_deref() != Some("desc"),
        login: query.login.unwrap_or_default(),
        exclude_ids,
    };

    match service.find_all(&params).await {
        Ok(list) => (StatusCode::OK, Json(list)).into_response(),
        Err(err) => error_response(&err),
    }
}

#[utoipa::path(
    get,
    path = "/users/find-by-ids",
    params(FindByIdsQuery),
    responses (
        (status = 200, description = "Success", body = UsersList, content_type = "application/json"),
    ),
    tag = "users"
)]
// axum handler for a batch of accounts by id
#[instrument(skip(service))]
pub async fn find_by_ids(
    service: Extension<Arc<AppService>>,
    Query(query): Query<FindByIdsQuery>,
) -> impl IntoResponse {
    let ids = match parse_ids(query.ids.as_deref()) {
        Ok(ids) => ids,
        Err(err) => return (StatusCode::BAD_REQUEST, err).into_response(),
    };

    match service.find_by_ids(&ids).await {
        Ok(list) => (StatusCode::OK, Json(list)).into_response(),
        Err(err) => error_response(&err),
    }
}
