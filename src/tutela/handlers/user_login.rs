use crate::tutela::{handlers::error_response, AppService};
use crate::users::models::UserView;
use axum::{extract::Extension, http::StatusCode, response::IntoResponse, Json};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::instrument;
use utoipa::ToSchema;

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct Login {
    login: String,
    password: String,
}

#[utoipa::path(
    post,
    path = "/users/login",
    request_body = Login,
    responses (
        (status = 200, description = "Login successful", body = UserView, content_type = "application/json"),
        (status = 400, description = "Unknown user, blocked user or invalid password"),
    ),
    tag = "authorization"
)]
// axum handler for login
#[instrument(skip_all)]
pub async fn login(
    service: Extension<Arc<AppService>>,
    payload: Option<Json<Login>>,
) -> impl IntoResponse {
    let Some(Json(payload)) = payload else {
        return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response();
    };

    let password = SecretString::from(payload.password);

    match service.login(&payload.login, &password).await {
        Ok(user) => (StatusCode::OK, Json(user)).into_response(),
        Err(err) => error_response(&err),
    }
}
