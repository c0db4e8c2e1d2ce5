use crate::tutela::{
    handlers::{error_response, valid_email},
    AppService,
};
use crate::users::models::UserView;
use axum::{extract::Extension, http::StatusCode, response::IntoResponse, Json};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::instrument;
use utoipa::ToSchema;

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct Registration {
    login: String,
    email: String,
    password: String,
    password_confirm: String,
}

#[utoipa::path(
    post,
    path = "/users/registration",
    request_body = Registration,
    responses (
        (status = 200, description = "Registration successful", body = UserView, content_type = "application/json"),
        (status = 400, description = "Invalid input, mismatched confirmation, or a login already in use"),
    ),
    tag = "authorization"
)]
// axum handler for registration
#[instrument(skip_all)]
pub async fn register(
    service: Extension<Arc<AppService>>,
    payload: Option<Json<Registration>>,
) -> impl IntoResponse {
    let Some(Json(payload)) = payload else {
        return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response();
    };

    if !valid_email(&payload.email) {
        return (StatusCode::BAD_REQUEST, "Invalid email".to_string()).into_response();
    }

    // The engine assumes the confirmation was already checked here.
    if payload.password != payload.password_confirm {
        return (
            StatusCode::BAD_REQUEST,
            "Passwords do not match".to_string(),
        )
            .into_response();
    }

    let password = SecretString::from(payload.password);

    match service
        .registration(&payload.login, &payload.email, &password)
        .await
    {
        Ok(user) => (StatusCode::OK, Json(user)).into_response(),
        Err(err) => error_response(&err),
    }
}
