use crate::tutela::{handlers::error_response, AppService};
use crate::users::models::MessageAnalysis;
use axum::{extract::Extension, http::StatusCode, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::instrument;
use utoipa::ToSchema;
use uuid::Uuid;

/// One content-moderation result from the analysis feed.
#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct AnalysisEvent {
    id: Uuid,
    analysis: MessageAnalysis,
}

#[utoipa::path(
    post,
    path = "/users/analysis",
    request_body = AnalysisEvent,
    responses (
        (status = 202, description = "Event recorded (or skipped for an unknown account)"),
    ),
    tag = "analysis"
)]
// axum handler for the analysis feed delivery point
#[instrument(skip_all)]
pub async fn receive_analysis(
    service: Extension<Arc<AppService>>,
    payload: Option<Json<AnalysisEvent>>,
) -> impl IntoResponse {
    let Some(Json(event)) = payload else {
        return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response();
    };

    match service.record_analysis(event.id, &event.analysis).await {
        Ok(()) => StatusCode::ACCEPTED.into_response(),
        Err(err) => error_response(&err),
    }
}
