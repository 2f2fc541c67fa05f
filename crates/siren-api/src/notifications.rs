// Notification dispatch HTTP routes (secondary channel)
//
// Used for low-stakes reminders, never the emergency path. Multiple open
// sessions for the same user each poll the pending list; claiming is
// first-wins and losers display nothing.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

use siren_storage::{Database, NotificationRow};

use crate::common::ListResponse;
use crate::error::ApiError;
use crate::services::NotificationService;

/// App state for notification routes
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<NotificationService>,
}

impl AppState {
    pub fn new(db: Arc<Database>) -> Self {
        Self {
            service: Arc::new(NotificationService::new(db)),
        }
    }
}

/// Create notification routes
pub fn routes(state: AppState) -> Router {
    Router::new()
        .route(
            "/v1/users/:user_id/notifications",
            post(push_notification).get(list_notifications),
        )
        .route("/v1/notifications/:id/claim", post(claim_notification))
        .with_state(state)
}

/// Push message for a specific user's open sessions
#[derive(Debug, Deserialize, ToSchema)]
pub struct PushNotificationRequest {
    pub title: String,
    pub body: String,
}

/// A pending notification
#[derive(Debug, Serialize, ToSchema)]
pub struct Notification {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

impl From<NotificationRow> for Notification {
    fn from(row: NotificationRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            title: row.title,
            body: row.body,
            created_at: row.created_at,
        }
    }
}

/// POST /v1/users/{user_id}/notifications - Push a notification
#[utoipa::path(
    post,
    path = "/v1/users/{user_id}/notifications",
    params(
        ("user_id" = Uuid, Path, description = "Target user ID")
    ),
    request_body = PushNotificationRequest,
    responses(
        (status = 201, description = "Notification queued", body = Notification),
        (status = 404, description = "Target user not found"),
        (status = 500, description = "Internal server error")
    ),
    tag = "notifications"
)]
pub async fn push_notification(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    Json(req): Json<PushNotificationRequest>,
) -> Result<(StatusCode, Json<Notification>), ApiError> {
    let row = state.service.push(user_id, req.title, req.body).await?;
    Ok((StatusCode::CREATED, Json(row.into())))
}

/// GET /v1/users/{user_id}/notifications - Pending notifications
#[utoipa::path(
    get,
    path = "/v1/users/{user_id}/notifications",
    params(
        ("user_id" = Uuid, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "Pending notifications", body = ListResponse<Notification>),
        (status = 500, description = "Internal server error")
    ),
    tag = "notifications"
)]
pub async fn list_notifications(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<ListResponse<Notification>>, ApiError> {
    let rows = state.service.pending(user_id).await?;
    Ok(Json(ListResponse::new(
        rows.into_iter().map(Notification::from).collect(),
    )))
}

/// POST /v1/notifications/{id}/claim - Claim a notification for display
///
/// Atomic first-wins: exactly one session receives 200 with the payload,
/// every other concurrent claimer receives 404 and displays nothing.
#[utoipa::path(
    post,
    path = "/v1/notifications/{id}/claim",
    params(
        ("id" = Uuid, Path, description = "Notification ID")
    ),
    responses(
        (status = 200, description = "Claimed; display this payload", body = Notification),
        (status = 404, description = "Already claimed by another session"),
        (status = 500, description = "Internal server error")
    ),
    tag = "notifications"
)]
pub async fn claim_notification(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Notification>, ApiError> {
    match state.service.claim(id).await? {
        Some(row) => Ok(Json(row.into())),
        None => Err(ApiError(siren_core::SirenError::NotificationClaimed(id))),
    }
}
