// Medical history HTTP routes
//
// The document is owned by its user and read by the summarizer at
// alert-creation time. Route-level ownership checks are a UX convenience
// only; the store has no row ACLs (documented limitation).

use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use std::sync::Arc;
use uuid::Uuid;

use siren_core::MedicalHistory;
use siren_storage::Database;

use crate::error::ApiError;
use crate::services::MedicalHistoryService;

/// App state for medical history routes
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<MedicalHistoryService>,
}

impl AppState {
    pub fn new(db: Arc<Database>) -> Self {
        Self {
            service: Arc::new(MedicalHistoryService::new(db)),
        }
    }
}

/// Create medical history routes
pub fn routes(state: AppState) -> Router {
    Router::new()
        .route(
            "/v1/users/:user_id/medical-history",
            get(get_history).put(replace_history),
        )
        .with_state(state)
}

/// GET /v1/users/{user_id}/medical-history - Read the history document
///
/// A user with no saved history gets an empty document, not a 404.
#[utoipa::path(
    get,
    path = "/v1/users/{user_id}/medical-history",
    params(
        ("user_id" = Uuid, Path, description = "Owning user ID")
    ),
    responses(
        (status = 200, description = "Medical history document", body = MedicalHistory),
        (status = 404, description = "User not found"),
        (status = 500, description = "Internal server error")
    ),
    tag = "medical-history"
)]
pub async fn get_history(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<MedicalHistory>, ApiError> {
    let history = state.service.get(user_id).await?;
    Ok(Json(history))
}

/// PUT /v1/users/{user_id}/medical-history - Replace the history document
///
/// Whole-document replacement, last write wins.
#[utoipa::path(
    put,
    path = "/v1/users/{user_id}/medical-history",
    params(
        ("user_id" = Uuid, Path, description = "Owning user ID")
    ),
    request_body = MedicalHistory,
    responses(
        (status = 200, description = "History replaced", body = MedicalHistory),
        (status = 404, description = "User not found"),
        (status = 500, description = "Internal server error")
    ),
    tag = "medical-history"
)]
pub async fn replace_history(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    Json(history): Json<MedicalHistory>,
) -> Result<Json<MedicalHistory>, ApiError> {
    let saved = state.service.replace(user_id, history).await?;
    Ok(Json(saved))
}
