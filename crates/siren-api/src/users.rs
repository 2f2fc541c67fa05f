// User profile HTTP routes

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

use siren_core::{Role, SirenError};
use siren_storage::{CreateUser, Database, UpdateUser, UserRow};

use crate::error::ApiError;

/// App state for user routes
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Database>,
}

impl AppState {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }
}

/// Create user routes
pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/v1/users", post(create_user))
        .route("/v1/users/:user_id", get(get_user).patch(update_user))
        .with_state(state)
}

/// Public profile DTO
#[derive(Debug, Serialize, ToSchema)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub bay_name: String,
    pub seat_number: String,
    pub wifi_name: String,
    pub avatar_url: Option<String>,
    pub break_reminders_enabled: bool,
    pub reminder_interval_secs: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = SirenError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let role: Role = row
            .role
            .parse()
            .map_err(|e: String| SirenError::store(format!("corrupt role: {e}")))?;
        Ok(Self {
            id: row.id,
            name: row.name,
            email: row.email,
            role,
            bay_name: row.bay_name,
            seat_number: row.seat_number,
            wifi_name: row.wifi_name,
            avatar_url: row.avatar_url,
            break_reminders_enabled: row.break_reminders_enabled,
            reminder_interval_secs: row.reminder_interval_secs,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateUserRequest {
    pub name: String,
    pub email: String,
    pub role: Role,
    #[serde(default)]
    pub bay_name: String,
    #[serde(default)]
    pub seat_number: String,
    #[serde(default)]
    pub wifi_name: String,
    pub avatar_url: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateUserRequest {
    pub name: Option<String>,
    pub bay_name: Option<String>,
    pub seat_number: Option<String>,
    pub wifi_name: Option<String>,
    pub avatar_url: Option<String>,
    /// Opt in or out of break reminders
    pub break_reminders_enabled: Option<bool>,
    /// Reminder cadence in seconds
    pub reminder_interval_secs: Option<i32>,
}

/// POST /v1/users - Create a profile
#[utoipa::path(
    post,
    path = "/v1/users",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "User created", body = User),
        (status = 500, description = "Internal server error")
    ),
    tag = "users"
)]
pub async fn create_user(
    State(state): State<AppState>,
    Json(req): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<User>), ApiError> {
    let row = state
        .db
        .create_user(CreateUser {
            name: req.name,
            email: req.email,
            role: req.role.as_str().to_string(),
            bay_name: req.bay_name,
            seat_number: req.seat_number,
            wifi_name: req.wifi_name,
            avatar_url: req.avatar_url,
        })
        .await
        .map_err(|e| SirenError::store(e.to_string()))?;

    Ok((StatusCode::CREATED, Json(row.try_into()?)))
}

/// GET /v1/users/{user_id} - Get a profile
///
/// A missing profile after authentication is fatal for the session: the
/// client must sign the user out rather than operate on a partial profile.
#[utoipa::path(
    get,
    path = "/v1/users/{user_id}",
    params(
        ("user_id" = Uuid, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "User found", body = User),
        (status = 404, description = "User not found"),
        (status = 500, description = "Internal server error")
    ),
    tag = "users"
)]
pub async fn get_user(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<User>, ApiError> {
    let row = state
        .db
        .get_user(user_id)
        .await
        .map_err(|e| SirenError::store(e.to_string()))?
        .ok_or(SirenError::UserNotFound(user_id))?;

    Ok(Json(row.try_into()?))
}

/// PATCH /v1/users/{user_id} - Update a profile
#[utoipa::path(
    patch,
    path = "/v1/users/{user_id}",
    params(
        ("user_id" = Uuid, Path, description = "User ID")
    ),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "User updated", body = User),
        (status = 404, description = "User not found"),
        (status = 500, description = "Internal server error")
    ),
    tag = "users"
)]
pub async fn update_user(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    Json(req): Json<UpdateUserRequest>,
) -> Result<Json<User>, ApiError> {
    let row = state
        .db
        .update_user(
            user_id,
            UpdateUser {
                name: req.name,
                bay_name: req.bay_name,
                seat_number: req.seat_number,
                wifi_name: req.wifi_name,
                avatar_url: req.avatar_url,
                break_reminders_enabled: req.break_reminders_enabled,
                reminder_interval_secs: req.reminder_interval_secs,
            },
        )
        .await
        .map_err(|e| SirenError::store(e.to_string()))?
        .ok_or(SirenError::UserNotFound(user_id))?;

    Ok(Json(row.try_into()?))
}
