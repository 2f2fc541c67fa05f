// Alert CRUD + transition HTTP routes

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use siren_core::{Alert, AlertStatus, Role, Summarizer};
use siren_storage::Database;

use crate::common::ListResponse;
use crate::error::ApiError;
use crate::services::AlertService;

/// App state for alert routes
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<AlertService>,
}

impl AppState {
    pub fn new(db: Arc<Database>, summarizer: Option<Arc<dyn Summarizer>>) -> Self {
        Self {
            service: Arc::new(AlertService::new(db, summarizer)),
        }
    }
}

/// Create alert routes
pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/v1/alerts", post(submit_alert).get(list_alerts))
        .route("/v1/alerts/history", get(list_history))
        .route("/v1/alerts/:alert_id", get(get_alert))
        .route("/v1/alerts/:alert_id/status", post(transition_alert))
        .with_state(state)
}

/// Request to submit a new alert.
///
/// Location overrides are optional; the reporter's profile fills any field
/// left out. `with_summary` selects the gated flow: coordinates become
/// mandatory and the request fails outright if summarization fails.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct SubmitAlertRequest {
    /// Reporting user (must have a resolved profile)
    pub user_id: Uuid,
    /// Gate submission on a successful AI summary
    #[serde(default)]
    pub with_summary: bool,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub bay_name: Option<String>,
    pub seat_number: Option<String>,
    pub wifi_name: Option<String>,
}

/// Viewer role for list/feed endpoints
#[derive(Debug, Deserialize, IntoParams)]
pub struct RoleQuery {
    /// Role the response is projected for
    pub role: Role,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct HistoryQuery {
    pub role: Role,
    /// Maximum number of resolved alerts to return. Defaults to 100.
    #[param(example = 100)]
    pub limit: Option<i64>,
}

/// Request to move an alert's status forward
#[derive(Debug, Deserialize, ToSchema)]
pub struct TransitionRequest {
    pub status: AlertStatus,
    /// Staff member performing the action
    pub actor_id: Option<Uuid>,
}

/// Transition response. `changed` is false when the alert was already in
/// the requested state (idempotent no-op).
#[derive(Debug, Serialize, ToSchema)]
pub struct TransitionResponse {
    pub alert: Alert,
    pub changed: bool,
}

const DEFAULT_HISTORY_LIMIT: i64 = 100;
const MAX_HISTORY_LIMIT: i64 = 1000;

/// POST /v1/alerts - Submit a new emergency alert
#[utoipa::path(
    post,
    path = "/v1/alerts",
    request_body = SubmitAlertRequest,
    responses(
        (status = 201, description = "Alert created in status open", body = Alert),
        (status = 404, description = "Reporter profile not found"),
        (status = 422, description = "Gated flow without coordinates"),
        (status = 502, description = "Summarization failed, no alert written"),
        (status = 504, description = "Summarization timed out, no alert written"),
        (status = 500, description = "Internal server error")
    ),
    tag = "alerts"
)]
pub async fn submit_alert(
    State(state): State<AppState>,
    Json(req): Json<SubmitAlertRequest>,
) -> Result<(StatusCode, Json<Alert>), ApiError> {
    let alert = state.service.submit(req).await?;
    Ok((StatusCode::CREATED, Json(alert)))
}

/// GET /v1/alerts - Active alerts (open + acknowledged), newest first
#[utoipa::path(
    get,
    path = "/v1/alerts",
    params(RoleQuery),
    responses(
        (status = 200, description = "Active alerts projected for the role", body = ListResponse<Alert>),
        (status = 500, description = "Internal server error")
    ),
    tag = "alerts"
)]
pub async fn list_alerts(
    State(state): State<AppState>,
    Query(query): Query<RoleQuery>,
) -> Result<Json<ListResponse<Alert>>, ApiError> {
    let alerts = state.service.list_active(query.role).await?;
    Ok(Json(ListResponse::new(alerts)))
}

/// GET /v1/alerts/history - Resolved alerts, newest first
#[utoipa::path(
    get,
    path = "/v1/alerts/history",
    params(HistoryQuery),
    responses(
        (status = 200, description = "Resolved alerts projected for the role", body = ListResponse<Alert>),
        (status = 500, description = "Internal server error")
    ),
    tag = "alerts"
)]
pub async fn list_history(
    State(state): State<AppState>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<ListResponse<Alert>>, ApiError> {
    let limit = query
        .limit
        .unwrap_or(DEFAULT_HISTORY_LIMIT)
        .clamp(1, MAX_HISTORY_LIMIT);
    let alerts = state.service.list_history(query.role, limit).await?;
    Ok(Json(ListResponse::new(alerts)))
}

/// GET /v1/alerts/{alert_id} - Get one alert by ID
#[utoipa::path(
    get,
    path = "/v1/alerts/{alert_id}",
    params(
        ("alert_id" = Uuid, Path, description = "Alert ID"),
        RoleQuery
    ),
    responses(
        (status = 200, description = "Alert found", body = Alert),
        (status = 404, description = "Alert not found"),
        (status = 500, description = "Internal server error")
    ),
    tag = "alerts"
)]
pub async fn get_alert(
    State(state): State<AppState>,
    Path(alert_id): Path<Uuid>,
    Query(query): Query<RoleQuery>,
) -> Result<Json<Alert>, ApiError> {
    let alert = state.service.get(alert_id, query.role).await?;
    Ok(Json(alert))
}

/// POST /v1/alerts/{alert_id}/status - Move an alert's status forward
#[utoipa::path(
    post,
    path = "/v1/alerts/{alert_id}/status",
    params(
        ("alert_id" = Uuid, Path, description = "Alert ID")
    ),
    request_body = TransitionRequest,
    responses(
        (status = 200, description = "Transition applied or idempotent no-op", body = TransitionResponse),
        (status = 404, description = "Alert not found"),
        (status = 409, description = "Backward or skip transition rejected"),
        (status = 500, description = "Internal server error")
    ),
    tag = "alerts"
)]
pub async fn transition_alert(
    State(state): State<AppState>,
    Path(alert_id): Path<Uuid>,
    Json(req): Json<TransitionRequest>,
) -> Result<Json<TransitionResponse>, ApiError> {
    let result = state
        .service
        .transition(alert_id, req.status, req.actor_id)
        .await?;
    Ok(Json(TransitionResponse {
        alert: result.alert,
        changed: result.changed,
    }))
}
