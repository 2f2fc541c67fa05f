// Alert service: the producer flow and the transition handler
//
// The gated producer flow runs strictly in this order: resolve profile,
// require coordinates, render history, call the summarizer, and only then
// insert. Any failure before the insert leaves no partial alert row.

use std::sync::Arc;

use serde_json::json;
use uuid::Uuid;

use siren_core::{
    Alert, AlertStatus, MedicalHistory, Role, SirenError, SummarizeRequest, Summarizer, Transition,
};
use siren_storage::{CreateActivityLog, CreateAlert, Database, TransitionOutcome, UserRow};

use crate::alerts::SubmitAlertRequest;

/// Result of a transition request. `changed` is false for the idempotent
/// no-op path (the alert was already in the requested state).
#[derive(Debug, Clone)]
pub struct TransitionResult {
    pub alert: Alert,
    pub changed: bool,
}

#[derive(Clone)]
pub struct AlertService {
    db: Arc<Database>,
    summarizer: Option<Arc<dyn Summarizer>>,
}

impl AlertService {
    pub fn new(db: Arc<Database>, summarizer: Option<Arc<dyn Summarizer>>) -> Self {
        Self { db, summarizer }
    }

    /// Submit a new alert. Returns the created alert in status `open`.
    pub async fn submit(&self, req: SubmitAlertRequest) -> Result<Alert, SirenError> {
        let user = self
            .db
            .get_user(req.user_id)
            .await
            .map_err(|e| SirenError::store(e.to_string()))?
            .ok_or(SirenError::UserNotFound(req.user_id))?;

        let summary = if req.with_summary {
            Some(self.gated_summary(&user, &req).await?)
        } else {
            None
        };

        // Snapshot location: request overrides win, profile fills the rest.
        // Empty strings are accepted and render as "Not set" downstream.
        let input = CreateAlert {
            user_id: user.id,
            user_name: user.name.clone(),
            user_avatar: user.avatar_url.clone(),
            bay_name: req.bay_name.unwrap_or(user.bay_name),
            seat_number: req.seat_number.unwrap_or(user.seat_number),
            wifi_name: req.wifi_name.unwrap_or(user.wifi_name),
            summary,
            latitude: req.latitude,
            longitude: req.longitude,
        };

        let alert = self
            .db
            .create_alert(input)
            .await
            .map_err(|e| SirenError::store(e.to_string()))?;

        self.log_activity(
            alert.user_id,
            "alert.created",
            json!({ "alert_id": alert.id }),
        )
        .await;

        tracing::info!(alert_id = %alert.id, user_id = %alert.user_id, "alert created");

        Ok(alert)
    }

    /// The gated summary step. Runs entirely before the alert insert; a
    /// failure here aborts the submission with no record written.
    async fn gated_summary(
        &self,
        user: &UserRow,
        req: &SubmitAlertRequest,
    ) -> Result<String, SirenError> {
        let summarizer = self
            .summarizer
            .as_ref()
            .ok_or_else(|| SirenError::summarizer("no summarization provider configured"))?;

        let (latitude, longitude) = match (req.latitude, req.longitude) {
            (Some(lat), Some(lon)) => (lat, lon),
            _ => {
                return Err(SirenError::location(
                    "coordinates required for a summarized alert",
                ))
            }
        };

        let history = self.load_history(user.id).await?;

        let response = summarizer
            .summarize(SummarizeRequest {
                medical_history: history.summary_text(),
                current_location: format!("Lat: {latitude}, Lon: {longitude}"),
            })
            .await?;

        Ok(response.summary)
    }

    async fn load_history(&self, user_id: Uuid) -> Result<MedicalHistory, SirenError> {
        let row = self
            .db
            .get_medical_history(user_id)
            .await
            .map_err(|e| SirenError::store(e.to_string()))?;

        // No history yet is a valid state, summarized as "none recorded"
        let history = match row {
            Some(row) => serde_json::from_value(row.document)
                .map_err(|e| SirenError::store(format!("corrupt medical history: {e}")))?,
            None => MedicalHistory::default(),
        };

        Ok(history)
    }

    /// Move an alert's status forward. Idempotent: requesting the current
    /// status succeeds with `changed = false`.
    pub async fn transition(
        &self,
        id: Uuid,
        to: AlertStatus,
        actor: Option<Uuid>,
    ) -> Result<TransitionResult, SirenError> {
        let current = self
            .db
            .get_alert(id)
            .await
            .map_err(|e| SirenError::store(e.to_string()))?
            .ok_or(SirenError::AlertNotFound(id))?;

        if let Transition::Noop = AlertStatus::validate(current.status, to)? {
            return Ok(TransitionResult {
                alert: current,
                changed: false,
            });
        }

        let outcome = self
            .db
            .transition_alert(id, to, actor)
            .await
            .map_err(|e| SirenError::store(e.to_string()))?;

        match outcome {
            TransitionOutcome::Applied(alert) => {
                if let Some(actor) = actor {
                    self.log_activity(
                        actor,
                        "alert.status_changed",
                        json!({ "alert_id": alert.id, "to": to }),
                    )
                    .await;
                }
                tracing::info!(alert_id = %alert.id, to = %to, "alert transitioned");
                Ok(TransitionResult {
                    alert,
                    changed: true,
                })
            }
            // Lost a race and the winner wrote our target: idempotent success
            TransitionOutcome::Noop(alert) => Ok(TransitionResult {
                alert,
                changed: false,
            }),
            TransitionOutcome::Conflict(alert) => Err(SirenError::InvalidTransition {
                from: alert.status.as_str(),
                to: to.as_str(),
            }),
            TransitionOutcome::NotFound => Err(SirenError::AlertNotFound(id)),
        }
    }

    /// One alert projected for the viewer's role
    pub async fn get(&self, id: Uuid, role: Role) -> Result<Alert, SirenError> {
        let alert = self
            .db
            .get_alert(id)
            .await
            .map_err(|e| SirenError::store(e.to_string()))?
            .ok_or(SirenError::AlertNotFound(id))?;

        Ok(siren_core::dispatch::project_for_role(&alert, role))
    }

    /// Active alerts projected for the viewer's role
    pub async fn list_active(&self, role: Role) -> Result<Vec<Alert>, SirenError> {
        let alerts = self
            .db
            .list_active_alerts()
            .await
            .map_err(|e| SirenError::store(e.to_string()))?;

        Ok(alerts
            .iter()
            .map(|a| siren_core::dispatch::project_for_role(a, role))
            .collect())
    }

    /// Resolved alerts projected for the viewer's role
    pub async fn list_history(&self, role: Role, limit: i64) -> Result<Vec<Alert>, SirenError> {
        let alerts = self
            .db
            .list_resolved_alerts(limit)
            .await
            .map_err(|e| SirenError::store(e.to_string()))?;

        Ok(alerts
            .iter()
            .map(|a| siren_core::dispatch::project_for_role(a, role))
            .collect())
    }

    // Audit writes are best effort: a failed log line must not fail the
    // action it records.
    async fn log_activity(&self, user_id: Uuid, action: &str, detail: serde_json::Value) {
        if let Err(e) = self
            .db
            .record_activity(CreateActivityLog {
                user_id,
                action: action.to_string(),
                detail,
            })
            .await
        {
            tracing::warn!(action, error = %e, "failed to record activity");
        }
    }
}
