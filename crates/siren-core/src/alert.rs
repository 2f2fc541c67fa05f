// Alert entity and status state machine
//
// An alert is a historical snapshot of the reporter at creation time.
// Only the status field is ever mutated, and only forward:
//
//   open -> acknowledged -> resolved
//   open -> resolved              (staff may resolve directly)
//
// Re-requesting the current status is a no-op, not an error, so two staff
// sessions racing to resolve the same alert both observe success.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::SirenError;

/// Lifecycle state of an alert
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum AlertStatus {
    Open,
    Acknowledged,
    Resolved,
}

impl AlertStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertStatus::Open => "open",
            AlertStatus::Acknowledged => "acknowledged",
            AlertStatus::Resolved => "resolved",
        }
    }

    /// Terminal states never transition again
    pub fn is_terminal(&self) -> bool {
        matches!(self, AlertStatus::Resolved)
    }

    /// States a transition to `self` may start from.
    ///
    /// Used by the storage layer as the conditional-update guard, so the
    /// check and the write are a single atomic statement.
    pub fn allowed_from(&self) -> &'static [AlertStatus] {
        match self {
            AlertStatus::Open => &[],
            AlertStatus::Acknowledged => &[AlertStatus::Open],
            AlertStatus::Resolved => &[AlertStatus::Open, AlertStatus::Acknowledged],
        }
    }

    /// Validate a requested status change.
    ///
    /// Returns `Transition::Apply` for a legal forward move,
    /// `Transition::Noop` when the alert is already in the requested state,
    /// and an error for backward or unknown moves.
    pub fn validate(from: AlertStatus, to: AlertStatus) -> Result<Transition, SirenError> {
        if from == to {
            return Ok(Transition::Noop);
        }
        if to.allowed_from().contains(&from) {
            return Ok(Transition::Apply);
        }
        Err(SirenError::InvalidTransition {
            from: from.as_str(),
            to: to.as_str(),
        })
    }
}

impl std::fmt::Display for AlertStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AlertStatus {
    type Err = SirenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "open" => Ok(AlertStatus::Open),
            "acknowledged" => Ok(AlertStatus::Acknowledged),
            "resolved" => Ok(AlertStatus::Resolved),
            other => Err(SirenError::UnknownStatus(other.to_string())),
        }
    }
}

/// Outcome of validating a status change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Legal forward move, apply the write
    Apply,
    /// Already in the requested state, succeed without writing
    Noop,
}

/// One reported emergency and its resolution state.
///
/// All fields except `status`, `status_changed_at` and `status_changed_by`
/// are immutable after creation. Reporter fields are denormalized snapshots,
/// never re-joined against the live profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Alert {
    pub id: Uuid,
    pub user_id: Uuid,
    pub user_name: String,
    pub user_avatar: Option<String>,
    pub bay_name: String,
    pub seat_number: String,
    /// Network location, projected away for roles without network visibility
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wifi_name: Option<String>,
    /// AI-generated medical brief, present when the gated flow was used
    pub summary: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub status: AlertStatus,
    /// Server-assigned creation time (authoritative clock)
    pub created_at: DateTime<Utc>,
    pub status_changed_at: Option<DateTime<Utc>>,
    pub status_changed_by: Option<Uuid>,
}

impl Alert {
    /// Human-readable location line for notifications and dashboards.
    /// Empty fields render as "Not set" rather than failing.
    pub fn location_summary(&self) -> String {
        format!(
            "Bay: {}, Seat: {}",
            non_empty_or(&self.bay_name, "Not set"),
            non_empty_or(&self.seat_number, "Not set"),
        )
    }
}

fn non_empty_or<'a>(value: &'a str, fallback: &'a str) -> &'a str {
    if value.trim().is_empty() {
        fallback
    } else {
        value
    }
}

/// Kind of change carried on the alert feed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum AlertEventKind {
    /// A new alert was created (always status = open)
    Created,
    /// An alert's status moved forward
    StatusChanged,
}

impl AlertEventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertEventKind::Created => "alert.created",
            AlertEventKind::StatusChanged => "alert.status_changed",
        }
    }
}

impl std::str::FromStr for AlertEventKind {
    type Err = SirenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "alert.created" => Ok(AlertEventKind::Created),
            "alert.status_changed" => Ok(AlertEventKind::StatusChanged),
            other => Err(SirenError::UnknownStatus(other.to_string())),
        }
    }
}

/// One entry on the alert feed. `seq` is the global resumption cursor:
/// subscribers replay events with `seq` greater than their last seen value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct AlertEvent {
    pub seq: i64,
    pub kind: AlertEventKind,
    pub alert: Alert,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_alert(status: AlertStatus) -> Alert {
        Alert {
            id: Uuid::now_v7(),
            user_id: Uuid::now_v7(),
            user_name: "Jane Doe".to_string(),
            user_avatar: None,
            bay_name: "Delta Wing".to_string(),
            seat_number: "D-34".to_string(),
            wifi_name: Some("Guest-5G".to_string()),
            summary: None,
            latitude: None,
            longitude: None,
            status,
            created_at: Utc::now(),
            status_changed_at: None,
            status_changed_by: None,
        }
    }

    #[test]
    fn forward_transitions_apply() {
        assert_eq!(
            AlertStatus::validate(AlertStatus::Open, AlertStatus::Acknowledged).unwrap(),
            Transition::Apply
        );
        assert_eq!(
            AlertStatus::validate(AlertStatus::Open, AlertStatus::Resolved).unwrap(),
            Transition::Apply
        );
        assert_eq!(
            AlertStatus::validate(AlertStatus::Acknowledged, AlertStatus::Resolved).unwrap(),
            Transition::Apply
        );
    }

    #[test]
    fn self_transition_is_noop() {
        for status in [
            AlertStatus::Open,
            AlertStatus::Acknowledged,
            AlertStatus::Resolved,
        ] {
            assert_eq!(
                AlertStatus::validate(status, status).unwrap(),
                Transition::Noop
            );
        }
    }

    #[test]
    fn backward_transitions_rejected() {
        let err = AlertStatus::validate(AlertStatus::Resolved, AlertStatus::Open).unwrap_err();
        assert!(matches!(err, SirenError::InvalidTransition { .. }));

        let err =
            AlertStatus::validate(AlertStatus::Acknowledged, AlertStatus::Open).unwrap_err();
        assert!(matches!(err, SirenError::InvalidTransition { .. }));

        let err =
            AlertStatus::validate(AlertStatus::Resolved, AlertStatus::Acknowledged).unwrap_err();
        assert!(matches!(err, SirenError::InvalidTransition { .. }));
    }

    #[test]
    fn resolve_twice_is_idempotent() {
        // First resolve applies, second is a no-op success
        assert_eq!(
            AlertStatus::validate(AlertStatus::Open, AlertStatus::Resolved).unwrap(),
            Transition::Apply
        );
        assert_eq!(
            AlertStatus::validate(AlertStatus::Resolved, AlertStatus::Resolved).unwrap(),
            Transition::Noop
        );
    }

    #[test]
    fn status_round_trips_through_strings() {
        for status in [
            AlertStatus::Open,
            AlertStatus::Acknowledged,
            AlertStatus::Resolved,
        ] {
            assert_eq!(status.as_str().parse::<AlertStatus>().unwrap(), status);
        }
        assert!("active".parse::<AlertStatus>().is_err());
    }

    #[test]
    fn location_summary_renders_empty_fields_as_not_set() {
        let mut alert = sample_alert(AlertStatus::Open);
        alert.bay_name = String::new();
        assert_eq!(alert.location_summary(), "Bay: Not set, Seat: D-34");

        alert.seat_number = "  ".to_string();
        assert_eq!(alert.location_summary(), "Bay: Not set, Seat: Not set");
    }
}
