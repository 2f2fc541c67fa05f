// Database models (internal, may differ from public DTOs)

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use siren_core::{Alert, AlertStatus};

// ============================================
// User models
// ============================================

#[derive(Debug, Clone, FromRow)]
pub struct UserRow {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: String,
    pub bay_name: String,
    pub seat_number: String,
    pub wifi_name: String,
    pub avatar_url: Option<String>,
    pub break_reminders_enabled: bool,
    pub reminder_interval_secs: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CreateUser {
    pub name: String,
    pub email: String,
    pub role: String,
    pub bay_name: String,
    pub seat_number: String,
    pub wifi_name: String,
    pub avatar_url: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateUser {
    pub name: Option<String>,
    pub bay_name: Option<String>,
    pub seat_number: Option<String>,
    pub wifi_name: Option<String>,
    pub avatar_url: Option<String>,
    pub break_reminders_enabled: Option<bool>,
    pub reminder_interval_secs: Option<i32>,
}

// ============================================
// Alert models
// ============================================

#[derive(Debug, Clone, FromRow)]
pub struct AlertRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub user_name: String,
    pub user_avatar: Option<String>,
    pub bay_name: String,
    pub seat_number: String,
    pub wifi_name: String,
    pub summary: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub status_changed_at: Option<DateTime<Utc>>,
    pub status_changed_by: Option<Uuid>,
}

impl AlertRow {
    /// Convert a row into the domain type. Rows written by this crate
    /// always carry a canonical status string, so a parse failure means
    /// the database was modified out of band.
    pub fn into_alert(self) -> anyhow::Result<Alert> {
        let status: AlertStatus = self
            .status
            .parse()
            .map_err(|e| anyhow::anyhow!("corrupt alert status: {e}"))?;
        Ok(Alert {
            id: self.id,
            user_id: self.user_id,
            user_name: self.user_name,
            user_avatar: self.user_avatar,
            bay_name: self.bay_name,
            seat_number: self.seat_number,
            wifi_name: Some(self.wifi_name),
            summary: self.summary,
            latitude: self.latitude,
            longitude: self.longitude,
            status,
            created_at: self.created_at,
            status_changed_at: self.status_changed_at,
            status_changed_by: self.status_changed_by,
        })
    }
}

#[derive(Debug, Clone)]
pub struct CreateAlert {
    pub user_id: Uuid,
    pub user_name: String,
    pub user_avatar: Option<String>,
    pub bay_name: String,
    pub seat_number: String,
    pub wifi_name: String,
    pub summary: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

// ============================================
// Alert feed models
// ============================================

#[derive(Debug, Clone, FromRow)]
pub struct AlertEventRow {
    pub seq: i64,
    pub alert_id: Uuid,
    pub event_type: String,
    pub data: sqlx::types::JsonValue,
    pub created_at: DateTime<Utc>,
}

// ============================================
// Medical history models
// ============================================

#[derive(Debug, Clone, FromRow)]
pub struct MedicalHistoryRow {
    pub user_id: Uuid,
    pub document: sqlx::types::JsonValue,
    pub updated_at: DateTime<Utc>,
}

// ============================================
// Notification models (ephemeral)
// ============================================

#[derive(Debug, Clone, FromRow)]
pub struct NotificationRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CreateNotification {
    pub user_id: Uuid,
    pub title: String,
    pub body: String,
}

// ============================================
// Activity log models (write-only)
// ============================================

#[derive(Debug, Clone, FromRow)]
pub struct ActivityLogRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub action: String,
    pub detail: sqlx::types::JsonValue,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CreateActivityLog {
    pub user_id: Uuid,
    pub action: String,
    pub detail: serde_json::Value,
}
