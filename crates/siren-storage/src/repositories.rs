// Repository layer for database operations
//
// Alert writes and their feed events are committed in one transaction, so
// no subscriber ever observes an alert without its feed entry or vice
// versa. Status transitions use a conditional UPDATE as the atomic guard:
// concurrent writers race on the WHERE clause and at most one applies.

use anyhow::Result;
use sqlx::PgPool;
use uuid::Uuid;

use siren_core::{Alert, AlertEventKind, AlertStatus};

use crate::models::*;

/// Outcome of a conditional status transition
#[derive(Debug)]
pub enum TransitionOutcome {
    /// The write applied and a feed event was emitted
    Applied(Alert),
    /// The alert was already in the requested state; nothing written
    Noop(Alert),
    /// The guard did not match and the current state is not the target -
    /// the caller lost a race or requested a backward move
    Conflict(Alert),
    /// No such alert
    NotFound,
}

#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create database connection from URL
    pub async fn from_url(database_url: &str) -> Result<Self> {
        let pool = PgPool::connect(database_url).await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Run pending migrations
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        Ok(())
    }

    // ============================================
    // Users (profiles)
    // ============================================

    pub async fn create_user(&self, input: CreateUser) -> Result<UserRow> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            INSERT INTO users (name, email, role, bay_name, seat_number, wifi_name, avatar_url)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, name, email, role, bay_name, seat_number, wifi_name, avatar_url,
                      break_reminders_enabled, reminder_interval_secs, created_at, updated_at
            "#,
        )
        .bind(&input.name)
        .bind(&input.email)
        .bind(&input.role)
        .bind(&input.bay_name)
        .bind(&input.seat_number)
        .bind(&input.wifi_name)
        .bind(&input.avatar_url)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    pub async fn get_user(&self, id: Uuid) -> Result<Option<UserRow>> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, name, email, role, bay_name, seat_number, wifi_name, avatar_url,
                   break_reminders_enabled, reminder_interval_secs, created_at, updated_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    pub async fn update_user(&self, id: Uuid, input: UpdateUser) -> Result<Option<UserRow>> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            UPDATE users
            SET
                name = COALESCE($2, name),
                bay_name = COALESCE($3, bay_name),
                seat_number = COALESCE($4, seat_number),
                wifi_name = COALESCE($5, wifi_name),
                avatar_url = COALESCE($6, avatar_url),
                break_reminders_enabled = COALESCE($7, break_reminders_enabled),
                reminder_interval_secs = COALESCE($8, reminder_interval_secs),
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, name, email, role, bay_name, seat_number, wifi_name, avatar_url,
                      break_reminders_enabled, reminder_interval_secs, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(&input.name)
        .bind(&input.bay_name)
        .bind(&input.seat_number)
        .bind(&input.wifi_name)
        .bind(&input.avatar_url)
        .bind(input.break_reminders_enabled)
        .bind(input.reminder_interval_secs)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    /// Users who opted into break reminders (polled by the worker)
    pub async fn list_reminder_subscribers(&self) -> Result<Vec<UserRow>> {
        let rows = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, name, email, role, bay_name, seat_number, wifi_name, avatar_url,
                   break_reminders_enabled, reminder_interval_secs, created_at, updated_at
            FROM users
            WHERE break_reminders_enabled = TRUE
            ORDER BY created_at ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    // ============================================
    // Alerts (the central entity)
    // ============================================

    /// Insert a new alert in status 'open' with a server-assigned
    /// timestamp, and append its alert.created feed event atomically.
    pub async fn create_alert(&self, input: CreateAlert) -> Result<Alert> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, AlertRow>(
            r#"
            INSERT INTO alerts (user_id, user_name, user_avatar, bay_name, seat_number,
                                wifi_name, summary, latitude, longitude, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, 'open')
            RETURNING id, user_id, user_name, user_avatar, bay_name, seat_number, wifi_name,
                      summary, latitude, longitude, status, created_at,
                      status_changed_at, status_changed_by
            "#,
        )
        .bind(input.user_id)
        .bind(&input.user_name)
        .bind(&input.user_avatar)
        .bind(&input.bay_name)
        .bind(&input.seat_number)
        .bind(&input.wifi_name)
        .bind(&input.summary)
        .bind(input.latitude)
        .bind(input.longitude)
        .fetch_one(&mut *tx)
        .await?;

        let alert = row.into_alert()?;
        let data = serde_json::json!({ "alert": &alert });

        sqlx::query(
            r#"
            INSERT INTO alert_events (alert_id, event_type, data)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(alert.id)
        .bind(AlertEventKind::Created.as_str())
        .bind(&data)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(alert)
    }

    pub async fn get_alert(&self, id: Uuid) -> Result<Option<Alert>> {
        let row = sqlx::query_as::<_, AlertRow>(
            r#"
            SELECT id, user_id, user_name, user_avatar, bay_name, seat_number, wifi_name,
                   summary, latitude, longitude, status, created_at,
                   status_changed_at, status_changed_by
            FROM alerts
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(AlertRow::into_alert).transpose()
    }

    /// Alerts still needing attention, newest first
    pub async fn list_active_alerts(&self) -> Result<Vec<Alert>> {
        let rows = sqlx::query_as::<_, AlertRow>(
            r#"
            SELECT id, user_id, user_name, user_avatar, bay_name, seat_number, wifi_name,
                   summary, latitude, longitude, status, created_at,
                   status_changed_at, status_changed_by
            FROM alerts
            WHERE status IN ('open', 'acknowledged')
            ORDER BY created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(AlertRow::into_alert).collect()
    }

    /// Resolved alerts, newest first
    pub async fn list_resolved_alerts(&self, limit: i64) -> Result<Vec<Alert>> {
        let rows = sqlx::query_as::<_, AlertRow>(
            r#"
            SELECT id, user_id, user_name, user_avatar, bay_name, seat_number, wifi_name,
                   summary, latitude, longitude, status, created_at,
                   status_changed_at, status_changed_by
            FROM alerts
            WHERE status = 'resolved'
            ORDER BY created_at DESC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(AlertRow::into_alert).collect()
    }

    /// Conditionally move an alert to `to`, emitting the feed event only
    /// when the write applies.
    ///
    /// The WHERE guard restricts the update to states `to` may legally be
    /// reached from, so two concurrent resolutions produce exactly one
    /// status_changed event: the loser matches zero rows and is reported
    /// as Noop (already there) or Conflict.
    pub async fn transition_alert(
        &self,
        id: Uuid,
        to: AlertStatus,
        actor: Option<Uuid>,
    ) -> Result<TransitionOutcome> {
        let allowed_from: Vec<&str> = to.allowed_from().iter().map(|s| s.as_str()).collect();

        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query_as::<_, AlertRow>(
            r#"
            UPDATE alerts
            SET status = $2, status_changed_at = NOW(), status_changed_by = $3
            WHERE id = $1 AND status = ANY($4)
            RETURNING id, user_id, user_name, user_avatar, bay_name, seat_number, wifi_name,
                      summary, latitude, longitude, status, created_at,
                      status_changed_at, status_changed_by
            "#,
        )
        .bind(id)
        .bind(to.as_str())
        .bind(actor)
        .bind(&allowed_from)
        .fetch_optional(&mut *tx)
        .await?;

        match updated {
            Some(row) => {
                let alert = row.into_alert()?;
                let data = serde_json::json!({ "alert": &alert, "to": to });

                sqlx::query(
                    r#"
                    INSERT INTO alert_events (alert_id, event_type, data)
                    VALUES ($1, $2, $3)
                    "#,
                )
                .bind(alert.id)
                .bind(AlertEventKind::StatusChanged.as_str())
                .bind(&data)
                .execute(&mut *tx)
                .await?;

                tx.commit().await?;
                Ok(TransitionOutcome::Applied(alert))
            }
            None => {
                // Guard missed: gone, already there, or an illegal move
                tx.rollback().await?;
                match self.get_alert(id).await? {
                    None => Ok(TransitionOutcome::NotFound),
                    Some(alert) if alert.status == to => Ok(TransitionOutcome::Noop(alert)),
                    Some(alert) => Ok(TransitionOutcome::Conflict(alert)),
                }
            }
        }
    }

    // ============================================
    // Alert feed (sequence-cursor live query)
    // ============================================

    /// Feed events with seq greater than the cursor, oldest first
    pub async fn list_alert_events(
        &self,
        since_seq: i64,
        limit: i64,
    ) -> Result<Vec<AlertEventRow>> {
        let rows = sqlx::query_as::<_, AlertEventRow>(
            r#"
            SELECT seq, alert_id, event_type, data, created_at
            FROM alert_events
            WHERE seq > $1
            ORDER BY seq ASC
            LIMIT $2
            "#,
        )
        .bind(since_seq)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Current tail of the feed, for subscribers that only want new events
    pub async fn latest_alert_seq(&self) -> Result<i64> {
        let seq: Option<i64> = sqlx::query_scalar("SELECT MAX(seq) FROM alert_events")
            .fetch_one(&self.pool)
            .await?;
        Ok(seq.unwrap_or(0))
    }

    // ============================================
    // Medical history (one document per user)
    // ============================================

    pub async fn get_medical_history(&self, user_id: Uuid) -> Result<Option<MedicalHistoryRow>> {
        let row = sqlx::query_as::<_, MedicalHistoryRow>(
            r#"
            SELECT user_id, document, updated_at
            FROM medical_history
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    /// Replace the user's history document (last write wins)
    pub async fn upsert_medical_history(
        &self,
        user_id: Uuid,
        document: serde_json::Value,
    ) -> Result<MedicalHistoryRow> {
        let row = sqlx::query_as::<_, MedicalHistoryRow>(
            r#"
            INSERT INTO medical_history (user_id, document)
            VALUES ($1, $2)
            ON CONFLICT (user_id) DO UPDATE SET document = $2, updated_at = NOW()
            RETURNING user_id, document, updated_at
            "#,
        )
        .bind(user_id)
        .bind(&document)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    // ============================================
    // Notifications (ephemeral push channel)
    // ============================================

    pub async fn create_notification(&self, input: CreateNotification) -> Result<NotificationRow> {
        let row = sqlx::query_as::<_, NotificationRow>(
            r#"
            INSERT INTO notifications (user_id, title, body)
            VALUES ($1, $2, $3)
            RETURNING id, user_id, title, body, created_at
            "#,
        )
        .bind(input.user_id)
        .bind(&input.title)
        .bind(&input.body)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    pub async fn list_notifications(&self, user_id: Uuid) -> Result<Vec<NotificationRow>> {
        let rows = sqlx::query_as::<_, NotificationRow>(
            r#"
            SELECT id, user_id, title, body, created_at
            FROM notifications
            WHERE user_id = $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Atomic claim: delete-returning means exactly one session's claim
    /// yields the row; every other session gets None and displays nothing.
    pub async fn claim_notification(&self, id: Uuid) -> Result<Option<NotificationRow>> {
        let row = sqlx::query_as::<_, NotificationRow>(
            r#"
            DELETE FROM notifications
            WHERE id = $1
            RETURNING id, user_id, title, body, created_at
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    // ============================================
    // Activity log (append-only audit trail)
    // ============================================

    pub async fn record_activity(&self, input: CreateActivityLog) -> Result<ActivityLogRow> {
        let row = sqlx::query_as::<_, ActivityLogRow>(
            r#"
            INSERT INTO activity_log (user_id, action, detail)
            VALUES ($1, $2, $3)
            RETURNING id, user_id, action, detail, created_at
            "#,
        )
        .bind(input.user_id)
        .bind(&input.action)
        .bind(&input.detail)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }
}
