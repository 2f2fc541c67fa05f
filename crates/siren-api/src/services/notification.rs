// Notification service: the secondary push channel
//
// Low-stakes reminders, never the emergency path. Claiming is an atomic
// delete-returning in storage, so of N sessions polling the same user's
// queue exactly one wins each row.

use std::sync::Arc;

use uuid::Uuid;

use siren_core::SirenError;
use siren_storage::{CreateNotification, Database, NotificationRow};

#[derive(Clone)]
pub struct NotificationService {
    db: Arc<Database>,
}

impl NotificationService {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    pub async fn push(
        &self,
        target_user_id: Uuid,
        title: String,
        body: String,
    ) -> Result<NotificationRow, SirenError> {
        // Target must exist; a push to a deleted user is a caller bug
        self.db
            .get_user(target_user_id)
            .await
            .map_err(|e| SirenError::store(e.to_string()))?
            .ok_or(SirenError::UserNotFound(target_user_id))?;

        self.db
            .create_notification(CreateNotification {
                user_id: target_user_id,
                title,
                body,
            })
            .await
            .map_err(|e| SirenError::store(e.to_string()))
    }

    /// Pending notifications for a user's open sessions to poll
    pub async fn pending(&self, user_id: Uuid) -> Result<Vec<NotificationRow>, SirenError> {
        self.db
            .list_notifications(user_id)
            .await
            .map_err(|e| SirenError::store(e.to_string()))
    }

    /// Claim a notification for display. Returns None when another session
    /// already claimed it; the caller displays nothing in that case.
    pub async fn claim(&self, id: Uuid) -> Result<Option<NotificationRow>, SirenError> {
        self.db
            .claim_notification(id)
            .await
            .map_err(|e| SirenError::store(e.to_string()))
    }
}
