// Medical history service
//
// One document per user, replaced wholesale on update (last write wins,
// no versioning). A user with no saved history reads back as an empty
// document, not a 404.

use std::sync::Arc;

use uuid::Uuid;

use siren_core::{MedicalHistory, SirenError};
use siren_storage::Database;

#[derive(Clone)]
pub struct MedicalHistoryService {
    db: Arc<Database>,
}

impl MedicalHistoryService {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    pub async fn get(&self, user_id: Uuid) -> Result<MedicalHistory, SirenError> {
        self.db
            .get_user(user_id)
            .await
            .map_err(|e| SirenError::store(e.to_string()))?
            .ok_or(SirenError::UserNotFound(user_id))?;

        let row = self
            .db
            .get_medical_history(user_id)
            .await
            .map_err(|e| SirenError::store(e.to_string()))?;

        match row {
            Some(row) => serde_json::from_value(row.document)
                .map_err(|e| SirenError::store(format!("corrupt medical history: {e}"))),
            None => Ok(MedicalHistory::default()),
        }
    }

    pub async fn replace(
        &self,
        user_id: Uuid,
        history: MedicalHistory,
    ) -> Result<MedicalHistory, SirenError> {
        self.db
            .get_user(user_id)
            .await
            .map_err(|e| SirenError::store(e.to_string()))?
            .ok_or(SirenError::UserNotFound(user_id))?;

        let document = serde_json::to_value(&history)
            .map_err(|e| SirenError::store(format!("unserializable history: {e}")))?;

        self.db
            .upsert_medical_history(user_id, document)
            .await
            .map_err(|e| SirenError::store(e.to_string()))?;

        Ok(history)
    }
}
