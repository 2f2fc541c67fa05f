// Medical history records
//
// Owned exclusively by the reporting user, last write wins, no versioning.
// Each record kind is a concrete struct with explicit update functions -
// no generic field-by-name access.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum AllergySeverity {
    Mild,
    Moderate,
    Severe,
}

impl AllergySeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            AllergySeverity::Mild => "mild",
            AllergySeverity::Moderate => "moderate",
            AllergySeverity::Severe => "severe",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Allergy {
    pub name: String,
    pub severity: AllergySeverity,
    #[serde(default)]
    pub detail: String,
}

impl Allergy {
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn set_severity(&mut self, severity: AllergySeverity) {
        self.severity = severity;
    }

    pub fn set_detail(&mut self, detail: impl Into<String>) {
        self.detail = detail.into();
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Medication {
    pub name: String,
    pub dosage: String,
    #[serde(default)]
    pub reason: String,
}

impl Medication {
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn set_dosage(&mut self, dosage: impl Into<String>) {
        self.dosage = dosage.into();
    }

    pub fn set_reason(&mut self, reason: impl Into<String>) {
        self.reason = reason.into();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ConditionStatus {
    Active,
    Managed,
    Resolved,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Condition {
    pub name: String,
    pub diagnosed_on: Option<NaiveDate>,
    pub status: ConditionStatus,
}

impl Condition {
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn set_diagnosed_on(&mut self, date: Option<NaiveDate>) {
        self.diagnosed_on = date;
    }

    pub fn set_status(&mut self, status: ConditionStatus) {
        self.status = status;
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct EmergencyContact {
    pub name: String,
    pub relationship: String,
    pub phone: String,
}

impl EmergencyContact {
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn set_relationship(&mut self, relationship: impl Into<String>) {
        self.relationship = relationship.into();
    }

    pub fn set_phone(&mut self, phone: impl Into<String>) {
        self.phone = phone.into();
    }
}

/// Per-user medical history document
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, ToSchema)]
pub struct MedicalHistory {
    #[serde(default)]
    pub allergies: Vec<Allergy>,
    #[serde(default)]
    pub medications: Vec<Medication>,
    #[serde(default)]
    pub conditions: Vec<Condition>,
    #[serde(default)]
    pub emergency_contacts: Vec<EmergencyContact>,
}

impl MedicalHistory {
    /// Render the history into the free-text form consumed by the
    /// summarization prompt. Empty sections render as "none recorded" so
    /// the model never sees a dangling label.
    pub fn summary_text(&self) -> String {
        let allergies = if self.allergies.is_empty() {
            "none recorded".to_string()
        } else {
            self.allergies
                .iter()
                .map(|a| format!("{} ({})", a.name, a.severity.as_str()))
                .collect::<Vec<_>>()
                .join(", ")
        };

        let conditions = if self.conditions.is_empty() {
            "none recorded".to_string()
        } else {
            self.conditions
                .iter()
                .map(|c| c.name.clone())
                .collect::<Vec<_>>()
                .join(", ")
        };

        let medications = if self.medications.is_empty() {
            "none recorded".to_string()
        } else {
            self.medications
                .iter()
                .map(|m| format!("{} {}", m.name, m.dosage))
                .collect::<Vec<_>>()
                .join(", ")
        };

        format!(
            "Allergies: {allergies}. Conditions: {conditions}. Medications: {medications}."
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_history() -> MedicalHistory {
        MedicalHistory {
            allergies: vec![Allergy {
                name: "Penicillin".to_string(),
                severity: AllergySeverity::Severe,
                detail: "Anaphylaxis".to_string(),
            }],
            medications: vec![Medication {
                name: "Metformin".to_string(),
                dosage: "500mg".to_string(),
                reason: "Type 2 diabetes".to_string(),
            }],
            conditions: vec![Condition {
                name: "Asthma".to_string(),
                diagnosed_on: None,
                status: ConditionStatus::Managed,
            }],
            emergency_contacts: vec![],
        }
    }

    #[test]
    fn summary_text_lists_all_sections() {
        let text = sample_history().summary_text();
        assert_eq!(
            text,
            "Allergies: Penicillin (severe). Conditions: Asthma. Medications: Metformin 500mg."
        );
    }

    #[test]
    fn summary_text_handles_empty_history() {
        let text = MedicalHistory::default().summary_text();
        assert_eq!(
            text,
            "Allergies: none recorded. Conditions: none recorded. Medications: none recorded."
        );
    }

    #[test]
    fn explicit_field_updates() {
        let mut history = sample_history();
        history.allergies[0].set_severity(AllergySeverity::Moderate);
        history.medications[0].set_dosage("850mg");
        history.conditions[0].set_status(ConditionStatus::Resolved);

        assert_eq!(history.allergies[0].severity, AllergySeverity::Moderate);
        assert_eq!(history.medications[0].dosage, "850mg");
        assert_eq!(history.conditions[0].status, ConditionStatus::Resolved);
    }

    #[test]
    fn document_round_trips_through_json() {
        let history = sample_history();
        let json = serde_json::to_value(&history).unwrap();
        let back: MedicalHistory = serde_json::from_value(json).unwrap();
        assert_eq!(back, history);
    }
}
