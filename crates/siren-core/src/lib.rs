// Siren core: domain types and pure alert-lifecycle logic
//
// This crate has no I/O. It defines:
// - Alert and the forward-only status state machine
// - Role model and field-visibility policy
// - Per-session notification dedup (AlertDispatcher)
// - Medical history records and the summarization prompt rendering
// - The Summarizer trait implemented by provider crates

pub mod alert;
pub mod dispatch;
pub mod error;
pub mod medical;
pub mod role;
pub mod summarize;

pub use alert::{Alert, AlertEvent, AlertEventKind, AlertStatus, Transition};
pub use dispatch::{AlertDispatcher, DesktopNotification};
pub use error::{Result, SirenError};
pub use medical::{
    Allergy, AllergySeverity, Condition, ConditionStatus, EmergencyContact, MedicalHistory,
    Medication,
};
pub use role::Role;
pub use summarize::{SummarizeRequest, SummarizeResponse, Summarizer};
