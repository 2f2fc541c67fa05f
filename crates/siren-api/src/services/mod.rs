// Service layer: business logic between HTTP handlers and storage

mod alert;
mod medical;
mod notification;

pub use alert::{AlertService, TransitionResult};
pub use medical::MedicalHistoryService;
pub use notification::NotificationService;
