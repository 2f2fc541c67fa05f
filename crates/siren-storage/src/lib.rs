// Postgres storage layer with sqlx
//
// The alert store of the system: alerts plus their append-only feed
// (alert_events), user profiles, medical histories, ephemeral
// notifications, and the write-only activity log.

pub mod models;
pub mod repositories;

pub use models::*;
pub use repositories::*;
