// Break reminder broadcaster
//
// Periodically queues a reminder notification for every user who opted in.
// Delivery is the notification channel's job: each open session polls the
// pending list and claims entries first-wins, so a reminder reaches at most
// one of the user's sessions.

use std::time::Duration;

use anyhow::Result;
use siren_storage::{CreateNotification, Database};

pub const DEFAULT_INTERVAL_SECS: u64 = 1200;

const REMINDER_TITLE: &str = "Time for a break";
const REMINDER_BODY: &str = "You have been at your desk for a while. Stand up, stretch, and rest your eyes for a few minutes.";

/// Worker configuration loaded from environment
#[derive(Debug, Clone)]
pub struct ReminderConfig {
    /// Seconds between broadcast ticks
    pub interval_secs: u64,
}

impl ReminderConfig {
    pub fn from_env() -> Self {
        let interval_secs = std::env::var("REMINDER_INTERVAL_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .filter(|&s| s > 0)
            .unwrap_or(DEFAULT_INTERVAL_SECS);
        Self { interval_secs }
    }
}

impl Default for ReminderConfig {
    fn default() -> Self {
        Self {
            interval_secs: DEFAULT_INTERVAL_SECS,
        }
    }
}

/// Queue one reminder per subscribed user. Returns the number queued.
///
/// A failure for one user does not abort the tick; the remaining
/// subscribers still get their reminder.
pub async fn broadcast_reminders(db: &Database) -> Result<usize> {
    let subscribers = db.list_reminder_subscribers().await?;
    let mut queued = 0;

    for user in subscribers {
        let result = db
            .create_notification(CreateNotification {
                user_id: user.id,
                title: REMINDER_TITLE.to_string(),
                body: REMINDER_BODY.to_string(),
            })
            .await;

        match result {
            Ok(_) => queued += 1,
            Err(e) => {
                tracing::warn!(user_id = %user.id, error = %e, "Failed to queue break reminder");
            }
        }
    }

    Ok(queued)
}

/// Broadcast loop. Runs until the shutdown future resolves.
pub async fn run(config: ReminderConfig, db: Database) -> Result<()> {
    let mut ticker = tokio::time::interval(Duration::from_secs(config.interval_secs));
    // First tick fires immediately; skip it so reminders start one full
    // interval after boot rather than on every restart.
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                match broadcast_reminders(&db).await {
                    Ok(queued) => {
                        tracing::info!(queued, "Break reminder tick complete");
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Break reminder tick failed");
                    }
                }
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Shutdown signal received");
                return Ok(());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_interval() {
        let config = ReminderConfig::default();
        assert_eq!(config.interval_secs, DEFAULT_INTERVAL_SECS);
    }

    // Single test so concurrent tests never race on the env var
    #[test]
    fn test_from_env() {
        std::env::set_var("REMINDER_INTERVAL_SECS", "60");
        assert_eq!(ReminderConfig::from_env().interval_secs, 60);

        std::env::set_var("REMINDER_INTERVAL_SECS", "0");
        assert_eq!(ReminderConfig::from_env().interval_secs, DEFAULT_INTERVAL_SECS);

        std::env::set_var("REMINDER_INTERVAL_SECS", "not-a-number");
        assert_eq!(ReminderConfig::from_env().interval_secs, DEFAULT_INTERVAL_SECS);

        std::env::remove_var("REMINDER_INTERVAL_SECS");
    }
}
