// Subscriber-side dispatch: notification dedup and list reconciliation
//
// Each dashboard session owns one AlertDispatcher and one LiveList. The
// dispatcher turns feed events into at-most-one desktop notification per
// alert per session. The list reconciles the active/history views from the
// same events and re-sorts on every change rather than trusting event
// arrival order - cross-stream ordering is not guaranteed by the feed.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::alert::{Alert, AlertEvent, AlertEventKind, AlertStatus};
use crate::role::Role;

/// Project an alert for a viewer role. Network fields are only visible to
/// roles with network visibility; everyone else gets the field omitted.
pub fn project_for_role(alert: &Alert, role: Role) -> Alert {
    let mut projected = alert.clone();
    if !role.sees_network_fields() {
        projected.wifi_name = None;
    }
    projected
}

/// Instruction to display a local desktop notification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DesktopNotification {
    pub title: String,
    pub body: String,
}

impl DesktopNotification {
    fn for_alert(alert: &Alert) -> Self {
        Self {
            title: format!("New Emergency: {}", alert.user_name),
            body: alert.location_summary(),
        }
    }
}

/// Per-session notification dedup.
///
/// Yields a notification the first time a given alert id is observed as
/// newly created, and never again for that id within the session -
/// replayed events after an SSE reconnect stay silent.
#[derive(Debug, Default)]
pub struct AlertDispatcher {
    seen: HashSet<Uuid>,
}

impl AlertDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Observe one feed event; returns a notification instruction at most
    /// once per alert id.
    pub fn observe(&mut self, event: &AlertEvent) -> Option<DesktopNotification> {
        match event.kind {
            AlertEventKind::Created => {
                if self.seen.insert(event.alert.id) {
                    Some(DesktopNotification::for_alert(&event.alert))
                } else {
                    None
                }
            }
            // Status changes update lists, they never re-notify. Mark the
            // id as seen so a reconnect replaying only the status event
            // does not notify for an alert this session already handled.
            AlertEventKind::StatusChanged => {
                self.seen.insert(event.alert.id);
                None
            }
        }
    }
}

/// Reconciled view of the alert feed: active alerts and history.
///
/// Active holds open and acknowledged alerts; resolved alerts move to
/// history. Both lists are kept sorted by creation time descending.
#[derive(Debug, Default)]
pub struct LiveList {
    active: Vec<Alert>,
    history: Vec<Alert>,
}

impl LiveList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed from an initial snapshot (e.g. the list fetched on mount)
    pub fn from_snapshot(alerts: Vec<Alert>) -> Self {
        let mut list = Self::new();
        for alert in alerts {
            list.upsert(alert);
        }
        list
    }

    /// Apply one feed event
    pub fn apply(&mut self, event: &AlertEvent) {
        self.upsert(event.alert.clone());
    }

    fn upsert(&mut self, alert: Alert) {
        self.active.retain(|a| a.id != alert.id);
        self.history.retain(|a| a.id != alert.id);

        if alert.status.is_terminal() {
            self.history.push(alert);
        } else {
            self.active.push(alert);
        }
        // Timestamp order, not arrival order
        self.active
            .sort_by(|a, b| b.created_at.cmp(&a.created_at));
        self.history
            .sort_by(|a, b| b.created_at.cmp(&a.created_at));
    }

    pub fn active(&self) -> &[Alert] {
        &self.active
    }

    pub fn history(&self) -> &[Alert] {
        &self.history
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn alert(name: &str, status: AlertStatus, age_secs: i64) -> Alert {
        Alert {
            id: Uuid::now_v7(),
            user_id: Uuid::now_v7(),
            user_name: name.to_string(),
            user_avatar: None,
            bay_name: "Delta Wing".to_string(),
            seat_number: "D-34".to_string(),
            wifi_name: Some("Corp-Guest".to_string()),
            summary: None,
            latitude: None,
            longitude: None,
            status,
            created_at: Utc::now() - Duration::seconds(age_secs),
            status_changed_at: None,
            status_changed_by: None,
        }
    }

    fn created_event(alert: Alert) -> AlertEvent {
        AlertEvent {
            seq: 1,
            kind: AlertEventKind::Created,
            created_at: alert.created_at,
            alert,
        }
    }

    #[test]
    fn notifies_exactly_once_per_alert() {
        let mut dispatcher = AlertDispatcher::new();
        let event = created_event(alert("Jane Doe", AlertStatus::Open, 0));

        let first = dispatcher.observe(&event);
        assert!(first.is_some());
        let notification = first.unwrap();
        assert_eq!(notification.title, "New Emergency: Jane Doe");
        assert_eq!(notification.body, "Bay: Delta Wing, Seat: D-34");

        // Replay after reconnect stays silent
        assert!(dispatcher.observe(&event).is_none());
    }

    #[test]
    fn status_change_never_notifies() {
        let mut dispatcher = AlertDispatcher::new();
        let mut a = alert("Jane Doe", AlertStatus::Open, 0);
        a.status = AlertStatus::Resolved;
        let event = AlertEvent {
            seq: 2,
            kind: AlertEventKind::StatusChanged,
            created_at: a.created_at,
            alert: a,
        };
        assert!(dispatcher.observe(&event).is_none());
    }

    #[test]
    fn separate_sessions_each_notify_once() {
        let event = created_event(alert("Jane Doe", AlertStatus::Open, 0));
        let mut doctor_session = AlertDispatcher::new();
        let mut it_session = AlertDispatcher::new();

        assert!(doctor_session.observe(&event).is_some());
        assert!(it_session.observe(&event).is_some());
        assert!(doctor_session.observe(&event).is_none());
        assert!(it_session.observe(&event).is_none());
    }

    #[test]
    fn resolved_alert_moves_to_history() {
        let a = alert("Jane Doe", AlertStatus::Open, 0);
        let id = a.id;
        let mut list = LiveList::new();
        list.apply(&created_event(a.clone()));
        assert_eq!(list.active().len(), 1);
        assert!(list.history().is_empty());

        let mut resolved = a;
        resolved.status = AlertStatus::Resolved;
        list.apply(&AlertEvent {
            seq: 2,
            kind: AlertEventKind::StatusChanged,
            created_at: resolved.created_at,
            alert: resolved,
        });
        assert!(list.active().is_empty());
        assert_eq!(list.history().len(), 1);
        assert_eq!(list.history()[0].id, id);
    }

    #[test]
    fn active_list_sorted_by_timestamp_descending() {
        let mut list = LiveList::new();
        list.apply(&created_event(alert("Old", AlertStatus::Open, 300)));
        list.apply(&created_event(alert("New", AlertStatus::Open, 0)));
        list.apply(&created_event(alert("Middle", AlertStatus::Open, 60)));

        let names: Vec<&str> = list.active().iter().map(|a| a.user_name.as_str()).collect();
        assert_eq!(names, vec!["New", "Middle", "Old"]);
    }

    #[test]
    fn duplicate_apply_does_not_duplicate_history() {
        let mut resolved = alert("Jane Doe", AlertStatus::Open, 0);
        resolved.status = AlertStatus::Resolved;
        let event = AlertEvent {
            seq: 2,
            kind: AlertEventKind::StatusChanged,
            created_at: resolved.created_at,
            alert: resolved,
        };

        // Two racing resolutions surface as repeated events at worst;
        // the list must not grow a second history entry.
        let mut list = LiveList::new();
        list.apply(&event);
        list.apply(&event);
        assert_eq!(list.history().len(), 1);
    }

    #[test]
    fn projection_strips_network_fields_for_non_it_roles() {
        let a = alert("Jane Doe", AlertStatus::Open, 0);
        assert!(project_for_role(&a, Role::Doctor).wifi_name.is_none());
        assert!(project_for_role(&a, Role::Employee).wifi_name.is_none());
        assert_eq!(
            project_for_role(&a, Role::ItTeam).wifi_name.as_deref(),
            Some("Corp-Guest")
        );
        assert_eq!(
            project_for_role(&a, Role::Admin).wifi_name.as_deref(),
            Some("Corp-Guest")
        );
    }
}
