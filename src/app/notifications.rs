//! In-memory board of transient status messages.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use tracing::{error, info};

use crate::domain::feedback::{NotificationSink, Severity};

/// How long a message stays visible.
pub const NOTIFICATION_TTL_SECS: i64 = 5;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub id: u64,
    pub message: String,
    pub severity: Severity,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// Holds notifications until they expire. Every message is also logged.
pub struct NotificationBoard {
    ttl: Duration,
    next_id: AtomicU64,
    entries: Mutex<VecDeque<Notification>>,
}

impl Default for NotificationBoard {
    fn default() -> Self {
        Self::with_ttl(Duration::seconds(NOTIFICATION_TTL_SECS))
    }
}

impl NotificationBoard {
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            ttl,
            next_id: AtomicU64::new(1),
            entries: Mutex::new(VecDeque::new()),
        }
    }

    /// Notifications still visible now, oldest first.
    pub fn active(&self) -> Vec<Notification> {
        self.active_at(Utc::now())
    }

    pub fn active_at(&self, now: DateTime<Utc>) -> Vec<Notification> {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.retain(|n| n.expires_at > now);
        entries.iter().cloned().collect()
    }

    /// Most recent visible notification.
    pub fn latest(&self) -> Option<Notification> {
        self.active().pop()
    }

    fn push_at(&self, message: &str, severity: Severity, now: DateTime<Utc>) {
        let notification = Notification {
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            message: message.to_string(),
            severity,
            created_at: now,
            expires_at: now + self.ttl,
        };
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.retain(|n| n.expires_at > now);
        entries.push_back(notification);
    }
}

impl NotificationSink for NotificationBoard {
    fn notify(&self, message: &str, severity: Severity) {
        match severity {
            Severity::Error => error!(%severity, "{}", message),
            Severity::Info | Severity::Success => info!(%severity, "{}", message),
        }
        self.push_at(message, severity, Utc::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notifications_expire_after_ttl() {
        let board = NotificationBoard::default();
        let t0 = Utc::now();
        board.push_at("Vote cast successfully!", Severity::Success, t0);
        board.push_at("Registering as citizen...", Severity::Info, t0 + Duration::seconds(3));

        assert_eq!(board.active_at(t0 + Duration::seconds(1)).len(), 2);

        let later = board.active_at(t0 + Duration::seconds(6));
        assert_eq!(later.len(), 1);
        assert_eq!(later[0].message, "Registering as citizen...");

        assert!(board.active_at(t0 + Duration::seconds(9)).is_empty());
    }

    #[test]
    fn ids_increase_and_latest_is_newest() {
        let board = NotificationBoard::default();
        board.notify("first", Severity::Info);
        board.notify("second", Severity::Error);

        let active = board.active();
        assert!(active[0].id < active[1].id);
        let latest = board.latest().unwrap();
        assert_eq!(latest.message, "second");
        assert_eq!(latest.severity, Severity::Error);
    }
}
