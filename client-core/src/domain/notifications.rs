//! Transient notification queue for toast-style messages.
//!
//! Expiry is pull-based: entries carry an absolute deadline computed from
//! the injected clock, and consumers sweep on render rather than relying on
//! background timers. That keeps expiry deterministic under test and avoids
//! timers outliving dismissed entries.

use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Severity of a notification; drives styling only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Info,
    Success,
    Warning,
    Error,
}

impl NotificationKind {
    /// Canonical lower-case name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Success => "success",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown notification kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseNotificationKindError(String);

impl fmt::Display for ParseNotificationKindError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown notification kind: {}", self.0)
    }
}

impl std::error::Error for ParseNotificationKindError {}

impl FromStr for NotificationKind {
    type Err = ParseNotificationKindError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "info" => Ok(Self::Info),
            "success" => Ok(Self::Success),
            "warning" => Ok(Self::Warning),
            "error" => Ok(Self::Error),
            other => Err(ParseNotificationKindError(other.to_owned())),
        }
    }
}

/// Queue-assigned notification identifier.
///
/// Callers never supply ids; the queue mints one per entry so dismissal
/// cannot collide across producers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NotificationId(Uuid);

impl NotificationId {
    fn random() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for NotificationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A queued notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    id: NotificationId,
    kind: NotificationKind,
    title: String,
    message: String,
    created_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
}

impl Notification {
    /// Queue-assigned identifier, used for dismissal.
    pub fn id(&self) -> NotificationId {
        self.id
    }

    /// Severity of the notification.
    pub fn kind(&self) -> NotificationKind {
        self.kind
    }

    /// Short heading shown in the toast.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Body text shown under the title.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Instant the entry was enqueued.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Instant the entry stops being live.
    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    /// True once the entry's deadline has passed.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// Queue policy: default lifetime and how many entries render at once.
#[derive(Debug, Clone, Copy)]
pub struct QueuePolicy {
    /// Lifetime applied when the producer does not supply one.
    pub default_ttl: Duration,
    /// Maximum entries surfaced by [`NotificationQueue::visible`]; older
    /// entries stay queued until something ahead of them leaves.
    pub display_limit: usize,
}

impl Default for QueuePolicy {
    fn default() -> Self {
        Self {
            default_ttl: Duration::from_secs(5),
            display_limit: 5,
        }
    }
}

/// In-memory queue of transient notifications.
#[derive(Clone)]
pub struct NotificationQueue {
    clock: Arc<dyn Clock>,
    policy: QueuePolicy,
    entries: Arc<Mutex<Vec<Notification>>>,
}

impl NotificationQueue {
    /// Create a queue with the default policy.
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self::with_policy(clock, QueuePolicy::default())
    }

    /// Create a queue with an explicit policy.
    pub fn with_policy(clock: Arc<dyn Clock>, policy: QueuePolicy) -> Self {
        Self {
            clock,
            policy,
            entries: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Enqueue a notification with the policy's default lifetime.
    pub fn push(
        &self,
        kind: NotificationKind,
        title: impl Into<String>,
        message: impl Into<String>,
    ) -> NotificationId {
        self.push_with_ttl(kind, title, message, self.policy.default_ttl)
    }

    /// Enqueue a notification with an explicit lifetime.
    pub fn push_with_ttl(
        &self,
        kind: NotificationKind,
        title: impl Into<String>,
        message: impl Into<String>,
        ttl: Duration,
    ) -> NotificationId {
        let now = self.clock.utc();
        let expires_at = deadline(now, ttl);
        let entry = Notification {
            id: NotificationId::random(),
            kind,
            title: title.into(),
            message: message.into(),
            created_at: now,
            expires_at,
        };
        let id = entry.id;

        let mut entries = self.lock_entries();
        entries.retain(|existing| !existing.is_expired(now));
        entries.push(entry);
        id
    }

    /// Remove an entry by id before its lifetime elapses. Returns `false`
    /// when the id is unknown or already gone; dismissing twice is not an
    /// error.
    pub fn dismiss(&self, id: NotificationId) -> bool {
        let mut entries = self.lock_entries();
        let before = entries.len();
        entries.retain(|entry| entry.id != id);
        entries.len() < before
    }

    /// Drop expired entries, returning how many were removed. Consumers
    /// call this on render.
    pub fn sweep_expired(&self) -> usize {
        let now = self.clock.utc();
        let mut entries = self.lock_entries();
        let before = entries.len();
        entries.retain(|entry| !entry.is_expired(now));
        before - entries.len()
    }

    /// All live entries in arrival order.
    pub fn active(&self) -> Vec<Notification> {
        let now = self.clock.utc();
        self.lock_entries()
            .iter()
            .filter(|entry| !entry.is_expired(now))
            .cloned()
            .collect()
    }

    /// The live entries that should render right now: the newest entries
    /// up to the display limit, in arrival order. The oldest beyond the
    /// limit are collapsed out of view but stay in [`NotificationQueue::active`]
    /// until they expire or are dismissed.
    pub fn visible(&self) -> Vec<Notification> {
        let mut live = self.active();
        let excess = live.len().saturating_sub(self.policy.display_limit);
        live.split_off(excess)
    }

    fn lock_entries(&self) -> MutexGuard<'_, Vec<Notification>> {
        match self.entries.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

/// Absolute deadline for an entry created at `now` with lifetime `ttl`.
fn deadline(now: DateTime<Utc>, ttl: Duration) -> DateTime<Utc> {
    let delta = TimeDelta::from_std(ttl).unwrap_or(TimeDelta::MAX);
    now.checked_add_signed(delta)
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use rstest::rstest;

    use super::*;
    use crate::test_support::MutableClock;

    fn queue_with_clock() -> (NotificationQueue, Arc<MutableClock>) {
        let clock = Arc::new(MutableClock::default());
        let queue = NotificationQueue::new(Arc::clone(&clock) as Arc<dyn Clock>);
        (queue, clock)
    }

    #[rstest]
    fn entries_expire_after_their_ttl() {
        let (queue, clock) = queue_with_clock();
        queue.push(NotificationKind::Info, "Saved", "Your changes were saved");

        clock.advance(Duration::from_secs(4));
        assert_eq!(queue.active().len(), 1);

        clock.advance(Duration::from_secs(1));
        assert_eq!(queue.sweep_expired(), 1);
        assert!(queue.active().is_empty());
    }

    #[rstest]
    fn dismiss_removes_entry_and_reports_unknown_ids() {
        let (queue, _clock) = queue_with_clock();
        let id = queue.push(NotificationKind::Error, "Login failed", "Check your password");

        assert!(queue.dismiss(id));
        assert!(queue.active().is_empty());
        assert!(!queue.dismiss(id));
    }

    #[rstest]
    fn each_entry_tracks_its_own_lifetime() {
        let (queue, clock) = queue_with_clock();
        queue.push_with_ttl(
            NotificationKind::Info,
            "Short",
            "",
            Duration::from_secs(2),
        );
        let long = queue.push_with_ttl(
            NotificationKind::Info,
            "Long",
            "",
            Duration::from_secs(10),
        );

        clock.advance(Duration::from_secs(3));
        let live = queue.active();
        assert_eq!(live.len(), 1);
        assert_eq!(live[0].id(), long);
    }

    #[rstest]
    fn ids_are_unique_for_identical_payloads() {
        let (queue, _clock) = queue_with_clock();
        let first = queue.push(NotificationKind::Info, "Same", "payload");
        let second = queue.push(NotificationKind::Info, "Same", "payload");
        assert_ne!(first, second);

        assert!(queue.dismiss(first));
        let remaining = queue.active();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].id(), second);
    }

    #[rstest]
    fn visible_keeps_the_newest_entries_while_active_keeps_all() {
        let (queue, _clock) = queue_with_clock();
        for index in 0..7 {
            queue.push(NotificationKind::Info, format!("n{index}"), "");
        }

        assert_eq!(queue.active().len(), 7);
        let visible = queue.visible();
        assert_eq!(visible.len(), 5);
        assert_eq!(visible[0].title(), "n2");
        assert_eq!(visible[4].title(), "n6");
    }

    #[rstest]
    fn collapsed_entries_reappear_when_a_newer_one_leaves() {
        let (queue, _clock) = queue_with_clock();
        let ids: Vec<_> = (0..6)
            .map(|index| queue.push(NotificationKind::Info, format!("n{index}"), ""))
            .collect();
        assert_eq!(queue.visible()[0].title(), "n1");

        assert!(queue.dismiss(ids[5]));
        let visible = queue.visible();
        assert_eq!(visible.len(), 5);
        assert_eq!(visible[0].title(), "n0");
        assert_eq!(visible[4].title(), "n4");
    }

    #[rstest]
    #[case(NotificationKind::Info, "info")]
    #[case(NotificationKind::Success, "success")]
    #[case(NotificationKind::Warning, "warning")]
    #[case(NotificationKind::Error, "error")]
    fn kind_round_trips_through_text(#[case] kind: NotificationKind, #[case] text: &str) {
        assert_eq!(kind.as_str(), text);
        assert_eq!(text.parse::<NotificationKind>(), Ok(kind));
    }

    #[rstest]
    fn kind_rejects_unknown_names() {
        let err = "fatal"
            .parse::<NotificationKind>()
            .expect_err("unknown kind must fail");
        assert_eq!(err.to_string(), "unknown notification kind: fatal");
    }
}
