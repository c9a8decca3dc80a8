//! Notification feed: newest-first log of dashboard events.

use crate::model::{Notification, NotificationId, NotificationKind};
use std::collections::VecDeque;
use std::time::SystemTime;

/// Append/prune log of notifications, newest first.
///
/// Growth is unbounded; at dashboard scale nothing is evicted.
#[derive(Debug)]
pub struct NotificationFeed {
    entries: VecDeque<Notification>,
    next_seq: u64,
}

impl NotificationFeed {
    pub fn new() -> Self {
        Self {
            entries: VecDeque::new(),
            next_seq: 1,
        }
    }

    /// Builds a feed from existing entries, which must already be newest first.
    ///
    /// Fresh ids continue after the highest `N###` id present.
    pub fn with_entries(entries: Vec<Notification>) -> Self {
        let next_seq = entries
            .iter()
            .filter_map(|n| n.id.as_str().strip_prefix('N')?.parse::<u64>().ok())
            .max()
            .unwrap_or(0)
            + 1;
        Self {
            entries: entries.into(),
            next_seq,
        }
    }

    /// Records a new unread notification at the front of the feed.
    pub fn record(
        &mut self,
        message: impl Into<String>,
        kind: NotificationKind,
        timestamp: SystemTime,
    ) -> Notification {
        let notification = Notification {
            id: NotificationId(format!("N{:03}", self.next_seq)),
            message: message.into(),
            kind,
            timestamp,
            read: false,
        };
        self.next_seq += 1;
        self.entries.push_front(notification.clone());
        notification
    }

    /// Marks an entry read. Unknown ids are ignored.
    pub fn mark_read(&mut self, id: &NotificationId) {
        if let Some(entry) = self.entries.iter_mut().find(|n| &n.id == id) {
            entry.read = true;
        }
    }

    /// Removes an entry. Unknown ids are ignored.
    pub fn dismiss(&mut self, id: &NotificationId) {
        self.entries.retain(|n| &n.id != id);
    }

    pub fn unread_count(&self) -> usize {
        self.entries.iter().filter(|n| !n.read).count()
    }

    pub fn get(&self, id: &NotificationId) -> Option<&Notification> {
        self.entries.iter().find(|n| &n.id == id)
    }

    /// Iterates newest first.
    pub fn iter(&self) -> impl Iterator<Item = &Notification> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for NotificationFeed {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, UNIX_EPOCH};

    fn at(secs: u64) -> SystemTime {
        UNIX_EPOCH + Duration::from_secs(secs)
    }

    fn messages(feed: &NotificationFeed) -> Vec<&str> {
        feed.iter().map(|n| n.message.as_str()).collect()
    }

    #[test]
    fn test_record_prepends() {
        let mut feed = NotificationFeed::new();
        feed.record("m1", NotificationKind::Info, at(1));
        feed.record("m2", NotificationKind::Warning, at(2));

        assert_eq!(messages(&feed), vec!["m2", "m1"]);
        assert_eq!(feed.unread_count(), 2);
    }

    #[test]
    fn test_record_returns_fresh_unread_entry() {
        let mut feed = NotificationFeed::new();
        let a = feed.record("a", NotificationKind::Info, at(10));
        let b = feed.record("b", NotificationKind::Error, at(11));

        assert_ne!(a.id, b.id);
        assert!(!b.read);
        assert_eq!(b.timestamp, at(11));
        assert_eq!(feed.get(&b.id), Some(&b));
    }

    #[test]
    fn test_ids_continue_after_existing_entries() {
        let seeded = Notification {
            id: NotificationId::from("N003"),
            message: "seed".into(),
            kind: NotificationKind::Info,
            timestamp: at(0),
            read: true,
        };
        let mut feed = NotificationFeed::with_entries(vec![seeded]);
        let fresh = feed.record("next", NotificationKind::Info, at(1));

        assert_eq!(fresh.id.as_str(), "N004");
    }

    #[test]
    fn test_mark_read_is_idempotent() {
        let mut feed = NotificationFeed::new();
        let n = feed.record("m", NotificationKind::Info, at(1));
        feed.record("other", NotificationKind::Info, at(2));

        feed.mark_read(&n.id);
        assert_eq!(feed.unread_count(), 1);
        feed.mark_read(&n.id);
        assert_eq!(feed.unread_count(), 1);
        assert!(feed.get(&n.id).unwrap().read);
    }

    #[test]
    fn test_dismiss_is_idempotent() {
        let mut feed = NotificationFeed::new();
        let n = feed.record("m1", NotificationKind::Info, at(1));
        feed.record("m2", NotificationKind::Info, at(2));

        feed.dismiss(&n.id);
        assert_eq!(messages(&feed), vec!["m2"]);
        feed.dismiss(&n.id);
        assert_eq!(messages(&feed), vec!["m2"]);
    }

    #[test]
    fn test_unknown_ids_are_ignored() {
        let mut feed = NotificationFeed::new();
        feed.record("m", NotificationKind::Info, at(1));
        let ghost = NotificationId::from("N999");

        feed.mark_read(&ghost);
        feed.dismiss(&ghost);

        assert_eq!(feed.len(), 1);
        assert_eq!(feed.unread_count(), 1);
    }
}
