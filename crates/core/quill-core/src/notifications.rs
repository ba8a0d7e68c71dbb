//! Transient user notifications (toasts)

use serde::{Deserialize, Serialize};
use std::fmt;

/// Notification identifier, unique for the lifetime of its center
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NotificationId(pub u64);

impl fmt::Display for NotificationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "toast-{}", self.0)
    }
}

/// Visual weight of a notification
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Variant {
    /// Informational
    #[default]
    Default,
    /// Error
    Destructive,
}

/// One toast
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    /// Identifier
    pub id: NotificationId,
    /// Headline
    pub title: String,
    /// Detail text
    pub description: Option<String>,
    /// Visual weight
    pub variant: Variant,
    /// False once dismissed but not yet removed
    pub open: bool,
}

/// Bounded, newest-first list of notifications
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notifications {
    items: Vec<Notification>,
    next_id: u64,
    limit: usize,
}

impl Default for Notifications {
    fn default() -> Self {
        Self::with_limit(1)
    }
}

impl Notifications {
    /// Keep at most `limit` notifications (at least one)
    pub fn with_limit(limit: usize) -> Self {
        Self {
            items: Vec::new(),
            next_id: 1,
            limit: limit.max(1),
        }
    }

    /// Add a notification in front, evicting the oldest beyond the limit
    pub fn push(
        &mut self,
        title: impl Into<String>,
        description: Option<String>,
        variant: Variant,
    ) -> NotificationId {
        let id = NotificationId(self.next_id);
        self.next_id += 1;
        self.items.insert(
            0,
            Notification {
                id,
                title: title.into(),
                description,
                variant,
                open: true,
            },
        );
        self.items.truncate(self.limit);
        id
    }

    /// Close `id`; returns false if it is not present
    pub fn dismiss(&mut self, id: NotificationId) -> bool {
        match self.items.iter_mut().find(|n| n.id == id) {
            Some(item) => {
                item.open = false;
                true
            }
            None => false,
        }
    }

    /// Close every notification
    pub fn dismiss_all(&mut self) {
        for item in &mut self.items {
            item.open = false;
        }
    }

    /// Delete `id`; returns false if it is not present
    pub fn remove(&mut self, id: NotificationId) -> bool {
        let before = self.items.len();
        self.items.retain(|n| n.id != id);
        self.items.len() != before
    }

    /// Delete every dismissed notification
    pub fn remove_dismissed(&mut self) {
        self.items.retain(|n| n.open);
    }

    /// Look up a notification
    pub fn get(&self, id: NotificationId) -> Option<&Notification> {
        self.items.iter().find(|n| n.id == id)
    }

    /// All notifications, newest first
    pub fn items(&self) -> &[Notification] {
        &self.items
    }

    /// Notifications not yet dismissed
    pub fn open(&self) -> impl Iterator<Item = &Notification> {
        self.items.iter().filter(|n| n.open)
    }

    /// Capacity
    pub fn limit(&self) -> usize {
        self.limit
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_strictly_increasing() {
        let mut center = Notifications::with_limit(10);
        let ids: Vec<NotificationId> = (0..5)
            .map(|i| center.push(format!("n{}", i), None, Variant::Default))
            .collect();
        assert!(ids.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_ids_not_reused_after_removal() {
        let mut center = Notifications::with_limit(3);
        let first = center.push("a", None, Variant::Default);
        assert!(center.remove(first));
        let second = center.push("b", None, Variant::Default);
        assert_ne!(first, second);
    }

    #[test]
    fn test_limit_evicts_oldest() {
        let mut center = Notifications::default();
        let old = center.push("old", None, Variant::Default);
        let new = center.push("new", Some("detail".into()), Variant::Destructive);
        assert_eq!(center.items().len(), 1);
        assert!(center.get(old).is_none());
        assert_eq!(center.items()[0].id, new);
    }

    #[test]
    fn test_dismiss_targets_only_given_id() {
        let mut center = Notifications::with_limit(3);
        let a = center.push("a", None, Variant::Default);
        let b = center.push("b", None, Variant::Default);
        let c = center.push("c", None, Variant::Default);

        assert!(center.dismiss(b));
        assert!(center.get(a).unwrap().open);
        assert!(!center.get(b).unwrap().open);
        assert!(center.get(c).unwrap().open);

        center.remove_dismissed();
        let remaining: Vec<NotificationId> = center.items().iter().map(|n| n.id).collect();
        assert_eq!(remaining, vec![c, a]);
    }

    #[test]
    fn test_unknown_id_is_noop() {
        let mut center = Notifications::with_limit(2);
        let a = center.push("a", None, Variant::Default);
        assert!(!center.dismiss(NotificationId(999)));
        assert!(!center.remove(NotificationId(999)));
        assert!(center.get(a).unwrap().open);
    }

    #[test]
    fn test_dismiss_all() {
        let mut center = Notifications::with_limit(2);
        center.push("a", None, Variant::Default);
        center.push("b", None, Variant::Default);
        center.dismiss_all();
        assert_eq!(center.open().count(), 0);
        assert_eq!(center.items().len(), 2);
    }
}
