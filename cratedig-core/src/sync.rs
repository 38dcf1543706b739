//! Holding area for a navigation snapshot that arrives before the catalog.

use crate::protocol::NavSnapshot;

/// Single-slot buffer: offering replaces any held value, taking empties it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PendingSnapshot {
    slot: Option<NavSnapshot>,
}

impl PendingSnapshot {
    #[must_use]
    pub const fn new() -> Self {
        Self { slot: None }
    }

    /// Store `snapshot`, returning whatever it displaced.
    pub fn offer(&mut self, snapshot: NavSnapshot) -> Option<NavSnapshot> {
        self.slot.replace(snapshot)
    }

    /// Remove and return the held snapshot. A second call yields `None`.
    pub fn take(&mut self) -> Option<NavSnapshot> {
        self.slot.take()
    }

    #[must_use]
    pub const fn is_pending(&self) -> bool {
        self.slot.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(crate_index: usize) -> NavSnapshot {
        NavSnapshot {
            crate_index,
            ..NavSnapshot::default()
        }
    }

    #[test]
    fn test_last_write_wins() {
        let mut pending = PendingSnapshot::new();
        assert!(pending.offer(snapshot(1)).is_none());
        assert_eq!(pending.offer(snapshot(2)), Some(snapshot(1)));
        assert_eq!(pending.take(), Some(snapshot(2)));
    }

    #[test]
    fn test_consumed_once() {
        let mut pending = PendingSnapshot::new();
        pending.offer(snapshot(3));
        assert!(pending.is_pending());
        assert!(pending.take().is_some());
        assert!(!pending.is_pending());
        assert!(pending.take().is_none());
    }
}
