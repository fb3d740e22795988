// Read-mostly runtime status shared between the watcher task and the status
// endpoint. The watcher is the only writer; the endpoint only reads. The
// mutable level state itself is never shared.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Mutex;

use chrono::{DateTime, Utc};

/// Counters updated by the watcher at the end of each completed cycle.
#[derive(Debug, Default)]
pub struct StatusShared {
    cycles: AtomicU64,
    failed_fetches: AtomicU64,
    events_emitted: AtomicU64,
    last_roster_size: AtomicUsize,
    last_cycle: Mutex<Option<DateTime<Utc>>>,
}

/// Point-in-time copy of the counters, for rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusSnapshot {
    pub cycles: u64,
    pub failed_fetches: u64,
    pub events_emitted: u64,
    pub last_roster_size: usize,
    pub last_cycle: Option<DateTime<Utc>>,
}

impl StatusShared {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one completed cycle (fetch succeeded, state persisted).
    pub fn record_cycle(&self, roster_size: usize, events: usize) {
        self.cycles.fetch_add(1, Ordering::Relaxed);
        self.events_emitted.fetch_add(events as u64, Ordering::Relaxed);
        self.last_roster_size.store(roster_size, Ordering::Relaxed);
        if let Ok(mut last) = self.last_cycle.lock() {
            *last = Some(Utc::now());
        }
    }

    /// Record a cycle abandoned because the fetch failed.
    pub fn record_failed_fetch(&self) {
        self.failed_fetches.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatusSnapshot {
        StatusSnapshot {
            cycles: self.cycles.load(Ordering::Relaxed),
            failed_fetches: self.failed_fetches.load(Ordering::Relaxed),
            events_emitted: self.events_emitted.load(Ordering::Relaxed),
            last_roster_size: self.last_roster_size.load(Ordering::Relaxed),
            last_cycle: self.last_cycle.lock().ok().and_then(|last| *last),
        }
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_at_zero() {
        let status = StatusShared::new();
        let snap = status.snapshot();
        assert_eq!(snap.cycles, 0);
        assert_eq!(snap.failed_fetches, 0);
        assert_eq!(snap.events_emitted, 0);
        assert_eq!(snap.last_roster_size, 0);
        assert!(snap.last_cycle.is_none());
    }

    #[test]
    fn record_cycle_accumulates() {
        let status = StatusShared::new();
        status.record_cycle(12, 2);
        status.record_cycle(9, 0);

        let snap = status.snapshot();
        assert_eq!(snap.cycles, 2);
        assert_eq!(snap.events_emitted, 2);
        assert_eq!(snap.last_roster_size, 9);
        assert!(snap.last_cycle.is_some());
    }

    #[test]
    fn failed_fetch_does_not_count_as_cycle() {
        let status = StatusShared::new();
        status.record_failed_fetch();

        let snap = status.snapshot();
        assert_eq!(snap.failed_fetches, 1);
        assert_eq!(snap.cycles, 0);
        assert!(snap.last_cycle.is_none());
    }
}
