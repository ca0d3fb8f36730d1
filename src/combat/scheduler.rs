//! Virtual-clock action queue. The single source of ordering for everything a
//! resolution does: entries fire by `(fire_at, insertion order)`, never by the order
//! callers happen to inspect them.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

/// A queued action tagged with the match generation it belongs to.
#[derive(Debug, Clone)]
pub struct Scheduled<A> {
    pub fire_at: u64,
    pub generation: u64,
    pub action: A,
    seq: u64,
}

impl<A> PartialEq for Scheduled<A> {
    fn eq(&self, other: &Self) -> bool {
        self.fire_at == other.fire_at && self.seq == other.seq
    }
}

impl<A> Eq for Scheduled<A> {}

impl<A> PartialOrd for Scheduled<A> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<A> Ord for Scheduled<A> {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.fire_at, self.seq).cmp(&(other.fire_at, other.seq))
    }
}

#[derive(Debug, Clone)]
pub struct Scheduler<A> {
    now: u64,
    next_seq: u64,
    queue: BinaryHeap<Reverse<Scheduled<A>>>,
}

impl<A> Default for Scheduler<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A> Scheduler<A> {
    pub fn new() -> Self {
        Self {
            now: 0,
            next_seq: 0,
            queue: BinaryHeap::new(),
        }
    }

    /// Current virtual time in milliseconds. Never moves backwards.
    pub fn now(&self) -> u64 {
        self.now
    }

    /// Queue `action` to fire `delay_ms` from now. Returns the absolute fire time.
    pub fn schedule(&mut self, delay_ms: u64, generation: u64, action: A) -> u64 {
        let fire_at = self.now.saturating_add(delay_ms);
        let seq = self.next_seq;
        self.next_seq += 1;
        self.queue.push(Reverse(Scheduled {
            fire_at,
            generation,
            action,
            seq,
        }));
        fire_at
    }

    pub fn next_due(&self) -> Option<u64> {
        self.queue.peek().map(|Reverse(entry)| entry.fire_at)
    }

    /// Pop the earliest entry due at or before `until_ms`, moving the clock to its fire time.
    pub fn pop_due(&mut self, until_ms: u64) -> Option<Scheduled<A>> {
        if self.next_due()? > until_ms {
            return None;
        }
        let Reverse(entry) = self.queue.pop()?;
        self.now = self.now.max(entry.fire_at);
        Some(entry)
    }

    pub fn advance_clock(&mut self, to_ms: u64) {
        self.now = self.now.max(to_ms);
    }

    /// Drop every entry not belonging to `generation`. Returns how many were dropped.
    pub fn retain_generation(&mut self, generation: u64) -> usize {
        let before = self.queue.len();
        self.queue.retain(|Reverse(entry)| entry.generation == generation);
        before - self.queue.len()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fires_by_time_then_insertion_order() {
        let mut scheduler = Scheduler::new();
        scheduler.schedule(200, 0, "late");
        scheduler.schedule(0, 0, "first");
        scheduler.schedule(200, 0, "late-second");
        scheduler.schedule(50, 0, "middle");

        let mut fired = Vec::new();
        while let Some(entry) = scheduler.pop_due(u64::MAX) {
            fired.push((entry.fire_at, entry.action));
        }
        assert_eq!(
            fired,
            vec![(0, "first"), (50, "middle"), (200, "late"), (200, "late-second")]
        );
        assert_eq!(scheduler.now(), 200);
    }

    #[test]
    fn pop_due_respects_horizon() {
        let mut scheduler = Scheduler::new();
        scheduler.schedule(100, 0, ());
        assert!(scheduler.pop_due(99).is_none());
        assert_eq!(scheduler.now(), 0);
        assert!(scheduler.pop_due(100).is_some());
    }

    #[test]
    fn delays_are_relative_to_the_current_clock() {
        let mut scheduler = Scheduler::new();
        scheduler.advance_clock(1_000);
        assert_eq!(scheduler.schedule(200, 0, ()), 1_200);
        scheduler.advance_clock(10);
        assert_eq!(scheduler.now(), 1_000);
    }

    #[test]
    fn retain_generation_drops_stale_entries() {
        let mut scheduler = Scheduler::new();
        scheduler.schedule(10, 1, 'a');
        scheduler.schedule(20, 2, 'b');
        scheduler.schedule(30, 1, 'c');
        assert_eq!(scheduler.retain_generation(2), 2);
        assert_eq!(scheduler.len(), 1);
        assert_eq!(scheduler.pop_due(u64::MAX).map(|e| e.action), Some('b'));
    }
}
