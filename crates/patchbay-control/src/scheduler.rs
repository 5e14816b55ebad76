//! Keyed, cancellable delayed tasks on an explicit clock.
//!
//! Every delayed action in a session (debounced resends, queue flushes,
//! reconciliation bursts) lives in one [`Scheduler`]. Tasks are keyed by
//! `(subject, purpose)`, so scheduling under an existing key replaces the
//! pending task instead of stacking a second one. Time is a [`Duration`]
//! since an arbitrary origin supplied by the host, which keeps tests on a
//! virtual clock.

use std::collections::BTreeMap;
use std::time::Duration;

#[derive(Debug, Clone)]
struct Entry<T> {
    deadline: Duration,
    seq: u64,
    task: T,
}

/// Pending tasks keyed by `K`.
#[derive(Debug, Clone)]
pub struct Scheduler<K, T> {
    entries: BTreeMap<K, Entry<T>>,
    next_seq: u64,
}

impl<K: Ord + Clone, T> Default for Scheduler<K, T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Ord + Clone, T> Scheduler<K, T> {
    /// Creates an empty scheduler.
    pub fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
            next_seq: 0,
        }
    }

    /// Schedules `task` at `deadline`, replacing any task pending under `key`.
    ///
    /// Returns the replaced task, if any.
    pub fn schedule_or_replace(&mut self, key: K, deadline: Duration, task: T) -> Option<T> {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.entries
            .insert(key, Entry { deadline, seq, task })
            .map(|old| old.task)
    }

    /// Cancels the task pending under `key`.
    pub fn cancel(&mut self, key: &K) -> Option<T> {
        self.entries.remove(key).map(|e| e.task)
    }

    /// Cancels every task whose key matches `pred`. Returns how many were dropped.
    pub fn cancel_where(&mut self, mut pred: impl FnMut(&K) -> bool) -> usize {
        let before = self.entries.len();
        self.entries.retain(|k, _| !pred(k));
        before - self.entries.len()
    }

    /// Earliest pending deadline.
    pub fn next_deadline(&self) -> Option<Duration> {
        self.entries.values().map(|e| e.deadline).min()
    }

    /// Removes and returns the earliest task due at or before `now`.
    ///
    /// Ties are broken by scheduling order.
    pub fn pop_due(&mut self, now: Duration) -> Option<(K, T)> {
        let key = self
            .entries
            .iter()
            .filter(|(_, e)| e.deadline <= now)
            .min_by_key(|(_, e)| (e.deadline, e.seq))
            .map(|(k, _)| k.clone())?;
        self.entries.remove(&key).map(|e| (key, e.task))
    }

    /// Number of pending tasks.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing is pending.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
