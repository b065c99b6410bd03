//! Logical-time timer queue owned by a session.
//!
//! # Invariants
//! - Due timers pop in `(deadline, scheduling order)` order.
//! - A cancelled timer never fires.

use crate::generator::GenerationTicket;
use crate::model::note::NoteId;
use crate::model::Timestamp;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimerId(u64);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimerKind {
    /// Periodic sync interval.
    SyncTick,
    /// Keystroke inactivity debounce for the local typing indicator.
    TypingDebounce,
    /// Simulated completion of one response generation.
    Generation {
        note_id: NoteId,
        ticket: GenerationTicket,
    },
}

/// A timer that reached its deadline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FiredTimer {
    pub id: TimerId,
    pub deadline: Timestamp,
    pub kind: TimerKind,
}

#[derive(Debug, Default)]
pub struct TimerQueue {
    next_id: u64,
    queue: BTreeMap<(Timestamp, u64), TimerKind>,
    deadlines: BTreeMap<u64, Timestamp>,
}

impl TimerQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, deadline: Timestamp, kind: TimerKind) -> TimerId {
        self.next_id += 1;
        let id = self.next_id;
        self.queue.insert((deadline, id), kind);
        self.deadlines.insert(id, deadline);
        TimerId(id)
    }

    /// Cancels a pending timer. Returns whether it was still pending.
    pub fn cancel(&mut self, id: TimerId) -> bool {
        match self.deadlines.remove(&id.0) {
            Some(deadline) => self.queue.remove(&(deadline, id.0)).is_some(),
            None => false,
        }
    }

    /// Pops the earliest timer whose deadline is `<= now`.
    pub fn pop_due(&mut self, now: Timestamp) -> Option<FiredTimer> {
        let (&(deadline, id), _) = self.queue.first_key_value()?;
        if deadline > now {
            return None;
        }
        let kind = self.queue.remove(&(deadline, id))?;
        self.deadlines.remove(&id);
        Some(FiredTimer {
            id: TimerId(id),
            deadline,
            kind,
        })
    }

    pub fn next_deadline(&self) -> Option<Timestamp> {
        self.queue.keys().next().map(|(deadline, _)| *deadline)
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Cancels every pending timer.
    pub fn clear(&mut self) {
        self.queue.clear();
        self.deadlines.clear();
    }
}
