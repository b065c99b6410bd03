//! Snapshot synchronization engine.
//!
//! # Responsibility
//! - Drive the `Disconnected -> Connecting -> Connected` lifecycle.
//! - Publish local state stamped with a strictly increasing logical clock.
//! - Apply remote snapshots under the whole-snapshot clock gate.
//!
//! # Invariants
//! - A remote snapshot is applied only when its clock is strictly greater
//!   than every clock observed so far; it then replaces notes, positions,
//!   responses and non-local participants wholesale.
//! - Every published clock is greater than both the previous published
//!   clock and the highest observed clock.
//! - `LogicalClock::MAX` is never published or applied. A snapshot carrying
//!   it could never be superseded.
//! - Background failures (medium I/O, malformed payloads) are logged and
//!   leave local state untouched.
//!
//! Consistency limitation: there is no field-level merge. Two participants
//! editing between sync points can overwrite each other's unsynced changes.

use crate::model::snapshot::{LogicalClock, SharedSnapshot};
use crate::model::Timestamp;
use crate::store::note_store::{NoteStore, StoreContents};
use crate::store::presence::PresenceTracker;
use crate::sync::medium::SharedMedium;
use log::{debug, info, warn};

/// Connection lifecycle of one participant session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    Disconnected,
    Connecting,
    Connected,
}

/// Result of considering one remote payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestOutcome {
    /// Nothing is published yet.
    Empty,
    /// Remote snapshot replaced local state.
    Applied(LogicalClock),
    /// Remote clock did not exceed the highest observed clock.
    Stale {
        remote: LogicalClock,
        observed: LogicalClock,
    },
    /// Payload could not be decoded; treated as no update.
    Malformed,
    /// Medium could not be read; treated as no update.
    Unavailable,
    /// Remote clock is `LogicalClock::MAX`; rejected so the board stays
    /// writable.
    Exhausted,
}

impl IngestOutcome {
    /// Whether the remote snapshot replaced local state.
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied(_))
    }
}

/// What one periodic tick did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickReport {
    pub expired: usize,
    pub ingest: IngestOutcome,
    /// Clock of the published snapshot, `None` when publishing failed.
    pub published: Option<LogicalClock>,
}

pub struct SyncEngine<M: SharedMedium> {
    medium: M,
    state: SyncState,
    last_published: LogicalClock,
    highest_observed: LogicalClock,
}

impl<M: SharedMedium> SyncEngine<M> {
    pub fn new(medium: M) -> Self {
        Self {
            medium,
            state: SyncState::Disconnected,
            last_published: 0,
            highest_observed: 0,
        }
    }

    pub fn state(&self) -> SyncState {
        self.state
    }

    pub fn is_connected(&self) -> bool {
        self.state == SyncState::Connected
    }

    pub fn last_published(&self) -> LogicalClock {
        self.last_published
    }

    pub fn highest_observed(&self) -> LogicalClock {
        self.highest_observed
    }

    pub fn medium(&self) -> &M {
        &self.medium
    }

    /// Enters `Connecting`, loads whatever snapshot is currently published,
    /// and enters `Connected`.
    pub fn connect(&mut self, store: &mut NoteStore, presence: &mut PresenceTracker) -> IngestOutcome {
        self.state = SyncState::Connecting;
        info!("event=sync_connect module=sync status=start");
        let outcome = self.pull(store, presence);
        self.state = SyncState::Connected;
        info!(
            "event=sync_connect module=sync status=ok ingest={:?} observed_clock={}",
            outcome, self.highest_observed
        );
        outcome
    }

    /// Stops syncing. Observed clocks are kept so a later reconnect never
    /// accepts a snapshot older than one already seen.
    pub fn disconnect(&mut self) {
        if self.state != SyncState::Disconnected {
            info!(
                "event=sync_disconnect module=sync status=ok last_published={}",
                self.last_published
            );
        }
        self.state = SyncState::Disconnected;
    }

    /// One periodic sync step: expire stale participants, ingest the
    /// published snapshot, then publish local state.
    ///
    /// Returns `None` when not connected.
    pub fn tick(
        &mut self,
        now: Timestamp,
        store: &mut NoteStore,
        presence: &mut PresenceTracker,
    ) -> Option<TickReport> {
        if !self.is_connected() {
            return None;
        }
        let expired = presence.expire(now).len();
        let ingest = self.pull(store, presence);
        let published = self.publish_now(now, store, presence);
        debug!(
            "event=sync_tick module=sync status=ok expired={} ingest={:?} published={:?}",
            expired, ingest, published
        );
        Some(TickReport {
            expired,
            ingest,
            published,
        })
    }

    /// Builds and publishes a snapshot without ingesting first.
    ///
    /// Returns the published clock, or `None` on failure, clock exhaustion
    /// or when not connected.
    pub fn publish_now(
        &mut self,
        now: Timestamp,
        store: &NoteStore,
        presence: &mut PresenceTracker,
    ) -> Option<LogicalClock> {
        if !self.is_connected() {
            return None;
        }
        let Some(snapshot) = self.build_snapshot(now, store, presence) else {
            warn!(
                "event=sync_publish module=sync status=error error_code=clock_exhausted last_published={} observed_clock={}",
                self.last_published, self.highest_observed
            );
            return None;
        };
        let clock = snapshot.logical_clock;
        let payload = match snapshot.to_json() {
            Ok(payload) => payload,
            Err(err) => {
                warn!("event=sync_publish module=sync status=error error={err}");
                return None;
            }
        };
        if let Err(err) = self.medium.publish(&payload) {
            warn!("event=sync_publish module=sync status=error clock={clock} error={err}");
            return None;
        }
        self.last_published = clock;
        self.highest_observed = self.highest_observed.max(clock);
        Some(clock)
    }

    /// Builds the snapshot the next publish would send, or `None` once the
    /// clock space is used up.
    pub fn build_snapshot(
        &self,
        now: Timestamp,
        store: &NoteStore,
        presence: &mut PresenceTracker,
    ) -> Option<SharedSnapshot> {
        let logical_clock = self.next_clock()?;
        let StoreContents {
            notes,
            positions,
            responses,
        } = store.export();
        Some(SharedSnapshot {
            notes,
            responses,
            positions,
            participants: presence.participants(now),
            logical_clock,
        })
    }

    /// Applies `snapshot` if its clock beats every clock observed so far.
    pub fn apply_remote(
        &mut self,
        snapshot: SharedSnapshot,
        store: &mut NoteStore,
        presence: &mut PresenceTracker,
    ) -> IngestOutcome {
        let remote = snapshot.logical_clock;
        if remote == LogicalClock::MAX {
            warn!("event=sync_apply module=sync status=rejected error_code=clock_exhausted clock={remote}");
            return IngestOutcome::Exhausted;
        }
        if remote <= self.highest_observed {
            return IngestOutcome::Stale {
                remote,
                observed: self.highest_observed,
            };
        }

        let SharedSnapshot {
            notes,
            responses,
            positions,
            participants,
            logical_clock,
        } = snapshot;
        store.replace_all(StoreContents {
            notes,
            positions,
            responses,
        });
        presence.replace_remote(participants);
        self.highest_observed = logical_clock;
        debug!(
            "event=sync_apply module=sync status=ok clock={} notes={}",
            logical_clock,
            store.len()
        );
        IngestOutcome::Applied(logical_clock)
    }

    /// Decodes and applies a raw payload. Malformed input never escapes.
    pub fn ingest_raw(
        &mut self,
        payload: &str,
        store: &mut NoteStore,
        presence: &mut PresenceTracker,
    ) -> IngestOutcome {
        match SharedSnapshot::from_json(payload) {
            Ok(snapshot) => self.apply_remote(snapshot, store, presence),
            Err(err) => {
                warn!("event=sync_ingest module=sync status=error error_code=malformed_snapshot error={err}");
                IngestOutcome::Malformed
            }
        }
    }

    /// Fetches the published payload and applies it under the clock gate.
    pub fn pull(
        &mut self,
        store: &mut NoteStore,
        presence: &mut PresenceTracker,
    ) -> IngestOutcome {
        match self.medium.fetch() {
            Ok(Some(payload)) => self.ingest_raw(&payload, store, presence),
            Ok(None) => IngestOutcome::Empty,
            Err(err) => {
                warn!("event=sync_ingest module=sync status=error error_code=medium_unavailable error={err}");
                IngestOutcome::Unavailable
            }
        }
    }

    fn next_clock(&self) -> Option<LogicalClock> {
        self.last_published
            .max(self.highest_observed)
            .checked_add(1)
            .filter(|clock| *clock < LogicalClock::MAX)
    }
}
