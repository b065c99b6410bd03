//! Participant session: the single owner of all local sync state.
//!
//! # Responsibility
//! - Own the note store, presence tracker, drag controller, sync engine,
//!   generator and every timer of one participant.
//! - Expose user actions (optimistic local mutations) and a logical-time
//!   driver (`advance_to`) that fires due timers.
//!
//! # Invariants
//! - User-initiated errors are returned synchronously and leave state intact.
//! - Background work (sync ticks, generations) never returns errors; failures
//!   are logged and local state stays at its last known good value.
//! - `stop` (and `Drop`) cancels every timer; nothing fires afterwards.
//! - A finished generation is written only while its note still carries the
//!   model and prompt it was requested for, and is published right away.
//! - After an applied remote snapshot, every locally owned note left without
//!   a response and without a current request is generated again.

pub mod timers;

use crate::config::SessionConfig;
use crate::drag::{DragController, DragError, DragState};
use crate::generator::{GenerationTicket, GenerationTracker, ResponseGenerator};
use crate::model::note::{LlmModel, Note, NoteColor, NoteId, Point, Position};
use crate::model::participant::Participant;
use crate::model::snapshot::LogicalClock;
use crate::model::Timestamp;
use crate::storage::identity::Identity;
use crate::store::note_store::{NoteStore, StoreError};
use crate::store::presence::PresenceTracker;
use crate::sync::engine::{IngestOutcome, SyncEngine, SyncState, TickReport};
use crate::sync::medium::SharedMedium;
use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::error::Error;
use std::fmt::{Display, Formatter};
use timers::{FiredTimer, TimerId, TimerKind, TimerQueue};

/// Errors returned by user-initiated session actions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    Store(StoreError),
    Drag(DragError),
}

impl Display for SessionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Store(err) => write!(f, "{err}"),
            Self::Drag(err) => write!(f, "{err}"),
        }
    }
}

impl Error for SessionError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Store(err) => Some(err),
            Self::Drag(err) => Some(err),
        }
    }
}

impl From<StoreError> for SessionError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

impl From<DragError> for SessionError {
    fn from(value: DragError) -> Self {
        Self::Drag(value)
    }
}

pub type SessionResult<T> = Result<T, SessionError>;

pub struct Session<M: SharedMedium, G: ResponseGenerator> {
    config: SessionConfig,
    identity: Identity,
    color_tag: NoteColor,
    store: NoteStore,
    presence: PresenceTracker,
    drag: DragController,
    engine: SyncEngine<M>,
    generator: G,
    generations: GenerationTracker,
    timers: TimerQueue,
    rng: StdRng,
    now: Timestamp,
    sync_timer: Option<TimerId>,
    typing_timer: Option<TimerId>,
}

impl<M: SharedMedium, G: ResponseGenerator> Session<M, G> {
    /// Creates a disconnected session with a seeded example board.
    ///
    /// `seed` drives spawn jitter, generation latency and the local color tag.
    pub fn new(
        config: SessionConfig,
        identity: Identity,
        medium: M,
        generator: G,
        seed: u64,
    ) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let color_tag = NoteColor::ALL.choose(&mut rng).copied().unwrap_or_default();
        let mut store = NoteStore::with_rng(
            config.canvas,
            config.spawn,
            StdRng::seed_from_u64(rng.gen()),
        );
        store.seed_examples(0);
        let presence = PresenceTracker::new(
            identity.participant_id.clone(),
            config.liveness_window_ms,
            config.typing_debounce_ms,
        );

        Self {
            config,
            identity,
            color_tag,
            store,
            presence,
            drag: DragController::new(),
            engine: SyncEngine::new(medium),
            generator,
            generations: GenerationTracker::new(),
            timers: TimerQueue::new(),
            rng,
            now: 0,
            sync_timer: None,
            typing_timer: None,
        }
    }

    /// Connects to the shared medium and arms the periodic sync timer.
    ///
    /// Idempotent while connected.
    pub fn start(&mut self, now: Timestamp) -> IngestOutcome {
        self.now = self.now.max(now);
        if self.engine.is_connected() {
            return IngestOutcome::Empty;
        }
        info!(
            "event=session_start module=session status=start participant_id={} display_name={}",
            self.identity.participant_id, self.identity.display_name
        );
        self.touch_local(false);
        let outcome = self.engine.connect(&mut self.store, &mut self.presence);
        self.reconcile_after_ingest(outcome);
        let next = self.now + self.config.sync_interval_ms;
        self.sync_timer = Some(self.timers.schedule(next, TimerKind::SyncTick));
        outcome
    }

    /// Cancels every timer, abandons in-flight work and disconnects.
    pub fn stop(&mut self) {
        if self.engine.state() == SyncState::Disconnected && self.timers.is_empty() {
            return;
        }
        let cancelled = self.timers.len();
        self.timers.clear();
        self.sync_timer = None;
        self.typing_timer = None;
        self.generations.clear();
        self.drag.cancel();
        self.engine.disconnect();
        info!(
            "event=session_stop module=session status=ok participant_id={} timers_cancelled={}",
            self.identity.participant_id, cancelled
        );
    }

    /// Advances logical time, firing every timer due at or before `now`.
    pub fn advance_to(&mut self, now: Timestamp) {
        while let Some(fired) = self.timers.pop_due(now) {
            self.now = self.now.max(fired.deadline);
            self.dispatch(fired);
        }
        self.now = self.now.max(now);
    }

    /// Runs one sync step immediately, outside the periodic schedule.
    pub fn sync_now(&mut self) -> Option<TickReport> {
        self.presence
            .heartbeat(&self.identity.participant_id, self.now);
        let report = self
            .engine
            .tick(self.now, &mut self.store, &mut self.presence)?;
        self.reconcile_after_ingest(report.ingest);
        Some(report)
    }

    pub fn create_note(
        &mut self,
        title: &str,
        prompt: &str,
        color: NoteColor,
        model: LlmModel,
    ) -> SessionResult<Note> {
        let note = self.store.create_note(
            &self.identity.participant_id,
            title,
            prompt,
            color,
            model,
            self.now,
        )?;
        self.request_generation(&note);
        self.stop_typing();
        Ok(note)
    }

    /// Deletes a note; any in-flight generation for it is discarded.
    pub fn delete_note(&mut self, note_id: &NoteId) -> SessionResult<()> {
        self.store
            .delete_note(note_id, &self.identity.participant_id)?;
        if self.generations.cancel(note_id) {
            debug!("event=generation_cancel module=session status=ok note_id={note_id}");
        }
        if self.drag.dragged_note() == Some(note_id) {
            self.drag.cancel();
        }
        Ok(())
    }

    pub fn update_color(&mut self, note_id: &NoteId, color: NoteColor) -> SessionResult<bool> {
        Ok(self
            .store
            .update_color(note_id, color, &self.identity.participant_id)?)
    }

    /// Retargets a note. A changed model clears the response to pending and
    /// requests a fresh generation.
    pub fn update_model(&mut self, note_id: &NoteId, model: LlmModel) -> SessionResult<bool> {
        let changed = self
            .store
            .update_model(note_id, model, &self.identity.participant_id)?;
        if changed {
            self.store.set_response(note_id, None);
            if let Some(note) = self.store.get(note_id).cloned() {
                self.request_generation(&note);
            }
        }
        Ok(changed)
    }

    /// Marks the local participant as typing and re-arms the debounce timer.
    pub fn keystroke(&mut self) {
        self.touch_local(true);
        if let Some(previous) = self.typing_timer.take() {
            self.timers.cancel(previous);
        }
        let deadline = self.now + self.config.typing_debounce_ms;
        self.typing_timer = Some(self.timers.schedule(deadline, TimerKind::TypingDebounce));
    }

    pub fn pointer_down(&mut self, note_id: &NoteId, pointer: Point) -> SessionResult<()> {
        self.drag
            .pointer_down(note_id, pointer, &self.identity.participant_id, &self.store)?;
        Ok(())
    }

    pub fn pointer_move(&mut self, pointer: Point) -> Option<Position> {
        self.drag.pointer_move(pointer, &mut self.store)
    }

    /// Ends a drag and publishes immediately. Returns the published clock.
    pub fn pointer_up(&mut self) -> Option<LogicalClock> {
        self.drag.pointer_up()?;
        self.engine
            .publish_now(self.now, &self.store, &mut self.presence)
    }

    pub fn now(&self) -> Timestamp {
        self.now
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn color_tag(&self) -> NoteColor {
        self.color_tag
    }

    pub fn sync_state(&self) -> SyncState {
        self.engine.state()
    }

    pub fn store(&self) -> &NoteStore {
        &self.store
    }

    pub fn engine(&self) -> &SyncEngine<M> {
        &self.engine
    }

    pub fn drag_state(&self) -> &DragState {
        self.drag.state()
    }

    /// Settled presence list.
    pub fn participants(&mut self) -> Vec<Participant> {
        self.presence.participants(self.now)
    }

    pub fn is_generating(&self, note_id: &NoteId) -> bool {
        self.generations.is_pending(note_id)
    }

    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }

    pub fn next_deadline(&self) -> Option<Timestamp> {
        self.timers.next_deadline()
    }

    fn dispatch(&mut self, fired: FiredTimer) {
        match fired.kind {
            TimerKind::SyncTick => {
                self.sync_timer = None;
                self.sync_now();
                if self.engine.is_connected() {
                    let next = fired.deadline + self.config.sync_interval_ms;
                    self.sync_timer = Some(self.timers.schedule(next, TimerKind::SyncTick));
                }
            }
            TimerKind::TypingDebounce => {
                if self.typing_timer == Some(fired.id) {
                    self.typing_timer = None;
                }
                self.presence.settle_typing(fired.deadline);
            }
            TimerKind::Generation { note_id, ticket } => {
                self.finish_generation(&note_id, ticket);
            }
        }
    }

    fn request_generation(&mut self, note: &Note) {
        let ticket = self.generations.begin(&note.id, note.model, &note.prompt);
        let min = self.config.generation_latency_min_ms;
        let max = self.config.generation_latency_max_ms;
        let latency = if max > min {
            self.rng.gen_range(min..max)
        } else {
            min
        };
        self.timers.schedule(
            self.now + latency,
            TimerKind::Generation {
                note_id: note.id.clone(),
                ticket,
            },
        );
        debug!(
            "event=generation_start module=session status=ok note_id={} model={} latency_ms={}",
            note.id,
            note.model.as_str(),
            latency
        );
    }

    /// Resolves a generation timer: pull the latest board, write the text
    /// if the note still matches the request, then publish.
    fn finish_generation(&mut self, note_id: &NoteId, ticket: GenerationTicket) {
        let Some(request) = self.generations.complete(note_id, ticket) else {
            debug!("event=generation_finish module=session status=discarded note_id={note_id}");
            return;
        };
        let text = match self
            .generator
            .generate(request.model.as_str(), &request.prompt)
        {
            Ok(text) => text,
            Err(err) => {
                warn!(
                    "event=generation_finish module=session status=error note_id={note_id} error={err}"
                );
                return;
            }
        };

        let connected = self.engine.is_connected();
        let ingest = if connected {
            self.engine.pull(&mut self.store, &mut self.presence)
        } else {
            IngestOutcome::Empty
        };
        match self.store.get(note_id) {
            Some(note) if note.model == request.model && note.prompt == request.prompt => {
                self.store.set_response(note_id, Some(text));
                debug!("event=generation_finish module=session status=ok note_id={note_id}");
            }
            Some(_) => debug!(
                "event=generation_finish module=session status=discarded reason=note_changed note_id={note_id}"
            ),
            None => debug!(
                "event=generation_finish module=session status=discarded reason=note_missing note_id={note_id}"
            ),
        }
        self.reconcile_after_ingest(ingest);
        if connected {
            self.engine
                .publish_now(self.now, &self.store, &mut self.presence);
        }
    }

    fn reconcile_after_ingest(&mut self, outcome: IngestOutcome) {
        if !outcome.is_applied() {
            return;
        }
        let store = &self.store;
        let dropped = self.generations.retain_notes(|note_id, request| {
            store
                .get(note_id)
                .is_some_and(|note| note.model == request.model && note.prompt == request.prompt)
        });
        if dropped > 0 {
            debug!("event=generation_cancel module=session status=ok reason=remote_replaced count={dropped}");
        }
        if let Some(note_id) = self.drag.dragged_note() {
            if !self.store.contains(note_id) {
                self.drag.cancel();
            }
        }

        let local = &self.identity.participant_id;
        let missing = self
            .store
            .notes()
            .into_iter()
            .filter(|note| note.owner_id.as_ref() == Some(local))
            .filter(|note| self.store.response(&note.id) == Some(None))
            .filter(|note| !self.generations.is_pending(&note.id))
            .filter(|note| self.generator.supports(note.model.as_str()))
            .cloned()
            .collect::<Vec<_>>();
        for note in &missing {
            self.request_generation(note);
        }
    }

    fn touch_local(&mut self, typing: bool) {
        self.presence.touch(
            &self.identity.participant_id,
            &self.identity.display_name,
            self.color_tag,
            typing,
            self.now,
        );
    }

    fn stop_typing(&mut self) {
        if let Some(previous) = self.typing_timer.take() {
            self.timers.cancel(previous);
            self.touch_local(false);
        }
    }
}

impl<M: SharedMedium, G: ResponseGenerator> Drop for Session<M, G> {
    fn drop(&mut self) {
        self.stop();
    }
}
