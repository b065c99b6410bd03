//! In-memory note store with positions and responses.
//!
//! # Responsibility
//! - Own notes, their canvas positions and their generated responses.
//! - Enforce ownership on every user-initiated mutation.
//!
//! # Invariants
//! - Every note has exactly one position; both are inserted and removed together.
//! - A response entry exists only for a note currently in the store.
//! - Every stored position lies inside the configured canvas.
//! - Failed mutations leave the store unchanged.

use crate::config::SpawnRegion;
use crate::model::note::{CanvasBounds, LlmModel, Note, NoteColor, NoteId, Point, Position};
use crate::model::participant::ParticipantId;
use crate::model::Timestamp;
use crate::store::seed::seed_entries;
use log::debug;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type StoreResult<T> = Result<T, StoreError>;

/// Errors for note store mutations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Required field is blank after trim.
    Validation { field: &'static str },
    /// Requester does not own the note and it is not a seed note.
    Permission {
        note_id: NoteId,
        requester: ParticipantId,
    },
    /// Target note does not exist.
    NotFound(NoteId),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation { field } => write!(f, "{field} must not be blank"),
            Self::Permission { note_id, requester } => {
                write!(f, "participant {requester} may not modify note {note_id}")
            }
            Self::NotFound(note_id) => write!(f, "note not found: {note_id}"),
        }
    }
}

impl Error for StoreError {}

/// Notes, positions and responses held by one participant session.
pub struct NoteStore {
    notes: BTreeMap<NoteId, Note>,
    positions: BTreeMap<NoteId, Position>,
    responses: BTreeMap<NoteId, Option<String>>,
    canvas: CanvasBounds,
    spawn: SpawnRegion,
    rng: StdRng,
}

impl NoteStore {
    /// Creates an empty store with entropy-seeded spawn jitter.
    pub fn new(canvas: CanvasBounds, spawn: SpawnRegion) -> Self {
        Self::with_rng(canvas, spawn, StdRng::from_entropy())
    }

    /// Creates an empty store using a caller-provided RNG for spawn jitter.
    pub fn with_rng(canvas: CanvasBounds, spawn: SpawnRegion, rng: StdRng) -> Self {
        Self {
            notes: BTreeMap::new(),
            positions: BTreeMap::new(),
            responses: BTreeMap::new(),
            canvas,
            spawn,
            rng,
        }
    }

    /// Inserts the ownerless example notes with their fixed positions and
    /// pre-generated responses.
    pub fn seed_examples(&mut self, now: Timestamp) {
        for entry in seed_entries(now) {
            let note_id = entry.note.id.clone();
            self.insert_with_position(entry.note, entry.position);
            self.responses.insert(note_id, Some(entry.response));
        }
    }

    /// Creates one note owned by `owner` and places it in the spawn region.
    ///
    /// The response starts pending (`None`).
    ///
    /// # Errors
    /// - `StoreError::Validation` when `title` or `prompt` is blank.
    pub fn create_note(
        &mut self,
        owner: &ParticipantId,
        title: &str,
        prompt: &str,
        color: NoteColor,
        model: LlmModel,
        now: Timestamp,
    ) -> StoreResult<Note> {
        let title = title.trim();
        if title.is_empty() {
            return Err(StoreError::Validation { field: "title" });
        }
        let prompt = prompt.trim();
        if prompt.is_empty() {
            return Err(StoreError::Validation { field: "prompt" });
        }

        let note = Note {
            id: NoteId::generate(owner),
            owner_id: Some(owner.clone()),
            title: title.to_string(),
            prompt: prompt.to_string(),
            color,
            model,
            created_at: now,
        };
        let spawn_at = self.spawn_point();
        self.insert_with_position(note.clone(), spawn_at);
        self.responses.insert(note.id.clone(), None);

        debug!(
            "event=note_create module=store status=ok note_id={} owner={}",
            note.id, owner
        );
        Ok(note)
    }

    /// Deletes a note with its position and response.
    pub fn delete_note(&mut self, note_id: &NoteId, requester: &ParticipantId) -> StoreResult<()> {
        self.require_editable(note_id, requester)?;
        self.notes.remove(note_id);
        self.positions.remove(note_id);
        self.responses.remove(note_id);
        debug!(
            "event=note_delete module=store status=ok note_id={} requester={}",
            note_id, requester
        );
        Ok(())
    }

    /// Recolors a note. Returns `false` when the color is unchanged.
    pub fn update_color(
        &mut self,
        note_id: &NoteId,
        color: NoteColor,
        requester: &ParticipantId,
    ) -> StoreResult<bool> {
        let note = self.require_editable_mut(note_id, requester)?;
        if note.color == color {
            return Ok(false);
        }
        note.color = color;
        Ok(true)
    }

    /// Retargets a note at another model. Returns `false` when unchanged.
    pub fn update_model(
        &mut self,
        note_id: &NoteId,
        model: LlmModel,
        requester: &ParticipantId,
    ) -> StoreResult<bool> {
        let note = self.require_editable_mut(note_id, requester)?;
        if note.model == model {
            return Ok(false);
        }
        note.model = model;
        Ok(true)
    }

    /// Sets (`Some`) or clears to pending (`None`) a note's response.
    ///
    /// Returns `false` without writing when the note no longer exists.
    pub fn set_response(&mut self, note_id: &NoteId, text: Option<String>) -> bool {
        if !self.notes.contains_key(note_id) {
            return false;
        }
        self.responses.insert(note_id.clone(), text);
        true
    }

    /// Moves a note, clamping to the canvas. Returns the stored position,
    /// or `None` when the note no longer exists.
    pub fn set_position(&mut self, note_id: &NoteId, point: Point) -> Option<Position> {
        let position = self.positions.get_mut(note_id)?;
        let clamped = self.canvas.clamp(point);
        position.x = clamped.x;
        position.y = clamped.y;
        Some(position.clone())
    }

    pub fn get(&self, note_id: &NoteId) -> Option<&Note> {
        self.notes.get(note_id)
    }

    pub fn contains(&self, note_id: &NoteId) -> bool {
        self.notes.contains_key(note_id)
    }

    /// Notes ordered by creation time, then id.
    pub fn notes(&self) -> Vec<&Note> {
        let mut notes = self.notes.values().collect::<Vec<_>>();
        notes.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        notes
    }

    pub fn position(&self, note_id: &NoteId) -> Option<&Position> {
        self.positions.get(note_id)
    }

    /// `None` when the note is unknown, `Some(None)` while pending.
    pub fn response(&self, note_id: &NoteId) -> Option<Option<&str>> {
        self.responses.get(note_id).map(|text| text.as_deref())
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    pub fn canvas(&self) -> CanvasBounds {
        self.canvas
    }

    /// Returns whether `requester` may mutate `note_id`.
    pub fn can_edit(&self, note_id: &NoteId, requester: &ParticipantId) -> bool {
        self.notes
            .get(note_id)
            .is_some_and(|note| note.is_editable_by(requester))
    }

    /// Copies the store contents for snapshot publication.
    pub fn export(&self) -> StoreContents {
        StoreContents {
            notes: self.notes().into_iter().cloned().collect(),
            positions: self.positions.clone(),
            responses: self.responses.clone(),
        }
    }

    /// Replaces the whole store with remote contents.
    ///
    /// Incoming data is normalized so store invariants hold: orphan
    /// positions and responses are dropped, notes without a position are
    /// placed in the spawn region, and positions are clamped.
    pub fn replace_all(&mut self, contents: StoreContents) {
        let StoreContents {
            notes,
            mut positions,
            mut responses,
        } = contents;

        self.notes.clear();
        self.positions.clear();
        self.responses.clear();

        let mut repaired = 0usize;
        for note in notes {
            let note_id = note.id.clone();
            let point = match positions.remove(&note_id) {
                Some(position) => Point::new(position.x, position.y),
                None => {
                    repaired += 1;
                    self.spawn_point()
                }
            };
            let response = responses.remove(&note_id).flatten();
            self.insert_with_position(note, point);
            self.responses.insert(note_id, response);
        }

        let orphans = positions.len() + responses.len();
        if repaired > 0 || orphans > 0 {
            debug!(
                "event=store_replace module=store status=repaired missing_positions={} orphans_dropped={}",
                repaired, orphans
            );
        }
    }

    fn insert_with_position(&mut self, note: Note, point: Point) {
        let clamped = self.canvas.clamp(point);
        let note_id = note.id.clone();
        self.positions.insert(
            note_id.clone(),
            Position {
                note_id: note_id.clone(),
                x: clamped.x,
                y: clamped.y,
            },
        );
        self.notes.insert(note_id, note);
    }

    fn spawn_point(&mut self) -> Point {
        let u = self.rng.gen::<f64>();
        let v = self.rng.gen::<f64>();
        self.spawn.point_at(u, v)
    }

    fn require_editable(&self, note_id: &NoteId, requester: &ParticipantId) -> StoreResult<()> {
        let note = self
            .notes
            .get(note_id)
            .ok_or_else(|| StoreError::NotFound(note_id.clone()))?;
        if !note.is_editable_by(requester) {
            return Err(StoreError::Permission {
                note_id: note_id.clone(),
                requester: requester.clone(),
            });
        }
        Ok(())
    }

    fn require_editable_mut(
        &mut self,
        note_id: &NoteId,
        requester: &ParticipantId,
    ) -> StoreResult<&mut Note> {
        self.require_editable(note_id, requester)?;
        self.notes
            .get_mut(note_id)
            .ok_or_else(|| StoreError::NotFound(note_id.clone()))
    }
}

/// Plain store contents exchanged with the sync engine.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StoreContents {
    pub notes: Vec<Note>,
    pub positions: BTreeMap<NoteId, Position>,
    pub responses: BTreeMap<NoteId, Option<String>>,
}
