//! Pointer-driven note dragging.
//!
//! # Invariants
//! - Only a participant allowed to edit a note can start dragging it.
//! - A move recomputes the position from the fixed anchors only, so dropped
//!   or coalesced pointer events never accumulate error.
//! - Only `Position` entries are written while dragging.

use crate::model::note::{NoteId, Point, Position};
use crate::model::participant::ParticipantId;
use crate::store::note_store::{NoteStore, StoreError};
use log::debug;
use std::error::Error;
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DragError {
    /// A drag gesture is already in progress for this note.
    AlreadyDragging(NoteId),
    Store(StoreError),
}

impl Display for DragError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AlreadyDragging(note_id) => write!(f, "already dragging note {note_id}"),
            Self::Store(err) => write!(f, "{err}"),
        }
    }
}

impl Error for DragError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::AlreadyDragging(_) => None,
            Self::Store(err) => Some(err),
        }
    }
}

impl From<StoreError> for DragError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DragState {
    Idle,
    Dragging {
        note_id: NoteId,
        anchor_pointer: Point,
        anchor_note: Point,
    },
}

#[derive(Debug)]
pub struct DragController {
    state: DragState,
}

impl Default for DragController {
    fn default() -> Self {
        Self::new()
    }
}

impl DragController {
    pub fn new() -> Self {
        Self {
            state: DragState::Idle,
        }
    }

    pub fn state(&self) -> &DragState {
        &self.state
    }

    pub fn dragged_note(&self) -> Option<&NoteId> {
        match &self.state {
            DragState::Idle => None,
            DragState::Dragging { note_id, .. } => Some(note_id),
        }
    }

    /// Starts dragging `note_id`, anchoring pointer and note positions.
    pub fn pointer_down(
        &mut self,
        note_id: &NoteId,
        pointer: Point,
        requester: &ParticipantId,
        store: &NoteStore,
    ) -> Result<(), DragError> {
        if let DragState::Dragging { note_id: active, .. } = &self.state {
            return Err(DragError::AlreadyDragging(active.clone()));
        }
        let note = store
            .get(note_id)
            .ok_or_else(|| StoreError::NotFound(note_id.clone()))?;
        if !note.is_editable_by(requester) {
            return Err(StoreError::Permission {
                note_id: note_id.clone(),
                requester: requester.clone(),
            }
            .into());
        }
        let position = store
            .position(note_id)
            .ok_or_else(|| StoreError::NotFound(note_id.clone()))?;

        self.state = DragState::Dragging {
            note_id: note_id.clone(),
            anchor_pointer: pointer,
            anchor_note: Point::new(position.x, position.y),
        };
        debug!("event=drag_start module=drag status=ok note_id={note_id}");
        Ok(())
    }

    /// Moves the dragged note to `anchor_note + (pointer - anchor_pointer)`,
    /// clamped to the canvas.
    ///
    /// Returns `None` when idle. If the note disappeared mid-drag (deleted
    /// or replaced by a remote snapshot) the drag ends and `None` is
    /// returned.
    pub fn pointer_move(&mut self, pointer: Point, store: &mut NoteStore) -> Option<Position> {
        let DragState::Dragging {
            note_id,
            anchor_pointer,
            anchor_note,
        } = &self.state
        else {
            return None;
        };
        let target = Point::new(
            anchor_note.x + (pointer.x - anchor_pointer.x),
            anchor_note.y + (pointer.y - anchor_pointer.y),
        );
        match store.set_position(note_id, target) {
            Some(position) => Some(position),
            None => {
                debug!("event=drag_abort module=drag status=note_missing note_id={note_id}");
                self.state = DragState::Idle;
                None
            }
        }
    }

    /// Ends the gesture. Returns the note that was being dragged.
    pub fn pointer_up(&mut self) -> Option<NoteId> {
        match std::mem::replace(&mut self.state, DragState::Idle) {
            DragState::Idle => None,
            DragState::Dragging { note_id, .. } => {
                debug!("event=drag_end module=drag status=ok note_id={note_id}");
                Some(note_id)
            }
        }
    }

    /// Drops an in-progress gesture without reporting it.
    pub fn cancel(&mut self) {
        self.state = DragState::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::{DragController, DragError, DragState};
    use crate::config::SpawnRegion;
    use crate::model::note::{CanvasBounds, LlmModel, NoteColor, NoteId, Point};
    use crate::model::participant::ParticipantId;
    use crate::store::note_store::{NoteStore, StoreError};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn store_with_note_at(x: f64, y: f64) -> (NoteStore, NoteId, ParticipantId) {
        let mut store = NoteStore::with_rng(
            CanvasBounds::default(),
            SpawnRegion::default(),
            StdRng::seed_from_u64(3),
        );
        let owner = ParticipantId::new("u1");
        let note = store
            .create_note(&owner, "t", "p", NoteColor::Yellow, LlmModel::Gpt4, 0)
            .expect("create note");
        store
            .set_position(&note.id, Point::new(x, y))
            .expect("note exists");
        (store, note.id, owner)
    }

    #[test]
    fn move_is_relative_to_fixed_anchor_and_clamped() {
        let (mut store, note_id, owner) = store_with_note_at(50.0, 50.0);
        let mut drag = DragController::new();
        drag.pointer_down(&note_id, Point::new(100.0, 100.0), &owner, &store)
            .expect("owner may drag");

        let moved = drag
            .pointer_move(Point::new(130.0, 80.0), &mut store)
            .expect("dragging");
        assert_eq!((moved.x, moved.y), (80.0, 30.0));

        let clamped = drag
            .pointer_move(Point::new(-500.0, -500.0), &mut store)
            .expect("dragging");
        assert_eq!((clamped.x, clamped.y), (0.0, 0.0));
    }

    #[test]
    fn final_position_ignores_intermediate_events() {
        let (mut store, note_id, owner) = store_with_note_at(50.0, 50.0);
        let mut drag = DragController::new();
        drag.pointer_down(&note_id, Point::new(0.0, 0.0), &owner, &store)
            .expect("owner may drag");
        for step in [Point::new(5.0, 5.0), Point::new(700.0, 2.0), Point::new(9.0, 9.0)] {
            drag.pointer_move(step, &mut store);
        }
        drag.pointer_move(Point::new(10.0, 20.0), &mut store);

        let position = store.position(&note_id).expect("position");
        assert_eq!((position.x, position.y), (60.0, 70.0));
    }

    #[test]
    fn non_owner_cannot_start_drag() {
        let (store, note_id, _) = store_with_note_at(1.0, 1.0);
        let mut drag = DragController::new();
        let err = drag
            .pointer_down(&note_id, Point::default(), &ParticipantId::new("u2"), &store)
            .expect_err("non-owner must be rejected");
        assert!(matches!(err, DragError::Store(StoreError::Permission { .. })));
        assert_eq!(drag.state(), &DragState::Idle);
    }

    #[test]
    fn second_pointer_down_is_rejected_and_pointer_up_reports_note() {
        let (store, note_id, owner) = store_with_note_at(1.0, 1.0);
        let mut drag = DragController::new();
        drag.pointer_down(&note_id, Point::default(), &owner, &store)
            .expect("first drag");
        let err = drag
            .pointer_down(&note_id, Point::default(), &owner, &store)
            .expect_err("second drag");
        assert_eq!(err, DragError::AlreadyDragging(note_id.clone()));

        assert_eq!(drag.pointer_up(), Some(note_id));
        assert_eq!(drag.pointer_up(), None);
    }

    #[test]
    fn drag_ends_when_note_disappears() {
        let (mut store, note_id, owner) = store_with_note_at(1.0, 1.0);
        let mut drag = DragController::new();
        drag.pointer_down(&note_id, Point::default(), &owner, &store)
            .expect("drag");
        store.delete_note(&note_id, &owner).expect("delete");

        assert!(drag.pointer_move(Point::new(3.0, 3.0), &mut store).is_none());
        assert!(drag.dragged_note().is_none());
    }
}
