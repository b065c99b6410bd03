//! In-flight generation bookkeeping.
//!
//! At most one request per note is current. Starting a new request for the
//! same note supersedes the previous one; a completion whose ticket is not
//! current (superseded or cancelled) is dropped.

use crate::model::note::{LlmModel, NoteId};
use std::collections::BTreeMap;

/// Monotonic ticket identifying one generation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GenerationTicket(u64);

/// Inputs captured when a generation request starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    pub ticket: GenerationTicket,
    pub model: LlmModel,
    pub prompt: String,
}

#[derive(Debug, Default)]
pub struct GenerationTracker {
    next_ticket: u64,
    in_flight: BTreeMap<NoteId, GenerationRequest>,
}

impl GenerationTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new request for `note_id`, superseding any current one.
    pub fn begin(&mut self, note_id: &NoteId, model: LlmModel, prompt: &str) -> GenerationTicket {
        self.next_ticket += 1;
        let ticket = GenerationTicket(self.next_ticket);
        self.in_flight.insert(
            note_id.clone(),
            GenerationRequest {
                ticket,
                model,
                prompt: prompt.to_string(),
            },
        );
        ticket
    }

    /// Cancels the current request for `note_id`. Returns whether one existed.
    pub fn cancel(&mut self, note_id: &NoteId) -> bool {
        self.in_flight.remove(note_id).is_some()
    }

    /// Resolves a completion.
    ///
    /// Returns the captured request only when `ticket` is still current.
    pub fn complete(
        &mut self,
        note_id: &NoteId,
        ticket: GenerationTicket,
    ) -> Option<GenerationRequest> {
        match self.in_flight.get(note_id) {
            Some(current) if current.ticket == ticket => self.in_flight.remove(note_id),
            _ => None,
        }
    }

    pub fn is_pending(&self, note_id: &NoteId) -> bool {
        self.in_flight.contains_key(note_id)
    }

    /// Keeps only the requests `keep` accepts. Returns how many were dropped.
    pub fn retain_notes(
        &mut self,
        mut keep: impl FnMut(&NoteId, &GenerationRequest) -> bool,
    ) -> usize {
        let before = self.in_flight.len();
        self.in_flight.retain(|note_id, request| keep(note_id, request));
        before - self.in_flight.len()
    }

    pub fn len(&self) -> usize {
        self.in_flight.len()
    }

    pub fn is_empty(&self) -> bool {
        self.in_flight.is_empty()
    }

    pub fn clear(&mut self) {
        self.in_flight.clear();
    }
}
