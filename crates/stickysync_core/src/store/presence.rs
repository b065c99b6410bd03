//! Presence tracker for active participants.
//!
//! # Invariants
//! - The local participant is never removed by `expire` or `replace_remote`.
//! - `is_typing` is cleared once the debounce deadline has passed; reads
//!   through `participants`/`get` always observe the settled value.

use crate::model::note::NoteColor;
use crate::model::participant::{Participant, ParticipantId};
use crate::model::Timestamp;
use log::debug;
use std::collections::BTreeMap;

#[derive(Debug, Clone)]
struct PresenceEntry {
    participant: Participant,
    typing_deadline: Option<Timestamp>,
}

/// Tracks participants and their transient typing state.
pub struct PresenceTracker {
    local_id: ParticipantId,
    entries: BTreeMap<ParticipantId, PresenceEntry>,
    liveness_window_ms: u64,
    typing_debounce_ms: u64,
}

impl PresenceTracker {
    pub fn new(local_id: ParticipantId, liveness_window_ms: u64, typing_debounce_ms: u64) -> Self {
        Self {
            local_id,
            entries: BTreeMap::new(),
            liveness_window_ms,
            typing_debounce_ms,
        }
    }

    pub fn local_id(&self) -> &ParticipantId {
        &self.local_id
    }

    /// Upserts one participant and refreshes `last_active_at`.
    ///
    /// `typing = true` (re)arms the debounce deadline at
    /// `now + typing_debounce`; `typing = false` clears it immediately.
    pub fn touch(
        &mut self,
        participant_id: &ParticipantId,
        display_name: &str,
        color_tag: NoteColor,
        typing: bool,
        now: Timestamp,
    ) {
        let typing_deadline = typing.then(|| now.saturating_add(self.typing_debounce_ms));
        let participant = Participant {
            participant_id: participant_id.clone(),
            display_name: display_name.to_string(),
            last_active_at: now,
            is_typing: typing,
            color_tag,
        };
        self.entries.insert(
            participant_id.clone(),
            PresenceEntry {
                participant,
                typing_deadline,
            },
        );
    }

    /// Refreshes `last_active_at` without touching the typing state.
    /// Returns `false` when the participant is unknown.
    pub fn heartbeat(&mut self, participant_id: &ParticipantId, now: Timestamp) -> bool {
        match self.entries.get_mut(participant_id) {
            Some(entry) => {
                entry.participant.last_active_at = now;
                true
            }
            None => false,
        }
    }

    /// Removes participants idle longer than the liveness window.
    ///
    /// The local participant is never expired. Returns removed ids.
    pub fn expire(&mut self, now: Timestamp) -> Vec<ParticipantId> {
        let window = self.liveness_window_ms;
        let stale = self
            .entries
            .iter()
            .filter(|(id, entry)| {
                **id != self.local_id
                    && now.saturating_sub(entry.participant.last_active_at) > window
            })
            .map(|(id, _)| id.clone())
            .collect::<Vec<_>>();

        for id in &stale {
            self.entries.remove(id);
        }
        if !stale.is_empty() {
            debug!(
                "event=presence_expire module=presence status=ok removed={}",
                stale.len()
            );
        }
        stale
    }

    /// Clears typing flags whose debounce deadline has passed.
    pub fn settle_typing(&mut self, now: Timestamp) {
        for entry in self.entries.values_mut() {
            if let Some(deadline) = entry.typing_deadline {
                if now >= deadline {
                    entry.typing_deadline = None;
                    entry.participant.is_typing = false;
                }
            }
        }
    }

    /// Settled participant list sorted by id.
    pub fn participants(&mut self, now: Timestamp) -> Vec<Participant> {
        self.settle_typing(now);
        self.entries
            .values()
            .map(|entry| entry.participant.clone())
            .collect()
    }

    /// Settled read of one participant.
    pub fn get(&mut self, participant_id: &ParticipantId, now: Timestamp) -> Option<Participant> {
        self.settle_typing(now);
        self.entries
            .get(participant_id)
            .map(|entry| entry.participant.clone())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Replaces every non-local record with `participants`.
    ///
    /// Remote records carry no debounce deadline; their `is_typing` flag is
    /// taken as published. The local record is kept as-is.
    pub fn replace_remote(&mut self, participants: Vec<Participant>) {
        let local = self.entries.remove(&self.local_id);
        self.entries.clear();
        for participant in participants {
            if participant.participant_id == self.local_id {
                continue;
            }
            self.entries.insert(
                participant.participant_id.clone(),
                PresenceEntry {
                    participant,
                    typing_deadline: None,
                },
            );
        }
        if let Some(local) = local {
            self.entries.insert(self.local_id.clone(), local);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::PresenceTracker;
    use crate::model::note::NoteColor;
    use crate::model::participant::{Participant, ParticipantId};

    fn tracker() -> PresenceTracker {
        PresenceTracker::new(ParticipantId::new("local"), 30_000, 2_000)
    }

    #[test]
    fn typing_flag_clears_after_debounce() {
        let mut presence = tracker();
        let id = ParticipantId::new("local");
        presence.touch(&id, "Ada", NoteColor::Blue, true, 1_000);

        assert!(presence.get(&id, 2_999).expect("present").is_typing);
        assert!(!presence.get(&id, 3_000).expect("present").is_typing);
    }

    #[test]
    fn rearming_typing_extends_deadline() {
        let mut presence = tracker();
        let id = ParticipantId::new("local");
        presence.touch(&id, "Ada", NoteColor::Blue, true, 0);
        presence.touch(&id, "Ada", NoteColor::Blue, true, 1_500);

        assert!(presence.get(&id, 3_000).expect("present").is_typing);
        assert!(!presence.get(&id, 3_500).expect("present").is_typing);
    }

    #[test]
    fn expire_keeps_local_participant() {
        let mut presence = tracker();
        presence.touch(&ParticipantId::new("local"), "Ada", NoteColor::Blue, false, 0);
        presence.touch(&ParticipantId::new("peer"), "Bob", NoteColor::Pink, false, 0);
        presence.touch(&ParticipantId::new("fresh"), "Cy", NoteColor::Green, false, 20_000);

        let removed = presence.expire(30_001);
        assert_eq!(removed, vec![ParticipantId::new("peer")]);
        assert!(presence.get(&ParticipantId::new("local"), 30_001).is_some());
        assert!(presence.get(&ParticipantId::new("fresh"), 30_001).is_some());
    }

    #[test]
    fn expire_boundary_is_exclusive() {
        let mut presence = tracker();
        presence.touch(&ParticipantId::new("peer"), "Bob", NoteColor::Pink, false, 0);
        assert!(presence.expire(30_000).is_empty());
        assert_eq!(presence.expire(30_001).len(), 1);
    }

    #[test]
    fn replace_remote_keeps_local_record() {
        let mut presence = tracker();
        presence.touch(&ParticipantId::new("local"), "Ada", NoteColor::Blue, true, 10);
        presence.touch(&ParticipantId::new("old"), "Old", NoteColor::Blue, false, 10);

        presence.replace_remote(vec![
            Participant {
                participant_id: ParticipantId::new("local"),
                display_name: "stale copy".to_string(),
                last_active_at: 0,
                is_typing: false,
                color_tag: NoteColor::Yellow,
            },
            Participant {
                participant_id: ParticipantId::new("peer"),
                display_name: "Bob".to_string(),
                last_active_at: 5,
                is_typing: true,
                color_tag: NoteColor::Orange,
            },
        ]);

        let all = presence.participants(10);
        let ids = all
            .iter()
            .map(|p| p.participant_id.as_str().to_string())
            .collect::<Vec<_>>();
        assert_eq!(ids, vec!["local".to_string(), "peer".to_string()]);
        assert_eq!(all[0].display_name, "Ada");
        assert!(all[1].is_typing);
    }
}
