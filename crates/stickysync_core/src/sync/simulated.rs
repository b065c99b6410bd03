//! Simulated remote activity for demos.
//!
//! `SimulatedMedium` wraps a real medium and, on fetch, occasionally plays
//! the part of another participant: it decodes the published snapshot,
//! injects a peer heartbeat and sometimes a peer note, bumps the logical
//! clock and republishes. The engine cannot tell it apart from a real peer.

use crate::generator::{ResponseGenerator, TemplateGenerator};
use crate::model::note::{CanvasBounds, LlmModel, Note, NoteColor, NoteId, Position};
use crate::model::participant::{Participant, ParticipantId};
use crate::model::snapshot::{LogicalClock, SharedSnapshot};
use crate::model::Timestamp;
use crate::sync::medium::{MediumError, SharedMedium};
use log::{debug, warn};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::sync::Mutex;

const PEER_NAMES: [&str; 4] = ["Alex", "Sam", "Jordan", "Taylor"];
const PEER_PROMPTS: [&str; 4] = [
    "Summarize the key points of our last planning meeting",
    "Suggest three names for a coffee shop on the beach",
    "Explain recursion to a ten year old",
    "Draft a friendly reminder about the team offsite",
];

/// Knobs for injected activity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulationSettings {
    /// Probability that one fetch injects peer activity.
    pub activity_rate: f64,
    /// Probability that injected activity also adds a note.
    pub note_rate: f64,
    pub canvas: CanvasBounds,
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self {
            activity_rate: 0.3,
            note_rate: 0.5,
            canvas: CanvasBounds::default(),
        }
    }
}

struct SimulationState {
    rng: StdRng,
    now: Timestamp,
    injected_notes: u64,
}

pub struct SimulatedMedium<M: SharedMedium> {
    inner: M,
    settings: SimulationSettings,
    generator: TemplateGenerator,
    state: Mutex<SimulationState>,
}

impl<M: SharedMedium> SimulatedMedium<M> {
    pub fn new(inner: M, settings: SimulationSettings, seed: u64) -> Self {
        Self {
            inner,
            settings,
            generator: TemplateGenerator::builtin(),
            state: Mutex::new(SimulationState {
                rng: StdRng::seed_from_u64(seed),
                now: 0,
                injected_notes: 0,
            }),
        }
    }

    /// Sets the logical time stamped on injected peer heartbeats.
    pub fn set_now(&self, now: Timestamp) {
        if let Ok(mut state) = self.state.lock() {
            state.now = now;
        }
    }

    pub fn inner(&self) -> &M {
        &self.inner
    }

    /// Returns `false`, leaving `snapshot` untouched, when its clock cannot
    /// be bumped.
    fn inject(&self, state: &mut SimulationState, snapshot: &mut SharedSnapshot) -> bool {
        let Some(next_clock) = snapshot
            .logical_clock
            .checked_add(1)
            .filter(|clock| *clock < LogicalClock::MAX)
        else {
            warn!(
                "event=sim_inject module=sync status=skipped error_code=clock_exhausted clock={}",
                snapshot.logical_clock
            );
            return false;
        };
        let name = PEER_NAMES.choose(&mut state.rng).copied().unwrap_or("Peer");
        let peer_id = ParticipantId::new(format!("sim-{}", name.to_ascii_lowercase()));
        let color_tag = NoteColor::ALL
            .choose(&mut state.rng)
            .copied()
            .unwrap_or_default();
        snapshot
            .participants
            .retain(|participant| participant.participant_id != peer_id);
        snapshot.participants.push(Participant {
            participant_id: peer_id.clone(),
            display_name: name.to_string(),
            last_active_at: state.now,
            is_typing: state.rng.gen_bool(0.5),
            color_tag,
        });

        if state.rng.gen_bool(self.settings.note_rate) {
            state.injected_notes += 1;
            let note_id = NoteId::new(format!("{}:sim-{}", peer_id, state.injected_notes));
            let prompt = PEER_PROMPTS
                .choose(&mut state.rng)
                .copied()
                .unwrap_or(PEER_PROMPTS[0]);
            let model = LlmModel::ALL
                .choose(&mut state.rng)
                .copied()
                .unwrap_or_default();
            let x = state.rng.gen_range(0.0..=self.settings.canvas.max_x);
            let y = state.rng.gen_range(0.0..=self.settings.canvas.max_y);
            let response = self.generator.generate(model.as_str(), prompt).ok();

            snapshot.notes.push(Note {
                id: note_id.clone(),
                owner_id: Some(peer_id.clone()),
                title: name.to_string(),
                prompt: prompt.to_string(),
                color: color_tag,
                model,
                created_at: state.now,
            });
            snapshot.positions.insert(
                note_id.clone(),
                Position {
                    note_id: note_id.clone(),
                    x,
                    y,
                },
            );
            snapshot.responses.insert(note_id, response);
        }
        snapshot.logical_clock = next_clock;
        debug!(
            "event=sim_inject module=sync status=ok peer={} clock={}",
            peer_id, snapshot.logical_clock
        );
        true
    }
}

impl<M: SharedMedium> SharedMedium for SimulatedMedium<M> {
    fn publish(&self, payload: &str) -> Result<(), MediumError> {
        self.inner.publish(payload)
    }

    fn fetch(&self) -> Result<Option<String>, MediumError> {
        let current = self.inner.fetch()?;
        let mut state = self.state.lock().map_err(|_| MediumError::Poisoned)?;
        if !state.rng.gen_bool(self.settings.activity_rate) {
            return Ok(current);
        }

        let mut snapshot = match current.as_deref().map(SharedSnapshot::from_json) {
            Some(Ok(snapshot)) => snapshot,
            None => SharedSnapshot::default(),
            Some(Err(err)) => {
                warn!("event=sim_inject module=sync status=skipped error={err}");
                return Ok(current);
            }
        };
        if !self.inject(&mut state, &mut snapshot) {
            return Ok(current);
        }
        match snapshot.to_json() {
            Ok(payload) => {
                self.inner.publish(&payload)?;
                Ok(Some(payload))
            }
            Err(err) => {
                warn!("event=sim_inject module=sync status=skipped error={err}");
                Ok(current)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{SimulatedMedium, SimulationSettings};
    use crate::model::snapshot::SharedSnapshot;
    use crate::sync::medium::{InMemoryMedium, SharedMedium};

    #[test]
    fn always_active_simulation_bumps_clock_and_adds_peer() {
        let settings = SimulationSettings {
            activity_rate: 1.0,
            note_rate: 1.0,
            ..SimulationSettings::default()
        };
        let medium = SimulatedMedium::new(InMemoryMedium::new(), settings, 11);
        medium.set_now(5_000);

        let payload = medium.fetch().expect("fetch").expect("injected payload");
        let snapshot = SharedSnapshot::from_json(&payload).expect("valid snapshot");
        assert_eq!(snapshot.logical_clock, 1);
        assert_eq!(snapshot.participants.len(), 1);
        assert_eq!(snapshot.participants[0].last_active_at, 5_000);
        assert_eq!(snapshot.notes.len(), 1);
        let note_id = &snapshot.notes[0].id;
        assert!(snapshot.positions.contains_key(note_id));
        assert!(snapshot.responses[note_id].is_some());

        let republished = medium.inner().fetch().expect("fetch inner");
        assert_eq!(republished.as_deref(), Some(payload.as_str()));
    }

    #[test]
    fn exhausted_clock_is_passed_through_untouched() {
        let settings = SimulationSettings {
            activity_rate: 1.0,
            ..SimulationSettings::default()
        };
        let inner = InMemoryMedium::new();
        let saturated = SharedSnapshot {
            logical_clock: u64::MAX - 1,
            ..SharedSnapshot::default()
        }
        .to_json()
        .expect("encode");
        inner.publish(&saturated).expect("publish");

        let medium = SimulatedMedium::new(inner, settings, 5);
        assert_eq!(medium.fetch().expect("fetch").as_deref(), Some(saturated.as_str()));
        assert_eq!(
            medium.inner().fetch().expect("fetch inner").as_deref(),
            Some(saturated.as_str())
        );
    }

    #[test]
    fn inactive_simulation_passes_through() {
        let settings = SimulationSettings {
            activity_rate: 0.0,
            ..SimulationSettings::default()
        };
        let medium = SimulatedMedium::new(InMemoryMedium::new(), settings, 3);
        assert!(medium.fetch().expect("fetch").is_none());
        medium.publish("x").expect("publish");
        assert_eq!(medium.fetch().expect("fetch").as_deref(), Some("x"));
    }
}
