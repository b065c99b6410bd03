//! Sticky note domain model.
//!
//! # Responsibility
//! - Define the note record, its display enums and canvas geometry.
//! - Derive owner-scoped note ids.
//!
//! # Invariants
//! - `NoteId` is never reused for another note.
//! - A seed note is ownerless and carries one of `SEED_NOTE_IDS`. Only seed
//!   notes are editable by every participant; any other ownerless note is
//!   editable by no one.
//! - Positions produced through `CanvasBounds::clamp` lie inside the canvas.

use crate::model::participant::ParticipantId;
use crate::model::Timestamp;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Ids reserved for the example board.
pub const SEED_NOTE_IDS: [&str; 3] = ["example-1", "example-2", "example-3"];

/// Stable identifier of one sticky note.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NoteId(String);

impl NoteId {
    /// Wraps an existing id (import, seed and snapshot paths).
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Generates a fresh id scoped to `owner`.
    ///
    /// Format: `<owner>:<uuid-v4-simple>`. The owner prefix is informative
    /// only; ownership checks compare `Note::owner_id`.
    pub fn generate(owner: &ParticipantId) -> Self {
        Self(format!("{}:{}", owner.as_str(), Uuid::new_v4().simple()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for NoteId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NoteId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Sticky note background palette. Also used as participant color tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoteColor {
    #[default]
    Yellow,
    Blue,
    Green,
    Pink,
    Purple,
    Orange,
}

impl NoteColor {
    pub const ALL: [NoteColor; 6] = [
        Self::Yellow,
        Self::Blue,
        Self::Green,
        Self::Pink,
        Self::Purple,
        Self::Orange,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Yellow => "yellow",
            Self::Blue => "blue",
            Self::Green => "green",
            Self::Pink => "pink",
            Self::Purple => "purple",
            Self::Orange => "orange",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        let normalized = value.trim();
        Self::ALL
            .into_iter()
            .find(|color| color.as_str() == normalized)
    }
}

/// Language model a note's prompt is addressed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum LlmModel {
    #[default]
    #[serde(rename = "gpt-4")]
    Gpt4,
    #[serde(rename = "claude-3-opus")]
    Claude3Opus,
    #[serde(rename = "claude-3-sonnet")]
    Claude3Sonnet,
    #[serde(rename = "llama-3")]
    Llama3,
    #[serde(rename = "gemini-pro")]
    GeminiPro,
}

impl LlmModel {
    pub const ALL: [LlmModel; 5] = [
        Self::Gpt4,
        Self::Claude3Opus,
        Self::Claude3Sonnet,
        Self::Llama3,
        Self::GeminiPro,
    ];

    /// Stable model id used on the wire and by generator registries.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Gpt4 => "gpt-4",
            Self::Claude3Opus => "claude-3-opus",
            Self::Claude3Sonnet => "claude-3-sonnet",
            Self::Llama3 => "llama-3",
            Self::GeminiPro => "gemini-pro",
        }
    }

    /// User-facing model label.
    pub fn display_name(self) -> &'static str {
        match self {
            Self::Gpt4 => "GPT-4",
            Self::Claude3Opus => "Claude 3 Opus",
            Self::Claude3Sonnet => "Claude 3 Sonnet",
            Self::Llama3 => "Llama 3",
            Self::GeminiPro => "Gemini Pro",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        let normalized = value.trim();
        Self::ALL
            .into_iter()
            .find(|model| model.as_str() == normalized)
    }
}

/// Canonical sticky note record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: NoteId,
    /// `None` only for seed notes.
    pub owner_id: Option<ParticipantId>,
    pub title: String,
    pub prompt: String,
    pub color: NoteColor,
    pub model: LlmModel,
    pub created_at: Timestamp,
}

impl Note {
    /// Returns whether this note belongs to the ownerless seed set.
    pub fn is_seed(&self) -> bool {
        self.owner_id.is_none() && SEED_NOTE_IDS.contains(&self.id.as_str())
    }

    /// Ownership predicate: explicit owner equality, or a seed note.
    pub fn is_editable_by(&self, requester: &ParticipantId) -> bool {
        match &self.owner_id {
            Some(owner) => owner == requester,
            None => self.is_seed(),
        }
    }
}

/// Note placement on the shared canvas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Position {
    pub note_id: NoteId,
    pub x: f64,
    pub y: f64,
}

/// A bare 2D point (pointer coordinates, drag anchors).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Inclusive canvas bounds `[0, max_x] x [0, max_y]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CanvasBounds {
    pub max_x: f64,
    pub max_y: f64,
}

impl Default for CanvasBounds {
    fn default() -> Self {
        Self {
            max_x: 800.0,
            max_y: 500.0,
        }
    }
}

impl CanvasBounds {
    /// Clamps both axes into the canvas. NaN collapses to the origin.
    pub fn clamp(&self, point: Point) -> Point {
        Point {
            x: clamp_axis(point.x, self.max_x),
            y: clamp_axis(point.y, self.max_y),
        }
    }

    pub fn contains(&self, point: Point) -> bool {
        (0.0..=self.max_x).contains(&point.x) && (0.0..=self.max_y).contains(&point.y)
    }
}

fn clamp_axis(value: f64, max: f64) -> f64 {
    if value.is_nan() {
        return 0.0;
    }
    value.max(0.0).min(max)
}

#[cfg(test)]
mod tests {
    use super::{CanvasBounds, LlmModel, Note, NoteColor, NoteId, Point};
    use crate::model::participant::ParticipantId;

    fn note_owned_by(owner: Option<&str>) -> Note {
        note_with_id("n1", owner)
    }

    fn note_with_id(id: &str, owner: Option<&str>) -> Note {
        Note {
            id: NoteId::new(id),
            owner_id: owner.map(ParticipantId::new),
            title: "t".to_string(),
            prompt: "p".to_string(),
            color: NoteColor::Yellow,
            model: LlmModel::Gpt4,
            created_at: 0,
        }
    }

    #[test]
    fn ownership_uses_exact_owner_equality() {
        let note = note_owned_by(Some("u10"));
        assert!(note.is_editable_by(&ParticipantId::new("u10")));
        assert!(!note.is_editable_by(&ParticipantId::new("u1")));
        assert!(!note.is_editable_by(&ParticipantId::new("u100")));
    }

    #[test]
    fn seed_notes_are_editable_by_anyone() {
        let note = note_with_id("example-2", None);
        assert!(note.is_seed());
        assert!(note.is_editable_by(&ParticipantId::new("anyone")));
    }

    #[test]
    fn ownerless_note_outside_seed_ids_is_locked() {
        let note = note_owned_by(None);
        assert!(!note.is_seed());
        assert!(!note.is_editable_by(&ParticipantId::new("anyone")));

        let claimed = note_with_id("example-1", Some("u1"));
        assert!(!claimed.is_seed());
        assert!(!claimed.is_editable_by(&ParticipantId::new("u2")));
    }

    #[test]
    fn generated_ids_are_unique_and_owner_scoped() {
        let owner = ParticipantId::new("u1");
        let first = NoteId::generate(&owner);
        let second = NoteId::generate(&owner);
        assert_ne!(first, second);
        assert!(first.as_str().starts_with("u1:"));
    }

    #[test]
    fn clamp_keeps_points_inside_canvas() {
        let bounds = CanvasBounds::default();
        assert_eq!(bounds.clamp(Point::new(-5.0, 900.0)), Point::new(0.0, 500.0));
        assert_eq!(bounds.clamp(Point::new(f64::NAN, 10.0)), Point::new(0.0, 10.0));
        assert!(bounds.contains(Point::new(800.0, 0.0)));
    }

    #[test]
    fn model_and_color_parse_wire_ids() {
        assert_eq!(LlmModel::parse(" claude-3-opus "), Some(LlmModel::Claude3Opus));
        assert_eq!(LlmModel::parse("gpt-5"), None);
        assert_eq!(NoteColor::parse("pink"), Some(NoteColor::Pink));
        assert_eq!(
            serde_json::to_string(&LlmModel::Llama3).expect("serialize model"),
            "\"llama-3\""
        );
    }
}
