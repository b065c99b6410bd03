//! Shared snapshot: the unit exchanged with the shared medium.
//!
//! # Invariants
//! - JSON field names are `notes`, `responses`, `positions`, `participants`,
//!   `logicalClock`.
//! - `positions` and `responses` are keyed by note id.

use crate::model::note::{Note, NoteId, Position};
use crate::model::participant::Participant;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Monotonic logical clock value stamped on every published snapshot.
pub type LogicalClock = u64;

/// Snapshot encode/decode errors.
#[derive(Debug)]
pub enum SnapshotError {
    /// Published payload is malformed or has an unexpected shape.
    Deserialization(serde_json::Error),
    /// Local state could not be encoded.
    Serialization(serde_json::Error),
}

impl Display for SnapshotError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Deserialization(err) => write!(f, "malformed shared snapshot: {err}"),
            Self::Serialization(err) => write!(f, "failed to encode shared snapshot: {err}"),
        }
    }
}

impl Error for SnapshotError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Deserialization(err) | Self::Serialization(err) => Some(err),
        }
    }
}

/// Full shared state at one logical clock value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SharedSnapshot {
    pub notes: Vec<Note>,
    /// `None` means the response is still pending.
    pub responses: BTreeMap<NoteId, Option<String>>,
    pub positions: BTreeMap<NoteId, Position>,
    pub participants: Vec<Participant>,
    pub logical_clock: LogicalClock,
}

impl SharedSnapshot {
    pub fn from_json(payload: &str) -> Result<Self, SnapshotError> {
        serde_json::from_str(payload).map_err(SnapshotError::Deserialization)
    }

    pub fn to_json(&self) -> Result<String, SnapshotError> {
        serde_json::to_string(self).map_err(SnapshotError::Serialization)
    }
}
