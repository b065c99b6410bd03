//! Shared domain model for sticky notes, presence and snapshots.
//!
//! # Responsibility
//! - Define the canonical records exchanged between participants.
//! - Keep the JSON shape of `SharedSnapshot` stable (camelCase fields).
//!
//! # Invariants
//! - Every note is identified by a stable `NoteId`.
//! - Time is expressed in logical milliseconds supplied by the session driver.

pub mod note;
pub mod participant;
pub mod snapshot;

/// Logical time in milliseconds.
///
/// The session driver decides what "now" is; core code never reads the
/// wall clock for ordering decisions.
pub type Timestamp = u64;
