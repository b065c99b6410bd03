//! Local-first session state: notes and presence.
//!
//! # Responsibility
//! - Hold the participant's optimistic copy of the shared board.
//! - Expose mutation APIs that the sync engine later publishes.

pub mod note_store;
pub mod presence;
pub mod seed;
