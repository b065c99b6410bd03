//! Snapshot synchronization against a shared medium.
//!
//! # Responsibility
//! - Define the shared medium seam and its adapters.
//! - Run the clock-gated whole-snapshot merge.
//!
//! # Invariants
//! - The medium is the only cross-participant shared resource.
//! - Simulated peers use the same medium seam as real storage.

pub mod engine;
pub mod medium;
pub mod simulated;

pub use engine::{IngestOutcome, SyncEngine, SyncState, TickReport};
pub use medium::{InMemoryMedium, MediumError, SharedMedium, SqliteMedium};
pub use simulated::{SimulatedMedium, SimulationSettings};
