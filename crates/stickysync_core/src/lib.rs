//! Core state and synchronization logic for StickySync boards.
//! This crate is the single source of truth for board invariants.

pub mod config;
pub mod db;
pub mod drag;
pub mod generator;
pub mod logging;
pub mod model;
pub mod session;
pub mod storage;
pub mod store;
pub mod sync;

pub use config::{ConfigError, SessionConfig, SpawnRegion};
pub use db::{open_db, open_db_in_memory, DbError, DbResult};
pub use drag::{DragController, DragError, DragState};
pub use generator::{GenerateError, ResponseGenerator, TemplateGenerator};
pub use logging::{default_log_level, init_logging, logging_status, LoggingConfig, LoggingError};
pub use model::note::{CanvasBounds, LlmModel, Note, NoteColor, NoteId, Point, Position};
pub use model::participant::{Participant, ParticipantId};
pub use model::snapshot::{LogicalClock, SharedSnapshot, SnapshotError};
pub use model::Timestamp;
pub use session::{Session, SessionError, SessionResult};
pub use storage::identity::{load_identity, load_or_create_identity, Identity, IdentityError};
pub use storage::kv::KvStore;
pub use store::note_store::{NoteStore, StoreContents, StoreError, StoreResult};
pub use store::presence::PresenceTracker;
pub use sync::{
    InMemoryMedium, IngestOutcome, MediumError, SharedMedium, SimulatedMedium, SimulationSettings,
    SqliteMedium, SyncEngine, SyncState, TickReport,
};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
