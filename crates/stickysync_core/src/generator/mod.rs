//! Response generation collaborator and in-flight bookkeeping.
//!
//! # Responsibility
//! - Define the `ResponseGenerator` seam and the built-in template generator.
//! - Track which generation request is current for each note.
//!
//! # Invariants
//! - Generation is a pure function of `(model_id, prompt)`.
//! - Completions for deleted or superseded requests are never written back.

pub mod template;
pub mod tracker;

pub use template::{GenerateError, ResponseGenerator, TemplateGenerator};
pub use tracker::{GenerationRequest, GenerationTicket, GenerationTracker};
