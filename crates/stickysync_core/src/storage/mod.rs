//! Key-value persistence on top of the SQLite schema.
//!
//! # Responsibility
//! - Persist participant identity across restarts.
//! - Provide the fixed-key slots used by the SQLite shared medium.

pub mod identity;
pub mod kv;
