//! Scene Engine: a deterministic engine for branching narrative games.
//!
//! Walks a graph of scenes loaded from RON content packs, applies choice
//! effects to persistent player state, resolves weighted random events and
//! turn-based combat, and matches endings after every change.

pub mod core;
pub mod schema;

pub use crate::core::config::EngineConfig;
pub use crate::core::content::{ContentError, ContentSet};
pub use crate::core::session::{EngineError, GameSession, GameSessionBuilder};
