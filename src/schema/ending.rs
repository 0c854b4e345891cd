use serde::{Deserialize, Serialize};

use super::player::{FlagValue, PlayerField};

/// Thematic category of an ending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EndingType {
    Ascension,
    Damnation,
    Corruption,
    Purification,
    Eternal,
    Void,
    Secret,
}

/// A single predicate over player state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Requirement {
    /// The flag must equal the value exactly.
    Flag(String, FlagValue),
    /// The numeric field must be at least the value.
    AtLeast(PlayerField, i32),
}

/// A terminal state of the game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ending {
    pub id: String,
    pub title: String,
    pub description: String,
    pub kind: EndingType,
    #[serde(default)]
    pub requirements: Vec<Requirement>,
    #[serde(default)]
    pub unlock_message: Option<String>,
}
