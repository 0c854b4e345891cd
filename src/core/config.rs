/// Engine tuning, loaded from a pack's `engine.ron`.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::core::content::ContentError;

/// Every field has a default, so a pack only lists what it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub start_scene: String,
    /// Where a successful flee lands.
    pub flee_scene: String,
    pub void_ending: String,
    /// Forced when the player dies in combat.
    pub defeat_ending: String,
    /// Minimum corruption for the void ending once sanity hits zero.
    pub void_corruption_threshold: i32,
    pub log_capacity: usize,
    pub victory_delay_ms: u64,
    pub flee_chance: u32,
    pub block_chance: u32,
    /// Loyalty a blocking companion must exceed.
    pub block_loyalty: i32,
    /// Loyalty a companion must exceed to add bonus damage.
    pub assist_loyalty: i32,
    /// Sanity below this (and above zero) after a loss prints a warning.
    pub low_sanity_warning: i32,
    /// Corruption above this after a gain prints a warning.
    pub corruption_warning: i32,
    /// Health below this after damage cues companion concern.
    pub low_health_cue: i32,
    pub narrator: Option<String>,
    pub intro: Vec<String>,
    pub low_sanity_line: String,
    pub corruption_line: String,
    pub defeat_line: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            start_scene: "start".to_string(),
            flee_scene: "ethernet_corridor".to_string(),
            void_ending: "the_void".to_string(),
            defeat_ending: "the_void".to_string(),
            void_corruption_threshold: 60,
            log_capacity: 31,
            victory_delay_ms: 1000,
            flee_chance: 40,
            block_chance: 30,
            block_loyalty: 30,
            assist_loyalty: 50,
            low_sanity_warning: 30,
            corruption_warning: 50,
            low_health_cue: 30,
            narrator: None,
            intro: Vec::new(),
            low_sanity_line: "You hear whispers in the static...".to_string(),
            corruption_line: "The corruption spreads through your veins...".to_string(),
            defeat_line: "And they were doing so well!".to_string(),
        }
    }
}

impl EngineConfig {
    pub fn load_from_ron(path: &Path) -> Result<EngineConfig, ContentError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse_ron(&contents)
    }

    pub fn parse_ron(input: &str) -> Result<EngineConfig, ContentError> {
        Ok(ron::from_str(input)?)
    }
}
