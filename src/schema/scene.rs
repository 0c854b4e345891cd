use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::enemy::Enemy;
use super::player::{FlagValue, Stat};

/// A precondition on a choice. Gates are evaluated in the order they are
/// stored; the content loader always stores items, then flags, then stat.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Gate {
    /// Every named item must be in the inventory.
    Items(Vec<String>),
    /// Every named flag must equal the given value exactly.
    Flags(BTreeMap<String, FlagValue>),
    /// The named stat must be at least `threshold`.
    Stat { stat: Stat, threshold: i32 },
}

/// A state change carried by a choice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Effect {
    AddItems(Vec<String>),
    RemoveItems(Vec<String>),
    /// Assignment, not increment.
    SetFlags(BTreeMap<String, FlagValue>),
    Health(i32),
    Sanity(i32),
    Corruption(i32),
    /// Loyalty delta for the active companion, if any.
    Loyalty(i32),
}

/// One weighted outcome of a choice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomEvent {
    pub weight: u32,
    pub message: String,
    /// Overrides the choice's destination when this event fires.
    #[serde(default)]
    pub next_scene: Option<String>,
    /// Extra sanity lost when this event fires.
    #[serde(default)]
    pub sanity_damage: Option<i32>,
}

/// An edge of the scene graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Choice {
    pub text: String,
    pub next_scene: String,
    pub gates: Vec<Gate>,
    pub effects: Vec<Effect>,
    pub random_events: Vec<RandomEvent>,
}

impl Choice {
    /// A choice with no gates, effects or random events.
    pub fn new(text: &str, next_scene: &str) -> Self {
        Self {
            text: text.to_string(),
            next_scene: next_scene.to_string(),
            gates: Vec::new(),
            effects: Vec::new(),
            random_events: Vec::new(),
        }
    }

    /// Every scene id this choice can lead to.
    pub fn targets(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.next_scene.as_str()).chain(
            self.random_events
                .iter()
                .filter_map(|e| e.next_scene.as_deref()),
        )
    }
}

/// A node of the scene graph. Loaded once and never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    pub id: String,
    pub title: String,
    pub text: Vec<String>,
    pub choices: Vec<Choice>,
    /// Present on combat scenes.
    pub enemy: Option<Enemy>,
    pub ambient_sound: Option<String>,
    pub corruption_level: Option<u32>,
}

impl Scene {
    pub fn is_combat(&self) -> bool {
        self.enemy.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn choice_targets_include_event_overrides() {
        let mut choice = Choice::new("Examine the monitors", "examine_monitors");
        choice.random_events = vec![
            RandomEvent {
                weight: 25,
                message: "A hidden message".to_string(),
                next_scene: Some("hidden_message".to_string()),
                sanity_damage: None,
            },
            RandomEvent {
                weight: 75,
                message: "The text screams".to_string(),
                next_scene: None,
                sanity_damage: None,
            },
        ];
        let targets: Vec<&str> = choice.targets().collect();
        assert_eq!(targets, vec!["examine_monitors", "hidden_message"]);
    }

    #[test]
    fn scene_without_enemy_is_not_combat() {
        let scene = Scene {
            id: "first_room".to_string(),
            title: "The Antechamber of Errors".to_string(),
            text: vec!["You stand in a room that should not exist.".to_string()],
            choices: vec![Choice::new("Enter the corridor", "ethernet_corridor")],
            enemy: None,
            ambient_sound: None,
            corruption_level: None,
        };
        assert!(!scene.is_combat());
    }
}
