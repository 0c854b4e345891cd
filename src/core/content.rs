/// Content packs: the static scene, enemy, ending, companion and dialogue
/// tables a session plays through.
///
/// A pack on disk is a directory of RON files:
///
/// - `scenes.ron`: list of scenes, enemies referenced by id
/// - `enemies.ron`: map of enemy id to enemy
/// - `endings.ron`: ordered list of endings
/// - `companions.ron`: list of companion templates
/// - `dialogue.ron`: companion lines per cue
/// - `engine.ron`: optional [`EngineConfig`](crate::core::config::EngineConfig)

use rustc_hash::{FxHashMap, FxHashSet};
use serde::Deserialize;
use std::collections::{BTreeMap, VecDeque};
use std::path::Path;
use thiserror::Error;
use tracing::{debug, warn};

use crate::core::config::EngineConfig;
use crate::core::dialogue::DialogueTable;
use crate::schema::companion::CompanionTemplate;
use crate::schema::ending::{Ending, Requirement};
use crate::schema::enemy::Enemy;
use crate::schema::player::{FlagValue, Player, Stat};
use crate::schema::scene::{Choice, Effect, Gate, RandomEvent, Scene};

#[derive(Debug, Error)]
pub enum ContentError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("RON deserialization error: {0}")]
    Ron(#[from] ron::error::SpannedError),
    #[error("scene '{scene}' references unknown enemy '{enemy}'")]
    UnknownEnemy { scene: String, enemy: String },
    #[error("{role} scene '{id}' is not defined")]
    MissingScene { role: &'static str, id: String },
    #[error("{role} ending '{id}' is not defined")]
    MissingEnding { role: &'static str, id: String },
}

// On-disk shapes. Choices list their gates and effects as optional named
// fields; the loader folds them into ordered `Gate`/`Effect` lists.

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RonStatCheck {
    stat: Stat,
    threshold: i32,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RonChoice {
    text: String,
    next_scene: String,
    #[serde(default)]
    required_items: Vec<String>,
    #[serde(default)]
    required_flags: BTreeMap<String, FlagValue>,
    #[serde(default)]
    stat_check: Option<RonStatCheck>,
    #[serde(default)]
    add_items: Vec<String>,
    #[serde(default)]
    remove_items: Vec<String>,
    #[serde(default)]
    set_flags: BTreeMap<String, FlagValue>,
    #[serde(default)]
    health_change: i32,
    #[serde(default)]
    sanity_change: i32,
    #[serde(default)]
    corruption_change: i32,
    #[serde(default)]
    companion_loyalty: i32,
    #[serde(default)]
    random_events: Vec<RandomEvent>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RonScene {
    id: String,
    title: String,
    #[serde(default)]
    text: Vec<String>,
    #[serde(default)]
    choices: Vec<RonChoice>,
    #[serde(default)]
    enemy: Option<String>,
    #[serde(default)]
    ambient_sound: Option<String>,
    #[serde(default)]
    corruption_level: Option<u32>,
}

impl From<RonChoice> for Choice {
    fn from(raw: RonChoice) -> Self {
        let mut gates = Vec::new();
        if !raw.required_items.is_empty() {
            gates.push(Gate::Items(raw.required_items));
        }
        if !raw.required_flags.is_empty() {
            gates.push(Gate::Flags(raw.required_flags));
        }
        if let Some(check) = raw.stat_check {
            gates.push(Gate::Stat {
                stat: check.stat,
                threshold: check.threshold,
            });
        }

        let mut effects = Vec::new();
        if !raw.add_items.is_empty() {
            effects.push(Effect::AddItems(raw.add_items));
        }
        if !raw.remove_items.is_empty() {
            effects.push(Effect::RemoveItems(raw.remove_items));
        }
        if !raw.set_flags.is_empty() {
            effects.push(Effect::SetFlags(raw.set_flags));
        }
        let deltas: [(i32, fn(i32) -> Effect); 4] = [
            (raw.health_change, Effect::Health),
            (raw.sanity_change, Effect::Sanity),
            (raw.corruption_change, Effect::Corruption),
            (raw.companion_loyalty, Effect::Loyalty),
        ];
        for (delta, effect) in deltas {
            if delta != 0 {
                effects.push(effect(delta));
            }
        }

        Choice {
            text: raw.text,
            next_scene: raw.next_scene,
            gates,
            effects,
            random_events: raw.random_events,
        }
    }
}

/// Raw RON text for every table of a pack. Optional tables may be empty
/// strings.
#[derive(Debug, Clone, Copy, Default)]
pub struct PackSources<'a> {
    pub scenes: &'a str,
    pub enemies: &'a str,
    pub endings: &'a str,
    pub companions: &'a str,
    pub dialogue: &'a str,
}

/// The loaded, read-only tables of a content pack.
#[derive(Debug, Clone, Default)]
pub struct ContentSet {
    pub scenes: FxHashMap<String, Scene>,
    pub enemies: FxHashMap<String, Enemy>,
    /// Matching order.
    pub endings: Vec<Ending>,
    pub companions: FxHashMap<String, CompanionTemplate>,
    pub dialogue: DialogueTable,
}

impl ContentSet {
    /// Load a pack directory. `scenes.ron` and `endings.ron` are required;
    /// the other tables are skipped when absent.
    pub fn load_from_dir(dir: &Path) -> Result<ContentSet, ContentError> {
        let read = |name: &str, required: bool| -> Result<String, ContentError> {
            let path = dir.join(name);
            if !required && !path.exists() {
                debug!(path = %path.display(), "optional content table absent");
                return Ok(String::new());
            }
            Ok(std::fs::read_to_string(path)?)
        };

        let scenes = read("scenes.ron", true)?;
        let enemies = read("enemies.ron", false)?;
        let endings = read("endings.ron", true)?;
        let companions = read("companions.ron", false)?;
        let dialogue = read("dialogue.ron", false)?;

        Self::parse_pack(&PackSources {
            scenes: &scenes,
            enemies: &enemies,
            endings: &endings,
            companions: &companions,
            dialogue: &dialogue,
        })
    }

    pub fn parse_pack(sources: &PackSources<'_>) -> Result<ContentSet, ContentError> {
        let enemies = Self::parse_enemies(sources.enemies)?;
        let scenes = Self::parse_scenes(sources.scenes, &enemies)?;
        let endings = Self::parse_endings(sources.endings)?;
        let companions = Self::parse_companions(sources.companions)?;
        let dialogue = if sources.dialogue.trim().is_empty() {
            DialogueTable::default()
        } else {
            DialogueTable::parse_ron(sources.dialogue)?
        };

        let mut set = ContentSet {
            enemies,
            endings,
            dialogue,
            ..ContentSet::default()
        };
        for scene in scenes {
            if set.scenes.contains_key(&scene.id) {
                warn!(scene = %scene.id, "duplicate scene id, later definition wins");
            }
            set.scenes.insert(scene.id.clone(), scene);
        }
        for companion in companions {
            set.companions.insert(companion.id.clone(), companion);
        }
        debug!(
            scenes = set.scenes.len(),
            endings = set.endings.len(),
            companions = set.companions.len(),
            "parsed content pack"
        );
        Ok(set)
    }

    pub fn parse_enemies(input: &str) -> Result<FxHashMap<String, Enemy>, ContentError> {
        if input.trim().is_empty() {
            return Ok(FxHashMap::default());
        }
        Ok(ron::from_str(input)?)
    }

    /// Parse a scene list, resolving enemy ids against `enemies`.
    pub fn parse_scenes(
        input: &str,
        enemies: &FxHashMap<String, Enemy>,
    ) -> Result<Vec<Scene>, ContentError> {
        let raw: Vec<RonScene> = ron::from_str(input)?;
        raw.into_iter()
            .map(|scene| {
                let enemy = match scene.enemy {
                    Some(enemy_id) => match enemies.get(&enemy_id) {
                        Some(enemy) => Some(enemy.clone()),
                        None => {
                            return Err(ContentError::UnknownEnemy {
                                scene: scene.id,
                                enemy: enemy_id,
                            })
                        }
                    },
                    None => None,
                };
                Ok(Scene {
                    id: scene.id,
                    title: scene.title,
                    text: scene.text,
                    choices: scene.choices.into_iter().map(Choice::from).collect(),
                    enemy,
                    ambient_sound: scene.ambient_sound,
                    corruption_level: scene.corruption_level,
                })
            })
            .collect()
    }

    pub fn parse_endings(input: &str) -> Result<Vec<Ending>, ContentError> {
        Ok(ron::from_str(input)?)
    }

    pub fn parse_companions(input: &str) -> Result<Vec<CompanionTemplate>, ContentError> {
        if input.trim().is_empty() {
            return Ok(Vec::new());
        }
        Ok(ron::from_str(input)?)
    }

    /// Merge another pack into this one. Entries from `other` override
    /// entries with the same id; new endings are appended in order.
    pub fn merge(&mut self, other: ContentSet) {
        self.scenes.extend(other.scenes);
        self.enemies.extend(other.enemies);
        self.companions.extend(other.companions);
        for ending in other.endings {
            match self.endings.iter_mut().find(|e| e.id == ending.id) {
                Some(slot) => *slot = ending,
                None => self.endings.push(ending),
            }
        }
        self.dialogue.merge(other.dialogue);
    }

    /// Check the ids the engine relies on exist in this pack.
    pub fn validate(&self, config: &EngineConfig) -> Result<(), ContentError> {
        for (role, id) in [("start", &config.start_scene), ("flee", &config.flee_scene)] {
            if !self.scenes.contains_key(id) {
                return Err(ContentError::MissingScene {
                    role,
                    id: id.clone(),
                });
            }
        }
        for (role, id) in [("void", &config.void_ending), ("defeat", &config.defeat_ending)] {
            if self.ending(id).is_none() {
                return Err(ContentError::MissingEnding {
                    role,
                    id: id.clone(),
                });
            }
        }
        Ok(())
    }

    pub fn scene(&self, id: &str) -> Option<&Scene> {
        self.scenes.get(id)
    }

    pub fn ending(&self, id: &str) -> Option<&Ending> {
        self.endings.iter().find(|e| e.id == id)
    }

    pub fn companion(&self, id: &str) -> Option<&CompanionTemplate> {
        self.companions.get(id)
    }

    /// Scene ids in sorted order.
    pub fn scene_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.scenes.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    /// `(scene, target)` pairs where a choice or random event points at a
    /// scene that does not exist.
    pub fn dangling_targets(&self) -> Vec<(String, String)> {
        let mut dangling = Vec::new();
        for scene in self.scenes.values() {
            for target in scene.choices.iter().flat_map(Choice::targets) {
                if !self.scenes.contains_key(target) {
                    dangling.push((scene.id.clone(), target.to_string()));
                }
            }
        }
        dangling.sort();
        dangling.dedup();
        dangling
    }

    /// Scenes no path of choices reaches from `start`.
    pub fn unreachable_scenes(&self, start: &str) -> Vec<String> {
        let mut seen: FxHashSet<&str> = FxHashSet::default();
        let mut queue: VecDeque<&str> = VecDeque::new();
        if self.scenes.contains_key(start) {
            seen.insert(start);
            queue.push_back(start);
        }
        while let Some(id) = queue.pop_front() {
            let Some(scene) = self.scenes.get(id) else {
                continue;
            };
            for target in scene.choices.iter().flat_map(Choice::targets) {
                if self.scenes.contains_key(target) && seen.insert(target) {
                    queue.push_back(target);
                }
            }
        }

        let mut unreachable: Vec<String> = self
            .scenes
            .keys()
            .filter(|id| !seen.contains(id.as_str()))
            .cloned()
            .collect();
        unreachable.sort();
        unreachable
    }

    /// `(location, flag)` pairs naming flags the player never carries.
    pub fn unknown_flags(&self) -> Vec<(String, String)> {
        let known = Player::default().flags;
        let mut unknown = Vec::new();

        for scene in self.scenes.values() {
            for (index, choice) in scene.choices.iter().enumerate() {
                let location = format!("{}#{}", scene.id, index);
                let gate_flags = choice.gates.iter().filter_map(|gate| match gate {
                    Gate::Flags(flags) => Some(flags),
                    _ => None,
                });
                let effect_flags = choice.effects.iter().filter_map(|effect| match effect {
                    Effect::SetFlags(flags) => Some(flags),
                    _ => None,
                });
                for name in gate_flags.chain(effect_flags).flat_map(|flags| flags.keys()) {
                    if !known.contains_key(name) {
                        unknown.push((location.clone(), name.clone()));
                    }
                }
            }
        }

        for ending in &self.endings {
            for requirement in &ending.requirements {
                if let Requirement::Flag(name, _) = requirement {
                    if !known.contains_key(name) {
                        unknown.push((ending.id.clone(), name.clone()));
                    }
                }
            }
        }

        unknown.sort();
        unknown
    }
}
