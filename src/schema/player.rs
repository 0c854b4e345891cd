use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Flag counting demons slain in combat.
pub const KILL_FLAG: &str = "killedDemons";
/// Flag counting discovered secrets.
pub const SECRETS_FLAG: &str = "secretsFound";

/// One of the three player stats a choice can be gated on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Stat {
    Strength,
    Willpower,
    Arcane,
}

impl Stat {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Strength => "strength",
            Self::Willpower => "willpower",
            Self::Arcane => "arcane",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stats {
    pub strength: i32,
    pub willpower: i32,
    pub arcane: i32,
}

impl Stats {
    pub fn get(&self, stat: Stat) -> i32 {
        match stat {
            Stat::Strength => self.strength,
            Stat::Willpower => self.willpower,
            Stat::Arcane => self.arcane,
        }
    }
}

impl Default for Stats {
    fn default() -> Self {
        Self {
            strength: 10,
            willpower: 10,
            arcane: 10,
        }
    }
}

/// A story flag value.
///
/// Comparisons are type-sensitive: `Bool(true)` never equals `Int(1)`, and a
/// `List` never equals a number even when the content expects a count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FlagValue {
    Bool(bool),
    Int(i64),
    List(Vec<String>),
}

impl FlagValue {
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(n) => Some(*n),
            _ => None,
        }
    }
}

impl std::fmt::Display for FlagValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{}", b),
            Self::Int(n) => write!(f, "{}", n),
            Self::List(items) => write!(f, "[{}]", items.join(", ")),
        }
    }
}

/// Numeric player fields an ending can require a minimum of.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlayerField {
    Health,
    MaxHealth,
    Sanity,
    MaxSanity,
    Corruption,
}

/// The player character. Only the effect applicator and the combat resolver
/// mutate it, and both keep health, sanity and corruption in range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub health: i32,
    pub max_health: i32,
    pub sanity: i32,
    pub max_sanity: i32,
    pub corruption: i32,
    pub weapon: String,
    pub inventory: Vec<String>,
    pub stats: Stats,
    pub flags: BTreeMap<String, FlagValue>,
}

impl Default for Player {
    fn default() -> Self {
        let flags = [
            ("hasRitualDagger", FlagValue::Bool(false)),
            ("hasBloodGem", FlagValue::Bool(false)),
            ("hasEldritchTome", FlagValue::Bool(false)),
            ("hasSoulJar", FlagValue::Bool(false)),
            ("visitedRooms", FlagValue::List(Vec::new())),
            ("sacrificedFollowers", FlagValue::Int(0)),
            (SECRETS_FLAG, FlagValue::Int(0)),
            ("doomCounter", FlagValue::Int(0)),
            ("readForbiddenTexts", FlagValue::List(Vec::new())),
            (KILL_FLAG, FlagValue::Int(0)),
            ("acceptedFate", FlagValue::Bool(false)),
            ("wasScreaming", FlagValue::Bool(false)),
            ("warnedOther", FlagValue::Bool(false)),
            ("secretPath", FlagValue::Bool(false)),
            ("tookCommunion", FlagValue::Bool(false)),
            ("realityTouched", FlagValue::Bool(false)),
            ("acceptedHamster", FlagValue::Bool(false)),
        ]
        .into_iter()
        .map(|(name, value)| (name.to_string(), value))
        .collect();

        Self {
            health: 100,
            max_health: 100,
            sanity: 100,
            max_sanity: 100,
            corruption: 0,
            weapon: "Fists".to_string(),
            inventory: Vec::new(),
            stats: Stats::default(),
            flags,
        }
    }
}

impl Player {
    /// Returns true if at least one copy of `item` is carried.
    pub fn has_item(&self, item: &str) -> bool {
        self.inventory.iter().any(|i| i == item)
    }

    pub fn flag(&self, name: &str) -> Option<&FlagValue> {
        self.flags.get(name)
    }

    /// Integer value of a counter flag, or 0 when unset or not a counter.
    pub fn counter(&self, name: &str) -> i64 {
        self.flag(name).and_then(FlagValue::as_int).unwrap_or(0)
    }

    pub fn stat(&self, stat: Stat) -> i32 {
        self.stats.get(stat)
    }

    pub fn field(&self, field: PlayerField) -> i32 {
        match field {
            PlayerField::Health => self.health,
            PlayerField::MaxHealth => self.max_health,
            PlayerField::Sanity => self.sanity,
            PlayerField::MaxSanity => self.max_sanity,
            PlayerField::Corruption => self.corruption,
        }
    }

    pub fn set_health(&mut self, value: i32) {
        self.health = value.clamp(0, self.max_health);
    }

    pub fn set_sanity(&mut self, value: i32) {
        self.sanity = value.clamp(0, self.max_sanity);
    }

    pub fn set_corruption(&mut self, value: i32) {
        self.corruption = value.clamp(0, 100);
    }
}
