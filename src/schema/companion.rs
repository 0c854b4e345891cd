use serde::{Deserialize, Serialize};

/// The special ability a companion brings along.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Ability {
    RevealPaths,
    /// May cancel an enemy counterattack.
    BlockAttack,
    StealItems,
    BridgeVoid,
}

/// Moments a companion may comment on. The engine emits these as events;
/// the dialogue table turns them into lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CompanionCue {
    ChoiceMade,
    CombatStart,
    CombatVictory,
    LowHealth,
    SecretFound,
}

impl CompanionCue {
    pub fn name(&self) -> &'static str {
        match self {
            Self::ChoiceMade => "choice_made",
            Self::CombatStart => "combat_start",
            Self::CombatVictory => "combat_victory",
            Self::LowHealth => "low_health",
            Self::SecretFound => "secret_found",
        }
    }
}

/// Static companion definition from the content pack.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanionTemplate {
    pub id: String,
    pub default_name: String,
    pub species: String,
    pub personality: String,
    pub loyalty: i32,
    pub corruption: i32,
    pub ability: Ability,
    pub backstory: String,
    pub current_thought: String,
}

impl CompanionTemplate {
    /// Create an active companion, optionally renamed by the player.
    pub fn instantiate(&self, name: Option<&str>) -> Companion {
        let name = name
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .unwrap_or(&self.default_name);
        Companion {
            id: self.id.clone(),
            name: name.to_string(),
            species: self.species.clone(),
            personality: self.personality.clone(),
            backstory: self.backstory.clone(),
            loyalty: self.loyalty.clamp(0, 100),
            corruption: self.corruption.clamp(0, 100),
            ability: self.ability,
            current_thought: self.current_thought.clone(),
            active: true,
        }
    }
}

/// A recruited companion. Outlives scenes; at most one is active.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Companion {
    pub id: String,
    pub name: String,
    pub species: String,
    pub personality: String,
    pub backstory: String,
    pub loyalty: i32,
    pub corruption: i32,
    pub ability: Ability,
    pub current_thought: String,
    pub active: bool,
}

impl Companion {
    pub fn adjust_loyalty(&mut self, delta: i32) {
        self.loyalty = self.loyalty.saturating_add(delta).clamp(0, 100);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn patch() -> CompanionTemplate {
        CompanionTemplate {
            id: "patch".to_string(),
            default_name: "Patch".to_string(),
            species: "Corrupted Code-Knight".to_string(),
            personality: "Stoic and protective".to_string(),
            loyalty: 0,
            corruption: 140,
            ability: Ability::BlockAttack,
            backstory: "A security program that gained sentience.".to_string(),
            current_thought: "(help)".to_string(),
        }
    }

    #[test]
    fn instantiate_uses_custom_name() {
        let companion = patch().instantiate(Some("Sir Patchalot"));
        assert_eq!(companion.name, "Sir Patchalot");
        assert_eq!(companion.id, "patch");
        assert!(companion.active);
    }

    #[test]
    fn instantiate_falls_back_to_default_name() {
        assert_eq!(patch().instantiate(None).name, "Patch");
        assert_eq!(patch().instantiate(Some("   ")).name, "Patch");
    }

    #[test]
    fn instantiate_clamps_stats() {
        let companion = patch().instantiate(None);
        assert_eq!(companion.corruption, 100);
    }

    #[test]
    fn loyalty_stays_in_range() {
        let mut companion = patch().instantiate(None);
        companion.adjust_loyalty(-10);
        assert_eq!(companion.loyalty, 0);
        companion.adjust_loyalty(250);
        assert_eq!(companion.loyalty, 100);
    }

    #[test]
    fn cue_names() {
        assert_eq!(CompanionCue::CombatVictory.name(), "combat_victory");
        assert_eq!(CompanionCue::ChoiceMade.name(), "choice_made");
    }
}
