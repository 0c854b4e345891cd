/// Turn-based combat against a single enemy.
///
/// `CombatState` is a small state machine: `Idle` until a combat scene is
/// entered, `Active` while blows are exchanged, then `Resolved` with the
/// outcome. Only the session drives it.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::core::config::EngineConfig;
use crate::core::log::{Beat, LogLine};
use crate::core::rng::Lcg;
use crate::schema::companion::{Ability, Companion, CompanionCue};
use crate::schema::enemy::Enemy;
use crate::schema::player::{FlagValue, Player, KILL_FLAG};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CombatOutcome {
    Victory,
    Defeat,
    Fled,
}

/// The fight in progress.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Encounter {
    pub enemy: Enemy,
    pub enemy_health: i32,
    pub turns: u32,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub enum CombatState {
    #[default]
    Idle,
    Active(Encounter),
    Resolved(CombatOutcome),
}

/// Everything one combat action produced.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Exchange {
    /// Lines for the combat log.
    pub combat_lines: Vec<String>,
    /// Narrative log entries, in order.
    pub beats: Vec<Beat>,
    pub outcome: Option<CombatOutcome>,
    pub dealt: i32,
    pub taken: i32,
    pub blocked: bool,
}

impl Encounter {
    /// Start a fight at the enemy's full health. Returns the opening lines.
    pub fn begin(enemy: &Enemy) -> (Self, Vec<String>) {
        let lines = vec![
            format!("Combat started with {}!", enemy.name),
            enemy.description.clone(),
        ];
        let encounter = Self {
            enemy: enemy.clone(),
            enemy_health: enemy.max_health,
            turns: 0,
        };
        (encounter, lines)
    }

    /// Deal damage to the enemy. Returns true once it is down.
    pub fn strike(&mut self, damage: i32) -> bool {
        self.enemy_health = self.enemy_health.saturating_sub(damage.max(0)).max(0);
        self.enemy_health == 0
    }

    /// One attack round: the player strikes, and a surviving enemy
    /// counterattacks.
    pub fn attack(
        &mut self,
        player: &mut Player,
        companion: Option<&Companion>,
        rng: &mut Lcg,
        flavor: &mut StdRng,
        config: &EngineConfig,
    ) -> Exchange {
        let mut exchange = Exchange::default();
        self.turns += 1;

        let mut damage = rng.range(5, 15).saturating_add(player.stats.strength / 5);
        if let Some(ally) = companion.filter(|c| c.loyalty > config.assist_loyalty) {
            damage = damage.saturating_add(ally.loyalty / 10);
            exchange.beats.push(Beat::Cue(CompanionCue::CombatStart));
        }
        exchange.dealt = damage;
        exchange
            .combat_lines
            .push(format!("You attack for {} damage!", damage));

        if self.strike(damage) {
            info!(enemy = %self.enemy.name, turns = self.turns, "enemy defeated");
            exchange
                .combat_lines
                .push(format!("{} has been defeated!", self.enemy.name));
            exchange.beats.push(Beat::Cue(CompanionCue::CombatVictory));
            let kills = player.counter(KILL_FLAG);
            player
                .flags
                .insert(KILL_FLAG.to_string(), FlagValue::Int(kills.saturating_add(1)));
            exchange.outcome = Some(CombatOutcome::Victory);
            return exchange;
        }

        let (low, high) = (
            self.enemy.damage.saturating_sub(5),
            self.enemy.damage.saturating_add(5),
        );
        let mut incoming = rng.range(low, high).max(0);
        if let Some(guard) = companion.filter(|c| {
            c.ability == Ability::BlockAttack && c.loyalty > config.block_loyalty
        }) {
            if rng.chance(config.block_chance) {
                exchange.beats.push(Beat::Line(LogLine::plain(format!(
                    "{} blocks the attack!",
                    guard.name
                ))));
                exchange.blocked = true;
                incoming = 0;
            }
        }
        debug!(dealt = damage, taken = incoming, enemy_health = self.enemy_health, "combat round");

        if incoming > 0 {
            exchange
                .combat_lines
                .push(format!("{} attacks for {} damage!", self.enemy.name, incoming));
            if let Some(message) = self.enemy.attack_messages.choose(flavor) {
                exchange.combat_lines.push(message.clone());
            }
        }
        exchange.taken = incoming;
        player.set_health(player.health.saturating_sub(incoming));

        if player.health == 0 {
            info!(enemy = %self.enemy.name, "player defeated in combat");
            exchange
                .beats
                .push(Beat::Line(LogLine::plain("You have been defeated in combat.")));
            exchange
                .beats
                .push(Beat::Line(LogLine::narrator(config.defeat_line.clone())));
            exchange.outcome = Some(CombatOutcome::Defeat);
        } else if incoming > 0 && player.health < config.low_health_cue {
            exchange.beats.push(Beat::Cue(CompanionCue::LowHealth));
        }

        exchange
    }

    /// Try to escape. A failed attempt gives the enemy a free round.
    pub fn flee(
        &mut self,
        player: &mut Player,
        companion: Option<&Companion>,
        rng: &mut Lcg,
        flavor: &mut StdRng,
        config: &EngineConfig,
    ) -> Exchange {
        if rng.chance(config.flee_chance) {
            info!(enemy = %self.enemy.name, "fled combat");
            return Exchange {
                combat_lines: vec!["You successfully fled!".to_string()],
                outcome: Some(CombatOutcome::Fled),
                ..Exchange::default()
            };
        }

        let mut exchange = self.attack(player, companion, rng, flavor, config);
        exchange
            .combat_lines
            .insert(0, "Failed to flee!".to_string());
        exchange
    }
}

impl CombatState {
    /// Enter combat. Returns the opening lines.
    pub fn engage(&mut self, enemy: &Enemy) -> Vec<String> {
        let (encounter, lines) = Encounter::begin(enemy);
        *self = CombatState::Active(encounter);
        lines
    }

    pub fn is_active(&self) -> bool {
        matches!(self, CombatState::Active(_))
    }

    pub fn encounter(&self) -> Option<&Encounter> {
        match self {
            CombatState::Active(encounter) => Some(encounter),
            _ => None,
        }
    }

    pub fn outcome(&self) -> Option<CombatOutcome> {
        match self {
            CombatState::Resolved(outcome) => Some(*outcome),
            _ => None,
        }
    }

    /// Run an attack round. `None` when no fight is active.
    pub fn attack(
        &mut self,
        player: &mut Player,
        companion: Option<&Companion>,
        rng: &mut Lcg,
        flavor: &mut StdRng,
        config: &EngineConfig,
    ) -> Option<Exchange> {
        let CombatState::Active(encounter) = self else {
            return None;
        };
        let exchange = encounter.attack(player, companion, rng, flavor, config);
        self.settle(&exchange);
        Some(exchange)
    }

    /// Attempt to flee. `None` when no fight is active.
    pub fn flee(
        &mut self,
        player: &mut Player,
        companion: Option<&Companion>,
        rng: &mut Lcg,
        flavor: &mut StdRng,
        config: &EngineConfig,
    ) -> Option<Exchange> {
        let CombatState::Active(encounter) = self else {
            return None;
        };
        let exchange = encounter.flee(player, companion, rng, flavor, config);
        self.settle(&exchange);
        Some(exchange)
    }

    fn settle(&mut self, exchange: &Exchange) {
        if let Some(outcome) = exchange.outcome {
            *self = CombatState::Resolved(outcome);
        }
    }
}
