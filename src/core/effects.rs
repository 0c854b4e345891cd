/// Effect application: turns a choice's effects into the next player and
/// companion state plus the log lines and companion cues they produce.

use tracing::warn;

use crate::core::config::EngineConfig;
use crate::core::log::LogLine;
use crate::schema::companion::{Companion, CompanionCue};
use crate::schema::player::{Player, SECRETS_FLAG};
use crate::schema::scene::{Choice, Effect};

/// The result of applying one choice. Inputs are never modified.
#[derive(Debug, Clone, PartialEq)]
pub struct EffectOutcome {
    pub player: Player,
    pub companion: Option<Companion>,
    pub lines: Vec<LogLine>,
    pub cues: Vec<CompanionCue>,
}

pub fn apply(
    choice: &Choice,
    player: &Player,
    companion: Option<&Companion>,
    config: &EngineConfig,
) -> EffectOutcome {
    let mut outcome = EffectOutcome {
        player: player.clone(),
        companion: companion.cloned(),
        lines: Vec::new(),
        cues: Vec::new(),
    };

    for effect in &choice.effects {
        apply_one(effect, &mut outcome, config);
    }

    outcome
}

fn apply_one(effect: &Effect, outcome: &mut EffectOutcome, config: &EngineConfig) {
    let player = &mut outcome.player;
    match effect {
        Effect::AddItems(items) => {
            for item in items {
                player.inventory.push(item.clone());
                outcome.lines.push(LogLine::plain(format!("Acquired: {}", item)));
            }
        }
        Effect::RemoveItems(items) => {
            player.inventory.retain(|held| !items.contains(held));
        }
        Effect::SetFlags(flags) => {
            let secrets_before = player.counter(SECRETS_FLAG);
            for (name, value) in flags {
                match player.flags.get_mut(name) {
                    Some(slot) => *slot = value.clone(),
                    None => warn!(flag = %name, "ignoring assignment to unknown flag"),
                }
            }
            if player.counter(SECRETS_FLAG) > secrets_before {
                outcome.cues.push(CompanionCue::SecretFound);
            }
        }
        Effect::Health(0) | Effect::Sanity(0) | Effect::Corruption(0) | Effect::Loyalty(0) => {}
        Effect::Health(delta) => {
            player.set_health(player.health.saturating_add(*delta));
            if *delta < 0 {
                outcome
                    .lines
                    .push(LogLine::plain(format!("Took {} damage!", delta.unsigned_abs())));
                if player.health < config.low_health_cue {
                    outcome.cues.push(CompanionCue::LowHealth);
                }
            } else {
                outcome.lines.push(LogLine::plain(format!("Healed {} health!", delta)));
            }
        }
        Effect::Sanity(delta) => {
            player.set_sanity(player.sanity.saturating_add(*delta));
            if *delta < 0 {
                outcome
                    .lines
                    .push(LogLine::plain(format!("Lost {} sanity!", delta.unsigned_abs())));
                if player.sanity > 0 && player.sanity < config.low_sanity_warning {
                    outcome
                        .lines
                        .push(LogLine::narrator(config.low_sanity_line.clone()));
                }
            } else {
                outcome.lines.push(LogLine::plain(format!("Gained {} sanity!", delta)));
            }
        }
        Effect::Corruption(delta) => {
            player.set_corruption(player.corruption.saturating_add(*delta));
            if *delta > 0 {
                outcome
                    .lines
                    .push(LogLine::plain(format!("Gained {} corruption!", delta)));
                if player.corruption > config.corruption_warning {
                    outcome
                        .lines
                        .push(LogLine::narrator(config.corruption_line.clone()));
                }
            }
        }
        Effect::Loyalty(delta) => {
            if let Some(companion) = outcome.companion.as_mut() {
                companion.adjust_loyalty(*delta);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::rng::Lcg;
    use crate::schema::companion::{Ability, CompanionTemplate};
    use crate::schema::player::FlagValue;
    use std::collections::BTreeMap;

    fn with_effects(effects: Vec<Effect>) -> Choice {
        let mut choice = Choice::new("Touch the screen", "somewhere");
        choice.effects = effects;
        choice
    }

    fn whisper() -> Companion {
        CompanionTemplate {
            id: "whisper".to_string(),
            default_name: "Whisper".to_string(),
            species: "Ghost Mouse".to_string(),
            personality: "Melancholic".to_string(),
            loyalty: 95,
            corruption: 0,
            ability: Ability::RevealPaths,
            backstory: String::new(),
            current_thought: String::new(),
        }
        .instantiate(None)
    }

    fn rendered(outcome: &EffectOutcome) -> Vec<String> {
        outcome
            .lines
            .iter()
            .map(|line| line.render(Some("Sanguinar")))
            .collect()
    }

    #[test]
    fn inventory_add_then_remove() {
        let choice = with_effects(vec![
            Effect::AddItems(vec!["Blood Gem".to_string(), "Blood Gem".to_string()]),
            Effect::RemoveItems(vec!["Old Key".to_string()]),
        ]);
        let mut player = Player::default();
        player.inventory = vec!["Old Key".to_string(), "Lantern".to_string(), "Old Key".to_string()];

        let outcome = apply(&choice, &player, None, &EngineConfig::default());
        assert_eq!(
            outcome.player.inventory,
            vec!["Lantern", "Blood Gem", "Blood Gem"]
        );
        assert_eq!(
            rendered(&outcome),
            vec!["Acquired: Blood Gem", "Acquired: Blood Gem"]
        );
        assert_eq!(player.inventory.len(), 3, "input untouched");
    }

    #[test]
    fn set_flags_assigns_known_flags_only() {
        let mut flags = BTreeMap::new();
        flags.insert("doomCounter".to_string(), FlagValue::Int(5));
        flags.insert("inventedFlag".to_string(), FlagValue::Bool(true));
        let choice = with_effects(vec![Effect::SetFlags(flags)]);

        let mut player = Player::default();
        player.flags.insert("doomCounter".to_string(), FlagValue::Int(2));
        let outcome = apply(&choice, &player, None, &EngineConfig::default());
        assert_eq!(outcome.player.flag("doomCounter"), Some(&FlagValue::Int(5)));
        assert!(outcome.player.flag("inventedFlag").is_none());
    }

    #[test]
    fn health_logs_and_clamps() {
        let config = EngineConfig::default();
        let player = Player::default();

        let hurt = apply(&with_effects(vec![Effect::Health(-120)]), &player, None, &config);
        assert_eq!(hurt.player.health, 0);
        assert_eq!(rendered(&hurt), vec!["Took 120 damage!"]);

        let healed = apply(&with_effects(vec![Effect::Health(15)]), &player, None, &config);
        assert_eq!(healed.player.health, 100);
        assert_eq!(rendered(&healed), vec!["Healed 15 health!"]);
    }

    #[test]
    fn sanity_warning_between_zero_and_threshold() {
        let config = EngineConfig::default();
        let mut player = Player::default();
        player.sanity = 35;

        let outcome = apply(&with_effects(vec![Effect::Sanity(-10)]), &player, None, &config);
        assert_eq!(outcome.player.sanity, 25);
        assert_eq!(
            rendered(&outcome),
            vec![
                "Lost 10 sanity!",
                "\"You hear whispers in the static...\" - Sanguinar"
            ]
        );

        let emptied = apply(&with_effects(vec![Effect::Sanity(-50)]), &player, None, &config);
        assert_eq!(emptied.player.sanity, 0);
        assert_eq!(rendered(&emptied), vec!["Lost 50 sanity!"]);
    }

    #[test]
    fn corruption_warning_above_threshold() {
        let config = EngineConfig::default();
        let mut player = Player::default();
        player.corruption = 45;

        let outcome = apply(&with_effects(vec![Effect::Corruption(10)]), &player, None, &config);
        assert_eq!(outcome.player.corruption, 55);
        assert_eq!(
            rendered(&outcome),
            vec![
                "Gained 10 corruption!",
                "\"The corruption spreads through your veins...\" - Sanguinar"
            ]
        );

        let cleansed = apply(&with_effects(vec![Effect::Corruption(-80)]), &player, None, &config);
        assert_eq!(cleansed.player.corruption, 0);
        assert!(cleansed.lines.is_empty());
    }

    #[test]
    fn zero_deltas_are_silent() {
        let choice = with_effects(vec![
            Effect::Health(0),
            Effect::Sanity(0),
            Effect::Corruption(0),
        ]);
        let outcome = apply(&choice, &Player::default(), None, &EngineConfig::default());
        assert!(outcome.lines.is_empty());
        assert_eq!(outcome.player, Player::default());
    }

    #[test]
    fn loyalty_only_with_active_companion() {
        let choice = with_effects(vec![Effect::Loyalty(20)]);
        let config = EngineConfig::default();

        let alone = apply(&choice, &Player::default(), None, &config);
        assert!(alone.companion.is_none());

        let companion = whisper();
        let together = apply(&choice, &Player::default(), Some(&companion), &config);
        assert_eq!(together.companion.map(|c| c.loyalty), Some(100));
        assert_eq!(companion.loyalty, 95);
    }

    #[test]
    fn cues_for_secrets_and_low_health() {
        let mut flags = BTreeMap::new();
        flags.insert(SECRETS_FLAG.to_string(), FlagValue::Int(1));
        let choice = with_effects(vec![Effect::SetFlags(flags), Effect::Health(-80)]);
        let outcome = apply(&choice, &Player::default(), None, &EngineConfig::default());
        assert_eq!(
            outcome.cues,
            vec![CompanionCue::SecretFound, CompanionCue::LowHealth]
        );
    }

    #[test]
    fn ranges_hold_over_random_effect_sequences() {
        let config = EngineConfig::default();
        for seed in 0..200 {
            let mut rng = Lcg::new(seed);
            let mut player = Player::default();
            let mut companion = Some(whisper());
            for _ in 0..50 {
                let choice = with_effects(vec![
                    Effect::Health(rng.range(-60, 60)),
                    Effect::Sanity(rng.range(-60, 60)),
                    Effect::Corruption(rng.range(-60, 60)),
                    Effect::Loyalty(rng.range(-60, 60)),
                ]);
                let outcome = apply(&choice, &player, companion.as_ref(), &config);
                player = outcome.player;
                companion = outcome.companion;

                assert!((0..=player.max_health).contains(&player.health));
                assert!((0..=player.max_sanity).contains(&player.sanity));
                assert!((0..=100).contains(&player.corruption));
                let c = companion.as_ref().unwrap();
                assert!((0..=100).contains(&c.loyalty));
                assert!((0..=100).contains(&c.corruption));
            }
        }
    }

    #[test]
    fn extreme_deltas_saturate() {
        let config = EngineConfig::default();
        let companion = whisper();
        let choice = with_effects(vec![
            Effect::Health(i32::MIN),
            Effect::Sanity(i32::MIN),
            Effect::Corruption(i32::MAX),
            Effect::Loyalty(i32::MAX),
        ]);
        let outcome = apply(&choice, &Player::default(), Some(&companion), &config);
        assert_eq!(outcome.player.health, 0);
        assert_eq!(outcome.player.sanity, 0);
        assert_eq!(outcome.player.corruption, 100);
        assert_eq!(outcome.companion.as_ref().map(|c| c.loyalty), Some(100));
        assert_eq!(rendered(&outcome)[0], "Took 2147483648 damage!");
        assert_eq!(rendered(&outcome)[1], "Lost 2147483648 sanity!");
    }
}
