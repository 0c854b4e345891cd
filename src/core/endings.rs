/// Ending matching, run after every state change.

use crate::core::config::EngineConfig;
use crate::schema::ending::{Ending, Requirement};
use crate::schema::player::Player;

pub fn requirement_met(requirement: &Requirement, player: &Player) -> bool {
    match requirement {
        Requirement::Flag(name, expected) => player.flag(name) == Some(expected),
        Requirement::AtLeast(field, minimum) => player.field(*field) >= *minimum,
    }
}

/// True when the ending has requirements and all of them hold. An ending
/// with no requirements is never reached by matching.
pub fn meets_all(ending: &Ending, player: &Player) -> bool {
    !ending.requirements.is_empty()
        && ending
            .requirements
            .iter()
            .all(|requirement| requirement_met(requirement, player))
}

/// Find the ending the player has reached, if any.
///
/// At zero sanity only the void ending can fire, and only when corruption
/// is at or above the configured threshold. Otherwise nothing fires at all,
/// so a player at zero sanity with low corruption keeps playing.
pub fn match_ending<'a>(
    player: &Player,
    endings: &'a [Ending],
    config: &EngineConfig,
) -> Option<&'a Ending> {
    if player.sanity <= 0 {
        if player.corruption >= config.void_corruption_threshold {
            return endings.iter().find(|e| e.id == config.void_ending);
        }
        return None;
    }

    endings
        .iter()
        .filter(|e| e.id != config.void_ending)
        .find(|e| meets_all(e, player))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ending::EndingType;
    use crate::schema::player::{FlagValue, PlayerField};

    fn ending(id: &str, requirements: Vec<Requirement>) -> Ending {
        Ending {
            id: id.to_string(),
            title: id.to_uppercase(),
            description: format!("{id} description"),
            kind: EndingType::Damnation,
            requirements,
            unlock_message: None,
        }
    }

    fn table() -> Vec<Ending> {
        vec![
            ending(
                "the_ascension",
                vec![
                    Requirement::Flag("doomCounter".to_string(), FlagValue::Int(6)),
                    Requirement::Flag("hasEldritchTome".to_string(), FlagValue::Bool(true)),
                ],
            ),
            ending(
                "the_void",
                vec![Requirement::AtLeast(PlayerField::Sanity, 0)],
            ),
            ending(
                "the_corruption",
                vec![Requirement::AtLeast(PlayerField::Corruption, 75)],
            ),
            ending(
                "the_eternal",
                vec![Requirement::AtLeast(PlayerField::Corruption, 50)],
            ),
            ending("the_unwritten", Vec::new()),
        ]
    }

    #[test]
    fn fresh_player_reaches_nothing() {
        let player = Player::default();
        assert!(match_ending(&player, &table(), &EngineConfig::default()).is_none());
    }

    #[test]
    fn zero_sanity_low_corruption_is_a_softlock() {
        let mut player = Player::default();
        player.sanity = 0;
        player.corruption = 40;
        assert!(match_ending(&player, &table(), &EngineConfig::default()).is_none());
    }

    #[test]
    fn zero_sanity_high_corruption_reaches_void() {
        let mut player = Player::default();
        player.sanity = 0;
        player.corruption = 60;
        let endings = table();
        let reached = match_ending(&player, &endings, &EngineConfig::default()).unwrap();
        assert_eq!(reached.id, "the_void");
    }

    #[test]
    fn zero_sanity_blocks_other_endings() {
        let mut player = Player::default();
        player.sanity = 0;
        player.corruption = 59;
        // Would satisfy the_eternal at positive sanity.
        assert!(match_ending(&player, &table(), &EngineConfig::default()).is_none());
    }

    #[test]
    fn void_never_matches_through_the_table() {
        let player = Player::default();
        let only_void = vec![ending(
            "the_void",
            vec![Requirement::AtLeast(PlayerField::Sanity, 0)],
        )];
        assert!(match_ending(&player, &only_void, &EngineConfig::default()).is_none());
    }

    #[test]
    fn flags_must_match_exactly() {
        let mut player = Player::default();
        player.flags.insert("doomCounter".to_string(), FlagValue::Int(7));
        player.flags.insert("hasEldritchTome".to_string(), FlagValue::Bool(true));
        assert!(match_ending(&player, &table(), &EngineConfig::default()).is_none());

        player.flags.insert("doomCounter".to_string(), FlagValue::Int(6));
        let endings = table();
        let reached = match_ending(&player, &endings, &EngineConfig::default()).unwrap();
        assert_eq!(reached.id, "the_ascension");
    }

    #[test]
    fn table_order_breaks_ties() {
        let mut player = Player::default();
        player.corruption = 80;
        let endings = table();
        let reached = match_ending(&player, &endings, &EngineConfig::default()).unwrap();
        assert_eq!(reached.id, "the_corruption");

        player.corruption = 60;
        let endings = table();
        let reached = match_ending(&player, &endings, &EngineConfig::default()).unwrap();
        assert_eq!(reached.id, "the_eternal");
    }

    #[test]
    fn empty_requirements_never_match() {
        assert!(!meets_all(&ending("the_unwritten", Vec::new()), &Player::default()));
    }
}
