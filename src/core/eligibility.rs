/// Choice gating. Pure: nothing here touches the RNG or mutates the player.

use crate::schema::player::Player;
use crate::schema::scene::{Choice, Gate};

pub fn gate_passes(gate: &Gate, player: &Player) -> bool {
    match gate {
        Gate::Items(items) => items.iter().all(|item| player.has_item(item)),
        Gate::Flags(flags) => flags
            .iter()
            .all(|(name, expected)| player.flag(name) == Some(expected)),
        Gate::Stat { stat, threshold } => player.stat(*stat) >= *threshold,
    }
}

/// The first gate that fails, in evaluation order.
pub fn blocking_gate<'a>(choice: &'a Choice, player: &Player) -> Option<&'a Gate> {
    choice.gates.iter().find(|gate| !gate_passes(gate, player))
}

pub fn is_available(choice: &Choice, player: &Player) -> bool {
    blocking_gate(choice, player).is_none()
}
