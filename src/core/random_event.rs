/// Weighted random-event selection for choices.

use tracing::debug;

use crate::core::rng::Lcg;
use crate::schema::player::Player;
use crate::schema::scene::{Choice, RandomEvent};

/// Where a choice leads after its random events, and which event fired.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution<'a> {
    pub destination: &'a str,
    pub event: Option<&'a RandomEvent>,
}

pub fn total_weight(events: &[RandomEvent]) -> u64 {
    events.iter().map(|e| u64::from(e.weight)).sum()
}

/// Walk the buckets in list order and return the first event whose
/// cumulative weight reaches `draw`. `draw` is 1-based.
pub fn select(events: &[RandomEvent], draw: u64) -> Option<&RandomEvent> {
    let mut remaining = draw as i64;
    for event in events {
        remaining -= i64::from(event.weight);
        if remaining <= 0 {
            return Some(event);
        }
    }
    None
}

/// Resolve a choice's destination. Draws from `rng` only when the choice
/// carries events with a positive total weight.
pub fn resolve<'a>(choice: &'a Choice, rng: &mut Lcg) -> Resolution<'a> {
    let fallback = Resolution {
        destination: choice.next_scene.as_str(),
        event: None,
    };
    let total = total_weight(&choice.random_events);
    if total == 0 {
        return fallback;
    }

    let max = i32::try_from(total).unwrap_or(i32::MAX);
    let draw = rng.range(1, max) as u64;
    match select(&choice.random_events, draw) {
        Some(event) => {
            debug!(draw, total, message = %event.message, "random event fired");
            Resolution {
                destination: event.next_scene.as_deref().unwrap_or(&choice.next_scene),
                event: Some(event),
            }
        }
        None => fallback,
    }
}

/// Apply an event's extra sanity penalty, clamped.
pub fn apply_sanity_damage(event: &RandomEvent, player: &mut Player) {
    if let Some(damage) = event.sanity_damage {
        player.set_sanity(player.sanity.saturating_sub(damage));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(weight: u32, message: &str, next_scene: Option<&str>) -> RandomEvent {
        RandomEvent {
            weight,
            message: message.to_string(),
            next_scene: next_scene.map(str::to_string),
            sanity_damage: None,
        }
    }

    #[test]
    fn bucket_boundaries() {
        let events = vec![event(10, "first", None), event(90, "second", None)];
        assert_eq!(select(&events, 5).unwrap().message, "first");
        assert_eq!(select(&events, 10).unwrap().message, "first");
        assert_eq!(select(&events, 11).unwrap().message, "second");
        assert_eq!(select(&events, 95).unwrap().message, "second");
        assert_eq!(select(&events, 100).unwrap().message, "second");
        assert!(select(&events, 101).is_none());
    }

    #[test]
    fn no_events_keeps_destination_and_rng() {
        let choice = Choice::new("Walk", "corridor");
        let mut rng = Lcg::new(17);
        let resolution = resolve(&choice, &mut rng);
        assert_eq!(resolution.destination, "corridor");
        assert!(resolution.event.is_none());
        assert_eq!(rng.state(), 17);
    }

    #[test]
    fn zero_total_weight_falls_back() {
        let mut choice = Choice::new("Walk", "corridor");
        choice.random_events = vec![event(0, "never", Some("elsewhere"))];
        let mut rng = Lcg::new(17);
        let resolution = resolve(&choice, &mut rng);
        assert_eq!(resolution.destination, "corridor");
        assert!(resolution.event.is_none());
    }

    #[test]
    fn override_destination_or_fallback() {
        let mut choice = Choice::new("Reach for the hamster", "hamster_fight");
        choice.random_events = vec![
            event(10, "You touch him!", Some("hamster_surprised")),
            event(90, "Your hand passes through him.", None),
        ];
        // Seed 0 draws 22 out of 100.
        let mut rng = Lcg::new(0);
        let resolution = resolve(&choice, &mut rng);
        assert_eq!(resolution.destination, "hamster_fight");
        assert_eq!(
            resolution.event.map(|e| e.message.as_str()),
            Some("Your hand passes through him.")
        );

        let mut surprised = 0;
        for seed in 0..1000 {
            let mut rng = Lcg::new(seed);
            if resolve(&choice, &mut rng).destination == "hamster_surprised" {
                surprised += 1;
            }
        }
        assert!((50..150).contains(&surprised), "surprised = {surprised}");
    }

    #[test]
    fn sanity_damage_is_clamped() {
        let mut player = Player::default();
        player.sanity = 4;
        let mut shock = event(1, "The screen screams.", None);
        shock.sanity_damage = Some(10);
        apply_sanity_damage(&shock, &mut player);
        assert_eq!(player.sanity, 0);
    }
}
