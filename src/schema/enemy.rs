use serde::{Deserialize, Serialize};

/// A combat opponent template. Encounters copy it and track their own health.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Enemy {
    pub name: String,
    pub health: i32,
    pub max_health: i32,
    /// Centre of the counterattack damage range.
    pub damage: i32,
    pub description: String,
    #[serde(default)]
    pub attack_messages: Vec<String>,
    /// Cosmetic only.
    #[serde(default)]
    pub eldritch: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enemy_from_ron_defaults_optional_fields() {
        let enemy: Enemy = ron::from_str(
            r#"(
                name: "Code Worm",
                health: 35,
                max_health: 35,
                damage: 18,
                description: "A writhing mass of corrupted code segments.",
            )"#,
        )
        .unwrap();
        assert_eq!(enemy.name, "Code Worm");
        assert!(enemy.attack_messages.is_empty());
        assert!(!enemy.eldritch);
    }
}
