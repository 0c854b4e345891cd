/// Companion dialogue lookup: turns cues into spoken lines.

use rand::seq::SliceRandom;
use rand::Rng;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::core::content::ContentError;
use crate::schema::companion::CompanionCue;

/// Lines per companion id, per cue.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DialogueTable {
    lines: FxHashMap<String, FxHashMap<CompanionCue, Vec<String>>>,
}

impl DialogueTable {
    pub fn load_from_ron(path: &Path) -> Result<DialogueTable, ContentError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse_ron(&contents)
    }

    pub fn parse_ron(input: &str) -> Result<DialogueTable, ContentError> {
        let lines: FxHashMap<String, FxHashMap<CompanionCue, Vec<String>>> =
            ron::from_str(input)?;
        Ok(DialogueTable { lines })
    }

    pub fn lines_for(&self, companion_id: &str, cue: CompanionCue) -> &[String] {
        self.lines
            .get(companion_id)
            .and_then(|cues| cues.get(&cue))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Pick one line, or `None` when the companion has nothing to say.
    pub fn pick<R: Rng + ?Sized>(
        &self,
        companion_id: &str,
        cue: CompanionCue,
        rng: &mut R,
    ) -> Option<&str> {
        self.lines_for(companion_id, cue)
            .choose(rng)
            .map(String::as_str)
    }

    pub fn companions(&self) -> impl Iterator<Item = &str> {
        self.lines.keys().map(String::as_str)
    }

    /// Entries from `other` replace entries with the same companion and cue.
    pub fn merge(&mut self, other: DialogueTable) {
        for (companion, cues) in other.lines {
            let entry = self.lines.entry(companion).or_default();
            for (cue, lines) in cues {
                entry.insert(cue, lines);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    const TABLE: &str = r#"{
        "whisper": {
            CombatStart: ["\"The threads of fate grow taut...\"", "\"Be careful, my friend...\""],
            LowHealth: ["\"Your essence fades...\""],
        },
    }"#;

    #[test]
    fn parse_and_lookup() {
        let table = DialogueTable::parse_ron(TABLE).unwrap();
        assert_eq!(table.lines_for("whisper", CompanionCue::CombatStart).len(), 2);
        assert!(table.lines_for("whisper", CompanionCue::SecretFound).is_empty());
        assert!(table.lines_for("patch", CompanionCue::CombatStart).is_empty());
    }

    #[test]
    fn pick_is_deterministic_per_seed() {
        let table = DialogueTable::parse_ron(TABLE).unwrap();
        for seed in 0..50 {
            let a = table.pick("whisper", CompanionCue::CombatStart, &mut StdRng::seed_from_u64(seed));
            let b = table.pick("whisper", CompanionCue::CombatStart, &mut StdRng::seed_from_u64(seed));
            assert_eq!(a, b);
            assert!(a.is_some());
        }
    }

    #[test]
    fn pick_without_lines_is_none() {
        let table = DialogueTable::parse_ron(TABLE).unwrap();
        let mut rng = StdRng::seed_from_u64(1);
        assert!(table.pick("whisper", CompanionCue::ChoiceMade, &mut rng).is_none());
    }

    #[test]
    fn merge_overrides_per_cue() {
        let mut table = DialogueTable::parse_ron(TABLE).unwrap();
        let other = DialogueTable::parse_ron(
            r#"{ "whisper": { LowHealth: ["\"Hold on.\""] }, "patch": { CombatVictory: ["\"Threat neutralized.\""] } }"#,
        )
        .unwrap();
        table.merge(other);
        assert_eq!(table.lines_for("whisper", CompanionCue::LowHealth), ["\"Hold on.\""]);
        assert_eq!(table.lines_for("whisper", CompanionCue::CombatStart).len(), 2);
        assert_eq!(table.companions().count(), 2);
    }
}
