/// Player-facing narrative log: a bounded ring of rendered lines.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use crate::schema::companion::CompanionCue;

/// A line the engine wants shown to the player.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogLine {
    Plain(String),
    /// Spoken by the pack's narrator, rendered as a quote.
    Narrator(String),
}

impl LogLine {
    pub fn plain(text: impl Into<String>) -> Self {
        Self::Plain(text.into())
    }

    pub fn narrator(text: impl Into<String>) -> Self {
        Self::Narrator(text.into())
    }

    /// Render for display. Narrator lines without a named narrator fall back
    /// to plain text.
    pub fn render(&self, narrator: Option<&str>) -> String {
        match (self, narrator) {
            (Self::Plain(text), _) => text.clone(),
            (Self::Narrator(text), Some(name)) => format!("\"{}\" - {}", text, name),
            (Self::Narrator(text), None) => text.clone(),
        }
    }
}

/// One ordered entry for the narrative log: a line to show, or a cue for
/// the active companion to voice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Beat {
    Line(LogLine),
    Cue(CompanionCue),
}

/// Keeps the most recent `capacity` lines and drops an exact repeat of the
/// line immediately before it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NarrativeLog {
    lines: VecDeque<String>,
    capacity: usize,
}

impl NarrativeLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            lines: VecDeque::with_capacity(capacity),
            capacity: capacity.max(1),
        }
    }

    /// Append a line. Returns false when it was suppressed as a repeat.
    pub fn push(&mut self, line: impl Into<String>) -> bool {
        let line = line.into();
        if self.lines.back() == Some(&line) {
            return false;
        }
        while self.lines.len() >= self.capacity.max(1) {
            self.lines.pop_front();
        }
        self.lines.push_back(line);
        true
    }

    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().map(String::as_str)
    }

    pub fn last(&self) -> Option<&str> {
        self.lines.back().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_narrator_quote() {
        let line = LogLine::narrator("You hear whispers in the static...");
        assert_eq!(
            line.render(Some("Sanguinar")),
            "\"You hear whispers in the static...\" - Sanguinar"
        );
        assert_eq!(line.render(None), "You hear whispers in the static...");
        assert_eq!(LogLine::plain("Took 5 damage!").render(Some("Sanguinar")), "Took 5 damage!");
    }

    #[test]
    fn suppresses_immediate_repeat() {
        let mut log = NarrativeLog::new(31);
        assert!(log.push("Lost 5 sanity!"));
        assert!(!log.push("Lost 5 sanity!"));
        assert!(log.push("Took 3 damage!"));
        assert!(log.push("Lost 5 sanity!"));
        assert_eq!(log.len(), 3);
    }

    #[test]
    fn keeps_most_recent_lines() {
        let mut log = NarrativeLog::new(31);
        for i in 0..40 {
            log.push(format!("line {i}"));
        }
        assert_eq!(log.len(), 31);
        assert_eq!(log.lines().next(), Some("line 9"));
        assert_eq!(log.last(), Some("line 39"));
    }

    #[test]
    fn zero_capacity_keeps_one_line() {
        let mut log = NarrativeLog::new(0);
        log.push("a");
        log.push("b");
        assert_eq!(log.lines().collect::<Vec<_>>(), vec!["b"]);
    }

    #[test]
    fn restored_zero_capacity_log_still_accepts_lines() {
        let mut log: NarrativeLog =
            crate::core::persistence::decode("(lines: [\"old\"], capacity: 0)").unwrap();
        assert!(log.push("Game loaded."));
        assert!(log.push("next"));
        assert_eq!(log.lines().collect::<Vec<_>>(), vec!["next"]);
    }
}
