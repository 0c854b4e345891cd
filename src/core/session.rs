/// The game session: one player walking one content pack.
///
/// Every mutating operation runs to completion before returning. A session
/// that has reached an ending is frozen until `reset` or `load`.

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::core::combat::{CombatOutcome, CombatState};
use crate::core::config::EngineConfig;
use crate::core::content::{ContentError, ContentSet};
use crate::core::effects;
use crate::core::eligibility;
use crate::core::endings;
use crate::core::log::{Beat, LogLine, NarrativeLog};
use crate::core::persistence::{self, PersistenceError, SaveSink};
use crate::core::random_event;
use crate::core::rng::Lcg;
use crate::schema::companion::{Companion, CompanionCue};
use crate::schema::ending::Ending;
use crate::schema::player::Player;
use crate::schema::scene::{Choice, Scene};

/// Shown to the player whenever an action is refused.
pub const REJECTED: &str = "You cannot make that choice!";

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("content error: {0}")]
    Content(#[from] ContentError),
    #[error("persistence error: {0}")]
    Persistence(#[from] PersistenceError),
    #[error("the session has ended")]
    SessionOver,
    #[error("combat is in progress")]
    CombatActive,
    #[error("no combat is in progress")]
    NoCombat,
    #[error("waiting for the post-victory advance")]
    AwaitingAdvance,
    #[error("choice {index} is out of range ({available} available)")]
    ChoiceOutOfRange { index: usize, available: usize },
    #[error("choice {0} is not available")]
    ChoiceUnavailable(usize),
    #[error("scene not found: {0}")]
    SceneNotFound(String),
    #[error("companion template not found: {0}")]
    CompanionNotFound(String),
    #[error("ending not found: {0}")]
    EndingNotFound(String),
}

/// An advance scheduled to fire after a combat victory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingAdvance {
    pub choice_index: usize,
    pub remaining_ms: u64,
}

/// Everything that changes during play. This is what a save contains.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionState {
    pub player: Player,
    pub current_scene: String,
    pub history: Vec<String>,
    pub log: NarrativeLog,
    pub rng_seed: u64,
    pub companions: Vec<Companion>,
    pub active_companion: Option<usize>,
    pub combat: CombatState,
    pub combat_log: Vec<String>,
    pub pending_advance: Option<PendingAdvance>,
    pub terminal: bool,
    pub ending: Option<String>,
}

impl SessionState {
    pub fn new(config: &EngineConfig, seed: u64) -> Self {
        let mut log = NarrativeLog::new(config.log_capacity);
        for line in &config.intro {
            log.push(line.clone());
        }
        Self {
            player: Player::default(),
            current_scene: config.start_scene.clone(),
            history: vec![config.start_scene.clone()],
            log,
            rng_seed: seed,
            companions: Vec::new(),
            active_companion: None,
            combat: CombatState::Idle,
            combat_log: Vec::new(),
            pending_advance: None,
            terminal: false,
            ending: None,
        }
    }

    pub fn companion(&self) -> Option<&Companion> {
        self.active_companion.and_then(|i| self.companions.get(i))
    }
}

/// Where a reset draws its seed from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeedSource {
    /// Every reset replays the same seed.
    Fixed(u64),
    /// Every reset draws a fresh seed.
    Entropy,
}

impl SeedSource {
    fn draw(&self) -> u64 {
        match self {
            SeedSource::Fixed(seed) => *seed,
            SeedSource::Entropy => rand::random(),
        }
    }
}

/// Result of a successful scene transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub scene: String,
    /// Message of the random event that fired, if any.
    pub event: Option<String>,
    pub ending: Option<String>,
    pub combat_started: bool,
}

/// Result of one attack or flee.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CombatTurn {
    pub dealt: i32,
    pub taken: i32,
    pub blocked: bool,
    pub outcome: Option<CombatOutcome>,
    pub ending: Option<String>,
    /// Set when the victory advance fired immediately.
    pub transition: Option<Transition>,
}

/// A running game. Built via `GameSession::builder()`.
pub struct GameSession {
    content: Arc<ContentSet>,
    config: EngineConfig,
    seed_source: SeedSource,
    state: SessionState,
}

/// Builder for constructing a `GameSession`.
pub struct GameSessionBuilder {
    content_dir: Option<PathBuf>,
    content: Option<Arc<ContentSet>>,
    config: Option<EngineConfig>,
    seed: Option<u64>,
}

impl GameSession {
    pub fn builder() -> GameSessionBuilder {
        GameSessionBuilder {
            content_dir: None,
            content: None,
            config: None,
            seed: None,
        }
    }

    // --- accessors ---

    pub fn scene(&self) -> Option<&Scene> {
        self.content.scene(&self.state.current_scene)
    }

    pub fn scene_id(&self) -> &str {
        &self.state.current_scene
    }

    pub fn player(&self) -> &Player {
        &self.state.player
    }

    pub fn companion(&self) -> Option<&Companion> {
        self.state.companion()
    }

    pub fn companions(&self) -> &[Companion] {
        &self.state.companions
    }

    pub fn combat(&self) -> &CombatState {
        &self.state.combat
    }

    pub fn is_combat_active(&self) -> bool {
        self.state.combat.is_active()
    }

    pub fn combat_log(&self) -> &[String] {
        &self.state.combat_log
    }

    pub fn log(&self) -> &NarrativeLog {
        &self.state.log
    }

    pub fn history(&self) -> &[String] {
        &self.state.history
    }

    pub fn ending(&self) -> Option<&Ending> {
        self.state
            .ending
            .as_deref()
            .and_then(|id| self.content.ending(id))
    }

    pub fn is_terminal(&self) -> bool {
        self.state.terminal
    }

    pub fn pending_advance(&self) -> Option<PendingAdvance> {
        self.state.pending_advance
    }

    pub fn seed(&self) -> u64 {
        self.state.rng_seed
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn content(&self) -> &ContentSet {
        &self.content
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Choices of the current scene with their availability.
    pub fn choices(&self) -> Vec<(&Choice, bool)> {
        self.scene()
            .map(|scene| {
                scene
                    .choices
                    .iter()
                    .map(|choice| (choice, eligibility::is_available(choice, &self.state.player)))
                    .collect()
            })
            .unwrap_or_default()
    }

    // --- operations ---

    /// Take choice `index` of the current scene.
    pub fn advance(&mut self, index: usize) -> Result<Transition, EngineError> {
        if self.state.terminal {
            return Err(EngineError::SessionOver);
        }
        if self.state.combat.is_active() {
            return Err(self.reject(EngineError::CombatActive));
        }
        if self.state.pending_advance.is_some() {
            return Err(self.reject(EngineError::AwaitingAdvance));
        }
        self.take_choice(index)
    }

    /// Attack the current enemy.
    pub fn attack(&mut self) -> Result<CombatTurn, EngineError> {
        self.combat_action(false)
    }

    /// Try to escape the current fight.
    pub fn flee(&mut self) -> Result<CombatTurn, EngineError> {
        self.combat_action(true)
    }

    /// Recruit a companion from its template, making it the active one.
    pub fn recruit_companion(
        &mut self,
        id: &str,
        name: Option<&str>,
    ) -> Result<&Companion, EngineError> {
        if self.state.terminal {
            return Err(EngineError::SessionOver);
        }
        if self.state.pending_advance.is_some() {
            return Err(self.reject(EngineError::AwaitingAdvance));
        }
        let Some(template) = self.content.companion(id) else {
            error!(companion = %id, "companion template not found");
            return Err(EngineError::CompanionNotFound(id.to_string()));
        };

        let companion = template.instantiate(name);
        info!(companion = %companion.id, name = %companion.name, "companion recruited");
        self.say(LogLine::plain(format!("{} has joined you!", companion.name)));
        self.say(LogLine::plain(format!(
            "\"{}\" - {}",
            companion.personality, companion.name
        )));

        for existing in &mut self.state.companions {
            existing.active = false;
        }
        self.state.companions.push(companion);
        let index = self.state.companions.len() - 1;
        self.state.active_companion = Some(index);
        Ok(&self.state.companions[index])
    }

    /// Let time pass. Fires a scheduled victory advance once its delay has
    /// elapsed.
    pub fn tick(&mut self, elapsed: Duration) -> Result<Option<Transition>, EngineError> {
        let Some(pending) = self.state.pending_advance.as_mut() else {
            return Ok(None);
        };
        let elapsed_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);
        pending.remaining_ms = pending.remaining_ms.saturating_sub(elapsed_ms);
        if pending.remaining_ms > 0 {
            return Ok(None);
        }

        let choice_index = pending.choice_index;
        self.state.pending_advance = None;
        debug!(choice_index, "victory advance firing");
        self.take_choice(choice_index).map(Some)
    }

    /// Start over with a default player at the start scene.
    pub fn reset(&mut self) {
        let seed = self.seed_source.draw();
        info!(seed, "session reset");
        self.state = fresh_state(&self.content, &self.config, seed);
    }

    /// Write the session to `sink`.
    pub fn save(&mut self, sink: &mut dyn SaveSink) -> Result<(), EngineError> {
        let result = persistence::encode(&self.state).and_then(|blob| sink.save(&blob));
        match result {
            Ok(()) => {
                info!(scene = %self.state.current_scene, "game saved");
                self.report("Game saved.");
                Ok(())
            }
            Err(err) => {
                warn!(%err, "save failed");
                self.report("Failed to save.");
                Err(err.into())
            }
        }
    }

    /// Replace the session with the one saved in `sink`. Returns false when
    /// the sink holds no save.
    pub fn load(&mut self, sink: &dyn SaveSink) -> Result<bool, EngineError> {
        let blob = match sink.load() {
            Ok(Some(blob)) => blob,
            Ok(None) => {
                self.report("No save found.");
                return Ok(false);
            }
            Err(err) => {
                warn!(%err, "reading save failed");
                self.report("Failed to load save.");
                return Err(err.into());
            }
        };

        let restored = persistence::decode::<SessionState>(&blob)
            .map_err(EngineError::from)
            .and_then(|state| self.check_restorable(state));
        match restored {
            Ok(state) => {
                info!(scene = %state.current_scene, seed = state.rng_seed, "game loaded");
                self.state = state;
                self.report("Game loaded.");
                Ok(true)
            }
            Err(err) => {
                warn!(%err, "save rejected");
                self.report("Failed to load save.");
                Err(err)
            }
        }
    }

    // --- internals ---

    fn check_restorable(&self, state: SessionState) -> Result<SessionState, EngineError> {
        if self.content.scene(&state.current_scene).is_none() {
            return Err(EngineError::SceneNotFound(state.current_scene));
        }
        match state.ending.as_deref() {
            Some(id) if self.content.ending(id).is_none() => {
                return Err(EngineError::EndingNotFound(id.to_string()));
            }
            None if state.terminal => {
                return Err(EngineError::EndingNotFound(String::new()));
            }
            _ => {}
        }
        if let Some(index) = state.active_companion {
            if index >= state.companions.len() {
                return Err(EngineError::CompanionNotFound(index.to_string()));
            }
        }
        Ok(state)
    }

    /// Status line for save and load. A finished run's log stays frozen.
    fn report(&mut self, text: &str) {
        if !self.state.terminal {
            self.say(LogLine::plain(text));
        }
    }

    fn say(&mut self, line: LogLine) {
        let rendered = line.render(self.config.narrator.as_deref());
        self.state.log.push(rendered);
    }

    fn reject(&mut self, err: EngineError) -> EngineError {
        warn!(%err, scene = %self.state.current_scene, "action rejected");
        self.say(LogLine::plain(REJECTED));
        err
    }

    /// Dialogue picks use their own generator so they never shift the
    /// mechanical draw sequence.
    fn flavor_rng(&self) -> StdRng {
        StdRng::seed_from_u64(self.state.rng_seed.wrapping_add(7919))
    }

    fn voice(&mut self, cue: CompanionCue, flavor: &mut StdRng) {
        let Some(companion) = self.state.companion() else {
            return;
        };
        let line = self
            .content
            .dialogue
            .pick(&companion.id, cue, flavor)
            .map(str::to_string);
        match line {
            Some(line) => self.say(LogLine::Plain(line)),
            None => debug!(cue = cue.name(), "companion has no line for cue"),
        }
    }

    fn play_beats(&mut self, beats: Vec<Beat>, flavor: &mut StdRng) {
        for beat in beats {
            match beat {
                Beat::Line(line) => self.say(line),
                Beat::Cue(cue) => self.voice(cue, flavor),
            }
        }
    }

    fn take_choice(&mut self, index: usize) -> Result<Transition, EngineError> {
        let content = Arc::clone(&self.content);
        let Some(scene) = content.scene(&self.state.current_scene) else {
            error!(scene = %self.state.current_scene, "current scene missing from content");
            return Err(EngineError::SceneNotFound(self.state.current_scene.clone()));
        };
        let Some(choice) = scene.choices.get(index) else {
            return Err(self.reject(EngineError::ChoiceOutOfRange {
                index,
                available: scene.choices.len(),
            }));
        };
        if !eligibility::is_available(choice, &self.state.player) {
            return Err(self.reject(EngineError::ChoiceUnavailable(index)));
        }

        let mut rng = Lcg::new(self.state.rng_seed);
        let mut flavor = self.flavor_rng();
        let outcome = effects::apply(choice, &self.state.player, self.state.companion(), &self.config);
        let resolution = random_event::resolve(choice, &mut rng);
        let Some(destination) = content.scene(resolution.destination) else {
            error!(
                from = %scene.id,
                to = %resolution.destination,
                "choice leads to a missing scene"
            );
            return Err(EngineError::SceneNotFound(resolution.destination.to_string()));
        };

        // Commit.
        let mut player = outcome.player;
        if let Some(event) = resolution.event {
            random_event::apply_sanity_damage(event, &mut player);
        }
        self.state.player = player;
        if let (Some(index), Some(updated)) = (self.state.active_companion, outcome.companion) {
            self.state.companions[index] = updated;
        }
        for line in outcome.lines {
            self.say(line);
        }
        if let Some(event) = resolution.event {
            self.say(LogLine::plain(format!("Random Event: {}", event.message)));
        }
        self.say(LogLine::plain(format!("> {}", choice.text)));
        self.voice(CompanionCue::ChoiceMade, &mut flavor);
        for cue in outcome.cues {
            self.voice(cue, &mut flavor);
        }

        self.state.rng_seed = self.state.rng_seed.wrapping_add(1);
        self.state.current_scene = destination.id.clone();
        self.state.history.push(destination.id.clone());
        debug!(from = %scene.id, to = %destination.id, seed = self.state.rng_seed, "advanced");

        let ending = self.check_endings();
        let mut combat_started = false;
        match &destination.enemy {
            Some(enemy) if !self.state.terminal => {
                info!(enemy = %enemy.name, scene = %destination.id, "combat started");
                self.state.combat_log = self.state.combat.engage(enemy);
                self.voice(CompanionCue::CombatStart, &mut flavor);
                combat_started = true;
            }
            _ => self.state.combat = CombatState::Idle,
        }

        Ok(Transition {
            scene: destination.id.clone(),
            event: resolution.event.map(|e| e.message.clone()),
            ending,
            combat_started,
        })
    }

    fn check_endings(&mut self) -> Option<String> {
        let content = Arc::clone(&self.content);
        let ending = endings::match_ending(&self.state.player, &content.endings, &self.config)?;
        info!(ending = %ending.id, "ending reached");
        self.state.terminal = true;
        self.state.ending = Some(ending.id.clone());
        self.state.pending_advance = None;
        self.say(LogLine::plain(format!("ENDING UNLOCKED: {}", ending.title)));
        self.say(LogLine::narrator(ending.description.clone()));
        Some(ending.id.clone())
    }

    fn combat_action(&mut self, flee: bool) -> Result<CombatTurn, EngineError> {
        if self.state.terminal {
            return Err(EngineError::SessionOver);
        }
        if self.state.pending_advance.is_some() {
            return Err(self.reject(EngineError::AwaitingAdvance));
        }
        if !self.state.combat.is_active() {
            return Err(self.reject(EngineError::NoCombat));
        }
        if flee && self.content.scene(&self.config.flee_scene).is_none() {
            error!(scene = %self.config.flee_scene, "flee scene missing from content");
            return Err(EngineError::SceneNotFound(self.config.flee_scene.clone()));
        }

        let mut rng = Lcg::new(self.state.rng_seed);
        let mut flavor = self.flavor_rng();
        let state = &mut self.state;
        let companion = state.active_companion.and_then(|i| state.companions.get(i));
        let attempt = if flee {
            state
                .combat
                .flee(&mut state.player, companion, &mut rng, &mut flavor, &self.config)
        } else {
            state
                .combat
                .attack(&mut state.player, companion, &mut rng, &mut flavor, &self.config)
        };
        let exchange = attempt.ok_or(EngineError::NoCombat)?;

        self.state.rng_seed = self.state.rng_seed.wrapping_add(1);
        self.state.combat_log.extend(exchange.combat_lines);
        self.play_beats(exchange.beats, &mut flavor);

        let mut turn = CombatTurn {
            dealt: exchange.dealt,
            taken: exchange.taken,
            blocked: exchange.blocked,
            outcome: exchange.outcome,
            ending: None,
            transition: None,
        };

        match exchange.outcome {
            Some(CombatOutcome::Victory) => {
                if self.config.victory_delay_ms == 0 {
                    turn.transition = Some(self.take_choice(0)?);
                    turn.ending = turn.transition.as_ref().and_then(|t| t.ending.clone());
                } else {
                    self.state.pending_advance = Some(PendingAdvance {
                        choice_index: 0,
                        remaining_ms: self.config.victory_delay_ms,
                    });
                }
            }
            Some(CombatOutcome::Defeat) => {
                let ending = self.config.defeat_ending.clone();
                info!(ending = %ending, "defeated in combat");
                self.state.terminal = true;
                self.state.ending = Some(ending.clone());
                turn.ending = Some(ending);
            }
            Some(CombatOutcome::Fled) => {
                let fallback = self.config.flee_scene.clone();
                self.state.current_scene = fallback.clone();
                self.state.history.push(fallback);
            }
            None => {}
        }

        Ok(turn)
    }
}

fn fresh_state(content: &ContentSet, config: &EngineConfig, seed: u64) -> SessionState {
    let mut state = SessionState::new(config, seed);
    if let Some(enemy) = content.scene(&config.start_scene).and_then(|s| s.enemy.as_ref()) {
        state.combat_log = state.combat.engage(enemy);
    }
    state
}

impl GameSessionBuilder {
    /// Load a content pack directory, including its `engine.ron` when no
    /// config is given explicitly.
    pub fn content_dir(mut self, path: impl AsRef<Path>) -> Self {
        self.content_dir = Some(path.as_ref().to_path_buf());
        self
    }

    /// Provide content directly (for testing without files).
    pub fn with_content(mut self, content: ContentSet) -> Self {
        self.content = Some(Arc::new(content));
        self
    }

    /// Share already loaded content between sessions.
    pub fn with_shared_content(mut self, content: Arc<ContentSet>) -> Self {
        self.content = Some(content);
        self
    }

    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Fix the seed. Without one, every session and reset draws fresh
    /// entropy.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn build(self) -> Result<GameSession, EngineError> {
        let mut config = self.config;
        let content = match (self.content, &self.content_dir) {
            (Some(content), None) => content,
            (provided, Some(dir)) => {
                let mut loaded = provided.map(|c| (*c).clone()).unwrap_or_default();
                loaded.merge(ContentSet::load_from_dir(dir)?);
                let engine_path = dir.join("engine.ron");
                if config.is_none() && engine_path.exists() {
                    config = Some(EngineConfig::load_from_ron(&engine_path)?);
                }
                Arc::new(loaded)
            }
            (None, None) => Arc::new(ContentSet::default()),
        };
        let config = config.unwrap_or_default();
        content.validate(&config)?;

        let seed_source = match self.seed {
            Some(seed) => SeedSource::Fixed(seed),
            None => SeedSource::Entropy,
        };
        let seed = seed_source.draw();
        debug!(seed, scenes = content.scenes.len(), "session built");
        let state = fresh_state(&content, &config, seed);

        Ok(GameSession {
            content,
            config,
            seed_source,
            state,
        })
    }
}
