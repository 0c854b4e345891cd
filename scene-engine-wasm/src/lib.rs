//! WASM bindings for scene-engine: powers the browser build of DOOM.EXE.

use std::sync::Arc;
use std::time::Duration;
use wasm_bindgen::prelude::*;

use scene_engine::core::config::EngineConfig;
use scene_engine::core::content::{ContentError, ContentSet, PackSources};
use scene_engine::core::persistence::{MemorySink, SaveSink};
use scene_engine::core::session::GameSession;

// ---------------------------------------------------------------------------
// Embedded content pack: compiled into the WASM binary
// ---------------------------------------------------------------------------
mod data {
    pub const ENGINE: &str = include_str!("../../content/doom_exe/engine.ron");
    pub const SCENES: &str = include_str!("../../content/doom_exe/scenes.ron");
    pub const ENEMIES: &str = include_str!("../../content/doom_exe/enemies.ron");
    pub const ENDINGS: &str = include_str!("../../content/doom_exe/endings.ron");
    pub const COMPANIONS: &str = include_str!("../../content/doom_exe/companions.ron");
    pub const DIALOGUE: &str = include_str!("../../content/doom_exe/dialogue.ron");
}

// ---------------------------------------------------------------------------
// JSON helper types for communication across the WASM boundary
// ---------------------------------------------------------------------------
#[derive(serde::Serialize)]
struct ChoiceInfo {
    text: String,
    available: bool,
}

#[derive(serde::Serialize)]
struct PlayerInfo {
    health: i32,
    max_health: i32,
    sanity: i32,
    max_sanity: i32,
    corruption: i32,
    weapon: String,
    inventory: Vec<String>,
}

#[derive(serde::Serialize)]
struct EnemyInfo {
    name: String,
    description: String,
    health: i32,
    max_health: i32,
}

#[derive(serde::Serialize)]
struct CompanionInfo {
    id: String,
    name: String,
    species: String,
    loyalty: i32,
    current_thought: String,
}

#[derive(serde::Serialize)]
struct EndingInfo {
    title: String,
    description: String,
    unlock_message: Option<String>,
}

#[derive(serde::Serialize)]
struct SessionView {
    scene_id: String,
    title: String,
    text: Vec<String>,
    ambient_sound: Option<String>,
    corruption_level: Option<u32>,
    choices: Vec<ChoiceInfo>,
    player: PlayerInfo,
    enemy: Option<EnemyInfo>,
    combat_log: Vec<String>,
    companion: Option<CompanionInfo>,
    log: Vec<String>,
    pending_advance_ms: Option<u64>,
    ending: Option<EndingInfo>,
    seed: String,
}

fn js_err(context: &str, err: impl std::fmt::Display) -> JsError {
    JsError::new(&format!("{context}: {err}"))
}

fn load_pack() -> Result<(ContentSet, EngineConfig), ContentError> {
    let config = EngineConfig::parse_ron(data::ENGINE)?;
    let content = ContentSet::parse_pack(&PackSources {
        scenes: data::SCENES,
        enemies: data::ENEMIES,
        endings: data::ENDINGS,
        companions: data::COMPANIONS,
        dialogue: data::DIALOGUE,
    })?;
    Ok((content, config))
}

// ---------------------------------------------------------------------------
// WasmSession: the main exported struct
// ---------------------------------------------------------------------------
#[wasm_bindgen]
pub struct WasmSession {
    session: GameSession,
}

#[wasm_bindgen]
impl WasmSession {
    /// Start a new game with the given seed.
    #[wasm_bindgen(constructor)]
    pub fn new(seed: u64) -> Result<WasmSession, JsError> {
        let (content, config) = load_pack().map_err(|e| js_err("Content error", e))?;
        let session = GameSession::builder()
            .with_shared_content(Arc::new(content))
            .with_config(config)
            .seed(seed)
            .build()
            .map_err(|e| js_err("Session build error", e))?;
        Ok(WasmSession { session })
    }

    /// Take choice `index` (0-based). Returns the updated view.
    pub fn advance(&mut self, index: usize) -> Result<String, JsError> {
        self.session
            .advance(index)
            .map_err(|e| js_err("Advance failed", e))?;
        self.view()
    }

    pub fn attack(&mut self) -> Result<String, JsError> {
        self.session
            .attack()
            .map_err(|e| js_err("Attack failed", e))?;
        self.view()
    }

    pub fn flee(&mut self) -> Result<String, JsError> {
        self.session.flee().map_err(|e| js_err("Flee failed", e))?;
        self.view()
    }

    /// Recruit companion `id`, optionally renaming it.
    pub fn recruit(&mut self, id: &str, name: Option<String>) -> Result<String, JsError> {
        self.session
            .recruit_companion(id, name.as_deref())
            .map_err(|e| js_err("Recruit failed", e))?;
        self.view()
    }

    /// Advance the clock by `ms` milliseconds. The host calls this from its
    /// frame loop so the post-victory advance fires on schedule.
    pub fn tick(&mut self, ms: u32) -> Result<String, JsError> {
        self.session
            .tick(Duration::from_millis(u64::from(ms)))
            .map_err(|e| js_err("Tick failed", e))?;
        self.view()
    }

    /// Start over with the same seed.
    pub fn reset(&mut self) -> Result<String, JsError> {
        self.session.reset();
        self.view()
    }

    /// Serialize the session for the host to keep in local storage.
    pub fn save_blob(&mut self) -> Result<String, JsError> {
        let mut sink = MemorySink::new();
        self.session
            .save(&mut sink)
            .map_err(|e| js_err("Save failed", e))?;
        sink.blob()
            .map(str::to_string)
            .ok_or_else(|| JsError::new("Save failed: empty blob"))
    }

    /// Restore a blob produced by `save_blob`. Returns false for an empty
    /// blob.
    pub fn load_blob(&mut self, blob: &str) -> Result<bool, JsError> {
        let mut sink = MemorySink::new();
        if !blob.is_empty() {
            sink.save(blob).map_err(|e| js_err("Load failed", e))?;
        }
        self.session
            .load(&sink)
            .map_err(|e| js_err("Load failed", e))
    }

    /// Return a JSON snapshot of everything the page renders.
    pub fn view(&self) -> Result<String, JsError> {
        let session = &self.session;
        let scene = session.scene();
        let player = session.player();

        let view = SessionView {
            scene_id: session.scene_id().to_string(),
            title: scene.map(|s| s.title.clone()).unwrap_or_default(),
            text: scene.map(|s| s.text.clone()).unwrap_or_default(),
            ambient_sound: scene.and_then(|s| s.ambient_sound.clone()),
            corruption_level: scene.and_then(|s| s.corruption_level),
            choices: session
                .choices()
                .into_iter()
                .map(|(choice, available)| ChoiceInfo {
                    text: choice.text.clone(),
                    available,
                })
                .collect(),
            player: PlayerInfo {
                health: player.health,
                max_health: player.max_health,
                sanity: player.sanity,
                max_sanity: player.max_sanity,
                corruption: player.corruption,
                weapon: player.weapon.clone(),
                inventory: player.inventory.clone(),
            },
            enemy: session.combat().encounter().map(|e| EnemyInfo {
                name: e.enemy.name.clone(),
                description: e.enemy.description.clone(),
                health: e.enemy_health,
                max_health: e.enemy.max_health,
            }),
            combat_log: session.combat_log().to_vec(),
            companion: session.companion().map(|c| CompanionInfo {
                id: c.id.clone(),
                name: c.name.clone(),
                species: c.species.clone(),
                loyalty: c.loyalty,
                current_thought: c.current_thought.clone(),
            }),
            log: session.log().lines().map(str::to_string).collect(),
            pending_advance_ms: session.pending_advance().map(|p| p.remaining_ms),
            ending: session.ending().map(|e| EndingInfo {
                title: e.title.clone(),
                description: e.description.clone(),
                unlock_message: e.unlock_message.clone(),
            }),
            // JSON numbers lose precision above 2^53.
            seed: session.seed().to_string(),
        };
        serde_json::to_string(&view).map_err(|e| js_err("Serialization error", e))
    }

    /// Return JSON array of recruitable companion ids.
    pub fn companions(&self) -> String {
        let mut ids: Vec<&str> = self
            .session
            .content()
            .companions
            .keys()
            .map(String::as_str)
            .collect();
        ids.sort_unstable();
        serde_json::to_string(&ids).unwrap_or_else(|_| "[]".to_string())
    }
}
