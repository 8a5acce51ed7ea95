//! WASM bindings for storynode-engine — powers the browser player.
//!
//! The engine never reads the wall clock here; every entry point takes
//! the host's `Date.now()` so the JS side stays the single source of
//! time and playback is reproducible from a recorded input log.

use wasm_bindgen::prelude::*;

use storynode_engine::core::engine::GameEngine;
use storynode_engine::core::timing::ManualClock;
use storynode_engine::schema::condition::Condition;
use storynode_engine::schema::node::StoryNode;
use storynode_engine::schema::project::StoryProject;

// ---------------------------------------------------------------------------
// JSON helper types for communication across the WASM boundary
// ---------------------------------------------------------------------------
#[derive(serde::Serialize)]
struct ChoiceView {
    index: usize,
    id: String,
    text: String,
    enabled: bool,
}

#[derive(serde::Serialize)]
struct NodeView<'a> {
    id: &'a str,
    #[serde(rename = "type")]
    kind: &'static str,
    text: Option<&'a str>,
    speaker: Option<&'a str>,
    choices: Vec<ChoiceView>,
}

// ---------------------------------------------------------------------------
// StoryPlayer — the main exported struct
// ---------------------------------------------------------------------------
#[wasm_bindgen]
pub struct StoryPlayer {
    engine: GameEngine,
    clock: ManualClock,
}

#[wasm_bindgen]
impl StoryPlayer {
    /// Create a player from a story project JSON string.
    #[wasm_bindgen(constructor)]
    pub fn new(project_json: &str, now_ms: u64) -> Result<StoryPlayer, JsError> {
        let project: StoryProject = serde_json::from_str(project_json)
            .map_err(|e| JsError::new(&format!("Invalid project JSON: {e}")))?;
        let clock = ManualClock::new(now_ms);
        let engine = GameEngine::builder(project).clock(clock.clone()).build();
        Ok(StoryPlayer { engine, clock })
    }

    /// Begin play. Empty stage/chapter ids mean "the first one".
    pub fn start(
        &mut self,
        stage_id: &str,
        chapter_id: &str,
        now_ms: u64,
    ) -> Result<(), JsError> {
        self.clock.set(now_ms);
        let stage = (!stage_id.is_empty()).then_some(stage_id);
        let chapter = (!chapter_id.is_empty()).then_some(chapter_id);
        self.engine
            .start(stage, chapter)
            .map_err(|e| JsError::new(&e.to_string()))
    }

    pub fn advance(&mut self, now_ms: u64) {
        self.clock.set(now_ms);
        self.engine.advance();
    }

    pub fn select_choice(&mut self, index: usize, now_ms: u64) {
        self.clock.set(now_ms);
        self.engine.select_choice(index);
    }

    /// Fire the pending image-effect auto-advance if due. Returns true
    /// when the story moved; the host should re-render then.
    pub fn tick(&mut self, now_ms: u64) -> bool {
        self.clock.set(now_ms);
        self.engine.tick()
    }

    /// The deadline of the pending auto-advance in epoch ms, or
    /// `undefined` when nothing is scheduled.
    pub fn next_deadline(&self) -> Option<u64> {
        self.engine.pending_auto_advance().map(|p| p.fires_at)
    }

    pub fn restart(&mut self, now_ms: u64) -> Result<(), JsError> {
        self.clock.set(now_ms);
        self.engine.restart().map_err(|e| JsError::new(&e.to_string()))
    }

    /// Serialize the full game state for a save slot.
    pub fn save(&self, now_ms: u64) -> Result<String, JsError> {
        self.clock.set(now_ms);
        self.engine.save().map_err(|e| JsError::new(&e.to_string()))
    }

    /// Restore a save produced by `save`. The current state survives a
    /// failed load.
    pub fn load(&mut self, data: &str, now_ms: u64) -> Result<(), JsError> {
        self.clock.set(now_ms);
        self.engine.load(data).map_err(|e| JsError::new(&e.to_string()))
    }

    /// The full game state as JSON (variables, history, active images).
    pub fn state_json(&self) -> Result<String, JsError> {
        serde_json::to_string(self.engine.state())
            .map_err(|e| JsError::new(&format!("Serialization error: {e}")))
    }

    /// A render-ready view of the current node as JSON, with each
    /// choice's guard already evaluated. Returns `"null"` when no node
    /// is active.
    pub fn current_node_json(&self) -> Result<String, JsError> {
        let Some(node) = self.engine.current_node() else {
            return Ok("null".to_string());
        };

        let choices = match node {
            StoryNode::Choice { choices, .. } => choices
                .iter()
                .enumerate()
                .map(|(index, c)| ChoiceView {
                    index,
                    id: c.id.clone(),
                    text: c.text.clone(),
                    enabled: c
                        .condition
                        .as_ref()
                        .map_or(true, |cond| self.engine.check_condition(cond)),
                })
                .collect(),
            _ => Vec::new(),
        };

        let view = NodeView {
            id: node.id(),
            kind: node.kind().as_str(),
            text: node.text(),
            speaker: node.speaker(),
            choices,
        };
        serde_json::to_string(&view)
            .map_err(|e| JsError::new(&format!("Serialization error: {e}")))
    }

    /// Evaluate a condition JSON object against the live variables.
    pub fn check_condition(&self, condition_json: &str) -> Result<bool, JsError> {
        let condition: Condition = serde_json::from_str(condition_json)
            .map_err(|e| JsError::new(&format!("Invalid condition JSON: {e}")))?;
        Ok(self.engine.check_condition(&condition))
    }
}
