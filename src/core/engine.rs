/// The game engine — the state machine that walks the story graph.
///
/// Owns the story document (read-only) and the mutable `GameState`,
/// dispatches node-entry side effects through the evaluators, and
/// notifies the presentation shell through optional hooks. All methods
/// are synchronous; the only self-advance is the image-effect timer,
/// polled by the host via `tick`.
use thiserror::Error;
use tracing::{debug, error, warn};

use crate::core::{condition, effects, history};
use crate::core::images::ImageLayers;
use crate::core::timing::{AutoAdvance, Clock, SystemClock};
use crate::schema::condition::Condition;
use crate::schema::node::{NodeKind, StoryNode};
use crate::schema::project::{Chapter, Stage, StoryProject};
use crate::schema::state::{GameState, GameVariables, HistoryEntry};

/// Bound on transparent-node chains, so a cyclic document stops with a
/// logged warning instead of unwinding the stack.
const MAX_CHAIN_DEPTH: u32 = 256;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EngineError {
    #[error("stage not found: {requested:?}")]
    StageNotFound { requested: Option<String> },
    #[error("chapter not found: {requested:?}")]
    ChapterNotFound { requested: Option<String> },
    #[error("node not found: {0}")]
    NodeNotFound(String),
    #[error("malformed save data: {0}")]
    MalformedSave(String),
}

type StateHook = Box<dyn FnMut(&GameState)>;
type NodeHook = Box<dyn FnMut(Option<&StoryNode>)>;
type EndHook = Box<dyn FnMut()>;

#[derive(Default)]
struct EngineHooks {
    on_state_change: Option<StateHook>,
    on_node_change: Option<NodeHook>,
    on_game_end: Option<EndHook>,
}

/// Builder for a `GameEngine`. All hooks are optional; the engine runs
/// headless without them.
pub struct GameEngineBuilder {
    project: StoryProject,
    hooks: EngineHooks,
    clock: Box<dyn Clock>,
}

impl GameEngineBuilder {
    /// Called after every state mutation with the settled state.
    pub fn on_state_change(mut self, hook: impl FnMut(&GameState) + 'static) -> Self {
        self.hooks.on_state_change = Some(Box::new(hook));
        self
    }

    /// Called whenever the current node changes. Transparent nodes are
    /// never observed here; only where a chain settles.
    pub fn on_node_change(mut self, hook: impl FnMut(Option<&StoryNode>) + 'static) -> Self {
        self.hooks.on_node_change = Some(Box::new(hook));
        self
    }

    /// Called once per arrival at a `chapter_end` node, when the player
    /// advances on it.
    pub fn on_game_end(mut self, hook: impl FnMut() + 'static) -> Self {
        self.hooks.on_game_end = Some(Box::new(hook));
        self
    }

    /// Replace the wall clock (for tests and headless hosts).
    pub fn clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn build(self) -> GameEngine {
        let now = self.clock.now_ms();
        GameEngine {
            state: GameEngine::initial_state(&self.project, now),
            project: self.project,
            images: ImageLayers::new(),
            pending: None,
            hooks: self.hooks,
            clock: self.clock,
            ended_reported: false,
        }
    }
}

pub struct GameEngine {
    project: StoryProject,
    state: GameState,
    images: ImageLayers,
    pending: Option<AutoAdvance>,
    hooks: EngineHooks,
    clock: Box<dyn Clock>,
    ended_reported: bool,
}

impl GameEngine {
    pub fn builder(project: StoryProject) -> GameEngineBuilder {
        GameEngineBuilder {
            project,
            hooks: EngineHooks::default(),
            clock: Box::new(SystemClock),
        }
    }

    /// Convenience constructor with no hooks and the system clock.
    pub fn new(project: StoryProject) -> Self {
        Self::builder(project).build()
    }

    fn initial_state(project: &StoryProject, now: u64) -> GameState {
        let seed = project.variables.clone().unwrap_or_default();
        GameState {
            variables: GameVariables {
                gold: seed.gold.unwrap_or(0).max(0),
                hp: seed.hp.unwrap_or(100).max(0),
                flags: seed.flags,
                ..Default::default()
            },
            started_at: now,
            ..Default::default()
        }
    }

    /// Begin play at a stage/chapter (by id, or the first of each).
    ///
    /// Resets the game state to a fresh seeded snapshot. On a
    /// resolution failure the reset still happens but no node becomes
    /// current, and the failure is returned for the caller to observe.
    pub fn start(
        &mut self,
        stage_id: Option<&str>,
        chapter_id: Option<&str>,
    ) -> Result<(), EngineError> {
        self.pending = None;
        self.ended_reported = false;
        let now = self.clock.now_ms();

        let stage = match stage_id {
            Some(id) => self.project.stage(id),
            None => self.project.stages.first(),
        };
        let Some(stage) = stage else {
            error!(requested = ?stage_id, "no stage to start");
            self.state = Self::initial_state(&self.project, now);
            self.notify();
            return Err(EngineError::StageNotFound {
                requested: stage_id.map(str::to_string),
            });
        };

        let chapter = match chapter_id {
            Some(id) => stage.chapter(id),
            None => stage.chapters.first(),
        };
        let Some(chapter) = chapter else {
            error!(stage = %stage.id, requested = ?chapter_id, "no chapter to start");
            self.state = Self::initial_state(&self.project, now);
            self.notify();
            return Err(EngineError::ChapterNotFound {
                requested: chapter_id.map(str::to_string),
            });
        };

        let stage_id = stage.id.clone();
        let chapter_id = chapter.id.clone();
        let entry = chapter.entry_node_id().map(str::to_string);

        self.state = Self::initial_state(&self.project, now);
        self.state.current_stage_id = stage_id;
        self.state.current_chapter_id = chapter_id;

        if let Some(entry) = entry {
            self.state.current_node_id = entry.clone();
            match self.lookup_node(&entry).cloned() {
                Some(node) => self.process_node_entry(&node, 0),
                None => error!(node = %entry, "entry node not found in chapter"),
            }
        }

        self.notify();
        Ok(())
    }

    /// Restart the current stage/chapter from scratch: variables,
    /// history, and images are all reinitialized.
    pub fn restart(&mut self) -> Result<(), EngineError> {
        // Empty ids (nothing started yet) fall back to the first
        // stage/chapter rather than failing a lookup on "".
        let stage = self.state.current_stage_id.clone();
        let chapter = self.state.current_chapter_id.clone();
        self.start(
            (!stage.is_empty()).then_some(stage.as_str()),
            (!chapter.is_empty()).then_some(chapter.as_str()),
        )
    }

    /// Player input: continue past the current node.
    ///
    /// No-op when there is no current node or the node is a choice
    /// (choices go through `select_choice`). On `chapter_end`, fires
    /// the game-end hook instead of moving.
    pub fn advance(&mut self) {
        self.pending = None;
        let Some(node) = self.current_node().cloned() else {
            return;
        };

        match node.kind() {
            NodeKind::Choice => return,
            NodeKind::ChapterEnd => {
                if !self.ended_reported {
                    self.ended_reported = true;
                    if let Some(hook) = self.hooks.on_game_end.as_mut() {
                        hook();
                    }
                }
                return;
            }
            _ => {}
        }

        if let Some(next) = node.next_node_id().map(str::to_string) {
            self.go_to_node(&next, 0);
            self.notify();
        }
    }

    /// Player input: pick a choice by index on the current choice node.
    ///
    /// Silently ignored when the current node is not a choice, the
    /// index is out of range, or the choice's guard condition fails —
    /// the shell pre-filters disabled choices; this is verification,
    /// not an error path.
    pub fn select_choice(&mut self, index: usize) {
        let Some(node) = self.current_node().cloned() else {
            return;
        };
        let StoryNode::Choice { choices, .. } = &node else {
            return;
        };
        let Some(choice) = choices.get(index) else {
            debug!(index, node = %node.id(), "choice index out of range");
            return;
        };
        if let Some(guard) = &choice.condition {
            if !condition::evaluate(&self.state.variables, guard) {
                debug!(choice = %choice.id, "guard condition failed, ignoring selection");
                return;
            }
        }

        self.pending = None;
        let now = self.clock.now_ms();
        self.state.variables.choices_made.push(choice.id.clone());
        history::record_choice(&mut self.state.history, &node, &choice.text, now);
        if let Some(bundle) = &choice.effects {
            effects::apply(&mut self.state.variables, bundle);
        }
        if let Some(target) = choice.target().map(str::to_string) {
            self.go_to_node(&target, 0);
        }
        self.notify();
    }

    /// Fire the pending image-effect auto-advance if its deadline has
    /// passed. Returns whether anything fired. Hosts with a frame loop
    /// call this every frame; others can schedule a single wakeup from
    /// `pending_auto_advance`.
    pub fn tick(&mut self) -> bool {
        let now = self.clock.now_ms();
        if !self.pending.as_ref().is_some_and(|p| p.is_due(now)) {
            return false;
        }
        let Some(fired) = self.pending.take() else {
            return false;
        };
        self.go_to_node(&fired.target, 0);
        self.notify();
        true
    }

    /// Serialize the full game state, with play time extended by the
    /// elapsed session time.
    pub fn save(&self) -> Result<String, EngineError> {
        let mut snapshot = self.state.clone();
        let now = self.clock.now_ms();
        snapshot.play_time += now.saturating_sub(snapshot.started_at);
        serde_json::to_string(&snapshot).map_err(|e| EngineError::MalformedSave(e.to_string()))
    }

    /// Restore a previously saved state. The session start timestamp is
    /// reset to now; play time resumes rather than crediting the gap.
    /// On a parse failure the current state is left untouched.
    pub fn load(&mut self, data: &str) -> Result<(), EngineError> {
        let loaded: GameState = serde_json::from_str(data).map_err(|e| {
            error!(error = %e, "failed to load save data");
            EngineError::MalformedSave(e.to_string())
        })?;

        self.pending = None;
        self.ended_reported = false;
        self.state = loaded;
        self.state.started_at = self.clock.now_ms();
        self.images.resync(&self.state.active_images);
        self.notify();
        Ok(())
    }

    // -- node-entry processing ------------------------------------------

    fn go_to_node(&mut self, node_id: &str, depth: u32) {
        if depth > MAX_CHAIN_DEPTH {
            warn!(node = %node_id, "node chain exceeded depth limit, stopping (cycle?)");
            return;
        }
        let Some(node) = self.lookup_node(node_id).cloned() else {
            error!(node = %node_id, "node not found");
            return;
        };
        self.state.current_node_id = node_id.to_string();
        self.ended_reported = false;
        self.process_node_entry(&node, depth);
    }

    /// Dispatch on node type, once per node visited. Transparent nodes
    /// chain onward immediately; visible nodes settle and get recorded.
    fn process_node_entry(&mut self, node: &StoryNode, depth: u32) {
        if let Some(bundle) = node.on_enter_effects() {
            effects::apply(&mut self.state.variables, bundle);
        }

        match node {
            StoryNode::Variable {
                variable_operations,
                ..
            } => {
                for op in variable_operations {
                    effects::execute(&mut self.state.variables, op);
                }
                if let Some(next) = node.next_node_id().map(str::to_string) {
                    self.go_to_node(&next, depth + 1);
                }
            }
            StoryNode::Condition {
                condition_branches,
                default_next_node_id,
                ..
            } => {
                // First matching branch wins, even if its target is
                // empty (a dead end); the default only applies when no
                // branch matches.
                let matched = condition_branches
                    .iter()
                    .find(|b| condition::evaluate(&self.state.variables, &b.condition));
                let target = match matched {
                    Some(branch) => branch.target(),
                    None => default_next_node_id
                        .as_deref()
                        .filter(|id| !id.is_empty()),
                };
                if let Some(target) = target.map(str::to_string) {
                    self.go_to_node(&target, depth + 1);
                }
            }
            StoryNode::Image { image_data, .. } => {
                let now = self.clock.now_ms();
                if let Some(data) = image_data {
                    self.images
                        .apply_directive(&mut self.state.active_images, node.id(), data);
                    history::record_image(&mut self.state.history, node.id(), data, now);

                    if !data.active_effects().is_empty() && data.effect_duration > 0 {
                        if let Some(next) = node.next_node_id() {
                            self.pending = Some(AutoAdvance {
                                target: next.to_string(),
                                fires_at: now + data.effect_duration,
                            });
                            return;
                        }
                    }
                }
                if let Some(next) = node.next_node_id().map(str::to_string) {
                    self.go_to_node(&next, depth + 1);
                }
            }
            StoryNode::Start { .. }
            | StoryNode::Dialogue { .. }
            | StoryNode::Choice { .. }
            | StoryNode::ChapterEnd { .. }
            | StoryNode::Unknown { .. } => {
                let now = self.clock.now_ms();
                history::record_visible(&mut self.state.history, node, now);
            }
        }
    }

    // -- lookups and accessors ------------------------------------------

    pub fn project(&self) -> &StoryProject {
        &self.project
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn variables(&self) -> &GameVariables {
        &self.state.variables
    }

    pub fn history(&self) -> &[HistoryEntry] {
        &self.state.history
    }

    pub fn current_stage(&self) -> Option<&Stage> {
        self.project.stage(&self.state.current_stage_id)
    }

    pub fn current_chapter(&self) -> Option<&Chapter> {
        self.current_stage()?.chapter(&self.state.current_chapter_id)
    }

    pub fn current_node(&self) -> Option<&StoryNode> {
        lookup_current(&self.project, &self.state)
    }

    /// Evaluate a condition against the live variables. Shells use this
    /// to render disabled choices.
    pub fn check_condition(&self, condition: &Condition) -> bool {
        condition::evaluate(&self.state.variables, condition)
    }

    /// The scheduled auto-advance, if an image effect is holding the
    /// screen. Hosts without a frame loop can schedule a wakeup for its
    /// deadline and then call `tick`.
    pub fn pending_auto_advance(&self) -> Option<&AutoAdvance> {
        self.pending.as_ref()
    }

    fn lookup_node(&self, id: &str) -> Option<&StoryNode> {
        self.current_chapter()?.node(id)
    }

    fn notify(&mut self) {
        if let Some(hook) = self.hooks.on_state_change.as_mut() {
            hook(&self.state);
        }
        let node = lookup_current(&self.project, &self.state);
        if let Some(hook) = self.hooks.on_node_change.as_mut() {
            hook(node);
        }
    }
}

fn lookup_current<'a>(project: &'a StoryProject, state: &GameState) -> Option<&'a StoryNode> {
    if state.current_node_id.is_empty() {
        return None;
    }
    project
        .stage(&state.current_stage_id)?
        .chapter(&state.current_chapter_id)?
        .node(&state.current_node_id)
}
