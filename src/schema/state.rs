/// Serializable game state — the unit of save/load.
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use super::condition::Scalar;
use super::node::{Alignment, ImageEffect, ImageLayer, NodeKind};

/// The persistent variable set mutated as the story plays.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameVariables {
    #[serde(default)]
    pub gold: i64,
    #[serde(default)]
    pub hp: i64,
    #[serde(default)]
    pub flags: FxHashMap<String, Scalar>,
    #[serde(default)]
    pub affection: FxHashMap<String, i64>,
    #[serde(default)]
    pub reputation: FxHashMap<String, i64>,
    /// Ordered, append-only ids of selected choices. Duplicates are
    /// permitted; choices can recur across branches.
    #[serde(default)]
    pub choices_made: Vec<String>,
}

impl Default for GameVariables {
    fn default() -> Self {
        Self {
            gold: 0,
            hp: 100,
            flags: FxHashMap::default(),
            affection: FxHashMap::default(),
            reputation: FxHashMap::default(),
            choices_made: Vec::new(),
        }
    }
}

impl GameVariables {
    pub fn affection_for(&self, character_id: &str) -> i64 {
        self.affection.get(character_id).copied().unwrap_or(0)
    }

    pub fn reputation_for(&self, faction_id: &str) -> i64 {
        self.reputation.get(faction_id).copied().unwrap_or(0)
    }
}

/// Image metadata attached to `image`-kind history entries, so
/// scrollback can reflect what was on screen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryImage {
    pub resource_path: String,
    pub layer: ImageLayer,
    pub is_removal: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub effects: Vec<ImageEffect>,
    #[serde(default)]
    pub effect_duration: u64,
}

/// One replay/scrollback log entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub node_id: String,
    #[serde(rename = "type")]
    pub kind: NodeKind,
    #[serde(default)]
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speaker: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub choice_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_data: Option<HistoryImage>,
    /// Epoch milliseconds.
    pub timestamp: u64,
}

/// A currently displayed image occupying a unique (layer, layer_order)
/// slot. `instance_id` increments on every insertion so re-entering a
/// slot with the same resource still re-triggers enter animations; the
/// counter is the discriminator, not the resource path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveImage {
    /// Id of the image node that produced this entry.
    pub id: String,
    pub instance_id: u64,
    pub resource_path: String,
    pub layer: ImageLayer,
    #[serde(default)]
    pub layer_order: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alignment: Option<Alignment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
    #[serde(default)]
    pub flip_horizontal: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub effects: Vec<ImageEffect>,
    #[serde(default)]
    pub effect_duration: u64,
}

/// The engine's full mutable working state. Created fresh on `start`,
/// mutated in place by every engine method, serialized whole on save.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameState {
    #[serde(default)]
    pub current_node_id: String,
    #[serde(default)]
    pub current_stage_id: String,
    #[serde(default)]
    pub current_chapter_id: String,
    #[serde(default)]
    pub variables: GameVariables,
    #[serde(default)]
    pub history: Vec<HistoryEntry>,
    #[serde(default)]
    pub active_images: Vec<ActiveImage>,
    /// Epoch milliseconds at session start; reset by `load`.
    #[serde(default)]
    pub started_at: u64,
    /// Accumulated play time in milliseconds across sessions.
    #[serde(default)]
    pub play_time: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_variables_match_project_defaults() {
        let vars = GameVariables::default();
        assert_eq!(vars.gold, 0);
        assert_eq!(vars.hp, 100);
        assert!(vars.flags.is_empty());
        assert!(vars.choices_made.is_empty());
    }

    #[test]
    fn absent_ids_read_as_zero() {
        let vars = GameVariables::default();
        assert_eq!(vars.affection_for("mira"), 0);
        assert_eq!(vars.reputation_for("guild"), 0);
    }

    #[test]
    fn state_round_trips_through_json() {
        let mut state = GameState {
            current_node_id: "n3".to_string(),
            current_stage_id: "s1".to_string(),
            current_chapter_id: "c1".to_string(),
            started_at: 1_700_000_000_000,
            play_time: 42_000,
            ..Default::default()
        };
        state.variables.gold = 75;
        state.variables.choices_made.push("c-left".to_string());

        let json = serde_json::to_string(&state).unwrap();
        let back: GameState = serde_json::from_str(&json).unwrap();
        assert_eq!(back, state);
    }

    #[test]
    fn load_tolerates_unknown_save_fields() {
        let json = r#"{
            "currentNodeId": "n1",
            "currentStageId": "s1",
            "currentChapterId": "c1",
            "variables": {"gold": 5, "hp": 90, "futureStat": 3},
            "history": [],
            "activeImages": [],
            "startedAt": 1,
            "playTime": 2,
            "saveSlotLabel": "autosave"
        }"#;
        let state: GameState = serde_json::from_str(json).unwrap();
        assert_eq!(state.variables.gold, 5);
        assert_eq!(state.variables.hp, 90);
    }

    #[test]
    fn history_entry_kind_serializes_as_type() {
        let entry = HistoryEntry {
            node_id: "n1".to_string(),
            kind: NodeKind::Dialogue,
            content: "Hello.".to_string(),
            speaker: Some("Mira".to_string()),
            choice_text: None,
            image_data: None,
            timestamp: 9,
        };
        let json = serde_json::to_string(&entry).unwrap();
        assert!(json.contains(r#""type":"dialogue""#));
    }
}
