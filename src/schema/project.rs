/// The story document model: project → stages → chapters → nodes.
///
/// Assembled by an external persistence layer (single file or
/// fragment-per-chapter, the engine does not care) and read-only for
/// the engine's entire lifetime.
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use super::condition::Scalar;
use super::node::{NodeKind, StoryNode};

/// Game-wide presentation settings. The engine passes these through
/// untouched; only the shell interprets them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_theme_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_game_mode: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

/// Seed values for a fresh game state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectVariables {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gold: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hp: Option<i64>,
    #[serde(default, skip_serializing_if = "FxHashMap::is_empty")]
    pub flags: FxHashMap<String, Scalar>,
}

/// A single playable story graph with one entry point.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chapter {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Explicit entry node. May be empty; the engine then falls back to
    /// the first `start`-typed node, then the first node in order.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_node_id: Option<String>,
    #[serde(default)]
    pub nodes: Vec<StoryNode>,
}

impl Chapter {
    /// Look up a node by id within this chapter.
    pub fn node(&self, id: &str) -> Option<&StoryNode> {
        self.nodes.iter().find(|n| n.id() == id)
    }

    /// Resolve the entry node id: explicit `start_node_id` if non-empty,
    /// else the first `start` node, else the first node in declaration
    /// order. The fallback chain tolerates documents the authoring tool
    /// should have rejected.
    pub fn entry_node_id(&self) -> Option<&str> {
        if let Some(id) = self.start_node_id.as_deref() {
            if !id.is_empty() {
                return Some(id);
            }
        }
        self.nodes
            .iter()
            .find(|n| n.kind() == NodeKind::Start)
            .or_else(|| self.nodes.first())
            .map(|n| n.id())
    }
}

/// A top-level save/resume unit containing an ordered list of chapters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stage {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub chapters: Vec<Chapter>,
}

impl Stage {
    pub fn chapter(&self, id: &str) -> Option<&Chapter> {
        self.chapters.iter().find(|c| c.id == id)
    }
}

/// A complete authored story document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoryProject {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub stages: Vec<Stage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub game_settings: Option<GameSettings>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variables: Option<ProjectVariables>,
}

impl StoryProject {
    pub fn stage(&self, id: &str) -> Option<&Stage> {
        self.stages.iter().find(|s| s.id == id)
    }
}
