/// Story graph nodes — the closed tagged union of narrative content.
///
/// The `type` discriminator strings match the authoring tool's output
/// (`start`, `dialogue`, `choice`, `condition`, `variable`, `image`,
/// `chapter_end`), so chapters exported by the editor deserialize
/// without translation.
use serde::{Deserialize, Serialize};

use super::condition::{Condition, Scalar};
use super::effects::Effects;

/// The node type discriminator, also recorded on history entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Start,
    Dialogue,
    Choice,
    Condition,
    Variable,
    Image,
    ChapterEnd,
    /// Catch-all for node types from a newer authoring tool.
    #[serde(other)]
    Unknown,
}

impl NodeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Dialogue => "dialogue",
            Self::Choice => "choice",
            Self::Condition => "condition",
            Self::Variable => "variable",
            Self::Image => "image",
            Self::ChapterEnd => "chapter_end",
            Self::Unknown => "unknown",
        }
    }

    /// Transparent kinds auto-resolve to another node and are never
    /// shown to the player or recorded to history.
    pub fn is_transparent(&self) -> bool {
        matches!(self, Self::Condition | Self::Variable)
    }
}

/// Fields shared by every node variant.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeBase {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_node_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_enter_effects: Option<Effects>,
}

/// One selectable option on a `choice` node. An empty or absent target
/// means the story stays on the choice node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Choice {
    pub id: String,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_node_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<Condition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effects: Option<Effects>,
}

impl Choice {
    pub fn target(&self) -> Option<&str> {
        self.next_node_id.as_deref().filter(|id| !id.is_empty())
    }
}

/// One arm of a `condition` node. Arms are evaluated in declaration
/// order; the first match wins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConditionBranch {
    pub condition: Condition,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_node_id: Option<String>,
}

impl ConditionBranch {
    pub fn target(&self) -> Option<&str> {
        self.next_node_id.as_deref().filter(|id| !id.is_empty())
    }
}

/// The slot a variable operation writes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VariableTarget {
    Gold,
    Hp,
    Flag,
    Affection,
    Reputation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VariableAction {
    Set,
    Add,
    Subtract,
    Multiply,
}

/// A typed arithmetic/assignment operation on a variable slot. The
/// selector key for the target (`key`, `character_id`, `faction_id`)
/// must be present for its slot kind; operations with a missing
/// selector are ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariableOperation {
    pub target: VariableTarget,
    pub action: VariableAction,
    pub value: Scalar,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub character_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub faction_id: Option<String>,
}

/// Display layer for an image directive. Used only for default
/// z-ordering in the shell; occupancy is keyed on (layer, layer_order).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageLayer {
    Background,
    Character,
}

impl Default for ImageLayer {
    fn default() -> Self {
        Self::Background
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Alignment {
    Left,
    Center,
    Right,
}

/// Enter-animation identifiers understood by the presentation shell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ImageEffect {
    None,
    FadeIn,
    Shake,
    SlideLeft,
    SlideRight,
    SlideUp,
    SlideDown,
    ZoomIn,
    ZoomOut,
    Bounce,
    Flash,
    Pulse,
    /// Catch-all for effect identifiers from a newer authoring tool.
    /// Still counts as an active effect so the hold-and-auto-advance
    /// behavior matches what the document author configured.
    #[serde(other)]
    Unknown,
}

/// The payload of an `image` node. An empty `resource_path` is a
/// removal directive for the (layer, layer_order) slot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageData {
    #[serde(default)]
    pub resource_path: String,
    #[serde(default)]
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
    /// Legacy single-effect field from older documents.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effect: Option<ImageEffect>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub effects: Vec<ImageEffect>,
    /// Shared duration for all configured effects, in milliseconds.
    #[serde(default)]
    pub effect_duration: u64,
}

impl ImageData {
    pub fn is_removal(&self) -> bool {
        self.resource_path.is_empty()
    }

    /// The effect list, with the legacy single-effect field folded in
    /// when the list is empty.
    pub fn active_effects(&self) -> Vec<ImageEffect> {
        if !self.effects.is_empty() {
            return self.effects.clone();
        }
        match self.effect {
            Some(e) if e != ImageEffect::None => vec![e],
            _ => Vec::new(),
        }
    }

    pub fn slot(&self) -> (ImageLayer, i64) {
        (self.layer, self.layer_order)
    }
}

/// A typed unit of narrative graph content.
///
/// Tags outside the known set deserialize to `Unknown` instead of
/// rejecting the whole document, and play as plain visible nodes; see
/// the manual `Deserialize` impl below.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StoryNode {
    Start {
        #[serde(flatten)]
        base: NodeBase,
    },
    Dialogue {
        #[serde(flatten)]
        base: NodeBase,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        speaker: Option<String>,
    },
    Choice {
        #[serde(flatten)]
        base: NodeBase,
        #[serde(default)]
        choices: Vec<Choice>,
    },
    #[serde(rename_all = "camelCase")]
    Condition {
        #[serde(flatten)]
        base: NodeBase,
        #[serde(default)]
        condition_branches: Vec<ConditionBranch>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        default_next_node_id: Option<String>,
    },
    #[serde(rename_all = "camelCase")]
    Variable {
        #[serde(flatten)]
        base: NodeBase,
        #[serde(default)]
        variable_operations: Vec<VariableOperation>,
    },
    #[serde(rename_all = "camelCase")]
    Image {
        #[serde(flatten)]
        base: NodeBase,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        image_data: Option<ImageData>,
    },
    ChapterEnd {
        #[serde(flatten)]
        base: NodeBase,
    },
    /// A node type this engine does not recognize. Its shared fields
    /// are kept and it plays as plain visible content.
    Unknown {
        #[serde(flatten)]
        base: NodeBase,
        /// The unrecognized `type` tag, for diagnostics.
        #[serde(skip)]
        tag: String,
    },
}

// Known tags delegate to the variant shapes; anything else keeps its
// `NodeBase` and becomes `Unknown`, so a document authored by a newer
// editor (javascript/custom nodes and the like) still loads whole.
impl<'de> Deserialize<'de> for StoryNode {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        use serde::de::Error;

        #[derive(Deserialize)]
        struct DialogueFields {
            #[serde(flatten)]
            base: NodeBase,
            #[serde(default)]
            speaker: Option<String>,
        }

        #[derive(Deserialize)]
        struct ChoiceFields {
            #[serde(flatten)]
            base: NodeBase,
            #[serde(default)]
            choices: Vec<Choice>,
        }

        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct ConditionFields {
            #[serde(flatten)]
            base: NodeBase,
            #[serde(default)]
            condition_branches: Vec<ConditionBranch>,
            #[serde(default)]
            default_next_node_id: Option<String>,
        }

        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct VariableFields {
            #[serde(flatten)]
            base: NodeBase,
            #[serde(default)]
            variable_operations: Vec<VariableOperation>,
        }

        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct ImageFields {
            #[serde(flatten)]
            base: NodeBase,
            #[serde(default)]
            image_data: Option<ImageData>,
        }

        fn fields<T, E>(value: serde_json::Value) -> Result<T, E>
        where
            T: serde::de::DeserializeOwned,
            E: Error,
        {
            serde_json::from_value(value).map_err(E::custom)
        }

        let value = serde_json::Value::deserialize(deserializer)?;
        let tag = value
            .get("type")
            .and_then(serde_json::Value::as_str)
            .ok_or_else(|| D::Error::custom("missing node type"))?
            .to_string();

        Ok(match tag.as_str() {
            "start" => StoryNode::Start {
                base: fields(value)?,
            },
            "dialogue" => {
                let f: DialogueFields = fields(value)?;
                StoryNode::Dialogue {
                    base: f.base,
                    speaker: f.speaker,
                }
            }
            "choice" => {
                let f: ChoiceFields = fields(value)?;
                StoryNode::Choice {
                    base: f.base,
                    choices: f.choices,
                }
            }
            "condition" => {
                let f: ConditionFields = fields(value)?;
                StoryNode::Condition {
                    base: f.base,
                    condition_branches: f.condition_branches,
                    default_next_node_id: f.default_next_node_id,
                }
            }
            "variable" => {
                let f: VariableFields = fields(value)?;
                StoryNode::Variable {
                    base: f.base,
                    variable_operations: f.variable_operations,
                }
            }
            "image" => {
                let f: ImageFields = fields(value)?;
                StoryNode::Image {
                    base: f.base,
                    image_data: f.image_data,
                }
            }
            "chapter_end" => StoryNode::ChapterEnd {
                base: fields(value)?,
            },
            _ => StoryNode::Unknown {
                base: fields(value)?,
                tag,
            },
        })
    }
}

impl StoryNode {
    pub fn base(&self) -> &NodeBase {
        match self {
            StoryNode::Start { base }
            | StoryNode::Dialogue { base, .. }
            | StoryNode::Choice { base, .. }
            | StoryNode::Condition { base, .. }
            | StoryNode::Variable { base, .. }
            | StoryNode::Image { base, .. }
            | StoryNode::ChapterEnd { base }
            | StoryNode::Unknown { base, .. } => base,
        }
    }

    pub fn id(&self) -> &str {
        &self.base().id
    }

    pub fn text(&self) -> Option<&str> {
        self.base().text.as_deref()
    }

    /// The follow-on node id, with empty strings treated as terminal.
    pub fn next_node_id(&self) -> Option<&str> {
        self.base()
            .next_node_id
            .as_deref()
            .filter(|id| !id.is_empty())
    }

    pub fn on_enter_effects(&self) -> Option<&Effects> {
        self.base().on_enter_effects.as_ref()
    }

    pub fn speaker(&self) -> Option<&str> {
        match self {
            StoryNode::Dialogue { speaker, .. } => speaker.as_deref(),
            _ => None,
        }
    }

    pub fn kind(&self) -> NodeKind {
        match self {
            StoryNode::Start { .. } => NodeKind::Start,
            StoryNode::Dialogue { .. } => NodeKind::Dialogue,
            StoryNode::Choice { .. } => NodeKind::Choice,
            StoryNode::Condition { .. } => NodeKind::Condition,
            StoryNode::Variable { .. } => NodeKind::Variable,
            StoryNode::Image { .. } => NodeKind::Image,
            StoryNode::ChapterEnd { .. } => NodeKind::ChapterEnd,
            StoryNode::Unknown { .. } => NodeKind::Unknown,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dialogue_node_from_editor_json() {
        let json = r#"{
            "id": "n2",
            "type": "dialogue",
            "speaker": "Mira",
            "text": "You came back.",
            "nextNodeId": "n3"
        }"#;
        let node: StoryNode = serde_json::from_str(json).unwrap();
        assert_eq!(node.kind(), NodeKind::Dialogue);
        assert_eq!(node.id(), "n2");
        assert_eq!(node.speaker(), Some("Mira"));
        assert_eq!(node.next_node_id(), Some("n3"));
    }

    #[test]
    fn chapter_end_tag_uses_snake_case() {
        let json = r#"{"id": "end", "type": "chapter_end"}"#;
        let node: StoryNode = serde_json::from_str(json).unwrap();
        assert_eq!(node.kind(), NodeKind::ChapterEnd);

        let out = serde_json::to_string(&node).unwrap();
        assert!(out.contains(r#""type":"chapter_end""#));
    }

    #[test]
    fn empty_next_node_id_is_terminal() {
        let json = r#"{"id": "n1", "type": "dialogue", "text": "…", "nextNodeId": ""}"#;
        let node: StoryNode = serde_json::from_str(json).unwrap();
        assert_eq!(node.next_node_id(), None);
    }

    #[test]
    fn choice_node_with_guard_and_effects() {
        let json = r#"{
            "id": "fork",
            "type": "choice",
            "text": "What do you do?",
            "choices": [
                {"id": "c1", "text": "Fight", "nextNodeId": "battle"},
                {
                    "id": "c2",
                    "text": "Bribe the guard",
                    "nextNodeId": "inside",
                    "condition": {"type": "gold", "min": 50},
                    "effects": {"gold": -50}
                }
            ]
        }"#;
        let node: StoryNode = serde_json::from_str(json).unwrap();
        let StoryNode::Choice { choices, .. } = &node else {
            panic!("expected choice node");
        };
        assert_eq!(choices.len(), 2);
        assert!(choices[0].condition.is_none());
        assert_eq!(choices[1].target(), Some("inside"));
        assert_eq!(choices[1].effects.as_ref().unwrap().gold, Some(-50));
    }

    #[test]
    fn legacy_single_effect_folds_into_active_effects() {
        let data = ImageData {
            resource_path: "mira.png".to_string(),
            effect: Some(ImageEffect::FadeIn),
            ..Default::default()
        };
        assert_eq!(data.active_effects(), vec![ImageEffect::FadeIn]);

        let none = ImageData {
            resource_path: "mira.png".to_string(),
            effect: Some(ImageEffect::None),
            ..Default::default()
        };
        assert!(none.active_effects().is_empty());

        let both = ImageData {
            effect: Some(ImageEffect::FadeIn),
            effects: vec![ImageEffect::Shake, ImageEffect::Flash],
            ..Default::default()
        };
        assert_eq!(
            both.active_effects(),
            vec![ImageEffect::Shake, ImageEffect::Flash]
        );
    }

    #[test]
    fn image_effect_identifiers_are_camel_case() {
        assert_eq!(
            serde_json::to_string(&ImageEffect::SlideLeft).unwrap(),
            r#""slideLeft""#
        );
        let e: ImageEffect = serde_json::from_str(r#""zoomIn""#).unwrap();
        assert_eq!(e, ImageEffect::ZoomIn);
    }

    #[test]
    fn unrecognized_node_type_keeps_shared_fields() {
        // The editor also authors node types this engine does not
        // interpret (javascript, custom templates). They must load.
        let json = r#"{
            "id": "js1",
            "type": "javascript",
            "text": "The console hums.",
            "nextNodeId": "n2",
            "code": "return 1;"
        }"#;
        let node: StoryNode = serde_json::from_str(json).unwrap();
        let StoryNode::Unknown { tag, .. } = &node else {
            panic!("expected unknown node");
        };
        assert_eq!(tag, "javascript");
        assert_eq!(node.kind(), NodeKind::Unknown);
        assert_eq!(node.id(), "js1");
        assert_eq!(node.text(), Some("The console hums."));
        assert_eq!(node.next_node_id(), Some("n2"));
    }

    #[test]
    fn node_without_type_is_rejected() {
        let err = serde_json::from_str::<StoryNode>(r#"{"id": "n1"}"#).unwrap_err();
        assert!(err.to_string().contains("missing node type"));
    }

    #[test]
    fn unrecognized_image_effect_still_counts_as_active() {
        let e: ImageEffect = serde_json::from_str(r#""sparkle""#).unwrap();
        assert_eq!(e, ImageEffect::Unknown);

        let data = ImageData {
            resource_path: "mira.png".to_string(),
            effects: vec![ImageEffect::Unknown],
            ..Default::default()
        };
        assert_eq!(data.active_effects(), vec![ImageEffect::Unknown]);
    }

    #[test]
    fn transparent_kinds() {
        assert!(NodeKind::Condition.is_transparent());
        assert!(NodeKind::Variable.is_transparent());
        assert!(!NodeKind::Dialogue.is_transparent());
        assert!(!NodeKind::Image.is_transparent());
    }
}
