/// History recorder — append-only scrollback log, capped at the 100
/// most recent entries (drop-oldest).
use crate::schema::node::{ImageData, NodeKind, StoryNode};
use crate::schema::state::{HistoryEntry, HistoryImage};

/// Display/memory bound on the scrollback log.
pub const MAX_HISTORY: usize = 100;

/// Record a visible node visit. Re-entering the same node without
/// intervening content is suppressed so scrollback never shows
/// back-to-back duplicates.
pub fn record_visible(history: &mut Vec<HistoryEntry>, node: &StoryNode, timestamp: u64) {
    if let Some(last) = history.last() {
        if last.node_id == node.id() && last.kind == node.kind() {
            return;
        }
    }
    push(
        history,
        HistoryEntry {
            node_id: node.id().to_string(),
            kind: node.kind(),
            content: node.text().unwrap_or_default().to_string(),
            speaker: node.speaker().map(str::to_string),
            choice_text: None,
            image_data: None,
            timestamp,
        },
    );
}

/// Record a selected choice, carrying both the prompt and the chosen
/// option's text.
pub fn record_choice(
    history: &mut Vec<HistoryEntry>,
    node: &StoryNode,
    choice_text: &str,
    timestamp: u64,
) {
    push(
        history,
        HistoryEntry {
            node_id: node.id().to_string(),
            kind: NodeKind::Choice,
            content: node.text().unwrap_or_default().to_string(),
            speaker: None,
            choice_text: Some(choice_text.to_string()),
            image_data: None,
            timestamp,
        },
    );
}

/// Record an image directive, removals included, so scrollback reflects
/// what was on screen at each point.
pub fn record_image(
    history: &mut Vec<HistoryEntry>,
    node_id: &str,
    data: &ImageData,
    timestamp: u64,
) {
    let is_removal = data.is_removal();
    push(
        history,
        HistoryEntry {
            node_id: node_id.to_string(),
            kind: NodeKind::Image,
            content: if is_removal {
                "[Image removed]".to_string()
            } else {
                String::new()
            },
            speaker: None,
            choice_text: None,
            image_data: Some(HistoryImage {
                resource_path: data.resource_path.clone(),
                layer: data.layer,
                is_removal,
                effects: data.active_effects(),
                effect_duration: data.effect_duration,
            }),
            timestamp,
        },
    );
}

fn push(history: &mut Vec<HistoryEntry>, entry: HistoryEntry) {
    history.push(entry);
    if history.len() > MAX_HISTORY {
        let excess = history.len() - MAX_HISTORY;
        history.drain(..excess);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::node::NodeBase;

    fn dialogue(id: &str, text: &str) -> StoryNode {
        StoryNode::Dialogue {
            base: NodeBase {
                id: id.to_string(),
                text: Some(text.to_string()),
                ..Default::default()
            },
            speaker: Some("Mira".to_string()),
        }
    }

    #[test]
    fn visible_entries_carry_speaker_and_content() {
        let mut history = Vec::new();
        record_visible(&mut history, &dialogue("n1", "Hello."), 5);
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].content, "Hello.");
        assert_eq!(history[0].speaker.as_deref(), Some("Mira"));
        assert_eq!(history[0].timestamp, 5);
    }

    #[test]
    fn consecutive_duplicates_are_suppressed() {
        let mut history = Vec::new();
        let node = dialogue("n1", "Hello.");
        record_visible(&mut history, &node, 1);
        record_visible(&mut history, &node, 2);
        assert_eq!(history.len(), 1);

        // Intervening content re-enables the node.
        record_visible(&mut history, &dialogue("n2", "Other."), 3);
        record_visible(&mut history, &node, 4);
        assert_eq!(history.len(), 3);
    }

    #[test]
    fn log_keeps_only_most_recent_hundred() {
        let mut history = Vec::new();
        for i in 0..250 {
            record_visible(&mut history, &dialogue(&format!("n{i}"), "…"), i);
        }
        assert_eq!(history.len(), MAX_HISTORY);
        assert_eq!(history[0].node_id, "n150");
        assert_eq!(history.last().unwrap().node_id, "n249");
    }

    #[test]
    fn image_removal_is_recorded() {
        let mut history = Vec::new();
        let data = ImageData::default(); // empty resource path
        record_image(&mut history, "img1", &data, 7);
        assert_eq!(history[0].content, "[Image removed]");
        let image = history[0].image_data.as_ref().unwrap();
        assert!(image.is_removal);
    }

    #[test]
    fn image_entries_are_never_deduplicated() {
        let mut history = Vec::new();
        let data = ImageData {
            resource_path: "bg.png".to_string(),
            ..Default::default()
        };
        record_image(&mut history, "img1", &data, 1);
        record_image(&mut history, "img1", &data, 2);
        assert_eq!(history.len(), 2);
    }
}
