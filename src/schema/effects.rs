/// Effect bundles — deltas and assignments applied to the game
/// variables, either unconditionally on node entry or on choice
/// selection.
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use super::condition::Scalar;

/// A per-character affection delta.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AffectionChange {
    pub character_id: String,
    pub delta: i64,
}

/// A per-faction reputation delta.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReputationChange {
    pub faction_id: String,
    pub delta: i64,
}

/// A bundle of variable mutations. All parts are optional; gold/hp are
/// signed deltas floored at 0, flags merge last-write-wins, and
/// affection/reputation deltas accumulate onto a default-0 baseline.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Effects {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gold: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hp: Option<i64>,
    #[serde(default, skip_serializing_if = "FxHashMap::is_empty")]
    pub set_flags: FxHashMap<String, Scalar>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub affection: Vec<AffectionChange>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub reputation: Vec<ReputationChange>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn effects_deserialize_from_editor_json() {
        let json = r#"{
            "gold": -20,
            "setFlags": {"metElder": true},
            "affection": [{"characterId": "mira", "delta": 5}]
        }"#;
        let effects: Effects = serde_json::from_str(json).unwrap();
        assert_eq!(effects.gold, Some(-20));
        assert_eq!(effects.hp, None);
        assert_eq!(
            effects.set_flags.get("metElder"),
            Some(&Scalar::Bool(true))
        );
        assert_eq!(effects.affection.len(), 1);
        assert!(effects.reputation.is_empty());
    }

    #[test]
    fn empty_effects_serialize_compactly() {
        let json = serde_json::to_string(&Effects::default()).unwrap();
        assert_eq!(json, "{}");
    }
}
