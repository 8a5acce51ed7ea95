/// Condition types — the guard/branching predicates of the story graph.
use serde::{Deserialize, Serialize};

/// A dynamic scalar value: the domain of story flags and variable
/// operation operands.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl Scalar {
    /// Numeric view of this scalar, if it holds a number.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Scalar::Int(i) => Some(*i as f64),
            Scalar::Float(f) => Some(*f),
            Scalar::Bool(_) | Scalar::Text(_) => None,
        }
    }

    /// Truthiness in the original runtime's sense: `false`, `0`, and the
    /// empty string are falsy; everything else is truthy.
    pub fn is_truthy(&self) -> bool {
        match self {
            Scalar::Bool(b) => *b,
            Scalar::Int(i) => *i != 0,
            Scalar::Float(f) => *f != 0.0,
            Scalar::Text(s) => !s.is_empty(),
        }
    }

    /// Build a scalar from a numeric result, preserving integer-ness
    /// where the value is exactly representable.
    pub fn from_number(n: f64) -> Scalar {
        if n.fract() == 0.0 && n.abs() < (i64::MAX as f64) {
            Scalar::Int(n as i64)
        } else {
            Scalar::Float(n)
        }
    }
}

impl PartialEq for Scalar {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Scalar::Bool(a), Scalar::Bool(b)) => a == b,
            (Scalar::Text(a), Scalar::Text(b)) => a == b,
            // Numbers compare numerically regardless of representation.
            _ => match (self.as_number(), other.as_number()) {
                (Some(a), Some(b)) => a == b,
                _ => false,
            },
        }
    }
}

/// Exact-or-range check against a numeric slot. An exact `value` takes
/// precedence and ignores the bounds; `min`/`max` are independently
/// optional inclusive bounds; both absent is vacuously true.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NumberCheck {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
}

impl NumberCheck {
    pub fn matches(&self, actual: f64) -> bool {
        if let Some(exact) = self.value {
            return actual == exact;
        }
        if let Some(min) = self.min {
            if actual < min {
                return false;
            }
        }
        if let Some(max) = self.max {
            if actual > max {
                return false;
            }
        }
        true
    }
}

/// A predicate over the game variables, discriminated by kind.
///
/// `Unknown` absorbs condition kinds this engine does not know and
/// evaluates permissively true, so documents authored against a newer
/// editor still play.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Condition {
    Gold {
        #[serde(flatten)]
        check: NumberCheck,
    },
    Hp {
        #[serde(flatten)]
        check: NumberCheck,
    },
    #[serde(rename_all = "camelCase")]
    Flag {
        #[serde(default)]
        flag_key: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        flag_value: Option<Scalar>,
    },
    #[serde(rename_all = "camelCase")]
    ChoiceMade {
        #[serde(default)]
        choice_id: String,
    },
    #[serde(rename_all = "camelCase")]
    Affection {
        #[serde(default)]
        character_id: String,
        #[serde(flatten)]
        check: NumberCheck,
    },
    #[serde(rename_all = "camelCase")]
    Reputation {
        #[serde(default)]
        faction_id: String,
        #[serde(flatten)]
        check: NumberCheck,
    },
    #[serde(other)]
    Unknown,
}
