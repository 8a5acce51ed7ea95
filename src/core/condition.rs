/// Condition evaluator — a pure, total function from a variable
/// snapshot and a condition to a boolean.
use crate::schema::condition::Condition;
use crate::schema::state::GameVariables;

/// Evaluate a condition against the current variables. Never fails:
/// conditions with a missing selector are false, and unknown kinds are
/// permissively true.
pub fn evaluate(vars: &GameVariables, condition: &Condition) -> bool {
    match condition {
        Condition::Gold { check } => check.matches(vars.gold as f64),
        Condition::Hp { check } => check.matches(vars.hp as f64),
        Condition::Flag {
            flag_key,
            flag_value,
        } => {
            if flag_key.is_empty() {
                return false;
            }
            let stored = vars.flags.get(flag_key);
            match flag_value {
                Some(expected) => stored == Some(expected),
                None => stored.is_some_and(|v| v.is_truthy()),
            }
        }
        Condition::ChoiceMade { choice_id } => {
            !choice_id.is_empty() && vars.choices_made.iter().any(|id| id == choice_id)
        }
        Condition::Affection {
            character_id,
            check,
        } => {
            !character_id.is_empty() && check.matches(vars.affection_for(character_id) as f64)
        }
        Condition::Reputation { faction_id, check } => {
            !faction_id.is_empty() && check.matches(vars.reputation_for(faction_id) as f64)
        }
        Condition::Unknown => true,
    }
}
