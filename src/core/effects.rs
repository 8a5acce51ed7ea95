/// Effect applicator and variable operation executor.
///
/// Both mutate only the `GameVariables` they are handed; everything
/// else about engine state is untouched. Gold and hp are floored at 0
/// after every mutation (no ceiling).
use tracing::warn;

use crate::schema::condition::Scalar;
use crate::schema::effects::Effects;
use crate::schema::node::{VariableAction, VariableOperation, VariableTarget};
use crate::schema::state::GameVariables;

/// Apply an effect bundle: signed gold/hp deltas, flag merge
/// (last-write-wins), affection/reputation accumulation.
pub fn apply(vars: &mut GameVariables, effects: &Effects) {
    if let Some(delta) = effects.gold {
        vars.gold = (vars.gold + delta).max(0);
    }
    if let Some(delta) = effects.hp {
        vars.hp = (vars.hp + delta).max(0);
    }
    for (key, value) in &effects.set_flags {
        vars.flags.insert(key.clone(), value.clone());
    }
    for change in &effects.affection {
        *vars.affection.entry(change.character_id.clone()).or_insert(0) += change.delta;
    }
    for change in &effects.reputation {
        *vars.reputation.entry(change.faction_id.clone()).or_insert(0) += change.delta;
    }
}

/// Execute a single variable operation. Operations with a missing
/// selector key are ignored; non-`set` actions on a non-numeric flag
/// are ignored.
pub fn execute(vars: &mut GameVariables, op: &VariableOperation) {
    let operand = op.value.as_number().unwrap_or(0.0);

    match op.target {
        VariableTarget::Gold => {
            vars.gold = clamp_to_slot(apply_action(vars.gold as f64, op.action, operand));
        }
        VariableTarget::Hp => {
            vars.hp = clamp_to_slot(apply_action(vars.hp as f64, op.action, operand));
        }
        VariableTarget::Flag => {
            let Some(key) = op.key.as_deref().filter(|k| !k.is_empty()) else {
                warn!(slot = "flag", "variable operation without key, skipping");
                return;
            };
            if op.action == VariableAction::Set {
                vars.flags.insert(key.to_string(), op.value.clone());
            } else if let Some(current) = vars.flags.get(key).and_then(Scalar::as_number) {
                let result = apply_action(current, op.action, operand);
                vars.flags.insert(key.to_string(), Scalar::from_number(result));
            }
        }
        VariableTarget::Affection => {
            let Some(id) = op.character_id.as_deref().filter(|k| !k.is_empty()) else {
                warn!(slot = "affection", "variable operation without characterId, skipping");
                return;
            };
            let current = vars.affection_for(id) as f64;
            vars.affection
                .insert(id.to_string(), apply_action(current, op.action, operand) as i64);
        }
        VariableTarget::Reputation => {
            let Some(id) = op.faction_id.as_deref().filter(|k| !k.is_empty()) else {
                warn!(slot = "reputation", "variable operation without factionId, skipping");
                return;
            };
            let current = vars.reputation_for(id) as f64;
            vars.reputation
                .insert(id.to_string(), apply_action(current, op.action, operand) as i64);
        }
    }
}

fn apply_action(current: f64, action: VariableAction, value: f64) -> f64 {
    match action {
        VariableAction::Set => value,
        VariableAction::Add => current + value,
        VariableAction::Subtract => current - value,
        VariableAction::Multiply => current * value,
    }
}

// Gold/hp are integer slots with a hard floor at 0.
fn clamp_to_slot(value: f64) -> i64 {
    (value as i64).max(0)
}
