//! Builds state packages from the hierarchical configuration document (§6):
//! `Prey.states[]` / `Pred.states[]` (each `{name, copyable, tr, duration,
//! aero, actions[], sub_states?}`) plus `Prey.transitions` / `Pred.transitions`.
//!
//! Each action entry is `{"type": "<name>", ...type-specific fields}` — the
//! `type` string is looked up in a fixed registry ([`prey_action_from_json`]
//! / [`predator_action_from_json`]) that mirrors the action roster in
//! `escape-action`. Unknown action names are a `ConfigError`
//! ([`StateError::UnknownAction`]), per `spec.md` §7.
//!
//! Distances (`maxdist`, `minsep`, `catch_dist`) are configured un-squared,
//! the way a human author would write them, and squared once here — the
//! action structs themselves store the squared form since that's what the
//! per-tick hot path compares against `NeighborInfo::dist2`.

use escape_action::predator_actions::GroupSelectionMode;
use escape_action::*;
use escape_agent::StateAero;
use glam::Vec3;
use serde_json::Value;

use escape_core::config::{get_f32, get_f32_or, get_str, get_vec3};

use crate::error::{StateError, StateResult};
use crate::kind::StateKind;
use crate::predator::{PredatorStateDef, PredatorStatePackage};
use crate::prey::{PreyStateDef, PreyStatePackage};
use crate::transitions::TransitionModel;

fn cfg_err(e: escape_core::EscapeError) -> StateError {
    StateError::Config(e.to_string())
}

fn req_f32(j: &Value, key: &str) -> StateResult<f32> {
    get_f32(j, key).map_err(cfg_err)
}

fn req_str<'a>(j: &'a Value, key: &str) -> StateResult<&'a str> {
    get_str(j, key).map_err(cfg_err)
}

fn req_vec3(j: &Value, key: &str) -> StateResult<Vec3> {
    get_vec3(j, key).map_err(cfg_err)
}

fn opt_usize_or(j: &Value, key: &str, default: usize) -> usize {
    get_f32_or(j, key, default as f32) as usize
}

/// Build one prey action from its `{"type": "...", ...}` config entry.
pub fn prey_action_from_json(j: &Value) -> StateResult<Box<dyn PreyAction>> {
    let ty = req_str(j, "type")?;
    let topo = || opt_usize_or(j, "topo", 5);
    let cfov = || get_f32_or(j, "cfov", -1.0);
    let w = || get_f32_or(j, "w", 1.0);

    let action: Box<dyn PreyAction> = match ty {
        "align_n" => Box::new(AlignN { topo: topo(), cos_half_fov: cfov(), w: w() }),
        "align_direction" => Box::new(AlignDirection { w: w() }),
        "cohere_centroid" => Box::new(CohereCentroid { topo: topo(), cos_half_fov: cfov(), w: w() }),
        "cohere_centroid_distance" => Box::new(CohereCentroidDistance {
            topo: topo(),
            cos_half_fov: cfov(),
            min_w_dist: req_f32(j, "min_w_dist")?,
            max_w_dist: req_f32(j, "max_w_dist")?,
            w: w(),
        }),
        "avoid_n_position" => Box::new(AvoidNPosition {
            topo: topo(),
            cos_half_fov: cfov(),
            minsep2: req_f32(j, "minsep")?.powi(2),
            w: w(),
        }),
        "avoid_n_direction" => Box::new(AvoidNDirection {
            topo: topo(),
            cos_half_fov: cfov(),
            minsep2: req_f32(j, "minsep")?.powi(2),
            col_dist: req_f32(j, "col_dist")?,
            w: w(),
        }),
        "avoid_p_position" => Box::new(AvoidPPosition { minsep2: req_f32(j, "minsep")?.powi(2), w: w() }),
        "move_away_from_predator" => Box::new(MoveAwayFromPredator { maxdist2: req_f32(j, "maxdist")?.powi(2), w: w() }),
        "random_t_turn_pred" => Box::new(RandomTTurnPred { minsep2: req_f32(j, "minsep")?.powi(2), w: w() }),
        "random_t_turn_gamma_pred" => Box::new(RandomTTurnGammaPred {
            angle_shape: req_f32(j, "angle_shape")?,
            angle_scale: req_f32(j, "angle_scale")?,
            duration_shape: req_f32(j, "duration_shape")?,
            duration_scale: req_f32(j, "duration_scale")?,
            w: w(),
        }),
        "dive" => Box::new(Dive {
            max_dive: req_f32(j, "max_dive")?,
            pitch_rate: req_f32(j, "pitch_rate")?,
            w: w(),
        }),
        "zig_zag" => Box::new(ZigZag { freq: req_f32(j, "freq")?, w: w() }),
        "scatter" => Box::new(Scatter { w: w() }),
        "copy_escape" => Box::new(CopyEscape { topo: topo(), cos_half_fov: cfov() }),
        "roost_attraction" => Box::new(RoostAttraction { roost: req_vec3(j, "roost")?, w: w() }),
        "altitude_attraction" => Box::new(AltitudeAttraction { target_altitude: req_f32(j, "target_altitude")?, w: w() }),
        "level_attraction" => Box::new(LevelAttraction { w: w() }),
        "wiggle" => Box::new(Wiggle { w: w() }),
        other => return Err(StateError::UnknownAction(other.to_string())),
    };
    Ok(action)
}

/// Build one predator action from its `{"type": "...", ...}` config entry.
pub fn predator_action_from_json(j: &Value) -> StateResult<Box<dyn PredatorAction>> {
    let ty = req_str(j, "type")?;
    let w = || get_f32_or(j, "w", 1.0);

    let action: Box<dyn PredatorAction> = match ty {
        "chase_closest_prey" => Box::new(ChaseClosestPrey { maxdist2: req_f32(j, "maxdist")?.powi(2), w: w() }),
        "lock_on_closest_prey" => Box::new(LockOnClosestPrey {
            catch_dist2: req_f32(j, "catch_dist")?.powi(2),
            w: w(),
            victory_w: get_f32_or(j, "victory_w", w()),
        }),
        "select_group" => Box::new(SelectGroup { mode: group_selection_mode(req_str(j, "mode")?)? }),
        "set" => Box::new(Set),
        "set_retreat" => Box::new(SetRetreat { w: w() }),
        "hold" => Box::new(Hold),
        "hold_current" => Box::new(HoldCurrent),
        "shadowing" => Box::new(Shadowing {
            near: req_f32(j, "near")?,
            far: req_f32(j, "far")?,
            w: w(),
        }),
        other => return Err(StateError::UnknownAction(other.to_string())),
    };
    Ok(action)
}

fn group_selection_mode(s: &str) -> StateResult<GroupSelectionMode> {
    match s {
        "nearest" => Ok(GroupSelectionMode::Nearest),
        "biggest" => Ok(GroupSelectionMode::Biggest),
        "smallest" => Ok(GroupSelectionMode::Smallest),
        "random" => Ok(GroupSelectionMode::Random),
        other => Err(StateError::Config(format!("unknown select_group mode \"{other}\""))),
    }
}

/// `{name, copyable, tr, duration, aero, actions[], sub_states?}` → the
/// shape a state takes. `sub_states`, when present, makes this a
/// [`StateKind::MultiState`] over sibling indices in the same `states[]`
/// array; otherwise `duration` makes it [`StateKind::Persistent`], and its
/// absence makes it [`StateKind::Transient`] (`spec.md` §4.4).
fn state_kind(j: &Value) -> StateResult<StateKind> {
    if let Some(subs) = j.get("sub_states").and_then(Value::as_array) {
        let substates = subs
            .iter()
            .map(|v| v.as_u64().map(|n| n as usize).ok_or_else(|| StateError::Config("sub_states entries must be indices".into())))
            .collect::<StateResult<Vec<usize>>>()?;
        return Ok(StateKind::MultiState { substates });
    }
    if let Some(duration) = j.get("duration").and_then(Value::as_f64) {
        return Ok(StateKind::Persistent { duration: duration as f32 });
    }
    Ok(StateKind::Transient)
}

/// Parse `Prey.states[]` + `Prey.aero` + `Prey.transitions` into a
/// [`PreyStatePackage`]. `species_aero` supplies the fallback
/// `{cruiseSpeed, w}` a state's own `aero` override (if any) is layered on.
pub fn prey_package_from_json(states: &[Value], transitions: &Value, species_aero: &escape_agent::AeroInfo) -> StateResult<PreyStatePackage> {
    let mut defs = Vec::with_capacity(states.len());
    for s in states {
        let name = req_str(s, "name")?.to_string();
        let copyable = s.get("copyable").and_then(Value::as_bool).unwrap_or(false);
        let tr = s.get("tr").and_then(Value::as_u64).unwrap_or(1) as u32;
        if tr < 1 {
            return Err(StateError::Config(format!("state \"{name}\": tr must be >= 1 tick")));
        }
        let sai = s.get("aero").map(|a| StateAero::from_json_or(Some(a), species_aero));
        let actions = s
            .get("actions")
            .and_then(Value::as_array)
            .map(|arr| arr.iter().map(prey_action_from_json).collect::<StateResult<Vec<_>>>())
            .transpose()?
            .unwrap_or_default();
        defs.push(PreyStateDef { name, copyable, tr, sai, actions, kind: state_kind(s)? });
    }
    let tm = TransitionModel::from_json(transitions)?;
    PreyStatePackage::new(defs, tm)
}

/// Parse `Pred.states[]` + `Pred.aero` + `Pred.transitions` into a
/// [`PredatorStatePackage`].
pub fn predator_package_from_json(
    states: &[Value],
    transitions: &Value,
    species_aero: &escape_agent::AeroInfo,
) -> StateResult<PredatorStatePackage> {
    let mut defs = Vec::with_capacity(states.len());
    for s in states {
        let name = req_str(s, "name")?.to_string();
        let copyable = s.get("copyable").and_then(Value::as_bool).unwrap_or(false);
        let tr = s.get("tr").and_then(Value::as_u64).unwrap_or(1) as u32;
        if tr < 1 {
            return Err(StateError::Config(format!("state \"{name}\": tr must be >= 1 tick")));
        }
        let sai = s.get("aero").map(|a| StateAero::from_json_or(Some(a), species_aero));
        let actions = s
            .get("actions")
            .and_then(Value::as_array)
            .map(|arr| arr.iter().map(predator_action_from_json).collect::<StateResult<Vec<_>>>())
            .transpose()?
            .unwrap_or_default();
        defs.push(PredatorStateDef { name, copyable, tr, sai, actions, kind: state_kind(s)? });
    }
    let tm = TransitionModel::from_json(transitions)?;
    PredatorStatePackage::new(defs, tm)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn aero() -> escape_agent::AeroInfo {
        escape_agent::AeroInfo { beta_in: 1.0, body_mass: 0.2, cruise_speed: 10.0, min_speed: 5.0, max_speed: 15.0, w: 0.5 }
    }

    #[test]
    fn builds_two_state_prey_package() {
        let states = serde_json::json!([
            {
                "name": "cruise",
                "tr": 2,
                "duration": 5.0,
                "actions": [
                    {"type": "align_n", "topo": 5, "cfov": 0.0, "w": 1.0},
                    {"type": "cohere_centroid", "topo": 5, "cfov": 0.0, "w": 0.5}
                ]
            },
            {
                "name": "flee",
                "copyable": true,
                "tr": 1,
                "duration": 2.0,
                "actions": [{"type": "dive", "max_dive": 3.0, "pitch_rate": 1.0, "w": 1.0}]
            }
        ]);
        let transitions = serde_json::json!({"name": "constant", "TM": [[[0.0, 1.0], [1.0, 0.0]]]});
        let pkg = prey_package_from_json(states.as_array().unwrap(), &transitions, &aero()).unwrap();
        assert_eq!(pkg.states.len(), 2);
        assert_eq!(pkg.states[0].actions.len(), 2);
        assert!(pkg.states[1].copyable);
    }

    #[test]
    fn unknown_action_type_is_config_error() {
        let j = serde_json::json!({"type": "teleport", "w": 1.0});
        let err = prey_action_from_json(&j).unwrap_err();
        assert!(matches!(err, StateError::UnknownAction(_)));
    }

    #[test]
    fn zero_tr_is_rejected() {
        let states = serde_json::json!([{"name": "a", "tr": 0, "actions": []}]);
        let transitions = serde_json::json!({"name": "constant", "TM": [[[1.0]]]});
        assert!(prey_package_from_json(states.as_array().unwrap(), &transitions, &aero()).is_err());
    }

    #[test]
    fn multi_state_sub_states_parsed() {
        let states = serde_json::json!([
            {"name": "alert", "sub_states": [1, 2]},
            {"name": "dive_left", "tr": 1, "duration": 1.0, "actions": []},
            {"name": "dive_right", "tr": 1, "duration": 1.0, "actions": []}
        ]);
        let transitions = serde_json::json!({"name": "constant", "TM": [[[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]]]});
        let pkg = prey_package_from_json(states.as_array().unwrap(), &transitions, &aero()).unwrap();
        assert!(matches!(pkg.states[0].kind, StateKind::MultiState { .. }));
    }

    #[test]
    fn builds_predator_package_with_select_group() {
        let states = serde_json::json!([
            {"name": "search", "tr": 4, "duration": 3.0, "actions": [{"type": "select_group", "mode": "nearest"}]},
            {"name": "chase", "tr": 1, "duration": 5.0, "actions": [{"type": "chase_closest_prey", "maxdist": 50.0, "w": 1.0}]}
        ]);
        let transitions = serde_json::json!({"name": "constant", "TM": [[[0.0, 1.0], [1.0, 0.0]]]});
        let pkg = predator_package_from_json(states.as_array().unwrap(), &transitions, &aero()).unwrap();
        assert_eq!(pkg.states.len(), 2);
    }
}
