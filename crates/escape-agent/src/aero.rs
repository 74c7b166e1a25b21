//! Aerodynamic parameters (`original_source/model/flight.hpp`).
//!
//! `AeroInfo` is parsed once per species from `Prey.aero`/`Pred.aero` and
//! never changes; `StateAero` is parsed per *state* (each state's config may
//! override cruise speed and drag gain — the escape dive, for example, flies
//! faster and looser than cruise flocking) and is read fresh every tick from
//! whichever state the agent currently occupies.

use escape_core::config::{get_f32, get_f32_or};
use escape_core::EscapeResult;
use serde_json::Value;

/// Per-species aerodynamic constants (`Prey.aero` / `Pred.aero`).
#[derive(Clone, Copy, Debug)]
pub struct AeroInfo {
    /// Banking response rate, radians/sec (`betaIn`).
    pub beta_in: f32,
    pub body_mass: f32,
    pub cruise_speed: f32,
    pub min_speed: f32,
    pub max_speed: f32,
    /// Cruise-drag gain (`w`): how hard the integrator pulls speed back
    /// toward `cruise_speed`.
    pub w: f32,
}

impl AeroInfo {
    pub fn from_json(j: &Value) -> EscapeResult<Self> {
        Ok(AeroInfo {
            beta_in: get_f32(j, "betaIn")?,
            body_mass: get_f32(j, "bodyMass")?,
            cruise_speed: get_f32(j, "cruiseSpeed")?,
            min_speed: get_f32(j, "minSpeed")?,
            max_speed: get_f32(j, "maxSpeed")?,
            w: get_f32(j, "w")?,
        })
    }
}

/// A state's aerodynamic override (`Prey.states[i].aero`). Falls back to the
/// species-wide [`AeroInfo`] values when a state doesn't specify its own.
#[derive(Clone, Copy, Debug)]
pub struct StateAero {
    pub cruise_speed: f32,
    pub w: f32,
}

impl StateAero {
    pub fn from_json_or(j: Option<&Value>, fallback: &AeroInfo) -> Self {
        match j {
            Some(j) => StateAero {
                cruise_speed: get_f32_or(j, "cruiseSpeed", fallback.cruise_speed),
                w: get_f32_or(j, "w", fallback.w),
            },
            None => StateAero {
                cruise_speed: fallback.cruise_speed,
                w: fallback.w,
            },
        }
    }
}
