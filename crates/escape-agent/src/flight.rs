//! Flight integrator (`original_source/model/flight_control.hpp::integrate_motion`).
//!
//! Run once per agent per tick, after the state machine has accumulated the
//! tick's net force into `steering`. Two things happen in order:
//!
//! 1. A cruise-drag term is added to `steering`: a force along the current
//!    heading proportional to how far off `cruise_speed` the agent currently
//!    is, scaled by the active state's drag gain `w`.
//! 2. A modified-Euler (midpoint) step integrates `steering / mass` into
//!    velocity and position, then re-derives `speed`/`dir` from the new
//!    velocity and clamps speed to `[min_speed, max_speed]`.

use glam::Vec3;

use crate::aero::{AeroInfo, StateAero};
use escape_core::math::save_normalize;

/// One tick of flight integration. `steering` is the accumulated net force
/// for this tick (cleared by the caller at the start of the state update);
/// `accel` is the previous tick's acceleration, carried forward for the
/// midpoint step.
pub fn integrate_motion(
    pos: &mut Vec3,
    dir: &mut Vec3,
    speed: &mut f32,
    accel: &mut Vec3,
    steering: &mut Vec3,
    ai: &AeroInfo,
    sa: &StateAero,
    dt: f32,
) {
    let dv_c = sa.cruise_speed - *speed;
    let lf = sa.w * dv_c * ai.body_mass;
    *steering += lf * *dir;

    let half_dt = dt * 0.5;
    let mut vel = *speed * *dir;
    vel += *accel * half_dt;
    *pos += vel * dt;

    *accel = *steering / ai.body_mass;
    vel += *accel * half_dt;

    *speed = vel.length();
    *dir = save_normalize(vel, *dir);
    *speed = speed.clamp(ai.min_speed, ai.max_speed);
}
