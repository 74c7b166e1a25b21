//! Homing and small-noise forces (`original_source/model/actions/homing_actions.hpp`).

use escape_core::math::save_normalize;
use escape_core::{AgentId, AgentRng};
use glam::Vec3;

use crate::action::{PreyAction, PreyActionCtx};
use crate::view::TickView;

/// Steer toward a fixed roost point in the world.
pub struct RoostAttraction {
    pub roost: Vec3,
    pub w: f32,
}

impl PreyAction for RoostAttraction {
    fn apply(&self, i: AgentId, view: &TickView, ctx: &mut PreyActionCtx, _rng: &mut AgentRng) {
        let pos = view.prey_pos[i.index()];
        *ctx.steering += save_normalize(self.roost - pos, Vec3::ZERO) * self.w;
    }
}

/// Pull the vertical component of `pos.y` toward `target_altitude`.
pub struct AltitudeAttraction {
    pub target_altitude: f32,
    pub w: f32,
}

impl PreyAction for AltitudeAttraction {
    fn apply(&self, i: AgentId, view: &TickView, ctx: &mut PreyActionCtx, _rng: &mut AgentRng) {
        let y = view.prey_pos[i.index()].y;
        *ctx.steering += Vec3::new(0.0, self.target_altitude - y, 0.0).clamp_length_max(1.0) * self.w;
    }
}

/// Damp the vertical component of the current heading, biasing toward
/// level flight.
pub struct LevelAttraction {
    pub w: f32,
}

impl PreyAction for LevelAttraction {
    fn apply(&self, i: AgentId, view: &TickView, ctx: &mut PreyActionCtx, _rng: &mut AgentRng) {
        let dir = view.prey_dir[i.index()];
        *ctx.steering += Vec3::new(0.0, -dir.y, 0.0) * self.w;
    }
}

/// Small random 3D jitter, sampled fresh every tick.
pub struct Wiggle {
    pub w: f32,
}

impl PreyAction for Wiggle {
    fn apply(&self, _i: AgentId, _view: &TickView, ctx: &mut PreyActionCtx, rng: &mut AgentRng) {
        let jitter = Vec3::new(
            rng.gen_range(-1.0..1.0),
            rng.gen_range(-1.0..1.0),
            rng.gen_range(-1.0..1.0),
        );
        *ctx.steering += jitter * self.w;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use escape_agent::StateInfo;
    use escape_core::{HeadSystem, Tick};
    use escape_group::GroupTracker;
    use escape_spatial::NeighborMatrix;

    fn ctx<'a>(steering: &'a mut Vec3, copied: &'a mut StateInfo, stress: &'a mut f32, scratch: &'a mut Vec3) -> PreyActionCtx<'a> {
        PreyActionCtx { steering, copied_state: copied, stress, scratch }
    }

    fn view<'a>(prey_pos: &'a [Vec3], prey_head: &'a [HeadSystem], prey_dir: &'a [Vec3]) -> (NeighborMatrix, NeighborMatrix, NeighborMatrix, NeighborMatrix, GroupTracker, GroupTracker, Vec<f32>, Vec<StateInfo>, Vec<Vec3>, Vec<f32>) {
        let empty: Vec<Vec3> = vec![];
        (
            NeighborMatrix::rebuild(prey_pos, prey_pos),
            NeighborMatrix::rebuild(prey_pos, &empty),
            NeighborMatrix::rebuild(&empty, prey_pos),
            NeighborMatrix::rebuild(&empty, &empty),
            GroupTracker::new(),
            GroupTracker::new(),
            vec![0.0; prey_pos.len()],
            vec![StateInfo::default(); prey_pos.len()],
            vec![Vec3::Z; prey_pos.len()],
            vec![10.0; prey_pos.len()],
        )
    }

    #[test]
    fn roost_attraction_steers_toward_roost() {
        let prey_pos = vec![Vec3::ZERO];
        let prey_head = vec![HeadSystem::initialize(Vec3::ZERO, Vec3::Z, 10.0)];
        let prey_dir = vec![Vec3::Z];
        let (prey_prey, prey_pred, pred_prey, pred_pred, prey_groups, pred_groups, prey_stress, prey_state, prey_prev_exit_dir, prey_speed) =
            view(&prey_pos, &prey_head, &prey_dir);

        let v = TickView {
            tick: Tick::ZERO,
            dt: 0.02,
            prey_pos: &prey_pos,
            prey_dir: &prey_dir,
            prey_speed: &prey_speed,
            prey_stress: &prey_stress,
            prey_state: &prey_state,
            prey_head: &prey_head,
            prey_prev_exit_dir: &prey_prev_exit_dir,
            pred_pos: &[],
            pred_dir: &[],
            pred_speed: &[],
            pred_stress: &[],
            pred_state: &[],
            pred_head: &[],
            pred_target: &[],
            prey_prey: &prey_prey,
            prey_pred: &prey_pred,
            pred_prey: &pred_prey,
            pred_pred: &pred_pred,
            prey_groups: &prey_groups,
            pred_groups: &pred_groups,
        };

        let action = RoostAttraction { roost: Vec3::new(0.0, 0.0, 10.0), w: 1.0 };
        let mut steering = Vec3::ZERO;
        let mut copied = StateInfo::default();
        let mut stress = 0.0;
        let mut scratch = Vec3::ZERO;
        let mut rng = escape_core::AgentRng::new(1, AgentId(0));
        action.apply(AgentId(0), &v, &mut ctx(&mut steering, &mut copied, &mut stress, &mut scratch), &mut rng);
        assert!(steering.z > 0.9);
    }
}
