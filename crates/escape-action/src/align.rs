//! Directional alignment actions (`original_source/model/actions/align_actions.hpp`).

use escape_core::{math::save_normalize, AgentId, AgentRng};
use escape_spatial::fov::{in_fov, while_topo};
use glam::Vec3;

use crate::action::{PreyAction, PreyActionCtx};
use crate::view::TickView;

/// Turn toward the mean heading of up to `topo` same-species neighbors
/// inside the forward cone.
pub struct AlignN {
    pub topo: usize,
    pub cos_half_fov: f32,
    pub w: f32,
}

impl PreyAction for AlignN {
    fn apply(&self, i: AgentId, view: &TickView, ctx: &mut PreyActionCtx, _rng: &mut AgentRng) {
        let pos = view.prey_pos[i.index()];
        let row = view.prey_prey_row(i).others();

        let mut adir = Vec3::ZERO;
        while_topo(row, self.topo, |n| {
            let rel = n.neighbor_pos - pos;
            if in_fov(view.prey_head[i.index()].forward(), rel, n.dist2, self.cos_half_fov) {
                adir += view.prey_dir[n.idx.index()];
                true
            } else {
                false
            }
        });
        *ctx.steering += save_normalize(adir, Vec3::ZERO) * self.w;
    }
}

/// Turn toward the heading remembered at the last state exit
/// (`prev_exit_dir`), set fresh on every `on_entry`.
pub struct AlignDirection {
    pub w: f32,
}

impl PreyAction for AlignDirection {
    fn apply(&self, i: AgentId, view: &TickView, ctx: &mut PreyActionCtx, _rng: &mut AgentRng) {
        let dir = view.prey_prev_exit_dir[i.index()];
        *ctx.steering += dir * self.w;
    }
}

#[cfg(test)]
mod align_direction_tests {
    use super::*;
    use escape_agent::StateInfo;
    use escape_core::{HeadSystem, Tick};
    use escape_group::GroupTracker;
    use escape_spatial::NeighborMatrix;

    #[test]
    fn align_direction_steers_toward_prev_exit_dir() {
        let prey_pos = vec![Vec3::ZERO];
        let prey_head = vec![HeadSystem::initialize(Vec3::ZERO, Vec3::X, 10.0)];
        let prey_dir = vec![Vec3::X];
        let prey_speed = vec![10.0];
        let prey_stress = vec![0.0];
        let prey_state = vec![StateInfo::default()];
        let prey_prev_exit_dir = vec![Vec3::new(0.0, 0.0, 1.0)];
        let empty: Vec<Vec3> = vec![];
        let prey_prey = NeighborMatrix::rebuild(&prey_pos, &prey_pos);
        let prey_pred = NeighborMatrix::rebuild(&prey_pos, &empty);
        let pred_prey = NeighborMatrix::rebuild(&empty, &prey_pos);
        let pred_pred = NeighborMatrix::rebuild(&empty, &empty);
        let prey_groups = GroupTracker::new();
        let pred_groups = GroupTracker::new();

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
            pred_pos: &empty,
            pred_dir: &empty,
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

        let action = AlignDirection { w: 2.0 };
        let mut steering = Vec3::ZERO;
        let mut copied = StateInfo::default();
        let mut stress = 0.0;
        let mut scratch = Vec3::ZERO;
        let mut rng = AgentRng::new(1, AgentId(0));
        let mut ctx = PreyActionCtx { steering: &mut steering, copied_state: &mut copied, stress: &mut stress, scratch: &mut scratch };
        action.apply(AgentId(0), &v, &mut ctx, &mut rng);
        assert_eq!(steering, Vec3::new(0.0, 0.0, 2.0));
    }
}
