//! Flock cohesion actions (`original_source/model/actions/cohesion_actions.hpp`).

use escape_core::{math::save_normalize, math::smootherstep, AgentId, AgentRng};
use escape_spatial::fov::{in_fov, while_topo};
use glam::Vec3;

use crate::action::{PreyAction, PreyActionCtx};
use crate::view::TickView;

/// Turn toward the mean offset of up to `topo` accepted neighbors.
pub struct CohereCentroid {
    pub topo: usize,
    pub cos_half_fov: f32,
    pub w: f32,
}

impl PreyAction for CohereCentroid {
    fn apply(&self, i: AgentId, view: &TickView, ctx: &mut PreyActionCtx, _rng: &mut AgentRng) {
        let pos = view.prey_pos[i.index()];
        let row = view.prey_prey_row(i).others();

        let mut offset = Vec3::ZERO;
        while_topo(row, self.topo, |n| {
            let rel = n.neighbor_pos - pos;
            if in_fov(view.prey_head[i.index()].forward(), rel, n.dist2, self.cos_half_fov) {
                offset += rel;
                true
            } else {
                false
            }
        });
        *ctx.steering += save_normalize(offset, Vec3::ZERO) * self.w;
    }
}

/// Same as [`CohereCentroid`], but `w` is modulated by how far the mean
/// offset is past `min_w_dist` (ramping to full strength at `max_w_dist`).
pub struct CohereCentroidDistance {
    pub topo: usize,
    pub cos_half_fov: f32,
    pub min_w_dist: f32,
    pub max_w_dist: f32,
    pub w: f32,
}

impl PreyAction for CohereCentroidDistance {
    fn apply(&self, i: AgentId, view: &TickView, ctx: &mut PreyActionCtx, _rng: &mut AgentRng) {
        let pos = view.prey_pos[i.index()];
        let row = view.prey_prey_row(i).others();

        let mut offset = Vec3::ZERO;
        let mut count = 0u32;
        while_topo(row, self.topo, |n| {
            let rel = n.neighbor_pos - pos;
            if in_fov(view.prey_head[i.index()].forward(), rel, n.dist2, self.cos_half_fov) {
                offset += rel;
                count += 1;
                true
            } else {
                false
            }
        });
        if count == 0 {
            return;
        }
        let mean_dist = (offset / count as f32).length();
        let w = self.w * smootherstep(mean_dist, self.min_w_dist, self.max_w_dist);
        *ctx.steering += save_normalize(offset, Vec3::ZERO) * w;
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

    #[test]
    fn cohere_centroid_turns_toward_neighbor() {
        let prey_pos = vec![Vec3::ZERO, Vec3::new(0.0, 0.0, 10.0)];
        let prey_head = vec![
            HeadSystem::initialize(Vec3::ZERO, Vec3::Z, 10.0),
            HeadSystem::initialize(prey_pos[1], Vec3::Z, 10.0),
        ];
        let prey_dir = vec![Vec3::Z; 2];
        let prey_speed = vec![10.0; 2];
        let prey_stress = vec![0.0; 2];
        let prey_state = vec![StateInfo::default(); 2];
        let prey_prev_exit_dir = vec![Vec3::Z; 2];
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

        let action = CohereCentroid { topo: 4, cos_half_fov: -1.0, w: 1.0 };
        let mut steering = Vec3::ZERO;
        let mut copied = StateInfo::default();
        let mut stress = 0.0;
        let mut scratch = Vec3::ZERO;
        let mut rng = AgentRng::new(1, AgentId(0));
        action.apply(AgentId(0), &v, &mut ctx(&mut steering, &mut copied, &mut stress, &mut scratch), &mut rng);
        assert!(steering.z > 0.9, "should steer toward the neighbor behind +z: {steering:?}");
    }
}
