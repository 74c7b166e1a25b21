//! Same-species collision avoidance (`original_source/model/actions/avoid_actions.hpp`).

use escape_core::math::{nearest_approach_t, save_normalize};
use escape_core::{AgentId, AgentRng};
use escape_spatial::fov::{in_fov, while_topo};
use glam::Vec3;

use crate::action::{PreyAction, PreyActionCtx};
use crate::view::TickView;

/// Steer away from the sum of accepted neighbors closer than `minsep2`.
pub struct AvoidNPosition {
    pub topo: usize,
    pub cos_half_fov: f32,
    pub minsep2: f32,
    pub w: f32,
}

impl PreyAction for AvoidNPosition {
    fn apply(&self, i: AgentId, view: &TickView, ctx: &mut PreyActionCtx, _rng: &mut AgentRng) {
        let pos = view.prey_pos[i.index()];
        let fwd = view.prey_head[i.index()].forward();
        let row = view.prey_prey_row(i).others();

        let mut push = Vec3::ZERO;
        while_topo(row, self.topo, |n| {
            if n.dist2 >= self.minsep2 {
                return false;
            }
            let rel = n.neighbor_pos - pos;
            if in_fov(fwd, rel, n.dist2, self.cos_half_fov) {
                push -= rel;
                true
            } else {
                false
            }
        });
        *ctx.steering += save_normalize(push, Vec3::ZERO) * self.w;
    }
}

/// [`AvoidNPosition`] plus a ray-ray anticipation term: if the nearest
/// accepted neighbor's straight-line trajectory would close to within
/// `col_dist` of ours, add a correction along the near-miss axis.
pub struct AvoidNDirection {
    pub topo: usize,
    pub cos_half_fov: f32,
    pub minsep2: f32,
    pub col_dist: f32,
    pub w: f32,
}

impl PreyAction for AvoidNDirection {
    fn apply(&self, i: AgentId, view: &TickView, ctx: &mut PreyActionCtx, _rng: &mut AgentRng) {
        let pos = view.prey_pos[i.index()];
        let dir = view.prey_dir[i.index()] * view.prey_speed[i.index()];
        let fwd = view.prey_head[i.index()].forward();
        let row = view.prey_prey_row(i).others();

        let mut push = Vec3::ZERO;
        while_topo(row, self.topo, |n| {
            if n.dist2 >= self.minsep2 {
                return false;
            }
            let rel = n.neighbor_pos - pos;
            if !in_fov(fwd, rel, n.dist2, self.cos_half_fov) {
                return false;
            }
            push -= rel;

            let nvel = view.prey_dir[n.idx.index()] * view.prey_speed[n.idx.index()];
            if let Some(t) = nearest_approach_t(pos, dir, n.neighbor_pos, nvel) {
                if t > 0.0 {
                    let pa = pos + dir * t;
                    let pb = n.neighbor_pos + nvel * t;
                    let gap = pb - pa;
                    if gap.length_squared() < self.col_dist * self.col_dist {
                        push -= save_normalize(gap, Vec3::ZERO) * self.col_dist;
                    }
                }
            }
            true
        });
        *ctx.steering += save_normalize(push, Vec3::ZERO) * self.w;
    }
}
