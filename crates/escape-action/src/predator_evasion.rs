//! Predator-reactive prey actions (`original_source/model/actions/escape_actions.hpp`).

use escape_core::math::{rotate, save_normalize, PI};
use escape_core::{AgentId, AgentRng};
use glam::Vec3;

use crate::action::{PreyAction, PreyActionCtx};
use crate::view::TickView;

fn nearest_predator(i: AgentId, view: &TickView) -> Option<(Vec3, f32)> {
    view.prey_pred_row(i).raw().first().map(|n| (n.neighbor_pos, n.dist2))
}

/// Turn along the body-frame side axis away from the nearest predator's
/// hemisphere, when that predator is closer than `minsep2`.
pub struct AvoidPPosition {
    pub minsep2: f32,
    pub w: f32,
}

impl PreyAction for AvoidPPosition {
    fn apply(&self, i: AgentId, view: &TickView, ctx: &mut PreyActionCtx, _rng: &mut AgentRng) {
        let Some((pred_pos, dist2)) = nearest_predator(i, view) else { return };
        if dist2 >= self.minsep2 {
            return;
        }
        let head = &view.prey_head[i.index()];
        let hemi = head.hemisphere(pred_pos);
        // `hemi.z` is the sign of the predator's offset along `side`; turn
        // the opposite way.
        *ctx.steering += head.side() * -hemi.z * self.w;
    }
}

/// Plain reverse-offset push away from the nearest predator within `maxdist`.
pub struct MoveAwayFromPredator {
    pub maxdist2: f32,
    pub w: f32,
}

impl PreyAction for MoveAwayFromPredator {
    fn apply(&self, i: AgentId, view: &TickView, ctx: &mut PreyActionCtx, _rng: &mut AgentRng) {
        let pos = view.prey_pos[i.index()];
        let Some((pred_pos, dist2)) = nearest_predator(i, view) else { return };
        if dist2 >= self.maxdist2 {
            return;
        }
        *ctx.steering += save_normalize(pos - pred_pos, Vec3::ZERO) * self.w;
    }
}

/// On entry, fix a turn side away from the nearest predator; every tick of
/// the state's persistence, keep applying a steady lateral steering bias
/// along that side (no gamma-sampled radius, unlike
/// [`RandomTTurnGammaPred`]).
pub struct RandomTTurnPred {
    pub minsep2: f32,
    pub w: f32,
}

impl PreyAction for RandomTTurnPred {
    fn on_entry(&self, i: AgentId, view: &TickView, ctx: &mut PreyActionCtx) {
        let side = match nearest_predator(i, view) {
            Some((pred_pos, dist2)) if dist2 < self.minsep2 => {
                let hemi = view.prey_head[i.index()].hemisphere(pred_pos);
                -hemi.z
            }
            _ => 1.0,
        };
        ctx.scratch.x = side;
    }

    fn apply(&self, i: AgentId, view: &TickView, ctx: &mut PreyActionCtx, _rng: &mut AgentRng) {
        let side = ctx.scratch.x;
        *ctx.steering += view.prey_head[i.index()].side() * side * self.w;
    }
}

/// Gamma-distributed turn: samples a turn angle and duration at entry,
/// derives a turn radius from the current speed, and applies a centripetal
/// steering term directed to the side away from the predator for the
/// remainder of the state.
pub struct RandomTTurnGammaPred {
    pub angle_shape: f32,
    pub angle_scale: f32,
    pub duration_shape: f32,
    pub duration_scale: f32,
    pub w: f32,
}

impl PreyAction for RandomTTurnGammaPred {
    fn on_entry(&self, i: AgentId, view: &TickView, ctx: &mut PreyActionCtx) {
        let side = match nearest_predator(i, view) {
            Some((pred_pos, _)) => {
                let hemi = view.prey_head[i.index()].hemisphere(pred_pos);
                -hemi.z
            }
            None => 1.0,
        };
        ctx.scratch.y = side;
        // Radius depends on a live Gamma draw, which `on_entry` has no `rng`
        // to make; `apply` runs immediately after `on_entry` on the entry
        // tick (see `step_prey`), so defer the draw there and mark it
        // pending with `scratch.z`.
        ctx.scratch.z = 0.0;
    }

    fn apply(&self, i: AgentId, view: &TickView, ctx: &mut PreyActionCtx, rng: &mut AgentRng) {
        if ctx.scratch.z == 0.0 {
            let angle = rng.gen_gamma(self.angle_shape, self.angle_scale).max(1e-3);
            let duration = rng.gen_gamma(self.duration_shape, self.duration_scale).max(1e-3);
            let speed = view.prey_speed[i.index()];
            ctx.scratch.x = (speed * duration / angle).max(1e-3);
            ctx.scratch.z = 1.0;
        }
        let radius = ctx.scratch.x;
        let side = ctx.scratch.y;
        let speed = view.prey_speed[i.index()];
        let centripetal = (speed * speed) / radius;
        *ctx.steering += view.prey_head[i.index()].side() * side * centripetal * self.w;
    }
}

/// Pitch down toward the ground while within `max_dive` of the entry
/// altitude, then pull out with a half-loop around the side axis.
pub struct Dive {
    pub max_dive: f32,
    pub pitch_rate: f32,
    pub w: f32,
}

impl PreyAction for Dive {
    fn on_entry(&self, i: AgentId, view: &TickView, ctx: &mut PreyActionCtx) {
        ctx.scratch.x = view.prey_pos[i.index()].y;
    }

    fn apply(&self, i: AgentId, view: &TickView, ctx: &mut PreyActionCtx, _rng: &mut AgentRng) {
        let y0 = ctx.scratch.x;
        let pos = view.prey_pos[i.index()];
        let head = &view.prey_head[i.index()];
        if (pos.y - y0).abs() < self.max_dive {
            *ctx.steering += head.pitch(-self.pitch_rate) * self.w;
        } else {
            *ctx.steering += rotate(head.forward(), 1.5 * PI, head.side()) * self.w;
        }
    }
}

/// Alternating lateral force, `sin(2*pi*freq*t)` scaled by `w` — no
/// per-agent entry state needed since the phase is a pure function of
/// simulated time.
pub struct ZigZag {
    pub freq: f32,
    pub w: f32,
}

impl PreyAction for ZigZag {
    fn apply(&self, i: AgentId, view: &TickView, ctx: &mut PreyActionCtx, _rng: &mut AgentRng) {
        let t = view.tick.0 as f32 * view.dt;
        let phase = (2.0 * PI * self.freq * t).sin();
        *ctx.steering += view.prey_head[i.index()].side() * phase * self.w;
    }
}

/// Unconditional random lateral jitter, sampled fresh every tick.
pub struct Scatter {
    pub w: f32,
}

impl PreyAction for Scatter {
    fn apply(&self, i: AgentId, view: &TickView, ctx: &mut PreyActionCtx, rng: &mut AgentRng) {
        let side = view.prey_head[i.index()].side();
        let up = view.prey_head[i.index()].up();
        let a: f32 = rng.gen_range(-1.0..1.0);
        let b: f32 = rng.gen_range(-1.0..1.0);
        *ctx.steering += (side * a + up * b) * self.w;
    }
}

/// Scan own-species neighbors in FOV order; adopt the first copyable
/// neighbor's current state as `copied_state`.
pub struct CopyEscape {
    pub topo: usize,
    pub cos_half_fov: f32,
}

impl PreyAction for CopyEscape {
    fn apply(&self, i: AgentId, view: &TickView, ctx: &mut PreyActionCtx, _rng: &mut AgentRng) {
        let pos = view.prey_pos[i.index()];
        let fwd = view.prey_head[i.index()].forward();
        let row = view.prey_prey_row(i).others();

        let mut found = None;
        escape_spatial::fov::while_topo(row, self.topo, |n| {
            let rel = n.neighbor_pos - pos;
            if escape_spatial::fov::in_fov(fwd, rel, n.dist2, self.cos_half_fov) {
                let st = view.prey_state[n.idx.index()];
                if st.is_copyable() {
                    found = Some(st);
                    return true;
                }
            }
            false
        });
        if let Some(st) = found {
            *ctx.copied_state = st;
        }
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

    fn basic_view<'a>(
        prey_pos: &'a [Vec3],
        prey_head: &'a [HeadSystem],
        prey_dir: &'a [Vec3],
        prey_speed: &'a [f32],
        prey_state: &'a [StateInfo],
        pred_pos: &'a [Vec3],
        prey_prey: &'a NeighborMatrix,
        prey_pred: &'a NeighborMatrix,
        pred_prey: &'a NeighborMatrix,
        pred_pred: &'a NeighborMatrix,
        prey_groups: &'a GroupTracker,
        pred_groups: &'a GroupTracker,
        prey_stress: &'a [f32],
        prey_prev_exit_dir: &'a [Vec3],
    ) -> TickView<'a> {
        TickView {
            tick: Tick::ZERO,
            dt: 0.02,
            prey_pos,
            prey_dir,
            prey_speed,
            prey_stress,
            prey_state,
            prey_head,
            prey_prev_exit_dir,
            pred_pos,
            pred_dir: &[],
            pred_speed: &[],
            pred_stress: &[],
            pred_state: &[],
            pred_head: &[],
            pred_target: &[],
            prey_prey,
            prey_pred,
            pred_prey,
            pred_pred,
            prey_groups,
            pred_groups,
        }
    }

    #[test]
    fn move_away_from_predator_pushes_opposite_direction() {
        let prey_pos = vec![Vec3::ZERO];
        let prey_head = vec![HeadSystem::initialize(Vec3::ZERO, Vec3::Z, 10.0)];
        let prey_dir = vec![Vec3::Z];
        let prey_speed = vec![10.0];
        let prey_state = vec![StateInfo::default()];
        let prey_stress = vec![0.0];
        let prey_prev_exit_dir = vec![Vec3::Z];
        let pred_pos = vec![Vec3::new(0.0, 0.0, 1.0)];
        let prey_prey = NeighborMatrix::rebuild(&prey_pos, &prey_pos);
        let prey_pred = NeighborMatrix::rebuild(&prey_pos, &pred_pos);
        let pred_prey = NeighborMatrix::rebuild(&pred_pos, &prey_pos);
        let pred_pred = NeighborMatrix::rebuild(&pred_pos, &pred_pos);
        let prey_groups = GroupTracker::new();
        let pred_groups = GroupTracker::new();

        let v = basic_view(
            &prey_pos, &prey_head, &prey_dir, &prey_speed, &prey_state, &pred_pos, &prey_prey, &prey_pred, &pred_prey,
            &pred_pred, &prey_groups, &pred_groups, &prey_stress, &prey_prev_exit_dir,
        );

        let action = MoveAwayFromPredator { maxdist2: 4.0, w: 1.0 };
        let mut steering = Vec3::ZERO;
        let mut copied = StateInfo::default();
        let mut stress = 0.0;
        let mut scratch = Vec3::ZERO;
        let mut rng = AgentRng::new(1, AgentId(0));
        action.apply(AgentId(0), &v, &mut ctx(&mut steering, &mut copied, &mut stress, &mut scratch), &mut rng);
        assert!(steering.z < -0.9, "should push away from the predator ahead: {steering:?}");
    }

    #[test]
    fn copy_escape_adopts_first_copyable_neighbor() {
        let prey_pos = vec![Vec3::ZERO, Vec3::new(0.0, 0.0, 1.0)];
        let prey_head = vec![
            HeadSystem::initialize(Vec3::ZERO, Vec3::Z, 10.0),
            HeadSystem::initialize(prey_pos[1], Vec3::Z, 10.0),
        ];
        let prey_dir = vec![Vec3::Z; 2];
        let prey_speed = vec![10.0; 2];
        let copyable_state = StateInfo::new(3, 0, true, Tick::ZERO);
        let prey_state = vec![StateInfo::default(), copyable_state];
        let prey_stress = vec![0.0; 2];
        let prey_prev_exit_dir = vec![Vec3::Z; 2];
        let empty: Vec<Vec3> = vec![];
        let prey_prey = NeighborMatrix::rebuild(&prey_pos, &prey_pos);
        let prey_pred = NeighborMatrix::rebuild(&prey_pos, &empty);
        let pred_prey = NeighborMatrix::rebuild(&empty, &prey_pos);
        let pred_pred = NeighborMatrix::rebuild(&empty, &empty);
        let prey_groups = GroupTracker::new();
        let pred_groups = GroupTracker::new();

        let v = basic_view(
            &prey_pos, &prey_head, &prey_dir, &prey_speed, &prey_state, &empty, &prey_prey, &prey_pred, &pred_prey,
            &pred_pred, &prey_groups, &pred_groups, &prey_stress, &prey_prev_exit_dir,
        );

        let action = CopyEscape { topo: 4, cos_half_fov: -1.0 };
        let mut steering = Vec3::ZERO;
        let mut copied = StateInfo::default();
        let mut stress = 0.0;
        let mut scratch = Vec3::ZERO;
        let mut rng = AgentRng::new(1, AgentId(0));
        action.apply(AgentId(0), &v, &mut ctx(&mut steering, &mut copied, &mut stress, &mut scratch), &mut rng);
        assert_eq!(copied.state(), 3);
    }
}
