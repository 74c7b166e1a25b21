//! Predator-side targeting and pursuit actions
//! (`original_source/model/actions/predator_actions.hpp`).

use escape_core::math::save_normalize;
use escape_core::{AgentId, AgentRng};
use glam::Vec3;

use crate::action::{PredatorAction, PredatorActionCtx};
use crate::view::TickView;

/// Re-target the nearest prey every tick and steer toward it.
pub struct ChaseClosestPrey {
    pub maxdist2: f32,
    pub w: f32,
}

impl PredatorAction for ChaseClosestPrey {
    fn apply(&self, i: AgentId, view: &TickView, ctx: &mut PredatorActionCtx, _rng: &mut AgentRng) {
        let pos = view.pred_pos[i.index()];
        let Some(nearest) = view.pred_prey_row(i).raw().first() else {
            *ctx.target = None;
            return;
        };
        if nearest.dist2 >= self.maxdist2 {
            *ctx.target = None;
            return;
        }
        *ctx.target = Some(nearest.idx);
        *ctx.steering += save_normalize(nearest.neighbor_pos - pos, Vec3::ZERO) * self.w;
    }
}

/// Latch the nearest prey at entry and hold it until caught
/// (`offset.length_squared() < catch_dist2`), then perform a victory
/// side-turn instead of continuing to close.
pub struct LockOnClosestPrey {
    pub catch_dist2: f32,
    pub w: f32,
    pub victory_w: f32,
}

impl PredatorAction for LockOnClosestPrey {
    fn on_entry(&self, i: AgentId, view: &TickView, ctx: &mut PredatorActionCtx) {
        *ctx.target = view.pred_prey_row(i).raw().first().map(|n| n.idx);
    }

    fn apply(&self, i: AgentId, view: &TickView, ctx: &mut PredatorActionCtx, _rng: &mut AgentRng) {
        let Some(target) = *ctx.target else { return };
        let pos = view.pred_pos[i.index()];
        let prey_pos = view.prey_pos[target.index()];
        let offset = prey_pos - pos;

        if offset.length_squared() < self.catch_dist2 {
            *ctx.steering += view.pred_head[i.index()].side() * self.victory_w;
            *ctx.target = None;
        } else {
            *ctx.steering += save_normalize(offset, Vec3::ZERO) * self.w;
        }
    }
}

/// How to pick among the observed species' emergent groups.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GroupSelectionMode {
    Nearest,
    Biggest,
    Smallest,
    Random,
}

/// Pick a target group by [`GroupSelectionMode`] and latch its first member
/// as `target`.
pub struct SelectGroup {
    pub mode: GroupSelectionMode,
}

impl PredatorAction for SelectGroup {
    fn on_entry(&self, i: AgentId, view: &TickView, ctx: &mut PredatorActionCtx) {
        let groups = view.prey_groups.groups();
        if groups.is_empty() {
            *ctx.target = None;
            return;
        }
        let pos = view.pred_pos[i.index()];
        let gid = match self.mode {
            GroupSelectionMode::Nearest => groups
                .iter()
                .enumerate()
                .min_by(|(_, a), (_, b)| {
                    let da = (a.centroid() - pos).length_squared();
                    let db = (b.centroid() - pos).length_squared();
                    da.total_cmp(&db)
                })
                .map(|(idx, _)| idx),
            GroupSelectionMode::Biggest => groups.iter().enumerate().max_by_key(|(_, g)| g.size).map(|(idx, _)| idx),
            GroupSelectionMode::Smallest => groups.iter().enumerate().min_by_key(|(_, g)| g.size).map(|(idx, _)| idx),
            GroupSelectionMode::Random => Some((i.index()) % groups.len()),
        };
        let Some(gid) = gid else {
            *ctx.target = None;
            return;
        };
        let gid = escape_core::GroupId::try_from(gid).expect("group count fits u32");
        *ctx.target = view.prey_groups.group_mates(gid).next();
    }

    fn apply(&self, _i: AgentId, _view: &TickView, _ctx: &mut PredatorActionCtx, _rng: &mut AgentRng) {}
}

/// No-op placeholder that just clears any leftover target; used by
/// transient "reset and move on" states.
pub struct Set;

impl PredatorAction for Set {
    fn on_entry(&self, _i: AgentId, _view: &TickView, ctx: &mut PredatorActionCtx) {
        *ctx.target = None;
    }

    fn apply(&self, _i: AgentId, _view: &TickView, _ctx: &mut PredatorActionCtx, _rng: &mut AgentRng) {}
}

/// Clear the target and steer directly away from the last known prey
/// position, if any was set before this state was entered.
pub struct SetRetreat {
    pub w: f32,
}

impl PredatorAction for SetRetreat {
    fn apply(&self, i: AgentId, view: &TickView, ctx: &mut PredatorActionCtx, _rng: &mut AgentRng) {
        if let Some(target) = ctx.target.take() {
            let pos = view.pred_pos[i.index()];
            let prey_pos = view.prey_pos[target.index()];
            *ctx.steering += save_normalize(pos - prey_pos, Vec3::ZERO) * self.w;
        }
    }
}

/// Hold the current heading with no added steering contribution — a pure
/// "coast" state.
pub struct Hold;

impl PredatorAction for Hold {
    fn apply(&self, _i: AgentId, _view: &TickView, _ctx: &mut PredatorActionCtx, _rng: &mut AgentRng) {}
}

/// Like [`Hold`], but counts elapsed time in `state_timer` so a persistent
/// caller can read it back (e.g. to decide whether to give up a hunt).
pub struct HoldCurrent;

impl PredatorAction for HoldCurrent {
    fn on_entry(&self, _i: AgentId, _view: &TickView, ctx: &mut PredatorActionCtx) {
        *ctx.state_timer = 0.0;
    }

    fn apply(&self, _i: AgentId, view: &TickView, ctx: &mut PredatorActionCtx, _rng: &mut AgentRng) {
        *ctx.state_timer += view.dt;
    }
}

/// Follow the targeted group's centroid at a standoff distance rather than
/// closing to attack: pulls in when farther than `far`, pushes out when
/// closer than `near`.
pub struct Shadowing {
    pub near: f32,
    pub far: f32,
    pub w: f32,
}

impl PredatorAction for Shadowing {
    fn apply(&self, i: AgentId, view: &TickView, ctx: &mut PredatorActionCtx, _rng: &mut AgentRng) {
        let Some(target) = *ctx.target else { return };
        let pos = view.pred_pos[i.index()];
        let gid = view.prey_groups.group_of(target);
        let Some(descr) = view.prey_groups.groups().get(gid.index()) else { return };
        let offset = descr.centroid() - pos;
        let dist = offset.length();
        if dist > self.far {
            *ctx.steering += save_normalize(offset, Vec3::ZERO) * self.w;
        } else if dist < self.near {
            *ctx.steering -= save_normalize(offset, Vec3::ZERO) * self.w;
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

    fn ctx<'a>(
        steering: &'a mut Vec3,
        target: &'a mut Option<AgentId>,
        state_timer: &'a mut f32,
        copy_duration: &'a mut f32,
        stress: &'a mut f32,
    ) -> PredatorActionCtx<'a> {
        PredatorActionCtx { steering, target, state_timer, copy_duration, stress }
    }

    #[test]
    fn chase_closest_prey_targets_and_steers() {
        let pred_pos = vec![Vec3::ZERO];
        let pred_head = vec![HeadSystem::initialize(Vec3::ZERO, Vec3::Z, 18.0)];
        let pred_dir = vec![Vec3::Z];
        let pred_speed = vec![18.0];
        let pred_state = vec![StateInfo::default()];
        let pred_stress = vec![0.0];
        let pred_target = vec![None];
        let prey_pos = vec![Vec3::new(0.0, 0.0, 5.0)];
        let prey_dir = vec![Vec3::Z];
        let prey_speed = vec![10.0];
        let prey_stress = vec![0.0];
        let prey_state = vec![StateInfo::default()];
        let prey_head = vec![HeadSystem::initialize(prey_pos[0], Vec3::Z, 10.0)];
        let prey_prev_exit_dir = vec![Vec3::Z];
        let prey_prey = NeighborMatrix::rebuild(&prey_pos, &prey_pos);
        let prey_pred = NeighborMatrix::rebuild(&prey_pos, &pred_pos);
        let pred_prey = NeighborMatrix::rebuild(&pred_pos, &prey_pos);
        let pred_pred = NeighborMatrix::rebuild(&pred_pos, &pred_pos);
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
            pred_pos: &pred_pos,
            pred_dir: &pred_dir,
            pred_speed: &pred_speed,
            pred_stress: &pred_stress,
            pred_state: &pred_state,
            pred_head: &pred_head,
            pred_target: &pred_target,
            prey_prey: &prey_prey,
            prey_pred: &prey_pred,
            pred_prey: &pred_prey,
            pred_pred: &pred_pred,
            prey_groups: &prey_groups,
            pred_groups: &pred_groups,
        };

        let action = ChaseClosestPrey { maxdist2: 100.0, w: 1.0 };
        let mut steering = Vec3::ZERO;
        let mut target = None;
        let mut state_timer = 0.0;
        let mut copy_duration = 0.0;
        let mut stress = 0.0;
        let mut rng = AgentRng::new(1, AgentId(0));
        action.apply(
            AgentId(0),
            &v,
            &mut ctx(&mut steering, &mut target, &mut state_timer, &mut copy_duration, &mut stress),
            &mut rng,
        );
        assert_eq!(target, Some(AgentId(0)));
        assert!(steering.z > 0.9);
    }
}
