//! Action primitive contract (`model/actions/*.hpp`'s `operator()(Agent&)
//! const` pattern, and the shared `action_base` they all derive from).
//!
//! Actions are stateless functors parameterized by config constants set at
//! construction (`align_n(J)`, `escape::dive(max_dive_angle, ...)`); the
//! per-agent mutable state they touch (`steering`, `target`, ...) lives in
//! the population, not in the action object, which is why `apply` takes
//! `&self` rather than `&mut self`.

use escape_core::{AgentId, AgentRng};

use crate::view::TickView;

/// The force accumulator and extra per-agent scratch a prey action package
/// is allowed to mutate this tick.
pub struct PreyActionCtx<'a> {
    pub steering: &'a mut glam::Vec3,
    /// The state to copy-escape into on next exit; only `copy_escape`
    /// writes this to something other than the agent's own current state.
    pub copied_state: &'a mut escape_agent::StateInfo,
    pub stress: &'a mut f32,
    /// Per-agent scratch a handful of actions use to remember an
    /// entry-time value (turn radius/side, dive altitude) across repeated
    /// `apply` calls within the same state.
    pub scratch: &'a mut glam::Vec3,
}

/// The force accumulator and extra per-agent scratch a predator action
/// package is allowed to mutate this tick.
pub struct PredatorActionCtx<'a> {
    pub steering: &'a mut glam::Vec3,
    pub target: &'a mut Option<AgentId>,
    pub state_timer: &'a mut f32,
    pub copy_duration: &'a mut f32,
    pub stress: &'a mut f32,
}

/// One weighted contribution to a prey's steering this tick.
pub trait PreyAction: Send + Sync {
    /// Run once, the tick a state owning this action is entered.
    fn on_entry(&self, _i: AgentId, _view: &TickView, _ctx: &mut PreyActionCtx) {}

    /// Score in `[0, 1]` used to rank candidate sibling states/sub-states
    /// when a multi-state selector samples which one to enter.
    fn assess_entry(&self, _i: AgentId, _view: &TickView) -> f32 {
        0.0
    }

    /// Add this action's contribution to `ctx.steering` (and any other
    /// scratch it owns) for agent `i`.
    fn apply(&self, i: AgentId, view: &TickView, ctx: &mut PreyActionCtx, rng: &mut AgentRng);
}

/// One weighted contribution to a predator's steering this tick.
pub trait PredatorAction: Send + Sync {
    fn on_entry(&self, _i: AgentId, _view: &TickView, _ctx: &mut PredatorActionCtx) {}

    fn assess_entry(&self, _i: AgentId, _view: &TickView) -> f32 {
        0.0
    }

    fn apply(&self, i: AgentId, view: &TickView, ctx: &mut PredatorActionCtx, rng: &mut AgentRng);
}
