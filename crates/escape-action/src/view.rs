//! The read-only per-tick snapshot actions query (`Simulation::sorted_view`,
//! `original_source/model/simulation.hpp`).
//!
//! `TickView` borrows only the fields an action is allowed to *read*:
//! kinematics, per-agent scalar state, and the neighbor/group indices
//! rebuilt at the top of the tick. The fields an action package *writes*
//! (`steering`, `target`, `copied_state`, ...) are handed to it separately
//! as a small `*ActionCtx` borrow, disjoint from the slices held here — the
//! scheduler constructs both by destructuring a population's fields
//! directly, so the borrow checker sees them as non-overlapping without any
//! unsafe aliasing.

use glam::Vec3;

use escape_agent::StateInfo;
use escape_core::{AgentId, HeadSystem, Tick};
use escape_group::GroupTracker;
use escape_spatial::{NeighborMatrix, NeighborRow};

pub struct TickView<'a> {
    pub tick: Tick,
    pub dt: f32,

    pub prey_pos: &'a [Vec3],
    pub prey_dir: &'a [Vec3],
    pub prey_speed: &'a [f32],
    pub prey_stress: &'a [f32],
    pub prey_state: &'a [StateInfo],
    pub prey_head: &'a [HeadSystem],
    /// Heading remembered at the agent's last state exit; fixed between
    /// exits, so `align_direction` can read it fresh every tick instead of
    /// caching a copy at entry.
    pub prey_prev_exit_dir: &'a [Vec3],

    pub pred_pos: &'a [Vec3],
    pub pred_dir: &'a [Vec3],
    pub pred_speed: &'a [f32],
    pub pred_stress: &'a [f32],
    pub pred_state: &'a [StateInfo],
    pub pred_head: &'a [HeadSystem],
    pub pred_target: &'a [Option<AgentId>],

    /// Prey observing other prey.
    pub prey_prey: &'a NeighborMatrix,
    /// Prey observing predators.
    pub prey_pred: &'a NeighborMatrix,
    /// Predators observing prey.
    pub pred_prey: &'a NeighborMatrix,
    /// Predators observing other predators.
    pub pred_pred: &'a NeighborMatrix,

    pub prey_groups: &'a GroupTracker,
    pub pred_groups: &'a GroupTracker,
}

impl<'a> TickView<'a> {
    #[inline]
    pub fn prey_prey_row(&self, of: AgentId) -> &NeighborRow {
        self.prey_prey.row(of)
    }

    #[inline]
    pub fn prey_pred_row(&self, of: AgentId) -> &NeighborRow {
        self.prey_pred.row(of)
    }

    #[inline]
    pub fn pred_prey_row(&self, of: AgentId) -> &NeighborRow {
        self.pred_prey.row(of)
    }

    #[inline]
    pub fn pred_pred_row(&self, of: AgentId) -> &NeighborRow {
        self.pred_pred.row(of)
    }
}
