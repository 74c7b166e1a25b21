//! Prey population storage (`original_source/model/agents/prey.hpp`, `prey.cpp`).
//!
//! Structure-of-Arrays: every field is a `Vec` of length `count`, indexed by
//! `AgentId::index()`. `escape-state` and `escape-action` read and write
//! these fields directly rather than through per-agent methods — there is
//! no behavior on this type beyond construction and the tiny [`FlightState`]
//! adapter needed to drive [`HeadSystem::update`].

use glam::Vec3;

use escape_core::{AgentId, FlightState, HeadSystem, Tick};

use crate::aero::{AeroInfo, StateAero};
use crate::state_info::StateInfo;

/// All prey agents' state, column-major.
pub struct PreyPopulation {
    pub count: usize,

    pub pos: Vec<Vec3>,
    pub dir: Vec<Vec3>,
    pub head: Vec<HeadSystem>,
    pub speed: Vec<f32>,
    pub accel: Vec<Vec3>,

    /// Tick at which this agent's state machine is next due to `resume`
    /// (`reaction_time` added to `last_update` at the end of the last
    /// `update`).
    pub reaction_time: Vec<f32>,
    pub last_update: Vec<Tick>,

    /// Social/predator-driven arousal in `[0, +inf)`, read by the
    /// stress-dependent transition interpolator and by the escape states'
    /// duration/turn-rate sampling.
    pub stress: Vec<f32>,

    /// Net force accumulated this tick by the active action package;
    /// cleared at the start of every `update` and consumed by
    /// [`crate::flight::integrate_motion`].
    pub steering: Vec<Vec3>,

    pub current_state: Vec<StateInfo>,
    /// Set whenever `current_state` changes and cleared once `escape-state`
    /// has run the new state's `on_entry` pass; lets the state machine
    /// distinguish an entry call from a plain resume without having to
    /// infer it from `exit_tick`.
    pub state_entered: Vec<bool>,
    /// The state to adopt on next exit if a neighbor's copy-escape channel
    /// fires (`copy_escape` action); reset to `current_state` every time
    /// the agent exits a state, so "no copy this cycle" is simply
    /// `copied_state.state() == current_state.state()`.
    pub copied_state: Vec<StateInfo>,
    /// Heading at the moment of the last state exit, read by escape
    /// entry conditions that compare against the pre-escape course.
    pub prev_exit_dir: Vec<Vec3>,
    /// Small per-agent scratch vector a few actions (`random_t_turn_gamma_pred`,
    /// `dive`) stash entry-time values into (turn radius/side, dive
    /// altitude) so they can be reread on every subsequent `apply` without
    /// adding a dedicated field per action.
    pub scratch: Vec<Vec3>,

    /// Per-agent aerodynamic constants (species-uniform in every shipped
    /// config, but stored per-agent as in the source to allow per-individual
    /// variance without a storage-layout change).
    pub ai: Vec<AeroInfo>,
    /// The *active state's* aerodynamic parameters, refreshed whenever the
    /// agent enters a new state.
    pub sa: Vec<StateAero>,
}

impl PreyPopulation {
    pub fn new(count: usize, ai: AeroInfo) -> Self {
        PreyPopulation {
            count,
            pos: vec![Vec3::ZERO; count],
            dir: vec![Vec3::X; count],
            head: vec![HeadSystem::initialize(Vec3::ZERO, Vec3::X, ai.cruise_speed); count],
            speed: vec![ai.cruise_speed; count],
            accel: vec![Vec3::ZERO; count],
            reaction_time: vec![0.0; count],
            last_update: vec![Tick::ZERO; count],
            stress: vec![0.0; count],
            steering: vec![Vec3::ZERO; count],
            current_state: vec![StateInfo::default(); count],
            state_entered: vec![true; count],
            copied_state: vec![StateInfo::default(); count],
            prev_exit_dir: vec![Vec3::X; count],
            scratch: vec![Vec3::ZERO; count],
            ai: vec![ai; count],
            sa: vec![
                StateAero {
                    cruise_speed: ai.cruise_speed,
                    w: ai.w
                };
                count
            ],
        }
    }

    pub fn agent_ids(&self) -> impl Iterator<Item = AgentId> + '_ {
        (0..self.count as u32).map(AgentId)
    }

    /// Place agent `i` at `(pos, dir)`, re-initializing its body frame and
    /// resetting its scheduled reaction.
    pub fn place(&mut self, i: usize, pos: Vec3, dir: Vec3) {
        self.pos[i] = pos;
        self.dir[i] = dir;
        self.head[i] = HeadSystem::initialize(pos, dir, self.speed[i]);
        self.prev_exit_dir[i] = dir;
    }

    pub fn flight_view(&self, i: usize) -> PreyFlightView<'_> {
        PreyFlightView { pop: self, i }
    }
}

/// Adapter implementing [`FlightState`] by borrowing one agent's row,
/// needed because [`HeadSystem::update`] is generic over that trait rather
/// than over the SoA storage directly.
pub struct PreyFlightView<'a> {
    pop: &'a PreyPopulation,
    i: usize,
}

impl FlightState for PreyFlightView<'_> {
    fn pos(&self) -> Vec3 {
        self.pop.pos[self.i]
    }
    fn dir(&self) -> Vec3 {
        self.pop.dir[self.i]
    }
    fn speed(&self) -> f32 {
        self.pop.speed[self.i]
    }
    fn body_mass(&self) -> f32 {
        self.pop.ai[self.i].body_mass
    }
    fn cruise_speed(&self) -> f32 {
        self.pop.sa[self.i].cruise_speed
    }
    fn beta_in(&self) -> f32 {
        self.pop.ai[self.i].beta_in
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn aero() -> AeroInfo {
        AeroInfo {
            beta_in: 1.0,
            body_mass: 0.2,
            cruise_speed: 12.0,
            min_speed: 6.0,
            max_speed: 20.0,
            w: 0.5,
        }
    }

    #[test]
    fn new_population_has_uniform_initial_state() {
        let pop = PreyPopulation::new(5, aero());
        assert_eq!(pop.count, 5);
        assert_eq!(pop.speed.len(), 5);
        assert_eq!(pop.speed[3], 12.0);
        assert_eq!(pop.current_state[0], StateInfo::default());
    }

    #[test]
    fn place_updates_frame_and_prev_exit_dir() {
        let mut pop = PreyPopulation::new(1, aero());
        pop.place(0, Vec3::new(1.0, 2.0, 3.0), Vec3::Z);
        assert_eq!(pop.pos[0], Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(pop.prev_exit_dir[0], Vec3::Z);
        assert_eq!(pop.head[0].forward(), Vec3::Z);
    }

    #[test]
    fn flight_view_reads_through_to_population() {
        let pop = PreyPopulation::new(2, aero());
        let view = pop.flight_view(1);
        assert_eq!(view.cruise_speed(), 12.0);
        assert_eq!(view.body_mass(), 0.2);
    }
}
