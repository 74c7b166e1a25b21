//! Predator population storage (`original_source/model/agents/predator.hpp`,
//! `predator.cpp`).
//!
//! Same structure-of-arrays shape as [`crate::prey::PreyPopulation`]; see
//! its module docs. The predator sentinel field `target` is typed
//! `Option<AgentId>` rather than replicating the source's `-1` sentinel in
//! an unsigned field, since Rust has a real "no value" type available.

use glam::Vec3;

use escape_core::{AgentId, FlightState, HeadSystem, Tick};

use crate::aero::{AeroInfo, StateAero};
use crate::state_info::StateInfo;

pub struct PredatorPopulation {
    pub count: usize,

    pub pos: Vec<Vec3>,
    pub dir: Vec<Vec3>,
    pub head: Vec<HeadSystem>,
    pub speed: Vec<f32>,
    pub accel: Vec<Vec3>,

    pub reaction_time: Vec<f32>,
    pub last_update: Vec<Tick>,

    /// Countdown timer read by persistent hunt states (`chase_closest_prey`,
    /// `hold_current`) to decide when to give up and transition.
    pub state_timer: Vec<f32>,
    /// How long a copy-escape propagation this predator triggers should
    /// last in observing prey, set when entering the attack state.
    pub copy_duration: Vec<f32>,

    pub steering: Vec<Vec3>,
    /// The prey currently being chased/attacked; `None` between hunts.
    pub target: Vec<Option<AgentId>>,

    /// Scalar threat level carried on the predator itself and read by
    /// prey's predator-distance stress source and avoidance actions —
    /// distinct from prey's `stress`, which accumulates from multiple
    /// sources; a predator's own `stress` here only ever reflects how
    /// committed it is to the current attack (set by the hunt states).
    pub stress: Vec<f32>,

    pub current_state: Vec<StateInfo>,
    /// See `PreyPopulation::state_entered`.
    pub state_entered: Vec<bool>,

    pub ai: Vec<AeroInfo>,
    pub sa: Vec<StateAero>,
}

impl PredatorPopulation {
    pub fn new(count: usize, ai: AeroInfo) -> Self {
        PredatorPopulation {
            count,
            pos: vec![Vec3::ZERO; count],
            dir: vec![Vec3::X; count],
            head: vec![HeadSystem::initialize(Vec3::ZERO, Vec3::X, ai.cruise_speed); count],
            speed: vec![ai.cruise_speed; count],
            accel: vec![Vec3::ZERO; count],
            reaction_time: vec![0.0; count],
            last_update: vec![Tick::ZERO; count],
            state_timer: vec![0.0; count],
            copy_duration: vec![0.0; count],
            steering: vec![Vec3::ZERO; count],
            target: vec![None; count],
            stress: vec![0.0; count],
            current_state: vec![StateInfo::default(); count],
            state_entered: vec![true; count],
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

    pub fn place(&mut self, i: usize, pos: Vec3, dir: Vec3) {
        self.pos[i] = pos;
        self.dir[i] = dir;
        self.head[i] = HeadSystem::initialize(pos, dir, self.speed[i]);
    }

    pub fn flight_view(&self, i: usize) -> PredatorFlightView<'_> {
        PredatorFlightView { pop: self, i }
    }
}

pub struct PredatorFlightView<'a> {
    pop: &'a PredatorPopulation,
    i: usize,
}

impl FlightState for PredatorFlightView<'_> {
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
            beta_in: 0.8,
            body_mass: 1.0,
            cruise_speed: 18.0,
            min_speed: 10.0,
            max_speed: 28.0,
            w: 0.4,
        }
    }

    #[test]
    fn new_population_has_no_target() {
        let pop = PredatorPopulation::new(3, aero());
        assert!(pop.target.iter().all(Option::is_none));
    }

    #[test]
    fn place_updates_position_and_frame() {
        let mut pop = PredatorPopulation::new(1, aero());
        pop.place(0, Vec3::new(5.0, 0.0, 0.0), Vec3::Z);
        assert_eq!(pop.pos[0], Vec3::new(5.0, 0.0, 0.0));
        assert_eq!(pop.head[0].forward(), Vec3::Z);
    }
}
