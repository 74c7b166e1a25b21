//! Fluent builder for constructing a [`Simulation`]
//! (`original_source/model/simulation.hpp::Simulation::init`).

use escape_action::StressAccumulator;
use escape_agent::csv_io::{load_predator_csv, load_prey_csv};
use escape_agent::{AeroInfo, AgentRngs, PredatorPopulation, PreyPopulation};
use escape_core::{AgentId, InitialConditions, SimConfig, Tick};
use escape_state::{PredatorStatePackage, PreyStatePackage};

use crate::error::{SimError, SimResult};
use crate::observer::{ObserverChain, SimObserver};
use crate::sim::Simulation;

/// Distinguishes the predator population's RNG stream from the prey
/// population's: both are seeded from the same `config.seed`, and without
/// this salt agent 0 of each species would draw an identical sequence
/// (`AgentRng::new` mixes in the agent index, which is 0 for both).
const PREDATOR_STREAM_SALT: u64 = 0x9e37_79b9_7f4a_7c15;

pub struct SimulationBuilder {
    config: SimConfig,
    prey_count: usize,
    pred_count: usize,
    prey_aero: AeroInfo,
    pred_aero: AeroInfo,
    prey_pkg: PreyStatePackage,
    pred_pkg: PredatorStatePackage,
    prey_init: InitialConditions,
    pred_init: InitialConditions,
    prey_stress: Option<StressAccumulator>,
    pred_stress: Option<StressAccumulator>,
    observers: ObserverChain,
}

impl SimulationBuilder {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        config: SimConfig,
        prey_count: usize,
        pred_count: usize,
        prey_aero: AeroInfo,
        pred_aero: AeroInfo,
        prey_pkg: PreyStatePackage,
        pred_pkg: PredatorStatePackage,
        prey_init: InitialConditions,
        pred_init: InitialConditions,
    ) -> Self {
        SimulationBuilder {
            config,
            prey_count,
            pred_count,
            prey_aero,
            pred_aero,
            prey_pkg,
            pred_pkg,
            prey_init,
            pred_init,
            prey_stress: None,
            pred_stress: None,
            observers: ObserverChain::new(),
        }
    }

    /// Install the per-tick stress source composer for prey (`Prey.stress`
    /// config section). Without one, prey stress never accumulates and only
    /// decays implicitly (stays at zero forever, since it starts at zero).
    pub fn prey_stress(mut self, accumulator: StressAccumulator) -> Self {
        self.prey_stress = Some(accumulator);
        self
    }

    pub fn pred_stress(mut self, accumulator: StressAccumulator) -> Self {
        self.pred_stress = Some(accumulator);
        self
    }

    pub fn observer(mut self, observer: Box<dyn SimObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    /// Replace the whole observer chain in one call (`escape_sim::config`'s
    /// config-driven loader builds one up front rather than pushing one at
    /// a time).
    pub fn observers(mut self, chain: ObserverChain) -> Self {
        self.observers = chain;
        self
    }

    pub fn build(self) -> SimResult<Simulation> {
        let mut prey = PreyPopulation::new(self.prey_count, self.prey_aero);
        let mut pred = PredatorPopulation::new(self.pred_count, self.pred_aero);

        let mut prey_rngs = AgentRngs::new(self.prey_count, self.config.seed);
        let mut pred_rngs = AgentRngs::new(self.pred_count, self.config.seed ^ PREDATOR_STREAM_SALT);

        place_prey(&mut prey, &self.prey_init, &mut prey_rngs)?;
        place_predators(&mut pred, &self.pred_init, &mut pred_rngs)?;

        stagger_reactions(self.prey_count, self.config.dt, &mut prey.reaction_time, &mut prey.last_update, &mut prey_rngs);
        stagger_reactions(self.pred_count, self.config.dt, &mut pred.reaction_time, &mut pred.last_update, &mut pred_rngs);

        Ok(Simulation::new(
            self.config,
            prey,
            pred,
            prey_rngs,
            pred_rngs,
            self.prey_pkg,
            self.pred_pkg,
            self.prey_stress,
            self.pred_stress,
            self.observers,
        ))
    }
}

/// Draw each agent's first due tick uniformly from `[0, 1/dt)` ticks
/// (`spec.md` §4.8), recorded as `last_update = 0, reaction_time = offset`
/// so the scheduler's `tick >= last_update + reaction_time` due check fires
/// at exactly that tick without a separate "first run" flag.
fn stagger_reactions(count: usize, dt: f32, reaction_time: &mut [f32], last_update: &mut [Tick], rngs: &mut AgentRngs) {
    let span = (1.0 / dt).ceil().max(1.0) as u64;
    for i in 0..count {
        let agent = AgentId::try_from(i).expect("population fits u32");
        let offset = rngs.get_mut(agent).gen_range(0..span);
        reaction_time[i] = offset as f32;
        last_update[i] = Tick::ZERO;
    }
}

fn place_prey(pop: &mut PreyPopulation, init: &InitialConditions, rngs: &mut AgentRngs) -> SimResult<()> {
    if let Some(path) = init.csv_path() {
        let rows = load_prey_csv(path).map_err(SimError::Core)?;
        check_row_count(&rows, pop.count, "prey initial-condition CSV")?;
        for (i, (pos, dir)) in rows.into_iter().enumerate() {
            pop.place(i, pos, dir);
        }
        return Ok(());
    }
    for i in 0..pop.count {
        let agent = AgentId::try_from(i).expect("population fits u32");
        let (pos, dir) = init.sample(rngs.get_mut(agent));
        pop.place(i, pos, dir);
    }
    Ok(())
}

fn place_predators(pop: &mut PredatorPopulation, init: &InitialConditions, rngs: &mut AgentRngs) -> SimResult<()> {
    if let Some(path) = init.csv_path() {
        let rows = load_predator_csv(path).map_err(SimError::Core)?;
        check_row_count(&rows, pop.count, "predator initial-condition CSV")?;
        for (i, (pos, dir)) in rows.into_iter().enumerate() {
            pop.place(i, pos, dir);
        }
        return Ok(());
    }
    for i in 0..pop.count {
        let agent = AgentId::try_from(i).expect("population fits u32");
        let (pos, dir) = init.sample(rngs.get_mut(agent));
        pop.place(i, pos, dir);
    }
    Ok(())
}

fn check_row_count<T>(rows: &[T], expected: usize, what: &'static str) -> SimResult<()> {
    if rows.len() != expected {
        return Err(SimError::AgentCountMismatch { expected, got: rows.len(), what });
    }
    Ok(())
}
