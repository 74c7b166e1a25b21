//! The tick-driven scheduler and read-only facade over one run
//! (`spec.md` §4.8 Scheduler, §4.10 Simulation Facade;
//! `original_source/model/simulation.hpp`, `simulation.cpp`).
//!
//! # Concurrency
//!
//! The source guards `Simulation` with a re-entrant lock so GUI callbacks
//! invoked mid-tick can safely re-enter read accessors. Rust's `&mut self`
//! exclusive-borrow rule gives the same guarantee for free: [`Simulation`]
//! exposes tick advancement through `&mut self` and every read accessor
//! through `&self`, so the type system — not a runtime mutex — prevents a
//! caller from mutating the population while an observer is reading it.

use glam::Vec3;

use escape_action::{StressAccumulator, TickView};
use escape_agent::{integrate_motion, AgentRngs, PredatorPopulation, PreyPopulation, StateInfo};
use escape_core::{AgentId, FlightState, HeadSystem, SimClock, SimConfig, Tick};
use escape_group::GroupTracker;
use escape_spatial::NeighborMatrix;
use escape_state::{step_predator, step_prey, PredatorStatePackage, PreyStatePackage};

use crate::observer::{ObserverChain, SimObserver};

/// A snapshot of the fields [`TickView`] is allowed to read, cloned once at
/// the top of each tick so the state/action passes can hold it immutably
/// while the rest of the tick mutates the live populations. See the module
/// docs on `escape-action::view` for why this can't simply borrow the live
/// population instead.
struct Snapshot {
    prey_pos: Vec<Vec3>,
    prey_dir: Vec<Vec3>,
    prey_speed: Vec<f32>,
    prey_stress: Vec<f32>,
    prey_state: Vec<StateInfo>,
    prey_head: Vec<HeadSystem>,
    prey_prev_exit_dir: Vec<Vec3>,

    pred_pos: Vec<Vec3>,
    pred_dir: Vec<Vec3>,
    pred_speed: Vec<f32>,
    pred_stress: Vec<f32>,
    pred_state: Vec<StateInfo>,
    pred_head: Vec<HeadSystem>,
    pred_target: Vec<Option<AgentId>>,
}

impl Snapshot {
    fn capture(prey: &PreyPopulation, pred: &PredatorPopulation) -> Self {
        Snapshot {
            prey_pos: prey.pos.clone(),
            prey_dir: prey.dir.clone(),
            prey_speed: prey.speed.clone(),
            prey_stress: prey.stress.clone(),
            prey_state: prey.current_state.clone(),
            prey_head: prey.head.clone(),
            prey_prev_exit_dir: prey.prev_exit_dir.clone(),
            pred_pos: pred.pos.clone(),
            pred_dir: pred.dir.clone(),
            pred_speed: pred.speed.clone(),
            pred_stress: pred.stress.clone(),
            pred_state: pred.current_state.clone(),
            pred_head: pred.head.clone(),
            pred_target: pred.target.clone(),
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn view<'a>(
        &'a self,
        tick: Tick,
        dt: f32,
        prey_prey: &'a NeighborMatrix,
        prey_pred: &'a NeighborMatrix,
        pred_prey: &'a NeighborMatrix,
        pred_pred: &'a NeighborMatrix,
        prey_groups: &'a GroupTracker,
        pred_groups: &'a GroupTracker,
    ) -> TickView<'a> {
        TickView {
            tick,
            dt,
            prey_pos: &self.prey_pos,
            prey_dir: &self.prey_dir,
            prey_speed: &self.prey_speed,
            prey_stress: &self.prey_stress,
            prey_state: &self.prey_state,
            prey_head: &self.prey_head,
            prey_prev_exit_dir: &self.prey_prev_exit_dir,
            pred_pos: &self.pred_pos,
            pred_dir: &self.pred_dir,
            pred_speed: &self.pred_speed,
            pred_stress: &self.pred_stress,
            pred_state: &self.pred_state,
            pred_head: &self.pred_head,
            pred_target: &self.pred_target,
            prey_prey,
            prey_pred,
            pred_prey,
            pred_pred,
            prey_groups,
            pred_groups,
        }
    }
}

/// An owned reading of one agent's post-integration kinematics, handed to
/// [`HeadSystem::update`] so the call doesn't need to borrow the whole
/// population (`pop.head[idx]` is already borrowed mutably at that point).
struct FlightSnapshot {
    pos: Vec3,
    dir: Vec3,
    speed: f32,
    body_mass: f32,
    cruise_speed: f32,
    beta_in: f32,
}

impl FlightState for FlightSnapshot {
    fn pos(&self) -> Vec3 {
        self.pos
    }
    fn dir(&self) -> Vec3 {
        self.dir
    }
    fn speed(&self) -> f32 {
        self.speed
    }
    fn body_mass(&self) -> f32 {
        self.body_mass
    }
    fn cruise_speed(&self) -> f32 {
        self.cruise_speed
    }
    fn beta_in(&self) -> f32 {
        self.beta_in
    }
}

/// Sequential fallback: one agent at a time, in index order.
#[cfg(not(feature = "parallel"))]
fn integrate_prey(pop: &mut PreyPopulation, dt: f32) {
    let PreyPopulation { pos, dir, speed, accel, steering, ai, sa, head, .. } = pop;
    for i in 0..pos.len() {
        integrate_motion(&mut pos[i], &mut dir[i], &mut speed[i], &mut accel[i], &mut steering[i], &ai[i], &sa[i], dt);
        let snap = FlightSnapshot {
            pos: pos[i],
            dir: dir[i],
            speed: speed[i],
            body_mass: ai[i].body_mass,
            cruise_speed: sa[i].cruise_speed,
            beta_in: ai[i].beta_in,
        };
        head[i].update(&snap, dt);
    }
}

/// Parallel fast path (`parallel` feature): each agent only ever reads or
/// writes its own row across these eight equal-length `Vec`s, so zipping
/// them into one indexed parallel iterator splits the work across Rayon's
/// pool without any unsafe aliasing — the borrow checker enforces the same
/// disjoint-row guarantee the sequential version relies on by convention.
#[cfg(feature = "parallel")]
fn integrate_prey(pop: &mut PreyPopulation, dt: f32) {
    use rayon::prelude::*;
    let PreyPopulation { pos, dir, speed, accel, steering, ai, sa, head, .. } = pop;
    pos.par_iter_mut()
        .zip(dir.par_iter_mut())
        .zip(speed.par_iter_mut())
        .zip(accel.par_iter_mut())
        .zip(steering.par_iter_mut())
        .zip(ai.par_iter())
        .zip(sa.par_iter())
        .zip(head.par_iter_mut())
        .for_each(|(((((((pos, dir), speed), accel), steering), ai), sa), head)| {
            integrate_motion(pos, dir, speed, accel, steering, ai, sa, dt);
            let snap = FlightSnapshot {
                pos: *pos,
                dir: *dir,
                speed: *speed,
                body_mass: ai.body_mass,
                cruise_speed: sa.cruise_speed,
                beta_in: ai.beta_in,
            };
            head.update(&snap, dt);
        });
}

#[cfg(not(feature = "parallel"))]
fn integrate_predators(pop: &mut PredatorPopulation, dt: f32) {
    let PredatorPopulation { pos, dir, speed, accel, steering, ai, sa, head, .. } = pop;
    for i in 0..pos.len() {
        integrate_motion(&mut pos[i], &mut dir[i], &mut speed[i], &mut accel[i], &mut steering[i], &ai[i], &sa[i], dt);
        let snap = FlightSnapshot {
            pos: pos[i],
            dir: dir[i],
            speed: speed[i],
            body_mass: ai[i].body_mass,
            cruise_speed: sa[i].cruise_speed,
            beta_in: ai[i].beta_in,
        };
        head[i].update(&snap, dt);
    }
}

#[cfg(feature = "parallel")]
fn integrate_predators(pop: &mut PredatorPopulation, dt: f32) {
    use rayon::prelude::*;
    let PredatorPopulation { pos, dir, speed, accel, steering, ai, sa, head, .. } = pop;
    pos.par_iter_mut()
        .zip(dir.par_iter_mut())
        .zip(speed.par_iter_mut())
        .zip(accel.par_iter_mut())
        .zip(steering.par_iter_mut())
        .zip(ai.par_iter())
        .zip(sa.par_iter())
        .zip(head.par_iter_mut())
        .for_each(|(((((((pos, dir), speed), accel), steering), ai), sa), head)| {
            integrate_motion(pos, dir, speed, accel, steering, ai, sa, dt);
            let snap = FlightSnapshot {
                pos: *pos,
                dir: *dir,
                speed: *speed,
                body_mass: ai.body_mass,
                cruise_speed: sa.cruise_speed,
                beta_in: ai.beta_in,
            };
            head.update(&snap, dt);
        });
}

/// A running collective-escape flight simulation: two populations, their
/// state/transition packages, the spatial indices rebuilt every tick, and
/// the group trackers reclustered on a slower interval.
pub struct Simulation {
    config: SimConfig,
    clock: SimClock,

    prey: PreyPopulation,
    pred: PredatorPopulation,

    prey_rngs: AgentRngs,
    pred_rngs: AgentRngs,

    prey_pkg: PreyStatePackage,
    pred_pkg: PredatorStatePackage,

    prey_stress: Option<StressAccumulator>,
    pred_stress: Option<StressAccumulator>,

    prey_prey: NeighborMatrix,
    prey_pred: NeighborMatrix,
    pred_prey: NeighborMatrix,
    pred_pred: NeighborMatrix,

    prey_groups: GroupTracker,
    pred_groups: GroupTracker,
    group_next_update: Tick,

    observers: ObserverChain,
    terminated: bool,
}

impl Simulation {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        config: SimConfig,
        prey: PreyPopulation,
        pred: PredatorPopulation,
        prey_rngs: AgentRngs,
        pred_rngs: AgentRngs,
        prey_pkg: PreyStatePackage,
        pred_pkg: PredatorStatePackage,
        prey_stress: Option<StressAccumulator>,
        pred_stress: Option<StressAccumulator>,
        observers: ObserverChain,
    ) -> Self {
        let clock = config.make_clock();
        let group_next_update = Tick::ZERO + config.group_interval_ticks();

        let mut sim = Simulation {
            clock,
            prey_prey: NeighborMatrix::empty(prey.count),
            prey_pred: NeighborMatrix::empty(prey.count),
            pred_prey: NeighborMatrix::empty(pred.count),
            pred_pred: NeighborMatrix::empty(pred.count),
            prey_groups: GroupTracker::new(),
            pred_groups: GroupTracker::new(),
            group_next_update,
            prey,
            pred,
            prey_rngs,
            pred_rngs,
            prey_pkg,
            pred_pkg,
            prey_stress,
            pred_stress,
            config,
            observers,
            terminated: false,
        };

        sim.refresh_neighbors();
        sim.recompute_groups();
        log::info!(
            "simulation initialized: {} prey, {} predators, dt={}, total_ticks={}",
            sim.prey.count,
            sim.pred.count,
            sim.config.dt,
            sim.config.total_ticks,
        );
        let mut observers = std::mem::take(&mut sim.observers);
        observers.on_initialized(&sim);
        sim.observers = observers;
        sim
    }

    fn refresh_neighbors(&mut self) {
        self.prey_prey = NeighborMatrix::rebuild(&self.prey.pos, &self.prey.pos);
        self.prey_pred = NeighborMatrix::rebuild(&self.prey.pos, &self.pred.pos);
        self.pred_prey = NeighborMatrix::rebuild(&self.pred.pos, &self.prey.pos);
        self.pred_pred = NeighborMatrix::rebuild(&self.pred.pos, &self.pred.pos);
    }

    fn recompute_groups(&mut self) {
        self.prey_groups.prepare(self.prey.count);
        for i in 0..self.prey.count {
            let agent = AgentId::try_from(i).expect("population fits u32");
            self.prey_groups.feed(agent, self.prey.pos[i], self.prey.dir[i] * self.prey.speed[i]);
        }
        self.prey_groups.cluster(self.config.group_detection.threshold2);

        self.pred_groups.prepare(self.pred.count);
        for i in 0..self.pred.count {
            let agent = AgentId::try_from(i).expect("population fits u32");
            self.pred_groups.feed(agent, self.pred.pos[i], self.pred.dir[i] * self.pred.speed[i]);
        }
        self.pred_groups.cluster(self.config.group_detection.threshold2);
    }

    /// Run until `config.total_ticks` or [`Simulation::terminate`] is
    /// observed, whichever comes first.
    pub fn run(&mut self) {
        log::info!("run starting at {}, ending at tick {}", self.clock, self.config.end_tick());
        while !self.terminated && self.clock.current_tick < self.config.end_tick() {
            self.step();
        }
        log::info!(
            "run finished at {} ({})",
            self.clock,
            if self.terminated { "terminated" } else { "Tmax reached" },
        );
        let mut observers = std::mem::take(&mut self.observers);
        observers.on_finished(self);
        self.observers = observers;
    }

    /// Advance the simulation by exactly one tick, per `spec.md` §4.8:
    ///
    /// `PreTick notify -> neighbor refresh -> state step (due agents) ->
    /// stress integrate -> flight integrate -> group track/cluster ->
    /// tick advance -> Tick notify`.
    pub fn step(&mut self) {
        log::trace!("PreTick {}", self.clock.current_tick);
        let mut observers = std::mem::take(&mut self.observers);
        observers.on_pre_tick(self);
        self.observers = observers;

        self.refresh_neighbors();

        let snapshot = Snapshot::capture(&self.prey, &self.pred);
        let tick = self.clock.current_tick;
        let dt = self.clock.dt;
        let view = snapshot.view(tick, dt, &self.prey_prey, &self.prey_pred, &self.pred_prey, &self.pred_pred, &self.prey_groups, &self.pred_groups);

        for i in 0..self.prey.count {
            if tick.0 >= self.prey.last_update[i].0 + self.prey.reaction_time[i] as u64 {
                let agent = AgentId::try_from(i).expect("population fits u32");
                self.prey.steering[i] = Vec3::ZERO;
                step_prey(&self.prey_pkg, agent, tick, &view, &mut self.prey, self.prey_rngs.get_mut(agent));
            }
        }
        for i in 0..self.pred.count {
            if tick.0 >= self.pred.last_update[i].0 + self.pred.reaction_time[i] as u64 {
                let agent = AgentId::try_from(i).expect("population fits u32");
                self.pred.steering[i] = Vec3::ZERO;
                step_predator(&self.pred_pkg, agent, tick, &view, &mut self.pred, self.pred_rngs.get_mut(agent));
            }
        }

        if let Some(acc) = &self.prey_stress {
            for i in 0..self.prey.count {
                let agent = AgentId::try_from(i).expect("population fits u32");
                acc.apply(agent, &view, &mut self.prey.stress[i], dt);
            }
        }
        if let Some(acc) = &self.pred_stress {
            for i in 0..self.pred.count {
                let agent = AgentId::try_from(i).expect("population fits u32");
                acc.apply(agent, &view, &mut self.pred.stress[i], dt);
            }
        }

        drop(view);
        drop(snapshot);

        integrate_prey(&mut self.prey, dt);
        integrate_predators(&mut self.pred, dt);

        self.prey_groups.prepare(self.prey.count);
        for i in 0..self.prey.count {
            let agent = AgentId::try_from(i).expect("population fits u32");
            self.prey_groups.feed(agent, self.prey.pos[i], self.prey.dir[i] * self.prey.speed[i]);
        }
        self.pred_groups.prepare(self.pred.count);
        for i in 0..self.pred.count {
            let agent = AgentId::try_from(i).expect("population fits u32");
            self.pred_groups.feed(agent, self.pred.pos[i], self.pred.dir[i] * self.pred.speed[i]);
        }

        self.prey_groups.track(dt);
        self.pred_groups.track(dt);

        if tick >= self.group_next_update {
            self.prey_groups.cluster(self.config.group_detection.threshold2);
            self.pred_groups.cluster(self.config.group_detection.threshold2);
            self.group_next_update = self.group_next_update + self.config.group_interval_ticks();
            log::debug!(
                "group re-cluster at {}: {} prey groups, {} predator groups",
                tick,
                self.prey_groups.groups().len(),
                self.pred_groups.groups().len(),
            );
        }

        self.clock.advance();

        log::trace!("Tick {} complete", tick);
        let mut observers = std::mem::take(&mut self.observers);
        observers.on_tick(self);
        self.observers = observers;
    }

    /// Request cooperative termination; checked at the top of
    /// [`Simulation::run`]'s loop condition, so the current tick (if any)
    /// always finishes.
    pub fn terminate(&mut self) {
        self.terminated = true;
    }

    pub fn terminated(&self) -> bool {
        self.terminated
    }

    // ── Read-only facade ───────────────────────────────────────────────

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn clock(&self) -> &SimClock {
        &self.clock
    }

    pub fn tick(&self) -> Tick {
        self.clock.current_tick
    }

    pub fn prey(&self) -> &PreyPopulation {
        &self.prey
    }

    pub fn predators(&self) -> &PredatorPopulation {
        &self.pred
    }

    /// Replace positions/headings for every prey agent in one call
    /// (`GUI::set_instances` in the source). Extra or missing rows beyond
    /// the current population size are ignored — use
    /// [`crate::builder::SimulationBuilder`] to change population size.
    pub fn set_prey_instances(&mut self, positions: &[Vec3], directions: &[Vec3]) {
        for i in 0..self.prey.count.min(positions.len()).min(directions.len()) {
            self.prey.place(i, positions[i], directions[i]);
        }
    }

    pub fn set_predator_instances(&mut self, positions: &[Vec3], directions: &[Vec3]) {
        for i in 0..self.pred.count.min(positions.len()).min(directions.len()) {
            self.pred.place(i, positions[i], directions[i]);
        }
    }

    pub fn prey_prey_neighbors(&self) -> &NeighborMatrix {
        &self.prey_prey
    }

    pub fn prey_pred_neighbors(&self) -> &NeighborMatrix {
        &self.prey_pred
    }

    pub fn pred_prey_neighbors(&self) -> &NeighborMatrix {
        &self.pred_prey
    }

    pub fn pred_pred_neighbors(&self) -> &NeighborMatrix {
        &self.pred_pred
    }

    pub fn prey_groups(&self) -> &GroupTracker {
        &self.prey_groups
    }

    pub fn pred_groups(&self) -> &GroupTracker {
        &self.pred_groups
    }

    /// Visit every prey agent's `(position, heading, speed)` — the minimal
    /// read needed by a renderer or a recording observer, without handing
    /// out the whole population.
    pub fn visit_prey(&self, mut f: impl FnMut(AgentId, Vec3, Vec3, f32)) {
        for i in 0..self.prey.count {
            f(AgentId::try_from(i).expect("population fits u32"), self.prey.pos[i], self.prey.dir[i], self.prey.speed[i]);
        }
    }

    pub fn visit_predators(&self, mut f: impl FnMut(AgentId, Vec3, Vec3, f32)) {
        for i in 0..self.pred.count {
            f(AgentId::try_from(i).expect("population fits u32"), self.pred.pos[i], self.pred.dir[i], self.pred.speed[i]);
        }
    }

    // ── Diagnostic colorings (`spec.md` §6, analysis/GUI color channels) ──

    pub fn color_speed_prey(&self) -> &[f32] {
        &self.prey.speed
    }

    pub fn color_speed_pred(&self) -> &[f32] {
        &self.pred.speed
    }

    pub fn color_stress_prey(&self) -> &[f32] {
        &self.prey.stress
    }

    pub fn color_stress_pred(&self) -> &[f32] {
        &self.pred.stress
    }

    pub fn color_state_prey(&self) -> Vec<usize> {
        self.prey.current_state.iter().map(|s| s.state()).collect()
    }

    pub fn color_state_pred(&self) -> Vec<usize> {
        self.pred.current_state.iter().map(|s| s.state()).collect()
    }

    pub fn color_banking_prey(&self) -> Vec<f32> {
        self.prey.head.iter().map(HeadSystem::beta).collect()
    }

    pub fn color_banking_pred(&self) -> Vec<f32> {
        self.pred.head.iter().map(HeadSystem::beta).collect()
    }

    /// Squared distance to each prey's nearest other prey; `f32::MAX` for a
    /// lone agent with no other prey in the population.
    pub fn color_nearest_neighbor2_prey(&self) -> Vec<f32> {
        (0..self.prey.count)
            .map(|i| {
                let agent = AgentId::try_from(i).expect("population fits u32");
                self.prey_prey.row(agent).nearest().map(|n| n.dist2).unwrap_or(f32::MAX)
            })
            .collect()
    }
}
