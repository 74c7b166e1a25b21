//! Predator state-machine dispatch — same shape as [`crate::prey`], minus
//! the copy-escape channel (prey-only per `spec.md` §4.4) and sampling the
//! transition row at `x = 0` always, since predators carry no stress-driven
//! transition interpolation.

use escape_action::action::{PredatorAction, PredatorActionCtx};
use escape_action::view::TickView;
use escape_agent::{PredatorPopulation, StateAero, StateInfo};
use escape_core::{AgentId, AgentRng, Tick};

use crate::error::{StateError, StateResult};
use crate::kind::{sample_weighted, StateKind};
use crate::transitions::TransitionModel;

pub struct PredatorStateDef {
    pub name: String,
    pub copyable: bool,
    pub tr: u32,
    pub sai: Option<StateAero>,
    pub actions: Vec<Box<dyn PredatorAction>>,
    pub kind: StateKind,
}

pub struct PredatorStatePackage {
    pub states: Vec<PredatorStateDef>,
    pub transitions: TransitionModel,
}

impl PredatorStatePackage {
    pub fn new(states: Vec<PredatorStateDef>, transitions: TransitionModel) -> StateResult<Self> {
        if transitions.k() != states.len() {
            return Err(StateError::MatrixSizeMismatch { rows: transitions.k(), cols: transitions.k(), expected: states.len() });
        }
        for (idx, s) in states.iter().enumerate() {
            if let StateKind::MultiState { substates } = &s.kind {
                for &sub in substates {
                    if sub >= states.len() {
                        return Err(StateError::Config(format!("state {idx} sub-state index {sub} out of range")));
                    }
                }
            }
        }
        Ok(PredatorStatePackage { states, transitions })
    }

    fn resolve_leaf(&self, top: usize, sub: usize) -> usize {
        match &self.states[top].kind {
            StateKind::MultiState { substates } => substates[sub],
            _ => top,
        }
    }

    fn assess(&self, leaf: usize, i: AgentId, view: &TickView) -> f32 {
        self.states[leaf].actions.iter().map(|a| a.assess_entry(i, view)).fold(0.0, f32::max)
    }
}

pub fn step_predator(
    pkg: &PredatorStatePackage,
    i: AgentId,
    tick: Tick,
    view: &TickView,
    pop: &mut PredatorPopulation,
    rng: &mut AgentRng,
) -> u32 {
    let idx = i.index();

    for _ in 0..pkg.states.len() + 2 {
        let mut cs = pop.current_state[idx];

        if pop.state_entered[idx] {
            if let StateKind::MultiState { substates } = &pkg.states[cs.state()].kind {
                let weights: Vec<f32> = substates.iter().map(|&s| pkg.assess(s, i, view)).collect();
                cs = cs.with_sub_state(sample_weighted(&weights, rng));
                pop.current_state[idx] = cs;
            }
        }

        let leaf = pkg.resolve_leaf(cs.state(), cs.sub_state());
        let def = &pkg.states[leaf];

        if pop.state_entered[idx] && cs.is_copyable() != def.copyable {
            cs = cs.with_copyable(def.copyable);
            pop.current_state[idx] = cs;
        }

        {
            let mut ctx = PredatorActionCtx {
                steering: &mut pop.steering[idx],
                target: &mut pop.target[idx],
                state_timer: &mut pop.state_timer[idx],
                copy_duration: &mut pop.copy_duration[idx],
                stress: &mut pop.stress[idx],
            };

            if pop.state_entered[idx] {
                if let Some(sai) = &def.sai {
                    pop.sa[idx] = *sai;
                }
                for a in &def.actions {
                    a.on_entry(i, view, &mut ctx);
                    a.apply(i, view, &mut ctx, rng);
                }
            } else {
                for a in &def.actions {
                    a.apply(i, view, &mut ctx, rng);
                }
            }
        }

        if pop.state_entered[idx] {
            if let StateKind::Persistent { duration } = &def.kind {
                let exit = tick + (*duration).max(0.0) as u64;
                cs = cs.with_exit_tick(exit);
                pop.current_state[idx] = cs;
            }
            pop.state_entered[idx] = false;
        }

        let exits = match &def.kind {
            StateKind::Transient => true,
            StateKind::Persistent { .. } => tick >= cs.exit_tick(),
            StateKind::MultiState { .. } => unreachable!("resolve_leaf never returns a MultiState"),
        };

        if !exits {
            pop.reaction_time[idx] = def.tr as f32;
            pop.last_update[idx] = tick;
            return def.tr.max(1);
        }

        let tm = pkg.transitions.at(0.0);
        let next_state = tm.sample(cs.state(), rng);
        let next = StateInfo::new(next_state, 0, false, Tick::ZERO);
        pop.current_state[idx] = next;
        pop.state_entered[idx] = true;
    }

    pop.last_update[idx] = tick;
    1
}
