//! Prey state-machine dispatch (`original_source/model/states/*.hpp`).

use escape_action::action::{PreyAction, PreyActionCtx};
use escape_action::view::TickView;
use escape_agent::{PreyPopulation, StateAero, StateInfo};
use escape_core::{AgentId, AgentRng, Tick};

use crate::error::{StateError, StateResult};
use crate::kind::{sample_weighted, StateKind};
use crate::transitions::TransitionModel;

/// One state a prey package can be in.
pub struct PreyStateDef {
    pub name: String,
    pub copyable: bool,
    /// Reaction period, in ticks, between re-evaluations while active.
    pub tr: u32,
    pub sai: Option<StateAero>,
    pub actions: Vec<Box<dyn PreyAction>>,
    pub kind: StateKind,
}

/// A compiled `States = {S0, ..., S(K-1)}` package and its transition model.
pub struct PreyStatePackage {
    pub states: Vec<PreyStateDef>,
    pub transitions: TransitionModel,
}

impl PreyStatePackage {
    pub fn new(states: Vec<PreyStateDef>, transitions: TransitionModel) -> StateResult<Self> {
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
        Ok(PreyStatePackage { states, transitions })
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

/// Advance agent `i`'s state machine one reaction step; returns the number
/// of ticks until it is next due.
///
/// Handles the whole entry/resume/exit cycle in one call, looping through
/// any chain of transient states and multi-state sub-selection "immediately"
/// per `spec.md` §4.4. The loop is capped so a misconfigured package with a
/// transient cycle and no reachable persistent state can't spin forever.
pub fn step_prey(pkg: &PreyStatePackage, i: AgentId, tick: Tick, view: &TickView, pop: &mut PreyPopulation, rng: &mut AgentRng) -> u32 {
    let idx = i.index();
    let mut entered_via_copy = false;

    for _ in 0..pkg.states.len() + 2 {
        let mut cs = pop.current_state[idx];

        // Multi-state sub-selection happens once, right after the parent
        // is entered, before the leaf's own on_entry runs. A copy-adopted
        // StateInfo already carries its sub_state, so skip re-selecting.
        if pop.state_entered[idx] && !entered_via_copy {
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
            let mut ctx = PreyActionCtx {
                steering: &mut pop.steering[idx],
                copied_state: &mut pop.copied_state[idx],
                stress: &mut pop.stress[idx],
                scratch: &mut pop.scratch[idx],
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
            // Persistent states compute their own exit tick on entry,
            // unless adopted wholesale via copy-escape, whose exit_tick
            // already carries the donor's value.
            if let StateKind::Persistent { duration } = &def.kind {
                if !entered_via_copy {
                    let exit = tick + (*duration).max(0.0) as u64;
                    cs = cs.with_exit_tick(exit);
                    pop.current_state[idx] = cs;
                }
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

        let (next, via_copy) = transition_exit(pkg, idx, cs, pop, rng);
        pop.prev_exit_dir[idx] = pop.dir[idx];
        pop.current_state[idx] = next;
        pop.copied_state[idx] = next;
        pop.state_entered[idx] = true;
        entered_via_copy = via_copy;
    }

    pop.last_update[idx] = tick;
    1
}

/// Step 1-3 of `spec.md` §4.4's "Transition at exit": copy-escape channel
/// first, else sample the stress-interpolated transition row. Returns the
/// new `StateInfo` and whether it was adopted via copy (so the caller skips
/// recomputing a fresh `exit_tick`).
fn transition_exit(pkg: &PreyStatePackage, idx: usize, old: StateInfo, pop: &PreyPopulation, rng: &mut AgentRng) -> (StateInfo, bool) {
    let copied = pop.copied_state[idx];
    if copied.state() != old.state() {
        return (copied, true);
    }
    let x = pop.stress[idx];
    let tm = pkg.transitions.at(x);
    let next_state = tm.sample(old.state(), rng);
    (StateInfo::new(next_state, 0, false, Tick::ZERO), false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transitions::TransitionMatrix;
    use escape_agent::AeroInfo;
    use escape_core::AgentRng;
    use escape_group::GroupTracker;
    use escape_spatial::NeighborMatrix;
    use glam::Vec3;

    struct PushForward;
    impl PreyAction for PushForward {
        fn apply(&self, _i: AgentId, _view: &TickView, ctx: &mut PreyActionCtx, _rng: &mut AgentRng) {
            *ctx.steering += Vec3::X;
        }
    }

    fn aero() -> AeroInfo {
        AeroInfo { beta_in: 1.0, body_mass: 0.2, cruise_speed: 10.0, min_speed: 5.0, max_speed: 15.0, w: 0.5 }
    }

    #[test]
    fn persistent_state_holds_for_its_duration_then_transitions() {
        let mut pop = PreyPopulation::new(1, aero());
        let states = vec![
            PreyStateDef {
                name: "cruise".into(),
                copyable: false,
                tr: 1,
                sai: None,
                actions: vec![Box::new(PushForward)],
                kind: StateKind::Persistent { duration: 3.0 },
            },
            PreyStateDef {
                name: "other".into(),
                copyable: false,
                tr: 1,
                sai: None,
                actions: vec![],
                kind: StateKind::Persistent { duration: 100.0 },
            },
        ];
        let tm = TransitionMatrix::new(2, vec![0.0, 1.0, 1.0, 0.0]).unwrap();
        let pkg = PreyStatePackage::new(states, TransitionModel::constant(tm)).unwrap();
        let mut rng = AgentRng::new(1, AgentId(0));

        let mut next_due = 0u64;
        for t in 0..4u64 {
            if t < next_due {
                continue;
            }
            let snapshot_pos = pop.pos.clone();
            let snapshot_dir = pop.dir.clone();
            let snapshot_speed = pop.speed.clone();
            let snapshot_stress = pop.stress.clone();
            let snapshot_state = pop.current_state.clone();
            let snapshot_head = pop.head.clone();
            let snapshot_prev_exit = pop.prev_exit_dir.clone();
            let empty: Vec<Vec3> = vec![];
            let prey_prey = NeighborMatrix::rebuild(&snapshot_pos, &snapshot_pos);
            let prey_pred = NeighborMatrix::rebuild(&snapshot_pos, &empty);
            let pred_prey = NeighborMatrix::rebuild(&empty, &snapshot_pos);
            let pred_pred = NeighborMatrix::rebuild(&empty, &empty);
            let v = TickView {
                tick: Tick(t),
                dt: 0.02,
                prey_pos: &snapshot_pos,
                prey_dir: &snapshot_dir,
                prey_speed: &snapshot_speed,
                prey_stress: &snapshot_stress,
                prey_state: &snapshot_state,
                prey_head: &snapshot_head,
                prey_prev_exit_dir: &snapshot_prev_exit,
                pred_pos: &empty,
                pred_dir: &empty,
                pred_speed: &[],
                pred_stress: &[],
                pred_state: &[],
                pred_head: &[],
                pred_target: &[],
                prey_prey: &prey_prey,
                prey_pred: &prey_pred,
                pred_prey: &pred_prey,
                pred_pred: &pred_pred,
                prey_groups: &GroupTracker::new(),
                pred_groups: &GroupTracker::new(),
            };
            next_due = t + step_prey(&pkg, AgentId(0), Tick(t), &v, &mut pop, &mut rng) as u64;
        }
        assert_eq!(pop.current_state[0].state(), 1, "should have transitioned off state 0 by tick 3");
    }

    #[test]
    fn copy_escape_channel_overrides_sampled_transition() {
        let mut pop = PreyPopulation::new(1, aero());
        pop.copied_state[0] = StateInfo::new(1, 0, true, Tick(50));
        let states = vec![
            PreyStateDef { name: "a".into(), copyable: false, tr: 1, sai: None, actions: vec![], kind: StateKind::Transient },
            PreyStateDef { name: "b".into(), copyable: true, tr: 1, sai: None, actions: vec![], kind: StateKind::Persistent { duration: 100.0 } },
        ];
        let tm = TransitionMatrix::identity(2);
        let pkg = PreyStatePackage::new(states, TransitionModel::constant(tm)).unwrap();
        let mut rng = AgentRng::new(2, AgentId(0));

        let snapshot_pos = pop.pos.clone();
        let snapshot_dir = pop.dir.clone();
        let snapshot_speed = pop.speed.clone();
        let snapshot_stress = pop.stress.clone();
        let snapshot_state = pop.current_state.clone();
        let snapshot_head = pop.head.clone();
        let snapshot_prev_exit = pop.prev_exit_dir.clone();
        let empty: Vec<Vec3> = vec![];
        let prey_prey = NeighborMatrix::rebuild(&snapshot_pos, &snapshot_pos);
        let prey_pred = NeighborMatrix::rebuild(&snapshot_pos, &empty);
        let pred_prey = NeighborMatrix::rebuild(&empty, &snapshot_pos);
        let pred_pred = NeighborMatrix::rebuild(&empty, &empty);
        let v = TickView {
            tick: Tick::ZERO,
            dt: 0.02,
            prey_pos: &snapshot_pos,
            prey_dir: &snapshot_dir,
            prey_speed: &snapshot_speed,
            prey_stress: &snapshot_stress,
            prey_state: &snapshot_state,
            prey_head: &snapshot_head,
            prey_prev_exit_dir: &snapshot_prev_exit,
            pred_pos: &empty,
            pred_dir: &empty,
            pred_speed: &[],
            pred_stress: &[],
            pred_state: &[],
            pred_head: &[],
            pred_target: &[],
            prey_prey: &prey_prey,
            prey_pred: &prey_pred,
            pred_prey: &pred_prey,
            pred_pred: &pred_pred,
            prey_groups: &GroupTracker::new(),
            pred_groups: &GroupTracker::new(),
        };
        step_prey(&pkg, AgentId(0), Tick::ZERO, &v, &mut pop, &mut rng);
        assert_eq!(pop.current_state[0].state(), 1);
        assert_eq!(pop.current_state[0].exit_tick(), Tick(50));
    }
}
