//! Per-agent RNG storage, kept separate from the population SoA structs.
//!
//! The state-update phase needs `&mut AgentRngs` (exclusive access to each
//! agent's RNG for stochastic transitions and escape-duration sampling)
//! alongside `&PreyPopulation`/`&PredatorPopulation` (shared reads of
//! position, stress, neighbor state). Keeping RNGs in their own struct lets
//! both borrows coexist:
//!
//! ```ignore
//! let rng = rngs.get_mut(agent);
//! let next = population.pos[agent.index()]; // fine: disjoint borrows
//! ```

use escape_core::{AgentId, AgentRng};

pub struct AgentRngs {
    inner: Vec<AgentRng>,
}

impl AgentRngs {
    pub fn new(count: usize, global_seed: u64) -> Self {
        let inner = (0..count as u32).map(|i| AgentRng::new(global_seed, AgentId(i))).collect();
        AgentRngs { inner }
    }

    #[inline]
    pub fn get_mut(&mut self, agent: AgentId) -> &mut AgentRng {
        &mut self.inner[agent.index()]
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Disjoint mutable borrows of several agents' RNGs at once, for the
    /// parallel per-agent state-update phase.
    ///
    /// # Precondition (enforced by caller)
    ///
    /// `agents` must contain no duplicates and every index must be in
    /// bounds. Both hold for the scheduler's per-tick due-agent lists,
    /// which are built from a single pass over `0..count`.
    pub fn get_many_mut(&mut self, agents: &[AgentId]) -> Vec<&mut AgentRng> {
        let ptr = self.inner.as_mut_ptr();
        // SAFETY: each `AgentId` in `agents` is unique and in-bounds (caller
        // invariant), so the pointers below alias disjoint elements.
        agents.iter().map(|a| unsafe { &mut *ptr.add(a.index()) }).collect()
    }
}
