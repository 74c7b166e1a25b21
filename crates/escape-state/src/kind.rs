//! The shape a state definition can take (`original_source/model/states/*.hpp`'s
//! `transient_state` / `persistent_state` / `multi_state` base classes).

use escape_core::AgentRng;

/// How a state's lifetime and re-evaluation schedule behave.
#[derive(Clone, Debug)]
pub enum StateKind {
    /// Runs its actions once on entry, then transitions immediately.
    Transient,
    /// Runs its actions every `tr` ticks until `duration` ticks have
    /// elapsed since entry, then transitions.
    Persistent { duration: f32 },
    /// Delegates to one of `substates` (indices into the owning package's
    /// state list), chosen at entry; the whole multi-state exits only when
    /// the chosen sub-state exits.
    MultiState { substates: Vec<usize> },
}

/// Sample a discrete index from `weights`, treating an all-zero or empty
/// slice as uniform over its length. Mirrors
/// [`crate::transitions::TransitionMatrix::sample`]'s fallback rule, reused
/// here for multi-state sub-state selection.
pub fn sample_weighted(weights: &[f32], rng: &mut AgentRng) -> usize {
    debug_assert!(!weights.is_empty());
    let total: f32 = weights.iter().sum();
    if total <= 0.0 {
        return rng.gen_range(0..weights.len());
    }
    let mut x = rng.gen_range(0.0..total);
    for (i, &w) in weights.iter().enumerate() {
        if x < w {
            return i;
        }
        x -= w;
    }
    weights.len() - 1
}

#[cfg(test)]
mod tests {
    use super::*;
    use escape_core::AgentId;

    #[test]
    fn uniform_fallback_on_all_zero_weights() {
        let mut rng = AgentRng::new(1, AgentId(0));
        let mut counts = [0u32; 4];
        for _ in 0..2000 {
            counts[sample_weighted(&[0.0; 4], &mut rng)] += 1;
        }
        assert!(counts.iter().all(|&c| c > 300 && c < 700));
    }
}
