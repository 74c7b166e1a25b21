//! Stress sources (`original_source/model/stress/sources.hpp`).
//!
//! Each source returns an instantaneous level in `[0, 1]`; [`StressAccumulator`]
//! integrates the sum of a species' configured sources into an agent's
//! persistent `stress` field (`stress += dt * (sum(sources) - decay *
//! stress)`) rather than setting it directly, so the raw functions below
//! stay pure reads of the tick view.

use escape_core::AgentId;
use escape_spatial::{fov::in_fov, fov::while_topo};

use crate::view::TickView;

/// How aroused a prey is by the nearest predator in its forward cone.
///
/// `0` once the nearest in-FOV predator is at or beyond `far`; `1` once one
/// is at or inside `near`; smootherstep-blended in between. `0` if no
/// predator is in FOV at all.
pub fn predator_distance(prey: AgentId, view: &TickView, cos_half_fov: f32, near: f32, far: f32) -> f32 {
    let pos = view.prey_pos[prey.index()];
    let fwd = view.prey_head[prey.index()].forward();
    let row = view.prey_pred_row(prey).raw();

    let mut nearest2 = f32::INFINITY;
    for entry in row {
        let rel = entry.neighbor_pos - pos;
        if in_fov(fwd, rel, entry.dist2, cos_half_fov) && entry.dist2 < nearest2 {
            nearest2 = entry.dist2;
        }
    }
    if !nearest2.is_finite() {
        return 0.0;
    }
    let d = nearest2.sqrt();
    1.0 - escape_core::math::smootherstep(d, near, far)
}

/// Social contagion: the FOV-weighted average stress of up to `topo`
/// nearest same-species neighbors, scaled by `blend`.
pub fn neighbors_stress(prey: AgentId, view: &TickView, topo: usize, cos_half_fov: f32, blend: f32) -> f32 {
    let pos = view.prey_pos[prey.index()];
    let fwd = view.prey_head[prey.index()].forward();
    let row = view.prey_prey_row(prey).others();

    let mut total = 0.0f32;
    let mut count = 0u32;
    while_topo(row, topo, |entry| {
        let rel = entry.neighbor_pos - pos;
        if in_fov(fwd, rel, entry.dist2, cos_half_fov) {
            total += view.prey_stress[entry.idx.index()];
            count += 1;
            true
        } else {
            false
        }
    });
    if count == 0 {
        0.0
    } else {
        (total / count as f32) * blend
    }
}

/// One contribution to a prey's instantaneous stress level, composed by
/// [`StressAccumulator`]. Each source returns a level in `[0, 1]`, read
/// fresh every tick from the view — sources hold no state of their own.
pub trait StressSource: Send + Sync {
    fn level(&self, prey: AgentId, view: &TickView) -> f32;
}

/// [`predator_distance`] as a [`StressSource`].
pub struct PredatorDistanceSource {
    pub cos_half_fov: f32,
    pub near: f32,
    pub far: f32,
}

impl StressSource for PredatorDistanceSource {
    fn level(&self, prey: AgentId, view: &TickView) -> f32 {
        predator_distance(prey, view, self.cos_half_fov, self.near, self.far)
    }
}

/// [`neighbors_stress`] as a [`StressSource`].
pub struct NeighborsStressSource {
    pub topo: usize,
    pub cos_half_fov: f32,
    pub blend: f32,
}

impl StressSource for NeighborsStressSource {
    fn level(&self, prey: AgentId, view: &TickView) -> f32 {
        neighbors_stress(prey, view, self.topo, self.cos_half_fov, self.blend)
    }
}

/// Per-species `Prey.stress.{decay, sources[]}` (§6): integrates the sum of
/// its [`StressSource`]s into an agent's persistent `stress` field every
/// tick via `stress += dt * (sum(sources) - decay * stress)`, clamped at
/// zero. With no sources active this reduces to exponential decay toward 0
/// at rate `decay` — the invariant checked in `stress_decays_exponentially`.
pub struct StressAccumulator {
    pub decay: f32,
    pub sources: Vec<Box<dyn StressSource>>,
}

impl StressAccumulator {
    pub fn new(decay: f32, sources: Vec<Box<dyn StressSource>>) -> Self {
        StressAccumulator { decay, sources }
    }

    /// Advance `stress` by one tick of length `dt`.
    pub fn apply(&self, prey: AgentId, view: &TickView, stress: &mut f32, dt: f32) {
        let input: f32 = self.sources.iter().map(|s| s.level(prey, view)).sum();
        *stress = (*stress + dt * (input - self.decay * *stress)).max(0.0);
    }

    /// Parse a `Prey.stress` config section: `{decay, sources: [{type, ...}]}`.
    /// An absent or empty `sources` array is fine — the accumulator then
    /// reduces to pure exponential decay.
    pub fn from_json(j: &serde_json::Value) -> crate::ActionResult<Self> {
        use escape_core::config::{get_f32, get_f32_or, get_str};

        let decay = get_f32(j, "decay").map_err(|e| crate::ActionError::Config(e.to_string()))?;
        let mut sources: Vec<Box<dyn StressSource>> = Vec::new();
        if let Some(arr) = j.get("sources").and_then(serde_json::Value::as_array) {
            for src in arr {
                let kind = get_str(src, "type").map_err(|e| crate::ActionError::Config(e.to_string()))?;
                let cos_half_fov = get_f32_or(src, "cfov", -1.0);
                match kind {
                    "predator_distance" => {
                        sources.push(Box::new(PredatorDistanceSource {
                            cos_half_fov,
                            near: get_f32(src, "near").map_err(|e| crate::ActionError::Config(e.to_string()))?,
                            far: get_f32(src, "far").map_err(|e| crate::ActionError::Config(e.to_string()))?,
                        }));
                    }
                    "neighbors_stress" => {
                        sources.push(Box::new(NeighborsStressSource {
                            topo: get_f32_or(src, "topo", 5.0) as usize,
                            cos_half_fov,
                            blend: get_f32_or(src, "blend", 1.0),
                        }));
                    }
                    other => {
                        return Err(crate::ActionError::Config(format!("unknown stress source type \"{other}\"")));
                    }
                }
            }
        }
        Ok(StressAccumulator { decay, sources })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use escape_agent::StateInfo;
    use escape_core::{HeadSystem, Tick};
    use escape_group::GroupTracker;
    use escape_spatial::NeighborMatrix;
    use glam::Vec3;

    fn view<'a>(
        prey_pos: &'a [Vec3],
        prey_head: &'a [HeadSystem],
        prey_stress: &'a [f32],
        prey_prey: &'a NeighborMatrix,
        prey_pred: &'a NeighborMatrix,
        pred_pos: &'a [Vec3],
        prey_groups: &'a GroupTracker,
        pred_groups: &'a GroupTracker,
        prey_state: &'a [StateInfo],
        pred_state: &'a [StateInfo],
        pred_head: &'a [HeadSystem],
        pred_target: &'a [Option<AgentId>],
        pred_prey: &'a NeighborMatrix,
        pred_pred: &'a NeighborMatrix,
        pred_speed: &'a [f32],
        prey_speed: &'a [f32],
        pred_dir: &'a [Vec3],
        prey_dir: &'a [Vec3],
        pred_stress: &'a [f32],
        prey_prev_exit_dir: &'a [Vec3],
    ) -> TickView<'a> {
        TickView {
            tick: Tick::ZERO,
            dt: 0.02,
            prey_pos,
            prey_dir,
            prey_speed,
            prey_stress,
            prey_state,
            prey_head,
            prey_prev_exit_dir,
            pred_pos,
            pred_dir,
            pred_speed,
            pred_stress,
            pred_state,
            pred_head,
            pred_target,
            prey_prey,
            prey_pred,
            pred_prey,
            pred_pred,
            prey_groups,
            pred_groups,
        }
    }

    #[test]
    fn predator_distance_zero_when_none_in_fov() {
        let prey_pos = vec![Vec3::ZERO];
        let prey_head = vec![HeadSystem::initialize(Vec3::ZERO, Vec3::Z, 10.0)];
        let prey_stress = vec![0.0];
        let prey_dir = vec![Vec3::Z];
        let prey_speed = vec![10.0];
        let prey_state = vec![StateInfo::default()];
        let pred_pos = vec![Vec3::new(0.0, 0.0, -10.0)];
        let pred_dir = vec![Vec3::Z];
        let pred_speed = vec![10.0];
        let pred_state = vec![StateInfo::default()];
        let pred_head = vec![HeadSystem::initialize(pred_pos[0], Vec3::Z, 10.0)];
        let pred_target = vec![None];
        let pred_stress = vec![0.0];
        let prey_prey = NeighborMatrix::rebuild(&prey_pos, &prey_pos);
        let prey_pred = NeighborMatrix::rebuild(&prey_pos, &pred_pos);
        let pred_prey = NeighborMatrix::rebuild(&pred_pos, &prey_pos);
        let pred_pred = NeighborMatrix::rebuild(&pred_pos, &pred_pos);
        let prey_groups = GroupTracker::new();
        let pred_groups = GroupTracker::new();

        let prey_prev_exit_dir = vec![Vec3::Z; 1];
        let v = view(
            &prey_pos,
            &prey_head,
            &prey_stress,
            &prey_prey,
            &prey_pred,
            &pred_pos,
            &prey_groups,
            &pred_groups,
            &prey_state,
            &pred_state,
            &pred_head,
            &pred_target,
            &pred_prey,
            &pred_pred,
            &pred_speed,
            &prey_speed,
            &pred_dir,
            &prey_dir,
            &pred_stress,
            &prey_prev_exit_dir,
        );
        assert_eq!(predator_distance(AgentId(0), &v, 0.9, 1.0, 5.0), 0.0);
    }

    #[test]
    fn predator_distance_is_one_when_close_and_ahead() {
        let prey_pos = vec![Vec3::ZERO];
        let prey_head = vec![HeadSystem::initialize(Vec3::ZERO, Vec3::Z, 10.0)];
        let prey_stress = vec![0.0];
        let prey_dir = vec![Vec3::Z];
        let prey_speed = vec![10.0];
        let prey_state = vec![StateInfo::default()];
        let pred_pos = vec![Vec3::new(0.0, 0.0, 0.5)];
        let pred_dir = vec![Vec3::Z];
        let pred_speed = vec![10.0];
        let pred_state = vec![StateInfo::default()];
        let pred_head = vec![HeadSystem::initialize(pred_pos[0], Vec3::Z, 10.0)];
        let pred_target = vec![None];
        let pred_stress = vec![0.0];
        let prey_prey = NeighborMatrix::rebuild(&prey_pos, &prey_pos);
        let prey_pred = NeighborMatrix::rebuild(&prey_pos, &pred_pos);
        let pred_prey = NeighborMatrix::rebuild(&pred_pos, &prey_pos);
        let pred_pred = NeighborMatrix::rebuild(&pred_pos, &pred_pos);
        let prey_groups = GroupTracker::new();
        let pred_groups = GroupTracker::new();

        let prey_prev_exit_dir = vec![Vec3::Z; 1];
        let v = view(
            &prey_pos,
            &prey_head,
            &prey_stress,
            &prey_prey,
            &prey_pred,
            &pred_pos,
            &prey_groups,
            &pred_groups,
            &prey_state,
            &pred_state,
            &pred_head,
            &pred_target,
            &pred_prey,
            &pred_pred,
            &pred_speed,
            &prey_speed,
            &pred_dir,
            &prey_dir,
            &pred_stress,
            &prey_prev_exit_dir,
        );
        assert_eq!(predator_distance(AgentId(0), &v, 0.9, 1.0, 5.0), 1.0);
    }

    #[test]
    fn neighbors_stress_averages_in_fov_neighbors() {
        let prey_pos = vec![Vec3::ZERO, Vec3::new(0.0, 0.0, 1.0), Vec3::new(0.0, 0.0, -1.0)];
        let prey_head = vec![
            HeadSystem::initialize(Vec3::ZERO, Vec3::Z, 10.0),
            HeadSystem::initialize(prey_pos[1], Vec3::Z, 10.0),
            HeadSystem::initialize(prey_pos[2], Vec3::Z, 10.0),
        ];
        let prey_stress = vec![0.0, 1.0, 1.0];
        let prey_dir = vec![Vec3::Z; 3];
        let prey_speed = vec![10.0; 3];
        let prey_state = vec![StateInfo::default(); 3];
        let pred_pos: Vec<Vec3> = vec![];
        let pred_dir: Vec<Vec3> = vec![];
        let pred_speed: Vec<f32> = vec![];
        let pred_state: Vec<StateInfo> = vec![];
        let pred_head: Vec<HeadSystem> = vec![];
        let pred_target: Vec<Option<AgentId>> = vec![];
        let pred_stress: Vec<f32> = vec![];
        let prey_prey = NeighborMatrix::rebuild(&prey_pos, &prey_pos);
        let prey_pred = NeighborMatrix::rebuild(&prey_pos, &pred_pos);
        let pred_prey = NeighborMatrix::rebuild(&pred_pos, &prey_pos);
        let pred_pred = NeighborMatrix::rebuild(&pred_pos, &pred_pos);
        let prey_groups = GroupTracker::new();
        let pred_groups = GroupTracker::new();

        let prey_prev_exit_dir = vec![Vec3::Z; 3];
        let v = view(
            &prey_pos,
            &prey_head,
            &prey_stress,
            &prey_prey,
            &prey_pred,
            &pred_pos,
            &prey_groups,
            &pred_groups,
            &prey_state,
            &pred_state,
            &pred_head,
            &pred_target,
            &pred_prey,
            &pred_pred,
            &pred_speed,
            &prey_speed,
            &pred_dir,
            &prey_dir,
            &pred_stress,
            &prey_prev_exit_dir,
        );
        // Only neighbor 1 (ahead) is in FOV; neighbor 2 is behind.
        let s = neighbors_stress(AgentId(0), &v, 8, 0.9, 1.0);
        assert!((s - 1.0).abs() < 1e-6);
    }

    #[test]
    fn stress_decays_exponentially_with_no_sources() {
        let acc = StressAccumulator::new(2.0, vec![]);
        let prey_pos = vec![Vec3::ZERO];
        let prey_head = vec![HeadSystem::initialize(Vec3::ZERO, Vec3::Z, 10.0)];
        let prey_dir = vec![Vec3::Z];
        let prey_speed = vec![10.0];
        let prey_state = vec![StateInfo::default()];
        let prey_stress = vec![0.0];
        let pred_pos: Vec<Vec3> = vec![];
        let pred_dir: Vec<Vec3> = vec![];
        let pred_speed: Vec<f32> = vec![];
        let pred_state: Vec<StateInfo> = vec![];
        let pred_head: Vec<HeadSystem> = vec![];
        let pred_target: Vec<Option<AgentId>> = vec![];
        let pred_stress: Vec<f32> = vec![];
        let prey_prey = NeighborMatrix::rebuild(&prey_pos, &prey_pos);
        let prey_pred = NeighborMatrix::rebuild(&prey_pos, &pred_pos);
        let pred_prey = NeighborMatrix::rebuild(&pred_pos, &prey_pos);
        let pred_pred = NeighborMatrix::rebuild(&pred_pos, &pred_pos);
        let prey_groups = GroupTracker::new();
        let pred_groups = GroupTracker::new();
        let prey_prev_exit_dir = vec![Vec3::Z; 1];

        let v = view(
            &prey_pos,
            &prey_head,
            &prey_stress,
            &prey_prey,
            &prey_pred,
            &pred_pos,
            &prey_groups,
            &pred_groups,
            &prey_state,
            &pred_state,
            &pred_head,
            &pred_target,
            &pred_prey,
            &pred_pred,
            &pred_speed,
            &prey_speed,
            &pred_dir,
            &prey_dir,
            &pred_stress,
            &prey_prev_exit_dir,
        );

        let dt = 0.02;
        let decay = 2.0_f32;
        let n = (5.0 / (decay * dt)).ceil() as usize;
        let mut stress = 1.0f32;
        for _ in 0..n {
            acc.apply(AgentId(0), &v, &mut stress, dt);
        }
        // e^-5 ≈ 0.0067: within 1% of zero after N = 5/(decay*dt) ticks.
        assert!(stress < 0.01, "expected near-total decay, got {stress}");
    }

    #[test]
    fn from_json_parses_both_source_types() {
        let j = serde_json::json!({
            "decay": 1.5,
            "sources": [
                {"type": "predator_distance", "cfov": -0.2, "near": 5.0, "far": 20.0},
                {"type": "neighbors_stress", "topo": 4, "blend": 0.5}
            ]
        });
        let acc = StressAccumulator::from_json(&j).unwrap();
        assert_eq!(acc.decay, 1.5);
        assert_eq!(acc.sources.len(), 2);
    }

    #[test]
    fn from_json_rejects_unknown_source_type() {
        let j = serde_json::json!({"decay": 1.0, "sources": [{"type": "mind_control"}]});
        assert!(StressAccumulator::from_json(&j).is_err());
    }

    #[test]
    fn from_json_defaults_to_decay_only_without_sources() {
        let j = serde_json::json!({"decay": 0.5});
        let acc = StressAccumulator::from_json(&j).unwrap();
        assert!(acc.sources.is_empty());
    }
}
