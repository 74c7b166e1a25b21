//! Bounded neighbor iteration and field-of-view tests
//! (`original_source/model/while_topo.hpp`).
//!
//! Actions never walk a full sorted row — they stop after the first `topo`
//! accepted neighbors (a fixed "topological" count, not a metric radius).
//! [`while_topo`] mirrors that: it visits entries in order, calls `visit` on
//! each, and stops once either the row is exhausted or `visit` has returned
//! `true` (accepted) `topo` times. [`until_topo`] is the early-exit sibling
//! used by actions that stop at the *first* accepted neighbor.

use glam::Vec3;

use crate::neighbor::NeighborInfo;

/// Visit up to `topo` accepted neighbors from `row`, in ascending-distance
/// order. `visit` returns `true` if the entry counts toward the `topo` quota
/// (e.g. passed a field-of-view test), `false` to skip it without consuming
/// the quota.
///
/// Returns the number of accepted entries.
pub fn while_topo<F: FnMut(&NeighborInfo) -> bool>(row: &[NeighborInfo], topo: usize, mut visit: F) -> usize {
    let mut accepted = 0;
    for entry in row {
        if accepted >= topo {
            break;
        }
        if visit(entry) {
            accepted += 1;
        }
    }
    accepted
}

/// Like [`while_topo`], but stops at the first accepted entry and returns it.
pub fn until_topo<F: FnMut(&NeighborInfo) -> bool>(row: &[NeighborInfo], mut visit: F) -> Option<&NeighborInfo> {
    row.iter().find(|entry| visit(entry))
}

/// Field-of-view test: is the neighbor at squared distance `dist2` and
/// relative position `rel_pos` (neighbor minus self, **not** normalized)
/// within `self_forward`'s cone, where `cos_half_fov` is the cosine of the
/// half-angle?
///
/// Ported from `in_fov(self, nidist2, nipos, action)`: the source compares
/// `dot(forward, rel_pos)` against `sqrt(nidist2) * cos_half_fov` instead of
/// normalizing `rel_pos` first, which is exactly what this does (avoids a
/// `sqrt` + divide when the neighbor is later rejected).
#[inline]
pub fn in_fov(self_forward: Vec3, rel_pos: Vec3, dist2: f32, cos_half_fov: f32) -> bool {
    if dist2 <= 1e-12 {
        return false;
    }
    self_forward.dot(rel_pos) > dist2.sqrt() * cos_half_fov
}

#[cfg(test)]
mod tests {
    use super::*;
    use escape_core::AgentId;

    fn entry(dist2: f32, idx: u32) -> NeighborInfo {
        NeighborInfo::new(dist2, AgentId(idx), Vec3::ZERO)
    }

    #[test]
    fn while_topo_stops_at_quota() {
        let row = vec![entry(1.0, 0), entry(2.0, 1), entry(3.0, 2), entry(4.0, 3)];
        let mut visited = Vec::new();
        let accepted = while_topo(&row, 2, |e| {
            visited.push(e.idx.0);
            true
        });
        assert_eq!(accepted, 2);
        assert_eq!(visited, vec![0, 1]);
    }

    #[test]
    fn while_topo_skips_rejected_without_consuming_quota() {
        let row = vec![entry(1.0, 0), entry(2.0, 1), entry(3.0, 2)];
        let accepted = while_topo(&row, 1, |e| e.idx.0 == 1);
        assert_eq!(accepted, 1);
    }

    #[test]
    fn until_topo_returns_first_match() {
        let row = vec![entry(1.0, 0), entry(2.0, 1), entry(3.0, 2)];
        let found = until_topo(&row, |e| e.idx.0 >= 1);
        assert_eq!(found.unwrap().idx, AgentId(1));
    }

    #[test]
    fn in_fov_accepts_straight_ahead() {
        let forward = Vec3::new(0.0, 0.0, 1.0);
        let rel = Vec3::new(0.0, 0.0, 5.0);
        assert!(in_fov(forward, rel, rel.length_squared(), 0.9));
    }

    #[test]
    fn in_fov_rejects_behind() {
        let forward = Vec3::new(0.0, 0.0, 1.0);
        let rel = Vec3::new(0.0, 0.0, -5.0);
        assert!(!in_fov(forward, rel, rel.length_squared(), 0.9));
    }

    #[test]
    fn in_fov_zero_distance_always_rejects() {
        let forward = Vec3::new(1.0, 0.0, 0.0);
        assert!(!in_fov(forward, Vec3::ZERO, 0.0, 0.99));
    }

    #[test]
    fn in_fov_rejects_exactly_on_cone_boundary() {
        let forward = Vec3::new(0.0, 0.0, 1.0);
        // rel at 45 degrees from forward, cos_half_fov = cos(45deg).
        let rel = Vec3::new(1.0, 0.0, 1.0);
        let cos_half_fov = std::f32::consts::FRAC_1_SQRT_2;
        assert!(!in_fov(forward, rel, rel.length_squared(), cos_half_fov));
    }
}
