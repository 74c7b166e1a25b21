//! Sorted neighbor indices (`sorted_neighbor_info`, `original_source/model/model.hpp`).
//!
//! Every tick, for every ordered pair of species `(observer, other)`, each
//! observing agent gets a row of [`NeighborInfo`] — one entry per agent of
//! the `other` species — sorted by ascending squared distance. `other ==
//! observer` rows include the agent itself at index 0 (`dist2 == 0`); callers
//! that want the "proper" neighbor list skip that entry via
//! [`NeighborRow::others`].
//!
//! The source sorts each row with a radix sort over the raw IEEE-754 bit
//! pattern of `dist2` (`radix_sort_converter`). A stable sort on
//! `(dist2.to_bits(), idx)` produces the same ordering for all finite,
//! non-negative `dist2` (which squared distances always are) and ties break
//! on agent index exactly as the byte-wise radix sort would, without hand
//! rolling a radix pass.

use glam::Vec3;
use rayon::prelude::*;

use escape_core::AgentId;

/// One row entry: a candidate neighbor, its squared distance from the
/// observer, and (redundantly, matching the wire format other tooling in
/// this pack expects) its absolute position.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct NeighborInfo {
    pub dist2: f32,
    pub idx: AgentId,
    pub neighbor_pos: Vec3,
}

impl NeighborInfo {
    #[inline]
    pub fn new(dist2: f32, idx: AgentId, neighbor_pos: Vec3) -> Self {
        NeighborInfo {
            dist2,
            idx,
            neighbor_pos,
        }
    }

    fn sort_key(&self) -> (u32, u32) {
        (self.dist2.to_bits(), self.idx.0)
    }
}

/// A single observer's neighbor row, ascending by squared distance.
#[derive(Clone, Debug, Default)]
pub struct NeighborRow(Vec<NeighborInfo>);

impl NeighborRow {
    pub fn from_unsorted(mut entries: Vec<NeighborInfo>) -> Self {
        entries.sort_by_key(NeighborInfo::sort_key);
        NeighborRow(entries)
    }

    /// Full row including the observer itself, if present (`raw_view`).
    #[inline]
    pub fn raw(&self) -> &[NeighborInfo] {
        &self.0
    }

    /// Row with the leading zero-distance self entry removed, when present.
    /// Matches `Simulation::sorted_view<S, S>`, which skips index 0 for a
    /// same-species query.
    #[inline]
    pub fn others(&self) -> &[NeighborInfo] {
        match self.0.first() {
            Some(first) if first.dist2 <= 0.0 => &self.0[1..],
            _ => &self.0[..],
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[inline]
    pub fn nearest(&self) -> Option<&NeighborInfo> {
        self.others().first()
    }
}

/// The full `observer-species x other-species` neighbor matrix for one tick:
/// one [`NeighborRow`] per observing agent.
#[derive(Clone, Debug, Default)]
pub struct NeighborMatrix {
    rows: Vec<NeighborRow>,
}

impl NeighborMatrix {
    pub fn empty(n_observers: usize) -> Self {
        NeighborMatrix {
            rows: vec![NeighborRow::default(); n_observers],
        }
    }

    pub fn row(&self, observer: AgentId) -> &NeighborRow {
        &self.rows[observer.index()]
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rebuild every row from scratch: O(observers * others).
    ///
    /// When `observer_positions` and `other_positions` are the same
    /// population, the observer's own position naturally produces the
    /// `dist2 == 0` self entry that [`NeighborRow::others`] strips — no
    /// special-casing needed, matching `raw_view` always including index 0.
    pub fn rebuild(observer_positions: &[Vec3], other_positions: &[Vec3]) -> Self {
        let rows: Vec<NeighborRow> = observer_positions
            .par_iter()
            .map(|&opos| {
                let entries: Vec<NeighborInfo> = other_positions
                    .iter()
                    .enumerate()
                    .map(|(ni, &npos)| {
                        let dist2 = (npos - opos).length_squared();
                        NeighborInfo::new(dist2, AgentId::try_from(ni).expect("population fits u32"), npos)
                    })
                    .collect();
                NeighborRow::from_unsorted(entries)
            })
            .collect();
        NeighborMatrix { rows }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info(dist2: f32, idx: u32) -> NeighborInfo {
        NeighborInfo::new(dist2, AgentId(idx), Vec3::ZERO)
    }

    #[test]
    fn sorts_ascending_by_dist2() {
        let row = NeighborRow::from_unsorted(vec![info(9.0, 2), info(1.0, 0), info(4.0, 1)]);
        let ids: Vec<u32> = row.raw().iter().map(|n| n.idx.0).collect();
        assert_eq!(ids, vec![0, 1, 2]);
    }

    #[test]
    fn ties_break_on_index() {
        let row = NeighborRow::from_unsorted(vec![info(1.0, 3), info(1.0, 1), info(1.0, 2)]);
        let ids: Vec<u32> = row.raw().iter().map(|n| n.idx.0).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn others_skips_self_row() {
        let row = NeighborRow::from_unsorted(vec![info(0.0, 5), info(2.0, 1), info(5.0, 2)]);
        assert_eq!(row.raw().len(), 3);
        assert_eq!(row.others().len(), 2);
        assert_eq!(row.others()[0].idx, AgentId(1));
    }

    #[test]
    fn others_is_full_row_when_no_self_entry() {
        let row = NeighborRow::from_unsorted(vec![info(2.0, 1), info(5.0, 2)]);
        assert_eq!(row.others().len(), 2);
    }

    #[test]
    fn rebuild_same_species_includes_self_at_zero() {
        let positions = vec![Vec3::ZERO, Vec3::new(1.0, 0.0, 0.0), Vec3::new(0.0, 2.0, 0.0)];
        let matrix = NeighborMatrix::rebuild(&positions, &positions);
        let row = matrix.row(AgentId(0));
        assert_eq!(row.raw()[0].dist2, 0.0);
        assert_eq!(row.raw()[0].idx, AgentId(0));
        assert_eq!(row.others().len(), 2);
    }

    #[test]
    fn rebuild_cross_species_has_no_self_entry() {
        let prey = vec![Vec3::ZERO];
        let pred = vec![Vec3::new(3.0, 0.0, 4.0)];
        let matrix = NeighborMatrix::rebuild(&prey, &pred);
        let row = matrix.row(AgentId(0));
        assert_eq!(row.raw().len(), 1);
        assert_eq!(row.raw()[0].dist2, 25.0);
    }
}
