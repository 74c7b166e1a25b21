//! Spatial group clustering (`original_source/model/group.hpp`,
//! `group.cpp`).
//!
//! A "group" is a connected component of the squared-distance graph over one
//! species' population: two agents are adjacent if their squared distance is
//! at or below `group_dd` (`Simulation.groupDetection.threshold²`). Groups
//! are recomputed on a fixed interval (`§4.8`); between re-clusters, each
//! group's centroid is dead-reckoned forward using its last known mean
//! velocity rather than recomputed, which is far cheaper than reclustering
//! every tick and visually indistinguishable at the interval this model
//! uses.

use glam::{Mat3, Vec3};

use escape_core::{AgentId, GroupId};

/// One emergent group: size, mean velocity, a 2-axis oriented frame fit to
/// the member positions by PCA, the frame's center, and the half-extent of
/// the membership along each of the frame's three axes (`H` + `ext` in the
/// source, where `H` is a 3x3 matrix whose columns are `[axis0, axis1,
/// center]`).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GroupDescr {
    pub size: u32,
    pub vel: Vec3,
    pub axis0: Vec3,
    pub axis1: Vec3,
    pub normal: Vec3,
    pub center: Vec3,
    pub extent: Vec3,
}

impl GroupDescr {
    /// Centroid of the group (`gc()` in the source: `vec3(H[2])`).
    #[inline]
    pub fn centroid(&self) -> Vec3 {
        self.center
    }

    /// The group's fit as a 3x3 basis matrix `[axis0, axis1, normal]`.
    pub fn basis(&self) -> Mat3 {
        Mat3::from_cols(self.axis0, self.axis1, self.normal)
    }
}

/// A position/velocity sample fed in before a re-cluster (`proxy` in the
/// source).
#[derive(Clone, Copy, Debug, Default)]
struct Proxy {
    pos: Vec3,
    vel: Vec3,
}

/// Tracks one species' emergent groups across ticks.
#[derive(Clone, Debug, Default)]
pub struct GroupTracker {
    buffer: Vec<Proxy>,
    groups: Vec<GroupDescr>,
    group_of: Vec<GroupId>,
}

impl GroupTracker {
    pub fn new() -> Self {
        GroupTracker::default()
    }

    /// Resize the staging buffer for `n` agents, clearing any previous
    /// group assignment (`prepare(n)`).
    pub fn prepare(&mut self, n: usize) {
        self.buffer.clear();
        self.buffer.resize(n, Proxy::default());
        self.group_of.clear();
        self.group_of.resize(n, GroupId::INVALID);
    }

    /// Stage one agent's current position/velocity ahead of a [`cluster`]
    /// or [`track`] call (`feed(ind, idx)`).
    ///
    /// [`cluster`]: GroupTracker::cluster
    /// [`track`]: GroupTracker::track
    pub fn feed(&mut self, agent: AgentId, pos: Vec3, vel: Vec3) {
        self.buffer[agent.index()] = Proxy { pos, vel };
    }

    pub fn groups(&self) -> &[GroupDescr] {
        &self.groups
    }

    pub fn group_of(&self, agent: AgentId) -> GroupId {
        self.group_of[agent.index()]
    }

    pub fn group_mates<'a>(&'a self, group: GroupId) -> impl Iterator<Item = AgentId> + 'a {
        self.group_of
            .iter()
            .enumerate()
            .filter(move |&(_, &g)| g == group)
            .map(|(i, _)| AgentId::try_from(i).expect("population fits u32"))
    }

    /// Recompute groups from scratch: connected components of the
    /// squared-distance graph at threshold `dd`, each fit with a PCA frame.
    pub fn cluster(&mut self, dd: f32) {
        let n = self.buffer.len();
        let mut dsu = DisjointSet::new(n);
        for i in 0..n {
            for j in (i + 1)..n {
                if (self.buffer[i].pos - self.buffer[j].pos).length_squared() <= dd {
                    dsu.union(i, j);
                }
            }
        }

        let mut by_root: std::collections::HashMap<usize, Vec<usize>> = std::collections::HashMap::new();
        for i in 0..n {
            by_root.entry(dsu.find(i)).or_default().push(i);
        }

        self.groups.clear();
        self.group_of.clear();
        self.group_of.resize(n, GroupId::INVALID);

        let mut roots: Vec<usize> = by_root.keys().copied().collect();
        roots.sort_unstable();

        for root in roots {
            let members = &by_root[&root];
            let gid = GroupId::try_from(self.groups.len()).expect("group count fits u32");
            for &m in members {
                self.group_of[m] = gid;
            }
            self.groups.push(fit_group(&self.buffer, members));
        }
    }

    /// Dead-reckon existing group centers forward by `dt` using each
    /// group's last-known mean velocity, without reclustering
    /// (`H[2] = gc + dt*vel`).
    pub fn track(&mut self, dt: f32) {
        for g in &mut self.groups {
            g.center += g.vel * dt;
        }
    }
}

fn fit_group(buffer: &[Proxy], members: &[usize]) -> GroupDescr {
    let size = members.len();
    let vel = members.iter().map(|&i| buffer[i].vel).sum::<Vec3>() / size as f32;

    // Anchor at the lowest-indexed member before averaging to keep the
    // running sums well-conditioned for flocks far from the world origin.
    let anchor = buffer[members[0]].pos;
    let mean_offset = members
        .iter()
        .map(|&i| buffer[i].pos - anchor)
        .sum::<Vec3>()
        / size as f32;
    let center = anchor + mean_offset;

    if size < 2 {
        return GroupDescr {
            size: size as u32,
            vel,
            axis0: Vec3::X,
            axis1: Vec3::Y,
            normal: Vec3::Z,
            center,
            extent: Vec3::ZERO,
        };
    }

    let mut cov = Mat3::ZERO;
    for &i in members {
        let d = buffer[i].pos - center;
        cov += Mat3::from_cols(d * d.x, d * d.y, d * d.z);
    }
    cov *= 1.0 / size as f32;

    let axis0 = dominant_eigenvector(cov, Vec3::X);
    let deflated = cov - outer(axis0, axis0) * cov_eigenvalue(cov, axis0);
    let axis1_raw = dominant_eigenvector(deflated, orthogonal_seed(axis0));
    let axis1 = (axis1_raw - axis0 * axis0.dot(axis1_raw))
        .try_normalize()
        .unwrap_or_else(|| orthogonal_seed(axis0));
    let normal = axis0.cross(axis1).normalize_or_zero();

    let mut min = Vec3::splat(f32::MAX);
    let mut max = Vec3::splat(f32::MIN);
    for &i in members {
        let d = buffer[i].pos - center;
        let p = Vec3::new(d.dot(axis0), d.dot(axis1), d.dot(normal));
        min = min.min(p);
        max = max.max(p);
    }
    let extent = (max - min) * 0.5;

    GroupDescr {
        size: size as u32,
        vel,
        axis0,
        axis1,
        normal,
        center,
        extent,
    }
}

fn outer(a: Vec3, b: Vec3) -> Mat3 {
    Mat3::from_cols(a * b.x, a * b.y, a * b.z)
}

fn cov_eigenvalue(cov: Mat3, v: Vec3) -> f32 {
    v.dot(cov * v)
}

/// Power iteration for the dominant eigenvector of a symmetric 3x3 matrix.
/// `seed` should not be (near-)orthogonal to the true eigenvector.
fn dominant_eigenvector(m: Mat3, seed: Vec3) -> Vec3 {
    let mut v = seed.try_normalize().unwrap_or(Vec3::X);
    for _ in 0..32 {
        let next = m * v;
        v = match next.try_normalize() {
            Some(n) => n,
            None => return v,
        };
    }
    v
}

fn orthogonal_seed(axis: Vec3) -> Vec3 {
    let candidate = if axis.x.abs() < 0.9 { Vec3::X } else { Vec3::Y };
    (candidate - axis * axis.dot(candidate))
        .try_normalize()
        .unwrap_or(Vec3::Y)
}

/// Minimal disjoint-set-union for the connected-components pass; the
/// source builds the same adjacency graph with a generic graph library and
/// calls `connected_components`.
struct DisjointSet {
    parent: Vec<usize>,
}

impl DisjointSet {
    fn new(n: usize) -> Self {
        DisjointSet {
            parent: (0..n).collect(),
        }
    }

    fn find(&mut self, i: usize) -> usize {
        if self.parent[i] != i {
            self.parent[i] = self.find(self.parent[i]);
        }
        self.parent[i]
    }

    fn union(&mut self, a: usize, b: usize) {
        let ra = self.find(a);
        let rb = self.find(b);
        if ra != rb {
            self.parent[ra] = rb;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn agent(i: usize) -> AgentId {
        AgentId::try_from(i).unwrap()
    }

    #[test]
    fn isolated_agents_form_singleton_groups() {
        let mut tracker = GroupTracker::new();
        tracker.prepare(2);
        tracker.feed(agent(0), Vec3::ZERO, Vec3::ZERO);
        tracker.feed(agent(1), Vec3::new(100.0, 0.0, 0.0), Vec3::ZERO);
        tracker.cluster(1.0);
        assert_eq!(tracker.groups().len(), 2);
        assert_ne!(tracker.group_of(agent(0)), tracker.group_of(agent(1)));
    }

    #[test]
    fn close_agents_join_one_group() {
        let mut tracker = GroupTracker::new();
        tracker.prepare(3);
        tracker.feed(agent(0), Vec3::ZERO, Vec3::new(1.0, 0.0, 0.0));
        tracker.feed(agent(1), Vec3::new(0.5, 0.0, 0.0), Vec3::new(1.0, 0.0, 0.0));
        tracker.feed(agent(2), Vec3::new(50.0, 0.0, 0.0), Vec3::ZERO);
        tracker.cluster(4.0);
        assert_eq!(tracker.groups().len(), 2);
        let g0 = tracker.group_of(agent(0));
        assert_eq!(g0, tracker.group_of(agent(1)));
        assert_ne!(g0, tracker.group_of(agent(2)));
        let descr = tracker.groups()[g0.index()];
        assert_eq!(descr.size, 2);
        assert!((descr.vel - Vec3::new(1.0, 0.0, 0.0)).length() < 1e-5);
    }

    #[test]
    fn transitivity_chains_groups_together() {
        let mut tracker = GroupTracker::new();
        tracker.prepare(3);
        tracker.feed(agent(0), Vec3::ZERO, Vec3::ZERO);
        tracker.feed(agent(1), Vec3::new(1.0, 0.0, 0.0), Vec3::ZERO);
        tracker.feed(agent(2), Vec3::new(2.0, 0.0, 0.0), Vec3::ZERO);
        tracker.cluster(1.01);
        assert_eq!(tracker.groups().len(), 1);
        assert_eq!(tracker.groups()[0].size, 3);
    }

    #[test]
    fn track_dead_reckons_center_without_reclustering() {
        let mut tracker = GroupTracker::new();
        tracker.prepare(2);
        tracker.feed(agent(0), Vec3::ZERO, Vec3::new(2.0, 0.0, 0.0));
        tracker.feed(agent(1), Vec3::new(0.5, 0.0, 0.0), Vec3::new(2.0, 0.0, 0.0));
        tracker.cluster(4.0);
        let before = tracker.groups()[0].centroid();
        tracker.track(0.5);
        let after = tracker.groups()[0].centroid();
        assert!((after - before - Vec3::new(1.0, 0.0, 0.0)).length() < 1e-5);
    }

    #[test]
    fn group_mates_returns_members() {
        let mut tracker = GroupTracker::new();
        tracker.prepare(2);
        tracker.feed(agent(0), Vec3::ZERO, Vec3::ZERO);
        tracker.feed(agent(1), Vec3::new(0.1, 0.0, 0.0), Vec3::ZERO);
        tracker.cluster(1.0);
        let gid = tracker.group_of(agent(0));
        let mates: Vec<AgentId> = tracker.group_mates(gid).collect();
        assert_eq!(mates.len(), 2);
    }
}
