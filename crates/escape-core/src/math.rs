//! Small vector/scalar helpers shared by the body frame, flight integrator,
//! and action primitives.
//!
//! Ported from the originating model's `math::` namespace: clamp-based
//! smoothstep variants, a NaN-safe normalize, and the two-body
//! nearest-approach solver used by the ray-ray collision-avoidance action.

use glam::Vec3;

pub const PI: f32 = std::f32::consts::PI;

/// World "up". All body frames are built relative to this axis.
pub const WORLD_UP: Vec3 = Vec3::new(0.0, 1.0, 0.0);

/// Normalize `v`, returning `fallback` if `v` is (numerically) the zero
/// vector. Used by the flight integrator so a momentary zero-velocity tick
/// never produces a NaN direction.
#[inline]
pub fn save_normalize(v: Vec3, fallback: Vec3) -> Vec3 {
    let len2 = v.length_squared();
    if len2 <= 1e-7 {
        fallback
    } else {
        v / len2.sqrt()
    }
}

/// Map `x` linearly from `[in_min, in_max]` to `[out_min, out_max]`, without
/// clamping.
#[inline]
pub fn normalize_min_max(x: f32, in_min: f32, in_max: f32, out_min: f32, out_max: f32) -> f32 {
    let t = (x - in_min) / (in_max - in_min);
    out_min + t * (out_max - out_min)
}

/// Perp-dot based signed angle between `a` and `b` projected onto the x-z
/// plane, clamped to `[-pi, pi]`.
#[inline]
pub fn rad_between_xz(a: Vec3, b: Vec3) -> f32 {
    let perp_dot = a.x * b.z - a.z * b.x;
    let dot = a.x * b.x + a.z * b.z;
    perp_dot.atan2(dot)
}

/// Rotate `v` by `rad` radians around `axis` (axis need not be normalized
/// ahead of time — `Vec3::normalize` is applied internally, matching the
/// source's reliance on `glm::rotate`).
#[inline]
pub fn rotate(v: Vec3, rad: f32, axis: Vec3) -> Vec3 {
    let axis = axis.normalize_or_zero();
    glam::Quat::from_axis_angle(axis, rad) * v
}

/// Smoothstep clamped to `[edge0, edge1]`; returns 0 at/below `edge0`, 1
/// at/above `edge1`.
#[inline]
pub fn smoothstep(x: f32, edge0: f32, edge1: f32) -> f32 {
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

/// Perlin's smootherstep (`6t^5 - 15t^4 + 10t^3`), clamped to `[edge0, edge1]`.
#[inline]
pub fn smootherstep(x: f32, edge0: f32, edge1: f32) -> f32 {
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * t * (t * (t * 6.0 - 15.0) + 10.0)
}

/// `smootherstep` remapped to `[-1, 1]` instead of `[0, 1]`.
#[inline]
pub fn smootherstep_bipolar(x: f32, edge0: f32, edge1: f32) -> f32 {
    2.0 * smootherstep(x, edge0, edge1) - 1.0
}

/// `smootherstep` mirrored around zero: `edge0..edge1` maps to `0..1` and
/// `-edge1..-edge0` maps to `-1..0`, with a flat zero region in between.
#[inline]
pub fn smootherstep_bilateral(x: f32, edge0: f32, edge1: f32) -> f32 {
    if x >= 0.0 {
        smootherstep(x, edge0, edge1)
    } else {
        -smootherstep(-x, edge0, edge1)
    }
}

/// Nearest-approach time between two agents moving at constant velocity,
/// used by `avoid_n_direction` to anticipate a future collision rather than
/// reacting only to current distance.
///
/// Returns `None` if the two trajectories are (numerically) parallel, in
/// which case the caller should fall back to a pure position-avoidance
/// contribution.
pub fn nearest_approach_t(pa: Vec3, va: Vec3, pb: Vec3, vb: Vec3) -> Option<f32> {
    let dv = va - vb;
    let denom = dv.length_squared();
    if denom <= 1e-9 {
        return None;
    }
    let dp = pb - pa;
    Some(dp.dot(dv) / denom)
}

/// A ray-ray collision helper: given two agents' current position/velocity,
/// find the time and squared distance of closest approach and the pair of
/// points realizing it.
pub struct CollisionT {
    pub t: f32,
    pub point_a: Vec3,
    pub point_b: Vec3,
    pub dist2: f32,
}

impl CollisionT {
    pub fn compute(pa: Vec3, va: Vec3, pb: Vec3, vb: Vec3) -> Option<Self> {
        let t = nearest_approach_t(pa, va, pb, vb)?.max(0.0);
        let point_a = pa + va * t;
        let point_b = pb + vb * t;
        Some(CollisionT {
            t,
            point_a,
            point_b,
            dist2: (point_b - point_a).length_squared(),
        })
    }

    /// Direction agent A should add to its steering to avoid the predicted
    /// collision point with B.
    pub fn opt_avoidance_a(&self) -> Vec3 {
        save_normalize(self.point_a - self.point_b, Vec3::ZERO)
    }

    pub fn opt_avoidance_b(&self) -> Vec3 {
        save_normalize(self.point_b - self.point_a, Vec3::ZERO)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn save_normalize_falls_back_on_zero() {
        let fallback = Vec3::new(1.0, 0.0, 0.0);
        assert_eq!(save_normalize(Vec3::ZERO, fallback), fallback);
        assert!((save_normalize(Vec3::new(0.0, 3.0, 0.0), fallback) - Vec3::Y).length() < 1e-6);
    }

    #[test]
    fn smootherstep_bounds() {
        assert_eq!(smootherstep(-10.0, 0.0, 1.0), 0.0);
        assert_eq!(smootherstep(10.0, 0.0, 1.0), 1.0);
        assert!((smootherstep(0.5, 0.0, 1.0) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn smootherstep_bilateral_is_antisymmetric() {
        let a = smootherstep_bilateral(0.5, 0.1, 1.0);
        let b = smootherstep_bilateral(-0.5, 0.1, 1.0);
        assert!((a + b).abs() < 1e-6);
    }

    #[test]
    fn nearest_approach_parallel_returns_none() {
        let pa = Vec3::ZERO;
        let va = Vec3::new(1.0, 0.0, 0.0);
        let pb = Vec3::new(0.0, 1.0, 0.0);
        let vb = Vec3::new(1.0, 0.0, 0.0);
        assert!(nearest_approach_t(pa, va, pb, vb).is_none());
    }

    #[test]
    fn nearest_approach_head_on_meets_at_midpoint() {
        let pa = Vec3::new(-10.0, 0.0, 0.0);
        let va = Vec3::new(1.0, 0.0, 0.0);
        let pb = Vec3::new(10.0, 0.0, 0.0);
        let vb = Vec3::new(-1.0, 0.0, 0.0);
        let c = CollisionT::compute(pa, va, pb, vb).unwrap();
        assert!(c.dist2 < 1e-6);
        assert!((c.t - 10.0).abs() < 1e-4);
    }
}
