//! Per-agent orthonormal body frame ("head system" `H`) with a banking
//! angle that lags lateral acceleration versus available lift.
//!
//! Grounded on `model/agents/agents_fwd.hpp::head_system` in the
//! originating simulation. The source represents `H` as a `glm::mat4`; here
//! the four basis columns are kept as separate `Vec3` fields since nothing
//! downstream needs matrix algebra on `H` itself (only the individual
//! transforms it exposes), which keeps `global_pos`/`local_pos` readable
//! without a matrix-multiply dependency on `glam::Mat4`.

use glam::Vec3;

use crate::math::{rotate, save_normalize, WORLD_UP};

/// Anything the body frame needs to read to regenerate itself each tick.
/// Implemented by the per-species agent structs in `escape-agent`.
pub trait FlightState {
    fn pos(&self) -> Vec3;
    fn dir(&self) -> Vec3;
    fn speed(&self) -> f32;
    fn body_mass(&self) -> f32;
    fn cruise_speed(&self) -> f32;
    /// Banking response rate (`betaIn`), radians/sec.
    fn beta_in(&self) -> f32;
}

/// The per-agent right-handed orthonormal frame: `forward` (dir), `up`,
/// `side`, and `pos`, plus the lagged banking angle `beta`.
#[derive(Clone, Copy, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HeadSystem {
    forward: Vec3,
    up: Vec3,
    side: Vec3,
    pos: Vec3,
    v0: Vec3,
    /// Banking angle, radians. Positive: clockwise (as seen from behind).
    beta: f32,
}

impl HeadSystem {
    /// Build the initial frame from a starting position/direction/speed.
    /// `side = normalize(cross(world_up, dir))`, `up = cross(dir, side)`.
    pub fn initialize(pos: Vec3, dir: Vec3, speed: f32) -> Self {
        let mut h = HeadSystem {
            forward: dir,
            up: Vec3::Y,
            side: Vec3::Z,
            pos,
            v0: dir * speed,
            beta: 0.0,
        };
        h.regenerate(pos, dir);
        h
    }

    fn regenerate(&mut self, pos: Vec3, dir: Vec3) {
        let side = WORLD_UP.cross(dir).normalize_or_zero();
        let up = dir.cross(side);
        self.forward = dir;
        self.up = up;
        self.side = side;
        self.pos = pos;
    }

    /// Advance the frame to the agent's new `(pos, dir)`, updating the
    /// banking angle from the lateral-force-vs-lift comparison.
    ///
    /// `state` is the agent as of *after* integration this tick (so
    /// `state.pos()`/`state.dir()` are the new values; `self.pos`/
    /// `self.forward` before this call are the previous tick's values).
    pub fn update<S: FlightState>(&mut self, state: &S, dt: f32) {
        let p0 = self.pos;
        let p1 = state.pos();
        let v = (p1 - p0) / dt;
        let a = (v - self.v0) / dt;
        let m = state.body_mass();
        let g = 9.81;
        let f = m * (a + g * Vec3::new(0.0, -1.0, 0.0));
        let mut f_lat = self.side.dot(f);

        let s = v.length();
        let cs = state.cruise_speed().max(1e-6);
        // Available lift at current speed relative to cruise (L ~ s^2).
        let lift = g * m * (s * s) / (cs * cs);
        let l_lat = self.side.dot(lift * self.up);
        f_lat = f_lat.clamp(-lift / 1.1, lift / 1.1);

        if l_lat < f_lat {
            self.beta -= dt * state.beta_in();
        } else if l_lat > f_lat {
            self.beta += dt * state.beta_in();
        }

        self.regenerate(p1, state.dir());
        self.v0 = v;
    }

    #[inline]
    pub fn forward(&self) -> Vec3 {
        self.forward
    }
    #[inline]
    pub fn up(&self) -> Vec3 {
        self.up
    }
    #[inline]
    pub fn side(&self) -> Vec3 {
        self.side
    }
    #[inline]
    pub fn pos(&self) -> Vec3 {
        self.pos
    }
    #[inline]
    pub fn beta(&self) -> f32 {
        self.beta
    }

    /// `side` rotated by the current banking angle around `forward` — the
    /// frame's "banked side" axis, used by turn actions that steer along a
    /// visually-banked lateral direction.
    pub fn bside(&self) -> Vec3 {
        rotate(self.side, self.beta, self.forward)
    }

    /// Pitch `forward` by `rad` (positive: upward) around `side`.
    pub fn pitch(&self, rad: f32) -> Vec3 {
        rotate(self.forward, rad, self.side)
    }

    /// Yaw `forward` by `rad` (positive: counter-clockwise) around `up`.
    pub fn yaw(&self, rad: f32) -> Vec3 {
        rotate(self.forward, rad, self.up)
    }

    /// Transform a world-space free vector into this frame's local basis.
    pub fn local_vec(&self, global_vec: Vec3) -> Vec3 {
        Vec3::new(
            self.forward.dot(global_vec),
            self.up.dot(global_vec),
            self.side.dot(global_vec),
        )
    }

    /// Transform a world-space position into this frame's local basis.
    pub fn local_pos(&self, global_pos: Vec3) -> Vec3 {
        self.local_vec(global_pos - self.pos)
    }

    /// Transform a local free vector back into world space.
    pub fn global_vec(&self, local_vec: Vec3) -> Vec3 {
        self.forward * local_vec.x + self.up * local_vec.y + self.side * local_vec.z
    }

    /// Transform a local position back into world space.
    pub fn global_pos(&self, local_pos: Vec3) -> Vec3 {
        self.pos + self.global_vec(local_pos)
    }

    /// Sign of each local axis for a world point — used by escape/avoidance
    /// actions to decide a turn direction ("which side is the predator on").
    pub fn hemisphere(&self, world_pos: Vec3) -> Vec3 {
        let l = self.local_pos(world_pos);
        Vec3::new(l.x.signum(), l.y.signum(), l.z.signum())
    }
}

/// Guard against a zero-length velocity producing a degenerate frame; kept
/// separate from [`HeadSystem::update`] so the flight integrator can call it
/// directly when regenerating `dir` from an (almost) stationary velocity.
#[inline]
pub fn safe_dir(v: Vec3, fallback: Vec3) -> Vec3 {
    save_normalize(v, fallback)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Stub {
        pos: Vec3,
        dir: Vec3,
        speed: f32,
    }
    impl FlightState for Stub {
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
            0.5
        }
        fn cruise_speed(&self) -> f32 {
            self.speed
        }
        fn beta_in(&self) -> f32 {
            1.0
        }
    }

    #[test]
    fn initial_frame_is_orthonormal() {
        let h = HeadSystem::initialize(Vec3::ZERO, Vec3::X, 10.0);
        assert!((h.forward().length() - 1.0).abs() < 1e-5);
        assert!((h.up().length() - 1.0).abs() < 1e-5);
        assert!((h.side().length() - 1.0).abs() < 1e-5);
        assert!(h.forward().dot(h.side()).abs() < 1e-5);
        assert!(h.forward().dot(h.up()).abs() < 1e-5);
    }

    #[test]
    fn local_global_pos_roundtrip() {
        let h = HeadSystem::initialize(Vec3::new(1.0, 2.0, 3.0), Vec3::X, 10.0);
        let world = Vec3::new(5.0, -1.0, 9.0);
        let local = h.local_pos(world);
        let back = h.global_pos(local);
        assert!((back - world).length() < 1e-4);
    }

    #[test]
    fn update_keeps_forward_equal_to_new_dir() {
        let mut h = HeadSystem::initialize(Vec3::ZERO, Vec3::X, 10.0);
        let next = Stub {
            pos: Vec3::new(0.1, 0.0, 0.0),
            dir: Vec3::X,
            speed: 10.0,
        };
        h.update(&next, 0.02);
        assert!((h.forward() - Vec3::X).length() < 1e-5);
    }
}
