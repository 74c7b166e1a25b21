//! Simulation time model.
//!
//! # Design
//!
//! Time is represented as a monotonically increasing `Tick` counter, exactly
//! as in the originating simulation. Unlike a wall-clock digital twin there is
//! no mapping to Unix time here — the only conversion that matters is
//! `tick * dt = elapsed simulated seconds`, held by [`SimClock`].
//!
//! Using an integer tick as the canonical time unit keeps all scheduling
//! arithmetic exact (no floating-point drift accumulates in the reaction-time
//! bookkeeping) while the physical integration itself runs in `f32` seconds.

use std::fmt;

// ── Tick ─────────────────────────────────────────────────────────────────────

/// An absolute simulation tick counter.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Tick(pub u64);

impl Tick {
    pub const ZERO: Tick = Tick(0);
    /// Sentinel: "never scheduled again".
    pub const NEVER: Tick = Tick(u64::MAX);

    #[inline]
    pub fn offset(self, n: u64) -> Tick {
        Tick(self.0 + n)
    }

    /// Ticks elapsed from `earlier` to `self`.
    #[inline]
    pub fn since(self, earlier: Tick) -> u64 {
        self.0 - earlier.0
    }
}

impl std::ops::Add<u64> for Tick {
    type Output = Tick;
    #[inline]
    fn add(self, rhs: u64) -> Tick {
        Tick(self.0 + rhs)
    }
}

impl std::ops::Sub for Tick {
    type Output = u64;
    #[inline]
    fn sub(self, rhs: Tick) -> u64 {
        self.0 - rhs.0
    }
}

impl fmt::Display for Tick {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "T{}", self.0)
    }
}

// ── SimClock ──────────────────────────────────────────────────────────────────

/// Converts between tick counts and simulated seconds.
#[derive(Clone, Copy, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SimClock {
    /// Length of one tick, in seconds. Typically in `0.01..=0.05`.
    pub dt: f32,
    /// The current tick — advanced by `SimClock::advance()` once per tick.
    pub current_tick: Tick,
}

impl SimClock {
    pub fn new(dt: f32) -> Self {
        Self {
            dt,
            current_tick: Tick::ZERO,
        }
    }

    #[inline]
    pub fn advance(&mut self) {
        self.current_tick = self.current_tick.offset(1);
    }

    /// Elapsed simulated seconds since tick 0.
    #[inline]
    pub fn elapsed_secs(&self) -> f32 {
        self.current_tick.0 as f32 * self.dt
    }

    /// Convert a duration in seconds to a whole number of ticks, rounding up
    /// so a requested duration is never under-served by one tick.
    #[inline]
    pub fn ticks_for_secs(&self, secs: f32) -> u64 {
        (secs / self.dt).ceil().max(0.0) as u64
    }
}

impl fmt::Display for SimClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({:.2}s)", self.current_tick, self.elapsed_secs())
    }
}

// ── SimConfig ─────────────────────────────────────────────────────────────────

/// Spatial clustering configuration (`Simulation.groupDetection.*`).
#[derive(Clone, Copy, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GroupDetectionConfig {
    /// Squared distance threshold below which two agents are in the same
    /// group ("group_dd" in the originating model).
    pub threshold2: f32,
    /// Seconds between re-clusters.
    pub interval_secs: f32,
}

/// Top-level simulation configuration (`Simulation.*` section of the
/// configuration document, see [`crate::config`]).
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SimConfig {
    /// Tick length in seconds (`Simulation.dt`).
    pub dt: f32,

    /// Stop tick — the maximum total simulated time (`Simulation.Tmax`),
    /// expressed directly as a tick count.
    pub total_ticks: u64,

    /// Master RNG seed. The same seed always produces identical per-agent
    /// RNG streams (see [`crate::rng`]).
    pub seed: u64,

    /// Worker pool size. `None` ⇒ use hardware concurrency
    /// (`Simulation.numThreads = -1`).
    pub num_threads: Option<usize>,

    /// Spatial group clustering parameters.
    pub group_detection: GroupDetectionConfig,
}

impl SimConfig {
    #[inline]
    pub fn end_tick(&self) -> Tick {
        Tick(self.total_ticks)
    }

    pub fn make_clock(&self) -> SimClock {
        SimClock::new(self.dt)
    }

    /// How many ticks make up one `group_detection.interval_secs` period.
    #[inline]
    pub fn group_interval_ticks(&self) -> u64 {
        self.make_clock()
            .ticks_for_secs(self.group_detection.interval_secs)
            .max(1)
    }
}
