//! `escape-action` — per-tick action primitives and the read-only view they
//! query, shared by prey and predator state packages (`escape-state`).
//!
//! # Crate layout
//!
//! | Module               | Contents                                              |
//! |-----------------------|-------------------------------------------------------|
//! | [`action`]            | `PreyAction`/`PredatorAction` traits, `*ActionCtx`     |
//! | [`view`]              | `TickView` — the read-only per-tick snapshot           |
//! | [`stress`]            | Stress sources (`predator_distance`, `neighbors_stress`)|
//! | [`align`]             | `AlignN`, `AlignDirection`                            |
//! | [`cohesion`]          | `CohereCentroid`, `CohereCentroidDistance`            |
//! | [`avoidance`]         | `AvoidNPosition`, `AvoidNDirection`                   |
//! | [`predator_evasion`]  | Prey actions reacting to a predator                   |
//! | [`homing`]            | `RoostAttraction`, `AltitudeAttraction`, `LevelAttraction`, `Wiggle` |
//! | [`predator_actions`]  | Predator-side targeting and pursuit                    |
//! | [`error`]             | `ActionError`, `ActionResult<T>`                       |
//!
//! # Design notes
//!
//! Actions are stateless functors parameterized by config constants set at
//! construction; the per-agent mutable state they touch lives in the
//! population, handed down each tick as a small `*ActionCtx` borrow disjoint
//! from the read-only `TickView`. `escape-state` drives the `on_entry`/
//! `assess_entry`/`apply` dispatch described on each trait.

pub mod action;
pub mod align;
pub mod avoidance;
pub mod cohesion;
pub mod error;
pub mod homing;
pub mod predator_actions;
pub mod predator_evasion;
pub mod stress;
pub mod view;

pub use action::{PredatorAction, PredatorActionCtx, PreyAction, PreyActionCtx};
pub use align::{AlignDirection, AlignN};
pub use avoidance::{AvoidNDirection, AvoidNPosition};
pub use cohesion::{CohereCentroid, CohereCentroidDistance};
pub use error::{ActionError, ActionResult};
pub use homing::{AltitudeAttraction, LevelAttraction, RoostAttraction, Wiggle};
pub use predator_actions::{ChaseClosestPrey, GroupSelectionMode, Hold, HoldCurrent, LockOnClosestPrey, SelectGroup, Set, SetRetreat, Shadowing};
pub use predator_evasion::{AvoidPPosition, CopyEscape, Dive, MoveAwayFromPredator, RandomTTurnGammaPred, RandomTTurnPred, Scatter, ZigZag};
pub use stress::{neighbors_stress, predator_distance, NeighborsStressSource, PredatorDistanceSource, StressAccumulator, StressSource};
pub use view::TickView;
