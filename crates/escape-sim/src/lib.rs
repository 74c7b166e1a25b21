//! `escape-sim` — the tick-loop scheduler and read-only facade for the
//! collective-escape flight simulator (`spec.md` §4.8, §4.10).
//!
//! # Tick loop
//!
//! ```text
//! PreTick notify
//! neighbor refresh      — rebuild all four observer/other NeighborMatrix pairs
//! state step            — step_prey/step_predator for agents due this tick
//! stress integrate       — StressAccumulator::apply for every agent, every tick
//! flight integrate        — integrate_motion + HeadSystem::update, every agent
//! group track/cluster    — track() every tick; cluster() on the configured interval
//! tick advance
//! Tick notify
//! ```
//!
//! # Crate layout
//!
//! | Module      | Contents                                               |
//! |-------------|-----------------------------------------------------------|
//! | [`sim`]     | `Simulation` — the tick loop and read-only facade          |
//! | [`builder`] | `SimulationBuilder` — placement, staggering, package wiring |
//! | [`observer`]| `SimObserver`, `ObserverChain`, `NoopObserver`             |
//! | [`config`]  | `build_simulation` — assembles a `Simulation` from a `Document` |
//! | [`error`]   | `SimError`, `SimResult<T>`                                |
//!
//! # Quick-start
//!
//! ```rust,ignore
//! use escape_sim::SimulationBuilder;
//!
//! let mut sim = SimulationBuilder::new(
//!     config, prey_count, pred_count, prey_aero, pred_aero,
//!     prey_pkg, pred_pkg, prey_init, pred_init,
//! )
//! .prey_stress(stress)
//! .build()?;
//! sim.run();
//! ```

pub mod builder;
pub mod config;
pub mod error;
pub mod observer;
pub mod sim;


pub use builder::SimulationBuilder;
pub use config::build_simulation;
pub use error::{SimError, SimResult};
pub use observer::{NoopObserver, ObserverChain, SimObserver};
pub use sim::Simulation;
