//! Assembles a whole [`Simulation`](crate::Simulation) from a parsed
//! [`escape_core::config::Document`] (§6): `Simulation.*` for the clock and
//! group detection, `Prey.*`/`Pred.*` for population size, aero constants,
//! state packages, transitions, stress, and initial conditions.
//!
//! This is the one place that reaches across `escape-core`, `escape-agent`,
//! `escape-action`, and `escape-state`'s independent `from_json`/`*_from_json`
//! parsers and wires their results into a [`SimulationBuilder`] — each
//! sub-crate only knows how to parse its own config slice.

use escape_agent::AeroInfo;
use escape_core::config::{get, get_usize, Document};
use escape_core::InitialConditions;
use escape_action::StressAccumulator;
use escape_state::{predator_package_from_json, prey_package_from_json};

use crate::builder::SimulationBuilder;
use crate::error::{SimError, SimResult};
use crate::observer::ObserverChain;
use crate::sim::Simulation;

/// Parse `doc` and build a ready-to-run [`Simulation`], seeded with `seed`
/// (the config document carries no seed of its own — callers thread it in
/// from a CLI flag or a fixed constant, same as `original_source`'s `-seed`
/// argument).
pub fn build_simulation(doc: &Document, seed: u64, observers: ObserverChain) -> SimResult<Simulation> {
    let config = doc.sim_config(seed)?;

    let prey = doc.species("Prey")?;
    let pred = doc.species("Pred")?;

    let prey_aero = AeroInfo::from_json(get(prey, "aero")?)?;
    let pred_aero = AeroInfo::from_json(get(pred, "aero")?)?;

    let prey_count = get_usize(prey, "N")?;
    let pred_count = get_usize(pred, "N")?;

    let prey_states = get(prey, "states")?
        .as_array()
        .ok_or_else(|| SimError::Config("Prey.states must be an array".into()))?;
    let pred_states = get(pred, "states")?
        .as_array()
        .ok_or_else(|| SimError::Config("Pred.states must be an array".into()))?;

    let prey_pkg = prey_package_from_json(prey_states, get(prey, "transitions")?, &prey_aero)?;
    let pred_pkg = predator_package_from_json(pred_states, get(pred, "transitions")?, &pred_aero)?;

    let prey_init = InitialConditions::from_json(get(prey, "InitCondit")?)?;
    let pred_init = InitialConditions::from_json(get(pred, "InitCondit")?)?;

    let mut builder = SimulationBuilder::new(config, prey_count, pred_count, prey_aero, pred_aero, prey_pkg, pred_pkg, prey_init, pred_init);

    if let Some(stress_json) = prey.get("stress") {
        builder = builder.prey_stress(StressAccumulator::from_json(stress_json)?);
    }
    if let Some(stress_json) = pred.get("stress") {
        builder = builder.pred_stress(StressAccumulator::from_json(stress_json)?);
    }

    log::info!(
        "building simulation from config: {prey_count} prey ({} states), {pred_count} predators ({} states)",
        prey_pkg.states.len(),
        pred_pkg.states.len(),
    );

    builder.observers(observers).build()
}
