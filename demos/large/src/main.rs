//! `large` — throughput benchmark for the collective-escape flight simulator.
//!
//! Unlike a pure scheduling loop, this engine's per-tick cost is dominated by
//! the O(N·(N+M)) sorted-neighbor rebuild (`escape-spatial`), so "large" here
//! means thousands of agents, not millions — the `parallel` feature on
//! `escape-sim` (Rayon-backed flight integration) and the always-parallel
//! neighbor rebuild are what make this population size tractable.
//!
//! Run with:
//!   cargo run -p large --release

use std::time::Instant;

use anyhow::Result;

use escape_core::config::Document;
use escape_sim::{build_simulation, ObserverChain, SimObserver, Simulation};

// ── Constants ─────────────────────────────────────────────────────────────────

const SEED: u64 = 42;
const PREY_COUNT: usize = 4_000;
const PRED_COUNT: usize = 200;
const SIM_SECONDS: f32 = 3.0;

// ── Benchmark observer ────────────────────────────────────────────────────────

struct BenchObserver {
    start: Instant,
    last_report: Instant,
    ticks: u64,
}

impl SimObserver for BenchObserver {
    fn on_tick(&mut self, sim: &Simulation) {
        self.ticks += 1;
        if self.last_report.elapsed().as_secs_f64() < 0.5 {
            return;
        }
        self.last_report = Instant::now();
        let elapsed = self.start.elapsed().as_secs_f64();
        let agent_ticks = self.ticks * (sim.prey().count + sim.predators().count) as u64;
        println!(
            "  tick {:>5}  elapsed {:>6.2}s  {:>7.2} M agent-ticks/s  prey groups={:<4} pred groups={:<4}",
            sim.tick().0,
            elapsed,
            agent_ticks as f64 / elapsed / 1_000_000.0,
            sim.prey_groups().groups().len(),
            sim.pred_groups().groups().len(),
        );
    }
}

// ── Embedded configuration ────────────────────────────────────────────────────
//
// One cheap flocking state per species keeps the neighbor-scan cost
// representative of a real run without the bookkeeping overhead of multiple
// states/transitions — this benchmark is about raw per-tick throughput, not
// behavioral richness (see the `xsmall` example for that).

fn config_json() -> String {
    format!(
        r#"{{
        "Simulation": {{
            "dt": 0.02,
            "Tmax": {sim_seconds},
            "groupDetection": {{ "threshold": 8.0, "interval": 0.5 }},
            "numThreads": -1
        }},
        "Prey": {{
            "N": {prey_count},
            "aero": {{ "betaIn": 1.2, "bodyMass": 0.2, "cruiseSpeed": 10.0, "minSpeed": 6.0, "maxSpeed": 16.0, "w": 0.4 }},
            "InitCondit": {{ "type": "random", "radius": 400.0 }},
            "transitions": {{ "name": "constant", "TM": [[[1.0]]] }},
            "states": [
                {{
                    "name": "cruise",
                    "tr": 2,
                    "duration": 1.0e6,
                    "actions": [
                        {{ "type": "align_n", "topo": 7, "cfov": -0.2, "w": 1.0 }},
                        {{ "type": "cohere_centroid", "topo": 7, "cfov": -0.2, "w": 0.5 }},
                        {{ "type": "avoid_n_position", "topo": 4, "cfov": -1.0, "minsep": 3.0, "w": 1.0 }}
                    ]
                }}
            ]
        }},
        "Pred": {{
            "N": {pred_count},
            "aero": {{ "betaIn": 1.0, "bodyMass": 1.0, "cruiseSpeed": 14.0, "minSpeed": 9.0, "maxSpeed": 22.0, "w": 0.3 }},
            "InitCondit": {{ "type": "random", "radius": 400.0 }},
            "transitions": {{ "name": "constant", "TM": [[[1.0]]] }},
            "states": [
                {{
                    "name": "hunt",
                    "tr": 2,
                    "duration": 1.0e6,
                    "actions": [ {{ "type": "chase_closest_prey", "maxdist": 150.0, "w": 1.0 }} ]
                }}
            ]
        }}
    }}"#,
        sim_seconds = SIM_SECONDS,
        prey_count = PREY_COUNT,
        pred_count = PRED_COUNT,
    )
}

// ── main ──────────────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    env_logger::init();
    println!("=== large — collective-escape flight simulator benchmark ===");
    println!("Prey: {PREY_COUNT}  |  Predators: {PRED_COUNT}  |  Seed: {SEED}  |  parallel: enabled");
    println!();

    let doc = Document::from_str(&config_json())?;

    let mut observers = ObserverChain::new();
    observers.push(Box::new(BenchObserver {
        start: Instant::now(),
        last_report: Instant::now(),
        ticks: 0,
    }));

    let t_build = Instant::now();
    let mut sim = build_simulation(&doc, SEED, observers)?;
    println!("Build: {:.3}s", t_build.elapsed().as_secs_f64());
    println!(
        "Running {} ticks ({}s simulated @ dt={})…",
        sim.config().total_ticks,
        SIM_SECONDS,
        sim.config().dt,
    );
    println!();

    let t_run = Instant::now();
    sim.run();
    let elapsed = t_run.elapsed().as_secs_f64();

    let total_agents = (sim.prey().count + sim.predators().count) as f64;
    let total_agent_ticks = total_agents * sim.config().total_ticks as f64;
    println!();
    println!("Simulation complete in {:.3}s", elapsed);
    println!(
        "Throughput: {:.2} M agent-ticks/s  (total {:.0})",
        total_agent_ticks / elapsed / 1_000_000.0,
        total_agent_ticks,
    );

    Ok(())
}
