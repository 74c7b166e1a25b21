//! xsmall — smallest end-to-end example of the collective-escape flight
//! simulator: a dozen prey flocking under a two-predator threat, driven
//! entirely from an embedded configuration document.
//!
//! Scale comment: production runs configure `Prey.N`/`Pred.N` in the
//! thousands and drive `Simulation.numThreads` from hardware concurrency;
//! this example keeps both small enough to eyeball the printed summary.
//!
//! Run with:
//!   cargo run -p xsmall --release

use std::path::Path;
use std::time::Instant;

use anyhow::Result;

use escape_core::config::Document;
use escape_output::{CsvWriter, SimOutputObserver};
use escape_sim::{build_simulation, ObserverChain};

// ── Constants ─────────────────────────────────────────────────────────────────

const SEED: u64 = 42;

// ── Embedded configuration ────────────────────────────────────────────────────

const CONFIG_JSON: &str = r#"{
    "Simulation": {
        "dt": 0.02,
        "Tmax": 6.0,
        "groupDetection": { "threshold": 6.0, "interval": 1.0 },
        "numThreads": -1
    },
    "Prey": {
        "N": 12,
        "aero": { "betaIn": 1.2, "bodyMass": 0.2, "cruiseSpeed": 10.0, "minSpeed": 6.0, "maxSpeed": 16.0, "w": 0.4 },
        "InitCondit": { "type": "flock", "altitude": 5.0, "dir": [1.0, 0.0, 0.0], "radius": 40.0, "raddev": 0.2 },
        "stress": {
            "decay": 0.5,
            "sources": [ { "type": "predator_distance", "near": 10.0, "far": 50.0, "cfov": -1.0 } ]
        },
        "transitions": {
            "name": "piecewise_linear_interpolator",
            "edges": [0.0, 1.0],
            "TM": [
                [[0.995, 0.005], [0.2, 0.8]],
                [[0.5, 0.5], [0.02, 0.98]]
            ]
        },
        "states": [
            {
                "name": "cruise",
                "tr": 2,
                "duration": 1.0e6,
                "actions": [
                    { "type": "align_n", "topo": 6, "cfov": -0.2, "w": 1.0 },
                    { "type": "cohere_centroid_distance", "topo": 6, "cfov": -0.2, "min_w_dist": 2.0, "max_w_dist": 25.0, "w": 0.6 },
                    { "type": "avoid_n_position", "topo": 4, "cfov": -1.0, "minsep": 2.5, "w": 1.2 }
                ]
            },
            {
                "name": "flee",
                "copyable": true,
                "tr": 1,
                "duration": 1.5,
                "actions": [
                    { "type": "copy_escape", "topo": 4, "cfov": -0.3 },
                    { "type": "avoid_p_position", "minsep": 60.0, "w": 1.0 },
                    { "type": "random_t_turn_gamma_pred", "angle_shape": 2.0, "angle_scale": 0.6, "duration_shape": 2.0, "duration_scale": 0.5, "w": 1.0 },
                    { "type": "dive", "max_dive": 8.0, "pitch_rate": 1.5, "w": 0.8 }
                ]
            }
        ]
    },
    "Pred": {
        "N": 2,
        "aero": { "betaIn": 1.0, "bodyMass": 1.0, "cruiseSpeed": 14.0, "minSpeed": 9.0, "maxSpeed": 22.0, "w": 0.3 },
        "InitCondit": { "type": "random", "radius": 60.0 },
        "transitions": { "name": "constant", "TM": [[[1.0]]] },
        "states": [
            {
                "name": "hunt",
                "tr": 1,
                "duration": 1.0e6,
                "actions": [ { "type": "chase_closest_prey", "maxdist": 120.0, "w": 1.0 } ]
            }
        ]
    }
}"#;

// ── main ──────────────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    env_logger::init();
    println!("=== xsmall — collective-escape flight simulator ===");
    println!("Seed: {SEED}");
    println!();

    let doc = Document::from_str(CONFIG_JSON)?;

    std::fs::create_dir_all("output/xsmall")?;
    let writer = CsvWriter::new(Path::new("output/xsmall"))?;
    let mut observers = ObserverChain::new();
    observers.push(Box::new(SimOutputObserver::new(writer)));

    let mut sim = build_simulation(&doc, SEED, observers)?;
    println!(
        "Prey: {}  |  Predators: {}  |  total ticks: {}",
        sim.prey().count,
        sim.predators().count,
        sim.config().total_ticks,
    );
    println!();

    let t0 = Instant::now();
    sim.run();
    let elapsed = t0.elapsed();

    println!("Simulation complete in {:.3} s ({})", elapsed.as_secs_f64(), sim.clock());
    println!("  output/xsmall/prey_snapshots.csv");
    println!("  output/xsmall/predator_snapshots.csv");
    println!("  output/xsmall/tick_summaries.csv");
    println!();

    println!("Final prey groups: {}", sim.prey_groups().groups().len());
    println!("Final predator groups: {}", sim.pred_groups().groups().len());

    let avg_stress: f32 = sim.color_stress_prey().iter().sum::<f32>() / sim.prey().count as f32;
    println!("Mean prey stress: {avg_stress:.3}");
    println!();

    println!("{:<8} {:<8} {:<10} {:<8}", "Agent", "State", "Speed", "Stress");
    println!("{}", "-".repeat(36));
    for i in 0..sim.prey().count {
        println!(
            "{:<8} {:<8} {:<10.2} {:<8.3}",
            i,
            sim.color_state_prey()[i],
            sim.color_speed_prey()[i],
            sim.color_stress_prey()[i],
        );
    }

    Ok(())
}
