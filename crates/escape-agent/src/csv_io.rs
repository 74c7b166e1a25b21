//! CSV snapshot format for replaying/recording initial conditions
//! (`original_source/model/agents/prey.cpp::stream_{from,to}_csv`,
//! `predator.cpp` counterpart).
//!
//! Row layout intentionally differs per species, matching the source: prey
//! rows carry a full 3D position, predator rows carry only `pos.x, pos.y`
//! (the predator's vertical coordinate is not part of its recorded state —
//! a quirk of the original format preserved here rather than "fixed", since
//! nothing downstream of initial placement depends on a predator's
//! z-position matching anything in particular).

use std::path::Path;

use glam::Vec3;

use escape_core::error::EscapeResult;
use escape_core::init::csv_reader;

/// `id, pos.x, pos.y, pos.z, dir.x, dir.y, dir.z` — `id` is read and
/// discarded (rows are assigned to agents in file order).
pub fn load_prey_csv(path: &Path) -> EscapeResult<Vec<(Vec3, Vec3)>> {
    let mut reader = csv_reader(path)?;
    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        let f = |i: usize| -> f32 { record[i].trim().parse().unwrap_or(0.0) };
        let pos = Vec3::new(f(1), f(2), f(3));
        let dir = Vec3::new(f(4), f(5), f(6));
        rows.push((pos, dir));
    }
    Ok(rows)
}

/// `id, pos.x, pos.y, dir.x, dir.y, dir.z` — position is 2-component; `z`
/// is left at `0.0`.
pub fn load_predator_csv(path: &Path) -> EscapeResult<Vec<(Vec3, Vec3)>> {
    let mut reader = csv_reader(path)?;
    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        let f = |i: usize| -> f32 { record[i].trim().parse().unwrap_or(0.0) };
        let pos = Vec3::new(f(1), f(2), 0.0);
        let dir = Vec3::new(f(3), f(4), f(5));
        rows.push((pos, dir));
    }
    Ok(rows)
}
