//! Initial-condition strategies (§3.5, `original_source/model/init_cond.hpp`).
//!
//! Each species population is seeded one of three ways: uniformly at random
//! inside a cube, dropped into a rough flock formation around a heading, or
//! replayed from a CSV snapshot of a previous run. Row layout differs per
//! species (`escape-agent` owns the exact column counts), so this module only
//! provides the position/heading samplers and the CSV reader plumbing; the
//! per-species row parsing lives next to the agent types that consume it.

use std::fs::File;
use std::path::{Path, PathBuf};

use glam::Vec3;
use rand::Rng;
use rand_distr::{Distribution, Normal};
use serde_json::Value;

use crate::config::{get_f32, get_f32_or, get_str, get_vec3};
use crate::error::{EscapeError, EscapeResult};
use crate::math::WORLD_UP;
use crate::rng::AgentRng;

/// A species' `InitCondit` config section, resolved to a strategy.
#[derive(Clone, Debug)]
pub enum InitialConditions {
    /// Uniform random position in `[0, radius)^3`, uniform random heading.
    Random { radius: f32 },
    /// Dropped near `(x, altitude, z)` with `x, z ~ U(0, radius)`, heading
    /// `dir0` rotated about the world-up axis by `N(0, raddev)` radians.
    Flock {
        altitude: f32,
        dir0: Vec3,
        radius: f32,
        raddev: f32,
    },
    /// Replay positions/headings recorded by a previous run.
    Csv { path: PathBuf },
}

impl InitialConditions {
    pub fn from_json(j: &Value) -> EscapeResult<Self> {
        let kind = get_str(j, "type")?;
        match kind {
            "random" => Ok(InitialConditions::Random {
                radius: get_f32(j, "radius")?,
            }),
            "flock" => {
                let dir0 = j
                    .get("dir")
                    .map(|_| get_vec3(j, "dir"))
                    .transpose()?
                    .unwrap_or(Vec3::new(1.0, 0.0, 0.0));
                Ok(InitialConditions::Flock {
                    altitude: get_f32(j, "altitude")?,
                    dir0,
                    radius: get_f32(j, "radius")?,
                    raddev: get_f32_or(j, "raddev", 0.1),
                })
            }
            "csv" => Ok(InitialConditions::Csv {
                path: PathBuf::from(get_str(j, "file")?),
            }),
            other => Err(EscapeError::Config(format!(
                "unknown InitCondit.type \"{other}\""
            ))),
        }
    }

    /// `true` for [`InitialConditions::Csv`] — callers must open and stream
    /// the file themselves (row layout is species-specific).
    pub fn is_csv(&self) -> bool {
        matches!(self, InitialConditions::Csv { .. })
    }

    pub fn csv_path(&self) -> Option<&Path> {
        match self {
            InitialConditions::Csv { path } => Some(path),
            _ => None,
        }
    }

    /// Sample one `(pos, dir)` pair. Panics if called on [`Self::Csv`] —
    /// callers must check [`Self::is_csv`] first.
    pub fn sample(&self, rng: &mut AgentRng) -> (Vec3, Vec3) {
        match *self {
            InitialConditions::Random { radius } => random_sample(rng, radius),
            InitialConditions::Flock {
                altitude,
                dir0,
                radius,
                raddev,
            } => flock_sample(rng, altitude, dir0, radius, raddev),
            InitialConditions::Csv { .. } => {
                unreachable!("csv initial conditions must be streamed via csv_reader()")
            }
        }
    }
}

/// `pos = U(0, radius)^3`, `dir` uniform on the unit sphere.
pub fn random_sample(rng: &mut AgentRng, radius: f32) -> (Vec3, Vec3) {
    let pos = Vec3::new(
        rng.gen_range(0.0..radius),
        rng.gen_range(0.0..radius),
        rng.gen_range(0.0..radius),
    );
    (pos, random_unit_vec3(rng.inner()))
}

/// `pos = radius * U(0,1)^3 + (0, altitude, 0)`, `dir = Rot_up(N(0, raddev)) * dir0`.
pub fn flock_sample(rng: &mut AgentRng, altitude: f32, dir0: Vec3, radius: f32, raddev: f32) -> (Vec3, Vec3) {
    let pos = Vec3::new(
        radius * rng.gen_range(0.0..1.0),
        radius * rng.gen_range(0.0..1.0),
        radius * rng.gen_range(0.0..1.0),
    ) + Vec3::new(0.0, altitude, 0.0);

    let normal = Normal::new(0.0f32, raddev).expect("raddev must be finite and non-negative");
    let theta = normal.sample(rng.inner());
    let dir = crate::math::rotate(dir0, theta, WORLD_UP);
    (pos, dir)
}

/// Uniform-on-sphere direction sample (`glmutils::unit_vec3`).
pub fn random_unit_vec3<R: Rng + ?Sized>(rng: &mut R) -> Vec3 {
    loop {
        let v = Vec3::new(
            rng.gen_range(-1.0..1.0),
            rng.gen_range(-1.0..1.0),
            rng.gen_range(-1.0..1.0),
        );
        let len2 = v.length_squared();
        if len2 > 1e-6 && len2 <= 1.0 {
            return v / len2.sqrt();
        }
    }
}

/// Open a CSV reader positioned after the header row, mirroring the
/// `ifstream::ignore(2048, '\n')` skip in the source.
pub fn csv_reader(path: &Path) -> EscapeResult<csv::Reader<File>> {
    log::debug!("reading initial-condition CSV from {}", path.display());
    let file = File::open(path)?;
    Ok(csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(file))
}
