//! Hierarchical configuration document (§6).
//!
//! The originating model threads a single `nlohmann::json` object through
//! every constructor (`Prey::Prey(idx, J)`, `align_n(idx, J)`, ...) and pulls
//! fields out with `J["key"]` at the point of use, throwing
//! `std::runtime_error` on anything missing or malformed. `serde_json::Value`
//! plays the same role here; [`Document`] owns the parsed root and the
//! handful of top-level (`Simulation.*`) fields that `escape-sim` needs
//! before any species-specific parsing begins. Per-action and per-state
//! parsing stays where it happens in the originating model: at the type
//! that consumes the fields (`escape-action`, `escape-state`), each reading
//! its own `&serde_json::Value` slice via [`get`]/[`get_f32`]/etc.

use std::path::PathBuf;

use serde_json::Value;

use crate::error::{EscapeError, EscapeResult};
use crate::time::{GroupDetectionConfig, SimConfig};

/// The full, parsed configuration document (`Simulation`, `Prey`, `Pred`
/// top-level keys).
#[derive(Clone, Debug)]
pub struct Document {
    root: Value,
}

impl Document {
    pub fn from_str(s: &str) -> EscapeResult<Self> {
        let root: Value = serde_json::from_str(s)?;
        log::debug!("parsed configuration document ({} bytes)", s.len());
        Ok(Document { root })
    }

    pub fn from_reader<R: std::io::Read>(r: R) -> EscapeResult<Self> {
        let root: Value = serde_json::from_reader(r)?;
        log::debug!("parsed configuration document from reader");
        Ok(Document { root })
    }

    /// Raw value for a top-level species section (`"Prey"` / `"Pred"`).
    pub fn species(&self, name: &str) -> EscapeResult<&Value> {
        get(&self.root, name)
    }

    /// `gui.headless` — `true` unless explicitly set to `false`.
    pub fn headless(&self) -> bool {
        self.root
            .get("gui")
            .and_then(|g| g.get("headless"))
            .and_then(Value::as_bool)
            .unwrap_or(true)
    }

    pub fn sim_config(&self, seed: u64) -> EscapeResult<SimConfig> {
        let sim = get(&self.root, "Simulation")?;
        let dt = get_f32(sim, "dt")?;
        let tmax = get_f32(sim, "Tmax")?;
        let gd = get(sim, "groupDetection")?;
        let threshold = get_f32(gd, "threshold")?;
        let interval_secs = get_f32(gd, "interval")?;
        let num_threads = sim
            .get("numThreads")
            .and_then(Value::as_i64)
            .and_then(|n| if n < 0 { None } else { Some(n as usize) });

        if tmax <= 0.0 {
            return Err(EscapeError::Config(
                "Simulation.Tmax must be positive (headless runs cannot use an unlimited Tmax)"
                    .into(),
            ));
        }

        log::info!(
            "Simulation.dt={dt} Tmax={tmax} ({} ticks) groupDetection.threshold={threshold} interval={interval_secs}s",
            (tmax / dt).round() as u64,
        );

        Ok(SimConfig {
            dt,
            total_ticks: (tmax / dt).round() as u64,
            seed,
            num_threads,
            group_detection: GroupDetectionConfig {
                threshold2: threshold * threshold,
                interval_secs,
            },
        })
    }

    pub fn analysis_config(&self) -> EscapeResult<AnalysisConfig> {
        let sim = get(&self.root, "Simulation")?;
        let Some(analysis) = sim.get("Analysis") else {
            return Ok(AnalysisConfig::default());
        };
        let data_folder = analysis
            .get("data_folder")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(PathBuf::from);

        let mut observers = Vec::new();
        if let Some(arr) = analysis.get("Observers").and_then(Value::as_array) {
            for spec in arr {
                let raw_type = get_str(spec, "type")?.to_string();
                let (enabled, type_name) = match raw_type.strip_prefix('~') {
                    Some(rest) => (false, rest.to_string()),
                    None => (true, raw_type),
                };
                observers.push(ObserverSpec {
                    type_name,
                    enabled,
                    params: spec.clone(),
                });
            }
        }

        Ok(AnalysisConfig {
            data_folder,
            observers,
        })
    }
}

/// `Simulation.Analysis.*`.
#[derive(Clone, Debug, Default)]
pub struct AnalysisConfig {
    pub data_folder: Option<PathBuf>,
    pub observers: Vec<ObserverSpec>,
}

/// One entry of `Simulation.Analysis.Observers[]`.
#[derive(Clone, Debug)]
pub struct ObserverSpec {
    pub type_name: String,
    /// `false` when the config prefixed `type` with `~`.
    pub enabled: bool,
    pub params: Value,
}

// ── JSON access helpers ──────────────────────────────────────────────────────

/// Look up a required object key, turning a miss into a `ConfigError`-shaped
/// [`EscapeError::Config`] rather than panicking the way `J["key"]` would in
/// the source (`nlohmann::json` throws on a missing key accessed via
/// `.at()`; indexing with `operator[]` default-constructs, which the source
/// relies on in a few places and we do not replicate).
pub fn get<'a>(j: &'a Value, key: &str) -> EscapeResult<&'a Value> {
    j.get(key)
        .ok_or_else(|| EscapeError::Config(format!("missing key \"{key}\"")))
}

pub fn get_f32(j: &Value, key: &str) -> EscapeResult<f32> {
    get(j, key)?
        .as_f64()
        .map(|v| v as f32)
        .ok_or_else(|| EscapeError::Config(format!("\"{key}\" is not a number")))
}

pub fn get_usize(j: &Value, key: &str) -> EscapeResult<usize> {
    get(j, key)?
        .as_u64()
        .map(|v| v as usize)
        .ok_or_else(|| EscapeError::Config(format!("\"{key}\" is not a non-negative integer")))
}

pub fn get_bool(j: &Value, key: &str) -> EscapeResult<bool> {
    get(j, key)?
        .as_bool()
        .ok_or_else(|| EscapeError::Config(format!("\"{key}\" is not a bool")))
}

pub fn get_str<'a>(j: &'a Value, key: &str) -> EscapeResult<&'a str> {
    get(j, key)?
        .as_str()
        .ok_or_else(|| EscapeError::Config(format!("\"{key}\" is not a string")))
}

/// `J.contains(key) ? J[key] : default` idiom used throughout the source
/// for optional fields (`"copyable"`, `"select_prob"`, `"cached_rows"`, ...).
pub fn get_f32_or(j: &Value, key: &str, default: f32) -> f32 {
    j.get(key).and_then(Value::as_f64).map_or(default, |v| v as f32)
}

pub fn get_bool_or(j: &Value, key: &str, default: bool) -> bool {
    j.get(key).and_then(Value::as_bool).unwrap_or(default)
}

pub fn get_vec3(j: &Value, key: &str) -> EscapeResult<glam::Vec3> {
    let arr = get(j, key)?
        .as_array()
        .ok_or_else(|| EscapeError::Config(format!("\"{key}\" is not an array")))?;
    if arr.len() != 3 {
        return Err(EscapeError::Config(format!("\"{key}\" must have 3 components")));
    }
    let c = |i: usize| {
        arr[i]
            .as_f64()
            .map(|v| v as f32)
            .ok_or_else(|| EscapeError::Config(format!("\"{key}\"[{i}] is not a number")))
    };
    Ok(glam::Vec3::new(c(0)?, c(1)?, c(2)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"{
        "Simulation": {
            "dt": 0.02,
            "Tmax": 10.0,
            "groupDetection": { "threshold": 5.0, "interval": 1.0 },
            "numThreads": -1
        }
    }"#;

    #[test]
    fn parses_sim_config() {
        let doc = Document::from_str(MINIMAL).unwrap();
        let cfg = doc.sim_config(42).unwrap();
        assert_eq!(cfg.dt, 0.02);
        assert_eq!(cfg.total_ticks, 500);
        assert_eq!(cfg.num_threads, None);
        assert_eq!(cfg.group_detection.threshold2, 25.0);
    }

    #[test]
    fn missing_species_section_is_config_error() {
        let doc = Document::from_str(MINIMAL).unwrap();
        assert!(matches!(doc.species("Prey"), Err(EscapeError::Config(_))));
    }

    #[test]
    fn unlimited_tmax_rejected() {
        let doc = Document::from_str(
            r#"{"Simulation":{"dt":0.02,"Tmax":0.0,"groupDetection":{"threshold":1,"interval":1}}}"#,
        )
        .unwrap();
        assert!(doc.sim_config(0).is_err());
    }

    #[test]
    fn disabled_observer_prefix_is_stripped() {
        let doc = Document::from_str(
            r#"{"Simulation":{"dt":0.02,"Tmax":1.0,"groupDetection":{"threshold":1,"interval":1},
                 "Analysis":{"data_folder":"out","Observers":[{"type":"~diffusion"}]}}}"#,
        )
        .unwrap();
        let ac = doc.analysis_config().unwrap();
        assert_eq!(ac.observers.len(), 1);
        assert!(!ac.observers[0].enabled);
        assert_eq!(ac.observers[0].type_name, "diffusion");
    }
}
