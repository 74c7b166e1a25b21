//! `escape-core` — foundational types for the collective-escape flight
//! simulator.
//!
//! This crate is a dependency of every other `escape-*` crate. It
//! intentionally has no `escape-*` dependencies and a minimal external stack
//! (`rand`/`rand_distr`, `glam`, `thiserror`, `serde_json`, `csv`, plus
//! optional `serde`).
//!
//! # What lives here
//!
//! | Module     | Contents                                                 |
//! |------------|-----------------------------------------------------------|
//! | [`ids`]    | `AgentId`, `GroupId`, `SpeciesId`                         |
//! | [`time`]   | `Tick`, `SimClock`, `SimConfig`, `GroupDetectionConfig`   |
//! | [`rng`]    | `AgentRng` (per-agent), `SimRng` (global)                 |
//! | [`math`]   | Body-frame-adjacent vector/scalar helpers                |
//! | [`frame`]  | `HeadSystem` — the orthonormal flight body frame          |
//! | [`config`] | `Document` — the parsed configuration file and accessors  |
//! | [`init`]   | Initial-condition samplers (random / flock / CSV)         |
//! | [`error`]  | `EscapeError`, `EscapeResult`                             |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                               |
//! |---------|-------------------------------------------------------|
//! | `serde` | Adds `Serialize`/`Deserialize` to all public types.   |

pub mod config;
pub mod error;
pub mod frame;
pub mod ids;
pub mod init;
pub mod math;
pub mod rng;
pub mod time;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use config::Document;
pub use error::{EscapeError, EscapeResult};
pub use frame::{FlightState, HeadSystem};
pub use ids::{AgentId, GroupId, SpeciesId};
pub use init::InitialConditions;
pub use rng::{AgentRng, SimRng};
pub use time::{GroupDetectionConfig, SimClock, SimConfig, Tick};
