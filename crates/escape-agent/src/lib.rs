//! `escape-agent` — Structure-of-Arrays prey/predator population storage.
//!
//! # Crate layout
//!
//! | Module         | Contents                                              |
//! |----------------|---------------------------------------------------------|
//! | [`prey`]       | `PreyPopulation`, `PreyFlightView`                      |
//! | [`predator`]   | `PredatorPopulation`, `PredatorFlightView`              |
//! | [`state_info`] | `StateInfo` — packed state-dispatch bookkeeping          |
//! | [`aero`]       | `AeroInfo`, `StateAero`                                 |
//! | [`flight`]     | `integrate_motion` — the midpoint flight integrator      |
//! | [`rngs`]       | `AgentRngs` — per-agent RNG storage                     |
//! | [`csv_io`]     | CSV snapshot load for initial-condition replay           |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                    |
//! |---------|-------------------------------------------------------------|
//! | `serde` | Derives `Serialize`/`Deserialize` on all public types.     |

pub mod aero;
pub mod csv_io;
pub mod flight;
pub mod predator;
pub mod prey;
pub mod rngs;
pub mod state_info;

pub use aero::{AeroInfo, StateAero};
pub use flight::integrate_motion;
pub use predator::{PredatorFlightView, PredatorPopulation};
pub use prey::{PreyFlightView, PreyPopulation};
pub use rngs::AgentRngs;
pub use state_info::StateInfo;
