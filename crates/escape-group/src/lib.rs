//! `escape-group` — spatial group clustering for the escape flight
//! simulator.
//!
//! # Crate layout
//!
//! | Module     | Contents                                   |
//! |------------|----------------------------------------------|
//! | [`tracker`]| `GroupDescr`, `GroupTracker`                  |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                            |
//! |---------|--------------------------------------------------|
//! | `serde` | Derives `Serialize`/`Deserialize` on public types.|

pub mod tracker;

pub use tracker::{GroupDescr, GroupTracker};
