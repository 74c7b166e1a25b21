//! `escape-spatial` — per-tick sorted neighbor indices and field-of-view
//! queries.
//!
//! # Crate layout
//!
//! | Module       | Contents                                              |
//! |--------------|----------------------------------------------------------|
//! | [`neighbor`] | `NeighborInfo`, `NeighborRow`, `NeighborMatrix`           |
//! | [`fov`]      | `while_topo`, `until_topo`, `in_fov`                      |
//! | [`error`]    | `SpatialError`, `SpatialResult<T>`                        |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                   |
//! |---------|-------------------------------------------------------------|
//! | `serde` | Derives `Serialize`/`Deserialize` on public types.        |

pub mod error;
pub mod fov;
pub mod neighbor;

pub use error::{SpatialError, SpatialResult};
pub use fov::{in_fov, until_topo, while_topo};
pub use neighbor::{NeighborInfo, NeighborMatrix, NeighborRow};
