//! Spatial-subsystem error type.

use thiserror::Error;

use escape_core::{AgentId, SpeciesId};

/// Errors produced by `escape-spatial`.
#[derive(Debug, Error)]
pub enum SpatialError {
    #[error("no neighbor row for {species} agent {agent}")]
    NoRow { species: SpeciesId, agent: AgentId },

    #[error("population size mismatch: matrix sized for {expected}, got {actual}")]
    SizeMismatch { expected: usize, actual: usize },
}

pub type SpatialResult<T> = Result<T, SpatialError>;
