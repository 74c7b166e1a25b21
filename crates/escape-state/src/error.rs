use thiserror::Error;

#[derive(Debug, Error)]
pub enum StateError {
    #[error("state configuration error: {0}")]
    Config(String),

    #[error("transition interpolator: edges and matrices length mismatch ({edges} edges, {matrices} matrices)")]
    EdgeMatrixMismatch { edges: usize, matrices: usize },

    #[error("transition interpolator: no edges given")]
    NoEdges,

    #[error("transition matrix is {rows}x{cols}, expected {expected}x{expected}")]
    MatrixSizeMismatch { rows: usize, cols: usize, expected: usize },

    #[error("unknown action type {0:?}")]
    UnknownAction(String),

    #[error("state index {0} out of range")]
    InvalidState(usize),
}

pub type StateResult<T> = Result<T, StateError>;
