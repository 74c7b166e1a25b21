use escape_action::ActionError;
use escape_core::EscapeError;
use escape_state::StateError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SimError {
    #[error("simulation configuration error: {0}")]
    Config(String),

    #[error("{what} length {got} does not match agent count {expected}")]
    AgentCountMismatch {
        expected: usize,
        got:      usize,
        what:     &'static str,
    },

    #[error(transparent)]
    Core(#[from] EscapeError),

    #[error(transparent)]
    State(#[from] StateError),

    #[error(transparent)]
    Action(#[from] ActionError),
}

pub type SimResult<T> = Result<T, SimError>;
