use thiserror::Error;

#[derive(Debug, Error)]
pub enum ActionError {
    #[error("action configuration error: {0}")]
    Config(String),
}

pub type ActionResult<T> = Result<T, ActionError>;
