use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error("storage error: {0}")]
    Store(#[from] fakeman_core::CoreError),

    #[error("invalid scenario input: {0}")]
    Invalid(String),
}
