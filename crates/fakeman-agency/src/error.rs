use thiserror::Error;

#[derive(Debug, Error)]
pub enum AgencyError {
    #[error("compaction error: {0}")]
    Compaction(#[from] fakeman_memory::CompactionError),

    #[error("scenario error: {0}")]
    Scenario(#[from] fakeman_scenario::ScenarioError),

    #[error("storage error: {0}")]
    Store(#[from] fakeman_core::CoreError),

    #[error("mailbox error: {0}")]
    Mailbox(String),

    #[error("agency: {0}")]
    Internal(String),
}

impl AgencyError {
    /// Errors that must stop the decision loop.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            AgencyError::Compaction(fakeman_memory::CompactionError::InvariantViolation { .. })
                | AgencyError::Internal(_)
        )
    }
}

/// Failure of one text-generation call. Never fatal: the tick waits.
#[derive(Debug, Error)]
pub enum GeneratorError {
    #[error("generator timed out after {0} ms")]
    Timeout(u64),

    #[error("generator failed: {0}")]
    Failed(String),

    #[error("generator returned no text")]
    Empty,

    #[error("generator io: {0}")]
    Io(#[from] std::io::Error),
}
