use thiserror::Error;

#[derive(Debug, Error)]
pub enum CompactionError {
    /// Two live segments still share a length after the allowed repair passes.
    #[error("segment lengths not unique after {retries} repair passes: duplicated {duplicates:?}")]
    InvariantViolation { duplicates: Vec<u64>, retries: u32 },

    #[error("storage error: {0}")]
    Store(#[from] fakeman_core::CoreError),
}

#[derive(Debug, Error)]
pub enum SummarizeError {
    #[error("summarizer failed: {0}")]
    Failed(String),

    #[error("summarizer returned malformed output: {0}")]
    Malformed(String),
}
