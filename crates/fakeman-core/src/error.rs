use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("io error at {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("serde error: {0}")]
    Serde(#[from] serde_json::Error),
}

impl CoreError {
    pub fn io(path: &std::path::Path, source: std::io::Error) -> Self {
        CoreError::Io { path: path.display().to_string(), source }
    }
}
