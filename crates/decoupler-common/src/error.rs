use thiserror::Error;

pub type Result<T> = std::result::Result<T, DecouplerError>;

#[derive(Debug, Error)]
pub enum DecouplerError {
    #[error("method '{0}' not available, see MethodKind::ALL for the supported methods")]
    UnknownMethod(String),

    #[error("shape mismatch in '{name}': expected {expected} values, got {actual}")]
    ShapeMismatch {
        name: String,
        expected: usize,
        actual: usize,
    },

    #[error("network column '{0}' not found in input")]
    MissingColumn(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
