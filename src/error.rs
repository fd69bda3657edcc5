//! Error types for bramm.

use bramm_types::table::RowArityError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, BrammError>;

#[derive(Debug, Error)]
pub enum BrammError {
    /// Unusable configuration: unknown mode, non-positive step, bad quantile.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Input data that violates a documented range or shape.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Missing column: '{column}'")]
    MissingColumn { column: String },

    /// A computation needs at least one usable row.
    #[error("Empty input: {0}")]
    EmptyInput(String),

    /// Boundary source is not a usable (multi)polygon.
    #[error("Malformed geometry: {0}")]
    Geometry(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl BrammError {
    pub fn missing_column(column: impl Into<String>) -> Self {
        BrammError::MissingColumn {
            column: column.into(),
        }
    }
}

impl From<RowArityError> for BrammError {
    fn from(err: RowArityError) -> Self {
        BrammError::InvalidInput(err.to_string())
    }
}
