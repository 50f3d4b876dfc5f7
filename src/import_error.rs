use crate::db::DbError;

/// Failures raised by the import pipeline.
///
/// Structural problems (file, format, rows) abort parsing. Content problems never
/// surface here; they are collected in a `ValidationOutcome` instead, and only turn
/// into `ValidationBlocked` when a caller tries to commit invalid data.
#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("Invalid file: {0}")]
    InvalidFile(String),

    #[error("Missing required columns: {}", missing.join(", "))]
    InvalidFormat { missing: Vec<String> },

    #[error("File contains no data rows")]
    EmptyInput,

    #[error("Row {row_index}: {reason}")]
    Transform { row_index: usize, reason: String },

    #[error("Import blocked by {error_count} validation error(s)")]
    ValidationBlocked { error_count: usize },

    #[error("Persistence failed: {0}")]
    Persistence(#[from] DbError),

    #[error("Failed to read CSV: {0}")]
    Csv(#[from] csv::Error),
}

impl ImportError {
    /// Stable machine-readable name used in API error bodies
    pub fn kind(&self) -> &'static str {
        match self {
            ImportError::InvalidFile(_) => "invalid_file",
            ImportError::InvalidFormat { .. } => "invalid_format",
            ImportError::EmptyInput => "empty_input",
            ImportError::Transform { .. } => "transform_error",
            ImportError::ValidationBlocked { .. } => "validation_blocked",
            ImportError::Persistence(_) => "persistence_failure",
            ImportError::Csv(_) => "invalid_format",
        }
    }
}
