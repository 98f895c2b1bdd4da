use thiserror::Error;

use crate::model::RecordSource;

#[derive(Debug, Error)]
pub enum ReconError {
    /// TOML parse / deserialization error.
    #[error("config parse error: {0}")]
    ConfigParse(String),

    /// Config validation error (threshold out of range, negative tolerance, etc.).
    #[error("config validation error: {0}")]
    ConfigValidation(String),

    /// A record failed boundary validation before reaching the engine.
    #[error("{origin} record #{index} ('{subject}'): {reason}")]
    InvalidRecord {
        origin: RecordSource,
        index: usize,
        subject: String,
        reason: String,
    },

    /// Missing required column in a grade CSV.
    #[error("{origin} grades: missing column '{column}'")]
    MissingColumn { origin: RecordSource, column: String },

    /// Score cell is not a number.
    #[error("{origin} grades, row {row}: cannot parse score '{value}'")]
    ScoreParse {
        origin: RecordSource,
        row: usize,
        value: String,
    },

    /// Weight cell is not a positive integer.
    #[error("{origin} grades, row {row}: cannot parse weight '{value}'")]
    WeightParse {
        origin: RecordSource,
        row: usize,
        value: String,
    },

    /// Confidence cell is not a number.
    #[error("{origin} grades, row {row}: cannot parse confidence '{value}'")]
    ConfidenceParse {
        origin: RecordSource,
        row: usize,
        value: String,
    },

    /// Submission JSON could not be decoded.
    #[error("submission parse error: {0}")]
    SubmissionParse(String),

    /// Low-level CSV reader error.
    #[error("CSV error: {0}")]
    Csv(String),
}

pub type ReconResult<T> = Result<T, ReconError>;
