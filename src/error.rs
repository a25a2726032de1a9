//! Error taxonomy for the aggregation pipeline.
//!
//! Every variant is terminal for the run that raises it. Messages always
//! name the dataset and the column or path involved.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading or aggregating a dataset.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AnalysisError {
    /// The external source could not be read or parsed.
    #[error("source '{dataset}' unavailable at {}: {reason}", path.display())]
    SourceUnavailable {
        dataset: String,
        path: PathBuf,
        reason: String,
    },

    /// A sum was requested over a column that does not hold numbers.
    #[error("column '{column}' of dataset '{dataset}' is not numeric")]
    NonNumericColumn { dataset: String, column: String },

    /// A percentage was requested with a zero denominator. `dataset` and
    /// `column` name the aggregate that summed to zero, when known.
    #[error(
        "cannot compute percentage of {numerator}: {}",
        zero_denominator(.dataset, .column)
    )]
    DivisionByZero {
        numerator: f64,
        dataset: Option<String>,
        column: Option<String>,
    },

    /// The referenced column is absent from the dataset schema.
    #[error("dataset '{dataset}' has no column '{column}'")]
    UnknownColumn { dataset: String, column: String },

    /// A record did not match the dataset schema while building.
    #[error("dataset '{dataset}': {detail}")]
    SchemaMismatch { dataset: String, detail: String },
}

impl AnalysisError {
    pub fn unknown_column(dataset: &str, column: &str) -> Self {
        AnalysisError::UnknownColumn {
            dataset: dataset.to_string(),
            column: column.to_string(),
        }
    }

    pub fn non_numeric(dataset: &str, column: &str) -> Self {
        AnalysisError::NonNumericColumn {
            dataset: dataset.to_string(),
            column: column.to_string(),
        }
    }

    /// Name the dataset column behind a zero denominator. Other errors
    /// pass through unchanged.
    pub fn with_denominator(self, dataset: &str, column: &str) -> Self {
        match self {
            AnalysisError::DivisionByZero { numerator, .. } => AnalysisError::DivisionByZero {
                numerator,
                dataset: Some(dataset.to_string()),
                column: Some(column.to_string()),
            },
            other => other,
        }
    }
}

fn zero_denominator(dataset: &Option<String>, column: &Option<String>) -> String {
    match (dataset, column) {
        (Some(dataset), Some(column)) => format!(
            "column '{}' of dataset '{}' sums to zero",
            column, dataset
        ),
        (Some(dataset), None) => format!("denominator from dataset '{}' is zero", dataset),
        _ => "denominator is zero".to_string(),
    }
}

pub type AnalysisResult<T> = Result<T, AnalysisError>;
