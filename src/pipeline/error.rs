//! Error types for the impressions pipeline.
//!
//! Every failure the pipeline can surface to the caller is one of these
//! variants. Join-loss and per-row division by zero are not errors: the first
//! is reported through `JoinStats`, the second becomes a null value.

use polars::prelude::PolarsError;
use thiserror::Error;

/// Errors produced while loading, transforming, aggregating or exporting tables.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Input bytes could not be decoded under the requested character encoding.
    #[error("Failed to decode '{file}' as {encoding}: {message}")]
    Decode {
        file: String,
        encoding: String,
        message: String,
    },

    /// File extension is not one of the supported tabular formats.
    #[error("Unsupported file format: '{0}'. Supported formats: csv, parquet")]
    UnsupportedFormat(String),

    /// A column the pipeline cannot do without is absent from the table.
    #[error("Missing column '{column}' ({context})")]
    MissingColumn { column: String, context: String },

    /// The totals rows carry no reach, so every percentage would be undefined.
    #[error("No reach data: the totals rows sum to zero uniques")]
    NoReachData,

    /// A requested target category does not exist in the breakdown.
    #[error("Unknown {dimension} category '{value}'. Available: {available}")]
    UnknownCategory {
        dimension: String,
        value: String,
        available: String,
    },

    /// Serializing an output buffer failed.
    #[error("Failed to export {format}: {message}")]
    Export { format: String, message: String },

    /// Error raised by the dataframe engine.
    #[error(transparent)]
    Polars(#[from] PolarsError),
}

impl PipelineError {
    pub fn missing_column(column: &str, context: impl Into<String>) -> Self {
        PipelineError::MissingColumn {
            column: column.to_string(),
            context: context.into(),
        }
    }

    pub fn export(format: &str, message: impl ToString) -> Self {
        PipelineError::Export {
            format: format.to_string(),
            message: message.to_string(),
        }
    }
}

/// Result alias used throughout the pipeline.
pub type Result<T> = std::result::Result<T, PipelineError>;
