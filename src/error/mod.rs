//! Error handling for the clinical timeline extractors.

use std::io;

use arrow::datatypes::DataType;
use arrow::error::ArrowError;
use chrono::NaiveDateTime;
use parquet::errors::ParquetError;

/// Specialized error type for the clinical timeline extractors
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A required column is absent from an input table
    #[error("Schema error: column '{column}' not found in {table} table")]
    ColumnNotFound {
        /// Logical name of the input table
        table: &'static str,
        /// Name of the missing column
        column: String,
    },

    /// A column exists but its data type cannot be used for the operation
    #[error("Type error: column '{column}' has type {actual}, expected {expected}")]
    InvalidDataType {
        /// Name of the offending column
        column: String,
        /// Human-readable description of the accepted types
        expected: String,
        /// The data type found in the table
        actual: String,
    },

    /// An interval whose start lies after its end
    #[error("Invalid interval for encounter {encounter}: in_dttm {in_dttm} is after out_dttm {out_dttm}")]
    InvalidInterval {
        /// Encounter the interval belongs to
        encounter: String,
        /// Start of the interval
        in_dttm: NaiveDateTime,
        /// End of the interval
        out_dttm: NaiveDateTime,
    },

    /// Invalid configuration parameter
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Arrow error
    #[error("Arrow error: {0}")]
    Arrow(#[from] ArrowError),

    /// Error processing Parquet data
    #[error("Parquet error: {0}")]
    Parquet(#[from] ParquetError),

    /// Error opening or reading a file
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Error parsing a JSON configuration file
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create a missing column error for the given table
    pub fn column_not_found(table: &'static str, column: impl Into<String>) -> Self {
        Self::ColumnNotFound {
            table,
            column: column.into(),
        }
    }

    /// Create a data type error for a column
    pub fn invalid_data_type(
        column: impl Into<String>,
        expected: impl Into<String>,
        actual: &DataType,
    ) -> Self {
        Self::InvalidDataType {
            column: column.into(),
            expected: expected.into(),
            actual: actual.to_string(),
        }
    }

    /// Whether this error reports a missing or mistyped input column
    #[must_use]
    pub const fn is_schema_error(&self) -> bool {
        matches!(
            self,
            Self::ColumnNotFound { .. } | Self::InvalidDataType { .. }
        )
    }
}

/// Result type for clinical timeline operations
pub type Result<T> = std::result::Result<T, Error>;
