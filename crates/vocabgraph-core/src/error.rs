//! Error types for transformation and extraction.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while turning extract files into record files.
///
/// Every variant aborts the file being transformed. Record files written for
/// earlier tables are left in place.
#[derive(Error, Debug)]
pub enum TransformError {
    /// Input file could not be opened or its header read
    #[error("failed to open '{path}': {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// Output file could not be created
    #[error("failed to create '{path}': {source}")]
    Create {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Malformed CSV while reading or writing
    #[error("CSV error in '{path}': {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// A required column is absent from the header
    #[error("'{path}' is missing required column '{column}'")]
    MissingColumn { path: PathBuf, column: String },

    /// A field failed validation
    #[error("'{path}' row {row}: invalid {column} '{value}': {reason}")]
    InvalidValue {
        path: PathBuf,
        row: u64,
        column: String,
        value: String,
        reason: String,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl TransformError {
    pub fn open(path: impl Into<PathBuf>, source: csv::Error) -> Self {
        Self::Open {
            path: path.into(),
            source,
        }
    }

    pub fn create(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Create {
            path: path.into(),
            source,
        }
    }

    pub fn csv(path: impl Into<PathBuf>, source: csv::Error) -> Self {
        Self::Csv {
            path: path.into(),
            source,
        }
    }

    pub fn missing_column(path: impl Into<PathBuf>, column: impl Into<String>) -> Self {
        Self::MissingColumn {
            path: path.into(),
            column: column.into(),
        }
    }

    pub fn invalid_value(
        path: impl Into<PathBuf>,
        row: u64,
        column: impl Into<String>,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidValue {
            path: path.into(),
            row,
            column: column.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }
}

/// Errors raised while writing raw table extracts.
#[derive(Error, Debug)]
pub enum ExtractError {
    /// Source database unreachable
    #[error("connection to source failed: {0}")]
    Connection(String),

    /// Schema name is not a plain identifier
    #[error("invalid schema name '{0}'")]
    InvalidSchema(String),

    /// Export query failed
    #[error("export of '{table}' failed: {message}")]
    Query { table: String, message: String },

    /// Extract file could not be created
    #[error("failed to create '{path}': {source}")]
    Create {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Extract file could not be written
    #[error("failed to write '{path}': {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ExtractError {
    pub fn connection(message: impl std::fmt::Display) -> Self {
        Self::Connection(message.to_string())
    }

    pub fn query(table: impl Into<String>, message: impl std::fmt::Display) -> Self {
        Self::Query {
            table: table.into(),
            message: message.to_string(),
        }
    }
}
