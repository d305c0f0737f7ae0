//! Error types for tabcompare operations

use std::fmt;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, CompareError>;

/// Process status codes handed back by the CLI
pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_DIFFERENCES_FOUND: i32 = 1;
pub const EXIT_SCHEMA_VIOLATION: i32 = 2;
pub const EXIT_PRIMARY_KEY_VIOLATION: i32 = 3;
pub const EXIT_CONFIGURATION: i32 = 4;
pub const EXIT_INVALID_INPUT: i32 = 5;
pub const EXIT_UNCLASSIFIED: i32 = 70;

/// Which input of a comparison an error refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Left,
    Right,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Left => write!(f, "left"),
            Side::Right => write!(f, "right"),
        }
    }
}

#[derive(Error, Debug)]
pub enum CompareError {
    #[error("Schema violation in {side} dataset: {}", .errors.join("; "))]
    SchemaViolation { side: Side, errors: Vec<String> },

    #[error(
        "Primary key violation in {side} dataset: {duplicate_groups} duplicate key group(s) on [{}]",
        .key_columns.join(", ")
    )]
    PrimaryKeyViolation {
        side: Side,
        duplicate_groups: u64,
        key_columns: Vec<String>,
    },

    #[error("Column mapping error: {}", .errors.join("; "))]
    Mapping { errors: Vec<String> },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    #[error("Data processing error: {message}")]
    DataProcessing { message: String },

    #[error("DuckDB error: {0}")]
    DuckDb(#[from] duckdb::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Generic error: {0}")]
    Generic(#[from] anyhow::Error),
}

/// Coarse classification callers use to react to a failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    SchemaViolation,
    PrimaryKeyViolation,
    Configuration,
    InvalidInput,
    Unclassified,
}

impl CompareError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: msg.into(),
        }
    }

    pub fn data_processing(msg: impl Into<String>) -> Self {
        Self::DataProcessing {
            message: msg.into(),
        }
    }

    pub fn mapping(errors: Vec<String>) -> Self {
        Self::Mapping { errors }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::SchemaViolation { .. } => ErrorKind::SchemaViolation,
            Self::PrimaryKeyViolation { .. } => ErrorKind::PrimaryKeyViolation,
            Self::Mapping { .. } | Self::Config { .. } => ErrorKind::Configuration,
            Self::InvalidInput { .. } | Self::Io(_) | Self::Json(_) => ErrorKind::InvalidInput,
            Self::DataProcessing { .. } | Self::DuckDb(_) | Self::Generic(_) => {
                ErrorKind::Unclassified
            }
        }
    }

    /// Stable exit status for this error
    pub fn exit_code(&self) -> i32 {
        match self.kind() {
            ErrorKind::SchemaViolation => EXIT_SCHEMA_VIOLATION,
            ErrorKind::PrimaryKeyViolation => EXIT_PRIMARY_KEY_VIOLATION,
            ErrorKind::Configuration => EXIT_CONFIGURATION,
            ErrorKind::InvalidInput => EXIT_INVALID_INPUT,
            ErrorKind::Unclassified => EXIT_UNCLASSIFIED,
        }
    }
}
