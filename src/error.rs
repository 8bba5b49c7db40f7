//! Application error types with machine-readable reason codes.

use std::fmt;

use thiserror::Error;

/// What a [`AppError::CardinalityOverflow`] ran out of.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverflowKind {
    /// The table would exceed the store's column limit.
    Columns,
    /// A single property carries more values than may be spread over columns.
    Values,
}

impl fmt::Display for OverflowKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OverflowKind::Columns => f.write_str("columns"),
            OverflowKind::Values => f.write_str("values"),
        }
    }
}

/// Application-level errors for the tabulator.
#[derive(Error, Debug)]
pub enum AppError {
    // Store errors
    #[error("SQLite error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Table not recognised: {0}")]
    UnknownTable(String),

    #[error("Table already generated: {0}")]
    AlreadyBuilt(String),

    #[error("Too many {kind} in table {table} for {column}")]
    CardinalityOverflow {
        table: String,
        column: String,
        kind: OverflowKind,
    },

    // Crate errors
    #[error("No ro-crate-metadata.json found under {0}")]
    MetadataNotFound(String),

    #[error("Invalid crate metadata: {0}")]
    InvalidMetadata(String),

    // Config errors
    #[error("Configuration not found: {0}")]
    ConfigNotFound(String),

    #[error("Settings error: {0}")]
    Settings(#[from] crate::config::ConfigError),

    // Acquisition and output errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Download failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Archive extraction failed: {0}")]
    Zip(#[from] zip_extract::ZipExtractError),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl AppError {
    /// Stable reason code for logs and exit reporting.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Database(_) => "DATABASE_ERROR",
            AppError::UnknownTable(_) => "MISSING_ENTITY_TYPE",
            AppError::AlreadyBuilt(_) => "ALREADY_BUILT",
            AppError::CardinalityOverflow { .. } => "CARDINALITY_OVERFLOW",
            AppError::MetadataNotFound(_) => "METADATA_NOT_FOUND",
            AppError::InvalidMetadata(_) => "INVALID_METADATA",
            AppError::ConfigNotFound(_) => "CONFIG_NOT_FOUND",
            AppError::Settings(_) => "SETTINGS_ERROR",
            AppError::Io(_) => "IO_ERROR",
            AppError::Json(_) => "JSON_ERROR",
            AppError::Http(_) => "HTTP_ERROR",
            AppError::Zip(_) => "ZIP_ERROR",
            AppError::Csv(_) => "CSV_ERROR",
        }
    }

    /// True for failures the build loop treats as a no-op.
    pub fn is_benign(&self) -> bool {
        matches!(self, AppError::AlreadyBuilt(_) | AppError::UnknownTable(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overflow_message_names_column() {
        let err = AppError::CardinalityOverflow {
            table: "RepositoryObject".to_string(),
            column: "publisher_role_7".to_string(),
            kind: OverflowKind::Columns,
        };
        assert_eq!(
            err.to_string(),
            "Too many columns in table RepositoryObject for publisher_role_7"
        );
        assert_eq!(err.code(), "CARDINALITY_OVERFLOW");
    }

    #[test]
    fn test_benign_errors() {
        assert!(AppError::AlreadyBuilt("Person".into()).is_benign());
        assert!(AppError::UnknownTable("Speaker".into()).is_benign());
        assert!(!AppError::ConfigNotFound("x".into()).is_benign());
    }
}
