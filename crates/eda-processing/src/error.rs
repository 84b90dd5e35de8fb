//! Error types for dataset loading, profiling and comparison.
//!
//! This module provides the error hierarchy using `thiserror`. Errors are
//! serializable so the HTTP layer can forward them to the frontend as
//! `{ "code": ..., "message": ... }`.

use serde::Serialize;
use serde::ser::SerializeStruct;
use thiserror::Error;

/// The main error type for the processing crate.
#[derive(Error, Debug)]
pub enum EdaError {
    /// Uploaded file was rejected before parsing.
    #[error("Invalid file '{filename}': {reason}")]
    InvalidFile { filename: String, reason: String },

    /// The CSV payload contained no header or no data at all.
    #[error("Dataset is empty")]
    EmptyDataset,

    /// Every CSV parsing strategy failed.
    #[error("Failed to parse CSV: {0}")]
    CsvParseFailed(String),

    /// Invalid configuration provided.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Data profiling failed.
    #[error("Failed to profile dataset: {0}")]
    ProfilingFailed(String),

    /// Applying the default cleaning transform failed.
    #[error("Failed to clean data: {0}")]
    CleaningFailed(String),

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Polars error wrapper.
    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    /// Generic error with context.
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<EdaError>,
    },
}

impl EdaError {
    /// Add context to an error.
    pub fn with_context(self, context: impl Into<String>) -> Self {
        EdaError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Get error code for frontend handling.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidFile { .. } => "INVALID_FILE",
            Self::EmptyDataset => "EMPTY_DATASET",
            Self::CsvParseFailed(_) => "CSV_PARSE_FAILED",
            Self::InvalidConfig(_) => "INVALID_CONFIG",
            Self::ProfilingFailed(_) => "PROFILING_FAILED",
            Self::CleaningFailed(_) => "CLEANING_FAILED",
            Self::Io(_) => "IO_ERROR",
            Self::Polars(_) => "POLARS_ERROR",
            Self::WithContext { source, .. } => source.error_code(),
        }
    }

    /// Whether the error was caused by the caller's input rather than by a
    /// failure inside the engine.
    pub fn is_client_error(&self) -> bool {
        match self {
            Self::InvalidFile { .. }
            | Self::EmptyDataset
            | Self::CsvParseFailed(_)
            | Self::InvalidConfig(_) => true,
            Self::WithContext { source, .. } => source.is_client_error(),
            _ => false,
        }
    }
}

impl From<crate::config::ConfigValidationError> for EdaError {
    fn from(err: crate::config::ConfigValidationError) -> Self {
        EdaError::InvalidConfig(err.to_string())
    }
}

/// Errors are serialized as a struct with `code` and `message` fields.
impl Serialize for EdaError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut state = serializer.serialize_struct("EdaError", 2)?;
        state.serialize_field("code", &self.error_code())?;
        state.serialize_field("message", &self.to_string())?;
        state.end()
    }
}

/// Result type alias for processing operations.
pub type Result<T> = std::result::Result<T, EdaError>;

/// Extension trait for adding context to Results.
pub trait ResultExt<T> {
    /// Add context to an error result.
    fn context(self, context: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, polars::error::PolarsError> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| EdaError::Polars(e).with_context(context))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code() {
        assert_eq!(EdaError::EmptyDataset.error_code(), "EMPTY_DATASET");
        assert_eq!(
            EdaError::CleaningFailed("test".to_string()).error_code(),
            "CLEANING_FAILED"
        );
    }

    #[test]
    fn test_error_codes_are_distinct() {
        let errors = [
            EdaError::InvalidFile {
                filename: "a.txt".to_string(),
                reason: "not csv".to_string(),
            },
            EdaError::EmptyDataset,
            EdaError::CsvParseFailed("x".to_string()),
            EdaError::InvalidConfig("x".to_string()),
            EdaError::ProfilingFailed("x".to_string()),
            EdaError::CleaningFailed("x".to_string()),
            EdaError::Io(std::io::Error::other("x")),
            EdaError::Polars(polars::error::PolarsError::NoData("x".into())),
        ];
        let codes: std::collections::HashSet<_> = errors.iter().map(|e| e.error_code()).collect();
        assert_eq!(codes.len(), errors.len());
    }

    #[test]
    fn test_is_client_error() {
        assert!(EdaError::EmptyDataset.is_client_error());
        assert!(
            EdaError::InvalidFile {
                filename: "a.txt".to_string(),
                reason: "not csv".to_string()
            }
            .is_client_error()
        );
        assert!(!EdaError::ProfilingFailed("boom".to_string()).is_client_error());
        assert!(!EdaError::CleaningFailed("boom".to_string()).is_client_error());
    }

    #[test]
    fn test_error_serialization() {
        let error = EdaError::CsvParseFailed("bad row 3".to_string());
        let json = serde_json::to_string(&error).unwrap();
        assert!(json.contains("CSV_PARSE_FAILED"));
        assert!(json.contains("bad row 3"));
    }

    #[test]
    fn test_config_error_converts_to_invalid_config() {
        let err: EdaError = crate::config::ConfigValidationError::InvalidPreviewRows(0).into();
        assert_eq!(err.error_code(), "INVALID_CONFIG");
        assert!(err.is_client_error());
    }

    #[test]
    fn test_with_context_preserves_code_and_class() {
        let error = EdaError::EmptyDataset.with_context("While loading upload");
        assert!(error.to_string().contains("While loading upload"));
        assert_eq!(error.error_code(), "EMPTY_DATASET");
        assert!(error.is_client_error());
    }
}
