//! Configuration types for CSV loading.
//!
//! This module provides configuration options using the builder pattern.

use serde::{Deserialize, Serialize};

/// Default number of rows returned as an upload preview.
pub const DEFAULT_PREVIEW_ROWS: usize = 5;
/// Default number of rows used for schema inference.
pub const DEFAULT_INFER_SCHEMA_LENGTH: usize = 100;
/// Upper bound for the upload preview.
pub const MAX_PREVIEW_ROWS: usize = 1000;

/// Options for turning CSV input into a table.
///
/// Use [`LoadOptions::builder()`] to create a validated configuration.
///
/// # Example
///
/// ```rust,ignore
/// use eda_processing::config::LoadOptions;
///
/// let options = LoadOptions::builder()
///     .preview_rows(10)
///     .separator(b';')
///     .build()?;
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadOptions {
    /// Number of leading rows included in upload metadata.
    /// Default: 5
    pub preview_rows: usize,

    /// Number of rows scanned to infer column types.
    /// Default: 100
    pub infer_schema_length: usize,

    /// Field separator.
    /// Default: b','
    pub separator: u8,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            preview_rows: DEFAULT_PREVIEW_ROWS,
            infer_schema_length: DEFAULT_INFER_SCHEMA_LENGTH,
            separator: b',',
        }
    }
}

impl LoadOptions {
    pub fn builder() -> LoadOptionsBuilder {
        LoadOptionsBuilder::default()
    }

    /// Validate the configuration and return errors if invalid.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.preview_rows == 0 || self.preview_rows > MAX_PREVIEW_ROWS {
            return Err(ConfigValidationError::InvalidPreviewRows(self.preview_rows));
        }

        if self.infer_schema_length == 0 {
            return Err(ConfigValidationError::InvalidSchemaLength(
                self.infer_schema_length,
            ));
        }

        if !self.separator.is_ascii() || self.separator == b'"' || self.separator == b'\n' {
            return Err(ConfigValidationError::InvalidSeparator(self.separator as char));
        }

        Ok(())
    }
}

/// Errors that can occur during configuration validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Invalid preview rows: {0} (must be between 1 and {MAX_PREVIEW_ROWS})")]
    InvalidPreviewRows(usize),

    #[error("Invalid schema inference length: {0} (must be at least 1)")]
    InvalidSchemaLength(usize),

    #[error("Invalid separator: {0:?}")]
    InvalidSeparator(char),
}

/// Builder for [`LoadOptions`] with fluent API.
#[derive(Debug, Default)]
pub struct LoadOptionsBuilder {
    preview_rows: Option<usize>,
    infer_schema_length: Option<usize>,
    separator: Option<u8>,
}

impl LoadOptionsBuilder {
    /// Set how many rows the upload preview contains.
    pub fn preview_rows(mut self, rows: usize) -> Self {
        self.preview_rows = Some(rows);
        self
    }

    /// Set how many rows are scanned for type inference.
    pub fn infer_schema_length(mut self, rows: usize) -> Self {
        self.infer_schema_length = Some(rows);
        self
    }

    pub fn separator(mut self, separator: u8) -> Self {
        self.separator = Some(separator);
        self
    }

    /// Build the configuration.
    ///
    /// Returns validated `LoadOptions` or an error if validation fails.
    pub fn build(self) -> Result<LoadOptions, ConfigValidationError> {
        let defaults = LoadOptions::default();
        let options = LoadOptions {
            preview_rows: self.preview_rows.unwrap_or(defaults.preview_rows),
            infer_schema_length: self
                .infer_schema_length
                .unwrap_or(defaults.infer_schema_length),
            separator: self.separator.unwrap_or(defaults.separator),
        };

        options.validate()?;
        Ok(options)
    }
}
