//! CSV loading for uploads and local files.
//!
//! Parsing tries three strategies before giving up:
//! 1. Standard parse with `"` quoting
//! 2. Parse with quote handling disabled
//! 3. Pre-clean the text (collapse doubled quotes, drop blank lines) and parse again

use crate::config::LoadOptions;
use crate::error::{EdaError, Result, ResultExt};
use crate::types::DatasetMetadata;
use once_cell::sync::Lazy;
use polars::io::csv::read::CsvReadOptions;
use polars::prelude::*;
use regex::Regex;
use serde_json::{Map, Number, Value};
use std::io::Cursor;
use std::path::Path;
use tracing::{debug, info};

/// A plain file name (no directories) with a `.csv` extension, any case.
static CSV_FILENAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^[^/\\]+\.csv$").expect("Invalid regex: csv filename"));

/// Cell values read as missing, in every column.
const NA_TOKENS: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

pub struct CsvLoader;

impl CsvLoader {
    /// Reject anything that is not a bare `*.csv` file name.
    pub fn validate_filename(filename: &str) -> Result<()> {
        let trimmed = filename.trim();
        if trimmed.is_empty() {
            return Err(invalid_file(filename, "missing file name"));
        }
        if trimmed.contains("..") {
            return Err(invalid_file(filename, "path traversal is not allowed"));
        }
        if !CSV_FILENAME.is_match(trimmed) {
            return Err(invalid_file(filename, "only .csv files are supported"));
        }
        Ok(())
    }

    /// Parse CSV bytes into a table.
    pub fn load_bytes(bytes: &[u8], options: &LoadOptions) -> Result<DataFrame> {
        if bytes.iter().all(|b| b.is_ascii_whitespace()) {
            return Err(EdaError::EmptyDataset);
        }

        let mut df = Self::parse_with_fallbacks(bytes, options)?;
        if df.width() == 0 {
            return Err(EdaError::EmptyDataset);
        }
        cast_all_null_columns(&mut df).context("casting all-null columns")?;

        debug!("Parsed CSV into {} rows x {} columns", df.height(), df.width());
        Ok(df)
    }

    /// Read and parse a CSV file from disk.
    pub fn load_path(path: impl AsRef<Path>, options: &LoadOptions) -> Result<DataFrame> {
        let path = path.as_ref();
        info!("Loading dataset from: {}", path.display());
        let bytes = std::fs::read(path)
            .map_err(|e| EdaError::Io(e).with_context(format!("reading {}", path.display())))?;
        Self::load_bytes(&bytes, options)
    }

    /// Upload metadata with the first `options.preview_rows` rows.
    pub fn metadata(
        filename: &str,
        df: &DataFrame,
        session_id: &str,
        size_bytes: u64,
        options: &LoadOptions,
    ) -> Result<DatasetMetadata> {
        Ok(DatasetMetadata {
            session_id: session_id.to_string(),
            filename: filename.to_string(),
            size_bytes,
            rows: df.height(),
            columns: df.width(),
            column_names: df
                .get_column_names()
                .into_iter()
                .map(|name| name.to_string())
                .collect(),
            preview: preview_rows(df, options.preview_rows)?,
        })
    }

    /// Serialize a table back to CSV with a header row.
    pub fn to_csv_bytes(df: &DataFrame) -> Result<Vec<u8>> {
        let mut out = df.clone();
        let mut buf = Vec::new();
        CsvWriter::new(&mut buf)
            .include_header(true)
            .with_separator(b',')
            .with_quote_char(b'"')
            .finish(&mut out)
            .context("writing CSV")?;
        Ok(buf)
    }

    fn parse_with_fallbacks(bytes: &[u8], options: &LoadOptions) -> Result<DataFrame> {
        match Self::read(bytes.to_vec(), options, Some(b'"')) {
            Ok(df) => return Ok(df),
            Err(e) => debug!("Standard loading failed: {}", e),
        }

        match Self::read(bytes.to_vec(), options, None) {
            Ok(df) => return Ok(df),
            Err(e) => debug!("Loading without quotes failed: {}", e),
        }

        let cleaned = clean_csv_content(&String::from_utf8_lossy(bytes));
        if cleaned.trim().is_empty() {
            return Err(EdaError::EmptyDataset);
        }
        Self::read(cleaned.into_bytes(), options, Some(b'"'))
            .map_err(|e| EdaError::CsvParseFailed(e.to_string()))
    }

    fn read(bytes: Vec<u8>, options: &LoadOptions, quote: Option<u8>) -> PolarsResult<DataFrame> {
        CsvReadOptions::default()
            .with_infer_schema_length(Some(options.infer_schema_length))
            .with_has_header(true)
            .with_parse_options(
                CsvParseOptions::default()
                    .with_separator(options.separator)
                    .with_quote_char(quote)
                    .with_null_values(Some(NullValues::AllColumns(
                        NA_TOKENS.iter().map(|token| (*token).into()).collect(),
                    ))),
            )
            .into_reader_with_file_handle(Cursor::new(bytes))
            .finish()
    }
}

/// A column with no values at all is numeric, so its statistics are null
/// rather than absent.
fn cast_all_null_columns(df: &mut DataFrame) -> PolarsResult<()> {
    if df.height() == 0 {
        return Ok(());
    }
    let empty: Vec<PlSmallStr> = df
        .get_columns()
        .iter()
        .filter(|c| c.dtype() == &DataType::String && c.null_count() == c.len())
        .map(|c| c.name().clone())
        .collect();
    for name in empty {
        let cast = df.column(&name)?.cast(&DataType::Float64)?;
        df.with_column(cast)?;
    }
    Ok(())
}

fn invalid_file(filename: &str, reason: &str) -> EdaError {
    EdaError::InvalidFile {
        filename: filename.to_string(),
        reason: reason.to_string(),
    }
}

/// Collapse doubled quotes and drop blank lines.
pub(crate) fn clean_csv_content(content: &str) -> String {
    content
        .replace("\"\"\"", "\"")
        .replace("\"\"", "\"")
        .lines()
        .filter(|line| !line.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn preview_rows(df: &DataFrame, limit: usize) -> Result<Vec<Map<String, Value>>> {
    let head = df.head(Some(limit));
    let mut rows = Vec::with_capacity(head.height());

    for idx in 0..head.height() {
        let mut row = Map::new();
        for column in head.get_columns() {
            let value = column.as_materialized_series().get(idx)?;
            row.insert(column.name().to_string(), any_value_to_json(&value));
        }
        rows.push(row);
    }
    Ok(rows)
}

/// Convert a cell into JSON. Missing and non-finite values become `null`.
pub fn any_value_to_json(value: &AnyValue) -> Value {
    match value {
        AnyValue::Null => Value::Null,
        AnyValue::Boolean(b) => Value::Bool(*b),
        AnyValue::String(s) => Value::String((*s).to_string()),
        AnyValue::StringOwned(s) => Value::String(s.to_string()),
        AnyValue::Int8(v) => Value::from(*v),
        AnyValue::Int16(v) => Value::from(*v),
        AnyValue::Int32(v) => Value::from(*v),
        AnyValue::Int64(v) => Value::from(*v),
        AnyValue::UInt8(v) => Value::from(*v),
        AnyValue::UInt16(v) => Value::from(*v),
        AnyValue::UInt32(v) => Value::from(*v),
        AnyValue::UInt64(v) => Value::from(*v),
        AnyValue::Float32(v) => float_to_json(f64::from(*v)),
        AnyValue::Float64(v) => float_to_json(*v),
        other => Value::String(other.to_string()),
    }
}

fn float_to_json(v: f64) -> Value {
    Number::from_f64(v).map(Value::Number).unwrap_or(Value::Null)
}
