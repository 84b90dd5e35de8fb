//! Shared utilities for profiling, cleaning and comparison.
//!
//! This module contains the small Series/DataFrame helpers that several
//! modules rely on, so that missing-value and duplicate semantics are the
//! same everywhere.

use crate::types::ColumnKind;
use polars::prelude::*;
use std::collections::{HashMap, HashSet};

const BYTES_PER_MEGABYTE: f64 = 1024.0 * 1024.0;

// =============================================================================
// Data Type Utilities
// =============================================================================

/// Check if a DataType is numeric (integer or float).
#[inline]
pub fn is_numeric_dtype(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float32
            | DataType::Float64
    )
}

/// Check if a DataType is a floating point type (the only types that can hold NaN).
#[inline]
pub fn is_float_dtype(dtype: &DataType) -> bool {
    matches!(dtype, DataType::Float32 | DataType::Float64)
}

/// Semantic kind of a column. Anything that is not an integer or float is
/// categorical; no coercion is attempted.
pub fn column_kind(dtype: &DataType) -> ColumnKind {
    if is_numeric_dtype(dtype) {
        ColumnKind::Numeric
    } else {
        ColumnKind::Categorical
    }
}

/// Physical dtype label using the names the frontend and the generated
/// pandas scripts expect.
pub fn dtype_label(dtype: &DataType) -> &'static str {
    match dtype {
        DataType::Int8 => "int8",
        DataType::Int16 => "int16",
        DataType::Int32 => "int32",
        DataType::Int64 => "int64",
        DataType::UInt8 => "uint8",
        DataType::UInt16 => "uint16",
        DataType::UInt32 => "uint32",
        DataType::UInt64 => "uint64",
        DataType::Float32 => "float32",
        DataType::Float64 => "float64",
        DataType::Boolean => "bool",
        DataType::Date | DataType::Datetime(_, _) => "datetime64",
        _ => "object",
    }
}

// =============================================================================
// Missing Values
// =============================================================================

/// Values of a numeric Series as `f64`, with both nulls and NaN mapped to `None`.
pub fn numeric_values(series: &Series) -> PolarsResult<Vec<Option<f64>>> {
    let floats = series.cast(&DataType::Float64)?;
    Ok(floats
        .f64()?
        .into_iter()
        .map(|v| v.filter(|x| !x.is_nan()))
        .collect())
}

/// Count missing cells: nulls for every dtype, plus NaN for float columns.
pub fn missing_count(series: &Series) -> PolarsResult<usize> {
    if is_float_dtype(series.dtype()) {
        Ok(numeric_values(series)?
            .iter()
            .filter(|v| v.is_none())
            .count())
    } else {
        Ok(series.null_count())
    }
}

/// Count distinct non-missing values.
pub fn distinct_count(series: &Series) -> PolarsResult<usize> {
    if is_numeric_dtype(series.dtype()) {
        // -0.0 and 0.0 compare equal, so normalise before hashing the bits.
        let distinct: HashSet<u64> = numeric_values(series)?
            .into_iter()
            .flatten()
            .map(|v| if v == 0.0 { 0.0f64.to_bits() } else { v.to_bits() })
            .collect();
        Ok(distinct.len())
    } else {
        series.drop_nulls().n_unique()
    }
}

/// Total number of missing cells in a DataFrame.
pub fn total_missing(df: &DataFrame) -> PolarsResult<usize> {
    let mut total = 0;
    for column in df.get_columns() {
        total += missing_count(column.as_materialized_series())?;
    }
    Ok(total)
}

// =============================================================================
// Duplicate Rows
// =============================================================================

/// Mark every row that is an exact duplicate of an earlier row.
///
/// Rows are compared over all columns; missing equals missing, and in float
/// columns NaN counts as missing. The first occurrence of a row is never marked.
pub fn duplicate_mask(df: &DataFrame) -> PolarsResult<Vec<bool>> {
    let as_text: Vec<Series> = df
        .get_columns()
        .iter()
        .map(|c| duplicate_key_column(c.as_materialized_series()))
        .collect::<PolarsResult<_>>()?;
    let chunks: Vec<&StringChunked> = as_text
        .iter()
        .map(|s| s.str())
        .collect::<PolarsResult<_>>()?;

    let height = df.height();
    let mut seen: HashSet<Vec<Option<&str>>> = HashSet::with_capacity(height);
    let mut mask = Vec::with_capacity(height);
    for row in 0..height {
        let key: Vec<Option<&str>> = chunks.iter().map(|ca| ca.get(row)).collect();
        mask.push(!seen.insert(key));
    }
    Ok(mask)
}

fn duplicate_key_column(series: &Series) -> PolarsResult<Series> {
    if is_float_dtype(series.dtype()) {
        Series::new(series.name().clone(), numeric_values(series)?).cast(&DataType::String)
    } else {
        series.cast(&DataType::String)
    }
}

/// Number of rows that duplicate an earlier row.
pub fn duplicate_count(df: &DataFrame) -> PolarsResult<usize> {
    Ok(duplicate_mask(df)?.into_iter().filter(|dup| *dup).count())
}

/// Drop duplicate rows, keeping the first occurrence and the original row order.
pub fn drop_duplicate_rows(df: &DataFrame) -> PolarsResult<DataFrame> {
    let keep: Vec<bool> = duplicate_mask(df)?.into_iter().map(|dup| !dup).collect();
    let keep = Series::new("keep".into(), keep);
    df.filter(keep.bool()?)
}

// =============================================================================
// Series Statistics Utilities
// =============================================================================

/// Calculate the mode (most frequent value) of a Series, rendered as text.
///
/// Ties are broken by the value that appears first in the Series.
pub fn string_mode(series: &Series) -> Option<String> {
    let text = series.cast(&DataType::String).ok()?;
    let chunked = text.str().ok()?;

    // value -> (count, index of first occurrence)
    let mut counts: HashMap<&str, (usize, usize)> = HashMap::new();
    for (idx, val) in chunked.into_iter().enumerate() {
        if let Some(val) = val {
            counts.entry(val).or_insert((0, idx)).0 += 1;
        }
    }

    counts
        .into_iter()
        .max_by(|(_, (count_a, first_a)), (_, (count_b, first_b))| {
            count_a.cmp(count_b).then(first_b.cmp(first_a))
        })
        .map(|(val, _)| val.to_string())
}

/// Median of already-filtered values. Averages the two middle values for
/// even-length input.
pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}

/// Convert a byte count into megabytes (1 MB = 1024² bytes).
pub fn bytes_to_megabytes(bytes: usize) -> f64 {
    bytes as f64 / BYTES_PER_MEGABYTE
}

/// `part / whole * 100`, or 0 when `whole` is 0.
pub fn percentage(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        (part as f64 / whole as f64) * 100.0
    }
}

// =============================================================================
// Series Transformation Utilities
// =============================================================================

/// Fill missing values (null or NaN) in a numeric Series. The result is Float64.
pub fn fill_numeric_nulls(series: &Series, fill_value: f64) -> PolarsResult<Series> {
    let filled: Vec<f64> = numeric_values(series)?
        .into_iter()
        .map(|v| v.unwrap_or(fill_value))
        .collect();
    Ok(Series::new(series.name().clone(), filled))
}

/// Fill null values in a Series with a text value. The result is a String Series.
pub fn fill_string_nulls(series: &Series, fill_value: &str) -> PolarsResult<Series> {
    let text = series.cast(&DataType::String)?;
    let filled: Vec<String> = text
        .str()?
        .into_iter()
        .map(|v| v.unwrap_or(fill_value).to_string())
        .collect();
    Ok(Series::new(series.name().clone(), filled))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_kind() {
        assert_eq!(column_kind(&DataType::Int64), ColumnKind::Numeric);
        assert_eq!(column_kind(&DataType::Float32), ColumnKind::Numeric);
        assert_eq!(column_kind(&DataType::String), ColumnKind::Categorical);
        assert_eq!(column_kind(&DataType::Boolean), ColumnKind::Categorical);
    }

    #[test]
    fn test_dtype_label() {
        assert_eq!(dtype_label(&DataType::Int64), "int64");
        assert_eq!(dtype_label(&DataType::Float64), "float64");
        assert_eq!(dtype_label(&DataType::String), "object");
        assert_eq!(dtype_label(&DataType::Boolean), "bool");
    }

    #[test]
    fn test_missing_count_includes_nan() {
        let series = Series::new("x".into(), &[Some(1.0f64), None, Some(f64::NAN), Some(4.0)]);
        assert_eq!(missing_count(&series).unwrap(), 2);
    }

    #[test]
    fn test_missing_count_strings() {
        let series = Series::new("s".into(), &[Some("a"), None, Some("")]);
        assert_eq!(missing_count(&series).unwrap(), 1);
    }

    #[test]
    fn test_distinct_count_excludes_missing() {
        let series = Series::new("x".into(), &[Some(1i64), Some(1), None, Some(2)]);
        assert_eq!(distinct_count(&series).unwrap(), 2);

        let series = Series::new("s".into(), &[Some("a"), None, Some("b"), Some("a")]);
        assert_eq!(distinct_count(&series).unwrap(), 2);
    }

    #[test]
    fn test_duplicate_mask_keeps_first() {
        let df = df![
            "a" => [1, 2, 1, 1],
            "b" => ["x", "y", "x", "z"],
        ]
        .unwrap();
        assert_eq!(duplicate_mask(&df).unwrap(), vec![false, false, true, false]);
        assert_eq!(duplicate_count(&df).unwrap(), 1);
    }

    #[test]
    fn test_duplicate_mask_null_equals_null() {
        let df = df![
            "a" => [Some(1), None, None],
            "b" => [Some("x"), None, None],
        ]
        .unwrap();
        assert_eq!(duplicate_mask(&df).unwrap(), vec![false, false, true]);
    }

    #[test]
    fn test_duplicate_mask_nan_equals_null() {
        let df = df![
            "a" => [Some(1.0), Some(f64::NAN), None, Some(f64::NAN)],
            "b" => ["x", "y", "y", "y"],
        ]
        .unwrap();
        assert_eq!(
            duplicate_mask(&df).unwrap(),
            vec![false, false, true, true]
        );
        assert_eq!(drop_duplicate_rows(&df).unwrap().height(), 2);
    }

    #[test]
    fn test_drop_duplicate_rows_preserves_order() {
        let df = df![
            "a" => [3, 1, 3, 2, 1],
        ]
        .unwrap();
        let deduped = drop_duplicate_rows(&df).unwrap();
        let values: Vec<Option<i32>> = deduped
            .column("a")
            .unwrap()
            .as_materialized_series()
            .i32()
            .unwrap()
            .into_iter()
            .collect();
        assert_eq!(values, vec![Some(3), Some(1), Some(2)]);
    }

    #[test]
    fn test_string_mode_first_encountered_tie_break() {
        let series = Series::new("s".into(), &[Some("b"), Some("a"), None, Some("a"), Some("b")]);
        assert_eq!(string_mode(&series), Some("b".to_string()));

        let series = Series::new("s".into(), &[Some("b"), Some("a"), Some("a")]);
        assert_eq!(string_mode(&series), Some("a".to_string()));
    }

    #[test]
    fn test_string_mode_all_null() {
        let series = Series::new("s".into(), &[Option::<&str>::None, None]);
        assert_eq!(string_mode(&series), None);
    }

    #[test]
    fn test_median() {
        assert_eq!(median(&[3.0, 1.0, 2.0]), Some(2.0));
        assert_eq!(median(&[4.0, 1.0, 2.0, 3.0]), Some(2.5));
        assert_eq!(median(&[]), None);
    }

    #[test]
    fn test_percentage_zero_denominator() {
        assert_eq!(percentage(5, 0), 0.0);
        assert_eq!(percentage(1, 4), 25.0);
    }

    #[test]
    fn test_fill_numeric_nulls() {
        let series = Series::new("x".into(), &[Some(1.0f64), None, Some(f64::NAN)]);
        let filled = fill_numeric_nulls(&series, 9.0).unwrap();
        let values: Vec<Option<f64>> = filled.f64().unwrap().into_iter().collect();
        assert_eq!(values, vec![Some(1.0), Some(9.0), Some(9.0)]);
    }

    #[test]
    fn test_fill_string_nulls() {
        let series = Series::new("s".into(), &[Some("a"), None]);
        let filled = fill_string_nulls(&series, "a").unwrap();
        assert_eq!(filled.null_count(), 0);
        assert_eq!(filled.str().unwrap().get(1), Some("a"));
    }
}
