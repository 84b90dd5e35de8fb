//! Per-column statistics (the column analyzer).

use crate::types::{ColumnKind, ColumnProfile, NumericSummary};
use crate::utils::{
    column_kind, distinct_count, dtype_label, median, missing_count, numeric_values, percentage,
};
use polars::prelude::*;

/// Analyze one column of a table with `row_count` rows.
///
/// Numeric columns carry a [`NumericSummary`]; categorical columns carry none.
pub(crate) fn analyze_column(series: &Series, row_count: usize) -> PolarsResult<ColumnProfile> {
    let dtype = series.dtype();
    let inferred_type = column_kind(dtype);
    let missing = missing_count(series)?;
    let unique = distinct_count(series)?;

    let numeric = match inferred_type {
        ColumnKind::Numeric => {
            let values: Vec<f64> = numeric_values(series)?.into_iter().flatten().collect();
            Some(summarize_numeric(&values))
        }
        ColumnKind::Categorical => None,
    };

    Ok(ColumnProfile {
        name: series.name().to_string(),
        dtype: dtype_label(dtype).to_string(),
        inferred_type,
        missing_count: missing,
        missing_percentage: percentage(missing, row_count),
        unique_count: unique,
        unique_percentage: percentage(unique, row_count),
        numeric,
    })
}

/// Profile used when a column cannot be analyzed; only the null count is kept.
pub(crate) fn degraded_profile(series: &Series, row_count: usize) -> ColumnProfile {
    let missing = series.null_count();
    let inferred_type = column_kind(series.dtype());
    ColumnProfile {
        name: series.name().to_string(),
        dtype: dtype_label(series.dtype()).to_string(),
        inferred_type,
        missing_count: missing,
        missing_percentage: percentage(missing, row_count),
        unique_count: 0,
        unique_percentage: 0.0,
        numeric: match inferred_type {
            ColumnKind::Numeric => Some(NumericSummary::absent()),
            ColumnKind::Categorical => None,
        },
    }
}

/// Summarize non-missing numeric values. Empty input yields an all-null summary.
pub(crate) fn summarize_numeric(values: &[f64]) -> NumericSummary {
    if values.is_empty() {
        return NumericSummary::absent();
    }

    let mean = values.iter().sum::<f64>() / values.len() as f64;
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    NumericSummary {
        mean: finite(mean),
        median: median(values).and_then(finite),
        std: finite(calculate_std(values, mean)),
        min: finite(min),
        max: finite(max),
    }
}

/// Sample standard deviation (n - 1 denominator). A single value has std 0.
pub(crate) fn calculate_std(values: &[f64], mean: f64) -> f64 {
    let n = values.len() as f64;
    if n <= 1.0 {
        return 0.0;
    }

    let variance: f64 = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
    variance.sqrt()
}

/// Infinite inputs can produce non-finite statistics; those are reported as null.
fn finite(value: f64) -> Option<f64> {
    value.is_finite().then_some(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    // ==================== calculate_std tests ====================

    #[test]
    fn test_calculate_std_basic() {
        // Mean = 3, Variance = 10 / 4 = 2.5, Std = sqrt(2.5)
        let values = [1.0, 2.0, 3.0, 4.0, 5.0];
        let std = calculate_std(&values, 3.0);
        assert!((std - 2.5f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_calculate_std_single_value() {
        assert_eq!(calculate_std(&[5.0], 5.0), 0.0);
    }

    #[test]
    fn test_calculate_std_identical_values() {
        assert_eq!(calculate_std(&[5.0, 5.0, 5.0, 5.0], 5.0), 0.0);
    }

    // ==================== summarize_numeric tests ====================

    #[test]
    fn test_summarize_numeric_basic() {
        let summary = summarize_numeric(&[10.0, 20.0, 30.0, 40.0]);
        assert_eq!(summary.mean, Some(25.0));
        assert_eq!(summary.median, Some(25.0));
        assert_eq!(summary.min, Some(10.0));
        assert_eq!(summary.max, Some(40.0));
        assert!((summary.std.unwrap() - 12.909944487358056).abs() < 1e-9);
    }

    #[test]
    fn test_summarize_numeric_empty_is_absent() {
        assert!(summarize_numeric(&[]).is_absent());
    }

    #[test]
    fn test_summarize_numeric_infinite_input() {
        let summary = summarize_numeric(&[1.0, f64::INFINITY]);
        assert_eq!(summary.mean, None);
        assert_eq!(summary.min, Some(1.0));
        assert_eq!(summary.max, None);
    }

    // ==================== analyze_column tests ====================

    #[test]
    fn test_analyze_numeric_column() {
        let series = Series::new("price".into(), &[Some(10.0f64), None, Some(30.0), Some(10.0)]);
        let profile = analyze_column(&series, 4).unwrap();

        assert_eq!(profile.name, "price");
        assert_eq!(profile.dtype, "float64");
        assert_eq!(profile.inferred_type, ColumnKind::Numeric);
        assert_eq!(profile.missing_count, 1);
        assert_eq!(profile.missing_percentage, 25.0);
        assert_eq!(profile.unique_count, 2);
        assert_eq!(profile.unique_percentage, 50.0);

        let numeric = profile.numeric.unwrap();
        assert!((numeric.mean.unwrap() - 50.0 / 3.0).abs() < 1e-9);
        assert_eq!(numeric.median, Some(10.0));
        assert_eq!(numeric.min, Some(10.0));
        assert_eq!(numeric.max, Some(30.0));
    }

    #[test]
    fn test_analyze_integer_column() {
        let series = Series::new("age".into(), &[21i64, 35, 35]);
        let profile = analyze_column(&series, 3).unwrap();
        assert_eq!(profile.dtype, "int64");
        assert_eq!(profile.unique_count, 2);
        assert_eq!(profile.numeric.unwrap().median, Some(35.0));
    }

    #[test]
    fn test_analyze_categorical_column() {
        let series = Series::new("city".into(), &[Some("Oslo"), Some("Lima"), None, Some("Oslo")]);
        let profile = analyze_column(&series, 4).unwrap();

        assert_eq!(profile.inferred_type, ColumnKind::Categorical);
        assert_eq!(profile.dtype, "object");
        assert_eq!(profile.missing_count, 1);
        assert_eq!(profile.unique_count, 2);
        assert!(profile.numeric.is_none());
    }

    #[test]
    fn test_analyze_all_null_numeric_column() {
        let series = Series::new("empty".into(), &[Option::<f64>::None, None, None]);
        let profile = analyze_column(&series, 3).unwrap();

        assert_eq!(profile.missing_count, 3);
        assert_eq!(profile.missing_percentage, 100.0);
        assert_eq!(profile.unique_count, 0);
        assert!(profile.numeric.unwrap().is_absent());
    }

    #[test]
    fn test_analyze_zero_rows() {
        let series = Series::new("x".into(), Vec::<f64>::new());
        let profile = analyze_column(&series, 0).unwrap();

        assert_eq!(profile.missing_percentage, 0.0);
        assert_eq!(profile.unique_percentage, 0.0);
        assert!(profile.numeric.unwrap().is_absent());
    }

    #[test]
    fn test_degraded_profile_keeps_null_count() {
        let series = Series::new("x".into(), &[Some(1i64), None]);
        let profile = degraded_profile(&series, 2);
        assert_eq!(profile.missing_count, 1);
        assert!(profile.numeric.unwrap().is_absent());
    }
}
