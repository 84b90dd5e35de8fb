//! Statistical imputation methods.
//!
//! Numeric columns are filled with their median, everything else with its
//! mode.

use crate::types::ColumnKind;
use crate::utils::{
    column_kind, fill_numeric_nulls, fill_string_nulls, median, missing_count, numeric_values,
    string_mode,
};
use anyhow::{Context, Result};
use polars::prelude::*;
use tracing::debug;

/// Statistical imputation methods for filling missing values.
pub struct StatisticalImputer;

impl StatisticalImputer {
    /// Fill every column that has missing values, in column order.
    ///
    /// Returns one human-readable step per column that was touched. Columns
    /// with no observed values are left as they are.
    pub fn impute_all(df: &mut DataFrame) -> Result<Vec<String>> {
        let names: Vec<String> = df
            .get_column_names()
            .into_iter()
            .map(|name| name.to_string())
            .collect();

        let mut steps = Vec::new();
        for name in &names {
            if let Some(step) = Self::impute_column(df, name)? {
                steps.push(step);
            }
        }
        Ok(steps)
    }

    /// Fill one column. `Ok(None)` when nothing was filled.
    pub fn impute_column(df: &mut DataFrame, col_name: &str) -> Result<Option<String>> {
        let series = df
            .column(col_name)
            .with_context(|| format!("column '{col_name}' not found"))?
            .as_materialized_series()
            .clone();

        if missing_count(&series)? == 0 {
            return Ok(None);
        }

        match column_kind(series.dtype()) {
            ColumnKind::Numeric => Self::apply_numeric_median(df, &series),
            ColumnKind::Categorical => Self::apply_mode_imputation(df, &series),
        }
    }

    /// Apply median imputation for numeric columns.
    pub fn apply_numeric_median(df: &mut DataFrame, series: &Series) -> Result<Option<String>> {
        let observed: Vec<f64> = numeric_values(series)?.into_iter().flatten().collect();
        let Some(median_val) = median(&observed) else {
            debug!("Column '{}' has no observed values, skipping", series.name());
            return Ok(None);
        };

        let filled = fill_numeric_nulls(series, median_val)?;
        df.replace(series.name().as_str(), filled)?;
        Ok(Some(format!(
            "Filled '{}' with median: {}",
            series.name(),
            median_val
        )))
    }

    /// Apply mode imputation for categorical columns.
    pub fn apply_mode_imputation(df: &mut DataFrame, series: &Series) -> Result<Option<String>> {
        let Some(mode_val) = string_mode(series) else {
            debug!("Column '{}' has no observed values, skipping", series.name());
            return Ok(None);
        };

        let filled = fill_string_nulls(series, &mode_val)?;
        df.replace(series.name().as_str(), filled)?;
        Ok(Some(format!(
            "Filled '{}' with mode: '{}'",
            series.name(),
            mode_val
        )))
    }
}
