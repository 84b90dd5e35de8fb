//! Before/after comparison of the default cleaning transform.

use crate::cleaner::DataCleaner;
use crate::error::{EdaError, Result};
use crate::types::{ComparisonResult, DatasetMetrics, Improvements};
use crate::utils::{bytes_to_megabytes, duplicate_count, percentage, total_missing};
use polars::prelude::*;
use tracing::debug;

impl DatasetMetrics {
    /// Summary metrics of a table.
    pub fn from_frame(df: &DataFrame) -> Result<Self> {
        let rows = df.height();
        let columns = df.width();
        let missing_values = total_missing(df)?;
        let duplicates = duplicate_count(df)?;

        Ok(Self {
            rows,
            columns,
            missing_values,
            missing_percentage: percentage(missing_values, rows * columns),
            duplicates,
            duplicate_percentage: percentage(duplicates, rows),
            memory_mb: bytes_to_megabytes(df.estimated_size()),
        })
    }
}

pub struct Comparator;

impl Comparator {
    /// Clean a copy of `df` and diff its metrics against the original.
    pub fn compare(df: &DataFrame) -> Result<ComparisonResult> {
        let cleaned = DataCleaner::clean(df)?;
        Self::compare_frames(df, &cleaned)
    }

    /// Diff two tables that are already available, e.g. when the cleaned
    /// table has been cached.
    pub fn compare_frames(before: &DataFrame, after: &DataFrame) -> Result<ComparisonResult> {
        let before = DatasetMetrics::from_frame(before)
            .map_err(|e| EdaError::ProfilingFailed(format!("metrics before cleaning: {e}")))?;
        let after = DatasetMetrics::from_frame(after)
            .map_err(|e| EdaError::ProfilingFailed(format!("metrics after cleaning: {e}")))?;
        let improvements = Improvements::between(&before, &after);

        debug!(
            "Comparison: {} rows removed, {} missing values fixed, {} duplicates removed",
            improvements.rows_removed,
            improvements.missing_values_fixed,
            improvements.duplicates_removed
        );

        Ok(ComparisonResult {
            before,
            after,
            improvements,
        })
    }
}
