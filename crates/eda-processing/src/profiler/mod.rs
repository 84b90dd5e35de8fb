//! Data profiling module for dataset analysis.
//!
//! This module provides functionality for profiling datasets, including:
//! - Per-column missing/unique counts
//! - Descriptive statistics for numeric columns
//! - Duplicate row detection
//! - Memory footprint estimation

mod statistics;

use crate::error::{EdaError, Result};
use crate::types::{ColumnProfile, DatasetProfile};
use crate::utils::{bytes_to_megabytes, duplicate_count, percentage};
use chrono::Utc;
use polars::prelude::*;
use tracing::{debug, warn};

use statistics::analyze_column;

/// Data profiler for analyzing dataset structure and characteristics.
pub struct DataProfiler;

impl DataProfiler {
    /// Profile an entire dataset.
    ///
    /// Every column is analyzed in table order. A column that cannot be
    /// analyzed is reported with a degraded profile instead of failing the
    /// whole dataset.
    pub fn profile_dataset(df: &DataFrame) -> Result<DatasetProfile> {
        let row_count = df.height();
        let column_count = df.width();

        let columns: Vec<ColumnProfile> = df
            .get_columns()
            .iter()
            .map(|col| Self::profile_column(col.as_materialized_series(), row_count))
            .collect();

        let duplicate_row_count = duplicate_count(df)
            .map_err(|e| EdaError::ProfilingFailed(format!("duplicate detection: {e}")))?;

        let profile = DatasetProfile {
            row_count,
            column_count,
            duplicate_row_count,
            duplicate_percentage: percentage(duplicate_row_count, row_count),
            memory_estimate_mb: bytes_to_megabytes(df.estimated_size()),
            columns,
            generated_at: Utc::now(),
        };

        debug!(
            "Profiled dataset: {} rows x {} columns, {} duplicates",
            row_count, column_count, duplicate_row_count
        );

        Ok(profile)
    }

    fn profile_column(series: &Series, row_count: usize) -> ColumnProfile {
        match analyze_column(series, row_count) {
            Ok(profile) => profile,
            Err(e) => {
                warn!("Could not analyze column '{}': {}", series.name(), e);
                statistics::degraded_profile(series, row_count)
            }
        }
    }
}
