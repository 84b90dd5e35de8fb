//! The default cleaning transform.
//!
//! Two steps, always in this order:
//! 1. Drop exact-duplicate rows (first occurrence kept, order preserved)
//! 2. Fill missing values: median for numeric columns, mode otherwise
//!
//! The caller's table is never modified; cleaning works on a copy.

use crate::error::{EdaError, Result};
use crate::imputers::StatisticalImputer;
use crate::utils::drop_duplicate_rows;
use polars::prelude::*;
use tracing::{debug, info};

/// Outcome of [`DataCleaner::clean_with_report`].
#[derive(Debug, Clone)]
pub struct CleaningReport {
    pub cleaned: DataFrame,
    pub duplicates_removed: usize,
    /// One entry per action, in the order applied.
    pub actions: Vec<String>,
}

/// Data cleaner for the default dedup + imputation transform.
pub struct DataCleaner;

impl DataCleaner {
    /// Clean a copy of `df`.
    pub fn clean(df: &DataFrame) -> Result<DataFrame> {
        Ok(Self::clean_with_report(df)?.cleaned)
    }

    /// Clean a copy of `df` and describe what was done.
    pub fn clean_with_report(df: &DataFrame) -> Result<CleaningReport> {
        let mut actions = Vec::new();
        info!("Applying default cleaning transform...");

        let before_rows = df.height();
        let mut cleaned = drop_duplicate_rows(df)
            .map_err(|e| EdaError::CleaningFailed(format!("duplicate removal: {e}")))?;
        let duplicates_removed = before_rows - cleaned.height();

        if duplicates_removed > 0 {
            actions.push(format!("Removed {} duplicate rows", duplicates_removed));
            debug!("Removed {} duplicate rows", duplicates_removed);
        } else {
            actions.push("No duplicate rows found".to_string());
        }

        let filled = StatisticalImputer::impute_all(&mut cleaned)
            .map_err(|e| EdaError::CleaningFailed(format!("imputation: {e:#}")))?;
        if filled.is_empty() {
            actions.push("No missing values to fill".to_string());
        }
        actions.extend(filled);

        Ok(CleaningReport {
            cleaned,
            duplicates_removed,
            actions,
        })
    }
}
