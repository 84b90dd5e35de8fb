//! Imputation module for handling missing values.
//!
//! Median for numeric columns, mode for everything else.

mod statistical;

pub use statistical::StatisticalImputer;
