//! Data quality risk scoring.
//!
//! Turns a [`DatasetProfile`](crate::types::DatasetProfile) into a weighted
//! risk score, a coarse risk level and a list of actionable issues.

mod scorer;

pub use scorer::{DATATYPE_WEIGHT, DUPLICATE_WEIGHT, MISSING_WEIGHT, RiskScorer};
