//! Exploratory data analysis engine.
//!
//! Turns an uploaded CSV into a statistical profile, a weighted data-quality
//! risk score and a before/after comparison of a default cleaning transform.
//! Built on Polars.
//!
//! # Overview
//!
//! - **Profiling**: per-column missing/unique counts and numeric statistics,
//!   duplicate rows, memory estimate ([`DataProfiler`])
//! - **Risk scoring**: `0.4 * missing + 0.3 * duplicates + 0.3 * datatype`,
//!   a risk level and ordered issues ([`RiskScorer`])
//! - **Comparison**: dedup + median/mode imputation on a copy, with metrics
//!   before and after ([`Comparator`], [`DataCleaner`])
//! - **Collaborators**: CSV loading ([`CsvLoader`]), pandas script generation
//!   ([`ScriptGenerator`]) and LLM explanations ([`ai`])
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use eda_processing::{Comparator, CsvLoader, DataProfiler, LoadOptions, RiskScorer};
//!
//! let df = CsvLoader::load_path("data.csv", &LoadOptions::default())?;
//!
//! let profile = DataProfiler::profile_dataset(&df)?;
//! let risk = RiskScorer::assess(&profile);
//! println!("Risk: {} ({:.2})", risk.risk_level.as_str(), risk.risk_score);
//!
//! let comparison = Comparator::compare(&df)?;
//! println!("Fixed {} missing values", comparison.improvements.missing_values_fixed);
//! ```

pub mod ai;
pub mod cleaner;
pub mod compare;
pub mod config;
pub mod error;
pub mod imputers;
pub mod loader;
pub mod profiler;
pub mod quality;
pub mod script;
pub mod types;
pub mod utils;

// Re-exports for convenient access
pub use ai::{ExplanationProvider, ExplanationRequest, RuleBasedExplainer, explain_or_fallback};
pub use cleaner::{CleaningReport, DataCleaner};
pub use compare::Comparator;
pub use config::{ConfigValidationError, LoadOptions, LoadOptionsBuilder};
pub use error::{EdaError, Result as EdaResult, ResultExt};
pub use imputers::StatisticalImputer;
pub use loader::CsvLoader;
pub use profiler::DataProfiler;
pub use quality::RiskScorer;
pub use script::ScriptGenerator;
pub use types::{
    CleaningScript, ColumnKind, ColumnProfile, ComparisonResult, DatasetMetadata, DatasetMetrics,
    DatasetProfile, Explanation, Improvements, Issue, IssueCategory, NumericSummary,
    RiskAssessment, RiskComponents, RiskLevel, Severity,
};

// Results are shared across request handlers.
static_assertions::assert_impl_all!(DatasetProfile: Send, Sync);
static_assertions::assert_impl_all!(RiskAssessment: Send, Sync);
static_assertions::assert_impl_all!(ComparisonResult: Send, Sync);
static_assertions::assert_impl_all!(EdaError: Send, Sync);
