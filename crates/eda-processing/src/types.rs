use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// Profiling Types
// ============================================================================

/// Semantic type of a column as seen by the profiler.
///
/// Integer and float columns are numeric; every other physical type (text,
/// booleans, dates, mixed content) is categorical.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnKind {
    Numeric,
    Categorical,
}

impl ColumnKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ColumnKind::Numeric => "numeric",
            ColumnKind::Categorical => "categorical",
        }
    }
}

/// Descriptive statistics of a numeric column.
///
/// Every field is `None` when the column has no non-missing values, which
/// serializes as an explicit JSON `null`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct NumericSummary {
    pub mean: Option<f64>,
    pub median: Option<f64>,
    pub std: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl NumericSummary {
    /// Summary of a numeric column whose values are all missing.
    pub fn absent() -> Self {
        Self::default()
    }

    pub fn is_absent(&self) -> bool {
        self.mean.is_none()
            && self.median.is_none()
            && self.std.is_none()
            && self.min.is_none()
            && self.max.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnProfile {
    pub name: String,
    /// Physical dtype label (`int64`, `float64`, `bool`, `object`, ...).
    pub dtype: String,
    pub inferred_type: ColumnKind,
    pub missing_count: usize,
    pub missing_percentage: f64,
    pub unique_count: usize,
    pub unique_percentage: f64,
    /// Present only for numeric columns; categorical columns omit the
    /// `mean`/`median`/`std`/`min`/`max` keys entirely.
    #[serde(flatten)]
    pub numeric: Option<NumericSummary>,
}

impl ColumnProfile {
    pub fn is_numeric(&self) -> bool {
        self.inferred_type == ColumnKind::Numeric
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetProfile {
    #[serde(rename = "rows")]
    pub row_count: usize,
    #[serde(rename = "columns")]
    pub column_count: usize,
    #[serde(rename = "duplicates")]
    pub duplicate_row_count: usize,
    pub duplicate_percentage: f64,
    #[serde(rename = "memory_usage_mb")]
    pub memory_estimate_mb: f64,
    #[serde(rename = "columns_analysis")]
    pub columns: Vec<ColumnProfile>,
    pub generated_at: DateTime<Utc>,
}

impl DatasetProfile {
    /// Total number of missing cells across all columns.
    pub fn total_missing(&self) -> usize {
        self.columns.iter().map(|c| c.missing_count).sum()
    }

    pub fn categorical_column_count(&self) -> usize {
        self.columns.iter().filter(|c| !c.is_numeric()).count()
    }

    pub fn column(&self, name: &str) -> Option<&ColumnProfile> {
        self.columns.iter().find(|c| c.name == name)
    }
}

// ============================================================================
// Risk Types
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Critical,
    Warning,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueCategory {
    MissingValues,
    Duplicates,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    pub severity: Severity,
    #[serde(rename = "type")]
    pub category: IssueCategory,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column: Option<String>,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    /// Classify a risk score. Both thresholds are strict: 0.6 is Medium and
    /// 0.3 is Low.
    pub fn from_score(score: f64) -> Self {
        if score > 0.6 {
            RiskLevel::High
        } else if score > 0.3 {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "Low",
            RiskLevel::Medium => "Medium",
            RiskLevel::High => "High",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskComponents {
    pub missing_value_rate: f64,
    pub duplicate_rate: f64,
    pub datatype_issue_score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub risk_score: f64,
    pub risk_level: RiskLevel,
    pub components: RiskComponents,
    pub issues: Vec<Issue>,
}

impl RiskAssessment {
    pub fn critical_issues(&self) -> impl Iterator<Item = &Issue> {
        self.issues
            .iter()
            .filter(|issue| issue.severity == Severity::Critical)
    }
}

// ============================================================================
// Comparison Types
// ============================================================================

/// Summary metrics of a table, computed on both sides of the cleaning
/// transform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetMetrics {
    pub rows: usize,
    pub columns: usize,
    pub missing_values: usize,
    pub missing_percentage: f64,
    pub duplicates: usize,
    pub duplicate_percentage: f64,
    pub memory_mb: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Improvements {
    pub rows_removed: usize,
    pub missing_values_fixed: usize,
    pub duplicates_removed: usize,
}

impl Improvements {
    pub fn between(before: &DatasetMetrics, after: &DatasetMetrics) -> Self {
        Self {
            rows_removed: before.rows.saturating_sub(after.rows),
            missing_values_fixed: before.missing_values.saturating_sub(after.missing_values),
            duplicates_removed: before.duplicates.saturating_sub(after.duplicates),
        }
    }

    pub fn is_noop(&self) -> bool {
        self.rows_removed == 0 && self.missing_values_fixed == 0 && self.duplicates_removed == 0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonResult {
    pub before: DatasetMetrics,
    pub after: DatasetMetrics,
    pub improvements: Improvements,
}

// ============================================================================
// Collaborator Types (upload metadata, script, explanation)
// ============================================================================

/// Metadata returned to the UI right after an upload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetMetadata {
    pub session_id: String,
    pub filename: String,
    pub size_bytes: u64,
    pub rows: usize,
    pub columns: usize,
    pub column_names: Vec<String>,
    /// First rows of the table, one JSON object per row.
    pub preview: Vec<serde_json::Map<String, serde_json::Value>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleaningScript {
    pub code: String,
    pub language: String,
    pub format: String,
}

impl CleaningScript {
    pub fn pandas(code: String) -> Self {
        Self {
            code,
            language: "python".to_string(),
            format: "pandas".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Explanation {
    pub explanation: String,
    pub provider: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}
