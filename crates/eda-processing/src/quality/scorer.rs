use crate::types::{
    DatasetProfile, Issue, IssueCategory, RiskAssessment, RiskComponents, RiskLevel, Severity,
};

/// Weight of the missing-value rate in the risk score.
pub const MISSING_WEIGHT: f64 = 0.4;
/// Weight of the duplicate-row rate in the risk score.
pub const DUPLICATE_WEIGHT: f64 = 0.3;
/// Weight of the datatype heuristic in the risk score.
pub const DATATYPE_WEIGHT: f64 = 0.3;

/// Scale applied to the categorical-column fraction.
const DATATYPE_SCALE: f64 = 0.5;

const MISSING_CRITICAL_PCT: f64 = 50.0;
const MISSING_WARNING_PCT: f64 = 20.0;
const DUPLICATE_CRITICAL_PCT: f64 = 10.0;
const DUPLICATE_WARNING_PCT: f64 = 5.0;

pub struct RiskScorer;

impl RiskScorer {
    /// Derive the weighted risk score, its level and the issue list from a profile.
    pub fn assess(profile: &DatasetProfile) -> RiskAssessment {
        let components = Self::components(profile);
        let risk_score = MISSING_WEIGHT * components.missing_value_rate
            + DUPLICATE_WEIGHT * components.duplicate_rate
            + DATATYPE_WEIGHT * components.datatype_issue_score;

        RiskAssessment {
            risk_score,
            risk_level: RiskLevel::from_score(risk_score),
            components,
            issues: Self::identify_issues(profile),
        }
    }

    pub fn components(profile: &DatasetProfile) -> RiskComponents {
        let total_cells = profile.row_count * profile.column_count;
        let missing_value_rate = if total_cells == 0 {
            0.0
        } else {
            profile.total_missing() as f64 / total_cells as f64
        };

        // Share of text/categorical columns, used as a stand-in for "columns
        // that probably need type coercion". It does not inspect values.
        let datatype_issue_score = if profile.column_count == 0 {
            0.0
        } else {
            profile.categorical_column_count() as f64 / profile.column_count as f64
                * DATATYPE_SCALE
        };

        RiskComponents {
            missing_value_rate,
            duplicate_rate: profile.duplicate_percentage / 100.0,
            datatype_issue_score,
        }
    }

    /// Column issues in column order, followed by at most one duplicates issue.
    pub fn identify_issues(profile: &DatasetProfile) -> Vec<Issue> {
        let mut issues: Vec<Issue> = profile
            .columns
            .iter()
            .filter_map(|col| {
                let severity = if col.missing_percentage > MISSING_CRITICAL_PCT {
                    Severity::Critical
                } else if col.missing_percentage > MISSING_WARNING_PCT {
                    Severity::Warning
                } else {
                    return None;
                };
                Some(Issue {
                    severity,
                    category: IssueCategory::MissingValues,
                    column: Some(col.name.clone()),
                    message: format!(
                        "Column '{}' has {:.1}% missing values ({} of {} rows)",
                        col.name, col.missing_percentage, col.missing_count, profile.row_count
                    ),
                })
            })
            .collect();

        let duplicate_severity = if profile.duplicate_percentage > DUPLICATE_CRITICAL_PCT {
            Some(Severity::Critical)
        } else if profile.duplicate_percentage > DUPLICATE_WARNING_PCT {
            Some(Severity::Warning)
        } else {
            None
        };

        if let Some(severity) = duplicate_severity {
            issues.push(Issue {
                severity,
                category: IssueCategory::Duplicates,
                column: None,
                message: format!(
                    "Dataset contains {} duplicate rows ({:.1}%)",
                    profile.duplicate_row_count, profile.duplicate_percentage
                ),
            });
        }

        issues
    }
}
