//! Deterministic explanations that need no network access.

use super::provider::{ExplanationProvider, ExplanationRequest};
use crate::types::{IssueCategory, RiskLevel, Severity};
use anyhow::Result;
use std::fmt::Write;

/// Builds an explanation from the risk assessment alone. Never fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleBasedExplainer;

impl RuleBasedExplainer {
    pub fn render(&self, request: &ExplanationRequest<'_>) -> String {
        let profile = request.profile;
        let risk = request.risk;
        let mut out = String::new();

        let _ = writeln!(
            out,
            "The dataset has {} rows and {} columns. Overall risk is {} ({:.2}/1.0).",
            profile.row_count,
            profile.column_count,
            risk.risk_level.as_str(),
            risk.risk_score
        );

        if risk.issues.is_empty() {
            let _ = writeln!(
                out,
                "No column exceeds the missing-value thresholds and duplicates are rare."
            );
        } else {
            let _ = writeln!(out, "\nFindings:");
            for issue in &risk.issues {
                let label = match issue.severity {
                    Severity::Critical => "CRITICAL",
                    Severity::Warning => "WARNING",
                };
                let _ = writeln!(out, "- [{}] {}", label, issue.message);
            }
        }

        let mut steps = Vec::new();
        if risk
            .issues
            .iter()
            .any(|i| i.category == IssueCategory::Duplicates)
            || profile.duplicate_row_count > 0
        {
            steps.push("Drop exact duplicate rows, keeping the first occurrence.".to_string());
        }
        for column in profile.columns.iter().filter(|c| c.missing_count > 0) {
            let strategy = if column.missing_percentage > 50.0 {
                "consider dropping it, or fill it only if the column is essential"
            } else if column.is_numeric() {
                "fill missing values with the median"
            } else {
                "fill missing values with the most frequent value"
            };
            steps.push(format!("Column '{}': {}.", column.name, strategy));
        }
        if risk.components.datatype_issue_score > 0.25 {
            steps.push(
                "Many columns are text; check whether some should be parsed as numbers or dates."
                    .to_string(),
            );
        }

        if !steps.is_empty() {
            let _ = writeln!(out, "\nRecommended cleaning steps:");
            for (i, step) in steps.iter().enumerate() {
                let _ = writeln!(out, "{}. {}", i + 1, step);
            }
        }

        if risk.risk_level == RiskLevel::High {
            let _ = writeln!(
                out,
                "\nResults computed on this data are unreliable until the critical issues are fixed."
            );
        }

        out.trim_end().to_string()
    }
}

impl ExplanationProvider for RuleBasedExplainer {
    fn explain(&self, request: &ExplanationRequest<'_>) -> Result<String> {
        Ok(self.render(request))
    }

    fn name(&self) -> &str {
        "RuleBased"
    }
}
