//! Pandas cleaning-script generation.
//!
//! The script mirrors the default cleaning transform so a user can rerun it
//! outside the service: drop duplicates, then fill each column that has
//! missing values with its median (numeric) or mode (everything else).

use crate::types::{CleaningScript, DatasetProfile};
use std::path::Path;

/// Columns above this missing percentage get a review comment.
const REVIEW_MISSING_PCT: f64 = 50.0;

pub struct ScriptGenerator;

impl ScriptGenerator {
    /// Render a script for `profile`, reading `dataset_name` and writing
    /// `<stem>_cleaned.csv`.
    pub fn generate(profile: &DatasetProfile, dataset_name: &str) -> CleaningScript {
        let mut code = String::new();
        let output_name = format!("{}_cleaned.csv", file_stem(dataset_name));

        code.push_str(&format!("# Auto-generated cleaning script for {dataset_name}\n"));
        code.push_str(&format!(
            "# Dataset shape: {} rows x {} columns\n\n",
            profile.row_count, profile.column_count
        ));
        code.push_str("import pandas as pd\n\n");
        code.push_str("# Load dataset\n");
        code.push_str(&format!("df = pd.read_csv({})\n\n", py_str(dataset_name)));

        if profile.duplicate_row_count > 0 {
            code.push_str(&format!(
                "# Drop duplicate rows ({} found)\n",
                profile.duplicate_row_count
            ));
            code.push_str("df = df.drop_duplicates()\n");
        } else {
            code.push_str("# No duplicate rows found\n");
        }
        code.push('\n');

        let with_missing: Vec<_> = profile
            .columns
            .iter()
            .filter(|c| c.missing_count > 0)
            .collect();

        if with_missing.is_empty() {
            code.push_str("# No missing values found\n");
        } else {
            code.push_str("# Fill missing values\n");
            for column in with_missing {
                let name = py_str(&column.name);
                if column.missing_percentage > REVIEW_MISSING_PCT {
                    code.push_str(&format!(
                        "# {name} is {:.1}% missing; consider dropping it instead\n",
                        column.missing_percentage
                    ));
                }
                if column.is_numeric() {
                    code.push_str(&format!(
                        "df[{name}] = df[{name}].fillna(df[{name}].median())\n"
                    ));
                } else {
                    code.push_str(&format!("if not df[{name}].mode().empty:\n"));
                    code.push_str(&format!(
                        "    df[{name}] = df[{name}].fillna(df[{name}].mode()[0])\n"
                    ));
                }
            }
        }
        code.push('\n');

        code.push_str("# Save cleaned dataset\n");
        code.push_str(&format!("df.to_csv({}, index=False)\n", py_str(&output_name)));
        code.push_str(&format!(
            "print({})\n",
            py_str(&format!("Data cleaning complete! Saved to {output_name}"))
        ));

        CleaningScript::pandas(code)
    }
}

/// A double-quoted Python string literal. JSON string escapes are a subset
/// of Python's.
fn py_str(value: &str) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| format!("\"{}\"", value.escape_default()))
}

fn file_stem(dataset_name: &str) -> String {
    Path::new(dataset_name)
        .file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .unwrap_or("dataset")
        .to_string()
}
