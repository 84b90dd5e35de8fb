//! CLI entry point for profiling a local CSV file.

use anyhow::{Result, anyhow};
use clap::Parser;
use dotenv::dotenv;
use eda_processing::{
    Comparator, ComparisonResult, CsvLoader, DataCleaner, DataProfiler, DatasetProfile,
    Explanation, ExplanationProvider, ExplanationRequest, LoadOptions, RiskAssessment, RiskScorer,
    ScriptGenerator, Severity, explain_or_fallback,
};
use serde::Serialize;
use std::path::Path;
use tracing::{info, warn};

#[cfg(feature = "ai")]
use eda_processing::ai::{AnthropicProvider, OpenRouterConfig, OpenRouterProvider};
#[cfg(feature = "ai")]
use std::env;

#[derive(Parser, Debug)]
#[command(
    name = "eda-processing",
    version,
    about = "Profile a CSV file and score its data quality",
    after_help = "\
                  ENVIRONMENT VARIABLES:\n  \
                  OPENROUTER_API_KEY    API key for OpenRouter explanations\n  \
                  ANTHROPIC_API_KEY     API key for Anthropic explanations\n  \
                  EXPLAIN_MODEL         Model override for the explanation provider\n\n\
                  EXAMPLES:\n  \
                  # Profile and score a file\n  \
                  eda-processing -i data.csv\n\n  \
                  # Everything as JSON\n  \
                  eda-processing -i data.csv --compare --script --json\n\n  \
                  # Write the cleaned table\n  \
                  eda-processing -i data.csv --cleaned-output data_cleaned.csv"
)]
struct Args {
    /// Path to the CSV file to profile
    #[arg(short, long)]
    input: String,

    /// Output JSON to stdout instead of a human-readable summary
    ///
    /// Disables all logging so stdout only contains the JSON report.
    #[arg(long)]
    json: bool,

    /// Also run the default cleaning transform and compare before/after
    #[arg(short, long)]
    compare: bool,

    /// Also emit a pandas cleaning script
    #[arg(short, long)]
    script: bool,

    /// Also generate a natural-language explanation
    #[arg(short, long)]
    explain: bool,

    /// Write the cleaned table to this path
    #[arg(long)]
    cleaned_output: Option<String>,

    /// Number of rows scanned for type inference
    #[arg(long, default_value = "100")]
    infer_schema_length: usize,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Suppress progress output (only show warnings and the final result)
    #[arg(short, long)]
    quiet: bool,
}

#[derive(Serialize)]
struct CliReport<'a> {
    file: &'a str,
    profile: &'a DatasetProfile,
    risk: &'a RiskAssessment,
    #[serde(skip_serializing_if = "Option::is_none")]
    comparison: Option<&'a ComparisonResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    script: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    explanation: Option<&'a Explanation>,
}

/// Initialize the tracing subscriber for logging.
///
/// When `json_output` is true, logging is completely disabled to ensure
/// only JSON is written to stdout.
fn init_logging(level: &str, quiet: bool, json_output: bool) {
    if json_output {
        return;
    }

    use tracing_subscriber::EnvFilter;

    let effective_level = if quiet { "warn" } else { level };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(effective_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(&args.log_level, args.quiet, args.json);
    dotenv().ok();

    if !Path::new(&args.input).exists() {
        return Err(anyhow!("Input file not found: {}", args.input));
    }

    let options = LoadOptions::builder()
        .infer_schema_length(args.infer_schema_length)
        .build()?;
    let data = CsvLoader::load_path(&args.input, &options)?;
    info!("Dataset loaded successfully: {:?}", data.shape());

    let profile = DataProfiler::profile_dataset(&data)?;
    let risk = RiskScorer::assess(&profile);

    let comparison = if args.compare {
        Some(Comparator::compare(&data)?)
    } else {
        None
    };

    let script = args.script.then(|| {
        let name = Path::new(&args.input)
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or(&args.input);
        ScriptGenerator::generate(&profile, name).code
    });

    let explanation = args.explain.then(|| {
        let provider = build_provider();
        explain_or_fallback(provider.as_deref(), &ExplanationRequest::new(&profile, &risk))
    });

    if let Some(ref path) = args.cleaned_output {
        let cleaned = DataCleaner::clean(&data)?;
        std::fs::write(path, CsvLoader::to_csv_bytes(&cleaned)?)?;
        info!("Cleaned dataset written to {}", path);
    }

    if args.json {
        let report = CliReport {
            file: &args.input,
            profile: &profile,
            risk: &risk,
            comparison: comparison.as_ref(),
            script: script.as_deref(),
            explanation: explanation.as_ref(),
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_human_readable_summary(&args.input, &profile, &risk);
        if let Some(ref comparison) = comparison {
            print_comparison(comparison);
        }
        if let Some(ref explanation) = explanation {
            println!("EXPLANATION ({})", explanation.provider);
            println!("{}", "-".repeat(40));
            println!("{}\n", explanation.explanation);
        }
        if let Some(ref code) = script {
            println!("CLEANING SCRIPT");
            println!("{}", "-".repeat(40));
            println!("{code}");
        }
    }

    Ok(())
}

/// Pick a remote provider from the environment, if one is configured.
#[cfg(feature = "ai")]
fn build_provider() -> Option<Box<dyn ExplanationProvider>> {
    let model = env::var("EXPLAIN_MODEL").ok();

    if let Ok(key) = env::var("OPENROUTER_API_KEY") {
        let mut config = OpenRouterConfig::builder();
        if let Some(ref model) = model {
            config = config.model(model);
        }
        match OpenRouterProvider::with_config(key, config.build()) {
            Ok(provider) => return Some(Box::new(provider)),
            Err(e) => warn!("Could not create OpenRouter provider: {}", e),
        }
    }

    if let Ok(key) = env::var("ANTHROPIC_API_KEY") {
        match AnthropicProvider::new(key) {
            Ok(provider) => return Some(Box::new(provider)),
            Err(e) => warn!("Could not create Anthropic provider: {}", e),
        }
    }

    info!("No explanation provider configured, using rule-based explanations");
    None
}

#[cfg(not(feature = "ai"))]
fn build_provider() -> Option<Box<dyn ExplanationProvider>> {
    warn!("Built without the `ai` feature, using rule-based explanations");
    None
}

/// Print a human-readable profile and risk summary.
///
/// Uses `println!` on purpose: this is the command's output, not logging.
fn print_human_readable_summary(file: &str, profile: &DatasetProfile, risk: &RiskAssessment) {
    println!();
    println!("{}", "=".repeat(80));
    println!("DATASET PROFILE");
    println!("{}", "=".repeat(80));
    println!();

    println!("  File: {}", file);
    println!("  Rows: {}", profile.row_count);
    println!("  Columns: {}", profile.column_count);
    println!(
        "  Duplicates: {} ({:.1}%)",
        profile.duplicate_row_count, profile.duplicate_percentage
    );
    println!("  Memory: {:.2} MB", profile.memory_estimate_mb);
    println!();

    println!(
        "  {:<24} {:<10} {:>9} {:>9} {:>12} {:>12}",
        "Column", "Type", "Missing%", "Unique", "Mean", "Median"
    );
    println!("  {}", "-".repeat(78));
    for col in &profile.columns {
        let (mean, median) = match col.numeric {
            Some(ref n) => (fmt_stat(n.mean), fmt_stat(n.median)),
            None => ("-".to_string(), "-".to_string()),
        };
        println!(
            "  {:<24} {:<10} {:>8.1}% {:>9} {:>12} {:>12}",
            truncate_str(&col.name, 24),
            col.dtype,
            col.missing_percentage,
            col.unique_count,
            mean,
            median
        );
    }
    println!();

    println!("RISK ASSESSMENT");
    println!("{}", "-".repeat(40));
    println!(
        "  Score: {:.3} ({})",
        risk.risk_score,
        risk.risk_level.as_str()
    );
    println!(
        "  Missing value rate: {:.1}%",
        risk.components.missing_value_rate * 100.0
    );
    println!(
        "  Duplicate rate: {:.1}%",
        risk.components.duplicate_rate * 100.0
    );
    println!(
        "  Datatype issue score: {:.3}",
        risk.components.datatype_issue_score
    );
    println!();

    if risk.issues.is_empty() {
        println!("  No issues found");
    } else {
        for issue in &risk.issues {
            let marker = match issue.severity {
                Severity::Critical => "!!",
                Severity::Warning => " !",
            };
            println!("  {} {}", marker, issue.message);
        }
    }
    println!();
}

fn print_comparison(comparison: &ComparisonResult) {
    let before = &comparison.before;
    let after = &comparison.after;
    let improvements = &comparison.improvements;

    println!("BEFORE / AFTER CLEANING");
    println!("{}", "-".repeat(40));
    println!("  Rows: {} -> {}", before.rows, after.rows);
    println!(
        "  Missing values: {} -> {} ({:.1}% -> {:.1}%)",
        before.missing_values,
        after.missing_values,
        before.missing_percentage,
        after.missing_percentage
    );
    println!("  Duplicates: {} -> {}", before.duplicates, after.duplicates);
    println!(
        "  Fixed: {} missing values, {} duplicates removed",
        improvements.missing_values_fixed, improvements.duplicates_removed
    );
    println!();
}

fn fmt_stat(value: Option<f64>) -> String {
    value.map_or_else(|| "null".to_string(), |v| format!("{v:.3}"))
}

fn truncate_str(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", truncated)
    }
}
