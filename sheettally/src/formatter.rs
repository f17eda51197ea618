//! Output formatters for batch reports

use anyhow::Result;
use colored::*;
use sheettally_core::aggregate::{rate_text, results_summary_text};
use sheettally_core::batch::BatchReport;
use sheettally_core::{FileReport, Outcome, TallyConfig};

/// Print reports in human-readable format with colors
pub fn print_human(report: &BatchReport, config: &TallyConfig) {
    for file_report in &report.reports {
        print_file(file_report, config);
        println!();
    }

    for failure in &report.failures {
        println!("{} {}", "File:".bold(), failure.filepath.cyan().bold());
        println!("  {} {}", "FAILED".red().bold(), failure.message);
        println!();
    }

    let summary = report.summary();
    println!("{}", "Summary:".bold().underline());
    println!("  {} {}", "Files:".bold(), summary.files + summary.failures);
    if summary.errors > 0 {
        println!("  {} {}", "Errors:".red().bold(), summary.errors);
    }
    if summary.failures > 0 {
        println!("  {} {}", "Unreadable:".red().bold(), summary.failures);
    }
    if summary.warnings > 0 {
        println!("  {} {}", "Warnings:".yellow().bold(), summary.warnings);
    }
    println!(
        "  {} {}/{} ({} executed, {} completed)",
        "Cases:".bold(),
        summary.stats.filled,
        summary.stats.available,
        rate_text(summary.stats.execution_rate()),
        rate_text(summary.stats.completion_rate())
    );

    let breakdown = results_summary_text(&summary.total, summary.stats.incompleted, config);
    if !breakdown.is_empty() {
        println!("  {} {}", "Results:".bold(), breakdown);
    }
}

fn print_file(file_report: &FileReport, config: &TallyConfig) {
    println!(
        "{} {} {}",
        "File:".bold(),
        file_report.file.cyan().bold(),
        format!("(updated {})", file_report.last_updated).bright_black()
    );

    let result = match &file_report.outcome {
        Outcome::Aggregated(result) => result,
        Outcome::Failed { error } => {
            println!(
                "  {} [{}] {}",
                "ERROR".red().bold(),
                error.kind.bright_black(),
                error.message
            );
            return;
        }
    };

    let stats = &result.stats;
    println!(
        "  {} {}",
        "Status:".bold(),
        result.run.status.display_name(&config.status)
    );
    if let Some(start) = &result.run.start_date {
        let last = result.run.last_update.as_deref().unwrap_or("-");
        println!("  {} {} .. {}", "Period:".bold(), start, last);
    }
    println!(
        "  {} {} available, {} excluded, {} filled, {} completed",
        "Cases:".bold(),
        stats.available,
        stats.excluded,
        stats.filled,
        stats.completed
    );
    println!(
        "  {} executed {}, completed {}",
        "Rates:".bold(),
        rate_text(stats.execution_rate()),
        rate_text(stats.completion_rate())
    );

    let breakdown = results_summary_text(&result.total, stats.incompleted, config);
    if !breakdown.is_empty() {
        println!("  {} {}", "Results:".bold(), breakdown);
    }

    for counts in &result.count_by_sheet {
        println!(
            "    {} {}: {} env x {} cases",
            "Sheet".bright_black(),
            counts.sheet_name,
            counts.env_count,
            counts.case_count
        );
    }

    if let Some(warning) = &result.warning {
        println!(
            "  {} [{}] {}",
            "WARN".yellow().bold(),
            warning.kind.bright_black(),
            warning.message
        );
    }
}

/// Print reports in JSON format
pub fn print_json(report: &BatchReport) -> Result<()> {
    let output = serde_json::json!({
        "files": report.reports,
        "failures": report.failures,
        "summary": report.summary(),
    });

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
