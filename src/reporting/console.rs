//! # Console Reporting Module / 控制台报告模块
//!
//! This module prints the summary of a run to the console. It provides colorful,
//! formatted output with internationalization support.
//!
//! 此模块在控制台打印运行摘要。它提供彩色格式化输出，支持国际化。

use colored::*;

use crate::core::models::{CellOutcome, RunSummary, TestResult};
use crate::infra::t;

/// Prints a formatted summary of notebook results to the console.
///
/// 在控制台打印格式化的笔记本结果摘要。
///
/// # Output Format / 输出格式
/// ```text
/// --- Test Summary ---
///   - Passed           | docs/intro.ipynb                        |      1.23s    4/4
///   - Output Mismatch  | docs/plots.ipynb                        |      0.45s    2/3
/// ```
pub fn print_summary(summary: &RunSummary, locale: &str) {
    println!("\n{}", t!("report.summary_banner", locale = locale).bold());

    for result in &summary.results {
        let status_str = result.get_status_str(locale);
        let status_colored = if result.passed() {
            status_str.green()
        } else {
            status_str.red()
        };
        let (passed, total) = result.cell_counts();

        println!(
            "  - {:<18} | {:<40} | {:>10} {:>6}",
            status_colored,
            result.notebook().display(),
            format!("{:.2?}", result.duration()),
            format!("{passed}/{total}")
        );
    }

    let failed = summary.failures().len();
    let total = summary.results.len();
    if failed == 0 {
        println!(
            "\n{}",
            t!("report.all_passed", locale = locale, total = total).green().bold()
        );
    } else {
        println!(
            "\n{}",
            t!("report.some_failed", locale = locale, failed = failed, total = total)
                .red()
                .bold()
        );
    }
}

/// Prints which cells of each failed notebook failed, and why.
///
/// Tracebacks are not repeated here; they were printed when the cell failed.
///
/// 打印每个失败笔记本中失败的单元及原因。
pub fn print_failure_details(failures: &[&TestResult], locale: &str) {
    if failures.is_empty() {
        return;
    }

    println!("\n{}", t!("report.failure_banner", locale = locale).red().bold());
    println!("{}", "-".repeat(80));

    for (i, result) in failures.iter().enumerate() {
        let TestResult::Failed {
            notebook,
            reason,
            failures: cells,
            message,
            ..
        } = result
        else {
            continue;
        };

        println!(
            "[{}/{}] {} '{}' ({})",
            i + 1,
            failures.len(),
            t!("report.failure_header", locale = locale).red(),
            notebook.display().to_string().cyan(),
            reason.label(locale)
        );

        if let Some(message) = message {
            println!("    {message}");
        }

        for cell in cells {
            let id = cell
                .cell_id
                .as_deref()
                .map(|id| format!(" [{id}]"))
                .unwrap_or_default();
            println!(
                "    {} #{}{}: {}",
                t!("report.cell", locale = locale),
                cell.index,
                id,
                describe(&cell.outcome, locale)
            );
        }
        println!("{}", "-".repeat(80));
    }
}

fn describe(outcome: &CellOutcome, locale: &str) -> String {
    match outcome {
        CellOutcome::Passed => t!("report.status_passed", locale = locale).to_string(),
        CellOutcome::Errored { traceback } => match traceback.as_deref().and_then(last_line) {
            Some(line) => format!("{} ({line})", t!("report.status_errored", locale = locale)),
            None => t!("report.status_errored", locale = locale).to_string(),
        },
        CellOutcome::Mismatch { detail } => {
            format!("{}: {detail}", t!("report.status_mismatch", locale = locale))
        }
        CellOutcome::TimedOut { limit } => t!(
            "report.cell_timed_out",
            locale = locale,
            secs = limit.as_secs()
        )
        .to_string(),
        CellOutcome::SessionLost { message } => {
            format!("{}: {message}", t!("report.status_session", locale = locale))
        }
        CellOutcome::NotRun => t!("report.status_not_run", locale = locale).to_string(),
    }
}

fn last_line(text: &str) -> Option<&str> {
    text.lines().rev().find(|line| !line.trim().is_empty())
}
