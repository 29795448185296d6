//! # Run Command Module / 运行命令模块
//!
//! This module implements the `run` command for the Notebook Runner CLI:
//! resolve the configuration, load every notebook, test them concurrently and
//! report the results.
//!
//! 此模块实现了 Notebook Runner CLI 的运行命令：
//! 解析配置、加载所有笔记本、并发测试并报告结果。

use anyhow::{Context, Result};
use colored::*;
use std::sync::Arc;

use crate::{
    cli::RunArgs,
    core::{
        config::{RunnerConfig, TestConfig},
        notebook::load_notebooks,
        orchestrator::run_notebooks,
    },
    infra::{fs::discover_notebooks, kernel::KernelFactory, t},
    reporting::{generate_json_report, print_failure_details, print_summary},
};

/// Executes the run command with the provided arguments.
///
/// # Returns
/// `Ok(true)` if every notebook passed, `Ok(false)` if any failed
pub async fn execute(args: RunArgs) -> Result<bool> {
    let file_config = match &args.config {
        Some(path) => RunnerConfig::load(path)?,
        None => RunnerConfig::default(),
    };

    let locale = file_config.resolve_language(args.language.as_deref(), &args.system_language);
    rust_i18n::set_locale(&locale);

    let config = TestConfig::resolve(&file_config, &args.overrides, default_seed())?;

    let paths = discover_notebooks(&args.notebooks)?;
    if paths.is_empty() {
        println!("{}", t!("run.no_notebooks", locale = &locale).yellow());
        return Ok(true);
    }

    // Every document is validated before any kernel is started.
    let notebooks = load_notebooks(&paths)?;
    println!(
        "{}",
        t!(
            "run.loaded_notebooks",
            locale = &locale,
            count = notebooks.len(),
            threads = config.num_threads
        )
        .cyan()
    );
    println!(
        "{}",
        t!("run.using_seed", locale = &locale, seed = config.seed).cyan()
    );

    let factory = KernelFactory::new(&file_config.kernel, args.overrides.kernel.clone())
        .context(t!("run.kernel_setup_failed", locale = &locale))?;

    let config = Arc::new(config);
    let summary = run_notebooks(notebooks, Arc::clone(&config), Arc::new(factory)).await?;

    print_summary(&summary, &locale);
    if config.verbose {
        print_failure_details(&summary.failures(), &locale);
    }

    if let Some(report_path) = &args.json_report {
        println!(
            "\n{}",
            t!("run.writing_report", locale = &locale, path = report_path.display())
        );
        if let Err(e) = generate_json_report(&summary, &config, report_path) {
            eprintln!("{} {:#}", t!("run.report_failed", locale = &locale).red(), e);
        }
    }

    Ok(summary.passed())
}

/// The seed used when none was given: the current Unix time in seconds.
/// Computed once per run, here at the edge of the program.
fn default_seed() -> i64 {
    chrono::Utc::now().timestamp()
}
