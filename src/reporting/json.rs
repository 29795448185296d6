//! # JSON Report Module / JSON 报告模块
//!
//! Writes the results of a run as a JSON document for CI systems.
//!
//! 将运行结果写成 JSON 文档，供 CI 系统使用。

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fs;
use std::path::Path;

use crate::core::config::TestConfig;
use crate::core::models::{RunSummary, TestResult};

#[derive(Debug, Serialize)]
pub struct JsonReport<'a> {
    pub generated_at: DateTime<Utc>,
    pub seed: i64,
    pub num_threads: usize,
    pub match_output: bool,
    pub passed: bool,
    pub results: &'a [TestResult],
}

impl<'a> JsonReport<'a> {
    pub fn new(summary: &'a RunSummary, config: &TestConfig) -> Self {
        Self {
            generated_at: Utc::now(),
            seed: config.seed,
            num_threads: config.num_threads,
            match_output: config.match_output,
            passed: summary.passed(),
            results: &summary.results,
        }
    }
}

/// Generates a JSON report from the run summary and writes it to `output_path`.
///
/// 根据运行摘要生成 JSON 报告并写入 `output_path`。
pub fn generate_json_report(
    summary: &RunSummary,
    config: &TestConfig,
    output_path: &Path,
) -> Result<()> {
    let report = JsonReport::new(summary, config);
    let json = serde_json::to_string_pretty(&report).context("Failed to serialize the report")?;
    fs::write(output_path, json)
        .with_context(|| format!("Failed to write report to {}", output_path.display()))
}
