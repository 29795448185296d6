//! # Reporting Module / 报告模块
//!
//! This module handles the display of test results: colorful console summaries
//! with internationalization support, and a JSON report for machines.
//!
//! 此模块处理测试结果的展示：支持国际化的彩色控制台摘要，以及供机器读取的 JSON 报告。

pub mod console;
pub mod json;

// Re-export common reporting functions
pub use console::{print_failure_details, print_summary};
pub use json::generate_json_report;
