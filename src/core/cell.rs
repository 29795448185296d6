//! # Cell Model Module / 单元模型模块
//!
//! Cells as they appear in a notebook document. Code cells run through an
//! [`ExecutorSession`] and may be checked against their recorded outputs;
//! markdown and raw cells always pass.
//!
//! 笔记本文档中的单元。代码单元通过 [`ExecutorSession`] 运行，
//! 并可与其记录的输出进行比对；markdown 和 raw 单元总是通过。

use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};
use tracing::debug;

use crate::core::{
    execution::ExecutorSession,
    matcher,
    models::CellOutcome,
    output::{joined_text, Output},
};
use crate::infra::t;

/// One notebook cell, discriminated by `cell_type`.
/// 一个笔记本单元，由 `cell_type` 区分。
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "cell_type", rename_all = "lowercase")]
pub enum Cell {
    Code(CodeCell),
    Markdown(NarrativeCell),
    Raw(NarrativeCell),
}

/// An executable cell and the outputs recorded when the notebook was authored.
#[derive(Debug, Clone, Deserialize)]
pub struct CodeCell {
    #[serde(deserialize_with = "joined_text")]
    pub source: String,
    /// Recorded outputs. Their order must match the order of fresh outputs.
    #[serde(rename = "outputs")]
    pub original_outputs: Vec<Output>,
    /// The key is required, its value may be `null`.
    #[serde(deserialize_with = "nullable")]
    pub execution_count: Option<i64>,
    pub metadata: Map<String, Value>,
    #[serde(default, rename = "id")]
    pub cell_id: Option<String>,
}

/// A cell with no executable content (markdown or raw).
#[derive(Debug, Clone, Deserialize)]
pub struct NarrativeCell {
    #[serde(deserialize_with = "joined_text")]
    pub source: String,
    pub metadata: Map<String, Value>,
    #[serde(default, rename = "id")]
    pub cell_id: Option<String>,
}

fn nullable<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<i64>::deserialize(deserializer)
}

impl Cell {
    /// Builds a cell from one entry of a notebook's `cells` array.
    pub fn from_value(value: Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(value)
    }

    pub fn source(&self) -> &str {
        match self {
            Cell::Code(cell) => &cell.source,
            Cell::Markdown(cell) | Cell::Raw(cell) => &cell.source,
        }
    }

    pub fn cell_id(&self) -> Option<&str> {
        match self {
            Cell::Code(cell) => cell.cell_id.as_deref(),
            Cell::Markdown(cell) | Cell::Raw(cell) => cell.cell_id.as_deref(),
        }
    }

    pub fn is_executable(&self) -> bool {
        matches!(self, Cell::Code(_))
    }

    /// Returns whether the cell passed.
    ///
    /// 返回单元是否通过测试。
    pub async fn test(
        &self,
        executor: &mut dyn ExecutorSession,
        verbose: bool,
        match_output: bool,
    ) -> bool {
        self.check(executor, verbose, match_output).await.passed()
    }

    /// Runs the cell and returns a detailed outcome.
    pub async fn check(
        &self,
        executor: &mut dyn ExecutorSession,
        verbose: bool,
        match_output: bool,
    ) -> CellOutcome {
        match self {
            Cell::Code(cell) => cell.check(executor, verbose, match_output).await,
            Cell::Markdown(_) | Cell::Raw(_) => CellOutcome::Passed,
        }
    }
}

impl CodeCell {
    /// Runs the source, then either reports the error or compares the outputs.
    ///
    /// 运行源码，然后报告错误或比较输出。
    pub async fn check(
        &self,
        executor: &mut dyn ExecutorSession,
        verbose: bool,
        match_output: bool,
    ) -> CellOutcome {
        let execution = match executor.execute(&self.source).await {
            Ok(execution) => execution,
            Err(e) => {
                let message = e.to_string();
                if verbose {
                    eprintln!("{}", t!("cell.session_lost", error = &message));
                }
                return CellOutcome::SessionLost { message };
            }
        };

        if execution.errored {
            let traceback = execution.error_report();
            if verbose {
                report_error(traceback.as_deref());
            }
            return CellOutcome::Errored { traceback };
        }

        if !match_output {
            return CellOutcome::Passed;
        }

        match matcher::compare(&execution.outputs, &self.original_outputs) {
            Ok(()) => CellOutcome::Passed,
            Err(mismatch) => {
                debug!(cell = ?self.cell_id, %mismatch, "outputs differ");
                let detail = mismatch.to_string();
                if verbose {
                    eprintln!("{}", t!("cell.output_mismatch", detail = &detail));
                }
                CellOutcome::Mismatch { detail }
            }
        }
    }
}

fn report_error(traceback: Option<&str>) {
    match traceback {
        Some(traceback) => eprintln!("{traceback}"),
        None => eprintln!("{}", t!("cell.error_without_traceback")),
    }
}
