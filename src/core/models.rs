//! # Data Models Module / 数据模型模块
//!
//! This module defines the result types produced while testing notebooks:
//! per-cell outcomes, per-notebook reports and results, and the aggregated run
//! summary.
//!
//! 此模块定义了测试笔记本时产生的结果类型：
//! 单元结果、笔记本报告与结果，以及聚合后的运行摘要。

use crate::infra::t;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// The outcome of testing a single cell.
/// 测试单个单元的结果。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CellOutcome {
    /// The cell ran without error and, if requested, its outputs matched.
    /// 单元运行无错误，且（如有要求）输出匹配。
    Passed,
    /// The kernel reported an error while running the cell.
    /// 内核在运行该单元时报告了错误。
    Errored { traceback: Option<String> },
    /// The cell ran but its outputs differ from the recorded ones.
    /// 单元已运行，但输出与记录的不同。
    Mismatch { detail: String },
    /// The cell exceeded the per-cell timeout.
    /// 单元超出了每个单元的超时时间。
    TimedOut {
        #[serde(with = "duration_secs")]
        limit: Duration,
    },
    /// The session broke while the cell was running.
    /// 单元运行期间会话中断。
    SessionLost { message: String },
    /// The cell was not run because an earlier cell left the session unusable.
    /// 由于之前的单元使会话不可用，该单元未运行。
    NotRun,
}

impl CellOutcome {
    pub fn passed(&self) -> bool {
        matches!(self, CellOutcome::Passed)
    }

    /// Whether the session can no longer be trusted after this outcome.
    pub fn poisons_session(&self) -> bool {
        matches!(
            self,
            CellOutcome::TimedOut { .. } | CellOutcome::SessionLost { .. }
        )
    }

    /// Maps a failing outcome to the reason reported for the whole notebook.
    pub fn failure_reason(&self) -> Option<FailureReason> {
        match self {
            CellOutcome::Passed | CellOutcome::NotRun => None,
            CellOutcome::Errored { .. } => Some(FailureReason::Execution),
            CellOutcome::Mismatch { .. } => Some(FailureReason::OutputMismatch),
            CellOutcome::TimedOut { .. } => Some(FailureReason::Timeout),
            CellOutcome::SessionLost { .. } => Some(FailureReason::Session),
        }
    }
}

/// A cell outcome together with the position and id of the cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CellReport {
    pub index: usize,
    pub cell_id: Option<String>,
    pub outcome: CellOutcome,
}

/// The per-cell outcomes of one notebook run, in source order.
/// 一次笔记本运行中按源顺序排列的各单元结果。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NotebookReport {
    pub cells: Vec<CellReport>,
}

impl NotebookReport {
    /// `true` iff every cell passed.
    pub fn passed(&self) -> bool {
        self.cells.iter().all(|cell| cell.outcome.passed())
    }

    pub fn failures(&self) -> impl Iterator<Item = &CellReport> {
        self.cells.iter().filter(|cell| !cell.outcome.passed())
    }

    pub fn passed_count(&self) -> usize {
        self.cells.iter().filter(|cell| cell.outcome.passed()).count()
    }
}

/// Enumerates the reasons a notebook can fail.
/// 枚举笔记本失败的可能原因。
#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureReason {
    /// A cell raised an error.
    /// 某个单元抛出了错误。
    Execution,
    /// A cell's outputs did not match the recorded outputs.
    /// 某个单元的输出与记录的输出不匹配。
    OutputMismatch,
    /// A cell exceeded its timeout.
    /// 某个单元超时。
    Timeout,
    /// The kernel session could not be started or broke down.
    /// 内核会话无法启动或中途崩溃。
    Session,
}

/// Represents the final result of testing one notebook.
///
/// 表示测试单个笔记本的最终结果。
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TestResult {
    /// Every cell of the notebook passed.
    /// 笔记本的所有单元都通过了。
    Passed {
        notebook: PathBuf,
        cells: usize,
        #[serde(with = "duration_secs")]
        duration: Duration,
    },
    /// At least one cell failed, or the session could not be acquired.
    /// 至少有一个单元失败，或无法获取会话。
    Failed {
        notebook: PathBuf,
        reason: FailureReason,
        cells: usize,
        passed_cells: usize,
        /// The failing cells, in source order. Empty for session failures.
        failures: Vec<CellReport>,
        /// The session error, if the session could not be acquired.
        message: Option<String>,
        #[serde(with = "duration_secs")]
        duration: Duration,
    },
}

impl TestResult {
    /// Builds the result of a notebook whose cells were all run.
    pub fn from_report(notebook: &Path, report: NotebookReport, duration: Duration) -> Self {
        let cells = report.cells.len();
        let passed_cells = report.passed_count();
        let failures: Vec<CellReport> = report.failures().cloned().collect();

        match failures.iter().find_map(|cell| cell.outcome.failure_reason()) {
            None => TestResult::Passed {
                notebook: notebook.to_path_buf(),
                cells,
                duration,
            },
            Some(reason) => TestResult::Failed {
                notebook: notebook.to_path_buf(),
                reason,
                cells,
                passed_cells,
                failures,
                message: None,
                duration,
            },
        }
    }

    /// Builds the result of a notebook whose session could not be acquired.
    pub fn session_failure(
        notebook: &Path,
        cells: usize,
        message: String,
        duration: Duration,
    ) -> Self {
        TestResult::Failed {
            notebook: notebook.to_path_buf(),
            reason: FailureReason::Session,
            cells,
            passed_cells: 0,
            failures: Vec::new(),
            message: Some(message),
            duration,
        }
    }

    pub fn passed(&self) -> bool {
        matches!(self, TestResult::Passed { .. })
    }

    pub fn is_failure(&self) -> bool {
        !self.passed()
    }

    pub fn notebook(&self) -> &Path {
        match self {
            TestResult::Passed { notebook, .. } | TestResult::Failed { notebook, .. } => notebook,
        }
    }

    pub fn duration(&self) -> Duration {
        match self {
            TestResult::Passed { duration, .. } | TestResult::Failed { duration, .. } => *duration,
        }
    }

    /// Returns `(passed, total)` cell counts.
    pub fn cell_counts(&self) -> (usize, usize) {
        match self {
            TestResult::Passed { cells, .. } => (*cells, *cells),
            TestResult::Failed {
                cells,
                passed_cells,
                ..
            } => (*passed_cells, *cells),
        }
    }

    /// Gets the status of the test result as a string for display.
    /// 以字符串形式获取测试结果的状态以供显示。
    pub fn get_status_str(&self, locale: &str) -> String {
        match self {
            TestResult::Passed { .. } => t!("report.status_passed", locale = locale).to_string(),
            TestResult::Failed { reason, .. } => reason.label(locale),
        }
    }
}

impl FailureReason {
    pub fn label(&self, locale: &str) -> String {
        match self {
            FailureReason::Execution => t!("report.status_errored", locale = locale),
            FailureReason::OutputMismatch => t!("report.status_mismatch", locale = locale),
            FailureReason::Timeout => t!("report.status_timeout", locale = locale),
            FailureReason::Session => t!("report.status_session", locale = locale),
        }
        .to_string()
    }
}

/// All notebook results of one run, sorted by notebook path.
/// 一次运行的所有笔记本结果，按笔记本路径排序。
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub results: Vec<TestResult>,
}

impl RunSummary {
    pub fn new(mut results: Vec<TestResult>) -> Self {
        results.sort_by(|a, b| a.notebook().cmp(b.notebook()));
        Self { results }
    }

    /// Overall success: every notebook passed.
    pub fn passed(&self) -> bool {
        self.results.iter().all(TestResult::passed)
    }

    pub fn failures(&self) -> Vec<&TestResult> {
        self.results.iter().filter(|r| r.is_failure()).collect()
    }
}

mod duration_secs {
    use serde::Serializer;
    use std::time::Duration;

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(duration.as_secs_f64())
    }
}
