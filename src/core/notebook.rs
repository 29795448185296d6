//! # Notebook Module / 笔记本模块
//!
//! Loading notebook documents from disk and running their cells, in source
//! order, against one session.
//!
//! 从磁盘加载笔记本文档，并按源顺序在同一会话中运行其单元。

use serde::Deserialize;
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::core::{
    cell::Cell,
    config::TestConfig,
    error::NotebookError,
    execution::ExecutorSession,
    models::{CellOutcome, CellReport, NotebookReport},
};

/// The top level of an nbformat document, before cells are validated.
#[derive(Debug, Deserialize)]
struct NotebookDocument {
    cells: Vec<Value>,
    #[serde(default)]
    metadata: Map<String, Value>,
    #[serde(default)]
    nbformat: Option<u64>,
}

/// A loaded notebook: its path and its cells in execution order.
/// 已加载的笔记本：路径及按执行顺序排列的单元。
#[derive(Debug, Clone)]
pub struct Notebook {
    path: PathBuf,
    cells: Vec<Cell>,
    metadata: Map<String, Value>,
}

impl Notebook {
    /// Reads and validates the notebook at `path`.
    ///
    /// # Errors
    /// Any missing required field or unknown cell kind is an error; the caller is
    /// expected to abort the run.
    pub fn load(path: &Path) -> Result<Self, NotebookError> {
        let contents = fs::read_to_string(path).map_err(|source| NotebookError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(path, &contents)
    }

    /// Validates a notebook document held in memory. `path` is used for identity
    /// and error messages only.
    pub fn parse(path: impl Into<PathBuf>, contents: &str) -> Result<Self, NotebookError> {
        let path = path.into();
        let document: NotebookDocument =
            serde_json::from_str(contents).map_err(|source| NotebookError::Document {
                path: path.clone(),
                source,
            })?;

        if let Some(version) = document.nbformat {
            if version != 4 {
                return Err(NotebookError::UnsupportedFormat { path, version });
            }
        }

        let cells = document
            .cells
            .into_iter()
            .enumerate()
            .map(|(index, value)| {
                Cell::from_value(value).map_err(|source| NotebookError::Cell {
                    path: path.clone(),
                    index,
                    source,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            path,
            cells,
            metadata: document.metadata,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// The kernel spec named in the notebook metadata, e.g. `python3`.
    pub fn kernel_name(&self) -> Option<&str> {
        self.metadata
            .get("kernelspec")
            .and_then(|spec| spec.get("name"))
            .and_then(Value::as_str)
    }

    /// The kernel language named in the notebook metadata, e.g. `python`.
    pub fn language(&self) -> Option<&str> {
        self.metadata
            .get("language_info")
            .and_then(|info| info.get("name"))
            .and_then(Value::as_str)
            .or_else(|| {
                self.metadata
                    .get("kernelspec")
                    .and_then(|spec| spec.get("language"))
                    .and_then(Value::as_str)
            })
    }

    /// Returns whether every cell passed.
    ///
    /// 返回是否所有单元都通过。
    pub async fn test(
        &self,
        executor: &mut dyn ExecutorSession,
        verbose: bool,
        match_output: bool,
    ) -> bool {
        let config = TestConfig {
            verbose,
            match_output,
            ..TestConfig::default()
        };
        self.run(executor, &config).await.passed()
    }

    /// Runs every cell in source order and records each outcome.
    ///
    /// A failing cell does not stop the run. A timed-out cell or a broken session
    /// does, since the kernel state is unknown afterwards; the remaining cells
    /// are recorded as `NotRun`.
    ///
    /// 按源顺序运行每个单元并记录结果。失败的单元不会停止运行；
    /// 超时或会话中断会停止运行，其余单元记为 `NotRun`。
    pub async fn run(&self, executor: &mut dyn ExecutorSession, config: &TestConfig) -> NotebookReport {
        let mut report = NotebookReport {
            cells: Vec::with_capacity(self.cells.len()),
        };
        let mut poisoned = false;

        for (index, cell) in self.cells.iter().enumerate() {
            let outcome = if poisoned {
                CellOutcome::NotRun
            } else {
                let check = cell.check(executor, config.verbose, config.match_output);
                match config.cell_timeout {
                    Some(limit) if cell.is_executable() => {
                        tokio::time::timeout(limit, check).await.unwrap_or_else(|_| {
                            warn!(
                                notebook = %self.path.display(),
                                cell = index,
                                source = cell.source(),
                                ?limit,
                                "cell timed out"
                            );
                            CellOutcome::TimedOut { limit }
                        })
                    }
                    _ => check.await,
                }
            };

            debug!(
                notebook = %self.path.display(),
                cell = index,
                outcome = ?outcome,
                "cell finished"
            );
            poisoned |= outcome.poisons_session();
            report.cells.push(CellReport {
                index,
                cell_id: cell.cell_id().map(str::to_string),
                outcome,
            });
        }

        report
    }
}

/// Loads every notebook, stopping at the first malformed one.
///
/// Nothing is executed until every document has been validated.
///
/// 加载所有笔记本，遇到第一个格式错误的笔记本即停止。
pub fn load_notebooks(paths: &[PathBuf]) -> Result<Vec<Notebook>, NotebookError> {
    paths.iter().map(|path| Notebook::load(path)).collect()
}
