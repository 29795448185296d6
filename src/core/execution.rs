//! # Test Execution Module / 测试执行模块
//!
//! The seam between the test engine and the interactive kernel. A
//! [`SessionFactory`] hands out one [`ExecutorSession`] per notebook; the session
//! runs cell sources in order and keeps interactive state between them.
//! [`test_notebook`] drives the full lifecycle of one notebook: acquire, run,
//! release.
//!
//! 测试引擎与交互式内核之间的接口。[`SessionFactory`] 为每个笔记本提供一个
//! [`ExecutorSession`]；会话按顺序运行单元源码，并在单元之间保持交互状态。
//! [`test_notebook`] 负责单个笔记本的完整生命周期：获取、运行、释放。

use async_trait::async_trait;
use colored::*;
use std::time::Instant;
use tracing::{debug, warn};

use crate::{
    core::{
        config::TestConfig,
        error::SessionError,
        models::TestResult,
        notebook::Notebook,
        output::Output,
    },
    infra::t,
};

/// The result of running one cell's source in a session.
/// 在会话中运行一个单元源码的结果。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Execution {
    /// Output records in the order the kernel produced them.
    pub outputs: Vec<Output>,
    /// Whether the kernel reported an error for this execution.
    pub errored: bool,
}

impl Execution {
    pub fn ok(outputs: Vec<Output>) -> Self {
        Self {
            outputs,
            errored: false,
        }
    }

    pub fn errored(outputs: Vec<Output>) -> Self {
        Self {
            outputs,
            errored: true,
        }
    }

    /// The traceback of the last `error` record, joined for display.
    pub fn error_report(&self) -> Option<String> {
        self.outputs.iter().rev().find_map(Output::traceback_report)
    }
}

/// A live kernel client bound to one notebook run.
///
/// Implementations must tolerate being dropped without `shutdown` and release
/// their resources in that case too.
#[async_trait]
pub trait ExecutorSession: Send {
    /// Runs `source` and returns the produced outputs.
    async fn execute(&mut self, source: &str) -> Result<Execution, SessionError>;

    /// Releases the session. Called once on the normal exit path.
    async fn shutdown(&mut self) -> Result<(), SessionError>;
}

/// Creates sessions. Shared read-only by every worker.
#[async_trait]
pub trait SessionFactory: Send + Sync {
    /// Starts a session for `notebook`, seeded with `seed`.
    async fn acquire(
        &self,
        notebook: &Notebook,
        seed: i64,
    ) -> Result<Box<dyn ExecutorSession>, SessionError>;
}

/// Tests a single notebook in its own session.
///
/// The session is created before the first cell and released afterwards on every
/// path: explicitly through `shutdown` here, or through the session's `Drop` if
/// this future is dropped or a cell panics.
///
/// 在独立会话中测试单个笔记本。会话在第一个单元之前创建，并在所有路径上释放。
///
/// # Arguments
/// * `notebook` - The notebook to test
/// * `config` - The immutable run configuration
/// * `factory` - Where to get the session from
///
/// # Returns
/// A `TestResult` for the notebook. Session failures become a failed result,
/// never an error.
pub async fn test_notebook<F>(notebook: &Notebook, config: &TestConfig, factory: &F) -> TestResult
where
    F: SessionFactory + ?Sized,
{
    let path = notebook.path();
    let start_time = Instant::now();
    println!(
        "{}",
        t!("run.testing_notebook", path = path.display()).blue()
    );

    let mut session = match factory.acquire(notebook, config.seed).await {
        Ok(session) => session,
        Err(e) => {
            let message = e.to_string();
            println!(
                "{}",
                t!("run.session_failed", path = path.display(), error = &message).red()
            );
            return TestResult::session_failure(
                path,
                notebook.cells().len(),
                message,
                start_time.elapsed(),
            );
        }
    };
    debug!(notebook = %path.display(), seed = config.seed, "session acquired");

    let report = notebook.run(session.as_mut(), config).await;

    if let Err(e) = session.shutdown().await {
        warn!(notebook = %path.display(), error = %e, "session shutdown failed");
    }
    drop(session);

    let duration = start_time.elapsed();
    let result = TestResult::from_report(path, report, duration);
    let secs = format!("{:.2}", duration.as_secs_f64());
    if result.passed() {
        println!(
            "{}",
            t!("run.notebook_passed", path = path.display(), duration = secs).green()
        );
    } else {
        println!(
            "{}",
            t!("run.notebook_failed", path = path.display(), duration = secs).red()
        );
    }
    result
}
