//! # Test Orchestrator Module / 测试编排模块
//!
//! Runs a whole suite: validate every notebook, deal them out to a fixed pool of
//! workers, let each worker test its queue one notebook at a time, then join the
//! workers and combine their results.
//!
//! 运行整个测试套件：校验所有笔记本，将其分配给固定数量的工作者，
//! 每个工作者依次测试其队列中的笔记本，最后等待所有工作者完成并合并结果。

use anyhow::{Context, Result};
use futures::future::join_all;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};

use crate::core::{
    config::TestConfig,
    execution::{test_notebook, SessionFactory},
    models::{RunSummary, TestResult},
    notebook::{load_notebooks, Notebook},
    planner::plan_execution,
};

/// Loads the notebooks at `paths` and tests them.
///
/// A malformed notebook fails the whole call before any session is acquired.
///
/// 加载 `paths` 处的笔记本并进行测试。任何格式错误的笔记本都会在获取会话之前
/// 使整个调用失败。
pub async fn run_suite<F>(
    paths: &[PathBuf],
    config: Arc<TestConfig>,
    factory: Arc<F>,
) -> Result<RunSummary>
where
    F: SessionFactory + 'static,
{
    let notebooks = load_notebooks(paths)?;
    run_notebooks(notebooks, config, factory).await
}

/// Tests already loaded notebooks on `config.num_threads` workers.
///
/// Each worker owns its results; nothing is shared between workers except the
/// read-only configuration and factory.
pub async fn run_notebooks<F>(
    notebooks: Vec<Notebook>,
    config: Arc<TestConfig>,
    factory: Arc<F>,
) -> Result<RunSummary>
where
    F: SessionFactory + 'static,
{
    let plan = plan_execution(notebooks, config.num_threads)?;
    info!(
        notebooks = plan.notebook_count(),
        workers = plan.queues.len(),
        seed = config.seed,
        "starting test run"
    );

    let handles = plan.queues.into_iter().enumerate().map(|(worker, queue)| {
        let config = Arc::clone(&config);
        let factory = Arc::clone(&factory);
        tokio::spawn(async move {
            debug!(worker, notebooks = queue.len(), "worker started");
            let mut results: Vec<TestResult> = Vec::with_capacity(queue.len());
            for notebook in &queue {
                results.push(test_notebook(notebook, &config, factory.as_ref()).await);
            }
            debug!(worker, "worker finished");
            results
        })
    });

    let mut results = Vec::new();
    for joined in join_all(handles).await {
        results.extend(joined.context("A test worker panicked")?);
    }

    Ok(RunSummary::new(results))
}
