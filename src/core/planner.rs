//! # Test Execution Planner Module / 测试执行计划模块
//!
//! Splits the notebooks of a run across a fixed number of workers. The split is
//! static and deterministic: notebooks are sorted by path and dealt out
//! round-robin, so the same inputs always give the same assignment.
//!
//! 将一次运行中的笔记本分配给固定数量的工作者。分配是静态且确定的：
//! 笔记本按路径排序后轮流分配，因此相同的输入总是得到相同的分配。

use crate::core::notebook::Notebook;
use anyhow::{bail, Result};

/// Represents a complete execution plan for a set of notebooks.
/// 表示一组笔记本的完整执行计划。
#[derive(Debug)]
pub struct ExecutionPlan {
    /// One queue per worker. Every notebook appears in exactly one queue.
    /// 每个工作者一个队列。每个笔记本恰好出现在一个队列中。
    pub queues: Vec<Vec<Notebook>>,
}

impl ExecutionPlan {
    pub fn notebook_count(&self) -> usize {
        self.queues.iter().map(Vec::len).sum()
    }
}

/// Creates an execution plan for the given notebooks.
///
/// No more workers are planned than there are notebooks, and never fewer than
/// one.
///
/// # Arguments
/// * `notebooks` - The loaded notebooks of the run
/// * `num_threads` - The configured worker count (must be at least 1)
pub fn plan_execution(mut notebooks: Vec<Notebook>, num_threads: usize) -> Result<ExecutionPlan> {
    if num_threads == 0 {
        bail!("The number of threads must be at least 1.");
    }

    notebooks.sort_by(|a, b| a.path().cmp(b.path()));

    let workers = num_threads.min(notebooks.len()).max(1);
    let mut queues: Vec<Vec<Notebook>> = (0..workers).map(|_| Vec::new()).collect();
    for (i, notebook) in notebooks.into_iter().enumerate() {
        queues[i % workers].push(notebook);
    }

    Ok(ExecutionPlan { queues })
}
