//! # Error Types / 错误类型
//!
//! Structured errors for the two collaborator boundaries: loading notebook
//! documents and talking to a kernel session.
//!
//! 两个协作边界的结构化错误：加载笔记本文档和与内核会话通信。

use std::path::PathBuf;
use std::time::Duration;

/// A notebook document could not be loaded. Always fatal for the run.
/// 无法加载笔记本文档。对整个运行而言总是致命的。
#[derive(Debug, thiserror::Error)]
pub enum NotebookError {
    #[error("failed to read notebook {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("notebook {path} is not a valid notebook document: {source}")]
    Document {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("notebook {path}: cell #{index} is malformed: {source}")]
    Cell {
        path: PathBuf,
        index: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("notebook {path} uses nbformat {version}, only version 4 is supported")]
    UnsupportedFormat { path: PathBuf, version: u64 },

    #[error("notebook path {0} does not exist")]
    NotFound(PathBuf),
}

/// A kernel session failed outside of normal cell execution.
/// 内核会话在正常单元执行之外发生故障。
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("failed to start kernel bridge `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid kernel bridge command: {0}")]
    InvalidCommand(String),

    #[error("kernel did not become ready within {0:?}")]
    StartupTimeout(Duration),

    #[error("kernel bridge closed its output stream")]
    Closed,

    #[error("kernel bridge reported a failure: {0}")]
    Bridge(String),

    #[error("kernel bridge sent an unreadable message: {0}")]
    Protocol(#[from] serde_json::Error),

    #[error("I/O error while talking to the kernel bridge: {0}")]
    Io(#[from] std::io::Error),
}
