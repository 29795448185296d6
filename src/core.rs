//! # Core Module / 核心模块
//!
//! This module contains the core functionality of Notebook Runner:
//! the cell and output models, the output matcher, configuration, and the
//! concurrent test engine.
//!
//! 此模块包含 Notebook Runner 的核心功能：
//! 单元与输出模型、输出匹配器、配置以及并发测试引擎。

pub mod cell;
pub mod config;
pub mod error;
pub mod execution;
pub mod matcher;
pub mod models;
pub mod notebook;
pub mod orchestrator;
pub mod output;
pub mod planner;

// Re-exports
pub use cell::Cell;
pub use config::TestConfig;
pub use execution::{ExecutorSession, SessionFactory};
pub use matcher::matches;
pub use models::TestResult;
pub use notebook::Notebook;
pub use orchestrator::run_suite;
