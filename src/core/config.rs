//! # Configuration Module / 配置模块
//!
//! Two layers: an optional TOML file ([`RunnerConfig`]) and the command line.
//! They are merged once into an immutable [`TestConfig`] that is shared by every
//! worker for the lifetime of the run.
//!
//! 两层配置：可选的 TOML 文件（[`RunnerConfig`]）和命令行。
//! 二者只合并一次，生成不可变的 [`TestConfig`]，在整个运行期间由所有工作者共享。

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::infra::t;

/// Settings for starting kernel sessions.
/// 启动内核会话的设置。
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct KernelConfig {
    /// Kernel spec to start instead of the one named in each notebook.
    /// 用于替代每个笔记本中指定内核的内核规格。
    pub name: Option<String>,
    /// Interpreter used to run the bundled kernel bridge.
    /// 用于运行内置内核桥接脚本的解释器。
    pub python: String,
    /// A custom bridge command. `~` and environment variables are expanded.
    /// 自定义桥接命令。会展开 `~` 和环境变量。
    pub command: Option<String>,
    /// How long a kernel may take to become ready.
    /// 内核就绪所允许的最长时间。
    pub startup_timeout_secs: u64,
}

impl Default for KernelConfig {
    fn default() -> Self {
        Self {
            name: None,
            python: "python3".to_string(),
            command: None,
            startup_timeout_secs: 60,
        }
    }
}

impl KernelConfig {
    pub fn startup_timeout(&self) -> Duration {
        Duration::from_secs(self.startup_timeout_secs)
    }
}

/// The optional configuration file, loaded from TOML.
/// 可选的配置文件，从 TOML 加载。
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RunnerConfig {
    /// The language for the runner's output messages (e.g., "en", "zh-CN").
    /// Unset means the system locale, unless `--lang` is given.
    /// 运行器输出消息的语言（例如 "en", "zh-CN"）。未设置时使用系统语言。
    pub language: Option<String>,
    pub num_threads: Option<usize>,
    pub match_output: bool,
    pub verbose: bool,
    /// Per-cell execution timeout in seconds.
    /// 每个单元的执行超时时间（秒）。
    pub timeout_secs: Option<u64>,
    pub kernel: KernelConfig,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            language: None,
            num_threads: None,
            match_output: false,
            verbose: false,
            timeout_secs: None,
            kernel: KernelConfig::default(),
        }
    }
}

impl RunnerConfig {
    /// Reads a configuration file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| t!("config.read_failed", path = path.display()))?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).with_context(|| t!("config.parse_failed"))
    }

    /// The message locale for the run: `--lang`, then this file, then the
    /// system locale.
    pub fn resolve_language(&self, explicit: Option<&str>, system: &str) -> String {
        explicit
            .or(self.language.as_deref())
            .unwrap_or(system)
            .to_string()
    }
}

/// Command-line values that override the configuration file.
/// 覆盖配置文件的命令行参数值。
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub num_threads: Option<usize>,
    pub seed: Option<i64>,
    pub verbose: bool,
    pub match_output: bool,
    pub timeout_secs: Option<u64>,
    pub kernel: Option<String>,
}

/// The immutable configuration of one test run.
///
/// 一次测试运行的不可变配置。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestConfig {
    /// Passed unchanged to every session so runs can be reproduced.
    pub seed: i64,
    /// Number of workers; always at least 1.
    pub num_threads: usize,
    pub verbose: bool,
    pub match_output: bool,
    /// Upper bound on a single cell's execution, if any.
    pub cell_timeout: Option<Duration>,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            num_threads: 1,
            verbose: false,
            match_output: false,
            cell_timeout: None,
        }
    }
}

impl TestConfig {
    /// Merges the file layer and the command line. `default_seed` is used when no
    /// seed was given; the caller computes it once, at the edge of the program.
    pub fn resolve(file: &RunnerConfig, overrides: &Overrides, default_seed: i64) -> Result<Self> {
        let num_threads = overrides.num_threads.or(file.num_threads).unwrap_or(1);
        if num_threads == 0 {
            bail!(t!("config.invalid_threads"));
        }

        let timeout_secs = overrides.timeout_secs.or(file.timeout_secs);
        if timeout_secs == Some(0) {
            bail!(t!("config.invalid_timeout"));
        }

        Ok(Self {
            seed: overrides.seed.unwrap_or(default_seed),
            num_threads,
            verbose: overrides.verbose || file.verbose,
            match_output: overrides.match_output || file.match_output,
            cell_timeout: timeout_secs.map(Duration::from_secs),
        })
    }
}
