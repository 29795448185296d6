//! # Notebook Runner Library / Notebook Runner 库
//!
//! This library provides the core functionality for the Notebook Runner tool,
//! a seedable, concurrent test runner for Jupyter notebooks. It executes every
//! cell of a notebook against a live kernel and can check that fresh outputs
//! still match the outputs recorded in the document.
//!
//! 此库为 Notebook Runner 工具提供核心功能，
//! 这是一个可设定种子的并发 Jupyter 笔记本测试运行器。它在实时内核中执行
//! 笔记本的每个单元，并可检查新输出是否仍与文档中记录的输出一致。
//!
//! ## Modules / 模块
//!
//! - `core` - Cell and output models, the output matcher and the test engine
//! - `infra` - Infrastructure services like kernel sessions and file discovery
//! - `reporting` - Test result reporting
//! - `cli` - Command-line interface and commands
//!
//! - `core` - 单元与输出模型、输出匹配器和测试引擎
//! - `infra` - 基础设施服务，如内核会话和文件发现
//! - `reporting` - 测试结果报告
//! - `cli` - 命令行接口和命令

pub mod cli;
pub mod core;
pub mod infra;
pub mod reporting;

// Re-export commonly used items
pub use crate::core::config;
pub use crate::core::matcher;
pub use crate::core::models;

/// Initializes the application's internationalization (i18n) based on the system locale.
///
/// This function detects the user's system locale and sets the appropriate
/// language for the application's user interface. It attempts to match the full
/// locale (e.g., "zh-CN"), then just the language code (e.g., "en"), and
/// finally falls back to the default language ("en").
///
/// Returns the locale that was selected.
pub fn init() -> String {
    // Detect system locale and set it for i18n.
    // Fallback to "en" if detection fails.
    let locale = sys_locale::get_locale().unwrap_or_else(|| "en".to_string());
    let available_locales = rust_i18n::available_locales!();

    // Try to match the full locale first (e.g., "zh-CN")
    // Then try to match the language part only (e.g., "en" from "en-US")
    // Finally, fall back to "en"
    let lang = if available_locales.contains(&locale.as_str()) {
        locale.as_str()
    } else {
        locale
            .split('-')
            .next()
            .filter(|lang_code| available_locales.contains(lang_code))
            .unwrap_or("en")
    };

    rust_i18n::set_locale(lang);
    lang.to_string()
}

// Initialize i18n
rust_i18n::i18n!("locales", fallback = "en");
