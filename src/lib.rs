//! # Moodle Perf Runner Library / Moodle 性能测试运行器库
//!
//! This library provides the job runner behind the `moodle-perf-runner` CLI:
//! a host that resolves CI job types by name and walks them through
//! `check → configure → setup → run → teardown`, plus the `performance` job
//! type that installs a Moodle site, generates test data and runs JMeter.
//!
//! 此库为 `moodle-perf-runner` CLI 提供作业运行器：按名称解析 CI 作业类型并按生命周期执行，
//! 以及安装 Moodle 站点、生成测试数据并运行 JMeter 的 `performance` 作业类型。
//!
//! ## Modules / 模块
//!
//! - `core` - Env and module registries, the job type contract, the lifecycle driver
//! - `jobtypes` - Concrete job types
//! - `infra` - Command execution and file system helpers
//! - `reporting` - Section markers, summaries, HTML report, env file
//! - `cli` - Command-line interface and commands
//!
//! - `core` - 环境变量与模块注册表、作业类型契约、生命周期驱动器
//! - `jobtypes` - 具体作业类型
//! - `infra` - 命令执行与文件系统辅助函数
//! - `reporting` - 分段标记、摘要、HTML 报告、env 文件
//! - `cli` - 命令行接口和命令

pub mod cli;
pub mod core;
pub mod infra;
pub mod jobtypes;
pub mod reporting;

// Re-export commonly used items
pub use core::config;
pub use core::lifecycle;
pub use jobtypes::performance;

/// Initializes the application's internationalization (i18n) based on the system locale.
///
/// This function detects the user's system locale and sets the appropriate
/// language for the application's user interface. It attempts to match the full
/// locale (e.g., "zh-CN"), then just the language code (e.g., "en"), and
/// finally falls back to the default language ("en").
pub fn init() -> String {
    let locale = sys_locale::get_locale().unwrap_or_else(|| "en".to_string());
    let lang = resolve_locale(&locale);
    rust_i18n::set_locale(&lang);
    lang
}

/// Maps a requested locale onto one we ship translations for.
pub fn resolve_locale(requested: &str) -> String {
    let available_locales = rust_i18n::available_locales!();

    let is_available = |code: &str| available_locales.iter().any(|l| *l == code);

    if is_available(requested) {
        return requested.to_string();
    }
    requested
        .split('-')
        .next()
        .filter(|lang_code| is_available(lang_code))
        .unwrap_or("en")
        .to_string()
}

// Initialize i18n
rust_i18n::i18n!("locales", fallback = "en");
