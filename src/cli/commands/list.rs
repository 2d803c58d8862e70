//! # List Command Module / 列表命令模块
//!
//! Prints every registered job type with the modules it depends on and the
//! variables it exports.
//!
//! 打印所有已注册的作业类型及其依赖的模块和导出的变量。

use colored::*;

use crate::core::job::JobRegistry;
use crate::infra::t;

/// Renders the job type listing as plain lines.
pub fn render_listing(registry: &JobRegistry, locale: &str) -> Vec<String> {
    let mut lines = Vec::new();
    for name in registry.names() {
        let Ok(job) = registry.create(name) else {
            continue;
        };
        lines.push(name.to_string());
        lines.push(format!(
            "  {}: {}",
            t!("list.modules", locale = locale),
            job.module_dependencies().join(", ")
        ));
        lines.push(format!(
            "  {}: {}",
            t!("list.exports", locale = locale),
            job.env_exports().join(", ")
        ));
    }
    lines
}

pub fn execute(locale: &str) {
    println!("{}", t!("list.banner", locale = locale).bold());
    for line in render_listing(&JobRegistry::with_builtin(), locale) {
        if line.starts_with(' ') {
            println!("{}", line.dimmed());
        } else {
            println!("{}", line.cyan());
        }
    }
}
