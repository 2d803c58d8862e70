//! # Reporting Module / 报告模块
//!
//! Console section markers and summaries, the HTML and JSON reports, and the
//! env file that carries exported variables to later processes.
//!
//! 控制台分段标记和摘要、HTML 与 JSON 报告，以及将导出变量传递给后续进程的 env 文件。

pub mod console;
pub mod envfile;
pub mod html;
pub mod json;

// Re-export common reporting functions
pub use console::{print_summary, Section};
pub use envfile::write_env_file;
pub use html::generate_html_report;
pub use json::write_json_report;
