//! # Console Reporting Module / 控制台报告模块
//!
//! Section markers for log folding on the CI side, and the colored summary
//! printed at the end of a job.
//!
//! 用于 CI 端日志折叠的分段标记，以及作业结束时打印的彩色摘要。

use chrono::{DateTime, Local};
use colored::*;
use std::io::{self, Write};

use crate::core::lifecycle::{JobReport, Phase};
use crate::infra::t;

/// Opening marker of a collapsible log region.
pub fn section_start_line(title: &str, at: DateTime<Local>) -> String {
    format!(
        ">>> startsection {} at {} <<<",
        title,
        at.format("%Y-%m-%d %H:%M:%S")
    )
}

/// Closing marker of a collapsible log region.
pub fn section_stop_line() -> &'static str {
    ">>> stopsection <<<"
}

/// An open log section. The stop marker is written when the guard drops, so
/// a cancelled phase still closes its section.
pub struct Section<W: Write = io::Stdout> {
    out: W,
}

impl Section {
    /// Prints the start marker to stdout.
    pub fn start(title: &str) -> Self {
        Self::start_in(io::stdout(), title)
    }
}

impl<W: Write> Section<W> {
    pub fn start_in(mut out: W, title: &str) -> Self {
        if let Err(e) = writeln!(out, "{}", section_start_line(title, Local::now())) {
            tracing::warn!("failed to write section marker: {e}");
        }
        Self { out }
    }
}

impl<W: Write> Drop for Section<W> {
    fn drop(&mut self) {
        if let Err(e) = writeln!(self.out, "{}", section_stop_line()) {
            tracing::warn!("failed to write section marker: {e}");
        }
    }
}

/// Prints the job summary: the job type's status lines, then one row per
/// phase with its duration.
///
/// ```text
/// --- Job Summary: performance ---
/// == Moodle branch (version.php): main
/// == SITESIZE: XS
///   - checked          |      0.00s
///   - run              |     41.27s
/// Exit code: 0
/// ```
pub fn print_summary(report: &JobReport, locale: &str) {
    println!(
        "\n{}",
        t!("summary.banner", locale = locale, job = &report.job).bold()
    );

    for line in &report.summary {
        println!("{line}");
    }

    for record in &report.phases {
        let name = match record.phase {
            Phase::SetupSkipped => record.phase.as_str().yellow(),
            _ => record.phase.as_str().cyan(),
        };
        println!(
            "  - {:<16} | {:>10}",
            name,
            format!("{:.2}s", record.duration.as_secs_f64())
        );
    }

    let exit_line = match report.exit_code {
        Some(0) => t!("summary.exit_code", locale = locale, code = 0).green(),
        Some(code) => t!("summary.exit_code", locale = locale, code = code).red(),
        None => t!("summary.no_exit_code", locale = locale).dimmed(),
    };
    println!("{exit_line}");
}
