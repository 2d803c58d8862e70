//! # HTML Reporting Module / HTML 报告模块
//!
//! Renders a [`JobReport`] as a standalone HTML page.
//!
//! 将 [`JobReport`] 渲染为独立的 HTML 页面。

use anyhow::{Context, Result};
use maud::{html, Markup, PreEscaped, DOCTYPE};
use std::fs;
use std::path::Path;

use crate::core::job::{SetupOutcome, TeardownOutcome};
use crate::core::lifecycle::JobReport;
use crate::infra::t;

/// Embedded CSS styles for HTML reports / HTML 报告的嵌入式 CSS 样式
const HTML_STYLE: &str = include_str!("assets/report.css");

/// Builds the report markup.
pub fn render_html_report(report: &JobReport, locale: &str) -> Markup {
    let status_class = if report.succeeded() {
        "status-Passed"
    } else {
        "status-Failed"
    };

    html! {
        (DOCTYPE)
        html {
            head {
                meta charset="utf-8";
                title { (t!("html_report.title", locale = locale, job = &report.job)) }
                style { (PreEscaped(HTML_STYLE)) }
            }
            body {
                h1 { (t!("html_report.title", locale = locale, job = &report.job)) }
                div class="summary-container" {
                    div class="summary-item" {
                        span class={ "count " (status_class) } {
                            (report.exit_code.map_or_else(|| "N/A".to_string(), |c| c.to_string()))
                        }
                        span class="label" { (t!("html_report.exit_code", locale = locale)) }
                    }
                    div class="summary-item" {
                        span class="count" { (format!("{:.2}s", report.total_duration().as_secs_f64())) }
                        span class="label" { (t!("html_report.duration", locale = locale)) }
                    }
                    div class="summary-item" {
                        span class="count" { (report.started_at.format("%Y-%m-%d %H:%M:%S").to_string()) }
                        span class="label" { (t!("html_report.started", locale = locale)) }
                    }
                }

                h2 { (t!("html_report.environment", locale = locale)) }
                ul class="summary-lines" {
                    @for line in &report.summary {
                        li { (line) }
                    }
                }

                h2 { (t!("html_report.phases", locale = locale)) }
                table {
                    thead {
                        tr {
                            th { (t!("html_report.table.phase", locale = locale)) }
                            th class="duration-cell" { (t!("html_report.table.duration", locale = locale)) }
                        }
                    }
                    tbody {
                        @for record in &report.phases {
                            tr {
                                td { (record.phase.as_str()) }
                                td class="duration-cell" { (format!("{:.2}s", record.duration.as_secs_f64())) }
                            }
                        }
                    }
                }

                @if let Some(SetupOutcome::Provisioned { downloaded }) = &report.setup {
                    h2 { (t!("html_report.artifacts", locale = locale)) }
                    ul {
                        @for path in downloaded {
                            li { code { (path.display().to_string()) } }
                        }
                    }
                }

                @if let Some(TeardownOutcome::Persisted { destination }) = &report.teardown {
                    p class="persisted" {
                        (t!("html_report.persisted", locale = locale, path = destination.display()))
                    }
                }
            }
        }
    }
}

/// Writes the HTML report for `report` to `output_path`.
pub fn generate_html_report(report: &JobReport, output_path: &Path, locale: &str) -> Result<()> {
    let markup = render_html_report(report, locale);
    fs::write(output_path, markup.into_string())
        .with_context(|| format!("Failed to write HTML report: {}", output_path.display()))
}
