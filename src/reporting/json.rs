//! Machine-readable report: the whole [`JobReport`] as pretty-printed JSON.

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

use crate::core::lifecycle::JobReport;

pub fn render_json_report(report: &JobReport) -> Result<String> {
    serde_json::to_string_pretty(report).context("Failed to serialize job report")
}

pub fn write_json_report(report: &JobReport, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }
    fs::write(path, render_json_report(report)?)
        .with_context(|| format!("Failed to write JSON report: {}", path.display()))
}
