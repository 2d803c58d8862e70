//! # Run Command Module / 运行命令模块
//!
//! This module implements the `run` command, which executes one job type
//! through its whole lifecycle and reports the outcome.
//!
//! 此模块实现了 `run` 命令，按完整生命周期执行一个作业类型并报告结果。

use anyhow::Result;
use colored::*;
use std::{
    path::{Path, PathBuf},
    process::ExitCode,
    sync::Arc,
};
use tokio::signal;
use tokio_util::sync::CancellationToken;

use crate::{
    core::{
        config::{self, JobConfig},
        lifecycle::{JobReport, JobRunner},
    },
    infra::{command::ProcessExecutor, t},
    jobtypes::performance,
    reporting::{generate_html_report, print_summary, write_env_file, write_json_report},
};

/// Arguments of the `run` command.
#[derive(Debug, Default)]
pub struct RunArgs {
    pub job: Option<String>,
    pub config: Option<PathBuf>,
    pub env_file: Option<PathBuf>,
    pub html: Option<PathBuf>,
    pub json: Option<PathBuf>,
    pub lang: Option<String>,
}

/// Executes the run command with the provided arguments.
///
/// # Returns
/// The job's exit code on completion. Precondition and construction failures
/// are returned as errors.
pub async fn execute(args: RunArgs) -> Result<ExitCode> {
    let job_config = match &args.config {
        Some(path) => config::load_job_config(path)?,
        None => JobConfig::default(),
    };

    let locale = args
        .lang
        .clone()
        .unwrap_or_else(|| crate::resolve_locale(&job_config.language));
    rust_i18n::set_locale(&locale);

    let job_name = args
        .job
        .clone()
        .or_else(|| job_config.job.clone())
        .unwrap_or_else(|| performance::NAME.to_string());

    if let Some(path) = &args.config {
        println!("{}", t!("loading_config", locale = &locale, path = path.display()));
    }
    println!("{}", t!("running_job", locale = &locale, name = job_name.yellow()));

    let stop_token = setup_signal_handler(&locale);
    let runner = JobRunner::new(Arc::new(ProcessExecutor)).with_cancellation(stop_token);

    let report = match runner.run(&job_name, &job_config.env, &locale).await {
        Ok(report) => report,
        Err(e) => {
            if e.is_precondition() {
                eprintln!("{}", t!("precondition_failed", locale = &locale).red().bold());
            }
            return Err(anyhow::Error::new(e).context(format!("Job '{job_name}' failed")));
        }
    };

    print_summary(&report, &locale);
    write_outputs(&report, &args, &locale)?;

    Ok(exit_code_of(&report))
}

fn write_outputs(report: &JobReport, args: &RunArgs, locale: &str) -> Result<()> {
    if let Some(path) = &args.env_file {
        write_env_file(path, &report.exports)?;
        println!("{}", t!("env_file_written", locale = locale, path = path.display()));
    }

    if let Some(path) = &args.html {
        match write_html_report(report, path, locale) {
            Ok(message) => println!("{message}"),
            Err(e) => eprintln!("{} {:#}", t!("html_report_failed", locale = locale).red(), e),
        }
    }

    if let Some(path) = &args.json {
        write_json_report(report, path)?;
        println!("{}", t!("json_report_written", locale = locale, path = path.display()));
    }
    Ok(())
}

/// Writes the HTML report. The confirmation line is only produced once the
/// file exists.
fn write_html_report(report: &JobReport, path: &Path, locale: &str) -> Result<String> {
    generate_html_report(report, path, locale)?;
    Ok(t!("html_report_written", locale = locale, path = path.display()).to_string())
}

/// Maps the tool's exit code onto a process exit code.
fn exit_code_of(report: &JobReport) -> ExitCode {
    match report.exit_code {
        Some(0) => ExitCode::SUCCESS,
        Some(code) => ExitCode::from(u8::try_from(code).ok().filter(|c| *c != 0).unwrap_or(1)),
        None => ExitCode::FAILURE,
    }
}

/// Sets up a signal handler for graceful shutdown.
fn setup_signal_handler(locale: &str) -> CancellationToken {
    let token = CancellationToken::new();
    let token_clone = token.clone();
    let locale = locale.to_string();

    tokio::spawn(async move {
        if let Err(e) = signal::ctrl_c().await {
            tracing::warn!("failed to listen for Ctrl-C: {e}");
            return;
        }
        println!("\n{}", t!("shutdown_signal", locale = &locale).yellow());
        token_clone.cancel();
    });

    token
}
