//! # Job Lifecycle / 作业生命周期
//!
//! The host side of a job invocation. [`JobRunner`] resolves a job type from
//! the [`JobRegistry`], builds its environment and walks it through
//! `check → configure → setup → run → teardown` exactly once. Nothing is
//! retried; the first error ends the invocation.
//!
//! 作业调用的主机端。[`JobRunner`] 从 [`JobRegistry`] 中解析作业类型，构建其环境，
//! 并按 `check → configure → setup → run → teardown` 的顺序执行一次。

use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Local};
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::core::env::EnvRegistry;
use crate::core::error::{JobError, Result};
use crate::core::job::{JobContext, JobRegistry, JobType, SetupOutcome, TeardownOutcome};
use crate::core::modules::ModuleRegistry;
use crate::infra::command::CommandExecutor;

/// States a job invocation moves through. There are no cycles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Phase {
    Init,
    Checked,
    Configured,
    SetupDone,
    SetupSkipped,
    Ran,
    TornDown,
}

impl Phase {
    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Init => "init",
            Phase::Checked => "checked",
            Phase::Configured => "configured",
            Phase::SetupDone => "setup",
            Phase::SetupSkipped => "setup-skipped",
            Phase::Ran => "run",
            Phase::TornDown => "teardown",
        }
    }
}

/// Time spent reaching a phase.
#[derive(Debug, Clone, Serialize)]
pub struct PhaseRecord {
    pub phase: Phase,
    pub duration: Duration,
}

/// Everything a finished invocation produced.
#[derive(Debug, Clone, Serialize)]
pub struct JobReport {
    pub job: String,
    pub started_at: DateTime<Local>,
    pub phases: Vec<PhaseRecord>,
    pub setup: Option<SetupOutcome>,
    pub teardown: Option<TeardownOutcome>,
    /// Exit code of the tool under test.
    pub exit_code: Option<i32>,
    pub summary: Vec<String>,
    /// Env values to persist, in declaration order.
    pub exports: Vec<(String, String)>,
}

impl JobReport {
    pub(crate) fn new(job: &str) -> Self {
        Self {
            job: job.to_string(),
            started_at: Local::now(),
            phases: Vec::new(),
            setup: None,
            teardown: None,
            exit_code: None,
            summary: Vec::new(),
            exports: Vec::new(),
        }
    }

    /// The last phase reached.
    pub fn state(&self) -> Phase {
        self.phases.last().map_or(Phase::Init, |record| record.phase)
    }

    pub fn total_duration(&self) -> Duration {
        self.phases.iter().map(|record| record.duration).sum()
    }

    /// `true` when the job ran to completion and the tool exited with 0.
    pub fn succeeded(&self) -> bool {
        self.state() == Phase::TornDown && self.exit_code == Some(0)
    }

    fn record(&mut self, phase: Phase, started: Instant) {
        tracing::debug!(phase = phase.as_str(), "phase reached");
        self.phases.push(PhaseRecord {
            phase,
            duration: started.elapsed(),
        });
    }
}

/// Drives job types through their lifecycle.
pub struct JobRunner {
    jobs: JobRegistry,
    modules: ModuleRegistry,
    executor: Arc<dyn CommandExecutor>,
    stop: CancellationToken,
    read_process_env: bool,
}

impl JobRunner {
    pub fn new(executor: Arc<dyn CommandExecutor>) -> Self {
        Self {
            jobs: JobRegistry::with_builtin(),
            modules: ModuleRegistry::with_builtin(),
            executor,
            stop: CancellationToken::new(),
            read_process_env: true,
        }
    }

    pub fn with_jobs(mut self, jobs: JobRegistry) -> Self {
        self.jobs = jobs;
        self
    }

    pub fn with_modules(mut self, modules: ModuleRegistry) -> Self {
        self.modules = modules;
        self
    }

    /// Cancelling `token` aborts the phase in flight.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.stop = token;
        self
    }

    /// Builds the environment from configuration values only.
    pub fn without_process_env(mut self) -> Self {
        self.read_process_env = false;
        self
    }

    pub fn jobs(&self) -> &JobRegistry {
        &self.jobs
    }

    pub fn modules(&self) -> &ModuleRegistry {
        &self.modules
    }

    /// Declares every name the job and its modules know about, then fills in
    /// values: configuration first, process environment on top.
    pub fn prepare_env(&self, job: &dyn JobType, values: &BTreeMap<String, String>) -> EnvRegistry {
        let mut env = EnvRegistry::new();
        self.modules
            .load(job.module_dependencies().iter().copied(), &mut env);
        env.declare_all(job.own_env().iter().copied());
        env.declare_all(job.input_env().iter().copied());
        env.declare_all(job.env_exports().iter().copied());
        env.apply(values.iter().map(|(k, v)| (k.as_str(), v.clone())));
        if self.read_process_env {
            env.overlay_process_env();
        }
        env
    }

    /// Runs the named job type once.
    ///
    /// Precondition failures surface before any command is executed. A
    /// non-zero exit from the tool under test is not an error; it is reported
    /// in [`JobReport::exit_code`].
    pub async fn run(
        &self,
        job_name: &str,
        values: &BTreeMap<String, String>,
        locale: &str,
    ) -> Result<JobReport> {
        let mut job = self.jobs.create(job_name)?;
        let mut report = JobReport::new(job.name());

        let started = Instant::now();
        let env = self.prepare_env(job.as_ref(), values);
        job.check(&self.modules, &env)?;
        report.record(Phase::Checked, started);

        let mut ctx = JobContext::new(env, Arc::clone(&self.executor)).with_locale(locale);

        let started = Instant::now();
        self.ensure_running()?;
        job.configure(&mut ctx)?;
        report.record(Phase::Configured, started);

        let started = Instant::now();
        let setup = self.guard(job.setup(&mut ctx)).await?;
        let phase = match setup {
            SetupOutcome::Provisioned { .. } => Phase::SetupDone,
            SetupOutcome::SkippedBisect => Phase::SetupSkipped,
        };
        report.setup = Some(setup);
        report.record(phase, started);

        let started = Instant::now();
        let exit_code = self.guard(job.run(&mut ctx)).await?;
        report.exit_code = Some(exit_code);
        report.record(Phase::Ran, started);

        let started = Instant::now();
        report.teardown = Some(job.teardown(&mut ctx).await?);
        report.record(Phase::TornDown, started);

        report.summary = job.summary_fields(&ctx.env);
        report.exports = ctx.env.export(
            job.env_exports()
                .iter()
                .chain(job.own_env().iter())
                .copied(),
        );
        Ok(report)
    }

    fn ensure_running(&self) -> Result<()> {
        if self.stop.is_cancelled() {
            Err(JobError::Cancelled)
        } else {
            Ok(())
        }
    }

    async fn guard<T>(&self, phase: impl Future<Output = Result<T>>) -> Result<T> {
        tokio::select! {
            biased;
            _ = self.stop.cancelled() => Err(JobError::Cancelled),
            result = phase => result,
        }
    }
}
