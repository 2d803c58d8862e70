//! # Job Types / 作业类型
//!
//! A job type is a named, pluggable unit of CI behavior with a fixed
//! lifecycle: `check → configure → setup → run → teardown`. Job types are
//! registered in a [`JobRegistry`] under their name and instantiated fresh
//! for every invocation.
//!
//! 作业类型是具有固定生命周期的、可插拔的 CI 行为单元。

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;

use crate::core::env::EnvRegistry;
use crate::core::error::{JobError, Result};
use crate::core::modules::ModuleRegistry;
use crate::infra::command::{CommandExecutor, CommandOutput, CommandSpec};

/// Mutable state threaded through every lifecycle phase.
pub struct JobContext {
    pub env: EnvRegistry,
    executor: Arc<dyn CommandExecutor>,
    /// Locale used for user-facing messages.
    pub locale: String,
}

impl JobContext {
    pub fn new(env: EnvRegistry, executor: Arc<dyn CommandExecutor>) -> Self {
        Self {
            env,
            executor,
            locale: "en".to_string(),
        }
    }

    pub fn with_locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = locale.into();
        self
    }

    /// Runs an external command through the configured executor.
    pub async fn execute(&self, spec: &CommandSpec) -> Result<CommandOutput> {
        self.executor.execute(spec).await
    }
}

/// What `setup` ended up doing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum SetupOutcome {
    /// The site was installed and test data generated.
    Provisioned {
        /// Artifacts downloaded into the shared directory.
        downloaded: Vec<PathBuf>,
    },
    /// A bisect run reuses an environment provisioned earlier.
    SkippedBisect,
}

/// What `teardown` ended up doing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum TeardownOutcome {
    /// Result artifacts were copied to persistent storage.
    Persisted { destination: PathBuf },
    /// There were no results to keep.
    NothingToPersist,
}

/// The lifecycle contract every job type implements.
#[async_trait]
pub trait JobType: Send + Sync {
    /// Registry key, e.g. `"performance"`.
    fn name(&self) -> &'static str;

    /// Env names persisted across process boundaries.
    fn env_exports(&self) -> &'static [&'static str];

    /// Env names this job type defines itself.
    fn own_env(&self) -> &'static [&'static str];

    /// Optional inputs read when present. Declared so the process
    /// environment can supply them.
    fn input_env(&self) -> &'static [&'static str] {
        &[]
    }

    /// Host modules to initialize, in initialization order.
    fn module_dependencies(&self) -> &'static [&'static str];

    /// Human readable status lines for the run summary. Never fails.
    fn summary_fields(&self, env: &EnvRegistry) -> Vec<String>;

    /// Validates modules and env names. Must not cause side effects.
    fn check(&self, modules: &ModuleRegistry, env: &EnvRegistry) -> Result<()>;

    /// Sets defaults and derived values before setup.
    fn configure(&mut self, ctx: &mut JobContext) -> Result<()>;

    async fn setup(&mut self, ctx: &mut JobContext) -> Result<SetupOutcome>;

    /// Executes the job and returns the exit code of the tool under test.
    async fn run(&mut self, ctx: &mut JobContext) -> Result<i32>;

    async fn teardown(&mut self, ctx: &mut JobContext) -> Result<TeardownOutcome>;
}

type JobFactory = fn() -> Box<dyn JobType>;

/// Job types available to the host, keyed by name.
pub struct JobRegistry {
    factories: BTreeMap<&'static str, JobFactory>,
}

impl Default for JobRegistry {
    fn default() -> Self {
        Self::with_builtin()
    }
}

impl JobRegistry {
    pub fn empty() -> Self {
        Self {
            factories: BTreeMap::new(),
        }
    }

    /// The registry with every job type shipped in this crate.
    pub fn with_builtin() -> Self {
        let mut registry = Self::empty();
        registry.register(
            crate::jobtypes::performance::NAME,
            crate::jobtypes::performance::create,
        );
        registry
    }

    pub fn register(&mut self, name: &'static str, factory: JobFactory) {
        self.factories.insert(name, factory);
    }

    /// Creates a fresh instance of the named job type.
    pub fn create(&self, name: &str) -> Result<Box<dyn JobType>> {
        self.factories
            .get(name)
            .map(|factory| factory())
            .ok_or_else(|| JobError::UnknownJobType(name.to_string()))
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.factories.keys().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_registry_contains_performance() {
        let registry = JobRegistry::with_builtin();
        assert_eq!(registry.names().collect::<Vec<_>>(), vec!["performance"]);

        let job = registry.create("performance").unwrap();
        assert_eq!(job.name(), "performance");
    }

    #[test]
    fn unknown_job_type_is_an_error() {
        let registry = JobRegistry::with_builtin();
        let err = registry.create("phpunit").err().unwrap();
        assert!(matches!(err, JobError::UnknownJobType(name) if name == "phpunit"));
    }
}
