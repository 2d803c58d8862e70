// Shared test helpers for integration tests
#![allow(dead_code)]

use async_trait::async_trait;
use moodle_perf_runner::core::env::EnvRegistry;
use moodle_perf_runner::core::error::Result;
use moodle_perf_runner::core::job::JobType;
use moodle_perf_runner::core::modules::ModuleRegistry;
use moodle_perf_runner::infra::command::{CommandExecutor, CommandOutput, CommandSpec};
use moodle_perf_runner::performance::PerformanceJob;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tempfile::{tempdir, TempDir};

/// Records every command instead of running it. Responses are matched by
/// substring against the rendered command line; unmatched commands succeed
/// with empty output.
#[derive(Default)]
pub struct RecordingExecutor {
    calls: Mutex<Vec<CommandSpec>>,
    responses: Vec<(String, CommandOutput)>,
    fake_downloads: bool,
}

impl RecordingExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scripts the output for commands whose line contains `needle`.
    pub fn respond(mut self, needle: &str, status: i32, stdout: &str) -> Self {
        self.responses.push((
            needle.to_string(),
            CommandOutput {
                status: Some(status),
                stdout: stdout.to_string(),
                stderr: String::new(),
            },
        ));
        self
    }

    /// Makes `curl -o <dest>` calls create an empty file at `<dest>`.
    pub fn with_fake_downloads(mut self) -> Self {
        self.fake_downloads = true;
        self
    }

    pub fn calls(&self) -> Vec<CommandSpec> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_to(&self, program: &str) -> Vec<CommandSpec> {
        self.calls()
            .into_iter()
            .filter(|spec| spec.program == program)
            .collect()
    }
}

#[async_trait]
impl CommandExecutor for RecordingExecutor {
    async fn execute(&self, spec: &CommandSpec) -> Result<CommandOutput> {
        self.calls.lock().unwrap().push(spec.clone());

        if self.fake_downloads && spec.program == "curl" {
            if let Some(pos) = spec.args.iter().position(|a| a == "-o") {
                let dest = PathBuf::from(&spec.args[pos + 1]);
                fs::write(dest, "").unwrap();
            }
        }

        let line = spec.display_line();
        let output = self
            .responses
            .iter()
            .find(|(needle, _)| line.contains(needle.as_str()))
            .map(|(_, output)| output.clone())
            .unwrap_or(CommandOutput {
                status: Some(0),
                stdout: String::new(),
                stderr: String::new(),
            });
        Ok(output)
    }
}

/// A workspace with a shared directory, cleaned up on drop.
pub struct Workspace {
    pub dir: TempDir,
}

impl Workspace {
    pub fn new() -> Self {
        let dir = tempdir().expect("Failed to create temporary directory");
        fs::create_dir_all(dir.path().join("shared")).unwrap();
        Self { dir }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn shared(&self) -> PathBuf {
        self.dir.path().join("shared")
    }

    /// Places a test plan and users file where a previous setup would have left them.
    pub fn with_plan_files(self) -> Self {
        let plan_dir = self.shared().join("planfiles");
        fs::create_dir_all(&plan_dir).unwrap();
        fs::write(plan_dir.join("testplan_1.jmx"), "<jmeterTestPlan/>").unwrap();
        fs::write(plan_dir.join("users_1.csv"), "admin,adminpass\n").unwrap();
        self
    }
}

/// An env registry as the host would build it for the performance job,
/// with the minimal values a normal run needs.
pub fn performance_env(ws: &Workspace) -> EnvRegistry {
    let mut env = EnvRegistry::new();
    let job = PerformanceJob::new();
    ModuleRegistry::with_builtin().load(job.module_dependencies().iter().copied(), &mut env);
    env.set("UUID", "run-1");
    env.set("WORKSPACE", ws.root().display().to_string());
    env.set("SHAREDDIR", ws.shared().display().to_string());
    env.set("ENVIROPATH", ws.root().join("environment").display().to_string());
    env.set("WEBSERVER", "web1");
    env.set("JMETER", "jmeter");
    env.set("MOODLE_BRANCH", "main");
    env
}

/// Test plan generator output carrying two download links.
pub const PLAN_OUTPUT: &str = "\
Test plan generated.
Test plan: http://web1/pluginfile.php/1/tool_generator/testplan/0/testplan_202401011200_1234.jmx
Users file: http://web1/pluginfile.php/1/tool_generator/users/0/users_202401011200_5678.csv
";
