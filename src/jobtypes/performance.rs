//! # Performance Job / 性能测试作业
//!
//! Installs a Moodle site inside the web server container, generates a
//! fixed-size dataset and a JMeter test plan with `tool_generator`, then runs
//! JMeter from its own container against the site.
//!
//! Bisect runs (either `GOOD_COMMIT` or `BAD_COMMIT` set) reuse a site that
//! was provisioned earlier, so `setup` does nothing for them.
//!
//! 在 Web 服务器容器中安装 Moodle 站点，使用 `tool_generator` 生成固定大小的数据集和
//! JMeter 测试计划，然后从 JMeter 容器对站点运行测试。

pub mod settings;

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use colored::*;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::core::env::EnvRegistry;
use crate::core::error::{JobError, Result};
use crate::core::job::{JobContext, JobType, SetupOutcome, TeardownOutcome};
use crate::core::modules::ModuleRegistry;
use crate::infra::command::{docker_exec, CommandOutput, CommandSpec};
use crate::infra::{fs, t};
use crate::reporting::console::Section;

pub use settings::{LoadProfile, PerformanceSettings, SiteSize};

/// Registry key of this job type.
pub const NAME: &str = "performance";

/// Course the test plan is generated for. `maketestsite.php` creates it.
pub const COURSE_NAME: &str = "testcourse_3";

/// OS user the PHP CLI scripts run as inside the web server container.
const WEB_USER: &str = "www-data";

const ENV_EXPORTS: &[&str] = &[
    "DBTYPE",
    "DBTAG",
    "DBHOST",
    "DBNAME",
    "DBUSER",
    "DBPASS",
    "DBCOLLATION",
    "DBREPLICAS",
    "DBHOST_DBREPLICA",
    "WEBSERVER",
    "MOODLE_WWWROOT",
];

const OWN_ENV: &[&str] = &["RUNCOUNT", "EXITCODE"];

const INPUT_ENV: &[&str] = &[
    "SITESIZE",
    "PERF_GROUP",
    "PERF_DESCRIPTION",
    "PERF_INCLUDE_LOGS",
    "PERF_JMETER_SHAREDDIR",
];

const MODULES: &[&str] = &[
    "env",
    "summary",
    "docker",
    "docker-logs",
    "git",
    "browser",
    "docker-database",
    "docker-php",
    "moodle-core-copy",
    "docker-healthy",
    "moodle-config",
    "plugins",
    "docker-jmeter",
];

const REQUIRED_ENV: &[&str] = &[
    "UUID",
    "WORKSPACE",
    "SHAREDDIR",
    "ENVIROPATH",
    "WEBSERVER",
    "GOOD_COMMIT",
    "BAD_COMMIT",
];

static URL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"https?://[^\s'"<>]+"#).expect("URL pattern is valid"));

/// Factory used by the job registry.
pub fn create() -> Box<dyn JobType> {
    Box::new(PerformanceJob::new())
}

/// Test plan and users file a run is driven by.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanFiles {
    pub plan: PathBuf,
    pub users: PathBuf,
}

impl PlanFiles {
    /// Picks the `*.jmx` and `*.csv` out of the files setup downloaded.
    pub fn from_downloads(downloaded: &[PathBuf]) -> Option<Self> {
        let pick = |extension: &str| downloaded.iter().find(|p| fs::has_extension(p, extension)).cloned();
        Some(Self {
            plan: pick("jmx")?,
            users: pick("csv")?,
        })
    }

    /// The newest test plan and users file in `dir`, left there by an
    /// earlier provisioning.
    pub fn newest_in(dir: &Path) -> Result<Self> {
        let plan = fs::find_newest_with_extension(dir, "jmx")?.ok_or_else(|| {
            JobError::CommandConstruction(format!("no test plan (*.jmx) in {}", dir.display()))
        })?;
        let users = fs::find_newest_with_extension(dir, "csv")?.ok_or_else(|| {
            JobError::CommandConstruction(format!("no users file (*.csv) in {}", dir.display()))
        })?;
        Ok(Self { plan, users })
    }
}

/// Where `run` takes its plan files from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
enum PlanSource {
    /// No provisioning in this invocation; reuse what the shared dir holds.
    #[default]
    SharedDir,
    /// Setup provisioned the site; `None` when the generator output named
    /// no plan or users file.
    Provisioned(Option<PlanFiles>),
}

/// The performance job type. Holds the typed settings once `configure` ran.
#[derive(Debug, Default)]
pub struct PerformanceJob {
    settings: Option<PerformanceSettings>,
    plan_source: PlanSource,
}

impl PerformanceJob {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn settings(&self) -> Option<&PerformanceSettings> {
        self.settings.as_ref()
    }

    fn configured(&self, phase: &'static str) -> Result<&PerformanceSettings> {
        self.settings.as_ref().ok_or(JobError::PhaseOrder {
            phase,
            requires: "configure",
        })
    }

    fn plan_files(&self, settings: &PerformanceSettings) -> Result<PlanFiles> {
        match &self.plan_source {
            PlanSource::SharedDir => PlanFiles::newest_in(&settings.plan_dir()),
            PlanSource::Provisioned(Some(files)) => Ok(files.clone()),
            PlanSource::Provisioned(None) => Err(JobError::CommandConstruction(
                "test plan generator output named no *.jmx and *.csv pair".to_string(),
            )),
        }
    }

    async fn setup_normal(
        &self,
        settings: &PerformanceSettings,
        ctx: &JobContext,
    ) -> Result<Vec<PathBuf>> {
        let install = site_install_command(settings);
        println!("{} {}", t!("perf.running", locale = &ctx.locale).blue(), install);
        log_status(&ctx.execute(&install).await?, "site install");

        let dataset = make_test_site_command(settings);
        println!("{} {}", t!("perf.running", locale = &ctx.locale).blue(), dataset);
        log_status(&ctx.execute(&dataset).await?, "test site generator");

        let plan = make_test_plan_command(settings);
        println!("{} {}", t!("perf.running", locale = &ctx.locale).blue(), plan);
        let plan_output = ctx.execute(&plan).await?;
        log_status(&plan_output, "test plan generator");

        let plan_dir = settings.plan_dir();
        fs::ensure_dir(&plan_dir)?;

        let mut downloaded = Vec::new();
        for url in extract_urls(&plan_output.stdout) {
            let Some(name) = fs::url_basename(url) else {
                tracing::warn!(url, "skipping URL without a file name");
                continue;
            };
            let destination = plan_dir.join(name);
            println!(
                "{}",
                t!("perf.downloading", locale = &ctx.locale, url = url, path = destination.display())
            );
            log_status(&ctx.execute(&download_command(url, &destination)).await?, "download");
            downloaded.push(destination);
        }
        Ok(downloaded)
    }
}

#[async_trait]
impl JobType for PerformanceJob {
    fn name(&self) -> &'static str {
        NAME
    }

    fn env_exports(&self) -> &'static [&'static str] {
        ENV_EXPORTS
    }

    fn own_env(&self) -> &'static [&'static str] {
        OWN_ENV
    }

    fn input_env(&self) -> &'static [&'static str] {
        INPUT_ENV
    }

    fn module_dependencies(&self) -> &'static [&'static str] {
        MODULES
    }

    fn summary_fields(&self, env: &EnvRegistry) -> Vec<String> {
        vec![
            format!("== Moodle branch (version.php): {}", env.get_or_empty("MOODLE_BRANCH")),
            format!("== PHP version: {}", env.get_or_empty("PHP_VERSION")),
            format!("== DBTYPE: {}", env.get_or_empty("DBTYPE")),
            format!("== DBTAG: {}", env.get_or_empty("DBTAG")),
            format!("== DBREPLICAS: {}", env.get_or_empty("DBREPLICAS")),
            format!("== PLUGINSTOINSTALL: {}", env.get_or_empty("PLUGINSTOINSTALL")),
            format!("== SITESIZE: {}", env.get_or_empty("SITESIZE")),
        ]
    }

    fn check(&self, modules: &ModuleRegistry, env: &EnvRegistry) -> Result<()> {
        modules.verify_modules(MODULES.iter().copied())?;
        env.verify_env(REQUIRED_ENV.iter().copied())
    }

    fn configure(&mut self, ctx: &mut JobContext) -> Result<()> {
        let env = &mut ctx.env;
        env.set("EXITCODE", "0");
        if !env.is_set("RUNCOUNT") {
            env.set("RUNCOUNT", "1");
        }
        let wwwroot = format!("http://{}", env.get_or_empty("WEBSERVER"));
        env.set("MOODLE_WWWROOT", wwwroot);
        if !env.is_set("SITESIZE") {
            env.set("SITESIZE", "XS");
        }
        env.set("COURSENAME", COURSE_NAME);

        self.settings = Some(PerformanceSettings::resolve(env)?);
        Ok(())
    }

    async fn setup(&mut self, ctx: &mut JobContext) -> Result<SetupOutcome> {
        let settings = self.configured("setup")?.clone();
        if settings.is_bisect() {
            println!("{}", t!("perf.setup_skipped", locale = &ctx.locale).yellow());
            return Ok(SetupOutcome::SkippedBisect);
        }

        let downloaded = self.setup_normal(&settings, ctx).await?;
        self.plan_source = PlanSource::Provisioned(PlanFiles::from_downloads(&downloaded));
        Ok(SetupOutcome::Provisioned { downloaded })
    }

    async fn run(&mut self, ctx: &mut JobContext) -> Result<i32> {
        let settings = self.configured("run")?.clone();
        let files = self.plan_files(&settings)?;

        let section = Section::start("Starting performance run");
        let result = run_jmeter(&settings, &files, ctx).await;
        drop(section);

        let exit_code = result?;
        ctx.env.set("EXITCODE", exit_code.to_string());
        Ok(exit_code)
    }

    async fn teardown(&mut self, ctx: &mut JobContext) -> Result<TeardownOutcome> {
        let settings = self.configured("teardown")?;
        let source = settings.output_dir();
        if !source.is_dir() {
            return Ok(TeardownOutcome::NothingToPersist);
        }

        let destination = settings.results_dir();
        let copied = fs::copy_dir_all(&source, &destination)?;
        tracing::info!(bytes = copied, destination = %destination.display(), "results persisted");
        println!(
            "{}",
            t!("perf.persisted", locale = &ctx.locale, path = destination.display())
        );
        Ok(TeardownOutcome::Persisted { destination })
    }
}

/// Builds and executes the JMeter command, keeping its output in the shared
/// directory. Returns the JMeter exit code.
async fn run_jmeter(settings: &PerformanceSettings, files: &PlanFiles, ctx: &JobContext) -> Result<i32> {
    let command = jmeter_command(settings, files)?;
    println!("{} {}", t!("perf.running", locale = &ctx.locale).blue(), command);

    let output = ctx.execute(&command).await?;
    let exit_code = output.exit_code();

    let run_output = settings.run_output_file();
    if let Some(parent) = run_output.parent() {
        fs::ensure_dir(parent)?;
    }
    std::fs::write(&run_output, output.combined()).map_err(|e| JobError::io(&run_output, e))?;

    let message = t!(
        "perf.run_finished",
        locale = &ctx.locale,
        code = exit_code,
        path = run_output.display()
    );
    if exit_code == 0 {
        println!("{}", message.green());
    } else {
        println!("{}", message.red());
    }
    Ok(exit_code)
}

/// Every `http(s)://` URL in the test plan generator output, in order.
pub fn extract_urls(output: &str) -> Vec<&str> {
    URL_RE.find_iter(output).map(|m| m.as_str()).collect()
}

/// `install_database.php` run as the web user inside the web server.
pub fn site_install_command(settings: &PerformanceSettings) -> CommandSpec {
    docker_exec(
        &settings.webserver,
        Some(WEB_USER),
        true,
        [
            "php",
            "admin/cli/install_database.php",
            "--agree-license",
            "--fullname=Moodle Performance Test",
            "--shortname=moodle",
            "--adminuser=admin",
            "--adminpass=adminpass",
        ],
    )
}

/// `maketestsite.php` with a fixed dataset for the configured size.
pub fn make_test_site_command(settings: &PerformanceSettings) -> CommandSpec {
    docker_exec(
        &settings.webserver,
        Some(WEB_USER),
        true,
        [
            "php".to_string(),
            "admin/tool/generator/cli/maketestsite.php".to_string(),
            format!("--size={}", settings.site_size),
            "--fixeddataset".to_string(),
            "--bypasscheck".to_string(),
            "--filesizelimit=1000".to_string(),
            "--quiet=false".to_string(),
        ],
    )
}

/// `maketestplan.php`; its stdout lists the URLs of the generated files.
/// No TTY so the output is not mangled with carriage returns.
pub fn make_test_plan_command(settings: &PerformanceSettings) -> CommandSpec {
    docker_exec(
        &settings.webserver,
        Some(WEB_USER),
        false,
        [
            "php".to_string(),
            "admin/tool/generator/cli/maketestplan.php".to_string(),
            format!("--size={}", settings.site_size),
            format!("--shortname={}", settings.course_name),
            "--bypasscheck".to_string(),
        ],
    )
}

pub fn download_command(url: &str, destination: &Path) -> CommandSpec {
    CommandSpec::new("curl")
        .args(["-sS", "-L", "-o"])
        .arg(destination.display().to_string())
        .arg(url)
}

/// The JMeter invocation for the current run.
///
/// Fails when the JMeter container is unknown.
pub fn jmeter_command(settings: &PerformanceSettings, files: &PlanFiles) -> Result<CommandSpec> {
    if settings.jmeter.is_empty() {
        return Err(JobError::CommandConstruction(
            "JMETER container name is empty".to_string(),
        ));
    }

    let in_container = |path: &Path| -> Result<String> {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| JobError::CommandConstruction(format!("bad file name: {}", path.display())))?;
        Ok(settings.jmeter_path(&format!("planfiles/{name}")))
    };

    let log_dir = settings.output_dir().join("logs");
    fs::ensure_dir(&log_dir)?;

    let profile = settings.site_size.load_profile();
    let mut argv = vec![
        "jmeter".to_string(),
        "-n".to_string(),
        "-j".to_string(),
        settings.jmeter_path(&format!("output/logs/{}.jmeter.log", settings.run_count)),
        "-t".to_string(),
        in_container(&files.plan)?,
        format!("-Jusersfile={}", in_container(&files.users)?),
        format!("-Jgroup={}", settings.group),
        format!("-Jdesc={}", settings.description),
        format!("-Jsiteversion={}", settings.moodle_branch),
        format!("-Jsitebranch={}", settings.moodle_branch),
        format!("-Jsitecommit={}", settings.site_commit),
    ];
    if settings.include_logs {
        argv.push("-Jincludelogs=1".to_string());
    }
    argv.extend([
        format!("-Jusers={}", profile.users),
        format!("-Jloops={}", profile.loops),
        format!("-Jrampup={}", profile.rampup),
        format!("-Jthroughput={}", profile.throughput),
    ]);

    Ok(docker_exec(&settings.jmeter, None, true, argv))
}

fn log_status(output: &CommandOutput, step: &str) {
    if output.success() {
        tracing::debug!(step, "step finished");
    } else {
        tracing::debug!(step, status = ?output.status, "step exited unsuccessfully");
    }
}
