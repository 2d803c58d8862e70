//! Typed view over the env values the performance job consumes.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::Serialize;

use crate::core::env::EnvRegistry;
use crate::core::error::{JobError, Result};

/// Size of the generated dataset, as understood by Moodle's `tool_generator`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SiteSize {
    XS,
    S,
    M,
    L,
    XL,
    XXL,
}

/// JMeter thread group parameters for one site size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LoadProfile {
    pub users: u32,
    pub loops: u32,
    pub rampup: u32,
    pub throughput: u32,
}

impl SiteSize {
    pub fn as_str(self) -> &'static str {
        match self {
            SiteSize::XS => "XS",
            SiteSize::S => "S",
            SiteSize::M => "M",
            SiteSize::L => "L",
            SiteSize::XL => "XL",
            SiteSize::XXL => "XXL",
        }
    }

    /// The thread group `maketestplan.php` generates for this size.
    pub fn load_profile(self) -> LoadProfile {
        let (users, loops, rampup) = match self {
            SiteSize::XS => (1, 5, 1),
            SiteSize::S => (30, 5, 6),
            SiteSize::M => (100, 5, 40),
            SiteSize::L => (1000, 6, 100),
            SiteSize::XL => (5000, 6, 500),
            SiteSize::XXL => (10000, 7, 800),
        };
        LoadProfile {
            users,
            loops,
            rampup,
            throughput: 120,
        }
    }
}

impl fmt::Display for SiteSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SiteSize {
    type Err = JobError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "XS" => Ok(SiteSize::XS),
            "S" => Ok(SiteSize::S),
            "M" => Ok(SiteSize::M),
            "L" => Ok(SiteSize::L),
            "XL" => Ok(SiteSize::XL),
            "XXL" => Ok(SiteSize::XXL),
            _ => Err(JobError::InvalidSetting {
                name: "SITESIZE".to_string(),
                value: s.to_string(),
            }),
        }
    }
}

/// Everything the performance job reads, resolved once in `configure`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PerformanceSettings {
    pub uuid: String,
    pub workspace: PathBuf,
    pub shared_dir: PathBuf,
    pub webserver: String,
    pub wwwroot: String,
    pub site_size: SiteSize,
    pub course_name: String,
    pub run_count: u32,
    /// Name of the JMeter container. Empty until the `docker-jmeter` module set it.
    pub jmeter: String,
    /// Where `shared_dir` is mounted inside the JMeter container.
    pub jmeter_shared_dir: String,
    pub moodle_branch: String,
    pub site_commit: String,
    pub good_commit: String,
    pub bad_commit: String,
    pub group: String,
    pub description: String,
    pub include_logs: bool,
}

impl PerformanceSettings {
    /// Builds the typed settings. Unset values read as empty strings, like in
    /// a shell; only values with a fixed format can fail.
    pub fn resolve(env: &EnvRegistry) -> Result<Self> {
        let site_size = env.get_or_empty("SITESIZE").parse()?;
        let run_count = match env.get_or_empty("RUNCOUNT") {
            "" => 1,
            raw => raw.parse().map_err(|_| JobError::InvalidSetting {
                name: "RUNCOUNT".to_string(),
                value: raw.to_string(),
            })?,
        };

        let uuid = env.get_or_empty("UUID").to_string();
        let moodle_branch = env.get_or_empty("MOODLE_BRANCH").to_string();
        let group = non_empty_or(env.get_or_empty("PERF_GROUP"), &moodle_branch);
        let description = non_empty_or(env.get_or_empty("PERF_DESCRIPTION"), &uuid);
        let jmeter_shared_dir = non_empty_or(env.get_or_empty("PERF_JMETER_SHAREDDIR"), "/shared");

        Ok(Self {
            workspace: PathBuf::from(env.get_or_empty("WORKSPACE")),
            shared_dir: PathBuf::from(env.get_or_empty("SHAREDDIR")),
            webserver: env.get_or_empty("WEBSERVER").to_string(),
            wwwroot: env.get_or_empty("MOODLE_WWWROOT").to_string(),
            site_size,
            course_name: env.get_or_empty("COURSENAME").to_string(),
            run_count,
            jmeter: env.get_or_empty("JMETER").to_string(),
            jmeter_shared_dir,
            site_commit: env.get_or_empty("GIT_COMMIT").to_string(),
            good_commit: env.get_or_empty("GOOD_COMMIT").to_string(),
            bad_commit: env.get_or_empty("BAD_COMMIT").to_string(),
            include_logs: is_truthy(env.get_or_empty("PERF_INCLUDE_LOGS")),
            uuid,
            moodle_branch,
            group,
            description,
        })
    }

    /// A bisect run compares two commits on an environment that already exists.
    pub fn is_bisect(&self) -> bool {
        !self.good_commit.is_empty() || !self.bad_commit.is_empty()
    }

    pub fn plan_dir(&self) -> PathBuf {
        self.shared_dir.join("planfiles")
    }

    pub fn output_dir(&self) -> PathBuf {
        self.shared_dir.join("output")
    }

    /// File the JMeter run output for this run count is written to.
    pub fn run_output_file(&self) -> PathBuf {
        self.output_dir()
            .join("runs")
            .join(format!("{}.output", self.run_count))
    }

    /// Path of a shared-dir file as seen from inside the JMeter container.
    pub fn jmeter_path(&self, relative: &str) -> String {
        format!("{}/{}", self.jmeter_shared_dir.trim_end_matches('/'), relative)
    }

    /// Destination for persisted results.
    pub fn results_dir(&self) -> PathBuf {
        self.workspace.join(&self.uuid).join("performance")
    }
}

fn non_empty_or(value: &str, fallback: &str) -> String {
    if value.is_empty() {
        fallback.to_string()
    } else {
        value.to_string()
    }
}

fn is_truthy(value: &str) -> bool {
    matches!(value.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on")
}
