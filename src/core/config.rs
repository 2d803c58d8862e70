//! # Job Configuration / 作业配置
//!
//! The TOML file a CI job is started with. It carries the output language,
//! the job type to run and an `[env]` table of values that seed the
//! [`EnvRegistry`](crate::core::env::EnvRegistry). Values from the process
//! environment win over values from the file.
//!
//! 启动 CI 作业时使用的 TOML 文件。

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Parsed job configuration file.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct JobConfig {
    /// The language for the runner's output messages (e.g., "en", "zh-CN").
    /// 运行器输出消息的语言（例如 "en", "zh-CN"）。
    #[serde(default = "default_language")]
    pub language: String,

    /// The job type to run when `--job` is not given on the command line.
    #[serde(default)]
    pub job: Option<String>,

    /// Initial env values, keyed by variable name.
    #[serde(default)]
    pub env: BTreeMap<String, String>,
}

impl Default for JobConfig {
    fn default() -> Self {
        Self {
            language: default_language(),
            job: None,
            env: BTreeMap::new(),
        }
    }
}

fn default_language() -> String {
    "en".to_string()
}

/// Loads and parses a job configuration file.
pub fn load_job_config(path: &Path) -> Result<JobConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    parse_job_config(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Parses configuration text. Path-like values (`WORKSPACE`, `SHAREDDIR`,
/// `ENVIROPATH`) are expanded with `shellexpand`.
pub fn parse_job_config(content: &str) -> Result<JobConfig> {
    let mut config: JobConfig = toml::from_str(content)?;
    for name in ["WORKSPACE", "SHAREDDIR", "ENVIROPATH"] {
        if let Some(value) = config.env.get_mut(name) {
            *value = crate::infra::fs::expand_path(value).display().to_string();
        }
    }
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_config_uses_defaults() {
        let config = parse_job_config("").unwrap();
        assert_eq!(config.language, "en");
        assert!(config.job.is_none());
        assert!(config.env.is_empty());
    }

    #[test]
    fn env_table_is_read_verbatim() {
        let config = parse_job_config(
            r#"
language = "zh-CN"
job = "performance"

[env]
WEBSERVER = "web1"
SITESIZE = "S"
"#,
        )
        .unwrap();

        assert_eq!(config.language, "zh-CN");
        assert_eq!(config.job.as_deref(), Some("performance"));
        assert_eq!(config.env.get("WEBSERVER").map(String::as_str), Some("web1"));
        assert_eq!(config.env.get("SITESIZE").map(String::as_str), Some("S"));
    }

    #[test]
    fn path_values_are_expanded() {
        let home = std::env::var("HOME").unwrap_or_default();
        let config = parse_job_config("[env]\nWORKSPACE = \"~/ws\"\n").unwrap();
        if !home.is_empty() {
            assert_eq!(config.env["WORKSPACE"], format!("{home}/ws"));
        }
    }

    #[test]
    fn invalid_toml_is_rejected() {
        assert!(parse_job_config("[env\nWEBSERVER = 1").is_err());
    }
}
