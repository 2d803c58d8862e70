//! # Init Command Module / 初始化命令模块
//!
//! This module implements the `init` command, which writes a starter job
//! configuration file. In interactive mode it asks for the web server
//! container and the site size through a short wizard.
//!
//! 此模块实现了 `init` 命令，用于写入初始作业配置文件。
//! 在交互模式下，它会通过简短的向导询问 Web 服务器容器和站点大小。

use anyhow::{Context, Result};
use colored::*;
use dialoguer::{theme::ColorfulTheme, Confirm, Input, Select};
use std::{fs, path::Path};

use crate::infra::t;

const SITE_SIZES: &[&str] = &["XS", "S", "M", "L", "XL", "XXL"];

const DEFAULT_CONFIG: &str = r#"# Job configuration / 作业配置

# Language for runner messages / 运行器消息的语言
language = "en"

# Job type to run / 要运行的作业类型
job = "performance"

# Values seeding the job environment. Variables exported by the CI
# environment override these. / 作业环境的初始值，CI 环境变量会覆盖这些值。
[env]
UUID = "local"
WORKSPACE = "~/moodle-ci/workspace"
SHAREDDIR = "~/moodle-ci/workspace/shared"
ENVIROPATH = "~/moodle-ci/workspace/environment"
WEBSERVER = "{webserver}"
JMETER = "jmeter"
SITESIZE = "{sitesize}"
MOODLE_BRANCH = "main"
DBTYPE = "pgsql"
# Leave both empty for a normal run; set one for a bisect run.
# 两者都留空表示普通运行；设置其一表示 bisect 运行。
GOOD_COMMIT = ""
BAD_COMMIT = ""
"#;

/// Renders the configuration template.
pub fn render_config(webserver: &str, site_size: &str) -> String {
    DEFAULT_CONFIG
        .replace("{webserver}", webserver)
        .replace("{sitesize}", site_size)
}

/// Executes the init command.
///
/// # Arguments
/// * `output` - Path for the new configuration file
/// * `non_interactive` - Write defaults without prompting
/// * `force` - Overwrite an existing file
/// * `locale` - Language for messages
pub fn execute(output: &Path, non_interactive: bool, force: bool, locale: &str) -> Result<()> {
    let theme = ColorfulTheme::default();

    if output.exists() && !force {
        let overwrite = !non_interactive
            && Confirm::with_theme(&theme)
                .with_prompt(t!("init.confirm_overwrite", locale = locale, path = output.display()))
                .default(false)
                .interact()?;
        if !overwrite {
            println!(
                "{}",
                t!("init.file_exists", locale = locale, path = output.display()).red()
            );
            println!("{}", t!("init.use_force", locale = locale).yellow());
            return Ok(());
        }
    }

    let content = if non_interactive {
        render_config("webserver", "XS")
    } else {
        let webserver: String = Input::with_theme(&theme)
            .with_prompt(t!("init.prompt_webserver", locale = locale).to_string())
            .default("webserver".to_string())
            .interact_text()?;
        let size = Select::with_theme(&theme)
            .with_prompt(t!("init.prompt_sitesize", locale = locale).to_string())
            .items(SITE_SIZES)
            .default(0)
            .interact()?;
        render_config(&webserver, SITE_SIZES[size])
    };

    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).with_context(|| {
            t!("init.create_parent_dir_failed", locale = locale, path = parent.display()).to_string()
        })?;
    }

    fs::write(output, content)
        .with_context(|| t!("init.write_failed", locale = locale, path = output.display()).to_string())?;

    println!(
        "{}",
        t!("init.success", locale = locale, path = output.display()).green()
    );
    println!("{}", t!("init.next_steps", locale = locale));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::parse_job_config;

    #[test]
    fn rendered_config_parses() {
        let config = parse_job_config(&render_config("web1", "M")).unwrap();
        assert_eq!(config.job.as_deref(), Some("performance"));
        assert_eq!(config.env["WEBSERVER"], "web1");
        assert_eq!(config.env["SITESIZE"], "M");
        assert_eq!(config.env["GOOD_COMMIT"], "");
    }
}
