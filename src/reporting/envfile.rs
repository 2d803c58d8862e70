//! Env file persistence: exported variables written as `KEY=VALUE` lines so
//! a later process (or shell) can pick them up again.

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

/// Renders pairs as shell-sourceable `KEY=VALUE` lines.
pub fn render_env_file(pairs: &[(String, String)]) -> String {
    let mut out = String::new();
    for (name, value) in pairs {
        let quoted = if value.is_empty() {
            "''".to_string()
        } else {
            shlex::try_quote(value)
                .map(|q| q.into_owned())
                .unwrap_or_else(|_| value.replace('\0', ""))
        };
        out.push_str(name);
        out.push('=');
        out.push_str(&quoted);
        out.push('\n');
    }
    out
}

pub fn write_env_file(path: &Path, pairs: &[(String, String)]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }
    fs::write(path, render_env_file(pairs))
        .with_context(|| format!("Failed to write env file: {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(items: &[(&str, &str)]) -> Vec<(String, String)> {
        items
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn plain_values_are_left_unquoted() {
        let out = render_env_file(&pairs(&[("WEBSERVER", "web1"), ("EXITCODE", "0")]));
        assert_eq!(out, "WEBSERVER=web1\nEXITCODE=0\n");
    }

    #[test]
    fn empty_values_become_empty_quotes() {
        assert_eq!(render_env_file(&pairs(&[("DBTAG", "")])), "DBTAG=''\n");
    }

    #[test]
    fn values_with_spaces_survive_a_shell_round_trip() {
        let out = render_env_file(&pairs(&[("DBPASS", "s3cret with space")]));
        let value = out.trim_end().strip_prefix("DBPASS=").unwrap();
        assert_eq!(shlex::split(value).unwrap(), vec!["s3cret with space"]);
    }
}
