//! # Command Execution / 命令执行
//!
//! Describes external commands (`docker exec`, `curl`, ...) as plain data and
//! runs them through a [`CommandExecutor`]. Job types only ever build
//! [`CommandSpec`]s; the executor decides how they reach the OS, which lets
//! tests record invocations instead of spawning processes.
//!
//! 将外部命令（`docker exec`、`curl` 等）描述为普通数据，并通过 [`CommandExecutor`] 运行。

use std::fmt;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::core::error::{JobError, Result};

/// A fully resolved external command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// The command rendered as a single shell-safe line, for logs.
    pub fn display_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .map(|part| shlex::try_quote(part).map_or_else(|_| part.to_string(), |q| q.into_owned()))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display_line())
    }
}

/// Builds `docker exec [-t] [-u user] <container> <argv...>`.
pub fn docker_exec<I, S>(container: &str, user: Option<&str>, tty: bool, argv: I) -> CommandSpec
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut spec = CommandSpec::new("docker").arg("exec");
    if tty {
        spec = spec.arg("-t");
    }
    if let Some(user) = user {
        spec = spec.arg("-u").arg(user);
    }
    spec.arg(container).args(argv)
}

/// What a finished process left behind.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code, `None` when the process was killed by a signal.
    pub status: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.status == Some(0)
    }

    /// Exit code with signal terminations mapped to `-1`.
    pub fn exit_code(&self) -> i32 {
        self.status.unwrap_or(-1)
    }

    /// stdout followed by stderr, the way a terminal would show them.
    pub fn combined(&self) -> String {
        let mut out = self.stdout.clone();
        out.push_str(&self.stderr);
        out
    }
}

/// Runs [`CommandSpec`]s. Implementations must run each command to completion.
#[async_trait]
pub trait CommandExecutor: Send + Sync {
    async fn execute(&self, spec: &CommandSpec) -> Result<CommandOutput>;
}

/// Executes commands as real child processes.
#[derive(Debug, Clone, Default)]
pub struct ProcessExecutor;

#[async_trait]
impl CommandExecutor for ProcessExecutor {
    async fn execute(&self, spec: &CommandSpec) -> Result<CommandOutput> {
        tracing::debug!(command = %spec, "spawning");
        let mut cmd = tokio::process::Command::new(&spec.program);
        cmd.args(&spec.args).kill_on_drop(true);

        spawn_and_capture(cmd).await.map_err(|source| JobError::Spawn {
            program: spec.program.clone(),
            source,
        })
    }
}

/// Spawns a command and captures stdout and stderr.
/// Both streams are read concurrently so neither pipe can fill up and block
/// the child.
///
/// 派生一个命令并捕获其 stdout 和 stderr。两个流被并发读取。
pub async fn spawn_and_capture(
    mut cmd: tokio::process::Command,
) -> std::io::Result<CommandOutput> {
    let mut child = cmd
        .stdout(std::process::Stdio::piped())
        .stderr(std::process::Stdio::piped())
        .spawn()?;

    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| std::io::Error::other("failed to capture stdout"))?;
    let stderr = child
        .stderr
        .take()
        .ok_or_else(|| std::io::Error::other("failed to capture stderr"))?;

    let stdout_handle = tokio::spawn(read_lines(stdout));
    let stderr_handle = tokio::spawn(read_lines(stderr));

    let status = child.wait().await?;

    let stdout = stdout_handle.await.unwrap_or_else(|e| {
        tracing::warn!("failed to join stdout task: {e}");
        String::new()
    });
    let stderr = stderr_handle.await.unwrap_or_else(|e| {
        tracing::warn!("failed to join stderr task: {e}");
        String::new()
    });

    Ok(CommandOutput {
        status: status.code(),
        stdout,
        stderr,
    })
}

/// Drains `reader` to EOF. Invalid UTF-8 is replaced, never a reason to stop
/// reading: a closed pipe would kill the child with SIGPIPE.
async fn read_lines<R>(reader: R) -> String
where
    R: tokio::io::AsyncRead + Unpin,
{
    let mut lines = BufReader::new(reader).split(b'\n');
    let mut output = String::new();
    loop {
        match lines.next_segment().await {
            Ok(Some(line)) => {
                output.push_str(&String::from_utf8_lossy(&line));
                output.push('\n');
            }
            Ok(None) => break,
            Err(e) => {
                tracing::warn!("failed to read child output: {e}");
                break;
            }
        }
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn docker_exec_places_flags_before_container() {
        let spec = docker_exec("web1", Some("www-data"), true, ["php", "admin/cli/cron.php"]);
        assert_eq!(spec.program, "docker");
        assert_eq!(
            spec.args,
            vec!["exec", "-t", "-u", "www-data", "web1", "php", "admin/cli/cron.php"]
        );
    }

    #[test]
    fn docker_exec_without_user_or_tty() {
        let spec = docker_exec("jmeter", None, false, ["jmeter", "-v"]);
        assert_eq!(spec.args, vec!["exec", "jmeter", "jmeter", "-v"]);
    }

    #[test]
    fn display_line_quotes_arguments_with_spaces() {
        let spec = CommandSpec::new("php").arg("--fullname=Moodle Performance Test");
        let line = spec.display_line();
        assert!(line.starts_with("php "));
        assert_eq!(
            shlex::split(&line).unwrap(),
            vec!["php", "--fullname=Moodle Performance Test"]
        );
    }

    #[test]
    fn signal_termination_maps_to_negative_exit_code() {
        let output = CommandOutput::default();
        assert!(!output.success());
        assert_eq!(output.exit_code(), -1);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn process_executor_captures_both_streams() {
        let spec = CommandSpec::new("sh").args(["-c", "echo out; echo err >&2; exit 3"]);
        let output = ProcessExecutor.execute(&spec).await.unwrap();

        assert_eq!(output.status, Some(3));
        assert_eq!(output.stdout, "out\n");
        assert_eq!(output.stderr, "err\n");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn process_executor_keeps_reading_past_invalid_utf8() {
        let spec = CommandSpec::new("sh").args(["-c", "printf 'a\\n\\377\\nafter\\n'"]);
        let output = ProcessExecutor.execute(&spec).await.unwrap();

        assert_eq!(output.status, Some(0));
        assert_eq!(output.stdout, "a\n\u{FFFD}\nafter\n");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn process_executor_drains_output_after_invalid_utf8() {
        let script = "printf '\\377\\n'; sleep 0.2; i=0; \
                      while [ $i -lt 20000 ]; do echo line$i; i=$((i+1)); done; exit 0";
        let spec = CommandSpec::new("sh").args(["-c", script]);
        let output = ProcessExecutor.execute(&spec).await.unwrap();

        assert_eq!(output.status, Some(0));
        assert_eq!(output.stdout.lines().count(), 20001);
        assert!(output.stdout.ends_with("line19999\n"));
    }

    #[tokio::test]
    async fn process_executor_reports_spawn_failures() {
        let spec = CommandSpec::new("this_command_definitely_does_not_exist_12345");
        let err = ProcessExecutor.execute(&spec).await.unwrap_err();
        assert!(matches!(err, JobError::Spawn { .. }));
    }
}
