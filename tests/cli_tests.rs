use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::fs;
use std::process::Command;
use tempfile::tempdir;

fn runner() -> Command {
    let mut cmd = Command::cargo_bin("moodle-perf-runner").unwrap();
    cmd.arg("--lang").arg("en");
    cmd
}

/// `list` prints the built-in job type with its modules and exports.
///
/// `list` 打印内置作业类型及其模块和导出变量。
#[test]
fn test_list_shows_performance_job() {
    runner()
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("Registered job types:"))
        .stdout(predicate::str::contains("performance"))
        .stdout(predicate::str::contains("docker-jmeter"))
        .stdout(predicate::str::contains("MOODLE_WWWROOT"));
}

/// An unknown job type fails before anything runs.
///
/// 未知的作业类型在执行任何操作之前就会失败。
#[test]
fn test_unknown_job_type_fails() {
    runner()
        .args(["run", "--job", "phpunit"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("Running job type:"))
        .stderr(predicate::str::contains("Job 'phpunit' failed"))
        .stderr(predicate::str::contains("unknown job type 'phpunit'"));
}

/// A configuration file that is not valid TOML is rejected.
///
/// 无效 TOML 的配置文件会被拒绝。
#[test]
fn test_invalid_config_fails() {
    let dir = tempdir().unwrap();
    let config = dir.path().join("broken.toml");
    fs::write(&config, "job = [unterminated").unwrap();

    runner()
        .arg("run")
        .arg("--config")
        .arg(&config)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to parse config file"));
}

#[test]
fn test_missing_config_fails() {
    let dir = tempdir().unwrap();

    runner()
        .arg("run")
        .arg("--config")
        .arg(dir.path().join("nope.toml"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read config file"));
}

/// `init --non-interactive` writes a config that `run` could load, and
/// refuses to overwrite it without `--force`.
///
/// `init --non-interactive` 写入配置文件，没有 `--force` 时拒绝覆盖。
#[test]
fn test_init_writes_config_and_respects_existing_file() {
    let dir = tempdir().unwrap();
    let output = dir.path().join("ci").join("job.toml");

    runner()
        .args(["init", "--non-interactive", "--output"])
        .arg(&output)
        .assert()
        .success()
        .stdout(predicate::str::contains("Created job configuration"));

    let content = fs::read_to_string(&output).unwrap();
    assert!(content.contains("job = \"performance\""));
    assert!(content.contains("WEBSERVER = \"webserver\""));
    assert!(content.contains("SITESIZE = \"XS\""));

    fs::write(&output, "# edited\n").unwrap();
    runner()
        .args(["init", "--non-interactive", "--output"])
        .arg(&output)
        .assert()
        .success()
        .stdout(predicate::str::contains("already exists"));
    assert_eq!(fs::read_to_string(&output).unwrap(), "# edited\n");

    runner()
        .args(["init", "--non-interactive", "--force", "--output"])
        .arg(&output)
        .assert()
        .success();
    assert!(fs::read_to_string(&output).unwrap().contains("[env]"));
}

#[test]
fn test_chinese_locale_lists_jobs() {
    Command::cargo_bin("moodle-perf-runner")
        .unwrap()
        .args(["--lang", "zh-CN", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("performance"));
}
