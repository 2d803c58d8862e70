// src/cli.rs
use anyhow::Result;
use clap::{Arg, ArgAction, Command};
use std::{env, path::PathBuf, process::ExitCode};
use tracing_subscriber::EnvFilter;

use crate::infra::t;

pub mod commands;

/// Pre-parses the command line arguments to find the language setting.
/// This allows i18n to be initialized before the full CLI is built.
/// It looks for a `--lang <VALUE>` argument.
fn pre_parse_language() -> Option<String> {
    let args: Vec<String> = env::args().collect();
    args.iter()
        .position(|arg| arg == "--lang")
        .and_then(|pos| args.get(pos + 1))
        .cloned()
}

pub fn build_cli(locale: &str) -> Command {
    Command::new("moodle-perf-runner")
        .version(env!("CARGO_PKG_VERSION"))
        .about(t!("cli_about", locale = locale).to_string())
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("lang")
                .long("lang")
                .help(t!("cli_lang", locale = locale).to_string())
                .value_name("LANGUAGE")
                .global(true)
                .action(ArgAction::Set),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help(t!("cli_verbose", locale = locale).to_string())
                .global(true)
                .action(ArgAction::SetTrue),
        )
        .subcommand(
            Command::new("run")
                .about(t!("cmd_run_about", locale = locale).to_string())
                .arg(
                    Arg::new("job")
                        .short('j')
                        .long("job")
                        .help(t!("arg_job", locale = locale).to_string())
                        .value_name("JOB")
                        .action(ArgAction::Set),
                )
                .arg(
                    Arg::new("config")
                        .short('c')
                        .long("config")
                        .help(t!("arg_config", locale = locale).to_string())
                        .value_name("CONFIG")
                        .value_parser(clap::value_parser!(PathBuf))
                        .action(ArgAction::Set),
                )
                .arg(
                    Arg::new("env-file")
                        .long("env-file")
                        .help(t!("arg_env_file", locale = locale).to_string())
                        .value_name("ENV_FILE")
                        .value_parser(clap::value_parser!(PathBuf))
                        .action(ArgAction::Set),
                )
                .arg(
                    Arg::new("html")
                        .long("html")
                        .help(t!("arg_html", locale = locale).to_string())
                        .value_name("HTML")
                        .value_parser(clap::value_parser!(PathBuf))
                        .action(ArgAction::Set),
                )
                .arg(
                    Arg::new("json")
                        .long("json")
                        .help(t!("arg_json", locale = locale).to_string())
                        .value_name("JSON")
                        .value_parser(clap::value_parser!(PathBuf))
                        .action(ArgAction::Set),
                ),
        )
        .subcommand(Command::new("list").about(t!("cmd_list_about", locale = locale).to_string()))
        .subcommand(
            Command::new("init")
                .about(t!("cmd_init_about", locale = locale).to_string())
                .arg(
                    Arg::new("output")
                        .short('o')
                        .long("output")
                        .help(t!("arg_output", locale = locale).to_string())
                        .value_name("OUTPUT")
                        .default_value("job.toml")
                        .value_parser(clap::value_parser!(PathBuf))
                        .action(ArgAction::Set),
                )
                .arg(
                    Arg::new("non-interactive")
                        .long("non-interactive")
                        .help(t!("arg_non_interactive", locale = locale).to_string())
                        .action(ArgAction::SetTrue),
                )
                .arg(
                    Arg::new("force")
                        .long("force")
                        .help(t!("arg_force", locale = locale).to_string())
                        .action(ArgAction::SetTrue),
                ),
        )
}

/// Installs the diagnostic log subscriber. `RUST_LOG` wins over `--verbose`.
fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Parses the command line and dispatches to the matching command.
/// The returned exit code is the job's exit code for `run`.
pub async fn run() -> Result<ExitCode> {
    // Pre-parse language and initialize i18n first.
    let language = match pre_parse_language() {
        Some(lang) => {
            let resolved = crate::resolve_locale(&lang);
            rust_i18n::set_locale(&resolved);
            resolved
        }
        None => crate::init(),
    };

    let matches = build_cli(&language).get_matches();
    init_tracing(matches.get_flag("verbose"));
    let lang_override = matches.get_one::<String>("lang").map(|l| crate::resolve_locale(l));

    match matches.subcommand() {
        Some(("run", run_matches)) => {
            let args = commands::run::RunArgs {
                job: run_matches.get_one::<String>("job").cloned(),
                config: run_matches.get_one::<PathBuf>("config").cloned(),
                env_file: run_matches.get_one::<PathBuf>("env-file").cloned(),
                html: run_matches.get_one::<PathBuf>("html").cloned(),
                json: run_matches.get_one::<PathBuf>("json").cloned(),
                lang: lang_override,
            };
            commands::run::execute(args).await
        }
        Some(("list", _)) => {
            commands::list::execute(&language);
            Ok(ExitCode::SUCCESS)
        }
        Some(("init", init_matches)) => {
            let output = init_matches
                .get_one::<PathBuf>("output")
                .cloned()
                .unwrap_or_else(|| PathBuf::from("job.toml"));
            commands::init::execute(
                &output,
                init_matches.get_flag("non-interactive"),
                init_matches.get_flag("force"),
                &language,
            )?;
            Ok(ExitCode::SUCCESS)
        }
        // `subcommand_required` makes clap print help and exit before we get here.
        _ => Ok(ExitCode::SUCCESS),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        build_cli("en").debug_assert();
    }

    #[test]
    fn run_accepts_job_and_outputs() {
        let matches = build_cli("en")
            .try_get_matches_from([
                "moodle-perf-runner",
                "run",
                "--job",
                "performance",
                "--env-file",
                "out.env",
                "--html",
                "report.html",
            ])
            .unwrap();
        let (name, sub) = matches.subcommand().unwrap();
        assert_eq!(name, "run");
        assert_eq!(sub.get_one::<String>("job").map(String::as_str), Some("performance"));
        assert_eq!(sub.get_one::<PathBuf>("env-file"), Some(&PathBuf::from("out.env")));
    }
}
