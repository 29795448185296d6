// src/cli.rs
use anyhow::Result;
use clap::{Arg, ArgAction, ArgMatches, Command};
use std::{env, path::PathBuf};

use crate::core::config::Overrides;
use crate::infra::t;

pub mod commands;

/// Everything the `run` command needs from the command line.
#[derive(Debug, Clone, Default)]
pub struct RunArgs {
    pub notebooks: Vec<PathBuf>,
    pub config: Option<PathBuf>,
    pub json_report: Option<PathBuf>,
    pub overrides: Overrides,
    /// Set when `--lang` was given explicitly.
    pub language: Option<String>,
    /// The locale detected from the system, used when nothing else names one.
    pub system_language: String,
}

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
    Command::new("notebook-runner")
        .author(env!("CARGO_PKG_AUTHORS"))
        .version(env!("CARGO_PKG_VERSION"))
        .about(t!("cli.about", locale = locale).to_string())
        .arg(
            Arg::new("notebooks")
                .help(t!("cli.arg_notebooks", locale = locale).to_string())
                .value_name("NOTEBOOKS")
                .num_args(0..)
                .value_parser(clap::value_parser!(PathBuf))
                .action(ArgAction::Append),
        )
        .arg(
            Arg::new("num-threads")
                .short('j')
                .long("num-threads")
                .help(t!("cli.arg_num_threads", locale = locale).to_string())
                .value_name("THREADS")
                .value_parser(clap::value_parser!(usize))
                .action(ArgAction::Set),
        )
        .arg(
            Arg::new("seed")
                .short('s')
                .long("seed")
                .help(t!("cli.arg_seed", locale = locale).to_string())
                .value_name("SEED")
                .value_parser(clap::value_parser!(i64))
                .allow_negative_numbers(true)
                .action(ArgAction::Set),
        )
        .arg(
            Arg::new("match-output")
                .short('m')
                .long("match_output")
                .visible_alias("match-output")
                .help(t!("cli.arg_match_output", locale = locale).to_string())
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help(t!("cli.arg_verbose", locale = locale).to_string())
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("timeout")
                .long("timeout")
                .help(t!("cli.arg_timeout", locale = locale).to_string())
                .value_name("SECS")
                .value_parser(clap::value_parser!(u64))
                .action(ArgAction::Set),
        )
        .arg(
            Arg::new("kernel")
                .long("kernel")
                .help(t!("cli.arg_kernel", locale = locale).to_string())
                .value_name("KERNEL")
                .action(ArgAction::Set),
        )
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .help(t!("cli.arg_config", locale = locale).to_string())
                .value_name("CONFIG")
                .value_parser(clap::value_parser!(PathBuf))
                .action(ArgAction::Set),
        )
        .arg(
            Arg::new("json-report")
                .long("json-report")
                .help(t!("cli.arg_json_report", locale = locale).to_string())
                .value_name("PATH")
                .value_parser(clap::value_parser!(PathBuf))
                .action(ArgAction::Set),
        )
        .arg(
            Arg::new("lang")
                .long("lang")
                .help(t!("cli.arg_lang", locale = locale).to_string())
                .value_name("LANGUAGE")
                .action(ArgAction::Set),
        )
}

impl RunArgs {
    pub fn from_matches(matches: &ArgMatches) -> Self {
        Self {
            notebooks: matches
                .get_many::<PathBuf>("notebooks")
                .map(|paths| paths.cloned().collect())
                .unwrap_or_default(),
            config: matches.get_one::<PathBuf>("config").cloned(),
            json_report: matches.get_one::<PathBuf>("json-report").cloned(),
            overrides: Overrides {
                num_threads: matches.get_one::<usize>("num-threads").copied(),
                seed: matches.get_one::<i64>("seed").copied(),
                verbose: matches.get_flag("verbose"),
                match_output: matches.get_flag("match-output"),
                timeout_secs: matches.get_one::<u64>("timeout").copied(),
                kernel: matches.get_one::<String>("kernel").cloned(),
            },
            language: matches.get_one::<String>("lang").cloned(),
            system_language: String::new(),
        }
    }
}

/// Parses the command line and runs the tests.
///
/// Returns `Ok(true)` when every notebook passed and `Ok(false)` when some
/// notebook failed. Errors mean the run could not be carried out at all.
pub async fn run() -> Result<bool> {
    // Pre-parse language and initialize i18n first.
    let system_language = crate::init();
    let language = match pre_parse_language() {
        Some(language) => {
            rust_i18n::set_locale(&language);
            language
        }
        None => system_language.clone(),
    };

    let matches = build_cli(&language).get_matches();
    let mut args = RunArgs::from_matches(&matches);
    args.system_language = system_language;

    commands::run::execute(args).await
}
