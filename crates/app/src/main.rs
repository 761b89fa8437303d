use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use services::{AppServices, BankSource, Clock, ServiceOptions};
use study_core::model::{AnswerStatus, OptionIndex, Subject, SubjectCatalog};
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt as log_fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::commands::{Command, QuizAction};
use crate::config::{Config, normalize_sqlite_url, prepare_sqlite_file};

mod commands;
mod config;

#[derive(Debug, PartialEq, Eq)]
enum ArgsError {
    MissingValue { flag: &'static str },
    MissingArgument { command: &'static str, name: &'static str },
    UnknownArg(String),
    UnknownCommand(String),
    InvalidValue { name: &'static str, raw: String },
    InvalidDbUrl { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::MissingArgument { command, name } => {
                write!(f, "{command} requires <{name}>")
            }
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::UnknownCommand(cmd) => write!(f, "unknown subcommand: {cmd}"),
            ArgsError::InvalidValue { name, raw } => write!(f, "invalid {name}: {raw}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  app [progress]                          per-subject and overall progress");
    eprintln!("  app answer <subject> <id> <A-D|0-3>     record an answer checked against the bank");
    eprintln!("  app list <subject> [answered|unanswered|correct|incorrect]");
    eprintln!("  app stats <subject>                     completion and accuracy against the bank");
    eprintln!("  app search <subject> <term>");
    eprintln!("  app sample <subject> <count>");
    eprintln!("  app quiz start <subject> | show | next | prev | goto <id>");
    eprintln!("  app export [--out <file>]");
    eprintln!("  app import <file>");
    eprintln!("  app reset [<subject>]");
    eprintln!("  app reconcile [--check]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --db <sqlite_url>      default sqlite://study.sqlite3");
    eprintln!("  --bank <url|dir>       default data");
    eprintln!("  --namespace <prefix>   record key prefix");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  STUDY_DB_URL, STUDY_BANK, STUDY_NAMESPACE, RUST_LOG");
}

/// Parse `argv` (without the program name), applying option flags to `config`.
fn parse_args(argv: Vec<String>, config: &mut Config) -> Result<Command, ArgsError> {
    let mut positionals = Vec::new();
    let mut out = None;
    let mut check_only = false;

    let mut args = argv.into_iter();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--db" => {
                let value = require_value(&mut args, "--db")?;
                if value.trim().is_empty() {
                    return Err(ArgsError::InvalidDbUrl { raw: value });
                }
                config.db_url = normalize_sqlite_url(value);
            }
            "--bank" => config.bank = require_value(&mut args, "--bank")?,
            "--namespace" => {
                let value = require_value(&mut args, "--namespace")?;
                config.namespace = (!value.trim().is_empty()).then_some(value);
            }
            "--out" => out = Some(PathBuf::from(require_value(&mut args, "--out")?)),
            "--check" => check_only = true,
            "--help" | "-h" => return Ok(Command::Help),
            flag if flag.starts_with("--") => return Err(ArgsError::UnknownArg(arg)),
            _ => positionals.push(arg),
        }
    }

    let command = parse_command(positionals)?;
    if out.is_some() && !matches!(command, Command::Export { .. }) {
        return Err(ArgsError::UnknownArg("--out".into()));
    }
    if check_only && !matches!(command, Command::Reconcile { .. }) {
        return Err(ArgsError::UnknownArg("--check".into()));
    }
    Ok(match command {
        Command::Export { .. } => Command::Export { out },
        Command::Reconcile { .. } => Command::Reconcile { check_only },
        other => other,
    })
}

fn parse_command(positionals: Vec<String>) -> Result<Command, ArgsError> {
    let mut args = positionals.into_iter();
    let Some(name) = args.next() else {
        return Ok(Command::Progress);
    };

    let command = match name.as_str() {
        "progress" => Command::Progress,
        "answer" => Command::Answer {
            subject: subject_arg(&mut args, "answer")?,
            question: parsed_arg(&mut args, "answer", "id")?,
            selected: parsed_arg::<OptionIndex>(&mut args, "answer", "option")?,
        },
        "list" => {
            let subject = subject_arg(&mut args, "list")?;
            let status = match args.next() {
                Some(raw) => AnswerStatus::from_str(&raw).map_err(|_| ArgsError::InvalidValue {
                    name: "status",
                    raw,
                })?,
                None => AnswerStatus::Answered,
            };
            Command::List { subject, status }
        }
        "stats" => Command::Stats {
            subject: subject_arg(&mut args, "stats")?,
        },
        "search" => Command::Search {
            subject: subject_arg(&mut args, "search")?,
            term: required(&mut args, "search", "term")?,
        },
        "sample" => Command::Sample {
            subject: subject_arg(&mut args, "sample")?,
            count: parsed_arg(&mut args, "sample", "count")?,
        },
        "quiz" => {
            let action = required(&mut args, "quiz", "action")?;
            Command::Quiz(match action.as_str() {
                "start" => QuizAction::Start(subject_arg(&mut args, "quiz start")?),
                "show" => QuizAction::Show,
                "next" => QuizAction::Next,
                "prev" | "previous" => QuizAction::Previous,
                "goto" => QuizAction::GoTo(parsed_arg(&mut args, "quiz goto", "id")?),
                _ => {
                    return Err(ArgsError::InvalidValue {
                        name: "quiz action",
                        raw: action,
                    });
                }
            })
        }
        "export" => Command::Export { out: None },
        "import" => Command::Import {
            path: PathBuf::from(required(&mut args, "import", "file")?),
        },
        "reset" => Command::Reset {
            subject: match args.next() {
                Some(raw) => Some(parse_subject(raw)?),
                None => None,
            },
        },
        "reconcile" => Command::Reconcile { check_only: false },
        _ => return Err(ArgsError::UnknownCommand(name)),
    };

    if let Some(extra) = args.next() {
        return Err(ArgsError::UnknownArg(extra));
    }
    Ok(command)
}

fn required(
    args: &mut impl Iterator<Item = String>,
    command: &'static str,
    name: &'static str,
) -> Result<String, ArgsError> {
    args.next()
        .ok_or(ArgsError::MissingArgument { command, name })
}

fn parsed_arg<T: FromStr>(
    args: &mut impl Iterator<Item = String>,
    command: &'static str,
    name: &'static str,
) -> Result<T, ArgsError> {
    let raw = required(args, command, name)?;
    raw.parse()
        .map_err(|_| ArgsError::InvalidValue { name, raw })
}

fn subject_arg(
    args: &mut impl Iterator<Item = String>,
    command: &'static str,
) -> Result<Subject, ArgsError> {
    parse_subject(required(args, command, "subject")?)
}

fn parse_subject(raw: String) -> Result<Subject, ArgsError> {
    Subject::new(raw.clone()).map_err(|_| ArgsError::InvalidValue {
        name: "subject",
        raw,
    })
}

fn init_tracing(rust_log: &str) {
    tracing_subscriber::registry()
        .with(EnvFilter::new(rust_log))
        .with(log_fmt::layer().with_writer(std::io::stderr).with_target(false))
        .init();
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut config = Config::from_env();
    let argv: Vec<String> = std::env::args().skip(1).collect();

    let command = parse_args(argv, &mut config).inspect_err(|_| print_usage())?;
    if command == Command::Help {
        print_usage();
        return Ok(());
    }

    init_tracing(&config.rust_log);

    // The database file is created here so the services only ever see a ready URL.
    prepare_sqlite_file(&config.db_url)?;
    let options = ServiceOptions {
        namespace: config.namespace.clone(),
        catalog: SubjectCatalog::ged(),
    };
    let app = AppServices::new_sqlite(
        &config.db_url,
        BankSource::parse(&config.bank),
        options,
        Clock::system(),
    )
    .await?;
    info!(db = %config.db_url, bank = %config.bank, "services ready");

    commands::execute(command, &app).await
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        // At this layer (binary glue), printing once is fine.
        eprintln!("{err}");
        std::process::exit(2);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use study_core::model::QuestionId;

    fn base_config() -> Config {
        Config {
            db_url: config::DEFAULT_DB_URL.to_string(),
            bank: config::DEFAULT_BANK.to_string(),
            namespace: None,
            rust_log: "info".to_string(),
        }
    }

    fn parse(raw: &[&str]) -> (Result<Command, ArgsError>, Config) {
        let mut config = base_config();
        let argv = raw.iter().map(ToString::to_string).collect();
        (parse_args(argv, &mut config), config)
    }

    #[test]
    fn no_arguments_shows_progress() {
        assert_eq!(parse(&[]).0, Ok(Command::Progress));
    }

    #[test]
    fn answer_accepts_letters_and_digits() {
        let math = Subject::new("math").unwrap();
        let expected = Command::Answer {
            subject: math,
            question: QuestionId::new(12).unwrap(),
            selected: OptionIndex::new(2).unwrap(),
        };
        assert_eq!(parse(&["answer", "math", "12", "C"]).0, Ok(expected.clone()));
        assert_eq!(parse(&["answer", "math", "12", "2"]).0, Ok(expected));
        assert!(matches!(
            parse(&["answer", "math", "0", "A"]).0,
            Err(ArgsError::InvalidValue { name: "id", .. })
        ));
    }

    #[test]
    fn flags_override_config_anywhere() {
        let (command, config) = parse(&[
            "--bank",
            "https://example.org/banks",
            "list",
            "rla",
            "incorrect",
            "--namespace",
            "ged",
        ]);
        assert_eq!(
            command,
            Ok(Command::List {
                subject: Subject::new("rla").unwrap(),
                status: AnswerStatus::Incorrect,
            })
        );
        assert_eq!(config.bank, "https://example.org/banks");
        assert_eq!(config.namespace.as_deref(), Some("ged"));
    }

    #[test]
    fn command_specific_flags_are_checked() {
        assert_eq!(
            parse(&["export", "--out", "backup.json"]).0,
            Ok(Command::Export {
                out: Some(PathBuf::from("backup.json"))
            })
        );
        assert_eq!(
            parse(&["reconcile", "--check"]).0,
            Ok(Command::Reconcile { check_only: true })
        );
        assert_eq!(
            parse(&["progress", "--check"]).0,
            Err(ArgsError::UnknownArg("--check".into()))
        );
    }

    #[test]
    fn malformed_invocations_are_rejected() {
        assert_eq!(
            parse(&["answer", "math"]).0,
            Err(ArgsError::MissingArgument {
                command: "answer",
                name: "id"
            })
        );
        assert_eq!(
            parse(&["frobnicate"]).0,
            Err(ArgsError::UnknownCommand("frobnicate".into()))
        );
        assert_eq!(
            parse(&["stats", "math", "extra"]).0,
            Err(ArgsError::UnknownArg("extra".into()))
        );
        assert_eq!(
            parse(&["--db"]).0,
            Err(ArgsError::MissingValue { flag: "--db" })
        );
        assert_eq!(
            parse(&["quiz", "start", "science"]).0,
            Ok(Command::Quiz(QuizAction::Start(Subject::new("science").unwrap())))
        );
    }
}
