use std::fmt;

use services::{AppServices, Clock, LeaderboardService};
use workshop_core::model::{LeaderboardEntryDraft, WorkshopSettings};

mod interactive;

#[derive(Debug, PartialEq, Eq)]
enum ArgsError {
    MissingValue { flag: &'static str },
    MissingFlag { flag: &'static str },
    UnknownArg(String),
    InvalidNumber { flag: &'static str, raw: String },
    InvalidDbUrl { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::MissingFlag { flag } => write!(f, "{flag} is required"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidNumber { flag, raw } => write!(f, "invalid {flag} value: {raw}"),
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

fn parse_number<T: std::str::FromStr>(flag: &'static str, raw: &str) -> Result<T, ArgsError> {
    raw.trim().parse().map_err(|_| ArgsError::InvalidNumber {
        flag,
        raw: raw.to_string(),
    })
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  workshop run         [--db <sqlite_url>] [--distraction-secs <n>] [--seed <n>]");
    eprintln!("  workshop leaderboard [--db <sqlite_url>] [--limit <n>]");
    eprintln!("  workshop submit      --name <name> --email <email> --score <n> [--db <sqlite_url>]");
    eprintln!();
    eprintln!("Defaults:");
    eprintln!("  --db sqlite:workshop.sqlite3");
    eprintln!("  --distraction-secs {}", WorkshopSettings::DEFAULT_DISTRACTION_SECS);
    eprintln!("  --limit {}", LeaderboardService::DEFAULT_LIMIT);
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  WORKSHOP_DB_URL, WORKSHOP_DISTRACTION_SECS, WORKSHOP_SEED, RUST_LOG");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Run,
    Leaderboard,
    Submit,
}

impl Command {
    fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "run" => Some(Self::Run),
            "leaderboard" => Some(Self::Leaderboard),
            "submit" => Some(Self::Submit),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct RunArgs {
    db_url: String,
    distraction_secs: u64,
    seed: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct LeaderboardArgs {
    db_url: String,
    limit: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct SubmitArgs {
    db_url: String,
    name: String,
    email: String,
    score: String,
}

/// Environment lookup, injectable for tests.
type Env<'a> = &'a dyn Fn(&str) -> Option<String>;

fn default_db_url(env: Env<'_>) -> String {
    env("WORKSHOP_DB_URL").map_or_else(
        || normalize_sqlite_url("sqlite:workshop.sqlite3".into()),
        normalize_sqlite_url,
    )
}

fn parse_db(args: &mut impl Iterator<Item = String>) -> Result<String, ArgsError> {
    let value = require_value(args, "--db")?;
    if value.trim().is_empty() {
        return Err(ArgsError::InvalidDbUrl { raw: value });
    }
    Ok(normalize_sqlite_url(value))
}

impl RunArgs {
    fn parse(args: &mut impl Iterator<Item = String>, env: Env<'_>) -> Result<Self, ArgsError> {
        let mut db_url = default_db_url(env);
        let mut distraction_secs = match env("WORKSHOP_DISTRACTION_SECS") {
            Some(raw) => parse_number("WORKSHOP_DISTRACTION_SECS", &raw)?,
            None => WorkshopSettings::DEFAULT_DISTRACTION_SECS,
        };
        let mut seed = env("WORKSHOP_SEED")
            .map(|raw| parse_number("WORKSHOP_SEED", &raw))
            .transpose()?;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => db_url = parse_db(args)?,
                "--distraction-secs" => {
                    let value = require_value(args, "--distraction-secs")?;
                    distraction_secs = parse_number("--distraction-secs", &value)?;
                }
                "--seed" => {
                    let value = require_value(args, "--seed")?;
                    seed = Some(parse_number("--seed", &value)?);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Self {
            db_url,
            distraction_secs,
            seed,
        })
    }
}

impl LeaderboardArgs {
    fn parse(args: &mut impl Iterator<Item = String>, env: Env<'_>) -> Result<Self, ArgsError> {
        let mut db_url = default_db_url(env);
        let mut limit = LeaderboardService::DEFAULT_LIMIT;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => db_url = parse_db(args)?,
                "--limit" => {
                    let value = require_value(args, "--limit")?;
                    limit = parse_number("--limit", &value)?;
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Self { db_url, limit })
    }
}

impl SubmitArgs {
    fn parse(args: &mut impl Iterator<Item = String>, env: Env<'_>) -> Result<Self, ArgsError> {
        let mut db_url = default_db_url(env);
        let (mut name, mut email, mut score) = (None, None, None);

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => db_url = parse_db(args)?,
                "--name" => name = Some(require_value(args, "--name")?),
                "--email" => email = Some(require_value(args, "--email")?),
                "--score" => score = Some(require_value(args, "--score")?),
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        // Field contents are validated by the leaderboard service.
        Ok(Self {
            db_url,
            name: name.ok_or(ArgsError::MissingFlag { flag: "--name" })?,
            email: email.ok_or(ArgsError::MissingFlag { flag: "--email" })?,
            score: score.ok_or(ArgsError::MissingFlag { flag: "--score" })?,
        })
    }
}

fn normalize_sqlite_url(raw: String) -> String {
    if raw == "sqlite::memory:" || raw.starts_with("sqlite://") {
        return raw;
    }

    let trimmed = raw.trim().to_string();
    let path_str = trimmed
        .strip_prefix("sqlite:")
        .unwrap_or(trimmed.as_str())
        .to_string();
    let path = std::path::Path::new(&path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| std::path::PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

fn prepare_sqlite_file(db_url: &str) -> Result<(), Box<dyn std::error::Error>> {
    if db_url == "sqlite::memory:" {
        return Ok(());
    }

    let path = db_url
        .strip_prefix("sqlite://")
        .ok_or_else(|| ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        })?;
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        return Err(ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        }
        .into());
    }

    let path = std::path::Path::new(path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    if !path.exists() {
        std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)?;
    }

    Ok(())
}

async fn open_services(
    db_url: &str,
    settings: WorkshopSettings,
) -> Result<AppServices, Box<dyn std::error::Error>> {
    prepare_sqlite_file(db_url)?;
    Ok(AppServices::new_sqlite(db_url, Clock::system(), settings).await?)
}

fn init_logging() {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    // stdout belongs to the interactive prompts.
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true),
        )
        .init();
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv: Vec<String> = std::env::args().skip(1).collect();

    // No subcommand plays the workshop.
    let cmd = match argv.first().map(String::as_str) {
        None => Command::Run,
        Some("--help" | "-h") => {
            print_usage();
            return Ok(());
        }
        Some(first) if first.starts_with("--") => Command::Run,
        Some(first) => Command::from_arg(first).ok_or_else(|| {
            eprintln!("unknown subcommand: {first}");
            print_usage();
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "unknown subcommand")
        })?,
    };
    if argv.first().is_some_and(|first| !first.starts_with("--")) {
        argv.remove(0);
    }
    if argv.iter().any(|a| a == "--help" || a == "-h") {
        print_usage();
        return Ok(());
    }

    tracing::debug!(command = ?cmd, "dispatching");
    let env = |key: &str| std::env::var(key).ok();
    let mut iter = argv.into_iter();
    let report = |e: ArgsError| {
        eprintln!("{e}");
        print_usage();
        e
    };

    match cmd {
        Command::Run => {
            let parsed = RunArgs::parse(&mut iter, &env).map_err(report)?;
            let settings = WorkshopSettings::new(parsed.distraction_secs, parsed.seed, true)?;
            let services = open_services(&parsed.db_url, settings).await?;
            interactive::play(&services).await
        }
        Command::Leaderboard => {
            let parsed = LeaderboardArgs::parse(&mut iter, &env).map_err(report)?;
            let services = open_services(&parsed.db_url, WorkshopSettings::default()).await?;
            let entries = services.leaderboard().list(parsed.limit).await?;
            if entries.is_empty() {
                println!("No leaderboard entries yet.");
            }
            for (rank, entry) in entries.iter().enumerate() {
                println!(
                    "{:>3}. {:<24} {:>5}  {}",
                    rank + 1,
                    entry.name,
                    entry.score,
                    entry.created_at.format("%Y-%m-%d %H:%M")
                );
            }
            Ok(())
        }
        Command::Submit => {
            let parsed = SubmitArgs::parse(&mut iter, &env).map_err(report)?;
            let services = open_services(&parsed.db_url, WorkshopSettings::default()).await?;
            let draft = LeaderboardEntryDraft::new(parsed.name, parsed.email, parsed.score);
            let entry = services.leaderboard().submit(draft).await?;
            println!("Added {} with score {} (entry {}).", entry.name, entry.score, entry.id);
            Ok(())
        }
    }
}

#[tokio::main]
async fn main() {
    init_logging();
    if let Err(err) = run().await {
        tracing::error!(error = %err, "workshop exited with an error");
        eprintln!("{err}");
        std::process::exit(2);
    }
}
