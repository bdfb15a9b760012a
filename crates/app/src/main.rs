use std::fmt;

use guessr_core::model::{CatalogSettingsDraft, CategoryId, Mode, TARGET_COUNT_OPTIONS};
use services::{AppServices, Clock};
use tracing::debug;
use tracing_subscriber::EnvFilter;

mod commands;

use commands::SettingsChanges;

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidDbUrl { raw: String },
    InvalidNumber { flag: &'static str, raw: String },
    InvalidValue { flag: &'static str, source: guessr_core::Error },
    NotApplicable { flag: &'static str, command: &'static str },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::InvalidNumber { flag, raw } => write!(f, "invalid {flag} value: {raw}"),
            ArgsError::InvalidValue { flag, source } => write!(f, "invalid {flag} value: {source}"),
            ArgsError::NotApplicable { flag, command } => {
                write!(f, "{flag} has no effect on `{command}`")
            }
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

fn parse_number(flag: &'static str, raw: String) -> Result<u32, ArgsError> {
    raw.trim()
        .parse()
        .map_err(|_| ArgsError::InvalidNumber {
            flag,
            raw: raw.clone(),
        })
}

fn parse_categories(raw: &str) -> Result<Vec<u32>, ArgsError> {
    raw.split(',')
        .map(|part| {
            part.trim()
                .parse::<CategoryId>()
                .map(|id| id.value())
                .map_err(|err| ArgsError::InvalidValue {
                    flag: "--categories",
                    source: err.into(),
                })
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Play,
    InitCatalog,
    Stats,
    Settings,
}

impl Command {
    fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "play" => Some(Self::Play),
            "init-catalog" => Some(Self::InitCatalog),
            "stats" => Some(Self::Stats),
            "settings" => Some(Self::Settings),
            _ => None,
        }
    }

    fn name(self) -> &'static str {
        match self {
            Self::Play => "play",
            Self::InitCatalog => "init-catalog",
            Self::Stats => "stats",
            Self::Settings => "settings",
        }
    }
}

struct Args {
    db_url: String,
    catalog: CatalogSettingsDraft,
    verbose: bool,
    seed: Option<u64>,
    refresh: bool,
    details: bool,
    changes: SettingsChanges,
}

impl Args {
    fn parse(args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut parsed = Self {
            db_url: std::env::var("GUESSR_DB_URL")
                .ok()
                .map_or_else(|| "sqlite://guessr.sqlite3".into(), normalize_sqlite_url),
            catalog: CatalogSettingsDraft {
                base_url: std::env::var("GUESSR_CATALOG_URL").ok(),
                language: std::env::var("GUESSR_LANGUAGE").ok(),
            },
            verbose: false,
            seed: None,
            refresh: false,
            details: false,
            changes: SettingsChanges::default(),
        };

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    parsed.db_url = normalize_sqlite_url(value);
                }
                "--catalog-url" => {
                    parsed.catalog.base_url = Some(require_value(args, "--catalog-url")?);
                }
                "--lang" => parsed.catalog.language = Some(require_value(args, "--lang")?),
                "--categories" => {
                    let value = require_value(args, "--categories")?;
                    parsed.changes.categories = Some(parse_categories(&value)?);
                }
                "--count" => {
                    let value = require_value(args, "--count")?;
                    parsed.changes.target_count = Some(parse_number("--count", value)?);
                }
                "--max-attempts" => {
                    let value = require_value(args, "--max-attempts")?;
                    parsed.changes.max_attempts = Some(parse_number("--max-attempts", value)?);
                }
                "--mode" => {
                    let value = require_value(args, "--mode")?;
                    let mode = value
                        .parse::<Mode>()
                        .map_err(|err| ArgsError::InvalidValue {
                            flag: "--mode",
                            source: err.into(),
                        })?;
                    parsed.changes.mode = Some(mode);
                }
                "--seed" => {
                    let value = require_value(args, "--seed")?;
                    let seed = value
                        .trim()
                        .parse::<u64>()
                        .map_err(|_| ArgsError::InvalidNumber {
                            flag: "--seed",
                            raw: value.clone(),
                        })?;
                    parsed.seed = Some(seed);
                }
                "--refresh" => parsed.refresh = true,
                "--details" => parsed.details = true,
                "--verbose" | "-v" => parsed.verbose = true,
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(parsed)
    }

    /// Reject flags the chosen command would silently ignore.
    fn check_applicable(&self, cmd: Command) -> Result<(), ArgsError> {
        const SESSION: &[Command] = &[Command::Play, Command::Settings];
        let changes = &self.changes;
        let given: [(&'static str, bool, &[Command]); 7] = [
            ("--categories", changes.categories.is_some(), SESSION),
            ("--count", changes.target_count.is_some(), SESSION),
            ("--max-attempts", changes.max_attempts.is_some(), SESSION),
            ("--mode", changes.mode.is_some(), SESSION),
            ("--seed", self.seed.is_some(), &[Command::Play]),
            ("--refresh", self.refresh, &[Command::InitCatalog]),
            ("--details", self.details, &[Command::Stats]),
        ];
        for (flag, present, allowed) in given {
            if present && !allowed.contains(&cmd) {
                return Err(ArgsError::NotApplicable {
                    flag,
                    command: cmd.name(),
                });
            }
        }
        Ok(())
    }
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  guessr [play]        [settings]  Play a session; settings flags apply to it only");
    eprintln!("  guessr init-catalog  [--refresh] Fetch and store the catalog snapshot");
    eprintln!("  guessr stats         [--details] Show progress per category");
    eprintln!("  guessr settings      [settings]  Show or change session settings");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --db <sqlite_url>         SQLite URL (default: sqlite://guessr.sqlite3)");
    eprintln!("  --catalog-url <url>       Catalog API base URL (default: https://pokeapi.co/api/v2)");
    eprintln!("  --lang <code>             Language of expected names (default: fr)");
    eprintln!("  --seed <n>                Fixed seed for item selection (play only)");
    eprintln!("  -v, --verbose             Debug logging");
    eprintln!();
    eprintln!("Settings:");
    eprintln!("  --categories <list>       Categories, comma separated, 1-9");
    eprintln!(
        "  --count <n>               Items per session (common: {})",
        TARGET_COUNT_OPTIONS.map(|count| count.to_string()).join(", ")
    );
    eprintln!("  --max-attempts <n>        Tries per item before it counts as missed");
    eprintln!("  --mode <mode>             normal | revision | progressive");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  GUESSR_DB_URL, GUESSR_CATALOG_URL, GUESSR_LANGUAGE, GUESSR_LOG (or RUST_LOG)");
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

/// Make sure the directory holding the database file exists.
fn prepare_sqlite_dir(db_url: &str) -> Result<(), Box<dyn std::error::Error>> {
    let Some(path) = db_url.strip_prefix("sqlite://") else {
        return Ok(());
    };
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        return Err(ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        }
        .into());
    }
    if let Some(parent) = std::path::Path::new(path).parent() {
        std::fs::create_dir_all(parent)?;
    }
    Ok(())
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        std::env::var("GUESSR_LOG")
            .or_else(|_| std::env::var("RUST_LOG"))
            .map_or_else(|_| EnvFilter::new("warn"), EnvFilter::new)
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv: Vec<String> = std::env::args().skip(1).collect();

    let cmd = match argv.first().map(String::as_str) {
        None => Command::Play,
        Some("--help" | "-h") => {
            print_usage();
            return Ok(());
        }
        Some(first) if first.starts_with('-') => Command::Play,
        Some(first) => Command::from_arg(first).ok_or_else(|| {
            eprintln!("unknown subcommand: {first}");
            print_usage();
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "unknown subcommand")
        })?,
    };
    if argv.first().is_some_and(|first| !first.starts_with('-')) {
        argv.remove(0);
    }

    let args = Args::parse(&mut argv.into_iter())
        .and_then(|args| args.check_applicable(cmd).map(|()| args))
        .map_err(|e| {
            eprintln!("{e}");
            print_usage();
            e
        })?;
    init_tracing(args.verbose);

    let catalog = args
        .catalog
        .clone()
        .validate()
        .map_err(guessr_core::Error::from)?;
    prepare_sqlite_dir(&args.db_url)?;
    let mut app = AppServices::new_sqlite(&args.db_url, Clock::system(), catalog).await?;
    if let Some(seed) = args.seed {
        app = app.with_session_seed(seed);
    }
    debug!(db = %args.db_url, command = ?cmd, "services ready");

    match cmd {
        Command::Play => commands::play(&app, args.changes).await,
        Command::InitCatalog => commands::init_catalog(&app, args.refresh).await,
        Command::Stats => commands::stats(&app, args.details).await,
        Command::Settings => commands::settings(&app, args.changes).await,
    }
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}
