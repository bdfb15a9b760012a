use std::fmt;

use guessr_core::model::{CatalogSnapshot, CategoryEntry, CategoryId, ItemId};
use storage::repository::Storage;

/// National dex ranges per generation, used to seed a snapshot without the network.
const GENERATION_RANGES: [(u32, u32, u32); 9] = [
    (1, 1, 151),
    (2, 152, 251),
    (3, 252, 386),
    (4, 387, 493),
    (5, 494, 649),
    (6, 650, 721),
    (7, 722, 809),
    (8, 810, 905),
    (9, 906, 1025),
];

#[derive(Debug, Clone)]
struct Args {
    db_url: String,
    categories: Vec<u32>,
}

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidDbUrl { raw: String },
    InvalidCategories { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::InvalidCategories { raw } => {
                write!(f, "invalid --categories value (expected e.g. 1,2,5): {raw}")
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

fn parse_categories(raw: &str) -> Result<Vec<u32>, ArgsError> {
    let parsed: Result<Vec<u32>, _> = raw.split(',').map(|part| part.trim().parse()).collect();
    match parsed {
        Ok(values)
            if !values.is_empty()
                && values
                    .iter()
                    .all(|v| GENERATION_RANGES.iter().any(|(g, _, _)| g == v)) =>
        {
            Ok(values)
        }
        _ => Err(ArgsError::InvalidCategories {
            raw: raw.to_owned(),
        }),
    }
}

impl Args {
    fn parse() -> Result<Self, ArgsError> {
        let mut db_url = std::env::var("GUESSR_DB_URL")
            .unwrap_or_else(|_| "sqlite://guessr.sqlite3".into());
        let mut categories: Vec<u32> = GENERATION_RANGES.iter().map(|(g, _, _)| *g).collect();

        let mut args = std::env::args().skip(1);
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(&mut args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = value;
                }
                "--categories" => {
                    let value = require_value(&mut args, "--categories")?;
                    categories = parse_categories(&value)?;
                }
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Self { db_url, categories })
    }
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p storage --bin seed -- [options]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --db <sqlite_url>         SQLite URL (default: sqlite://guessr.sqlite3)");
    eprintln!("  --categories <list>       Generations to seed, comma separated (default: 1-9)");
    eprintln!("  -h, --help                Show this help");
    eprintln!();
    eprintln!("Environment (same as flags):");
    eprintln!("  GUESSR_DB_URL");
}

fn build_snapshot(categories: &[u32]) -> CatalogSnapshot {
    let entries = GENERATION_RANGES
        .iter()
        .filter(|(generation, _, _)| categories.contains(generation))
        .map(|&(generation, first, last)| CategoryEntry {
            category: CategoryId::new(generation),
            ids: (first..=last).map(ItemId::new).collect(),
        })
        .collect();
    CatalogSnapshot::new(entries)
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse().map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    let storage = Storage::sqlite(&args.db_url).await?;
    let snapshot = build_snapshot(&args.categories);
    storage.catalog.save_snapshot(&snapshot).await?;

    let total: usize = snapshot.entries().iter().map(|entry| entry.ids.len()).sum();
    println!(
        "Seeded {} categories ({total} items) into {}",
        snapshot.entries().len(),
        args.db_url
    );

    Ok(())
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}
