use std::io::{self, BufRead};
use std::path::PathBuf;

use anyhow::{Context, Result};
use autocomplete_core::{Autocomplete, AutocompleteError, Config, IndexMode};
use clap::{Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

mod replay;

use replay::ReplayOptions;

#[derive(Parser)]
#[command(name = "autocomplete")]
#[command(about = "In-memory phrase autocomplete driven by search popularity")]
#[command(version)]
struct Cli {
    /// TOML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Build only the 3-letter index (overrides the config file)
    #[arg(long, global = true)]
    single_depth: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive mode: `+<delta> <phrase>` records a search, anything else is a query
    Repl,
    /// Replay a search log, alternating upsert and lookup batches
    Replay {
        /// Searches, one per line, optionally `phrase<TAB>delta`
        #[arg(short, long)]
        searches: PathBuf,
        /// Queries to cycle through during lookup batches
        #[arg(short, long)]
        queries: Option<PathBuf>,
        /// Searches to ingest before the first cycle
        #[arg(long, default_value_t = 0)]
        preload: usize,
        #[arg(long, default_value_t = 30_000)]
        batch_upserts: usize,
        #[arg(long, default_value_t = 90_000)]
        batch_lookups: usize,
        /// Stop after this many cycles (default: until the search log runs out)
        #[arg(long)]
        cycles: Option<usize>,
    },
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();
}

fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = match &cli.config {
        Some(path) => Config::load_toml(path)
            .with_context(|| format!("load config {}", path.display()))?,
        None => Config::default(),
    };
    if cli.single_depth {
        config.index_mode = IndexMode::SingleDepth;
    }
    debug!(?config, "configuration");
    Ok(config)
}

/// `+<delta> <phrase>` → `Some((phrase, delta))`.
fn parse_upsert(line: &str) -> Option<(&str, i64)> {
    let rest = line.strip_prefix('+')?;
    let (delta, phrase) = rest.split_once(' ')?;
    let delta = delta.parse::<i64>().ok()?;
    Some((phrase.trim(), delta))
}

fn run_repl(mut ac: Autocomplete) -> Result<()> {
    eprintln!(
        "autocomplete REPL ({:?}) - `+<delta> <phrase>` to record, anything else to look up",
        ac.mode()
    );
    eprintln!("Ctrl-D to exit.");

    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let line = line.context("read stdin")?;
        let input = line.trim();
        if input.is_empty() {
            continue;
        }
        if let Some((phrase, delta)) = parse_upsert(input) {
            ac.upsert(phrase, delta);
            println!("ok ({} records)", ac.record_count());
            continue;
        }
        match ac.suggest(input) {
            Ok(results) => println!("{}", serde_json::to_string(&results)?),
            Err(err @ AutocompleteError::InvalidQuery { .. }) => eprintln!("{err}"),
            Err(err) => return Err(err.into()),
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let config = load_config(&cli)?;
    let mut ac = Autocomplete::with_config(config);

    match cli.command {
        Commands::Repl => run_repl(ac),
        Commands::Replay {
            searches,
            queries,
            preload,
            batch_upserts,
            batch_lookups,
            cycles,
        } => replay::run(
            &mut ac,
            &ReplayOptions {
                searches,
                queries,
                preload,
                batch_upserts,
                batch_lookups,
                cycles,
            },
        ),
    }
}
