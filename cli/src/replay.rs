//! Replay a search log against the index: preload, then alternate upsert and
//! lookup batches and report timings per cycle.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use autocomplete_core::{Autocomplete, Suggestion, MIN_QUERY_LEN};
use tracing::{info, warn};

type SearchLines = std::iter::Enumerate<std::io::Lines<BufReader<File>>>;

/// Popularity deltas handed out round-robin to search lines without one.
const TYPICAL_DELTAS: [i64; 11] = [1, 1, 1, 1, 1, 2, 2, 2, 3, 3, 10];

pub struct ReplayOptions {
    pub searches: PathBuf,
    pub queries: Option<PathBuf>,
    pub preload: usize,
    pub batch_upserts: usize,
    pub batch_lookups: usize,
    pub cycles: Option<usize>,
}

/// A search line is `text` or `text<TAB>delta`.
fn parse_search(line: &str, deltas: &mut impl Iterator<Item = i64>) -> Result<(String, i64)> {
    match line.split_once('\t') {
        Some((text, delta)) => {
            let delta = delta
                .trim()
                .parse::<i64>()
                .with_context(|| format!("bad delta {delta:?}"))?;
            Ok((text.to_string(), delta))
        }
        None => Ok((line.to_string(), deltas.next().unwrap_or(1))),
    }
}

fn read_queries(path: &Path) -> Result<Vec<String>> {
    let file = File::open(path).with_context(|| format!("open queries {}", path.display()))?;
    let mut queries = Vec::new();
    let mut skipped = 0usize;
    for line in BufReader::new(file).lines() {
        let line = line.context("read queries")?;
        if line.chars().count() < MIN_QUERY_LEN {
            skipped += 1;
            continue;
        }
        queries.push(line);
    }
    if skipped > 0 {
        warn!(skipped, "dropped queries shorter than {MIN_QUERY_LEN} characters");
    }
    Ok(queries)
}

pub fn run(ac: &mut Autocomplete, opts: &ReplayOptions) -> Result<()> {
    if opts.batch_upserts == 0 {
        bail!("--batch-upserts must be at least 1");
    }
    let file = File::open(&opts.searches)
        .with_context(|| format!("open searches {}", opts.searches.display()))?;
    let mut lines = BufReader::new(file).lines().enumerate();
    let mut deltas = TYPICAL_DELTAS.iter().copied().cycle();

    let mut next_search = |lines: &mut SearchLines| -> Result<Option<(String, i64)>> {
        match lines.next() {
            Some((no, line)) => {
                let line = line.context("read searches")?;
                parse_search(&line, &mut deltas)
                    .with_context(|| format!("searches line {}", no + 1))
                    .map(Some)
            }
            None => Ok(None),
        }
    };

    let started = Instant::now();
    let mut preloaded = 0;
    while preloaded < opts.preload {
        let Some((text, delta)) = next_search(&mut lines)? else {
            break;
        };
        ac.upsert(&text, delta);
        preloaded += 1;
    }
    info!(
        preloaded,
        records = ac.record_count(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "preload complete"
    );

    let queries = match &opts.queries {
        Some(path) => read_queries(path)?,
        None => Vec::new(),
    };
    let mut query_cursor = queries.iter().cycle();

    let mut cycle = 0usize;
    loop {
        if opts.cycles.is_some_and(|max| cycle >= max) {
            break;
        }
        cycle += 1;

        let upsert_started = Instant::now();
        let mut upserts = 0;
        while upserts < opts.batch_upserts {
            let Some((text, delta)) = next_search(&mut lines)? else {
                break;
            };
            ac.upsert(&text, delta);
            upserts += 1;
        }
        let upsert_time = upsert_started.elapsed();

        let lookup_started = Instant::now();
        let mut last: Option<(&str, Vec<Suggestion>)> = None;
        let mut lookups = 0;
        if !queries.is_empty() {
            while lookups < opts.batch_lookups {
                let Some(query) = query_cursor.next() else {
                    break;
                };
                last = Some((query.as_str(), ac.suggest(query)?));
                lookups += 1;
            }
        }
        let lookup_time = lookup_started.elapsed();

        report_cycle(cycle, upserts, lookups, upsert_time, lookup_time, ac, last.as_ref())?;

        if upserts < opts.batch_upserts {
            info!(cycle, "search log exhausted");
            break;
        }
    }

    let stats = ac.store().stats();
    info!(
        records = stats.records,
        memberships = stats.memberships,
        prefixes = ?stats.prefixes_per_depth,
        "replay finished"
    );
    Ok(())
}

fn report_cycle(
    cycle: usize,
    upserts: usize,
    lookups: usize,
    upsert_time: Duration,
    lookup_time: Duration,
    ac: &Autocomplete,
    last: Option<&(&str, Vec<Suggestion>)>,
) -> Result<()> {
    let (last_query, last_result) = match last {
        Some((query, result)) => (*query, serde_json::to_string(result)?),
        None => ("", String::from("[]")),
    };
    info!(
        cycle,
        upserts,
        lookups,
        total_ms = (upsert_time + lookup_time).as_millis() as u64,
        upsert_ms = upsert_time.as_millis() as u64,
        lookup_ms = lookup_time.as_millis() as u64,
        records = ac.record_count(),
        last_query,
        last_result = %last_result,
        "cycle complete"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_line_with_explicit_delta() {
        let mut deltas = TYPICAL_DELTAS.iter().copied().cycle();
        let (text, delta) = parse_search("foo bar\t-4", &mut deltas).unwrap();
        assert_eq!(text, "foo bar");
        assert_eq!(delta, -4);
        // explicit deltas do not consume the round-robin table
        assert_eq!(deltas.next(), Some(1));
    }

    #[test]
    fn search_line_without_delta_uses_table() {
        let mut deltas = [7i64, 8].into_iter().cycle();
        assert_eq!(parse_search("abc", &mut deltas).unwrap(), ("abc".to_string(), 7));
        assert_eq!(parse_search("abd", &mut deltas).unwrap(), ("abd".to_string(), 8));
        assert_eq!(parse_search("abe", &mut deltas).unwrap(), ("abe".to_string(), 7));
    }

    #[test]
    fn empty_upsert_batch_is_rejected() {
        let opts = ReplayOptions {
            searches: PathBuf::from("searches.txt"),
            queries: None,
            preload: 0,
            batch_upserts: 0,
            batch_lookups: 10,
            cycles: None,
        };
        let err = run(&mut Autocomplete::default(), &opts).unwrap_err();
        assert!(err.to_string().contains("--batch-upserts"));
    }

    #[test]
    fn bad_delta_is_an_error() {
        let mut deltas = TYPICAL_DELTAS.iter().copied().cycle();
        assert!(parse_search("foo\tlots", &mut deltas).is_err());
    }
}
