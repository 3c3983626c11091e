// core/src/engine.rs
//
// Public autocomplete entry point: picks a prefix index by query length and
// falls back to filtering the deepest bucket for longer queries.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::Config;
use crate::error::{AutocompleteError, Result};
use crate::record::{prefix_of, RankKey, RecordId};
use crate::store::RankingStore;

/// Queries shorter than this many characters are rejected.
pub const MIN_QUERY_LEN: usize = 3;

const MULTI_DEPTHS: [usize; 3] = [3, 4, 5];
const SINGLE_DEPTHS: [usize; 1] = [3];

/// Which prefix indices get built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexMode {
    /// 3-, 4- and 5-character indices; only queries longer than 5 are filtered.
    #[default]
    MultiDepth,
    /// Only the 3-character index; every longer query is filtered.
    SingleDepth,
}

impl IndexMode {
    pub fn depths(self) -> &'static [usize] {
        match self {
            IndexMode::MultiDepth => &MULTI_DEPTHS,
            IndexMode::SingleDepth => &SINGLE_DEPTHS,
        }
    }

    /// Length of the longest prefix that has its own index.
    pub fn deepest(self) -> usize {
        self.depths().last().copied().unwrap_or(MIN_QUERY_LEN)
    }
}

/// One lookup result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Suggestion {
    pub text: Arc<str>,
    pub rank: i64,
}

impl Suggestion {
    fn from_entry((key, _): (&RankKey, RecordId)) -> Self {
        Self {
            text: Arc::clone(key.shared_text()),
            rank: key.rank(),
        }
    }
}

/// In-memory autocomplete index over popularity-ranked phrases.
///
/// # Example
/// ```
/// use autocomplete_core::{Autocomplete, IndexMode};
///
/// let mut ac = Autocomplete::new(IndexMode::MultiDepth);
/// ac.upsert("zzz one", 1);
/// ac.upsert("zzz two", 9);
///
/// let top = ac.lookup("zzz", 2).unwrap();
/// assert_eq!(&*top[0].text, "zzz two");
/// assert_eq!(&*top[1].text, "zzz one");
/// ```
#[derive(Debug, Clone)]
pub struct Autocomplete {
    store: RankingStore,
    config: Config,
}

impl Autocomplete {
    pub fn new(mode: IndexMode) -> Self {
        Self::with_config(Config::default().with_index_mode(mode))
    }

    pub fn with_config(config: Config) -> Self {
        debug!(
            mode = ?config.index_mode,
            default_top_n = config.default_top_n,
            "building autocomplete"
        );
        Self {
            store: RankingStore::new(config.index_mode.depths()),
            config,
        }
    }

    /// Record a search for `text` worth `delta` popularity.
    ///
    /// `text` is expected to be normalized already (lowercase, trimmed, words
    /// separated by single spaces).
    pub fn upsert(&mut self, text: &str, delta: i64) {
        self.store.upsert(text, delta);
    }

    /// Apply a batch of `(text, delta)` events and return how many were applied.
    pub fn ingest<I, S>(&mut self, events: I) -> usize
    where
        I: IntoIterator<Item = (S, i64)>,
        S: AsRef<str>,
    {
        let mut applied = 0;
        for (text, delta) in events {
            self.store.upsert(text.as_ref(), delta);
            applied += 1;
        }
        debug!(applied, records = self.store.record_count(), "ingested batch");
        applied
    }

    /// Up to `top_n` phrases matching `query`, most popular first.
    ///
    /// Queries up to the deepest indexed length are answered straight from
    /// that depth's bucket. Longer queries read the deepest bucket for the
    /// query's prefix and keep only records with an indexed word starting
    /// with the whole query; filtering preserves rank order.
    pub fn lookup(&self, query: &str, top_n: usize) -> Result<Vec<Suggestion>> {
        let query_len = query.chars().count();
        if query_len < MIN_QUERY_LEN {
            return Err(AutocompleteError::InvalidQuery {
                query: query.to_string(),
                min_len: MIN_QUERY_LEN,
            });
        }

        let depth = query_len.min(self.config.index_mode.deepest());
        let (Some(index), Some(prefix)) = (self.store.index(depth), prefix_of(query, depth)) else {
            return Ok(Vec::new());
        };

        if query_len == depth {
            return Ok(index.top_n(prefix, top_n).map(Suggestion::from_entry).collect());
        }

        let Some(bucket) = index.get(prefix) else {
            return Ok(Vec::new());
        };
        Ok(bucket
            .iter()
            .filter(|&(_, id)| self.store.record(id).matches_query(query))
            .take(top_n)
            .map(Suggestion::from_entry)
            .collect())
    }

    /// [`Self::lookup`] with the configured default result count.
    pub fn suggest(&self, query: &str) -> Result<Vec<Suggestion>> {
        self.lookup(query, self.config.default_top_n)
    }

    /// Number of distinct phrases stored.
    pub fn record_count(&self) -> usize {
        self.store.record_count()
    }

    pub fn mode(&self) -> IndexMode {
        self.config.index_mode
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn store(&self) -> &RankingStore {
        &self.store
    }
}

impl Default for Autocomplete {
    fn default() -> Self {
        Self::with_config(Config::default())
    }
}
