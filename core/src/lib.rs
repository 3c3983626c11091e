//! autocomplete-core
//!
//! In-memory autocomplete index: ingests search phrases with popularity
//! deltas and answers prefix queries with the most popular matching phrases.
//!
//! Every phrase is stored once, as a [`Record`], and referenced from one
//! rank-ordered bucket per indexed-word prefix in each fixed-depth
//! [`PrefixIndex`]. Rank updates move the record in every bucket it belongs
//! to, so indices never need rebuilding.
//!
//! Public API:
//! - `Autocomplete` - upsert / lookup entry point with single- or multi-depth indexing
//! - `SharedAutocomplete` - `Arc<RwLock<_>>` handle for concurrent readers and writers
//! - `RankingStore` - record arena plus membership bookkeeping
//! - `PrefixIndex` - prefix -> rank-ordered bucket map for one depth
//! - `Record` - phrase, rank and indexed words
//! - `Config` - configuration loadable from TOML

pub mod record;
pub use record::{RankKey, Record, RecordId, MAX_INDEXED_WORDS, MIN_WORD_LEN};

pub mod prefix_index;
pub use prefix_index::{Bucket, PrefixIndex};

pub mod store;
pub use store::{Membership, RankingStore, StoreStats};

pub mod engine;
pub use engine::{Autocomplete, IndexMode, Suggestion, MIN_QUERY_LEN};

pub mod shared;
pub use shared::SharedAutocomplete;

pub mod config;
pub use config::Config;

pub mod error;
pub use error::{AutocompleteError, Result};
