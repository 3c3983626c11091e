//! Ranking store: canonical owner of every record and of its memberships.
//!
//! Each record is held once in an arena. Prefix-index buckets refer to it by
//! [`RecordId`] and share its text allocation. The store remembers, for every
//! record, the exact `(index, prefix)` pairs it was inserted under, so a rank
//! change can move the record in every bucket it occupies:
//!
//! 1. remove the entry under the old `(rank, text)` key,
//! 2. reinsert it under the new key,
//! 3. mutate the canonical rank.
//!
//! Memberships are fixed when the record is first inserted. Records are never
//! evicted, and rank is never clamped (it may go to zero or below).

use std::sync::Arc;

use ahash::AHashMap;
use tracing::trace;

use crate::prefix_index::PrefixIndex;
use crate::record::{prefix_of, RankKey, Record, RecordId, WordSpan};

/// One bucket a record currently sits in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Membership {
    /// Position of the prefix index in [`RankingStore::indices`].
    index: usize,
    /// The prefix key, as a byte span of the record's own text.
    prefix: WordSpan,
}

impl Membership {
    pub fn index(&self) -> usize {
        self.index
    }

    /// The prefix key this membership is stored under.
    pub fn prefix<'a>(&self, record: &'a Record) -> &'a str {
        &record.text()[self.prefix.range()]
    }
}

#[derive(Debug, Clone)]
struct Entry {
    record: Record,
    memberships: Vec<Membership>,
}

/// Diagnostic counters for a store.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StoreStats {
    pub records: usize,
    pub memberships: usize,
    /// `(depth, distinct prefixes)` per prefix index.
    pub prefixes_per_depth: Vec<(usize, usize)>,
}

#[derive(Debug, Clone)]
pub struct RankingStore {
    indices: Vec<PrefixIndex>,
    entries: Vec<Entry>,
    by_text: AHashMap<Arc<str>, RecordId>,
}

impl RankingStore {
    /// Create an empty store with one prefix index per entry of `depths`.
    pub fn new(depths: &[usize]) -> Self {
        Self {
            indices: depths.iter().map(|&depth| PrefixIndex::new(depth)).collect(),
            entries: Vec::new(),
            by_text: AHashMap::new(),
        }
    }

    /// Add `delta` to the rank of `text`, creating the record on first sight.
    pub fn upsert(&mut self, text: &str, delta: i64) -> RecordId {
        match self.by_text.get(text) {
            Some(&id) => {
                self.rerank(id, delta);
                id
            }
            None => self.insert_new(text, delta),
        }
    }

    fn insert_new(&mut self, text: &str, rank: i64) -> RecordId {
        let id = RecordId(self.entries.len());
        let record = Record::new(text, rank);
        let key = record.key();

        let mut memberships = Vec::new();
        for word in record.word_spans() {
            let word_text = &record.text()[word.range()];
            for (slot, index) in self.indices.iter_mut().enumerate() {
                let Some(prefix) = prefix_of(word_text, index.depth()) else {
                    continue;
                };
                index.insert(prefix, key.clone(), id);
                memberships.push(Membership {
                    index: slot,
                    prefix: WordSpan::new(word.start(), word.start() + prefix.len()),
                });
            }
        }

        trace!(text, rank, memberships = memberships.len(), "new record");
        self.by_text.insert(Arc::clone(record.shared_text()), id);
        self.entries.push(Entry {
            record,
            memberships,
        });
        id
    }

    fn rerank(&mut self, id: RecordId, delta: i64) {
        let entry = &mut self.entries[id.0];
        let old_key = entry.record.key();
        let new_rank = old_key.rank().saturating_add(delta);
        if new_rank == old_key.rank() {
            return;
        }
        let new_key = RankKey::new(new_rank, Arc::clone(old_key.shared_text()));

        for membership in &entry.memberships {
            let prefix = membership.prefix(&entry.record);
            let index = &mut self.indices[membership.index];
            let removed = index.remove(prefix, &old_key);
            debug_assert!(removed, "stale membership for {:?} under {prefix:?}", old_key.text());
            index.insert(prefix, new_key.clone(), id);
        }

        trace!(
            text = old_key.text(),
            from = old_key.rank(),
            to = new_rank,
            "rank moved"
        );
        entry.record.set_rank(new_rank);
    }

    pub fn record(&self, id: RecordId) -> &Record {
        &self.entries[id.0].record
    }

    pub fn get(&self, text: &str) -> Option<&Record> {
        self.by_text.get(text).map(|&id| self.record(id))
    }

    pub fn id_of(&self, text: &str) -> Option<RecordId> {
        self.by_text.get(text).copied()
    }

    pub fn rank_of(&self, text: &str) -> Option<i64> {
        self.get(text).map(Record::rank)
    }

    pub fn memberships(&self, id: RecordId) -> &[Membership] {
        &self.entries[id.0].memberships
    }

    pub fn indices(&self) -> &[PrefixIndex] {
        &self.indices
    }

    /// The prefix index keyed by `depth`-character prefixes, if built.
    pub fn index(&self, depth: usize) -> Option<&PrefixIndex> {
        self.indices.iter().find(|index| index.depth() == depth)
    }

    /// All records in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (RecordId, &Record)> + '_ {
        self.entries
            .iter()
            .enumerate()
            .map(|(i, entry)| (RecordId(i), &entry.record))
    }

    /// Number of distinct phrases stored.
    pub fn record_count(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stats(&self) -> StoreStats {
        StoreStats {
            records: self.entries.len(),
            memberships: self.entries.iter().map(|e| e.memberships.len()).sum(),
            prefixes_per_depth: self
                .indices
                .iter()
                .map(|index| (index.depth(), index.prefix_count()))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEPTHS: &[usize] = &[3, 4, 5];

    /// Every membership must point at a bucket entry carrying the record's
    /// current rank.
    fn assert_consistent(store: &RankingStore) {
        for (id, record) in store.iter() {
            for membership in store.memberships(id) {
                let index = &store.indices()[membership.index()];
                let prefix = membership.prefix(record);
                let bucket = index.get(prefix).expect("membership without bucket");
                let found: Vec<i64> = bucket
                    .iter()
                    .filter(|(_, entry_id)| *entry_id == id)
                    .map(|(key, _)| key.rank())
                    .collect();
                assert!(!found.is_empty(), "{:?} missing from {prefix:?}", record.text());
                assert!(found.iter().all(|&rank| rank == record.rank()));
            }
        }
    }

    #[test]
    fn new_record_joins_each_depth_it_reaches() {
        let mut store = RankingStore::new(DEPTHS);
        let id = store.upsert("abcd xy fooba", 3);

        let prefixes: Vec<(usize, &str)> = store
            .memberships(id)
            .iter()
            .map(|m| (store.indices()[m.index()].depth(), m.prefix(store.record(id))))
            .collect();
        assert_eq!(
            prefixes,
            vec![(3, "abc"), (4, "abcd"), (3, "foo"), (4, "foob"), (5, "fooba")]
        );
        assert_consistent(&store);
    }

    #[test]
    fn repeated_upsert_accumulates_and_keeps_one_record() {
        let mut store = RankingStore::new(DEPTHS);
        let first = store.upsert("abcdefg foobar", 6);
        let second = store.upsert("abcdefg foobar", 4);

        assert_eq!(first, second);
        assert_eq!(store.id_of("abcdefg foobar"), Some(first));
        assert_eq!(store.id_of("abcdefg"), None);
        assert_eq!(store.record_count(), 1);
        assert_eq!(store.rank_of("abcdefg foobar"), Some(10));
        assert_eq!(store.index(3).map(|i| i.bucket_len("abc")), Some(1));
        assert_consistent(&store);
    }

    #[test]
    fn ids_follow_arena_order() {
        let mut store = RankingStore::new(DEPTHS);
        let a = store.upsert("first phrase", 1);
        let b = store.upsert("second phrase", 1);
        store.upsert("first phrase", 1);

        assert_eq!((a.index(), b.index()), (0, 1));
        let order: Vec<usize> = store.iter().map(|(id, _)| id.index()).collect();
        assert_eq!(order, vec![0, 1]);
        assert_eq!(store.record(b).text(), "second phrase");
    }

    #[test]
    fn negative_rank_is_kept() {
        let mut store = RankingStore::new(DEPTHS);
        store.upsert("minus", 2);
        store.upsert("minus", -5);
        assert_eq!(store.rank_of("minus"), Some(-3));
        assert_consistent(&store);
    }

    #[test]
    fn zero_delta_leaves_buckets_untouched() {
        let mut store = RankingStore::new(DEPTHS);
        store.upsert("steady", 4);
        store.upsert("steady", 0);
        assert_eq!(store.rank_of("steady"), Some(4));
        assert_consistent(&store);
    }

    #[test]
    fn unindexable_phrase_is_stored_without_memberships() {
        let mut store = RankingStore::new(DEPTHS);
        let id = store.upsert("a b c", 1);
        assert_eq!(store.record_count(), 1);
        assert!(store.memberships(id).is_empty());
        assert!(store.indices().iter().all(|i| i.prefix_count() == 0));
    }

    #[test]
    fn shared_prefix_words_are_inserted_twice() {
        let mut store = RankingStore::new(&[3]);
        let id = store.upsert("food foot", 1);
        assert_eq!(store.memberships(id).len(), 2);
        assert_eq!(store.index(3).map(|i| i.bucket_len("foo")), Some(2));

        store.upsert("food foot", 2);
        let ranks: Vec<i64> = store
            .index(3)
            .and_then(|i| i.get("foo"))
            .map(|b| b.iter().map(|(k, _)| k.rank()).collect())
            .unwrap_or_default();
        assert_eq!(ranks, vec![3, 3]);
        assert_consistent(&store);
    }

    #[test]
    fn rank_saturates_instead_of_overflowing() {
        let mut store = RankingStore::new(DEPTHS);
        store.upsert("huge", i64::MAX);
        store.upsert("huge", 1);
        assert_eq!(store.rank_of("huge"), Some(i64::MAX));
    }

    #[test]
    fn stats_count_memberships() {
        let mut store = RankingStore::new(DEPTHS);
        store.upsert("abcde", 1);
        store.upsert("abc", 1);
        let stats = store.stats();
        assert_eq!(stats.records, 2);
        assert_eq!(stats.memberships, 4);
        assert_eq!(stats.prefixes_per_depth, vec![(3, 1), (4, 1), (5, 1)]);
    }
}
