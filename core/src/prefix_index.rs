//! Fixed-depth prefix index.
//!
//! A [`PrefixIndex`] maps every prefix of exactly `depth` characters to a
//! [`Bucket`]: an ordered multiset of record references sorted by
//! [`RankKey`] (rank descending, text ascending).
//!
//! Buckets are keyed by rank, so an entry must be removed under its old key
//! before its record's rank changes and reinserted afterwards. The index does
//! not enforce that discipline; [`crate::store::RankingStore`] does.

use std::collections::BTreeMap;

use ahash::AHashMap;

use crate::record::{RankKey, RecordId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Slot {
    id: RecordId,
    /// Number of memberships of the same record under this prefix.
    copies: u32,
}

/// Rank-ordered collection of record references for one prefix.
#[derive(Debug, Clone, Default)]
pub struct Bucket {
    entries: BTreeMap<RankKey, Slot>,
    len: usize,
}

impl Bucket {
    /// Number of entries, counting duplicate memberships separately.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Entries in rank order. A record inserted twice under the same prefix
    /// is yielded twice.
    pub fn iter(&self) -> impl Iterator<Item = (&RankKey, RecordId)> + '_ {
        self.entries
            .iter()
            .flat_map(|(key, slot)| std::iter::repeat((key, slot.id)).take(slot.copies as usize))
    }

    fn insert(&mut self, key: RankKey, id: RecordId) {
        let slot = self.entries.entry(key).or_insert(Slot { id, copies: 0 });
        debug_assert_eq!(slot.id, id, "rank key shared by two records");
        slot.copies += 1;
        self.len += 1;
    }

    fn remove(&mut self, key: &RankKey) -> bool {
        let Some(slot) = self.entries.get_mut(key) else {
            return false;
        };
        slot.copies -= 1;
        if slot.copies == 0 {
            self.entries.remove(key);
        }
        self.len -= 1;
        true
    }
}

/// Mapping from fixed-length prefix to rank-ordered bucket.
#[derive(Debug, Clone)]
pub struct PrefixIndex {
    depth: usize,
    buckets: AHashMap<Box<str>, Bucket>,
}

impl PrefixIndex {
    pub fn new(depth: usize) -> Self {
        Self {
            depth,
            buckets: AHashMap::new(),
        }
    }

    /// Prefix length, in characters, this index is keyed by.
    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn get(&self, prefix: &str) -> Option<&Bucket> {
        self.buckets.get(prefix)
    }

    /// Insert `id` under `prefix`, creating the bucket on first use.
    ///
    /// Inserting the same key twice stores it twice.
    pub fn insert(&mut self, prefix: &str, key: RankKey, id: RecordId) {
        debug_assert_eq!(prefix.chars().count(), self.depth);
        match self.buckets.get_mut(prefix) {
            Some(bucket) => bucket.insert(key, id),
            None => self.buckets.entry(prefix.into()).or_default().insert(key, id),
        }
    }

    /// Remove one occurrence of `key` under `prefix`. Returns `false` when
    /// there was nothing to remove.
    ///
    /// An emptied bucket stays allocated; the store only grows.
    pub fn remove(&mut self, prefix: &str, key: &RankKey) -> bool {
        self.buckets
            .get_mut(prefix)
            .is_some_and(|bucket| bucket.remove(key))
    }

    /// Up to `n` entries from the front of `prefix`'s bucket. Empty when the
    /// prefix has never been seen.
    pub fn top_n(&self, prefix: &str, n: usize) -> impl Iterator<Item = (&RankKey, RecordId)> + '_ {
        self.get(prefix)
            .into_iter()
            .flat_map(|bucket| bucket.iter())
            .take(n)
    }

    /// Number of distinct prefixes with a bucket.
    pub fn prefix_count(&self) -> usize {
        self.buckets.len()
    }

    pub fn bucket_len(&self, prefix: &str) -> usize {
        self.get(prefix).map_or(0, Bucket::len)
    }

    /// Total entries across all buckets.
    pub fn entry_count(&self) -> usize {
        self.buckets.values().map(Bucket::len).sum()
    }

    pub fn buckets(&self) -> impl Iterator<Item = (&str, &Bucket)> + '_ {
        self.buckets.iter().map(|(prefix, bucket)| (&**prefix, bucket))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn key(rank: i64, text: &str) -> RankKey {
        RankKey::new(rank, Arc::from(text))
    }

    fn texts(index: &PrefixIndex, prefix: &str, n: usize) -> Vec<String> {
        index
            .top_n(prefix, n)
            .map(|(k, _)| k.text().to_string())
            .collect()
    }

    #[test]
    fn insert_keeps_rank_order() {
        let mut index = PrefixIndex::new(3);
        index.insert("zzz", key(1, "zzz one"), RecordId(0));
        index.insert("zzz", key(9, "zzz two"), RecordId(1));
        index.insert("zzz", key(9, "zzz a"), RecordId(2));

        assert_eq!(texts(&index, "zzz", 10), vec!["zzz a", "zzz two", "zzz one"]);
        assert_eq!(texts(&index, "zzz", 1), vec!["zzz a"]);
        assert_eq!(index.bucket_len("zzz"), 3);
    }

    #[test]
    fn missing_prefix_is_empty() {
        let index = PrefixIndex::new(4);
        assert!(index.get("abcd").is_none());
        assert_eq!(index.top_n("abcd", 5).count(), 0);
        assert_eq!(index.bucket_len("abcd"), 0);
    }

    #[test]
    fn duplicate_membership_is_stored_twice() {
        let mut index = PrefixIndex::new(3);
        index.insert("foo", key(2, "foot food"), RecordId(0));
        index.insert("foo", key(2, "foot food"), RecordId(0));
        assert_eq!(index.bucket_len("foo"), 2);
        assert_eq!(texts(&index, "foo", 5), vec!["foot food", "foot food"]);

        assert!(index.remove("foo", &key(2, "foot food")));
        assert_eq!(texts(&index, "foo", 5), vec!["foot food"]);
    }

    #[test]
    fn remove_requires_exact_key() {
        let mut index = PrefixIndex::new(3);
        index.insert("abc", key(5, "abcdef"), RecordId(0));

        assert!(!index.remove("abc", &key(4, "abcdef")));
        assert!(!index.remove("abd", &key(5, "abcdef")));
        assert!(index.remove("abc", &key(5, "abcdef")));
        assert!(!index.remove("abc", &key(5, "abcdef")));

        // bucket survives being emptied
        assert_eq!(index.prefix_count(), 1);
        assert!(index.get("abc").is_some_and(Bucket::is_empty));
    }

    #[test]
    fn entry_count_sums_buckets() {
        let mut index = PrefixIndex::new(3);
        index.insert("abc", key(1, "abc"), RecordId(0));
        index.insert("abd", key(1, "abd"), RecordId(1));
        index.insert("abd", key(2, "abdx"), RecordId(2));
        assert_eq!(index.entry_count(), 3);
        assert_eq!(index.buckets().count(), 2);
    }
}
