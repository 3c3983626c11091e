//! Phrase records and the tokenizer that decides which words get indexed.
//!
//! A [`Record`] owns its phrase text once (as an `Arc<str>` shared with every
//! prefix-index entry that refers to it) and remembers its indexed words as
//! byte spans into that text, so re-ranking a record never touches them.

use std::cmp::Ordering;
use std::hash::{Hash, Hasher};
use std::ops::Range;
use std::sync::Arc;

/// Words shorter than this many characters are never indexed.
pub const MIN_WORD_LEN: usize = 3;

/// Only this many qualifying words of a phrase are indexed.
pub const MAX_INDEXED_WORDS: usize = 3;

/// Position of a record in the store's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RecordId(pub(crate) usize);

impl RecordId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Byte range of a word (or a word prefix) inside a record's text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WordSpan {
    start: usize,
    end: usize,
}

impl WordSpan {
    pub(crate) fn new(start: usize, end: usize) -> Self {
        debug_assert!(start <= end);
        Self { start, end }
    }

    pub fn start(&self) -> usize {
        self.start
    }

    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }
}

/// The fixed-capacity set of indexed words computed once per record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IndexedWords {
    spans: [WordSpan; MAX_INDEXED_WORDS],
    len: u8,
}

impl IndexedWords {
    fn push(&mut self, span: WordSpan) {
        self.spans[self.len as usize] = span;
        self.len += 1;
    }

    fn is_full(&self) -> bool {
        self.len as usize == MAX_INDEXED_WORDS
    }

    pub fn spans(&self) -> &[WordSpan] {
        &self.spans[..self.len as usize]
    }

    pub fn len(&self) -> usize {
        self.len as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

/// Split `text` on single spaces and keep the first [`MAX_INDEXED_WORDS`]
/// tokens that are at least [`MIN_WORD_LEN`] characters long.
///
/// Short tokens are skipped and do not count toward the budget. Consecutive
/// spaces produce empty tokens, which are skipped like any other short token.
///
/// # Example
/// ```
/// use autocomplete_core::record::tokenize;
///
/// let text = "an old oak tree by the river";
/// let words: Vec<&str> = tokenize(text)
///     .spans()
///     .iter()
///     .map(|s| &text[s.range()])
///     .collect();
/// assert_eq!(words, vec!["old", "oak", "tree"]);
/// ```
pub fn tokenize(text: &str) -> IndexedWords {
    let mut words = IndexedWords::default();
    let mut start = 0;
    for token in text.split(' ') {
        let end = start + token.len();
        if token.chars().nth(MIN_WORD_LEN - 1).is_some() {
            words.push(WordSpan::new(start, end));
            if words.is_full() {
                break;
            }
        }
        start = end + 1;
    }
    words
}

/// The first `len` characters of `word`, or `None` when `word` is shorter.
pub fn prefix_of(word: &str, len: usize) -> Option<&str> {
    match word.char_indices().nth(len) {
        Some((end, _)) => Some(&word[..end]),
        None if word.chars().count() == len => Some(word),
        None => None,
    }
}

/// Sort key of an entry inside a prefix bucket: rank descending, then text
/// ascending.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RankKey {
    rank: i64,
    text: Arc<str>,
}

impl RankKey {
    pub fn new(rank: i64, text: Arc<str>) -> Self {
        Self { rank, text }
    }

    pub fn rank(&self) -> i64 {
        self.rank
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn shared_text(&self) -> &Arc<str> {
        &self.text
    }
}

impl Ord for RankKey {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .rank
            .cmp(&self.rank)
            .then_with(|| self.text.cmp(&other.text))
    }
}

impl PartialOrd for RankKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// A stored phrase with its popularity rank and precomputed indexed words.
///
/// Two records are equal iff their texts are equal; rank is ignored.
#[derive(Debug, Clone)]
pub struct Record {
    text: Arc<str>,
    rank: i64,
    words: IndexedWords,
}

impl Record {
    pub fn new(text: &str, rank: i64) -> Self {
        let words = tokenize(text);
        Self {
            text: Arc::from(text),
            rank,
            words,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn shared_text(&self) -> &Arc<str> {
        &self.text
    }

    pub fn rank(&self) -> i64 {
        self.rank
    }

    /// Only the store may move a record, since it has to reposition every
    /// bucket entry first.
    pub(crate) fn set_rank(&mut self, rank: i64) {
        self.rank = rank;
    }

    pub fn key(&self) -> RankKey {
        RankKey::new(self.rank, Arc::clone(&self.text))
    }

    pub fn word_spans(&self) -> &[WordSpan] {
        self.words.spans()
    }

    /// Indexed words as views into the record's text.
    pub fn indexed_words(&self) -> impl Iterator<Item = &str> + '_ {
        self.words.spans().iter().map(move |span| &self.text[span.range()])
    }

    /// True iff some indexed word starts with the whole of `query`.
    pub fn matches_query(&self, query: &str) -> bool {
        self.indexed_words().any(|word| word.starts_with(query))
    }
}

impl PartialEq for Record {
    fn eq(&self, other: &Self) -> bool {
        self.text == other.text
    }
}

impl Eq for Record {}

impl Hash for Record {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.text.hash(state);
    }
}
