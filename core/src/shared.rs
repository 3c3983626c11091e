//! Thread-safe handle around [`Autocomplete`].
//!
//! Lookups take a read lock and run in parallel. Upserts take the write lock,
//! so no two upserts can interleave their remove/reinsert sequences and no
//! lookup observes a half-moved record.

use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::engine::{Autocomplete, Suggestion};
use crate::error::{AutocompleteError, Result};

#[derive(Clone, Debug, Default)]
pub struct SharedAutocomplete {
    inner: Arc<RwLock<Autocomplete>>,
}

impl SharedAutocomplete {
    pub fn new(engine: Autocomplete) -> Self {
        Self {
            inner: Arc::new(RwLock::new(engine)),
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Autocomplete>> {
        self.inner.read().map_err(|_| AutocompleteError::Poisoned)
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Autocomplete>> {
        self.inner.write().map_err(|_| AutocompleteError::Poisoned)
    }

    pub fn upsert(&self, text: &str, delta: i64) -> Result<()> {
        self.write()?.upsert(text, delta);
        Ok(())
    }

    /// Apply a batch under a single write lock.
    pub fn ingest<I, S>(&self, events: I) -> Result<usize>
    where
        I: IntoIterator<Item = (S, i64)>,
        S: AsRef<str>,
    {
        Ok(self.write()?.ingest(events))
    }

    pub fn lookup(&self, query: &str, top_n: usize) -> Result<Vec<Suggestion>> {
        self.read()?.lookup(query, top_n)
    }

    pub fn suggest(&self, query: &str) -> Result<Vec<Suggestion>> {
        self.read()?.suggest(query)
    }

    pub fn record_count(&self) -> Result<usize> {
        Ok(self.read()?.record_count())
    }

    /// Run `f` against a consistent snapshot of the engine.
    pub fn with_read<T>(&self, f: impl FnOnce(&Autocomplete) -> T) -> Result<T> {
        let guard = self.read()?;
        Ok(f(&*guard))
    }
}
