use std::cell::UnsafeCell;
use std::collections::{BTreeMap, BTreeSet};
use std::io::Write;

use textscope_sync::SharedExclusiveLock;

use super::inverted::InvertedIndex;
use super::search::{SearchMode, SearchResult};
use super::{IndexRead, IndexWrite};
use crate::error::Result;

/// Thread-safe decorator over any index implementation.
///
/// Mutations run under the write side of a [`SharedExclusiveLock`], reads under
/// the read side. Every read returns an owned copy taken while the lock is
/// still held.
pub struct ConcurrentIndex<I = InvertedIndex> {
    lock: SharedExclusiveLock,
    inner: UnsafeCell<I>,
}

// SAFETY: `inner` is only reached through `with_read`/`with_write`, which hold
// the matching side of `lock` for the whole borrow. Neither hands the borrow
// to code that could call back into this index, so a shared and a mutable
// borrow never coexist, even though the lock lets its active writer re-enter.
unsafe impl<I: Send + Sync> Sync for ConcurrentIndex<I> {}

impl<I> ConcurrentIndex<I> {
    pub fn from_index(index: I) -> Self {
        Self {
            lock: SharedExclusiveLock::new(),
            inner: UnsafeCell::new(index),
        }
    }

    pub fn into_inner(self) -> I {
        self.inner.into_inner()
    }

    fn with_read<R>(&self, f: impl FnOnce(&I) -> R) -> R {
        let _guard = self.lock.read();
        // SAFETY: read side held; see the `Sync` impl.
        f(unsafe { &*self.inner.get() })
    }

    fn with_write<R>(&self, f: impl FnOnce(&mut I) -> R) -> R {
        let _guard = self.lock.write();
        // SAFETY: write side held; see the `Sync` impl.
        f(unsafe { &mut *self.inner.get() })
    }
}

impl ConcurrentIndex<InvertedIndex> {
    pub fn new() -> Self {
        Self::from_index(InvertedIndex::new())
    }

    /// Copy of the whole index taken under one read lock.
    pub fn snapshot(&self) -> InvertedIndex {
        self.with_read(InvertedIndex::clone)
    }
}

impl Default for ConcurrentIndex<InvertedIndex> {
    fn default() -> Self {
        Self::new()
    }
}

impl<I: IndexWrite> ConcurrentIndex<I> {
    pub fn add_entry(&self, word: &str, location: &str, position: usize) {
        self.with_write(|index| index.add_entry(word, location, position));
    }

    /// Merges a privately built index in one write-lock acquisition.
    pub fn merge(&self, other: InvertedIndex) {
        self.with_write(|index| index.merge(other));
    }
}

impl<I: IndexRead> IndexRead for ConcurrentIndex<I> {
    fn has_word(&self, word: &str) -> bool {
        self.with_read(|index| index.has_word(word))
    }

    fn has_location(&self, word: &str, location: &str) -> bool {
        self.with_read(|index| index.has_location(word, location))
    }

    fn has_position(&self, word: &str, location: &str, position: usize) -> bool {
        self.with_read(|index| index.has_position(word, location, position))
    }

    fn has_count(&self, location: &str) -> bool {
        self.with_read(|index| index.has_count(location))
    }

    fn word_count(&self, location: &str) -> usize {
        self.with_read(|index| index.word_count(location))
    }

    fn num_words(&self) -> usize {
        self.with_read(|index| index.num_words())
    }

    fn num_locations(&self, word: &str) -> usize {
        self.with_read(|index| index.num_locations(word))
    }

    fn num_positions(&self, word: &str, location: &str) -> usize {
        self.with_read(|index| index.num_positions(word, location))
    }

    fn num_counts(&self) -> usize {
        self.with_read(|index| index.num_counts())
    }

    fn words(&self) -> Vec<String> {
        self.with_read(|index| index.words())
    }

    fn locations(&self, word: &str) -> Vec<String> {
        self.with_read(|index| index.locations(word))
    }

    fn positions(&self, word: &str, location: &str) -> Vec<usize> {
        self.with_read(|index| index.positions(word, location))
    }

    fn counts(&self) -> BTreeMap<String, usize> {
        self.with_read(|index| index.counts())
    }

    fn search(&self, stems: &BTreeSet<String>, mode: SearchMode) -> Vec<SearchResult> {
        self.with_read(|index| index.search(stems, mode))
    }

    fn write_postings(&self, writer: &mut dyn Write) -> Result<()> {
        self.with_read(|index| index.write_postings(writer))
    }
}
