//! Inverted index: word -> location -> ordered positions, plus a per-location
//! count used to normalize search scores.
//!
//! [`IndexRead`] and [`IndexWrite`] are the capability set shared by the plain
//! [`InvertedIndex`] and the lock-wrapping [`ConcurrentIndex`]. Read methods
//! return owned snapshots so that no caller ever holds a view into storage
//! that another thread might be mutating.

pub mod concurrent;
pub mod inverted;
pub mod search;

use std::collections::{BTreeMap, BTreeSet};
use std::io::Write;

use crate::error::Result;

pub use concurrent::ConcurrentIndex;
pub use inverted::{InvertedIndex, Postings};
pub use search::{SearchMode, SearchResult};

pub trait IndexRead {
    fn has_word(&self, word: &str) -> bool;
    fn has_location(&self, word: &str, location: &str) -> bool;
    fn has_position(&self, word: &str, location: &str, position: usize) -> bool;
    /// Whether `location` has a count entry.
    fn has_count(&self, location: &str) -> bool;
    /// Highest position recorded for `location`, or 0.
    fn word_count(&self, location: &str) -> usize;

    fn num_words(&self) -> usize;
    fn num_locations(&self, word: &str) -> usize;
    fn num_positions(&self, word: &str, location: &str) -> usize;
    fn num_counts(&self) -> usize;

    fn words(&self) -> Vec<String>;
    fn locations(&self, word: &str) -> Vec<String>;
    fn positions(&self, word: &str, location: &str) -> Vec<usize>;
    fn counts(&self) -> BTreeMap<String, usize>;

    /// Ranked results for `stems`; see [`SearchResult`] for the ordering.
    fn search(&self, stems: &BTreeSet<String>, mode: SearchMode) -> Vec<SearchResult>;

    /// Writes the word -> location -> positions artifact as pretty JSON.
    fn write_postings(&self, writer: &mut dyn Write) -> Result<()>;
}

pub trait IndexWrite {
    fn add_entry(&mut self, word: &str, location: &str, position: usize);
    /// Unions `other` into this index. The result does not depend on the order
    /// in which several indexes are merged.
    fn merge(&mut self, other: InvertedIndex);
}
