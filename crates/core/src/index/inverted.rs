use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, BTreeSet};
use std::io::Write;
use std::ops::Bound;

use serde::Serialize;

use super::search::{ResultAccumulator, SearchMode, SearchResult};
use super::{IndexRead, IndexWrite};
use crate::error::Result;
use crate::output;

pub type Postings = BTreeMap<String, BTreeMap<String, BTreeSet<usize>>>;

/// Single-threaded inverted index.
///
/// `counts[location]` is the highest position ever recorded for that
/// location, not a separate tally of tokens. It only matches the number of
/// words in a file when every token was indexed with no gaps in positions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct InvertedIndex {
    words: Postings,
    counts: BTreeMap<String, usize>,
}

impl InvertedIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn postings(&self) -> &Postings {
        &self.words
    }

    pub fn count_map(&self) -> &BTreeMap<String, usize> {
        &self.counts
    }

    pub fn position_set(&self, word: &str, location: &str) -> Option<&BTreeSet<usize>> {
        self.words.get(word)?.get(location)
    }

    pub fn exact_search(&self, stems: &BTreeSet<String>) -> Vec<SearchResult> {
        let mut acc = ResultAccumulator::new(&self.counts);
        for stem in stems {
            if let Some(locations) = self.words.get(stem) {
                acc.add_word(locations);
            }
        }
        acc.finish()
    }

    /// Matches every word that starts with one of `stems`, walking the sorted
    /// word keys from the stem onward rather than scanning the whole index.
    pub fn partial_search(&self, stems: &BTreeSet<String>) -> Vec<SearchResult> {
        let mut acc = ResultAccumulator::new(&self.counts);
        for stem in stems {
            for (_, locations) in self
                .words
                .range::<str, _>((Bound::Included(stem.as_str()), Bound::Unbounded))
                .take_while(|(word, _)| word.starts_with(stem.as_str()))
            {
                acc.add_word(locations);
            }
        }
        acc.finish()
    }

    fn bump_count(&mut self, location: &str, position: usize) {
        match self.counts.get_mut(location) {
            Some(count) => *count = (*count).max(position),
            None => {
                self.counts.insert(location.to_string(), position);
            }
        }
    }
}

impl IndexWrite for InvertedIndex {
    fn add_entry(&mut self, word: &str, location: &str, position: usize) {
        self.words
            .entry(word.to_string())
            .or_default()
            .entry(location.to_string())
            .or_default()
            .insert(position);
        self.bump_count(location, position);
    }

    fn merge(&mut self, other: InvertedIndex) {
        for (word, other_locations) in other.words {
            match self.words.entry(word) {
                Entry::Vacant(slot) => {
                    slot.insert(other_locations);
                }
                Entry::Occupied(mut slot) => {
                    let locations = slot.get_mut();
                    for (location, other_positions) in other_locations {
                        match locations.entry(location) {
                            Entry::Vacant(p) => {
                                p.insert(other_positions);
                            }
                            Entry::Occupied(mut p) => p.get_mut().extend(other_positions),
                        }
                    }
                }
            }
        }

        for (location, count) in other.counts {
            self.bump_count(&location, count);
        }
    }
}

impl IndexRead for InvertedIndex {
    fn has_word(&self, word: &str) -> bool {
        self.words.contains_key(word)
    }

    fn has_location(&self, word: &str, location: &str) -> bool {
        self.words
            .get(word)
            .is_some_and(|locations| locations.contains_key(location))
    }

    fn has_position(&self, word: &str, location: &str, position: usize) -> bool {
        self.position_set(word, location)
            .is_some_and(|positions| positions.contains(&position))
    }

    fn has_count(&self, location: &str) -> bool {
        self.counts.contains_key(location)
    }

    fn word_count(&self, location: &str) -> usize {
        self.counts.get(location).copied().unwrap_or(0)
    }

    fn num_words(&self) -> usize {
        self.words.len()
    }

    fn num_locations(&self, word: &str) -> usize {
        self.words.get(word).map_or(0, BTreeMap::len)
    }

    fn num_positions(&self, word: &str, location: &str) -> usize {
        self.position_set(word, location).map_or(0, BTreeSet::len)
    }

    fn num_counts(&self) -> usize {
        self.counts.len()
    }

    fn words(&self) -> Vec<String> {
        self.words.keys().cloned().collect()
    }

    fn locations(&self, word: &str) -> Vec<String> {
        self.words
            .get(word)
            .map(|locations| locations.keys().cloned().collect())
            .unwrap_or_default()
    }

    fn positions(&self, word: &str, location: &str) -> Vec<usize> {
        self.position_set(word, location)
            .map(|positions| positions.iter().copied().collect())
            .unwrap_or_default()
    }

    fn counts(&self) -> BTreeMap<String, usize> {
        self.counts.clone()
    }

    fn search(&self, stems: &BTreeSet<String>, mode: SearchMode) -> Vec<SearchResult> {
        match mode {
            SearchMode::Exact => self.exact_search(stems),
            SearchMode::Partial => self.partial_search(stems),
        }
    }

    fn write_postings(&self, writer: &mut dyn Write) -> Result<()> {
        output::write_pretty(writer, &self.words)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stems(words: &[&str]) -> BTreeSet<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    fn sample() -> InvertedIndex {
        let mut index = InvertedIndex::new();
        for (pos, word) in ["the", "cat", "sat"].iter().enumerate() {
            index.add_entry(word, "doc1.txt", pos + 1);
        }
        for (pos, word) in ["the", "cat", "ran"].iter().enumerate() {
            index.add_entry(word, "doc2.txt", pos + 1);
        }
        index
    }

    #[test]
    fn test_add_entry_builds_nested_entries() {
        let mut index = InvertedIndex::new();
        index.add_entry("cat", "a.txt", 3);
        index.add_entry("cat", "a.txt", 1);
        index.add_entry("cat", "a.txt", 3);

        assert!(index.has_word("cat"));
        assert!(index.has_location("cat", "a.txt"));
        assert!(index.has_position("cat", "a.txt", 1));
        assert!(!index.has_position("cat", "a.txt", 2));
        assert_eq!(index.positions("cat", "a.txt"), vec![1, 3]);
        assert_eq!(index.word_count("a.txt"), 3);
    }

    #[test]
    fn test_count_is_max_position() {
        let mut index = InvertedIndex::new();
        index.add_entry("b", "a.txt", 7);
        index.add_entry("a", "a.txt", 2);
        assert_eq!(index.word_count("a.txt"), 7);
        assert_eq!(index.word_count("missing.txt"), 0);
        assert!(index.has_count("a.txt"));
        assert!(!index.has_count("missing.txt"));
    }

    #[test]
    fn test_inspection_of_missing_entries() {
        let index = sample();
        assert_eq!(index.num_words(), 4);
        assert_eq!(index.num_counts(), 2);
        assert_eq!(index.num_locations("cat"), 2);
        assert_eq!(index.num_locations("dog"), 0);
        assert_eq!(index.num_positions("sat", "doc2.txt"), 0);
        assert!(index.locations("dog").is_empty());
        assert!(index.positions("dog", "doc1.txt").is_empty());
        assert_eq!(index.words(), vec!["cat", "ran", "sat", "the"]);
    }

    #[test]
    fn test_merge_unions_positions_and_maxes_counts() {
        let mut left = InvertedIndex::new();
        left.add_entry("cat", "a.txt", 1);
        left.add_entry("dog", "a.txt", 4);

        let mut right = InvertedIndex::new();
        right.add_entry("cat", "a.txt", 2);
        right.add_entry("cat", "b.txt", 9);
        right.add_entry("eel", "a.txt", 3);

        left.merge(right);
        assert_eq!(left.positions("cat", "a.txt"), vec![1, 2]);
        assert_eq!(left.positions("cat", "b.txt"), vec![9]);
        assert_eq!(left.positions("eel", "a.txt"), vec![3]);
        assert_eq!(left.word_count("a.txt"), 4);
        assert_eq!(left.word_count("b.txt"), 9);
    }

    #[test]
    fn test_exact_search_example() {
        let results = sample().exact_search(&stems(&["cat"]));
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].location(), "doc1.txt");
        assert_eq!(results[1].location(), "doc2.txt");
        for r in &results {
            assert_eq!(r.matches(), 1);
            assert!((r.score() - 1.0 / 3.0).abs() < 1e-12);
        }
    }

    #[test]
    fn test_exact_search_accumulates_across_stems() {
        let results = sample().exact_search(&stems(&["cat", "sat", "zebra"]));
        assert_eq!(results[0].location(), "doc1.txt");
        assert_eq!(results[0].matches(), 2);
        assert_eq!(results[1].location(), "doc2.txt");
        assert_eq!(results[1].matches(), 1);
    }

    #[test]
    fn test_partial_search_uses_prefix_range() {
        let mut index = InvertedIndex::new();
        index.add_entry("car", "a.txt", 1);
        index.add_entry("cart", "a.txt", 2);
        index.add_entry("cat", "b.txt", 1);
        index.add_entry("ca", "c.txt", 1);
        index.add_entry("dog", "a.txt", 3);
        index.add_entry("bca", "b.txt", 2);

        let results = index.partial_search(&stems(&["car"]));
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].location(), "a.txt");
        assert_eq!(results[0].matches(), 2);

        let results = index.partial_search(&stems(&["ca"]));
        let order: Vec<_> = results.iter().map(|r| r.location()).collect();
        assert_eq!(order, vec!["c.txt", "a.txt", "b.txt"]);
    }

    #[test]
    fn test_exact_and_partial_agree_on_full_word_without_extensions() {
        let index = sample();
        let exact = index.search(&stems(&["sat"]), SearchMode::Exact);
        let partial = index.search(&stems(&["sat"]), SearchMode::Partial);
        assert_eq!(exact, partial);
    }

    #[test]
    fn test_empty_stems_yield_nothing() {
        let index = sample();
        assert!(index.exact_search(&BTreeSet::new()).is_empty());
        assert!(index.partial_search(&BTreeSet::new()).is_empty());
    }
}
