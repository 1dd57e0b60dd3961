use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::{Serialize, Serializer};
use serde_json::value::RawValue;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchMode {
    /// Stems must equal an index word.
    #[default]
    Exact,
    /// Stems match every index word they are a prefix of.
    Partial,
}

impl SearchMode {
    pub fn from_partial(partial: bool) -> Self {
        if partial { Self::Partial } else { Self::Exact }
    }
}

/// One location matched by a query.
///
/// Results sort by score descending, then match count descending, then
/// location ascending. This is a total order, so equal inputs always rank
/// the same way.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResult {
    #[serde(rename = "count")]
    matches: usize,
    #[serde(serialize_with = "serialize_score")]
    score: f64,
    #[serde(rename = "where")]
    location: String,
}

impl SearchResult {
    fn new(location: String) -> Self {
        Self {
            matches: 0,
            score: 0.0,
            location,
        }
    }

    /// Adds `matches` and recomputes the score against the location's count.
    fn update(&mut self, matches: usize, total: usize) {
        self.matches += matches;
        self.score = if total == 0 {
            0.0
        } else {
            (self.matches as f64 / total as f64).min(1.0)
        };
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn matches(&self) -> usize {
        self.matches
    }

    pub fn score(&self) -> f64 {
        self.score
    }

    pub fn rank_cmp(&self, other: &Self) -> Ordering {
        other
            .score
            .total_cmp(&self.score)
            .then_with(|| other.matches.cmp(&self.matches))
            .then_with(|| self.location.cmp(&other.location))
    }
}

/// Writes the score as a JSON number with exactly eight decimals.
fn serialize_score<S: Serializer>(score: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    RawValue::from_string(format!("{score:.8}"))
        .map_err(<S::Error as serde::ser::Error>::custom)?
        .serialize(serializer)
}

/// Collects per-location results for a single search call.
pub(crate) struct ResultAccumulator<'a> {
    counts: &'a BTreeMap<String, usize>,
    by_location: HashMap<&'a str, SearchResult>,
}

impl<'a> ResultAccumulator<'a> {
    pub(crate) fn new(counts: &'a BTreeMap<String, usize>) -> Self {
        Self {
            counts,
            by_location: HashMap::new(),
        }
    }

    /// Credits every location of one matched word with its position count.
    pub(crate) fn add_word(&mut self, locations: &'a BTreeMap<String, BTreeSet<usize>>) {
        for (location, positions) in locations {
            let total = self.counts.get(location).copied().unwrap_or(0);
            self.by_location
                .entry(location.as_str())
                .or_insert_with(|| SearchResult::new(location.clone()))
                .update(positions.len(), total);
        }
    }

    pub(crate) fn finish(self) -> Vec<SearchResult> {
        let mut results: Vec<_> = self.by_location.into_values().collect();
        results.sort_by(SearchResult::rank_cmp);
        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(location: &str, matches: usize, total: usize) -> SearchResult {
        let mut r = SearchResult::new(location.to_string());
        r.update(matches, total);
        r
    }

    #[test]
    fn test_rank_order() {
        let mut results = vec![
            result("b.txt", 1, 4),
            result("a.txt", 1, 4),
            result("c.txt", 2, 8),
            result("d.txt", 3, 4),
        ];
        results.sort_by(SearchResult::rank_cmp);
        let order: Vec<_> = results.iter().map(SearchResult::location).collect();
        // 0.75 first, then the 0.25 tie broken by matches, then by location.
        assert_eq!(order, vec!["d.txt", "c.txt", "a.txt", "b.txt"]);
    }

    #[test]
    fn test_update_recomputes_score() {
        let mut r = result("a", 1, 4);
        assert_eq!(r.score(), 0.25);
        r.update(1, 4);
        assert_eq!(r.matches(), 2);
        assert_eq!(r.score(), 0.5);
    }

    #[test]
    fn test_score_stays_in_unit_interval() {
        assert_eq!(result("a", 3, 0).score(), 0.0);
        assert_eq!(result("a", 5, 2).score(), 1.0);
    }

    #[test]
    fn test_serialized_shape() {
        let json = serde_json::to_value(result("doc1.txt", 1, 3)).unwrap();
        assert_eq!(json["count"], 1);
        assert_eq!(json["where"], "doc1.txt");
        assert_eq!(json["score"].as_f64().unwrap(), 0.33333333);
    }

    #[test]
    fn test_score_text_has_eight_decimals() {
        let text = serde_json::to_string(&vec![
            result("a.txt", 2, 2),
            result("b.txt", 1, 2),
            result("c.txt", 2, 3),
        ])
        .unwrap();
        assert!(text.contains("\"score\":1.00000000,"));
        assert!(text.contains("\"score\":0.50000000,"));
        assert!(text.contains("\"score\":0.66666667,"));
    }

    #[test]
    fn test_mode_from_flag() {
        assert_eq!(SearchMode::from_partial(true), SearchMode::Partial);
        assert_eq!(SearchMode::from_partial(false), SearchMode::Exact);
    }
}
