use std::collections::BTreeSet;

use crate::error::Result;
use crate::index::{IndexRead, SearchMode, SearchResult};
use crate::output::QueryResults;
use crate::text::{self, Stemmer, StemmerFactory};

use super::QueryProcessor;

/// Resolves queries on the calling thread.
pub struct QueryEngine<'a, S: IndexRead + ?Sized> {
    index: &'a S,
    mode: SearchMode,
    stemmer: Box<dyn Stemmer>,
    results: QueryResults,
}

impl<'a, S: IndexRead + ?Sized> QueryEngine<'a, S> {
    pub fn new(index: &'a S, mode: SearchMode, stemmers: &dyn StemmerFactory) -> Self {
        Self {
            index,
            mode,
            stemmer: stemmers.create(),
            results: QueryResults::new(),
        }
    }

    pub fn mode(&self) -> SearchMode {
        self.mode
    }

    fn normalize(&self, line: &str) -> BTreeSet<String> {
        text::unique_stems(line, self.stemmer.as_ref())
    }
}

impl<S: IndexRead + ?Sized> QueryProcessor for QueryEngine<'_, S> {
    fn process_line(&mut self, line: &str) -> Result<()> {
        let stems = self.normalize(line);
        if stems.is_empty() {
            return Ok(());
        }
        let key = text::canonical_key(&stems);
        if !self.results.contains_key(&key) {
            let found = self.index.search(&stems, self.mode);
            self.results.insert(key, found);
        }
        Ok(())
    }

    fn query_keys(&self) -> Vec<String> {
        self.results.keys().cloned().collect()
    }

    fn results_for(&self, line: &str) -> Vec<SearchResult> {
        let key = text::canonical_key(&self.normalize(line));
        self.results.get(&key).cloned().unwrap_or_default()
    }

    fn results(&self) -> QueryResults {
        self.results.clone()
    }
}
