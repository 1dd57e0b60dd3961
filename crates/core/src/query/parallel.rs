use std::collections::BTreeSet;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use textscope_sync::WorkerPool;
use tracing::debug;

use crate::error::Result;
use crate::index::{IndexRead, SearchMode, SearchResult};
use crate::output::QueryResults;
use crate::text::{self, DynStemmerFactory};

use super::{QueryProcessor, for_each_line};

#[derive(Default)]
struct SharedResults {
    results: QueryResults,
    /// Keys some task has taken on, finished or not.
    claimed: BTreeSet<String>,
}

/// Resolves each query line in its own pool task.
///
/// Lines are read on the calling thread. Two lines with the same key can be
/// queued before either runs, so the duplicate check happens inside the task,
/// under the results lock. The search itself runs outside that lock and
/// relies on the index's own locking.
pub struct ParallelQueryEngine<S> {
    index: Arc<S>,
    mode: SearchMode,
    stemmers: DynStemmerFactory,
    pool: Arc<WorkerPool>,
    shared: Arc<Mutex<SharedResults>>,
}

// Nothing panics while this mutex is held.
fn lock(shared: &Mutex<SharedResults>) -> MutexGuard<'_, SharedResults> {
    shared.lock().unwrap_or_else(PoisonError::into_inner)
}

impl<S> ParallelQueryEngine<S>
where
    S: IndexRead + Send + Sync + 'static,
{
    pub fn new(
        index: Arc<S>,
        mode: SearchMode,
        stemmers: DynStemmerFactory,
        pool: Arc<WorkerPool>,
    ) -> Self {
        Self {
            index,
            mode,
            stemmers,
            pool,
            shared: Arc::default(),
        }
    }

    pub fn mode(&self) -> SearchMode {
        self.mode
    }
}

impl<S> QueryProcessor for ParallelQueryEngine<S>
where
    S: IndexRead + Send + Sync + 'static,
{
    fn process_line(&mut self, line: &str) -> Result<()> {
        if line.trim().is_empty() {
            return Ok(());
        }

        let line = line.to_string();
        let index = Arc::clone(&self.index);
        let stemmers = Arc::clone(&self.stemmers);
        let shared = Arc::clone(&self.shared);
        let mode = self.mode;

        self.pool.submit(move || {
            let stemmer = stemmers.create();
            let stems = text::unique_stems(&line, stemmer.as_ref());
            if stems.is_empty() {
                return;
            }
            let key = text::canonical_key(&stems);
            if !lock(&shared).claimed.insert(key.clone()) {
                return;
            }

            let found = index.search(&stems, mode);
            debug!("Resolved query \"{}\" ({} results)", key, found.len());
            lock(&shared).results.insert(key, found);
        })?;
        Ok(())
    }

    fn finish(&self) {
        self.pool.await_completion();
    }

    fn process_path(&mut self, path: &Path) -> Result<()> {
        let submitted = for_each_line(path, |line| self.process_line(line));
        // Wait even if reading stopped early so no task outlives this call.
        self.finish();
        submitted
    }

    fn query_keys(&self) -> Vec<String> {
        lock(&self.shared).results.keys().cloned().collect()
    }

    fn results_for(&self, line: &str) -> Vec<SearchResult> {
        let stemmer = self.stemmers.create();
        let key = text::canonical_key(&text::unique_stems(line, stemmer.as_ref()));
        lock(&self.shared)
            .results
            .get(&key)
            .cloned()
            .unwrap_or_default()
    }

    fn results(&self) -> QueryResults {
        lock(&self.shared).results.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::ConcurrentIndex;
    use crate::text::english;

    #[test]
    fn test_lines_resolve_on_pool() {
        let index = Arc::new(ConcurrentIndex::new());
        index.add_entry("cat", "doc1.txt", 2);
        index.add_entry("sat", "doc1.txt", 3);
        index.add_entry("cat", "doc2.txt", 2);
        let pool = Arc::new(WorkerPool::new(3));

        let mut engine = ParallelQueryEngine::new(index, SearchMode::Exact, english(), pool);
        for line in ["cat sat", "sat cat", "cat", "", "!!!"] {
            engine.process_line(line).unwrap();
        }
        engine.finish();

        assert_eq!(engine.query_keys(), vec!["cat", "cat sat"]);
        let results = engine.results_for("SAT CATS");
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].location(), "doc1.txt");
        assert_eq!(results[0].matches(), 2);
    }

    #[test]
    fn test_submit_after_shutdown_fails() {
        let index = Arc::new(ConcurrentIndex::new());
        let pool = Arc::new(WorkerPool::new(1));
        pool.shutdown();

        let mut engine = ParallelQueryEngine::new(index, SearchMode::Exact, english(), pool);
        assert!(engine.process_line("cat").is_err());
        assert!(engine.process_line("   ").is_ok());
    }
}
