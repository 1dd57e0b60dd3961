//! Runs one configured pass: build, query, then write artifacts.
//!
//! Every step logs its own failure and the run moves on, so a bad query file
//! still leaves the index artifacts behind.

use std::path::Path;
use std::sync::Arc;

use textscope_core::output::{self, QueryResults};
use textscope_core::text::{self, DynStemmerFactory};
use textscope_core::{
    ConcurrentIndex, IndexBuilder, IndexRead, InvertedIndex, ParallelQueryEngine, QueryEngine,
    QueryProcessor, Result,
};
use textscope_sync::WorkerPool;
use tracing::{error, info};

use crate::config::{RunConfig, Threads};

pub fn execute(config: &RunConfig) {
    let stemmers = text::english();
    match config.threads {
        Threads::Single => run_single(config, stemmers),
        Threads::Pool(workers) => run_pooled(config, stemmers, workers),
    }
}

fn run_single(config: &RunConfig, stemmers: DynStemmerFactory) {
    let mut index = InvertedIndex::new();

    if let Some(text) = &config.text {
        let builder = IndexBuilder::new(Arc::clone(&stemmers));
        report("build index", text, builder.index_path(text, &mut index).map(drop));
    }

    let mut results = QueryResults::new();
    if let Some(query) = &config.query {
        let mut engine = QueryEngine::new(&index, config.mode, stemmers.as_ref());
        report("process queries", query, engine.process_path(query));
        results = engine.results();
    }

    write_artifacts(config, &index, &results);
}

fn run_pooled(config: &RunConfig, stemmers: DynStemmerFactory, workers: usize) {
    let pool = Arc::new(WorkerPool::new(workers));
    let index = Arc::new(ConcurrentIndex::new());
    info!("Running on {} workers", pool.size());

    if let Some(text) = &config.text {
        let builder = IndexBuilder::new(Arc::clone(&stemmers));
        report(
            "build index",
            text,
            builder.index_path_parallel(text, &index, &pool).map(drop),
        );
    }

    let mut results = QueryResults::new();
    if let Some(query) = &config.query {
        let mut engine =
            ParallelQueryEngine::new(Arc::clone(&index), config.mode, stemmers, Arc::clone(&pool));
        report("process queries", query, engine.process_path(query));
        results = engine.results();
    }

    pool.join();
    write_artifacts(config, &*index, &results);
}

fn write_artifacts(config: &RunConfig, index: &dyn IndexRead, results: &QueryResults) {
    if let Some(path) = &config.index {
        report("write index", path, output::write_index(index, path));
    }
    if let Some(path) = &config.counts {
        report("write counts", path, output::write_counts(index, path));
    }
    if let Some(path) = &config.results {
        report("write results", path, output::write_results(results, path));
    }
}

fn report(step: &str, path: &Path, outcome: Result<()>) {
    match outcome {
        Ok(()) => info!("Finished {} for {}", step, path.display()),
        Err(e) => error!("Unable to {} for {}: {}", step, path.display(), e),
    }
}
