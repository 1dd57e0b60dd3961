//! Query processing: turns query lines into canonical stem keys and resolves
//! each distinct key against an index at most once.

pub mod engine;
pub mod parallel;

use std::fs::File;
use std::io::{BufRead, BufReader, ErrorKind};
use std::path::Path;

use tracing::warn;

use crate::error::Result;
use crate::index::SearchResult;
use crate::output::{self, QueryResults};

pub use engine::QueryEngine;
pub use parallel::ParallelQueryEngine;

pub trait QueryProcessor {
    /// Normalizes one query line and resolves it unless its key is known.
    fn process_line(&mut self, line: &str) -> Result<()>;

    /// Waits until every line handed to `process_line` has been resolved.
    fn finish(&self) {}

    fn process_path(&mut self, path: &Path) -> Result<()> {
        for_each_line(path, |line| self.process_line(line))?;
        self.finish();
        Ok(())
    }

    /// Canonical keys resolved so far, sorted.
    fn query_keys(&self) -> Vec<String>;

    /// Stored results for the key `line` normalizes to, or nothing.
    fn results_for(&self, line: &str) -> Vec<SearchResult>;

    fn results(&self) -> QueryResults;

    fn write_json(&self, path: &Path) -> Result<()> {
        output::write_results(&self.results(), path)
    }
}

/// Reads `path` line by line. Lines that are not valid UTF-8 are logged and
/// skipped; any other read failure ends the walk.
pub fn for_each_line(path: &Path, mut f: impl FnMut(&str) -> Result<()>) -> Result<()> {
    let reader = BufReader::new(File::open(path)?);
    for (n, line) in reader.lines().enumerate() {
        match line {
            Ok(line) => f(&line)?,
            Err(e) if e.kind() == ErrorKind::InvalidData => {
                warn!("Skipping unreadable line {} of {}: {}", n + 1, path.display(), e);
            }
            Err(e) => return Err(e.into()),
        }
    }
    Ok(())
}
