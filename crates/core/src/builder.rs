//! Walks a corpus and feeds every text file into an index.
//!
//! The single-threaded path adds each token straight into the target index.
//! The parallel path still walks directories on the calling thread, but hands
//! each file to the worker pool, where it is indexed into a private
//! [`InvertedIndex`] and merged into the shared one with a single write lock.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use textscope_sync::WorkerPool;
use tracing::{debug, error, info, warn};
use walkdir::WalkDir;

use crate::error::Result;
use crate::index::{ConcurrentIndex, IndexWrite, InvertedIndex};
use crate::text::{self, DynStemmerFactory, Stemmer};

const TEXT_EXTENSIONS: [&str; 2] = ["txt", "text"];

/// Whether `path` is a regular file ending in `.txt` or `.text`, any case.
pub fn is_text_file(path: &Path) -> bool {
    path.is_file()
        && path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| TEXT_EXTENSIONS.iter().any(|t| e.eq_ignore_ascii_case(t)))
}

/// Tokenizes and stems one file into `index`, numbering tokens from 1 across
/// the whole file. Returns the number of tokens added.
pub fn index_file(path: &Path, index: &mut impl IndexWrite, stemmer: &dyn Stemmer) -> Result<usize> {
    let reader = BufReader::new(File::open(path)?);
    let location = path.to_string_lossy();
    let mut position = 0;

    for line in reader.lines() {
        for word in text::tokenize(&line?) {
            position += 1;
            index.add_entry(&stemmer.stem(&word), &location, position);
        }
    }

    Ok(position)
}

pub struct IndexBuilder {
    stemmers: DynStemmerFactory,
}

impl IndexBuilder {
    pub fn new(stemmers: DynStemmerFactory) -> Self {
        Self { stemmers }
    }

    /// Text files to index under `root`, in a stable order. A root that is
    /// itself a file is indexed whatever its extension.
    pub fn collect_files(root: &Path) -> Result<Vec<PathBuf>> {
        let metadata = std::fs::metadata(root)?;
        if metadata.is_file() {
            return Ok(vec![root.to_path_buf()]);
        }

        let mut files = Vec::new();
        for entry in WalkDir::new(root).sort_by_file_name() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("Skipping unreadable entry under {}: {}", root.display(), e);
                    continue;
                }
            };
            if entry.file_type().is_dir() {
                if entry.depth() > 0 {
                    debug!("Processing subdirectory: {}", entry.path().display());
                }
            } else if is_text_file(entry.path()) {
                files.push(entry.into_path());
            }
        }
        Ok(files)
    }

    /// Builds on the calling thread. Files that fail to read are logged and
    /// skipped. Returns the number of files indexed.
    pub fn index_path(&self, root: &Path, index: &mut impl IndexWrite) -> Result<usize> {
        let stemmer = self.stemmers.create();
        let mut indexed = 0;

        for path in Self::collect_files(root)? {
            match index_file(&path, &mut *index, stemmer.as_ref()) {
                Ok(tokens) => {
                    debug!("Indexed {} ({} tokens)", path.display(), tokens);
                    indexed += 1;
                }
                Err(e) => error!("Error processing file {}: {}", path.display(), e),
            }
        }

        info!("Indexed {} files from {}", indexed, root.display());
        Ok(indexed)
    }

    /// Submits one task per file, then waits on the pool barrier, so the index
    /// is complete when this returns. Returns the number of files submitted.
    pub fn index_path_parallel(
        &self,
        root: &Path,
        index: &Arc<ConcurrentIndex>,
        pool: &WorkerPool,
    ) -> Result<usize> {
        let files = Self::collect_files(root)?;
        let submitted = files.len();

        for path in files {
            let index = Arc::clone(index);
            let stemmers = Arc::clone(&self.stemmers);
            pool.submit(move || {
                let stemmer = stemmers.create();
                let mut local = InvertedIndex::new();
                match index_file(&path, &mut local, stemmer.as_ref()) {
                    Ok(tokens) => debug!("Indexed {} ({} tokens)", path.display(), tokens),
                    Err(e) => error!("Error processing file {}: {}", path.display(), e),
                }
                // Tokens read before a failure stay, as in the single-threaded path.
                index.merge(local);
            })?;
        }

        pool.await_completion();
        info!("Indexed {} files from {} on {} workers", submitted, root.display(), pool.size());
        Ok(submitted)
    }
}
