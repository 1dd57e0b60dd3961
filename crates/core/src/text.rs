//! Word cleaning, tokenizing and stemming.
//!
//! Stemmers are created through a [`StemmerFactory`] so every task that
//! analyzes text gets its own instance instead of sharing one across threads.

use std::collections::BTreeSet;
use std::sync::Arc;

use rust_stemmers::Algorithm;

pub trait Stemmer {
    fn stem(&self, word: &str) -> String;
}

impl Stemmer for rust_stemmers::Stemmer {
    fn stem(&self, word: &str) -> String {
        rust_stemmers::Stemmer::stem(self, word).into_owned()
    }
}

pub trait StemmerFactory: Send + Sync {
    fn create(&self) -> Box<dyn Stemmer>;
}

impl<F> StemmerFactory for F
where
    F: Fn() -> Box<dyn Stemmer> + Send + Sync,
{
    fn create(&self) -> Box<dyn Stemmer> {
        self()
    }
}

pub type DynStemmerFactory = Arc<dyn StemmerFactory>;

/// Snowball English stemmer.
#[derive(Debug, Default, Clone, Copy)]
pub struct EnglishStemmer;

impl StemmerFactory for EnglishStemmer {
    fn create(&self) -> Box<dyn Stemmer> {
        Box::new(rust_stemmers::Stemmer::create(Algorithm::English))
    }
}

pub fn english() -> DynStemmerFactory {
    Arc::new(EnglishStemmer)
}

/// Drops everything that is not a letter or whitespace, lowercases, and
/// splits on whitespace.
pub fn tokenize(line: &str) -> Vec<String> {
    let cleaned: String = line
        .chars()
        .filter(|c| c.is_alphabetic() || c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect();

    cleaned.split_whitespace().map(str::to_string).collect()
}

/// Stems of every word in `line`, in order, duplicates kept.
pub fn stems(line: &str, stemmer: &dyn Stemmer) -> Vec<String> {
    tokenize(line).iter().map(|w| stemmer.stem(w)).collect()
}

/// Sorted, deduplicated stems of `line`.
pub fn unique_stems(line: &str, stemmer: &dyn Stemmer) -> BTreeSet<String> {
    tokenize(line).iter().map(|w| stemmer.stem(w)).collect()
}

/// Space-joined form of a stem set, used as the key for query results.
pub fn canonical_key(stems: &BTreeSet<String>) -> String {
    stems
        .iter()
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(" ")
}
