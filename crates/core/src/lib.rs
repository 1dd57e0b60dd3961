pub mod error;
pub mod logging;

pub mod builder;
pub mod index;
pub mod output;
pub mod query;
pub mod text;

pub use builder::IndexBuilder;
pub use error::{Result, TextscopeError};
pub use index::{
    ConcurrentIndex, IndexRead, IndexWrite, InvertedIndex, SearchMode, SearchResult,
};
pub use output::QueryResults;
pub use query::{ParallelQueryEngine, QueryEngine, QueryProcessor};
