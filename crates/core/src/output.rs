//! JSON artifacts: index, counts and query results.
//!
//! Everything is pretty printed with tab indentation. Maps are `BTreeMap`s,
//! so keys always come out sorted.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use serde::Serialize;
use serde_json::ser::{PrettyFormatter, Serializer};
use tracing::debug;

use crate::error::Result;
use crate::index::{IndexRead, SearchResult};

pub type QueryResults = BTreeMap<String, Vec<SearchResult>>;

pub fn write_pretty<T: Serialize + ?Sized>(writer: &mut dyn Write, value: &T) -> Result<()> {
    let formatter = PrettyFormatter::with_indent(b"\t");
    let mut serializer = Serializer::with_formatter(&mut *writer, formatter);
    value.serialize(&mut serializer)?;
    writer.write_all(b"\n")?;
    Ok(())
}

fn create(path: &Path) -> Result<BufWriter<File>> {
    debug!("Writing {}", path.display());
    Ok(BufWriter::new(File::create(path)?))
}

/// Writes word -> location -> positions.
pub fn write_index(index: &dyn IndexRead, path: &Path) -> Result<()> {
    let mut writer = create(path)?;
    index.write_postings(&mut writer)?;
    writer.flush()?;
    Ok(())
}

/// Writes location -> count.
pub fn write_counts(index: &dyn IndexRead, path: &Path) -> Result<()> {
    let mut writer = create(path)?;
    write_pretty(&mut writer, &index.counts())?;
    writer.flush()?;
    Ok(())
}

/// Writes query key -> ranked `{count, score, where}` records.
pub fn write_results(results: &QueryResults, path: &Path) -> Result<()> {
    let mut writer = create(path)?;
    write_pretty(&mut writer, results)?;
    writer.flush()?;
    Ok(())
}
