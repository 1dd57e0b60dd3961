mod config;
mod driver;

use clap::Parser;
use clap::error::ErrorKind;
use std::path::PathBuf;
use tracing::{error, info};

pub use config::{DEFAULT_COUNTS, DEFAULT_INDEX, DEFAULT_RESULTS, RunConfig, Threads};
pub use driver::execute;

#[derive(Parser, Debug, Default)]
#[command(
    name = "textscope",
    version,
    about = "Builds an inverted index over text files and answers stemmed word queries",
    long_about = "Textscope walks a directory of .txt/.text files, stems every word, and records \
                  where each stem occurs. Query files are matched against that index, one query \
                  per line, and every artifact is written as pretty-printed JSON."
)]
pub struct Cli {
    /// File or directory to index
    #[arg(long, value_name = "PATH", num_args = 0..=1)]
    pub text: Option<Option<PathBuf>>,

    /// File with one query per line
    #[arg(long, value_name = "PATH", num_args = 0..=1)]
    pub query: Option<Option<PathBuf>>,

    /// Match index words that start with a query stem
    #[arg(long)]
    pub partial: bool,

    /// Build and search on a worker pool; without a value, or below 1, uses 5 workers
    #[arg(long, value_name = "N", num_args = 0..=1, allow_negative_numbers = true)]
    pub threads: Option<Option<String>>,

    /// Write the inverted index as JSON
    #[arg(long, value_name = "PATH", num_args = 0..=1, default_missing_value = DEFAULT_INDEX)]
    pub index: Option<PathBuf>,

    /// Write per-location word counts as JSON
    #[arg(long, value_name = "PATH", num_args = 0..=1, default_missing_value = DEFAULT_COUNTS)]
    pub counts: Option<PathBuf>,

    /// Write ranked query results as JSON
    #[arg(long, value_name = "PATH", num_args = 0..=1, default_missing_value = DEFAULT_RESULTS)]
    pub results: Option<PathBuf>,

    /// Also write daily log files into this directory
    #[arg(long, value_name = "DIR")]
    pub log_dir: Option<PathBuf>,
}

impl Cli {
    /// Whether no flag that does any work was given.
    pub fn is_empty(&self) -> bool {
        self.text.is_none()
            && self.query.is_none()
            && !self.partial
            && self.threads.is_none()
            && self.index.is_none()
            && self.counts.is_none()
            && self.results.is_none()
    }
}

/// Parses the command line and runs it. Failures past argument parsing are
/// logged, never returned.
pub fn run() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => e.exit(),
        Err(e) => {
            let _guard = textscope_core::logging::init_logging("textscope", None);
            error!("Invalid command line: {}", e);
            return;
        }
    };
    let _guard = textscope_core::logging::init_logging("textscope", cli.log_dir.as_deref());

    if cli.is_empty() {
        info!("no arguments given");
        return;
    }

    let config = RunConfig::from_cli(&cli);
    execute(&config);
}
