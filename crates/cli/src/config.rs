use std::path::PathBuf;

use textscope_core::{SearchMode, TextscopeError};
use textscope_sync::DEFAULT_WORKERS;
use tracing::error;

use crate::Cli;

pub const DEFAULT_INDEX: &str = "index.json";
pub const DEFAULT_COUNTS: &str = "counts.json";
pub const DEFAULT_RESULTS: &str = "results.json";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Threads {
    Single,
    Pool(usize),
}

impl Threads {
    /// Resolves the raw `--threads` value. Values below 1 fall back to the
    /// default worker count; anything that is not an integer disables
    /// multithreading.
    pub fn resolve(raw: Option<&Option<String>>) -> Result<Self, TextscopeError> {
        match raw {
            None => Ok(Self::Single),
            Some(None) => Ok(Self::Pool(DEFAULT_WORKERS)),
            Some(Some(value)) => match value.trim().parse::<i64>() {
                Ok(n) if n < 1 => Ok(Self::Pool(DEFAULT_WORKERS)),
                Ok(n) => usize::try_from(n)
                    .map(Self::Pool)
                    .map_err(|_| TextscopeError::InvalidArgument(format!("--threads {value}"))),
                Err(_) => Err(TextscopeError::InvalidArgument(format!(
                    "--threads expects an integer, got \"{value}\""
                ))),
            },
        }
    }
}

/// Path of a flag whose value is mandatory. A bare flag is logged and turns
/// only its own step off.
fn required_path(flag: &str, raw: Option<&Option<PathBuf>>) -> Option<PathBuf> {
    match raw? {
        Some(path) => Some(path.clone()),
        None => {
            let e = TextscopeError::InvalidArgument(format!("{flag} expects a path"));
            error!("{}; skipping that step", e);
            None
        }
    }
}

/// Validated run settings. The driver reads nothing else.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    pub text: Option<PathBuf>,
    pub query: Option<PathBuf>,
    pub mode: SearchMode,
    pub threads: Threads,
    pub index: Option<PathBuf>,
    pub counts: Option<PathBuf>,
    pub results: Option<PathBuf>,
}

impl RunConfig {
    pub fn from_cli(cli: &Cli) -> Self {
        let threads = Threads::resolve(cli.threads.as_ref()).unwrap_or_else(|e| {
            error!("{}; running single-threaded", e);
            Threads::Single
        });

        Self {
            text: required_path("--text", cli.text.as_ref()),
            query: required_path("--query", cli.query.as_ref()),
            mode: SearchMode::from_partial(cli.partial),
            threads,
            index: cli.index.clone(),
            counts: cli.counts.clone(),
            results: cli.results.clone(),
        }
    }
}
