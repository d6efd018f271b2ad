use config::{Config as ConfigBuilder, File};
use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

use crate::errors::{SearchError, SearchResult};

/// Default bound for both the work queue and the results channel.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 100;

/// Name of the optional configuration file looked up in the current directory.
pub const LOCAL_CONFIG_FILE: &str = ".ggrep.yaml";

/// How bytes that are not valid UTF-8 are handled while scanning a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EncodingMode {
    /// Replace invalid sequences and keep scanning.
    #[default]
    Lossy,
    /// Stop scanning the file at the first invalid line, keeping earlier matches.
    FailFast,
}

impl EncodingMode {
    /// Parses the CLI spelling (`lossy` or `failfast`), case-insensitively.
    pub fn parse(value: &str) -> SearchResult<Self> {
        match value.to_ascii_lowercase().as_str() {
            "lossy" => Ok(Self::Lossy),
            "failfast" | "fail-fast" => Ok(Self::FailFast),
            other => Err(SearchError::config_error(format!(
                "unknown encoding mode '{}', expected 'lossy' or 'failfast'",
                other
            ))),
        }
    }
}

/// Immutable settings for one search, built once at startup and shared by
/// reference with the discoverer, the workers and the collector.
///
/// Values can come from a YAML file:
/// ```yaml
/// # Literal, case-sensitive substring
/// search_term: "TODO"
///
/// # Root directory to walk
/// root_path: "src"
///
/// # Worker threads (default: logical CPU count)
/// thread_count: 4
///
/// # Channel bounds
/// queue_capacity: 100
/// results_capacity: 100
///
/// # lossy | failfast
/// encoding_mode: lossy
///
/// # trace, debug, info, warn, error
/// log_level: "warn"
/// ```
///
/// Command-line values take precedence; see [`SearchConfig::merge_with_cli`].
/// An empty search term is accepted and matches every line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Literal substring to look for
    #[serde(default)]
    pub search_term: String,

    /// Root directory to start the walk from
    #[serde(default = "default_root_path")]
    pub root_path: PathBuf,

    /// Number of worker threads draining the work queue
    #[serde(default = "default_thread_count")]
    pub thread_count: NonZeroUsize,

    /// Capacity of the bounded work queue
    #[serde(default = "default_capacity")]
    pub queue_capacity: usize,

    /// Capacity of the bounded results channel
    #[serde(default = "default_capacity")]
    pub results_capacity: usize,

    /// Handling of invalid UTF-8 in searched files
    #[serde(default)]
    pub encoding_mode: EncodingMode,

    /// Print a summary line after the matches
    #[serde(default)]
    pub show_stats: bool,

    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// Values given explicitly on the command line.
///
/// `None` means the flag was absent, so the file (or default) value stands even
/// when it differs from the built-in default.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CliOverrides {
    pub search_term: Option<String>,
    pub root_path: Option<PathBuf>,
    pub thread_count: Option<NonZeroUsize>,
    pub queue_capacity: Option<usize>,
    pub results_capacity: Option<usize>,
    pub encoding_mode: Option<EncodingMode>,
    pub show_stats: bool,
    pub log_level: Option<String>,
}

pub fn default_thread_count() -> NonZeroUsize {
    NonZeroUsize::new(num_cpus::get()).unwrap_or(NonZeroUsize::MIN)
}

fn default_root_path() -> PathBuf {
    PathBuf::from(".")
}

fn default_capacity() -> usize {
    DEFAULT_CHANNEL_CAPACITY
}

pub fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            search_term: String::new(),
            root_path: default_root_path(),
            thread_count: default_thread_count(),
            queue_capacity: DEFAULT_CHANNEL_CAPACITY,
            results_capacity: DEFAULT_CHANNEL_CAPACITY,
            encoding_mode: EncodingMode::default(),
            show_stats: false,
            log_level: default_log_level(),
        }
    }
}

impl SearchConfig {
    /// Creates a configuration with defaults for everything but the term and root
    pub fn new(search_term: impl Into<String>, root_path: impl Into<PathBuf>) -> Self {
        Self {
            search_term: search_term.into(),
            root_path: root_path.into(),
            ..Self::default()
        }
    }

    /// Loads configuration from `.ggrep.yaml` and then `config_path`, later files winning.
    ///
    /// The local file is optional; an explicitly named file must exist.
    pub fn load_from(config_path: Option<&Path>) -> SearchResult<Self> {
        let mut builder = ConfigBuilder::builder();

        let local = PathBuf::from(LOCAL_CONFIG_FILE);
        if local.exists() {
            builder = builder.add_source(File::from(local.as_path()));
        }

        if let Some(path) = config_path {
            builder = builder.add_source(File::from(path).required(true));
        }

        Ok(builder.build()?.try_deserialize()?)
    }

    /// Merges CLI arguments with configuration file values.
    ///
    /// Every value present in `cli` wins, including one equal to the default.
    pub fn merge_with_cli(mut self, cli: CliOverrides) -> Self {
        if let Some(term) = cli.search_term {
            self.search_term = term;
        }
        if let Some(root) = cli.root_path {
            self.root_path = root;
        }
        if let Some(threads) = cli.thread_count {
            self.thread_count = threads;
        }
        if let Some(capacity) = cli.queue_capacity {
            self.queue_capacity = capacity;
        }
        if let Some(capacity) = cli.results_capacity {
            self.results_capacity = capacity;
        }
        if let Some(mode) = cli.encoding_mode {
            self.encoding_mode = mode;
        }
        if cli.show_stats {
            self.show_stats = true;
        }
        if let Some(level) = cli.log_level {
            self.log_level = level;
        }
        self
    }

    /// Rejects settings the pipeline cannot run with
    pub fn validate(&self) -> SearchResult<()> {
        if self.queue_capacity == 0 {
            return Err(SearchError::config_error("queue capacity must be at least 1"));
        }
        if self.results_capacity == 0 {
            return Err(SearchError::config_error(
                "results capacity must be at least 1",
            ));
        }
        Ok(())
    }
}
