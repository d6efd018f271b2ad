use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use ggrep_core::{
    search, CliOverrides, EncodingMode, Match, SearchConfig, SearchError, SearchSummary,
};
use std::io::{self, BufWriter, Write};
use std::num::NonZeroUsize;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Literal text to search for (case-sensitive)
    search_term: String,

    /// Directory to search in (default: current directory)
    search_dir: Option<PathBuf>,

    /// Number of worker threads (default: logical CPU count)
    #[arg(short = 'j', long)]
    threads: Option<NonZeroUsize>,

    /// Capacity of the work queue
    #[arg(long)]
    queue_capacity: Option<usize>,

    /// Capacity of the results channel
    #[arg(long)]
    results_capacity: Option<usize>,

    /// How to handle invalid UTF-8 sequences (lossy|failfast, default: lossy)
    #[arg(long)]
    encoding: Option<String>,

    /// Print a summary line after the matches
    #[arg(short, long)]
    stats: bool,

    /// Colour paths and line numbers
    #[arg(long)]
    color: bool,

    /// Log level for diagnostics on stderr (trace, debug, info, warn, error; default: warn)
    #[arg(long)]
    log_level: Option<String>,

    /// Configuration file (YAML)
    #[arg(short, long)]
    config: Option<PathBuf>,
}

impl Cli {
    fn to_overrides(&self) -> Result<CliOverrides> {
        Ok(CliOverrides {
            search_term: Some(self.search_term.clone()),
            root_path: self.search_dir.clone(),
            thread_count: self.threads,
            queue_capacity: self.queue_capacity,
            results_capacity: self.results_capacity,
            encoding_mode: self.encoding.as_deref().map(EncodingMode::parse).transpose()?,
            show_stats: self.stats,
            log_level: self.log_level.clone(),
        })
    }
}

fn main() -> Result<()> {
    run()
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    let file_config = SearchConfig::load_from(cli.config.as_deref())
        .context("failed to load configuration")?;
    let config = file_config.merge_with_cli(cli.to_overrides()?);

    init_logging(&config.log_level)?;

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    let color = cli.color;

    let result = search(&config, |m| {
        print_match(&mut out, m, color)?;
        // Stream results as they arrive rather than at buffer boundaries.
        out.flush()
    });
    let summary = match result {
        Ok(summary) => summary,
        // The reader went away (e.g. `| head`); nothing left to print to.
        Err(SearchError::IoError(e)) if is_broken_pipe(&e) => return Ok(()),
        Err(e) => return Err(e.into()),
    };

    let finished = if config.show_stats {
        print_summary(&mut out, &summary).and_then(|()| out.flush())
    } else {
        out.flush()
    };
    match finished {
        Err(e) if !is_broken_pipe(&e) => Err(e.into()),
        _ => Ok(()),
    }
}

fn is_broken_pipe(err: &io::Error) -> bool {
    err.kind() == io::ErrorKind::BrokenPipe
}

fn init_logging(level: &str) -> Result<()> {
    let filter = EnvFilter::try_new(format!("ggrep_core={level},ggrep={level},warn"))
        .with_context(|| format!("invalid log level '{}'", level))?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();

    Ok(())
}

fn print_match(out: &mut impl Write, m: &Match, color: bool) -> io::Result<()> {
    if color {
        writeln!(
            out,
            "{}[{}]:{}",
            m.path.display().to_string().blue(),
            m.line_number.to_string().green(),
            m.line
        )
    } else {
        writeln!(out, "{}", m)
    }
}

fn print_summary(out: &mut impl Write, summary: &SearchSummary) -> io::Result<()> {
    writeln!(out, "\n{}", summary)
}
