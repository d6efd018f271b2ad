use crossbeam_channel::bounded;
use std::io;
use std::thread::{self, ScopedJoinHandle};
use tracing::{debug, info, warn};

use super::collector::collect;
use super::processor::FileProcessor;
use super::worker::{run_worker, WorkerStats};
use crate::config::SearchConfig;
use crate::discover::{discover, DiscoveryStats};
use crate::errors::{SearchError, SearchResult};
use crate::queue::WorkQueue;
use crate::results::{Match, SearchSummary};

/// Runs the discover → search → collect pipeline, handing each match to `sink`.
///
/// Threads:
/// - one discoverer walks `config.root_path`, then enqueues one shutdown per worker;
/// - `config.thread_count` workers search files and send matches;
/// - one coordinator joins the workers and then closes the results channel;
/// - the calling thread is the collector and runs `sink` for every match.
///
/// Matches from one file reach `sink` in line order; files interleave freely.
/// Per-file and per-directory failures are logged and skipped. The call fails
/// only for an invalid configuration, a thread that could not be spawned or
/// panicked, or a `sink` error (reported after the pipeline has drained).
pub fn search<F>(config: &SearchConfig, sink: F) -> SearchResult<SearchSummary>
where
    F: FnMut(&Match) -> io::Result<()>,
{
    config.validate()?;
    info!(
        "Starting search for {:?} under {} with {} workers",
        config.search_term,
        config.root_path.display(),
        config.thread_count
    );

    let worker_count = config.thread_count.get();
    let queue = WorkQueue::new(config.queue_capacity);
    let processor = FileProcessor::new(config.search_term.as_str(), config.encoding_mode);
    let (results_tx, results_rx) = bounded::<Match>(config.results_capacity);

    let summary = thread::scope(|s| -> SearchResult<SearchSummary> {
        let queue = &queue;
        let processor = &processor;
        let root = config.root_path.as_path();

        let mut workers: Vec<ScopedJoinHandle<'_, WorkerStats>> = Vec::with_capacity(worker_count);
        for id in 0..worker_count {
            let results = results_tx.clone();
            let spawned = thread::Builder::new()
                .name(format!("ggrep-worker-{}", id))
                .spawn_scoped(s, move || run_worker(id, queue, processor, &results));
            match spawned {
                Ok(handle) => workers.push(handle),
                Err(e) => {
                    // Release the workers that did start before bailing out.
                    queue.finalize(workers.len());
                    return Err(SearchError::IoError(e));
                }
            }
        }

        let discoverer = thread::Builder::new()
            .name("ggrep-discover".to_string())
            .spawn_scoped(s, move || {
                let stats = discover(queue, root);
                queue.finalize(worker_count);
                stats
            });
        let discoverer = match discoverer {
            Ok(handle) => handle,
            Err(e) => {
                queue.finalize(worker_count);
                return Err(SearchError::IoError(e));
            }
        };

        // Workers hold their own senders; the coordinator owns the last one and
        // drops it only after every worker has been joined.
        let coordinator = thread::Builder::new()
            .name("ggrep-coordinator".to_string())
            .spawn_scoped(s, move || {
                let mut totals = WorkerStats::default();
                let mut panicked = None;
                for handle in workers {
                    let name = handle.thread().name().unwrap_or("worker").to_string();
                    match handle.join() {
                        Ok(stats) => totals.absorb(stats),
                        Err(_) => {
                            warn!("{} panicked", name);
                            panicked.get_or_insert(name);
                        }
                    }
                }
                drop(results_tx);
                debug!("All workers finished, results channel closed");
                (totals, panicked)
            })?;

        let (mut summary, sink_failure) = collect(results_rx, sink);

        let (totals, panicked) = coordinator
            .join()
            .map_err(|_| SearchError::worker_panicked("ggrep-coordinator"))?;
        let discovery: DiscoveryStats = discoverer
            .join()
            .map_err(|_| SearchError::worker_panicked("ggrep-discover"))?;

        if let Some(name) = panicked {
            return Err(SearchError::worker_panicked(name));
        }
        if let Some(e) = sink_failure {
            return Err(SearchError::IoError(e));
        }

        if totals.matches_sent != summary.total_matches {
            warn!(
                "Workers sent {} matches but {} were collected",
                totals.matches_sent, summary.total_matches
            );
        }
        summary.files_searched = totals.files_searched;
        summary.walk_errors = discovery.errors;
        debug!(
            "Queue stats: {:?}, {} files discovered",
            queue.stats(),
            discovery.files
        );
        Ok(summary)
    })?;

    info!(
        "Search complete. Found {} matches in {} files ({} searched)",
        summary.total_matches, summary.files_with_matches, summary.files_searched
    );

    Ok(summary)
}

/// Runs [`search`] and returns every match alongside the summary
pub fn search_collect(config: &SearchConfig) -> SearchResult<(Vec<Match>, SearchSummary)> {
    let mut matches = Vec::new();
    let summary = search(config, |m| {
        matches.push(m.clone());
        Ok(())
    })?;
    Ok((matches, summary))
}
