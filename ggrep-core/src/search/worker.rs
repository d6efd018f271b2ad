use crossbeam_channel::Sender;
use tracing::{debug, trace};

use super::processor::FileProcessor;
use crate::queue::{Job, WorkQueue};
use crate::results::Match;

/// Per-worker counters, returned when the worker shuts down
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkerStats {
    /// File jobs taken from the queue
    pub files_searched: usize,
    /// Matches handed to the results channel
    pub matches_sent: usize,
}

impl WorkerStats {
    /// Adds another worker's counters into this one
    pub fn absorb(&mut self, other: WorkerStats) {
        self.files_searched += other.files_searched;
        self.matches_sent += other.matches_sent;
    }
}

/// Drains `queue` until a [`Job::Shutdown`] arrives, forwarding every match.
///
/// Each match is sent individually, in file order. If the results channel has
/// been closed the worker stops searching but keeps taking jobs until its
/// shutdown, so the discoverer is never left blocked on a full queue.
pub fn run_worker(
    id: usize,
    queue: &WorkQueue,
    processor: &FileProcessor,
    results: &Sender<Match>,
) -> WorkerStats {
    debug!("Worker {} started", id);
    let mut stats = WorkerStats::default();
    let mut disconnected = false;

    loop {
        let path = match queue.next() {
            Job::File(path) => path,
            Job::Shutdown => break,
        };
        stats.files_searched += 1;

        if disconnected {
            trace!("Worker {} skipping {}: results closed", id, path.display());
            continue;
        }

        let Some(matches) = processor.find_in_file(&path) else {
            continue;
        };

        for m in matches {
            if results.send(m).is_err() {
                debug!("Worker {}: results channel closed", id);
                disconnected = true;
                break;
            }
            stats.matches_sent += 1;
        }
    }

    debug!(
        "Worker {} finished: {} files, {} matches",
        id, stats.files_searched, stats.matches_sent
    );
    stats
}
