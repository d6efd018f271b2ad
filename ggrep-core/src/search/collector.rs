use crossbeam_channel::Receiver;
use std::collections::HashSet;
use std::io;
use tracing::{debug, warn};

use crate::results::{Match, SearchSummary};

/// Drains `results` until every sender is gone, passing each match to `sink`.
///
/// Returns once the channel is both closed and empty, so no match sent before
/// the close is lost. The first sink error stops further calls to `sink`, but
/// the channel is still drained so workers are never blocked on a full channel;
/// that error is handed back alongside the counts for what was delivered.
pub fn collect<F>(results: Receiver<Match>, mut sink: F) -> (SearchSummary, Option<io::Error>)
where
    F: FnMut(&Match) -> io::Result<()>,
{
    let mut summary = SearchSummary::new();
    let mut seen_files = HashSet::new();
    let mut failure: Option<io::Error> = None;
    let mut dropped = 0usize;

    for m in results.iter() {
        if failure.is_some() {
            dropped += 1;
            continue;
        }
        match sink(&m) {
            Ok(()) => summary.record_match(&m, &mut seen_files),
            Err(e) => {
                if e.kind() == io::ErrorKind::BrokenPipe {
                    debug!("Output closed, discarding further results");
                } else {
                    warn!("Failed to write match, discarding further results: {}", e);
                }
                failure = Some(e);
                dropped += 1;
            }
        }
    }

    if dropped > 0 {
        debug!("Discarded {} matches after output failure", dropped);
    }
    (summary, failure)
}
