//! Bounded job queue between the discoverer and the worker pool.
//!
//! The queue is also the shutdown protocol: once the walk is complete,
//! [`WorkQueue::finalize`] enqueues one [`Job::Shutdown`] per worker, and a
//! worker exits on the first shutdown it dequeues. Because every worker stops
//! after exactly one shutdown, the number of shutdowns must equal the number of
//! workers.

use crossbeam_channel::{bounded, Receiver, Sender};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, trace};

/// One unit of work for a worker
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Job {
    /// Search this file
    File(PathBuf),
    /// No more work for the worker that receives this
    Shutdown,
}

impl Job {
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self::File(path.into())
    }
}

/// Counters for the work queue
#[derive(Debug, Default)]
struct QueueCounters {
    files_enqueued: AtomicU64,
    shutdowns_enqueued: AtomicU64,
    dequeued: AtomicU64,
}

/// Point-in-time copy of the queue counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueueStats {
    /// `Job::File` entries added
    pub files_enqueued: u64,
    /// `Job::Shutdown` entries added
    pub shutdowns_enqueued: u64,
    /// Entries taken by workers, of either kind
    pub dequeued: u64,
}

/// Bounded FIFO of [`Job`]s
///
/// `add` blocks while the queue is full and `next` blocks while it is empty.
/// The queue is shared by reference; both ends stay open for its whole life, so
/// `next` never observes a disconnect and relies on shutdown jobs instead.
#[derive(Debug)]
pub struct WorkQueue {
    sender: Sender<Job>,
    receiver: Receiver<Job>,
    capacity: usize,
    counters: Arc<QueueCounters>,
}

impl WorkQueue {
    /// Create a new work queue holding at most `capacity` jobs (minimum 1)
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let (sender, receiver) = bounded(capacity);

        Self {
            sender,
            receiver,
            capacity,
            counters: Arc::new(QueueCounters::default()),
        }
    }

    /// Enqueue a job at the tail, waiting for space if the queue is full
    pub fn add(&self, job: Job) {
        match &job {
            Job::File(path) => {
                trace!("Enqueueing {}", path.display());
                self.counters.files_enqueued.fetch_add(1, Ordering::Relaxed);
            }
            Job::Shutdown => {
                self.counters
                    .shutdowns_enqueued
                    .fetch_add(1, Ordering::Relaxed);
            }
        }
        // The queue owns a receiver, so the channel cannot be disconnected here.
        let _ = self.sender.send(job);
    }

    /// Dequeue the job at the head, waiting until one is available
    pub fn next(&self) -> Job {
        // The queue owns a sender, so `recv` only returns once a job arrives.
        let job = self.receiver.recv().unwrap_or(Job::Shutdown);
        self.counters.dequeued.fetch_add(1, Ordering::Relaxed);
        job
    }

    /// Enqueue one shutdown job per worker.
    ///
    /// Call only after every file job has been added.
    pub fn finalize(&self, worker_count: usize) {
        debug!("Finalizing work queue for {} workers", worker_count);
        for _ in 0..worker_count {
            self.add(Job::Shutdown);
        }
    }

    /// Get queue capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Get current queue length
    pub fn len(&self) -> usize {
        self.receiver.len()
    }

    /// Check if the queue is empty
    pub fn is_empty(&self) -> bool {
        self.receiver.is_empty()
    }

    /// Check if the queue is full
    pub fn is_full(&self) -> bool {
        self.receiver.is_full()
    }

    /// Get queue statistics
    pub fn stats(&self) -> QueueStats {
        QueueStats {
            files_enqueued: self.counters.files_enqueued.load(Ordering::Relaxed),
            shutdowns_enqueued: self.counters.shutdowns_enqueued.load(Ordering::Relaxed),
            dequeued: self.counters.dequeued.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_fifo_order() {
        let queue = WorkQueue::new(4);
        queue.add(Job::file("a"));
        queue.add(Job::file("b"));
        queue.add(Job::file("c"));

        assert_eq!(queue.next(), Job::file("a"));
        assert_eq!(queue.next(), Job::file("b"));
        assert_eq!(queue.next(), Job::file("c"));
        assert!(queue.is_empty());
    }

    #[test]
    fn test_finalize_adds_one_shutdown_per_worker() {
        let queue = WorkQueue::new(16);
        queue.add(Job::file("only.txt"));
        queue.finalize(3);

        assert_eq!(queue.len(), 4);
        assert_eq!(queue.next(), Job::file("only.txt"));
        for _ in 0..3 {
            assert_eq!(queue.next(), Job::Shutdown);
        }

        let stats = queue.stats();
        assert_eq!(stats.files_enqueued, 1);
        assert_eq!(stats.shutdowns_enqueued, 3);
        assert_eq!(stats.dequeued, 4);
    }

    #[test]
    fn test_zero_capacity_is_clamped() {
        let queue = WorkQueue::new(0);
        assert_eq!(queue.capacity(), 1);
        queue.add(Job::file("x"));
        assert!(queue.is_full());
    }

    #[test]
    fn test_add_blocks_until_space() {
        let queue = WorkQueue::new(1);
        queue.add(Job::file("first"));

        thread::scope(|s| {
            let producer = s.spawn(|| queue.add(Job::file("second")));

            thread::sleep(Duration::from_millis(50));
            assert!(!producer.is_finished(), "add should wait while full");

            assert_eq!(queue.next(), Job::file("first"));
            producer.join().unwrap();
        });

        assert_eq!(queue.next(), Job::file("second"));
    }

    #[test]
    fn test_every_worker_sees_exactly_one_shutdown() {
        let workers = 4;
        let queue = WorkQueue::new(2);

        let files_seen: usize = thread::scope(|s| {
            let handles: Vec<_> = (0..workers)
                .map(|_| {
                    s.spawn(|| {
                        let mut files = 0;
                        loop {
                            match queue.next() {
                                Job::File(_) => files += 1,
                                Job::Shutdown => return files,
                            }
                        }
                    })
                })
                .collect();

            for i in 0..50 {
                queue.add(Job::file(format!("f{}", i)));
            }
            queue.finalize(workers);

            handles.into_iter().map(|h| h.join().unwrap()).sum()
        });

        assert_eq!(files_seen, 50);
        assert!(queue.is_empty());
        assert_eq!(queue.stats().shutdowns_enqueued, workers as u64);
    }
}
